//! Bundled campus dataset: named places, the existing charging station and
//! the daily trips between them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Coordinate, Location, Route};

const CAMPUS_JSON: &str = include_str!("../data/campus.json");

#[derive(Debug, Error)]
pub enum CampusError {
    #[error("invalid campus definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("route {route} references unknown location {location}")]
    UnknownLocation { route: String, location: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStation {
    #[serde(flatten)]
    pub location: Location,
    /// kW.
    pub power: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CampusFile {
    center: Location,
    charging_station: ChargingStation,
    locations: Vec<Location>,
    routes: Vec<RouteRecord>,
}

/// Route as stored on disk, with endpoints given by location id.
#[derive(Debug, Deserialize)]
struct RouteRecord {
    id: String,
    #[serde(default)]
    name: String,
    start: String,
    end: String,
    #[serde(default = "shared::default_frequency")]
    frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campus {
    pub center: Location,
    pub charging_station: ChargingStation,
    pub locations: Vec<Location>,
    pub routes: Vec<Route>,
}

impl Campus {
    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self, CampusError> {
        Self::from_json(CAMPUS_JSON)
    }

    pub fn from_json(json: &str) -> Result<Self, CampusError> {
        let file: CampusFile = serde_json::from_str(json)?;

        let mut by_id: HashMap<&str, &Location> = file
            .locations
            .iter()
            .map(|location| (location.id.as_str(), location))
            .collect();
        by_id.insert(
            file.charging_station.location.id.as_str(),
            &file.charging_station.location,
        );

        let lookup = |route: &RouteRecord, id: &str| {
            by_id
                .get(id)
                .map(|location| (*location).clone())
                .ok_or_else(|| CampusError::UnknownLocation {
                    route: route.id.clone(),
                    location: id.to_string(),
                })
        };

        let routes = file
            .routes
            .iter()
            .map(|record| {
                Ok(Route {
                    id: record.id.clone(),
                    start: lookup(record, &record.start)?,
                    end: lookup(record, &record.end)?,
                    frequency: record.frequency,
                    name: record.name.clone(),
                })
            })
            .collect::<Result<Vec<_>, CampusError>>()?;

        Ok(Self {
            center: file.center,
            charging_station: file.charging_station,
            locations: file.locations,
            routes,
        })
    }

    pub fn station_coordinate(&self) -> Coordinate {
        self.charging_station.location.coordinate()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        if self.charging_station.location.id == id {
            return Some(&self.charging_station.location);
        }
        self.locations.iter().find(|location| location.id == id)
    }
}
