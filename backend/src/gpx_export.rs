use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::ExportError;
use crate::models::{Coordinate, ElevationSample, OptimalLocationResult};

const CREATOR: &str = "ev_siting";

/// Base64 GPX with the path as a track and each station as a named waypoint.
pub fn encode_route_as_gpx(
    path: &[Coordinate],
    stations: &[OptimalLocationResult],
) -> Result<String, ExportError> {
    let mut gpx = document();

    if !path.is_empty() {
        gpx.tracks
            .push(track(path.iter().map(|c| Waypoint::new(Point::new(c.lng, c.lat)))));
    }
    for (index, station) in stations.iter().enumerate() {
        gpx.waypoints.push(station_waypoint(index, station));
    }

    encode(&gpx)
}

/// Base64 GPX of a trip, carrying per-point elevation.
pub fn encode_trip_as_gpx(path: &[ElevationSample]) -> Result<String, ExportError> {
    let mut gpx = document();
    gpx.tracks.push(track(path.iter().map(|sample| {
        let mut point = Waypoint::new(Point::new(sample.lng, sample.lat));
        point.elevation = Some(sample.elevation);
        point
    })));

    encode(&gpx)
}

fn document() -> Gpx {
    Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(CREATOR.into()),
        ..Default::default()
    }
}

fn track(points: impl Iterator<Item = Waypoint>) -> Track {
    let mut segment = TrackSegment::new();
    segment.points.extend(points);

    let mut track = Track {
        name: Some("EV trip".into()),
        ..Default::default()
    };
    track.segments.push(segment);
    track
}

fn station_waypoint(index: usize, station: &OptimalLocationResult) -> Waypoint {
    let mut waypoint = Waypoint::new(Point::new(station.lng, station.lat));
    let label = station
        .id
        .clone()
        .unwrap_or_else(|| format!("station-{}", index + 1));
    waypoint.name = Some(match &station.road_name {
        Some(road) => format!("{label} ({road})"),
        None => label,
    });
    waypoint
}

fn encode(gpx: &Gpx) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    gpx::write(gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}
