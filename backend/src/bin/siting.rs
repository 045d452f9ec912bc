use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ev_siting::{
    AppState,
    battery::charging_time,
    campus::Campus,
    config::Config,
    energy::{VehicleProfile, consumption},
    models::Route,
    optimizer::{ClusterOptions, LocatorOptions, find_multiple_optimal_locations, find_optimal_location},
    trip::{TripRequest, plan_trip},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(author, version, about = "Campus EV charging siting and trip energy tools")]
struct Args {
    /// Skip every network service: no snapping, straight-line routes, flat terrain
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Energy breakdown for a trip
    Energy {
        /// Trip length in meters
        #[arg(long)]
        distance: f64,
        #[arg(long, default_value_t = 0.0)]
        gain: f64,
        #[arg(long, default_value_t = 0.0)]
        loss: f64,
    },
    /// Time to charge between two battery levels
    Charge {
        #[arg(long)]
        current: f64,
        #[arg(long, default_value_t = 80.0)]
        target: f64,
        /// Charger power in kW (defaults to CHARGER_POWER_KW)
        #[arg(long)]
        power: Option<f64>,
    },
    /// Site one or more charging stations for a set of routes
    Optimize {
        /// JSON array of routes; the bundled campus routes when omitted
        #[arg(long)]
        routes: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        stations: usize,
        /// Clustering seed (defaults to CLUSTER_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Energy and battery report between two campus locations
    Trip {
        /// Start location id, e.g. main-gate
        #[arg(long)]
        from: String,
        /// End location id, e.g. cafeteria
        #[arg(long)]
        to: String,
        #[arg(long, default_value_t = 80.0)]
        battery: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let state = if args.offline {
        AppState::offline(config, Campus::bundled()?)
    } else {
        AppState::from_config(config)?
    };

    let output = match args.command {
        Command::Energy {
            distance,
            gain,
            loss,
        } => serde_json::to_string_pretty(&consumption(
            distance,
            gain,
            loss,
            &VehicleProfile::default(),
        ))?,
        Command::Charge {
            current,
            target,
            power,
        } => {
            let power = power.unwrap_or(state.config.charger_power_kw);
            let plan = charging_time(current, target, power, state.profile.battery_capacity_kwh)?;
            serde_json::to_string_pretty(&plan)?
        }
        Command::Optimize {
            routes,
            stations,
            seed,
        } => {
            let routes: Vec<Route> = match routes {
                Some(path) => serde_json::from_reader(std::fs::File::open(path)?)?,
                None => state.campus.routes.clone(),
            };

            if stations <= 1 {
                let options = LocatorOptions {
                    snap_radius_m: state.config.snap_radius_m,
                    ..LocatorOptions::default()
                };
                let existing = [state.campus.station_coordinate()];
                let site =
                    find_optimal_location(&routes, &existing, state.snapper.as_ref(), options)
                        .await
                        .ok_or("no routes to optimize")?;
                serde_json::to_string_pretty(&site)?
            } else {
                let options = ClusterOptions {
                    snap_radius_m: state.config.snap_radius_m,
                    seed: seed.unwrap_or(state.config.cluster_seed),
                    ..ClusterOptions::default()
                };
                let sites =
                    find_multiple_optimal_locations(&routes, stations, state.snapper.clone(), options)
                        .await;
                serde_json::to_string_pretty(&sites)?
            }
        }
        Command::Trip { from, to, battery } => {
            let start = state
                .campus
                .location(&from)
                .ok_or_else(|| format!("unknown location {from}"))?
                .coordinate();
            let end = state
                .campus
                .location(&to)
                .ok_or_else(|| format!("unknown location {to}"))?
                .coordinate();

            let request = TripRequest {
                start,
                end,
                battery_level: battery,
            };
            let report = plan_trip(
                &request,
                state.routes.as_ref(),
                state.elevation.as_ref(),
                &state.profile,
                state.config.charger_power_kw,
            )
            .await?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{output}");
    Ok(())
}
