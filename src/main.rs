use std::error::Error;
use std::sync::Arc;

use apex_chassis::ai::{ActorKinematics, AiDriver, AiPersonality};
use apex_chassis::track::{DEMO_SPEED_TABLE_KMH, demo_circuit};
use apex_chassis::{RaceSession, VehicleConfig};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, interval};
use tracing::{info, warn};

const TICK_HZ: f64 = 60.0;
const TELEMETRY_PERIOD: Duration = Duration::from_secs(1);
const DEFAULT_AI_COUNT: usize = 5;
const RACE_SEED: u64 = 0xA9E7;

fn load_config() -> Result<VehicleConfig, Box<dyn Error>> {
    match std::env::var("APEX_CAR_CONFIG") {
        Ok(path) => Ok(VehicleConfig::from_path(path)?),
        Err(_) => {
            info!("APEX_CAR_CONFIG not set, using the built-in gt86 preset");
            Ok(VehicleConfig::gt86())
        }
    }
}

fn ai_count() -> usize {
    match std::env::var("APEX_AI_COUNT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = %raw, "APEX_AI_COUNT is not a number, using {DEFAULT_AI_COUNT}");
            DEFAULT_AI_COUNT
        }),
        Err(_) => DEFAULT_AI_COUNT,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apex_chassis=info".into()),
        )
        .init();

    let config = load_config()?;
    let curve = demo_circuit()?;
    let session = RaceSession::new(config, curve, &DEMO_SPEED_TABLE_KMH, ai_count(), RACE_SEED)?;
    let session = Arc::new(Mutex::new(session));

    // Telemetry: once a second, serialise the player snapshot
    tokio::spawn({
        let session = Arc::clone(&session);
        async move {
            let mut ticker = interval(TELEMETRY_PERIOD);
            loop {
                ticker.tick().await;
                let race = session.lock().await;
                let Some(state) = race.player_state() else { continue };
                match serde_json::to_string(&state.telemetry()) {
                    Ok(json) => info!(
                        tick = race.tick_count(),
                        lap = race.player_laps().laps_completed(),
                        telemetry = %json,
                        "player"
                    ),
                    Err(err) => warn!(%err, "telemetry serialisation failed"),
                }
            }
        }
    });

    // The player car runs on a scripted autopilot
    let mut autopilot = AiDriver::new(AiPersonality::new(0.6, 1.0, 1.0), RACE_SEED);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Fixed timestep: ~60 Hz
    let mut ticker = interval(Duration::from_secs_f64(1.0 / TICK_HZ));
    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("shutting down");
                break;
            }
        }

        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        let mut race = session.lock().await;
        let input = match race.player_state() {
            Some(state) => {
                let kinematics = ActorKinematics {
                    position: state.position,
                    velocity: state.velocity,
                    forward: state.forward(),
                    track_t: race.curve().nearest_t(&state.position, 100),
                };
                autopilot.update(race.racing_line(), &kinematics, dt)
            }
            None => Default::default(),
        };
        race.tick(input, dt);
    }

    Ok(())
}
