// ==============================================================================
// race.rs — RACE SESSION (ONE WORLD, ONE PLAYER, N AI CARS)
// ------------------------------------------------------------------------------
// Tick order:
//   1) read every body -> track t (nearest_t), lap progress, AI kinematics
//   2) AiDirector::update with the player's progress
//   3) VehicleController::step for the player, then each AI car
//   4) PhysicsWorld::step integrates all forces issued in 3
//
// A reset removes every chassis and rebuilds controllers, laps and director
// state from the starting grid.
// ==============================================================================

use rand::SeedableRng;
use rand::rngs::StdRng;
use rapier3d::prelude::RigidBodyHandle;
use tracing::info;

use crate::ai::{ActorId, ActorKinematics, AiDirector, AiPersonality, RaceContext, RankingMode};
use crate::config::VehicleConfig;
use crate::error::TrackResult;
use crate::physics::{MAX_DT, PhysicsWorld};
use crate::state::{InputState, VehicleState};
use crate::track::racing_line::DEFAULT_SAMPLES;
use crate::track::{Curve, LapTracker, RacingLine, starting_grid};
use crate::vehicle::VehicleController;

/// Coarse samples for per-tick track projection.
const NEAREST_SAMPLES: usize = 100;

struct AiCar {
    id: ActorId,
    personality: AiPersonality,
    seed: u64,
    vehicle: VehicleController<RigidBodyHandle>,
}

pub struct RaceSession {
    world: PhysicsWorld,
    config: VehicleConfig,
    curve: Curve,

    player: VehicleController<RigidBodyHandle>,
    player_laps: LapTracker,
    ai: Vec<AiCar>,
    director: AiDirector,

    tick: u64,
    time: f32,
}

impl RaceSession {
    /// Build the world, spawn every car on the grid (player on pole) and
    /// register the AI field. `seed` fixes the AI personalities and noise.
    pub fn new(
        config: VehicleConfig,
        curve: Curve,
        speed_table_kmh: &[f32],
        ai_count: usize,
        seed: u64,
    ) -> TrackResult<Self> {
        let line = RacingLine::new(&curve, speed_table_kmh, DEFAULT_SAMPLES)?;
        let mut director = AiDirector::new(line).with_ranking(RankingMode::Convention);

        let mut rng = StdRng::seed_from_u64(seed);
        let ai = (0..ai_count)
            .map(|i| {
                let personality = AiPersonality::random(&mut rng);
                let car_seed = seed.wrapping_add(i as u64 + 1);
                AiCar {
                    id: director.add_actor(personality, car_seed),
                    personality,
                    seed: car_seed,
                    vehicle: VehicleController::new(config.clone()),
                }
            })
            .collect();

        let mut session = Self {
            world: PhysicsWorld::new(),
            player: VehicleController::new(config.clone()),
            config,
            curve,
            player_laps: LapTracker::new(),
            ai,
            director,
            tick: 0,
            time: 0.0,
        };
        session.spawn_grid();

        info!(
            ai = session.ai.len(),
            track_length = session.curve.total_length(),
            "race session ready"
        );
        Ok(session)
    }

    fn spawn_grid(&mut self) {
        let grid = starting_grid(&self.curve, self.ai.len() + 1);
        let mut slots = grid.iter();

        if let Some(slot) = slots.next() {
            let body = self.world.spawn_chassis(&self.config, slot.pose());
            self.player.attach(body);
        }
        for (car, slot) in self.ai.iter_mut().zip(slots) {
            let body = self.world.spawn_chassis(&self.config, slot.pose());
            car.vehicle.attach(body);
        }
    }

    /// Put everyone back on the grid with fresh controller, lap and AI state.
    pub fn reset(&mut self) {
        for body in std::iter::once(self.player.detach())
            .chain(self.ai.iter_mut().map(|c| c.vehicle.detach()))
            .flatten()
        {
            self.world.remove_body(body);
        }

        self.director.clear();
        for car in &mut self.ai {
            car.id = self.director.add_actor(car.personality, car.seed);
        }
        self.player_laps = LapTracker::new();
        self.tick = 0;
        self.time = 0.0;
        self.spawn_grid();

        info!("race reset");
    }

    /// Advance the whole race by one tick.
    pub fn tick(&mut self, player_input: InputState, dt: f32) {
        let dt = dt.clamp(0.0, MAX_DT);

        // --------------------------------------------------
        // Track positions
        // --------------------------------------------------
        if let Some(state) = self.player.state(&self.world) {
            let t = self.curve.nearest_t(&state.position, NEAREST_SAMPLES);
            if self.player_laps.update(t, dt) {
                info!(
                    laps = self.player_laps.laps_completed(),
                    lap_time = self.player_laps.last_lap().unwrap_or_default(),
                    "player lap"
                );
            }
        }

        for car in &self.ai {
            let Some(state) = car.vehicle.state(&self.world) else { continue };
            let kinematics = ActorKinematics {
                position: state.position,
                velocity: state.velocity,
                forward: state.forward(),
                track_t: self.curve.nearest_t(&state.position, NEAREST_SAMPLES),
            };
            self.director.push_kinematics(car.id, kinematics, dt);
        }

        // --------------------------------------------------
        // AI decisions
        // --------------------------------------------------
        let ctx = RaceContext {
            player_progress: self.player_laps.progress(),
            total_racers: self.ai.len() as u32 + 1,
        };
        self.director.update(&ctx, dt);

        // --------------------------------------------------
        // Vehicles, then the world
        // --------------------------------------------------
        self.player.step(&mut self.world, player_input, dt);
        for car in &mut self.ai {
            let input = self.director.get_input(car.id).unwrap_or_default();
            car.vehicle.step(&mut self.world, input, dt);
        }

        self.world.step(dt);
        self.tick += 1;
        self.time += dt;
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn race_time(&self) -> f32 {
        self.time
    }

    /// Bodies the world had to pull back after running away; 0 in a healthy race.
    pub fn world_resets(&self) -> u32 {
        self.world.runaway_resets()
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn racing_line(&self) -> &RacingLine {
        self.director.line()
    }

    pub fn director(&self) -> &AiDirector {
        &self.director
    }

    pub fn player_laps(&self) -> &LapTracker {
        &self.player_laps
    }

    pub fn player_state(&self) -> Option<VehicleState> {
        self.player.state(&self.world)
    }

    pub fn player_vehicle(&self) -> &VehicleController<RigidBodyHandle> {
        &self.player
    }

    pub fn player_vehicle_mut(&mut self) -> &mut VehicleController<RigidBodyHandle> {
        &mut self.player
    }

    pub fn ai_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.ai.iter().map(|c| c.id)
    }

    pub fn ai_state(&self, id: ActorId) -> Option<VehicleState> {
        self.ai.iter().find(|c| c.id == id)?.vehicle.state(&self.world)
    }

    pub fn ai_states(&self) -> Vec<(ActorId, Option<VehicleState>)> {
        self.ai.iter().map(|c| (c.id, c.vehicle.state(&self.world))).collect()
    }
}
