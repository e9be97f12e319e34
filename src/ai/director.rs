// ==============================================================================
// director.rs — AI DIRECTOR (ACTOR REGISTRY + PER-TICK DECISIONS)
// ------------------------------------------------------------------------------
// The director never touches bodies. Per tick, its owner:
//   1) push_kinematics(id, kin) for every AI actor
//   2) update(&RaceContext, dt): ranks actors, sets each rubber band modifier,
//      runs each AiDriver
//   3) get_input(id) and applies the result to that actor's vehicle
//
// Ranking:
// - Convention: actor i is rank i + 2, the player is rank 1
// - Progress:   everyone (player included) sorted by laps + t
// ==============================================================================

use rapier3d::na::Point3;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::driver::{ActorKinematics, AiDriver, AiPersonality};
use crate::ai::rubber_band::compute_rubber_band_modifier;
use crate::state::InputState;
use crate::track::{LapTracker, RacingLine};

pub type ActorId = Uuid;

/// Race-wide facts the director needs each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaceContext {
    /// Player progress in laps (laps + t).
    pub player_progress: f32,
    pub total_racers: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingMode {
    #[default]
    Convention,
    Progress,
}

#[derive(Debug, Clone)]
struct AiActor {
    id: ActorId,
    driver: AiDriver,
    kinematics: ActorKinematics,
    laps: LapTracker,
    rank: u32,
}

#[derive(Debug, Clone)]
pub struct AiDirector {
    line: RacingLine,
    actors: Vec<AiActor>,
    ranking: RankingMode,
}

impl AiDirector {
    pub fn new(line: RacingLine) -> Self {
        Self {
            line,
            actors: Vec::new(),
            ranking: RankingMode::default(),
        }
    }

    pub fn with_ranking(mut self, ranking: RankingMode) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn line(&self) -> &RacingLine {
        &self.line
    }

    pub fn ranking(&self) -> RankingMode {
        self.ranking
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.iter().map(|a| a.id)
    }

    pub fn add_actor(&mut self, personality: AiPersonality, seed: u64) -> ActorId {
        let id = Uuid::new_v4();
        let rank = self.actors.len() as u32 + 2;
        self.actors.push(AiActor {
            id,
            driver: AiDriver::new(personality, seed),
            kinematics: ActorKinematics::default(),
            laps: LapTracker::new(),
            rank,
        });
        info!(%id, ?personality, "ai actor added");
        id
    }

    pub fn remove_actor(&mut self, id: ActorId) -> bool {
        let before = self.actors.len();
        self.actors.retain(|a| a.id != id);
        before != self.actors.len()
    }

    /// Drop every actor (race reset).
    pub fn clear(&mut self) {
        self.actors.clear();
    }

    fn actor(&self, id: ActorId) -> Option<&AiActor> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Latest body snapshot for one actor. Unknown ids are logged and ignored.
    pub fn push_kinematics(&mut self, id: ActorId, kinematics: ActorKinematics, dt: f32) {
        let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) else {
            warn!(%id, "kinematics for unknown ai actor");
            return;
        };
        actor.laps.update(kinematics.track_t, dt);
        actor.kinematics = kinematics;
    }

    pub fn update(&mut self, ctx: &RaceContext, dt: f32) {
        self.assign_ranks(ctx);

        let track_length = self.line.track_length();
        let player_rank = self.player_rank(ctx);

        for actor in &mut self.actors {
            let gap = (ctx.player_progress - actor.laps.progress()) * track_length;
            let modifier = compute_rubber_band_modifier(actor.rank, player_rank, ctx.total_racers, gap.max(0.0));
            actor.driver.set_rubber_band_modifier(modifier);
            actor.driver.update(&self.line, &actor.kinematics, dt);
        }

        debug!(actors = self.actors.len(), player_rank, "ai director tick");
    }

    fn player_rank(&self, ctx: &RaceContext) -> u32 {
        match self.ranking {
            RankingMode::Convention => 1,
            RankingMode::Progress => {
                1 + self
                    .actors
                    .iter()
                    .filter(|a| a.laps.progress() > ctx.player_progress)
                    .count() as u32
            }
        }
    }

    fn assign_ranks(&mut self, ctx: &RaceContext) {
        match self.ranking {
            RankingMode::Convention => {
                for (i, actor) in self.actors.iter_mut().enumerate() {
                    actor.rank = i as u32 + 2;
                }
            }
            RankingMode::Progress => {
                let progress: Vec<f32> = self.actors.iter().map(|a| a.laps.progress()).collect();
                for (i, actor) in self.actors.iter_mut().enumerate() {
                    let mine = progress[i];
                    // ties go to the earlier entry, the player wins ties
                    let ahead_ai = progress
                        .iter()
                        .enumerate()
                        .filter(|&(j, &p)| p > mine || (p == mine && j < i))
                        .count();
                    let ahead_player = usize::from(ctx.player_progress >= mine);
                    actor.rank = (1 + ahead_ai + ahead_player) as u32;
                }
            }
        }
    }

    /// Controls computed by the last `update`. None for unknown ids.
    pub fn get_input(&self, id: ActorId) -> Option<InputState> {
        self.actor(id).map(|a| a.driver.input())
    }

    pub fn rank(&self, id: ActorId) -> Option<u32> {
        self.actor(id).map(|a| a.rank)
    }

    pub fn rubber_band_modifier(&self, id: ActorId) -> Option<f32> {
        self.actor(id).map(|a| a.driver.rubber_band_modifier())
    }

    pub fn progress(&self, id: ActorId) -> Option<f32> {
        self.actor(id).map(|a| a.laps.progress())
    }

    pub fn laps_completed(&self, id: ActorId) -> Option<u32> {
        self.actor(id).map(|a| a.laps.laps_completed())
    }

    pub fn last_position(&self, id: ActorId) -> Option<Point3<f32>> {
        self.actor(id).map(|a| a.kinematics.position)
    }
}
