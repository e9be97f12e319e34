//! Lap counting from the track parameter.
//!
//! A racer's progress is `laps + t`. Crossing t = 0 forwards adds a lap,
//! crossing it backwards takes one away, so progress stays continuous. A racer
//! that starts behind the line (t near 1) begins on lap -1.

const WRAP_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct LapTracker {
    laps: i32,
    last_t: Option<f32>,
    lap_time: f32,
    last_lap: Option<f32>,
    best_lap: Option<f32>,
}

impl LapTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current track parameter. Returns true when a lap was completed.
    pub fn update(&mut self, t: f32, dt: f32) -> bool {
        let t = if t.is_finite() { t.rem_euclid(1.0) } else { return false };
        self.lap_time += dt.max(0.0);

        let Some(prev) = self.last_t.replace(t) else {
            if t > WRAP_THRESHOLD {
                self.laps = -1;
            }
            return false;
        };

        let delta = t - prev;
        if delta < -WRAP_THRESHOLD {
            self.laps += 1;
            // the first crossing from the grid only starts lap 0
            if self.laps > 0 {
                self.last_lap = Some(self.lap_time);
                self.best_lap = Some(self.best_lap.map_or(self.lap_time, |b| b.min(self.lap_time)));
            }
            self.lap_time = 0.0;
            return self.laps > 0;
        }
        if delta > WRAP_THRESHOLD {
            self.laps -= 1;
        }
        false
    }

    /// Continuous lap-aware progress, in laps.
    pub fn progress(&self) -> f32 {
        self.laps as f32 + self.last_t.unwrap_or(0.0)
    }

    pub fn laps_completed(&self) -> u32 {
        self.laps.max(0) as u32
    }

    pub fn current_lap_time(&self) -> f32 {
        self.lap_time
    }

    pub fn last_lap(&self) -> Option<f32> {
        self.last_lap
    }

    pub fn best_lap(&self) -> Option<f32> {
        self.best_lap
    }
}
