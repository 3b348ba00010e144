use rand::Rng;
use tracing::debug;

use crate::audio::PathPoints;
use crate::config::{FlockConfig, SteeringWeights};
use crate::flocker::{Flocker, SteeringContext};
use crate::math::Vec2;
use crate::path::PathCursor;
use crate::style::FlockColor;

/// Beat reaction: widen spacing for a while, then refuse to react again
/// until the cooldown has run out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BeatPhase {
    #[default]
    Idle,
    Separating {
        elapsed: u32,
    },
    Cooling {
        elapsed: u32,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum ScatterState {
    #[default]
    Idle,
    Scattering {
        elapsed: u32,
        /// Path point index each flocker seeks, looked up in the live path every frame.
        targets: Vec<usize>,
    },
}

/// A group of flockers sharing weights, limits and state machines.
pub struct Flock {
    config: FlockConfig,
    bounds: Vec2,
    flockers: Vec<Flocker>,
    forces: Vec<Vec2>,
    average_position: Vec2,
    average_direction: Vec2,
    weights: SteeringWeights,
    max_separation_distance: f32,
    cruise_speed: f32,
    max_speed: f32,
    max_force: f32,
    cursor: PathCursor,
    scatter: ScatterState,
    beat: BeatPhase,
    color: FlockColor,
}

impl Flock {
    /// An empty flock. `cruise_speed` becomes its resting `max_speed`;
    /// `bounds` is the extent new flockers are spawned within.
    pub fn new(config: FlockConfig, cruise_speed: f32, bounds: Vec2) -> Self {
        Self {
            config,
            bounds,
            flockers: Vec::new(),
            forces: Vec::new(),
            average_position: Vec2::ZERO,
            average_direction: Vec2::ZERO,
            weights: config.weights,
            max_separation_distance: config.max_separation_distance,
            cruise_speed,
            max_speed: cruise_speed,
            max_force: config.max_force,
            cursor: PathCursor::new(),
            scatter: ScatterState::Idle,
            beat: BeatPhase::Idle,
            color: FlockColor::default(),
        }
    }

    pub fn flockers(&self) -> &[Flocker] {
        &self.flockers
    }

    pub fn len(&self) -> usize {
        self.flockers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flockers.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.flockers.iter().map(Flocker::position)
    }

    pub fn average_position(&self) -> Vec2 {
        self.average_position
    }

    pub fn average_direction(&self) -> Vec2 {
        self.average_direction
    }

    pub fn weights(&self) -> SteeringWeights {
        self.weights
    }

    pub fn max_separation_distance(&self) -> f32 {
        self.max_separation_distance
    }

    pub fn cruise_speed(&self) -> f32 {
        self.cruise_speed
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    pub fn path_cursor(&self) -> PathCursor {
        self.cursor
    }

    pub fn is_scattering(&self) -> bool {
        matches!(self.scatter, ScatterState::Scattering { .. })
    }

    pub fn beat_phase(&self) -> BeatPhase {
        self.beat
    }

    pub fn color(&self) -> FlockColor {
        self.color
    }

    pub fn set_color(&mut self, color: FlockColor) {
        self.color = color;
    }

    /// Appends a flocker at `position`.
    pub fn spawn_at(&mut self, position: Vec2) {
        self.flockers.push(Flocker::new(position));
    }

    /// Grows with flockers at random spots inside the bounds, or drops the
    /// most recently added ones.
    pub fn set_population<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        let current = self.flockers.len();
        if count == current {
            return;
        }

        if count > current {
            self.flockers.reserve(count - current);
            for _ in current..count {
                let position = self.random_position(rng);
                self.spawn_at(position);
            }
        } else {
            self.flockers.truncate(count);
        }
    }

    fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.random::<f32>() * self.bounds.x,
            rng.random::<f32>() * self.bounds.y,
        )
    }

    /// Averages, then every flocker, then both state machines.
    pub fn update(&mut self, path: &PathPoints<'_>) {
        self.update_averages();

        if self.is_scattering() {
            self.update_scattering(path);
        } else {
            self.update_steering(path);
        }

        self.advance_scatter();
        self.advance_beat();
    }

    /// Average heading is left unnormalized so its length reflects consensus.
    pub fn update_averages(&mut self) {
        if self.flockers.is_empty() {
            self.average_position = Vec2::ZERO;
            self.average_direction = Vec2::ZERO;
            return;
        }

        let mut total_position = Vec2::ZERO;
        let mut total_direction = Vec2::ZERO;
        for flocker in &self.flockers {
            total_position += flocker.position();
            total_direction += flocker.heading();
        }

        let inv_count = 1.0 / self.flockers.len() as f32;
        self.average_position = total_position * inv_count;
        self.average_direction = total_direction * inv_count;
    }

    fn update_steering(&mut self, path: &PathPoints<'_>) {
        let ctx = SteeringContext {
            neighbors: &self.flockers,
            average_position: self.average_position,
            average_direction: self.average_direction,
            weights: self.weights,
            max_speed: self.max_speed,
            max_force: self.max_force,
            align_radius: self.config.align_radius,
            max_separation_distance: self.max_separation_distance,
            min_path_point_distance: self.config.min_path_point_distance,
        };

        // Forces are computed from the frame's starting positions before anyone moves.
        self.forces.clear();
        for flocker in ctx.neighbors {
            let force = flocker.steering_force(&ctx, &mut self.cursor, path);
            self.forces.push(force);
        }

        for (flocker, &force) in self.flockers.iter_mut().zip(&self.forces) {
            flocker.update(force, self.max_speed);
        }
    }

    fn update_scattering(&mut self, path: &PathPoints<'_>) {
        let ScatterState::Scattering { targets, .. } = &self.scatter else {
            return;
        };

        for (i, flocker) in self.flockers.iter_mut().enumerate() {
            let slot = targets.get(i).copied().unwrap_or(0);
            let force = match path.point(slot).or_else(|| path.point(0)) {
                Some(target) => flocker
                    .seek(target, self.max_speed)
                    .normalize_to_magnitude(self.max_force),
                None => Vec2::ZERO,
            };
            flocker.update(force, self.max_speed);
        }
    }

    fn advance_scatter(&mut self) {
        let ScatterState::Scattering { elapsed, .. } = &mut self.scatter else {
            return;
        };

        *elapsed += 1;
        if *elapsed >= self.config.scatter_duration {
            self.scatter = ScatterState::Idle;
            self.max_force = self.config.max_force;
            self.max_speed = self.cruise_speed;
            debug!(flockers = self.flockers.len(), "scatter finished");
        }
    }

    fn advance_beat(&mut self) {
        self.beat = match self.beat {
            BeatPhase::Idle => BeatPhase::Idle,
            BeatPhase::Separating { elapsed } => {
                let elapsed = elapsed + 1;
                if elapsed >= self.config.beat_separate_duration {
                    self.weights.separation = self.config.weights.separation;
                    self.weights.path = self.config.weights.path;
                    self.max_separation_distance = self.config.max_separation_distance;
                    debug!("beat separation finished, cooling down");
                    BeatPhase::Cooling { elapsed: 0 }
                } else {
                    BeatPhase::Separating { elapsed }
                }
            }
            BeatPhase::Cooling { elapsed } => {
                let elapsed = elapsed + 1;
                if elapsed >= self.config.beat_cooldown_duration {
                    BeatPhase::Idle
                } else {
                    BeatPhase::Cooling { elapsed }
                }
            }
        };
    }

    /// Sends every flocker toward its own random point of the live path at
    /// burst force and speed. Restarts the timer if already scattering.
    pub fn scatter<R: Rng + ?Sized>(&mut self, path: &PathPoints<'_>, rng: &mut R) {
        let targets = self
            .flockers
            .iter()
            .map(|_| {
                if path.is_empty() {
                    0
                } else {
                    rng.random_range(0..path.len())
                }
            })
            .collect();

        self.scatter = ScatterState::Scattering {
            elapsed: 0,
            targets,
        };
        self.max_force = self.config.scatter_max_force;
        self.max_speed = self.config.scatter_max_speed;
        debug!(
            flockers = self.flockers.len(),
            path_points = path.len(),
            "scatter started"
        );
    }

    /// Returns whether a separation phase started. Ignored unless idle.
    pub fn beat_separate(&mut self) -> bool {
        if self.beat != BeatPhase::Idle {
            return false;
        }

        self.beat = BeatPhase::Separating { elapsed: 0 };
        self.weights.separation = self.config.beat_separation_weight;
        self.weights.path = self.config.beat_path_weight;
        self.max_separation_distance = self.config.beat_separation_distance;
        debug!("beat separation started");
        true
    }
}
