use serde::{Deserialize, Serialize};

use crate::math::clamp_finite;

pub const MAX_WEIGHT: f32 = 100.0;
pub const MAX_FORCE_LIMIT: f32 = 50.0;
pub const MAX_SPEED_LIMIT: f32 = 100.0;
pub const MAX_DISTANCE: f32 = 1_000.0;
pub const MAX_DURATION_FRAMES: u32 = 10_000;
pub const MAX_FLOCKS_LIMIT: usize = 16;
pub const MAX_FLOCKERS_LIMIT: usize = 2_000;
pub const MIN_WORLD_EXTENT: f32 = 1.0;
pub const MAX_WORLD_EXTENT: f32 = 16_384.0;

/// Relative strength of each steering behavior in the blended force.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringWeights {
    pub separation: f32,
    pub cohesion: f32,
    pub alignment: f32,
    pub path: f32,
}

impl Default for SteeringWeights {
    fn default() -> Self {
        Self {
            separation: 32.0,
            cohesion: 14.0,
            alignment: 20.0,
            path: 20.0,
        }
    }
}

impl SteeringWeights {
    fn sanitize(&mut self) {
        let defaults = Self::default();
        self.separation = clamp_finite(self.separation, 0.0, MAX_WEIGHT, defaults.separation);
        self.cohesion = clamp_finite(self.cohesion, 0.0, MAX_WEIGHT, defaults.cohesion);
        self.alignment = clamp_finite(self.alignment, 0.0, MAX_WEIGHT, defaults.alignment);
        self.path = clamp_finite(self.path, 0.0, MAX_WEIGHT, defaults.path);
    }
}

/// Tunables shared by every flock the fleet creates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    pub weights: SteeringWeights,
    pub max_force: f32,
    pub max_speed: f32,
    /// Agents farther than this from the flock's average position skip alignment.
    pub align_radius: f32,
    pub max_separation_distance: f32,
    pub min_path_point_distance: f32,
    pub scatter_duration: u32,
    pub scatter_max_force: f32,
    pub scatter_max_speed: f32,
    pub beat_separate_duration: u32,
    pub beat_cooldown_duration: u32,
    pub beat_separation_weight: f32,
    pub beat_path_weight: f32,
    pub beat_separation_distance: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            weights: SteeringWeights::default(),
            max_force: 0.35,
            max_speed: 5.0,
            align_radius: 23.0,
            max_separation_distance: 15.0,
            min_path_point_distance: 5.0,
            scatter_duration: 70,
            scatter_max_force: 5.0,
            scatter_max_speed: 15.0,
            beat_separate_duration: 15,
            beat_cooldown_duration: 15,
            beat_separation_weight: 35.0,
            beat_path_weight: 30.0,
            beat_separation_distance: 30.0,
        }
    }
}

impl FlockConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.weights.sanitize();
        self.max_force = clamp_finite(self.max_force, 0.0, MAX_FORCE_LIMIT, defaults.max_force);
        self.max_speed = clamp_finite(self.max_speed, 0.0, MAX_SPEED_LIMIT, defaults.max_speed);
        self.align_radius = clamp_finite(self.align_radius, 0.0, MAX_DISTANCE, defaults.align_radius);
        self.max_separation_distance = clamp_finite(
            self.max_separation_distance,
            0.0,
            MAX_DISTANCE,
            defaults.max_separation_distance,
        );
        self.min_path_point_distance = clamp_finite(
            self.min_path_point_distance,
            0.0,
            MAX_DISTANCE,
            defaults.min_path_point_distance,
        );
        self.scatter_duration = self.scatter_duration.clamp(1, MAX_DURATION_FRAMES);
        self.scatter_max_force = clamp_finite(
            self.scatter_max_force,
            0.0,
            MAX_FORCE_LIMIT,
            defaults.scatter_max_force,
        );
        self.scatter_max_speed = clamp_finite(
            self.scatter_max_speed,
            0.0,
            MAX_SPEED_LIMIT,
            defaults.scatter_max_speed,
        );
        self.beat_separate_duration = self.beat_separate_duration.clamp(1, MAX_DURATION_FRAMES);
        self.beat_cooldown_duration = self.beat_cooldown_duration.clamp(1, MAX_DURATION_FRAMES);
        self.beat_separation_weight = clamp_finite(
            self.beat_separation_weight,
            0.0,
            MAX_WEIGHT,
            defaults.beat_separation_weight,
        );
        self.beat_path_weight =
            clamp_finite(self.beat_path_weight, 0.0, MAX_WEIGHT, defaults.beat_path_weight);
        self.beat_separation_distance = clamp_finite(
            self.beat_separation_distance,
            0.0,
            MAX_DISTANCE,
            defaults.beat_separation_distance,
        );
    }
}

/// Adaptive beat-threshold tuning. Bounds are unset by default, so the
/// threshold follows the signal without a floor or ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeatThresholdConfig {
    pub initial: f32,
    pub step: f32,
    pub frames_to_decrement: u32,
    pub floor: Option<f32>,
    pub ceiling: Option<f32>,
}

impl Default for BeatThresholdConfig {
    fn default() -> Self {
        Self {
            initial: 160.0,
            step: 5.0,
            frames_to_decrement: 50,
            floor: None,
            ceiling: None,
        }
    }
}

impl BeatThresholdConfig {
    fn sanitize(&mut self) {
        let defaults = Self::default();
        self.initial = clamp_finite(self.initial, -1.0e6, 1.0e6, defaults.initial);
        self.step = clamp_finite(self.step, 0.0, 1.0e3, defaults.step);
        self.frames_to_decrement = self.frames_to_decrement.clamp(1, MAX_DURATION_FRAMES);
        self.floor = self.floor.filter(|value| value.is_finite());
        self.ceiling = self.ceiling.filter(|value| value.is_finite());
        if let (Some(floor), Some(ceiling)) = (self.floor, self.ceiling) {
            if floor > ceiling {
                self.ceiling = Some(floor);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetConfig {
    pub flock: FlockConfig,
    pub min_flocks: usize,
    pub max_flocks: usize,
    pub initial_flocks: usize,
    pub min_flockers: usize,
    pub max_flockers: usize,
    pub flockers_per_flock: usize,
    pub min_speed_offset: f32,
    pub max_speed_offset: f32,
    /// Minimum gap between any two flocks' speeds at creation time.
    pub min_speed_separation: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub beat_threshold: BeatThresholdConfig,
    pub world_width: f32,
    pub world_height: f32,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            flock: FlockConfig::default(),
            min_flocks: 1,
            max_flocks: 3,
            initial_flocks: 2,
            min_flockers: 30,
            max_flockers: 50,
            flockers_per_flock: 40,
            min_speed_offset: 0.5,
            max_speed_offset: 1.0,
            min_speed_separation: 0.3,
            min_speed: 4.0,
            max_speed: 6.0,
            beat_threshold: BeatThresholdConfig::default(),
            world_width: 640.0,
            world_height: 480.0,
        }
    }
}

impl FleetConfig {
    pub fn sanitize(&mut self) {
        let defaults = Self::default();
        self.flock.sanitize();

        self.max_flocks = self.max_flocks.clamp(1, MAX_FLOCKS_LIMIT);
        self.min_flocks = self.min_flocks.clamp(1, self.max_flocks);
        self.initial_flocks = self.initial_flocks.clamp(self.min_flocks, self.max_flocks);

        self.max_flockers = self.max_flockers.clamp(1, MAX_FLOCKERS_LIMIT);
        self.min_flockers = self.min_flockers.clamp(1, self.max_flockers);
        self.flockers_per_flock = self
            .flockers_per_flock
            .clamp(self.min_flockers, self.max_flockers);

        self.max_speed_offset = clamp_finite(
            self.max_speed_offset,
            0.0,
            MAX_SPEED_LIMIT,
            defaults.max_speed_offset,
        );
        self.min_speed_offset = clamp_finite(
            self.min_speed_offset,
            0.0,
            self.max_speed_offset,
            defaults.min_speed_offset.min(self.max_speed_offset),
        );
        self.min_speed_separation = clamp_finite(
            self.min_speed_separation,
            0.0,
            MAX_SPEED_LIMIT,
            defaults.min_speed_separation,
        );
        self.max_speed = clamp_finite(self.max_speed, 0.0, MAX_SPEED_LIMIT, defaults.max_speed);
        self.min_speed = clamp_finite(
            self.min_speed,
            0.0,
            self.max_speed,
            defaults.min_speed.min(self.max_speed),
        );

        self.beat_threshold.sanitize();
        self.world_width = clamp_finite(
            self.world_width,
            MIN_WORLD_EXTENT,
            MAX_WORLD_EXTENT,
            defaults.world_width,
        );
        self.world_height = clamp_finite(
            self.world_height,
            MIN_WORLD_EXTENT,
            MAX_WORLD_EXTENT,
            defaults.world_height,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{FleetConfig, FlockConfig};

    #[test]
    fn defaults_survive_sanitize_unchanged() {
        let mut config = FleetConfig::default();
        config.sanitize();
        assert_eq!(config, FleetConfig::default());
    }

    #[test]
    fn sanitize_replaces_non_finite_values() {
        let mut config = FlockConfig {
            max_speed: f32::NAN,
            align_radius: f32::INFINITY,
            ..FlockConfig::default()
        };
        config.weights.cohesion = f32::NEG_INFINITY;
        config.sanitize();

        assert_eq!(config.max_speed, 5.0);
        assert_eq!(config.align_radius, 23.0);
        assert_eq!(config.weights.cohesion, 14.0);
    }

    #[test]
    fn sanitize_orders_bounds() {
        let mut config = FleetConfig {
            min_flocks: 9,
            max_flocks: 2,
            initial_flocks: 0,
            min_flockers: 80,
            max_flockers: 60,
            flockers_per_flock: 5,
            ..FleetConfig::default()
        };
        config.beat_threshold.floor = Some(50.0);
        config.beat_threshold.ceiling = Some(10.0);
        config.sanitize();

        assert_eq!(config.max_flocks, 2);
        assert_eq!(config.min_flocks, 2);
        assert_eq!(config.initial_flocks, 2);
        assert_eq!(config.min_flockers, 60);
        assert_eq!(config.flockers_per_flock, 60);
        assert_eq!(config.beat_threshold.ceiling, Some(50.0));
    }

    #[test]
    fn zero_durations_are_raised_to_one_frame() {
        let mut config = FlockConfig {
            scatter_duration: 0,
            beat_separate_duration: 0,
            beat_cooldown_duration: 0,
            ..FlockConfig::default()
        };
        config.sanitize();
        assert_eq!(config.scatter_duration, 1);
        assert_eq!(config.beat_separate_duration, 1);
        assert_eq!(config.beat_cooldown_duration, 1);
    }
}
