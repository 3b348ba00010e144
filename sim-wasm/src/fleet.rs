use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::audio::{AudioFrame, BeatSignal, PathPoints};
use crate::config::{BeatThresholdConfig, FleetConfig};
use crate::flock::Flock;
use crate::math::Vec2;
use crate::style::FlockColor;

/// Upper bound on speed redraws for one new flock.
pub const MAX_SPEED_ATTEMPTS: usize = 64;

/// Self-tuning amplitude level above which the audio counts as a beat.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatThreshold {
    config: BeatThresholdConfig,
    value: f32,
    frames_since_beat: u32,
}

impl BeatThreshold {
    pub fn new(config: BeatThresholdConfig) -> Self {
        Self {
            config,
            value: config.initial,
            frames_since_beat: 0,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn frames_since_beat(&self) -> u32 {
        self.frames_since_beat
    }

    /// Back to the configured starting level, e.g. when the track changes.
    pub fn reset(&mut self) {
        self.value = self.config.initial;
        self.frames_since_beat = 0;
    }

    /// Beats push the threshold up every frame; a long enough run without
    /// one lowers it a step. Silence only clears the run.
    pub fn update(&mut self, signal: BeatSignal) {
        if signal.silent {
            self.frames_since_beat = 0;
            return;
        }

        if signal.above_threshold {
            self.adjust(self.config.step);
            self.frames_since_beat = 0;
            return;
        }

        self.frames_since_beat += 1;
        if self.frames_since_beat >= self.config.frames_to_decrement {
            self.adjust(-self.config.step);
            self.frames_since_beat = 0;
        }
    }

    fn adjust(&mut self, delta: f32) {
        let mut value = self.value + delta;
        if let Some(floor) = self.config.floor {
            value = value.max(floor);
        }
        if let Some(ceiling) = self.config.ceiling {
            value = value.min(ceiling);
        }
        trace!(from = self.value, to = value, "beat threshold adjusted");
        self.value = value;
    }
}

/// Owns every flock plus the shared beat threshold.
pub struct FleetManager {
    config: FleetConfig,
    flocks: Vec<Flock>,
    flockers_per_flock: usize,
    color: FlockColor,
    threshold: BeatThreshold,
    rng: SmallRng,
}

impl FleetManager {
    /// Starts with `initial_flocks` flocks of `flockers_per_flock` each.
    pub fn new(mut config: FleetConfig, seed: u64) -> Self {
        config.sanitize();
        let mut fleet = Self {
            config,
            flocks: Vec::with_capacity(config.max_flocks),
            flockers_per_flock: config.flockers_per_flock,
            color: FlockColor::default(),
            threshold: BeatThreshold::new(config.beat_threshold),
            rng: SmallRng::seed_from_u64(seed),
        };
        fleet.set_fleet_size(config.initial_flocks);
        fleet
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn flocks(&self) -> &[Flock] {
        &self.flocks
    }

    pub fn flockers_per_flock(&self) -> usize {
        self.flockers_per_flock
    }

    pub fn color(&self) -> FlockColor {
        self.color
    }

    pub fn beat_threshold(&self) -> &BeatThreshold {
        &self.threshold
    }

    pub fn reset_beat_threshold(&mut self) {
        self.threshold.reset();
        debug!(threshold = self.threshold.value(), "beat threshold reset");
    }

    /// Tunes the threshold, updates every flock and, on a beat, asks each
    /// flock to react.
    pub fn advance_frame(&mut self, frame: &AudioFrame<'_>) {
        self.threshold.update(frame.signal);

        for flock in &mut self.flocks {
            flock.update(&frame.path);
            if frame.signal.above_threshold {
                flock.beat_separate();
            }
        }
    }

    pub fn trigger_scatter_all(&mut self, path: &PathPoints<'_>) {
        for flock in &mut self.flocks {
            flock.scatter(path, &mut self.rng);
        }
    }

    /// Clamped to the configured flock range; shrinking drops the newest flocks.
    pub fn set_fleet_size(&mut self, count: usize) {
        let count = count.clamp(self.config.min_flocks, self.config.max_flocks);
        if count == self.flocks.len() {
            return;
        }

        while self.flocks.len() < count {
            self.create_flock();
        }
        self.flocks.truncate(count);
        info!(flocks = count, "fleet resized");
    }

    /// Clamped to the configured per-flock range and applied to every flock.
    pub fn set_flockers_per_flock(&mut self, count: usize) {
        let count = count.clamp(self.config.min_flockers, self.config.max_flockers);
        self.flockers_per_flock = count;
        for flock in &mut self.flocks {
            flock.set_population(count, &mut self.rng);
        }
        info!(flockers_per_flock = count, "flock population changed");
    }

    pub fn set_color(&mut self, color: FlockColor) {
        self.color = color;
        for flock in &mut self.flocks {
            flock.set_color(color);
        }
        info!(color = color.as_str(), "fleet color changed");
    }

    fn create_flock(&mut self) {
        let speed = self.pick_flock_speed();
        let bounds = Vec2::new(self.config.world_width, self.config.world_height);
        let mut flock = Flock::new(self.config.flock, speed, bounds);
        flock.set_population(self.flockers_per_flock, &mut self.rng);
        flock.set_color(self.color);
        info!(
            index = self.flocks.len(),
            max_speed = speed,
            flockers = flock.len(),
            "flock created"
        );
        self.flocks.push(flock);
    }

    /// Random walk away from the default speed until a speed inside the band
    /// has no existing flock within `min_speed_separation`. A walk that leaves
    /// the band is clamped back and kept only if that clamped speed is clear;
    /// otherwise, as when attempts run out, the roomiest in-band speed wins.
    fn pick_flock_speed(&mut self) -> f32 {
        let min = self.config.min_speed;
        let max = self.config.max_speed;
        let mut speed = self.config.flock.max_speed + self.random_speed_offset();

        for attempt in 1..MAX_SPEED_ATTEMPTS {
            if speed < min || speed > max {
                let clamped = speed.clamp(min, max);
                if !self.conflicts_with_existing(clamped) {
                    return clamped;
                }
                debug!(speed, attempt, "flock speed left the band");
                return self.roomiest_speed(min, max);
            }
            if !self.conflicts_with_existing(speed) {
                return speed;
            }
            speed += self.random_speed_offset();
        }

        debug!(speed, "flock speed attempts exhausted");
        self.roomiest_speed(min, max)
    }

    /// In-band speed farthest from every existing flock: a band edge or the
    /// midpoint between two neighbouring flock speeds.
    fn roomiest_speed(&self, min: f32, max: f32) -> f32 {
        let mut speeds: Vec<f32> = self
            .flocks
            .iter()
            .map(|flock| flock.cruise_speed().clamp(min, max))
            .collect();
        speeds.sort_by(f32::total_cmp);

        let midpoints = speeds.windows(2).map(|pair| (pair[0] + pair[1]) * 0.5);
        [min, max]
            .into_iter()
            .chain(midpoints)
            .map(|speed| (speed, self.nearest_flock_gap(speed)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map_or(min, |(speed, _)| speed)
    }

    fn nearest_flock_gap(&self, speed: f32) -> f32 {
        self.flocks
            .iter()
            .map(|flock| (flock.cruise_speed() - speed).abs())
            .fold(f32::INFINITY, f32::min)
    }

    fn conflicts_with_existing(&self, speed: f32) -> bool {
        self.nearest_flock_gap(speed) < self.config.min_speed_separation
    }

    fn random_speed_offset(&mut self) -> f32 {
        let low = self.config.min_speed_offset;
        let high = self.config.max_speed_offset;
        let magnitude = if high > low {
            self.rng.random_range(low..high)
        } else {
            low
        };
        if self.rng.random_bool(0.5) {
            -magnitude
        } else {
            magnitude
        }
    }
}
