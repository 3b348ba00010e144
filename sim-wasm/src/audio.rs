use std::f32::consts::TAU;

use crate::math::Vec2;

/// Samples are divided by this before being added to the ring radius.
pub const AMPLITUDE_RADIUS_DIVISOR: f32 = 1.5;

/// Read-only view over an interleaved `[x0, y0, x1, y1, ...]` path sequence.
/// A trailing unpaired value is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathPoints<'a> {
    coords: &'a [f32],
}

impl<'a> PathPoints<'a> {
    pub fn new(coords: &'a [f32]) -> Self {
        Self { coords }
    }

    /// Number of complete (x, y) pairs.
    pub fn len(&self) -> usize {
        self.coords.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn point(&self, index: usize) -> Option<Vec2> {
        if index >= self.len() {
            return None;
        }
        Some(Vec2::new(self.coords[index * 2], self.coords[index * 2 + 1]))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BeatSignal {
    pub above_threshold: bool,
    pub silent: bool,
}

impl BeatSignal {
    pub fn new(above_threshold: bool, silent: bool) -> Self {
        Self {
            above_threshold,
            silent,
        }
    }

    /// Silence wins over everything; otherwise the average must reach the threshold.
    pub fn classify(average: f32, threshold: f32) -> Self {
        if average == 0.0 {
            return Self::new(false, true);
        }
        Self::new(average >= threshold, false)
    }
}

/// Everything the engine reads from the audio side for one frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct AudioFrame<'a> {
    pub path: PathPoints<'a>,
    pub signal: BeatSignal,
}

impl<'a> AudioFrame<'a> {
    pub fn new(path: &'a [f32], signal: BeatSignal) -> Self {
        Self {
            path: PathPoints::new(path),
            signal,
        }
    }
}

/// Circle the amplitude samples are laid around.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingLayout {
    pub center: Vec2,
    pub radius: f32,
}

impl RingLayout {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Centered in a `width` x `height` canvas with a radius of a sixth of the height.
    pub fn for_canvas(width: f32, height: f32) -> Self {
        Self::new(Vec2::new(width * 0.5, height * 0.5), height / 6.0)
    }
}

/// Lays sample `i` of `n` at angle `TAU * i / n`, pushed outward by its amplitude.
pub fn trace_ring(samples: &[u8], layout: RingLayout) -> Vec<f32> {
    let mut path = Vec::with_capacity(samples.len() * 2);
    if samples.is_empty() {
        return path;
    }

    let angle_step = TAU / samples.len() as f32;
    for (i, &sample) in samples.iter().enumerate() {
        let angle = angle_step * i as f32;
        let reach = layout.radius + f32::from(sample) / AMPLITUDE_RADIUS_DIVISOR;
        path.push(layout.center.x + angle.cos() * reach);
        path.push(layout.center.y + angle.sin() * reach);
    }
    path
}

pub fn average_amplitude(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let total: u32 = samples.iter().map(|&sample| u32::from(sample)).sum();
    total as f32 / samples.len() as f32
}
