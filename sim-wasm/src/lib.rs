//! Audio-reactive flocking simulation.
//!
//! [`FleetManager`] owns several flocks that steer along a path traced from
//! live audio amplitudes, widen on beats and scatter on demand. [`Sim`] wraps
//! it for a browser host through `wasm-bindgen`; the engine itself is plain
//! Rust and runs natively as well.

use tracing::warn;
use wasm_bindgen::prelude::*;

pub mod audio;
pub mod config;
pub mod error;
pub mod fleet;
pub mod flock;
pub mod flocker;
pub mod math;
pub mod path;
pub mod style;

pub use audio::{AudioFrame, BeatSignal, PathPoints, RingLayout};
pub use config::{BeatThresholdConfig, FleetConfig, FlockConfig, SteeringWeights};
pub use error::SimError;
pub use fleet::{BeatThreshold, FleetManager};
pub use flock::{BeatPhase, Flock};
pub use flocker::Flocker;
pub use math::Vec2;
pub use style::{DrawMode, FlockColor, GRADIENT_STOPS};

const FALLBACK_SEED: u64 = 0x5EED_F10C_0000_0001;

#[wasm_bindgen]
pub struct Sim {
    fleet: FleetManager,
    draw_mode: DrawMode,
    /// Path from the latest frame; scatter targets are drawn from it.
    path: Vec<f32>,
    render_positions: Vec<f32>,
    flock_offsets: Vec<u32>,
}

#[wasm_bindgen]
impl Sim {
    /// A seed of 0 asks for an entropy-derived seed.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32, width: f32, height: f32) -> Sim {
        let mut config = FleetConfig::default();
        config.world_width = width;
        config.world_height = height;
        Sim::from_config(config, seed)
    }

    /// Builds from a (possibly partial) `FleetConfig` object; missing fields
    /// take their defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue, seed: u32) -> Result<Sim, JsError> {
        let config = if config.is_null() || config.is_undefined() {
            FleetConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<FleetConfig>(config)
                .map_err(|err| SimError::InvalidConfig(err.to_string()))?
        };
        Ok(Sim::from_config(config, seed))
    }

    #[wasm_bindgen(js_name = advanceFrame)]
    pub fn advance_frame(&mut self, path_points: &[f32], above_threshold: bool, silent: bool) {
        self.path.clear();
        self.path.extend_from_slice(path_points);
        let frame = AudioFrame::new(&self.path, BeatSignal::new(above_threshold, silent));
        self.fleet.advance_frame(&frame);
        self.sync_render_buffers();
    }

    /// Traces the path from raw analyser bytes and classifies the beat against
    /// the fleet's own threshold. A non-finite center or a radius that is not
    /// positive falls back to the ring centered on the world.
    #[wasm_bindgen(js_name = advanceFrameFromSamples)]
    pub fn advance_frame_from_samples(
        &mut self,
        samples: &[u8],
        center_x: f32,
        center_y: f32,
        radius: f32,
    ) {
        let center = Vec2::new(center_x, center_y);
        let usable = center.x.is_finite() && center.y.is_finite() && radius > 0.0;
        let layout = if usable && radius.is_finite() {
            RingLayout::new(center, radius)
        } else {
            let config = self.fleet.config();
            RingLayout::for_canvas(config.world_width, config.world_height)
        };
        self.path = audio::trace_ring(samples, layout);
        let signal = BeatSignal::classify(
            audio::average_amplitude(samples),
            self.fleet.beat_threshold().value(),
        );
        self.fleet.advance_frame(&AudioFrame::new(&self.path, signal));
        self.sync_render_buffers();
    }

    #[wasm_bindgen(js_name = triggerScatterAll)]
    pub fn trigger_scatter_all(&mut self) {
        self.fleet.trigger_scatter_all(&PathPoints::new(&self.path));
    }

    #[wasm_bindgen(js_name = setFleetSize)]
    pub fn set_fleet_size(&mut self, count: usize) {
        self.fleet.set_fleet_size(count);
        self.sync_render_buffers();
    }

    #[wasm_bindgen(js_name = setFlockersPerFlock)]
    pub fn set_flockers_per_flock(&mut self, count: usize) {
        self.fleet.set_flockers_per_flock(count);
        self.sync_render_buffers();
    }

    #[wasm_bindgen(js_name = setFleetColor)]
    pub fn set_fleet_color(&mut self, tag: &str) -> Result<(), JsError> {
        let color = tag.parse::<FlockColor>()?;
        self.fleet.set_color(color);
        Ok(())
    }

    #[wasm_bindgen(js_name = setDrawMode)]
    pub fn set_draw_mode(&mut self, tag: &str) -> Result<(), JsError> {
        self.draw_mode = tag.parse::<DrawMode>()?;
        Ok(())
    }

    #[wasm_bindgen(js_name = resetBeatThreshold)]
    pub fn reset_beat_threshold(&mut self) {
        self.fleet.reset_beat_threshold();
    }

    #[wasm_bindgen(js_name = flockCount)]
    pub fn flock_count(&self) -> usize {
        self.fleet.flocks().len()
    }

    #[wasm_bindgen(js_name = flockerCount)]
    pub fn flocker_count(&self) -> usize {
        self.fleet.flocks().iter().map(Flock::len).sum()
    }

    #[wasm_bindgen(js_name = beatThreshold)]
    pub fn beat_threshold(&self) -> f32 {
        self.fleet.beat_threshold().value()
    }

    #[wasm_bindgen(js_name = fleetColor)]
    pub fn fleet_color(&self) -> String {
        self.fleet.color().as_str().to_string()
    }

    /// Solid fill as `[r, g, b]`; empty when the fleet paints the gradient.
    #[wasm_bindgen(js_name = fleetColorRgb)]
    pub fn fleet_color_rgb(&self) -> Vec<u8> {
        self.fleet
            .color()
            .rgb()
            .map(|rgb| rgb.to_vec())
            .unwrap_or_default()
    }

    /// Flattened `offset, r, g, b` quadruples for the diagonal gradient.
    #[wasm_bindgen(js_name = gradientStops)]
    pub fn gradient_stops() -> Vec<f32> {
        GRADIENT_STOPS
            .iter()
            .flat_map(|&(offset, [r, g, b])| {
                [offset, f32::from(r), f32::from(g), f32::from(b)]
            })
            .collect()
    }

    #[wasm_bindgen(js_name = drawMode)]
    pub fn draw_mode(&self) -> u32 {
        self.draw_mode.as_u32()
    }

    #[wasm_bindgen(js_name = drawModeName)]
    pub fn draw_mode_name(&self) -> String {
        self.draw_mode.as_str().to_string()
    }

    /// Interleaved x, y positions of one flock; empty for an unknown index.
    #[wasm_bindgen(js_name = flockPositions)]
    pub fn flock_positions(&self, index: usize) -> Vec<f32> {
        self.fleet
            .flocks()
            .get(index)
            .map(|flock| flock.positions().flat_map(|p| [p.x, p.y]).collect())
            .unwrap_or_default()
    }

    /// Start of each flock in the render buffer, in floats, plus a final end offset.
    #[wasm_bindgen(js_name = flockOffsets)]
    pub fn flock_offsets(&self) -> Vec<u32> {
        self.flock_offsets.clone()
    }

    #[wasm_bindgen(js_name = positionsPtr)]
    pub fn positions_ptr(&self) -> *const f32 {
        self.render_positions.as_ptr()
    }

    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.render_positions.len()
    }
}

impl Sim {
    pub fn from_config(config: FleetConfig, seed: u32) -> Sim {
        let mut sim = Sim {
            fleet: FleetManager::new(config, resolve_seed(seed)),
            draw_mode: DrawMode::default(),
            path: Vec::new(),
            render_positions: Vec::new(),
            flock_offsets: Vec::new(),
        };
        sim.sync_render_buffers();
        sim
    }

    pub fn fleet(&self) -> &FleetManager {
        &self.fleet
    }

    pub fn draw_mode_kind(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn render_positions(&self) -> &[f32] {
        &self.render_positions
    }

    fn sync_render_buffers(&mut self) {
        self.render_positions.clear();
        self.flock_offsets.clear();
        for flock in self.fleet.flocks() {
            self.flock_offsets.push(self.render_positions.len() as u32);
            for position in flock.positions() {
                self.render_positions.push(position.x);
                self.render_positions.push(position.y);
            }
        }
        self.flock_offsets.push(self.render_positions.len() as u32);
    }
}

fn resolve_seed(seed: u32) -> u64 {
    if seed != 0 {
        return u64::from(seed);
    }
    match getrandom::u64() {
        Ok(entropy) => entropy,
        Err(err) => {
            warn!(%err, "entropy unavailable, using fallback seed");
            FALLBACK_SEED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{audio, DrawMode, FlockColor, RingLayout, Sim};

    fn ring(len: usize) -> Vec<f32> {
        (0..len)
            .flat_map(|i| {
                let angle = i as f32 / len as f32 * std::f32::consts::TAU;
                [320.0 + angle.cos() * 90.0, 240.0 + angle.sin() * 90.0]
            })
            .collect()
    }

    #[test]
    fn render_buffer_tracks_every_flocker() {
        let mut sim = Sim::new(12, 640.0, 480.0);
        assert_eq!(sim.flock_count(), 2);
        assert_eq!(sim.flocker_count(), 80);
        assert_eq!(sim.positions_len(), 160);
        assert_eq!(sim.flock_offsets(), vec![0, 80, 160]);

        sim.set_fleet_size(3);
        sim.set_flockers_per_flock(35);
        assert_eq!(sim.positions_len(), 3 * 35 * 2);
        assert_eq!(sim.flock_offsets(), vec![0, 70, 140, 210]);
        assert_eq!(&sim.render_positions()[70..140], &sim.flock_positions(1)[..]);
        assert!(sim.flock_positions(7).is_empty());
    }

    #[test]
    fn frames_move_flockers_along_the_path() {
        let mut sim = Sim::new(3, 640.0, 480.0);
        let before = sim.render_positions().to_vec();
        let path = ring(128);
        for _ in 0..10 {
            sim.advance_frame(&path, false, false);
        }
        assert_ne!(before, sim.render_positions());
        assert!(sim.render_positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_and_odd_paths_are_tolerated() {
        let mut sim = Sim::new(4, 640.0, 480.0);
        sim.advance_frame(&[], false, true);
        sim.advance_frame(&[10.0, 20.0, 30.0], true, false);
        sim.trigger_scatter_all();
        sim.advance_frame(&[], false, false);
        assert!(sim.render_positions().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn scatter_uses_the_latest_path() {
        let mut sim = Sim::new(5, 640.0, 480.0);
        sim.advance_frame(&ring(64), false, false);
        sim.trigger_scatter_all();
        assert!(sim.fleet().flocks().iter().all(|flock| flock.is_scattering()));
    }

    #[test]
    fn samples_drive_the_owned_threshold() {
        let mut sim = Sim::new(6, 640.0, 480.0);
        let loud = [200u8; 128];
        sim.advance_frame_from_samples(&loud, 320.0, 240.0, 80.0);
        assert_eq!(sim.beat_threshold(), 165.0);

        let silent = [0u8; 128];
        sim.advance_frame_from_samples(&silent, 320.0, 240.0, 80.0);
        assert_eq!(sim.beat_threshold(), 165.0);

        sim.reset_beat_threshold();
        assert_eq!(sim.beat_threshold(), 160.0);
    }

    #[test]
    fn style_tags_round_trip() {
        let mut sim = Sim::new(7, 640.0, 480.0);
        assert!(sim.set_fleet_color("Gradient").is_ok());
        assert_eq!(sim.fleet_color(), "gradient");
        assert_eq!(sim.fleet().color(), FlockColor::Gradient);

        assert!(sim.set_draw_mode("Bars").is_ok());
        assert_eq!(sim.draw_mode_kind(), DrawMode::Bars);
        assert_eq!(sim.draw_mode(), 4);
    }

    #[test]
    fn degenerate_ring_falls_back_to_the_world_center() {
        let mut sim = Sim::new(8, 640.0, 480.0);
        let samples = [90u8; 64];
        let centered = audio::trace_ring(&samples, RingLayout::for_canvas(640.0, 480.0));

        sim.advance_frame_from_samples(&samples, f32::NAN, 240.0, 80.0);
        assert_eq!(sim.path, centered);
        sim.advance_frame_from_samples(&samples, 320.0, 240.0, 0.0);
        assert_eq!(sim.path, centered);

        sim.advance_frame_from_samples(&samples, 100.0, 100.0, 20.0);
        assert_ne!(sim.path, centered);
    }

    #[test]
    fn renderer_styles_are_exposed() {
        let mut sim = Sim::new(9, 640.0, 480.0);
        assert_eq!(sim.fleet_color_rgb(), vec![255, 0, 0]);
        assert!(sim.set_fleet_color("green").is_ok());
        assert_eq!(sim.fleet_color_rgb(), vec![0, 128, 0]);
        assert!(sim.set_fleet_color("gradient").is_ok());
        assert!(sim.fleet_color_rgb().is_empty());

        let stops = Sim::gradient_stops();
        assert_eq!(stops.len(), 16);
        assert_eq!(&stops[..4], &[0.0, 206.0, 0.0, 206.0]);
        assert_eq!(stops[12], 1.0);

        assert_eq!(sim.draw_mode_name(), "None");
        assert!(sim.set_draw_mode("cubiccurves").is_ok());
        assert_eq!(sim.draw_mode_name(), "CubicCurves");
    }
}
