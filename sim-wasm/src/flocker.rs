use crate::audio::PathPoints;
use crate::config::SteeringWeights;
use crate::math::Vec2;
use crate::path::PathCursor;

/// Flock-wide values a flocker steers against during one frame.
#[derive(Clone, Copy, Debug)]
pub struct SteeringContext<'a> {
    /// Every flocker in the flock, including the one being steered.
    pub neighbors: &'a [Flocker],
    pub average_position: Vec2,
    pub average_direction: Vec2,
    pub weights: SteeringWeights,
    pub max_speed: f32,
    pub max_force: f32,
    pub align_radius: f32,
    pub max_separation_distance: f32,
    pub min_path_point_distance: f32,
}

/// One steerable point-mass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flocker {
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    heading: Vec2,
}

impl Flocker {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn heading(&self) -> Vec2 {
        self.heading
    }

    /// Forces accumulate until the next [`Flocker::update_position`].
    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Applies `force` and advances exactly one frame.
    pub fn update(&mut self, force: Vec2, max_speed: f32) {
        self.apply_force(force);
        self.update_position(max_speed);
    }

    pub fn update_position(&mut self, max_speed: f32) {
        self.velocity += self.acceleration;
        if self.velocity.magnitude() > max_speed {
            self.velocity = self.velocity.normalize_to_magnitude(max_speed);
        }
        self.position += self.velocity;
        self.heading = self.velocity.normalize();
        self.acceleration = Vec2::ZERO;
    }

    /// Unit steering force toward `target`.
    pub fn seek(&self, target: Vec2, max_speed: f32) -> Vec2 {
        let desired = (target - self.position).normalize_to_magnitude(max_speed);
        (desired - self.velocity).normalize()
    }

    /// Unit steering force away from `target`.
    pub fn flee(&self, target: Vec2, max_speed: f32) -> Vec2 {
        let desired = (self.position - target).normalize_to_magnitude(max_speed);
        (desired - self.velocity).normalize()
    }

    /// Zero when this flocker is outside the align radius.
    pub fn alignment(&self, ctx: &SteeringContext<'_>) -> Vec2 {
        if self.position.distance(ctx.average_position) >= ctx.align_radius {
            return Vec2::ZERO;
        }
        ctx.average_direction * ctx.max_speed - self.velocity
    }

    pub fn cohesion(&self, ctx: &SteeringContext<'_>) -> Vec2 {
        self.seek(ctx.average_position, ctx.max_speed)
    }

    pub fn separation(&self, ctx: &SteeringContext<'_>) -> Vec2 {
        let mut force = Vec2::ZERO;
        for other in ctx.neighbors {
            let distance = self.position.distance(other.position);
            if distance > 0.0 && distance <= ctx.max_separation_distance {
                force += self.flee(other.position, ctx.max_speed);
            }
        }
        force.normalize()
    }

    pub fn path_following(
        &self,
        ctx: &SteeringContext<'_>,
        cursor: &mut PathCursor,
        path: &PathPoints<'_>,
    ) -> Vec2 {
        match cursor.next_target(self.position, path, ctx.min_path_point_distance) {
            Some(target) => self.seek(target, ctx.max_speed),
            None => Vec2::ZERO,
        }
    }

    /// Weighted blend of all behaviors, renormalized to `max_force`.
    pub fn steering_force(
        &self,
        ctx: &SteeringContext<'_>,
        cursor: &mut PathCursor,
        path: &PathPoints<'_>,
    ) -> Vec2 {
        let weights = ctx.weights;
        let mut sum = self.alignment(ctx) * weights.alignment;
        sum += self.cohesion(ctx) * weights.cohesion;
        sum += self.separation(ctx) * weights.separation;
        sum += self.path_following(ctx, cursor, path) * weights.path;
        sum.normalize_to_magnitude(ctx.max_force)
    }
}

#[cfg(test)]
mod tests {
    use super::{Flocker, SteeringContext};
    use crate::audio::PathPoints;
    use crate::config::{FlockConfig, SteeringWeights};
    use crate::math::Vec2;
    use crate::path::PathCursor;

    const TOLERANCE: f32 = 1.0e-4;

    fn context(neighbors: &[Flocker], average_position: Vec2) -> SteeringContext<'_> {
        let config = FlockConfig::default();
        SteeringContext {
            neighbors,
            average_position,
            average_direction: Vec2::ZERO,
            weights: SteeringWeights::default(),
            max_speed: config.max_speed,
            max_force: config.max_force,
            align_radius: config.align_radius,
            max_separation_distance: config.max_separation_distance,
            min_path_point_distance: config.min_path_point_distance,
        }
    }

    fn line_of_three() -> Vec<Flocker> {
        vec![
            Flocker::new(Vec2::new(0.0, 0.0)),
            Flocker::new(Vec2::new(10.0, 0.0)),
            Flocker::new(Vec2::new(20.0, 0.0)),
        ]
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < TOLERANCE && (a.y - b.y).abs() < TOLERANCE
    }

    #[test]
    fn integration_clamps_speed_and_resets_acceleration() {
        let mut flocker = Flocker::new(Vec2::ZERO);
        flocker.apply_force(Vec2::new(30.0, 40.0));
        flocker.apply_force(Vec2::new(30.0, 40.0));
        flocker.update_position(5.0);

        assert!((flocker.velocity().magnitude() - 5.0).abs() < TOLERANCE);
        assert!(close(flocker.position(), Vec2::new(3.0, 4.0)));
        assert!(close(flocker.heading(), Vec2::new(0.6, 0.8)));
        assert_eq!(flocker.acceleration(), Vec2::ZERO);
    }

    #[test]
    fn stationary_flocker_has_zero_heading() {
        let mut flocker = Flocker::new(Vec2::new(4.0, 4.0));
        flocker.update_position(5.0);
        assert_eq!(flocker.heading(), Vec2::ZERO);
        assert_eq!(flocker.position(), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn seek_and_flee_point_in_opposite_directions() {
        let flocker = Flocker::new(Vec2::ZERO);
        let target = Vec2::new(0.0, 10.0);
        assert!(close(flocker.seek(target, 5.0), Vec2::new(0.0, 1.0)));
        assert!(close(flocker.flee(target, 5.0), Vec2::new(0.0, -1.0)));
        assert_eq!(flocker.seek(Vec2::ZERO, 5.0), Vec2::ZERO);
    }

    #[test]
    fn outer_flockers_separate_from_the_middle_one() {
        let flockers = line_of_three();
        let ctx = context(&flockers, Vec2::new(10.0, 0.0));

        assert!(close(flockers[0].separation(&ctx), Vec2::new(-1.0, 0.0)));
        assert!(close(flockers[2].separation(&ctx), Vec2::new(1.0, 0.0)));
        // Pushed equally both ways.
        assert!(close(flockers[1].separation(&ctx), Vec2::ZERO));
    }

    #[test]
    fn cohesion_pulls_toward_the_centroid() {
        let flockers = line_of_three();
        let ctx = context(&flockers, Vec2::new(10.0, 0.0));

        assert!(close(flockers[0].cohesion(&ctx), Vec2::new(1.0, 0.0)));
        assert!(close(flockers[2].cohesion(&ctx), Vec2::new(-1.0, 0.0)));
        assert_eq!(flockers[1].cohesion(&ctx), Vec2::ZERO);
    }

    #[test]
    fn alignment_only_applies_inside_the_align_radius() {
        let flockers = [Flocker::new(Vec2::new(100.0, 0.0)), Flocker::new(Vec2::ZERO)];
        let mut ctx = context(&flockers, Vec2::ZERO);
        ctx.average_direction = Vec2::new(1.0, 0.0);

        assert_eq!(flockers[0].alignment(&ctx), Vec2::ZERO);
        assert!(close(flockers[1].alignment(&ctx), Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn isolated_flocker_has_no_separation() {
        let flockers = [Flocker::new(Vec2::ZERO), Flocker::new(Vec2::new(50.0, 0.0))];
        let ctx = context(&flockers, Vec2::new(25.0, 0.0));
        assert_eq!(flockers[0].separation(&ctx), Vec2::ZERO);
    }

    #[test]
    fn blended_force_is_capped_at_max_force() {
        let flockers = line_of_three();
        let ctx = context(&flockers, Vec2::new(10.0, 0.0));
        let coords = [5.0, 5.0, 15.0, 5.0];
        let path = PathPoints::new(&coords);
        let mut cursor = PathCursor::new();

        for flocker in &flockers {
            let force = flocker.steering_force(&ctx, &mut cursor, &path);
            assert!(force.magnitude() <= ctx.max_force + TOLERANCE);
        }
    }

    #[test]
    fn path_following_without_a_path_is_zero() {
        let flockers = line_of_three();
        let ctx = context(&flockers, Vec2::new(10.0, 0.0));
        let mut cursor = PathCursor::new();
        let force = flockers[0].path_following(&ctx, &mut cursor, &PathPoints::new(&[]));
        assert_eq!(force, Vec2::ZERO);
    }
}
