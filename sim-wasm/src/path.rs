use crate::audio::PathPoints;
use crate::math::Vec2;

/// Flock-wide position along the live path. Only ever moves forward,
/// wrapping to the first point past the end.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathCursor {
    index: usize,
}

impl PathCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current point index (pairs, not raw coordinates).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Advances past every point closer than `min_distance` to `from` and
    /// returns the point it settles on. Scans at most one lap, so a path that
    /// lies entirely within reach still terminates. `None` for an empty path.
    pub fn next_target(
        &mut self,
        from: Vec2,
        path: &PathPoints<'_>,
        min_distance: f32,
    ) -> Option<Vec2> {
        let len = path.len();
        if len == 0 {
            return None;
        }
        // The path is rebuilt every frame and may have shrunk.
        if self.index >= len {
            self.index = 0;
        }

        let mut target = path.point(self.index)?;
        for _ in 0..len {
            if from.distance(target) >= min_distance {
                break;
            }
            self.index += 1;
            if self.index >= len {
                self.index = 0;
            }
            target = path.point(self.index)?;
        }
        Some(target)
    }
}
