use std::collections::VecDeque;

use crate::engine::phasor::Vector2;
use crate::engine::EngineError;

/// Rolling buffer of resultant tips, oldest first.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: VecDeque<Vector2>,
    capacity: usize,
}
impl Trajectory {
    pub fn with_capacity(capacity: usize) -> Result<Self, EngineError> {
        if capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "trajectory capacity must be positive".into(),
            ));
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn push(&mut self, point: Vector2) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }
    pub fn extend(&mut self, points: impl IntoIterator<Item = Vector2>) {
        for point in points {
            self.push(point);
        }
    }
    /// Restart after an input change; old tips belong to a different curve.
    pub fn clear(&mut self) {
        self.points.clear();
    }
    pub fn points(&self) -> impl Iterator<Item = Vector2> + '_ {
        self.points.iter().copied()
    }
    pub fn latest(&self) -> Option<Vector2> {
        self.points.back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn drops_oldest_once_full() {
        let mut trace = Trajectory::with_capacity(3).unwrap();
        trace.extend((0..5).map(|i| Vector2::new(i as f64, 0.0)));
        assert_eq!(trace.len(), 3);
        let xs: Vec<f64> = trace.points().map(|p| p.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 4.0]);
        assert_eq!(trace.latest(), Some(Vector2::new(4.0, 0.0)));
        trace.clear();
        assert!(trace.is_empty());
        assert!(Trajectory::with_capacity(0).is_err());
    }
}
