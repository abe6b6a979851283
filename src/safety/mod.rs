use rand::Rng;

use crate::models::Position;

/// Scores a position for safety on a 1..=100 scale. Kept behind a trait so
/// the demo strategy can be replaced with a real model.
pub trait SafetyEstimator: Send + Sync {
    fn estimate(&self, position: &Position) -> u8;
}

/// Placeholder strategy: uniform random over 1..=100. The score is NOT
/// derived from the position and carries no meaning as a safety signal.
pub struct RandomEstimator;

impl SafetyEstimator for RandomEstimator {
    fn estimate(&self, _position: &Position) -> u8 {
        rand::thread_rng().gen_range(1..=100)
    }
}
