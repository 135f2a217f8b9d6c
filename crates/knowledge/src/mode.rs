//! Grounded versus ungrounded routing.

use crate::types::{Intent, Mode};

/// Minimum top score for grounding a topical query (exclusive).
pub const TOPICAL_THRESHOLD: f32 = 0.25;

/// Minimum top score for grounding a general query (exclusive).
pub const GENERAL_THRESHOLD: f32 = 0.7;

/// Decide the answer mode from retrieval scores.
///
/// Topical intents ground on any reasonably close match. General queries
/// ground only on a near match.
pub fn decide_mode(scores: &[f32], intent: Intent) -> Mode {
    let Some(best) = scores.iter().copied().reduce(f32::max) else {
        return Mode::Ungrounded;
    };

    let threshold = if intent.is_topical() {
        TOPICAL_THRESHOLD
    } else {
        GENERAL_THRESHOLD
    };

    if best > threshold {
        Mode::Grounded
    } else {
        Mode::Ungrounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_scores_is_ungrounded() {
        assert_eq!(decide_mode(&[], Intent::Regulatory), Mode::Ungrounded);
        assert_eq!(decide_mode(&[], Intent::General), Mode::Ungrounded);
    }

    #[test]
    fn test_topical_threshold() {
        assert_eq!(decide_mode(&[0.3], Intent::Regulatory), Mode::Grounded);
        assert_eq!(decide_mode(&[0.1, 0.26], Intent::Organization), Mode::Grounded);
        assert_eq!(decide_mode(&[0.25], Intent::Regulatory), Mode::Ungrounded);
    }

    #[test]
    fn test_general_threshold() {
        assert_eq!(decide_mode(&[0.3], Intent::General), Mode::Ungrounded);
        assert_eq!(decide_mode(&[0.7], Intent::General), Mode::Ungrounded);
        assert_eq!(decide_mode(&[0.5, 0.71], Intent::General), Mode::Grounded);
    }

    #[test]
    fn test_exact_match_grounds() {
        assert_eq!(decide_mode(&[1.0], Intent::General), Mode::Grounded);
    }
}
