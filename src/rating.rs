//! Score to rating mapping
//!
//! The proving backend returns the model output as a rescaled score. The
//! client turns it into a single-letter grade by half-open interval
//! membership, lowest interval first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter grade derived from a voice score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    D,
    C,
    B,
    A,
    S,
    /// Score outside every graded interval (negative, 8 or above, NaN)
    X,
}

impl Rating {
    /// Grade a score. Total over all `f64`, including NaN and infinities.
    pub fn from_score(score: f64) -> Self {
        if (0.0..2.0).contains(&score) {
            Rating::D
        } else if (2.0..4.0).contains(&score) {
            Rating::C
        } else if (4.0..6.0).contains(&score) {
            Rating::B
        } else if (6.0..7.0).contains(&score) {
            Rating::A
        } else if (7.0..8.0).contains(&score) {
            Rating::S
        } else {
            Rating::X
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::D => "D",
            Rating::C => "C",
            Rating::B => "B",
            Rating::A => "A",
            Rating::S => "S",
            Rating::X => "X",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_interiors() {
        assert_eq!(Rating::from_score(0.0), Rating::D);
        assert_eq!(Rating::from_score(1.99), Rating::D);
        assert_eq!(Rating::from_score(3.5), Rating::C);
        assert_eq!(Rating::from_score(5.0), Rating::B);
        assert_eq!(Rating::from_score(6.5), Rating::A);
        assert_eq!(Rating::from_score(7.9), Rating::S);
    }

    #[test]
    fn test_lower_bounds_are_inclusive() {
        assert_eq!(Rating::from_score(2.0), Rating::C);
        assert_eq!(Rating::from_score(4.0), Rating::B);
        assert_eq!(Rating::from_score(6.0), Rating::A);
        assert_eq!(Rating::from_score(7.0), Rating::S);
    }

    #[test]
    fn test_out_of_range_is_x() {
        assert_eq!(Rating::from_score(8.0), Rating::X);
        assert_eq!(Rating::from_score(100.0), Rating::X);
        assert_eq!(Rating::from_score(-0.5), Rating::X);
        assert_eq!(Rating::from_score(-0.0), Rating::D);
        assert_eq!(Rating::from_score(f64::NAN), Rating::X);
        assert_eq!(Rating::from_score(f64::INFINITY), Rating::X);
        assert_eq!(Rating::from_score(f64::NEG_INFINITY), Rating::X);
    }

    #[test]
    fn test_sweep_matches_table() {
        let mut s = -1.0;
        while s < 9.0 {
            let expected = if s < 0.0 {
                Rating::X
            } else if s < 2.0 {
                Rating::D
            } else if s < 4.0 {
                Rating::C
            } else if s < 6.0 {
                Rating::B
            } else if s < 7.0 {
                Rating::A
            } else if s < 8.0 {
                Rating::S
            } else {
                Rating::X
            };
            assert_eq!(Rating::from_score(s), expected, "score {}", s);
            s += 0.25;
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Rating::B.to_string(), "B");
        assert_eq!(format!("{}", Rating::X), "X");
    }
}
