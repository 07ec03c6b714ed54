//! # P3 Box Topology
//!
//! A P3 junction box is configured from how many conduits land on it and
//! whether any two of them are in line with each other.
//!
//! | connections | in-line pair | config |
//! |-------------|--------------|--------|
//! | 0           | -            | E      |
//! | 1           | -            | D      |
//! | 2           | yes / no     | I / L  |
//! | 3           | yes / no     | T / E  |
//! | 4           | yes / no     | X / E  |
//! | 5+          | -            | E      |
//!
//! `E` is the catch-all for anything that cannot be built; classification
//! never fails.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Box configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum P3BoxConfig {
    /// Unterminated or invalid
    E,
    /// Dead end
    D,
    /// Straight through
    I,
    /// Perpendicular turn
    L,
    /// Tee
    T,
    /// Cross
    X,
}

impl P3BoxConfig {
    pub const ALL: [P3BoxConfig; 6] = [
        P3BoxConfig::E,
        P3BoxConfig::D,
        P3BoxConfig::I,
        P3BoxConfig::L,
        P3BoxConfig::T,
        P3BoxConfig::X,
    ];

    pub fn bracket(&self) -> BracketType {
        match self {
            P3BoxConfig::T | P3BoxConfig::X => BracketType::Cross,
            P3BoxConfig::E | P3BoxConfig::D | P3BoxConfig::I | P3BoxConfig::L => BracketType::Single,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            P3BoxConfig::E => "Invalid",
            P3BoxConfig::D => "Dead End",
            P3BoxConfig::I => "Straight",
            P3BoxConfig::L => "Corner",
            P3BoxConfig::T => "Tee",
            P3BoxConfig::X => "Cross",
        }
    }
}

impl fmt::Display for P3BoxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            P3BoxConfig::E => "E",
            P3BoxConfig::D => "D",
            P3BoxConfig::I => "I",
            P3BoxConfig::L => "L",
            P3BoxConfig::T => "T",
            P3BoxConfig::X => "X",
        };
        write!(f, "{}", letter)
    }
}

/// Support bracket for a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracketType {
    Single,
    Cross,
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BracketType::Single => write!(f, "Single"),
            BracketType::Cross => write!(f, "Cross"),
        }
    }
}

/// Classify a box by its connection count and whether an in-line pair exists.
pub fn resolve(connection_count: usize, parallel_present: bool) -> (P3BoxConfig, BracketType) {
    let config = match (connection_count, parallel_present) {
        (1, _) => P3BoxConfig::D,
        (2, true) => P3BoxConfig::I,
        (2, false) => P3BoxConfig::L,
        (3, true) => P3BoxConfig::T,
        (4, true) => P3BoxConfig::X,
        _ => P3BoxConfig::E,
    };
    (config, config.bracket())
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn every_input_classifies(count in any::<usize>(), parallel in any::<bool>()) {
            let (config, bracket) = resolve(count, parallel);
            prop_assert_eq!(bracket, config.bracket());
            if count >= 5 || count == 0 {
                prop_assert_eq!(config, P3BoxConfig::E);
            }
        }
    }
}
