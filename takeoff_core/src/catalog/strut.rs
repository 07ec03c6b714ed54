//! Strut Capacity Table
//!
//! Beam loading for 1-5/8" x 1-5/8" 12 ga solid channel, simple span, loads
//! applied uniformly. Rows are keyed by span in whole inches.
//!
//! ## Exact Lengths Only
//!
//! There is no interpolation between rows. A strut length that is not one of
//! the tabulated spans has no capacity; the caller reports the miss and
//! carries on.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{LookupMiss, LookupTable};
use crate::units::{Feet, Inches, LengthFormatter, Pounds};

/// Midpoint concentrated load as a fraction of the uniform load
pub const CONCENTRATED_LOAD_FACTOR: f64 = 0.5;

/// Midpoint concentrated deflection as a fraction of the uniform deflection
pub const CONCENTRATED_DEFLECTION_FACTOR: f64 = 0.8;

/// Tolerance when snapping a strut length to whole inches
const SPAN_TOLERANCE_IN: f64 = 1e-6;

/// One row of the beam loading table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrutCapacity {
    /// Span in whole inches
    pub span_in: u32,
    /// Maximum allowable uniform load
    pub max_uniform_load: Pounds,
    /// Deflection at the maximum uniform load
    pub uniform_deflection: Inches,
}

impl StrutCapacity {
    /// Midpoint concentrated load capacity
    pub fn concentrated_load(&self) -> Pounds {
        self.max_uniform_load * CONCENTRATED_LOAD_FACTOR
    }

    /// Deflection at the midpoint concentrated load
    pub fn concentrated_deflection(&self) -> Inches {
        self.uniform_deflection * CONCENTRATED_DEFLECTION_FACTOR
    }

    /// Capacities reduced for a pierced (slotted/holed) channel
    pub fn pierced(&self, factor: f64) -> StrutCapacity {
        StrutCapacity {
            span_in: self.span_in,
            max_uniform_load: self.max_uniform_load * factor,
            uniform_deflection: self.uniform_deflection,
        }
    }
}

const fn row(span_in: u32, load_lb: f64, deflection_in: f64) -> StrutCapacity {
    StrutCapacity {
        span_in,
        max_uniform_load: Pounds(load_lb),
        uniform_deflection: Inches(deflection_in),
    }
}

/// Beam loading rows, ascending span
pub const STRUT_CAPACITY_TABLE: [StrutCapacity; 9] = [
    row(24, 1690.0, 0.09),
    row(36, 1130.0, 0.20),
    row(48, 850.0, 0.36),
    row(60, 680.0, 0.56),
    row(72, 560.0, 0.81),
    row(84, 480.0, 1.10),
    row(96, 420.0, 1.44),
    row(108, 380.0, 1.82),
    row(120, 340.0, 2.25),
];

/// Whole-inch span for a strut length, if it lands on an inch
pub fn span_inches(length: Feet) -> Option<u32> {
    let inches = Inches::from(length).0;
    let rounded = inches.round();
    if rounded <= 0.0 || (inches - rounded).abs() > SPAN_TOLERANCE_IN {
        return None;
    }
    Some(rounded as u32)
}

/// Capacity row for an exact tabulated strut length
pub fn strut_capacity(length: Feet, formatter: &dyn LengthFormatter) -> Result<StrutCapacity, LookupMiss> {
    span_inches(length)
        .and_then(|span| STRUT_CAPACITY_TABLE.iter().find(|r| r.span_in == span))
        .copied()
        .ok_or_else(|| LookupMiss::new(LookupTable::StrutCapacity, formatter.format(length)))
}
