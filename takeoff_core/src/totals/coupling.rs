//! Coupling Counts
//!
//! A rigid run gets a flat two couplings plus one per full stick of conduit.
//! Same filter as connectors: flexible raceway is left off.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RacewayKey, Tally};
use crate::catalog::ConduitMaterial;
use crate::takeoff::ConduitRun;
use crate::units::{Feet, NominalDiameter};

/// Standard stick length
pub const STICK_LENGTH: Feet = Feet(10.0);

/// Couplings every run gets regardless of length
pub const MIN_COUPLINGS_PER_RUN: u32 = 2;

/// One coupling line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotaledCoupling {
    pub material: ConduitMaterial,
    pub diameter: NominalDiameter,
    pub diameter_label: String,
    pub count: u32,
}

/// `2 + floor(length / 10)`, saturating at `u32::MAX`
pub fn couplings_for_run(run: &ConduitRun) -> u32 {
    let sticks = (run.length.0 / STICK_LENGTH.0).floor();
    // float -> int casts saturate; NaN and negatives land on 0
    MIN_COUPLINGS_PER_RUN.saturating_add(sticks as u32)
}

/// Coupling count by (material, diameter).
pub fn total_couplings(runs: &[ConduitRun]) -> Vec<TotaledCoupling> {
    let mut tally = Tally::new();
    for run in runs.iter().filter(|r| !r.material.is_flexible()) {
        let key = RacewayKey {
            material: run.material,
            diameter: run.nominal_diameter(),
        };
        let count = tally.entry(key, || 0u32);
        *count = count.saturating_add(couplings_for_run(run));
    }

    let rows: Vec<_> = tally
        .into_sorted()
        .into_iter()
        .map(|(key, count)| TotaledCoupling {
            material: key.material,
            diameter: key.diameter,
            diameter_label: key.diameter.label(),
            count,
        })
        .collect();
    debug!(items = rows.len(), "Coupling totals");
    rows
}
