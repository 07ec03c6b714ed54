//! Wire Length Totals
//!
//! Length of wire per (size, color, material) for one wire type. Every wire
//! of the requested type contributes the full length of the run it is pulled
//! through. Runs that flag the type as no-export are skipped entirely.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Tally;
use crate::catalog::{WireMaterial, WireSize, WireType};
use crate::takeoff::{ConduitRun, WireManager};
use crate::units::Feet;

/// One wire line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotaledWire {
    pub size: WireSize,
    pub color: String,
    pub material: WireMaterial,
    pub length: Feet,
}

/// Total wire length of one type by (size, color, material).
pub fn total_wire(runs: &[ConduitRun], wires: &WireManager, wire_type: WireType) -> Vec<TotaledWire> {
    let mut tally: Tally<(WireSize, String, WireMaterial), Feet> = Tally::new();

    for run in runs {
        let Some(set) = wires.wire_set(&run.id) else {
            continue;
        };
        if set.is_no_export(wire_type) {
            continue;
        }
        for wire in set.wires().iter().filter(|w| w.wire_type == wire_type) {
            let key = (wire.size, wire.color.clone(), wire.material);
            *tally.entry(key, Feet::default) += run.length;
        }
    }

    let rows: Vec<_> = tally
        .into_sorted()
        .into_iter()
        .map(|((size, color, material), length)| TotaledWire {
            size,
            color,
            material,
            length,
        })
        .collect();
    debug!(wire_type = %wire_type, items = rows.len(), "Wire totals");
    rows
}
