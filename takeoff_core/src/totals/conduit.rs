//! Conduit Length Totals
//!
//! Length of raceway per (material, trade size).
//!
//! ## Electrical Rooms
//!
//! Runs that pass through an electrical room are partly counted on the room
//! takeoff. A matching [`ElectricalRoomRecord`] shortens the run's
//! contribution, but only when something is left over; a room record as long
//! as the run leaves the run at full length.
//!
//! ## Makeup
//!
//! The makeup allowance is added once per line item, when the key is first
//! seen, not once per run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RacewayKey, Tally};
use crate::catalog::ConduitMaterial;
use crate::takeoff::{ConduitRun, ElectricalRoomRecord};
use crate::units::{Feet, NominalDiameter};

/// One conduit line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotaledConduit {
    pub material: ConduitMaterial,
    pub diameter: NominalDiameter,
    /// Trade size as shown on the BOM (e.g. `3/4"`)
    pub diameter_label: String,
    pub length: Feet,
}

/// Total conduit length by (material, diameter).
pub fn total_conduit(runs: &[ConduitRun], rooms: &[ElectricalRoomRecord], makeup: Feet) -> Vec<TotaledConduit> {
    let mut room_lengths: HashMap<&str, Feet> = HashMap::new();
    for room in rooms {
        room_lengths.entry(room.run_id.as_str()).or_insert(room.length);
    }

    let mut tally = Tally::new();
    for run in runs {
        let contribution = match room_lengths.get(run.id.as_str()) {
            Some(room) if (run.length - *room).0 > 0.0 => run.length - *room,
            _ => run.length,
        };
        let key = RacewayKey {
            material: run.material,
            diameter: run.nominal_diameter(),
        };
        *tally.entry(key, || makeup) += contribution;
    }

    let rows: Vec<_> = tally
        .into_sorted()
        .into_iter()
        .map(|(key, length)| TotaledConduit {
            material: key.material,
            diameter: key.diameter,
            diameter_label: key.diameter.label(),
            length,
        })
        .collect();
    debug!(runs = runs.len(), items = rows.len(), "Conduit totals");
    rows
}
