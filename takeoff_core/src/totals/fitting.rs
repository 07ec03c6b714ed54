//! Fitting Counts
//!
//! Fittings are counted for the runs that carry a given wire type. A fitting
//! referenced by several runs is counted once. Bend angles coming out of a
//! model are rarely exact, so a fitting joins an existing group when type and
//! diameter match and its angle is within [`ANGLE_TOLERANCE_DEG`] of the
//! group's first angle.
//!
//! Ids are visited in ascending order, which makes the group representatives,
//! and therefore the grouping, independent of run order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::WireType;
use crate::diagnostics::{DiagnosticSink, LookupMiss, LookupTable, Outcome};
use crate::takeoff::{ConduitRun, FittingRecord, WireManager};
use crate::units::NominalDiameter;

/// Angles within this many degrees of a group's first angle merge into it
pub const ANGLE_TOLERANCE_DEG: f64 = 1.0;

/// One fitting line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotaledFitting {
    pub type_name: String,
    pub diameter: NominalDiameter,
    pub diameter_label: String,
    /// Angle of the first fitting placed in the group
    pub angle: f64,
    pub count: u32,
}

impl TotaledFitting {
    fn accepts(&self, record: &FittingRecord, diameter: NominalDiameter) -> bool {
        self.type_name == record.type_name
            && self.diameter == diameter
            && (self.angle - record.angle).abs() <= ANGLE_TOLERANCE_DEG
    }
}

/// Fitting counts for the runs carrying `wire_type`.
pub fn total_fittings(
    runs: &[ConduitRun],
    wires: &WireManager,
    records: &BTreeMap<String, FittingRecord>,
    wire_type: WireType,
    sink: &mut dyn DiagnosticSink,
) -> Outcome<Vec<TotaledFitting>> {
    let ids: BTreeSet<&str> = runs
        .iter()
        .filter(|run| wires.wire_set(&run.id).is_some_and(|set| set.contains_type(wire_type)))
        .flat_map(|run| run.fittings.iter().map(String::as_str))
        .collect();

    let mut groups: Vec<TotaledFitting> = Vec::new();
    let mut failures = Vec::new();

    for id in ids {
        let Some(record) = records.get(id) else {
            let miss = LookupMiss::new(LookupTable::Fitting, id);
            sink.report_miss(&miss);
            failures.push(miss);
            continue;
        };
        let diameter = NominalDiameter::from_feet(record.diameter);
        match groups.iter_mut().find(|g| g.accepts(record, diameter)) {
            Some(group) => group.count += 1,
            None => groups.push(TotaledFitting {
                type_name: record.type_name.clone(),
                diameter,
                diameter_label: diameter.label(),
                angle: record.angle,
                count: 1,
            }),
        }
    }

    groups.sort_by(compare_fittings);
    debug!(
        wire_type = %wire_type,
        items = groups.len(),
        misses = failures.len(),
        "Fitting totals"
    );
    Outcome::new(groups, failures)
}

fn compare_fittings(a: &TotaledFitting, b: &TotaledFitting) -> Ordering {
    a.type_name
        .cmp(&b.type_name)
        .then(a.diameter.cmp(&b.diameter))
        .then(a.angle.total_cmp(&b.angle))
}
