//! # BOM Totals
//!
//! Five reducers that collapse per-run takeoff records into BOM line items.
//! They share one shape:
//!
//! - filter the runs (by material, by wire type)
//! - map each run to a composite key and a contribution
//! - accumulate into a hashed map, key → measure
//! - emit the rows sorted ascending by key
//!
//! Accumulation is commutative, so the totals do not depend on run order;
//! the sort fixes the presentation order.
//!
//! ## Available Engines
//!
//! - [`conduit`] - conduit length by (material, diameter)
//! - [`wire`] - wire length by (size, color, material) for one wire type
//! - [`connector`] - connectors by (material, diameter)
//! - [`coupling`] - couplings by (material, diameter)
//! - [`fitting`] - fittings by (type, diameter, angle ±1°)
//! - [`report`] - all of the above for one package

pub mod conduit;
pub mod connector;
pub mod coupling;
pub mod fitting;
pub mod report;
pub mod wire;

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::catalog::ConduitMaterial;
use crate::units::NominalDiameter;

pub use conduit::{total_conduit, TotaledConduit};
pub use connector::{total_connectors, TotaledConnector};
pub use coupling::{total_couplings, TotaledCoupling};
pub use fitting::{total_fittings, TotaledFitting};
pub use report::{build_report, BomReport};
pub use wire::{total_wire, TotaledWire};

/// Raceway key shared by the conduit, connector and coupling engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RacewayKey {
    pub material: ConduitMaterial,
    pub diameter: NominalDiameter,
}

/// Hashed accumulator keyed by a composite key.
pub(crate) struct Tally<K, V> {
    map: HashMap<K, V>,
}

impl<K: Hash + Eq + Ord, V> Tally<K, V> {
    pub(crate) fn new() -> Self {
        Tally { map: HashMap::new() }
    }

    /// Accumulator for `key`, created with `init` the first time it is seen
    pub(crate) fn entry(&mut self, key: K, init: impl FnOnce() -> V) -> &mut V {
        self.map.entry(key).or_insert_with(init)
    }

    /// Rows sorted ascending by key
    pub(crate) fn into_sorted(self) -> Vec<(K, V)> {
        let mut rows: Vec<_> = self.map.into_iter().collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_sorts_and_merges() {
        let mut tally = Tally::new();
        for (k, v) in [("b", 1), ("a", 2), ("b", 3)] {
            *tally.entry(k, || 0) += v;
        }
        assert_eq!(tally.into_sorted(), vec![("a", 2), ("b", 4)]);
    }

    #[test]
    fn test_init_runs_once_per_key() {
        let mut tally = Tally::new();
        *tally.entry(1, || 100) += 1;
        *tally.entry(1, || 100) += 1;
        assert_eq!(tally.into_sorted(), vec![(1, 102)]);
    }

    #[test]
    fn test_raceway_key_order() {
        let a = RacewayKey {
            material: ConduitMaterial::Emt,
            diameter: NominalDiameter(64),
        };
        let b = RacewayKey {
            material: ConduitMaterial::Emt,
            diameter: NominalDiameter(32),
        };
        let c = RacewayKey {
            material: ConduitMaterial::Pvc,
            diameter: NominalDiameter(16),
        };
        let mut keys = vec![c, a, b];
        keys.sort();
        assert_eq!(keys, vec![b, a, c]);
    }
}

#[cfg(test)]
mod proptests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;
    use crate::catalog::{WireSize, WireType};
    use crate::diagnostics::NullSink;
    use crate::takeoff::{ConduitRun, ElectricalRoomRecord, FittingRecord, Wire, WireManager};
    use crate::units::Feet;

    const TRADE_SIZES_IN: [f64; 4] = [0.5, 0.75, 1.0, 2.0];
    const SIZES: [WireSize; 3] = [WireSize::Awg12, WireSize::Awg10, WireSize::Awg8];
    const COLORS: [&str; 3] = ["Black", "Red", "Green"];

    fn fitting_records() -> BTreeMap<String, FittingRecord> {
        (0..6)
            .map(|i| {
                let angle = if i % 2 == 0 { 90.0 } else { 45.5 };
                let diameter = Feet(TRADE_SIZES_IN[i % 4] / 12.0);
                (format!("F-{}", i), FittingRecord::new(angle, diameter, "Elbow"))
            })
            .collect()
    }

    prop_compose! {
        // Whole-foot lengths so sums are exact in any order
        fn arb_run(index: usize)(
            material in prop::sample::select(ConduitMaterial::ALL.to_vec()),
            trade in prop::sample::select(TRADE_SIZES_IN.to_vec()),
            length in 0u32..400,
            fittings in prop::collection::vec(0usize..7, 0..3),
        ) -> ConduitRun {
            ConduitRun::new(format!("R-{}", index), material, Feet(trade / 12.0), Feet(length as f64))
                .with_fittings(fittings.into_iter().map(|f| format!("F-{}", f)))
        }
    }

    fn arb_runs() -> impl Strategy<Value = Vec<ConduitRun>> {
        (1usize..12).prop_flat_map(|n| (0..n).map(arb_run).collect::<Vec<_>>())
    }

    /// Runs paired with a real permutation of themselves
    fn arb_runs_and_shuffle() -> impl Strategy<Value = (Vec<ConduitRun>, Vec<ConduitRun>)> {
        arb_runs().prop_flat_map(|runs| (Just(runs.clone()), Just(runs).prop_shuffle()))
    }

    /// Room allowances against a subset of run ids, some runs listed twice
    fn arb_rooms(run_count: usize) -> impl Strategy<Value = Vec<ElectricalRoomRecord>> {
        prop::collection::vec((0..run_count, 0u32..60), 0..6).prop_map(|rows| {
            rows.into_iter()
                .map(|(index, length)| ElectricalRoomRecord {
                    run_id: format!("R-{}", index),
                    length: Feet(length as f64),
                })
                .collect()
        })
    }

    fn wires_for(runs: &[ConduitRun]) -> WireManager {
        let mut wm = WireManager::new();
        for (i, run) in runs.iter().enumerate() {
            let wire_type = if i % 3 == 0 { WireType::Feeder } else { WireType::Branch };
            wm.assign(
                run.id.clone(),
                Wire::new(format!("C{}", i % 4), SIZES[i % 3], COLORS[i % 3], wire_type),
            );
        }
        wm
    }

    proptest! {
        #[test]
        fn totals_do_not_depend_on_run_order(
            (runs, shuffled, rooms) in arb_runs_and_shuffle()
                .prop_flat_map(|(runs, shuffled)| {
                    let count = runs.len();
                    (Just(runs), Just(shuffled), arb_rooms(count))
                })
        ) {
            let wm = wires_for(&runs);
            let records = fitting_records();

            prop_assert_eq!(
                total_conduit(&runs, &rooms, Feet(6.0)),
                total_conduit(&shuffled, &rooms, Feet(6.0))
            );
            prop_assert_eq!(total_connectors(&runs), total_connectors(&shuffled));
            prop_assert_eq!(total_couplings(&runs), total_couplings(&shuffled));
            for wire_type in [WireType::Branch, WireType::Feeder] {
                prop_assert_eq!(total_wire(&runs, &wm, wire_type), total_wire(&shuffled, &wm, wire_type));
                prop_assert_eq!(
                    total_fittings(&runs, &wm, &records, wire_type, &mut NullSink),
                    total_fittings(&shuffled, &wm, &records, wire_type, &mut NullSink)
                );
            }
        }

        #[test]
        fn conduit_length_is_conserved(runs in arb_runs()) {
            let totals = total_conduit(&runs, &[], Feet(0.0));
            let input: f64 = runs.iter().map(|r| r.length.0).sum();
            let output: f64 = totals.iter().map(|t| t.length.0).sum();
            prop_assert_eq!(input, output);
        }
    }
}
