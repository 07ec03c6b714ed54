//! Connector Counts
//!
//! Every rigid run ends in two connectors, one at each box. Flexible raceway
//! is terminated with its own fittings and is left off.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RacewayKey, Tally};
use crate::catalog::ConduitMaterial;
use crate::takeoff::ConduitRun;
use crate::units::NominalDiameter;

/// Connectors per run
pub const CONNECTORS_PER_RUN: u32 = 2;

/// One connector line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotaledConnector {
    pub material: ConduitMaterial,
    pub diameter: NominalDiameter,
    pub diameter_label: String,
    pub count: u32,
}

/// Connector count by (material, diameter).
pub fn total_connectors(runs: &[ConduitRun]) -> Vec<TotaledConnector> {
    let mut tally = Tally::new();
    for run in runs.iter().filter(|r| !r.material.is_flexible()) {
        let key = RacewayKey {
            material: run.material,
            diameter: run.nominal_diameter(),
        };
        let count = tally.entry(key, || 0u32);
        *count = count.saturating_add(CONNECTORS_PER_RUN);
    }

    let rows: Vec<_> = tally
        .into_sorted()
        .into_iter()
        .map(|(key, count)| TotaledConnector {
            material: key.material,
            diameter: key.diameter,
            diameter_label: key.diameter.label(),
            count,
        })
        .collect();
    debug!(items = rows.len(), "Connector totals");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::Feet;

    #[test]
    fn test_two_per_rigid_run() {
        let runs = vec![
            ConduitRun::new("1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(15.0)),
            ConduitRun::new("2", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(250.0)),
            ConduitRun::new("3", ConduitMaterial::Imc, Feet(1.0 / 12.0), Feet(3.0)),
        ];
        let totals = total_connectors(&runs);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].material, ConduitMaterial::Emt);
        assert_eq!(totals[0].count, 4);
        assert_eq!(totals[1].count, 2);
    }

    #[test]
    fn test_flex_is_excluded() {
        let runs = vec![
            ConduitRun::new("1", ConduitMaterial::Fmc, Feet(0.5 / 12.0), Feet(6.0)),
            ConduitRun::new("2", ConduitMaterial::Lfmc, Feet(0.5 / 12.0), Feet(6.0)),
        ];
        assert!(total_connectors(&runs).is_empty());
    }
}
