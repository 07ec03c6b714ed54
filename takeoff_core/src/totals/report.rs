//! BOM Report
//!
//! Runs every engine over one package and gathers the line items and the
//! lookup misses into a [`BomReport`]. A report always completes; anything
//! that could not be looked up is listed in `failures`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    total_conduit, total_connectors, total_couplings, total_fittings, total_wire, TotaledConduit, TotaledConnector,
    TotaledCoupling, TotaledFitting, TotaledWire,
};
use crate::catalog::WireType;
use crate::diagnostics::{DiagnosticSink, LookupMiss, NullSink};
use crate::project::EstimateContext;
use crate::voltage_drop::upsize_wires;

/// Every BOM line item for one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomReport {
    /// Package name
    pub package: String,
    pub conduit: Vec<TotaledConduit>,
    /// Wire line items per wire type present in the package
    pub wire: BTreeMap<WireType, Vec<TotaledWire>>,
    pub connectors: Vec<TotaledConnector>,
    pub couplings: Vec<TotaledCoupling>,
    /// Fitting line items per wire type present in the package
    pub fittings: BTreeMap<WireType, Vec<TotaledFitting>>,
    /// Runs whose wires were upsized for voltage drop
    pub upsized_runs: Vec<String>,
    pub failures: Vec<LookupMiss>,
}

impl BomReport {
    /// Total number of line items across every section
    pub fn line_item_count(&self) -> usize {
        self.conduit.len()
            + self.wire.values().map(Vec::len).sum::<usize>()
            + self.connectors.len()
            + self.couplings.len()
            + self.fittings.values().map(Vec::len).sum::<usize>()
    }
}

/// Build the full BOM for the context's package.
pub fn build_report(ctx: &EstimateContext<'_>, sink: &mut dyn DiagnosticSink) -> BomReport {
    let package = ctx.package();
    let settings = ctx.settings();
    let mut failures = Vec::new();

    let upsized;
    let (wires, upsized_runs) = if settings.voltage_drop_enabled {
        upsized = upsize_wires(
            &package.runs,
            &package.wires,
            &package.rules,
            package,
            settings.makeup_length,
            sink,
        );
        failures.extend(upsized.failures.iter().cloned());
        (&upsized.wires, upsized.changed_runs.clone())
    } else {
        (&package.wires, Vec::new())
    };

    let conduit = total_conduit(&package.runs, &package.electrical_rooms, settings.makeup_length);
    let connectors = total_connectors(&package.runs);
    let couplings = total_couplings(&package.runs);

    // A run carrying several wire types is walked once per type; each
    // missing fitting is reported once per report.
    let mut wire = BTreeMap::new();
    let mut fittings = BTreeMap::new();
    let mut fitting_misses: Vec<LookupMiss> = Vec::new();
    for wire_type in wires.wire_types() {
        wire.insert(wire_type, total_wire(&package.runs, wires, wire_type));
        let outcome = total_fittings(&package.runs, wires, &package.fittings, wire_type, &mut NullSink);
        for miss in outcome.failures {
            if !fitting_misses.contains(&miss) {
                fitting_misses.push(miss);
            }
        }
        fittings.insert(wire_type, outcome.value);
    }
    for miss in &fitting_misses {
        sink.report_miss(miss);
    }
    failures.extend(fitting_misses);

    let report = BomReport {
        package: package.name.clone(),
        conduit,
        wire,
        connectors,
        couplings,
        fittings,
        upsized_runs,
        failures,
    };
    info!(
        package = %report.package,
        line_items = report.line_item_count(),
        upsized = report.upsized_runs.len(),
        failures = report.failures.len(),
        "BOM report built"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConduitMaterial, Voltage, WireSize};
    use crate::diagnostics::{CollectingSink, LookupTable};
    use crate::project::Project;
    use crate::takeoff::{ConduitRun, FittingRecord, Package, Wire};
    use crate::units::Feet;
    use crate::voltage_drop::VoltageDropRule;

    fn sample_project(voltage_drop: bool) -> Project {
        let mut package = Package::new("Level 1 Power");
        package.runs.push(
            ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(0.75 / 12.0), Feet(30.0)).with_fittings(["F-1", "F-9"]),
        );
        package
            .runs
            .push(ConduitRun::new("R-2", ConduitMaterial::Fmc, Feet(0.5 / 12.0), Feet(6.0)));
        package
            .wires
            .assign("R-1", Wire::new("LP1-1", WireSize::Awg12, "Black", WireType::Branch).with_panel("LP1"));
        package
            .wires
            .assign("R-1", Wire::new("LP1-1", WireSize::Awg12, "Green", WireType::Branch).with_panel("LP1"));
        package
            .wires
            .assign("R-2", Wire::new("FA-1", WireSize::Awg16, "Red", WireType::FireAlarm));
        package
            .fittings
            .insert("F-1".into(), FittingRecord::new(90.0, Feet(0.75 / 12.0), "EMT Elbow"));
        package.panels.insert("LP1".into(), Voltage::new("120V"));
        package
            .rules
            .push(VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V"));

        let mut project = Project::new("Estimator", "J-100", "Client");
        project.settings.voltage_drop_enabled = voltage_drop;
        project.add_package(package);
        project
    }

    #[test]
    fn test_report_sections() {
        let project = sample_project(false);
        let ctx = EstimateContext::new(&project, 0).unwrap();
        let mut sink = CollectingSink::default();
        let report = build_report(&ctx, &mut sink);

        assert_eq!(report.package, "Level 1 Power");
        assert_eq!(report.conduit.len(), 2);
        // Flex is not counted for connectors or couplings
        assert_eq!(report.connectors.len(), 1);
        assert_eq!(report.couplings[0].count, 5);
        assert_eq!(report.wire.len(), 2);
        assert!(report.wire.contains_key(&WireType::FireAlarm));
        assert!(report.upsized_runs.is_empty());
        // F-9 has no record
        assert_eq!(report.failures.len(), 1);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn test_report_applies_voltage_drop_when_enabled() {
        let project = sample_project(true);
        let ctx = EstimateContext::new(&project, 0).unwrap();
        let report = build_report(&ctx, &mut CollectingSink::default());

        assert_eq!(report.upsized_runs, vec!["R-1".to_string()]);
        let branch = &report.wire[&WireType::Branch];
        assert!(branch.iter().all(|w| w.size == WireSize::Awg10));
        // Input project is untouched
        assert_eq!(project.packages[0].wires.wires("R-1")[0].size, WireSize::Awg12);
    }

    #[test]
    fn test_missing_fitting_reported_once_across_wire_types() {
        let mut package = Package::new("Mixed");
        package
            .runs
            .push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(20.0)).with_fittings(["F-404"]));
        package
            .wires
            .assign("R-1", Wire::new("LP1-1", WireSize::Awg12, "Black", WireType::Branch));
        package
            .wires
            .assign("R-1", Wire::new("MDP-4", WireSize::Awg2, "Red", WireType::Feeder));
        let mut project = Project::new("Estimator", "J-101", "Client");
        project.add_package(package);

        let ctx = EstimateContext::new(&project, 0).unwrap();
        let mut sink = CollectingSink::default();
        let report = build_report(&ctx, &mut sink);

        assert_eq!(report.fittings.len(), 2);
        assert_eq!(report.failures, vec![LookupMiss::new(LookupTable::Fitting, "F-404")]);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let project = sample_project(false);
        let ctx = EstimateContext::new(&project, 0).unwrap();
        let report = build_report(&ctx, &mut CollectingSink::default());
        let json = serde_json::to_string(&report).unwrap();
        let back: BomReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
