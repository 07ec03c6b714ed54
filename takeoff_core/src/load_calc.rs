//! # Rack Load Calculation
//!
//! Checks a strut rack against the weight of the conduit bundle it carries.
//!
//! ## Method
//!
//! 1. Weigh every run: empty raceway from the conduit weight table, plus each
//!    conductor from the wire weight table. Both are rounded up to whole
//!    pounds per run.
//! 2. Spread the total over the rack run length to get a linear load.
//! 3. For each support spacing from 1 to 12 ft, compare the load on one strut
//!    (linear load × spacing) with the tabulated uniform load capacity of the
//!    standard strut length.
//!
//! A run whose raceway is not tabulated is skipped; a conductor that is not
//! tabulated weighs nothing. Both are reported as lookup misses and the
//! calculation carries on.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::catalog::{ConduitMaterial, WireSize, WireType};
//! use takeoff_core::diagnostics::CollectingSink;
//! use takeoff_core::load_calc::{calculate, LoadCalcInput};
//! use takeoff_core::takeoff::{ConduitRun, Wire, WireManager};
//! use takeoff_core::units::Feet;
//!
//! let runs = vec![ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(10.0))];
//! let mut wires = WireManager::new();
//! wires.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch));
//!
//! let result = calculate(&runs, &wires, &LoadCalcInput::default(), &mut CollectingSink::default()).unwrap();
//! assert!(result.passes());
//! println!("Max spacing: {:?}", result.max_passing_spacing());
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{conduit_weight, strut_capacity, wire_weight, StrutCapacity};
use crate::diagnostics::{DiagnosticSink, LookupMiss, LookupTable};
use crate::errors::{TakeoffError, TakeoffResult};
use crate::project::EstimateSettings;
use crate::takeoff::{ConduitRun, WireManager};
use crate::units::{Feet, FeetInches, Inches, NominalDiameter, PlF, Pounds};

/// Support spacings checked, in whole feet
pub const SPACINGS_FT: std::ops::RangeInclusive<u32> = 1..=12;

/// Rack geometry for one calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadCalcInput {
    /// Length of rack the bundle weight is spread over
    pub run_length: Feet,

    /// Standard strut length; must be a tabulated span
    pub strut_length: Feet,

    /// Capacity reduction for pierced channel
    pub pierced_hole_factor: f64,
}

impl Default for LoadCalcInput {
    fn default() -> Self {
        LoadCalcInput::from(&EstimateSettings::default())
    }
}

impl From<&EstimateSettings> for LoadCalcInput {
    fn from(settings: &EstimateSettings) -> Self {
        LoadCalcInput {
            run_length: settings.rack_run_length,
            strut_length: settings.strut_length,
            pierced_hole_factor: settings.pierced_hole_factor,
        }
    }
}

impl LoadCalcInput {
    pub fn validate(&self) -> TakeoffResult<()> {
        if !self.run_length.0.is_finite() || self.run_length.0 <= 0.0 {
            return Err(TakeoffError::invalid_input(
                "run_length",
                self.run_length.0.to_string(),
                "Rack run length must be positive",
            ));
        }
        if !self.strut_length.0.is_finite() || self.strut_length.0 <= 0.0 {
            return Err(TakeoffError::invalid_input(
                "strut_length",
                self.strut_length.0.to_string(),
                "Strut length must be positive",
            ));
        }
        if !(self.pierced_hole_factor > 0.0 && self.pierced_hole_factor <= 1.0) {
            return Err(TakeoffError::invalid_input(
                "pierced_hole_factor",
                self.pierced_hole_factor.to_string(),
                "Pierced hole factor must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Weight carried by one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunWeight {
    pub run_id: String,
    pub length: Feet,
    pub diameter: NominalDiameter,
    /// Empty raceway, whole pounds
    pub conduit_weight: Pounds,
    /// All tabulated conductors, whole pounds
    pub wire_weight: Pounds,
}

impl RunWeight {
    pub fn total(&self) -> Pounds {
        self.conduit_weight + self.wire_weight
    }
}

/// One support spacing checked against the strut table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacingCheck {
    pub spacing: Feet,

    /// Load on one strut at this spacing
    pub required_load: Pounds,

    /// Tabulated capacity; `None` when the strut length is not tabulated
    pub capacity: Option<StrutCapacity>,

    /// Capacity of pierced channel, for reference only
    pub pierced: Option<StrutCapacity>,

    pub passed: bool,
}

impl SpacingCheck {
    /// Compare the load at `spacing` with a strut row.
    pub fn evaluate(weight_per_foot: PlF, spacing: Feet, capacity: Option<StrutCapacity>, pierced_factor: f64) -> Self {
        let required_load = weight_per_foot.over(spacing);
        let passed = capacity.is_some_and(|c| required_load.0 < c.max_uniform_load.0);
        SpacingCheck {
            spacing,
            required_load,
            capacity,
            pierced: capacity.map(|c| c.pierced(pierced_factor)),
            passed,
        }
    }

    /// Midpoint concentrated load capacity
    pub fn concentrated_load(&self) -> Option<Pounds> {
        self.capacity.map(|c| c.concentrated_load())
    }

    /// Deflection at the midpoint concentrated load
    pub fn concentrated_deflection(&self) -> Option<Inches> {
        self.capacity.map(|c| c.concentrated_deflection())
    }
}

/// Result of a rack load calculation.
///
/// Totals are derived from `runs`, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCalcResult {
    /// Weighed runs, in input order
    pub runs: Vec<RunWeight>,
    pub run_length: Feet,
    pub strut_length: Feet,
    pub pierced_hole_factor: f64,
    pub failures: Vec<LookupMiss>,
    /// One check per spacing, ascending
    pub checks: Vec<SpacingCheck>,
}

impl LoadCalcResult {
    /// Sum of weighed run lengths
    pub fn total_length(&self) -> Feet {
        self.runs.iter().map(|r| r.length).sum()
    }

    pub fn total_conduit_weight(&self) -> Pounds {
        self.runs.iter().map(|r| r.conduit_weight).sum()
    }

    pub fn total_wire_weight(&self) -> Pounds {
        self.runs.iter().map(|r| r.wire_weight).sum()
    }

    pub fn total_weight(&self) -> Pounds {
        self.runs.iter().map(RunWeight::total).sum()
    }

    /// Bundle weight spread over the rack run length
    pub fn weight_per_foot(&self) -> PlF {
        self.total_weight().per(self.run_length)
    }

    /// Largest spacing that passed
    pub fn max_passing_spacing(&self) -> Option<Feet> {
        self.checks.iter().filter(|c| c.passed).map(|c| c.spacing).last()
    }

    /// True if at least one spacing passed
    pub fn passes(&self) -> bool {
        self.checks.iter().any(|c| c.passed)
    }
}

/// Weigh the runs and check every support spacing.
pub fn calculate(
    runs: &[ConduitRun],
    wires: &WireManager,
    input: &LoadCalcInput,
    sink: &mut dyn DiagnosticSink,
) -> TakeoffResult<LoadCalcResult> {
    input.validate()?;

    let mut failures = Vec::new();
    let mut weighed = Vec::with_capacity(runs.len());
    for run in runs {
        if let Some(weight) = weigh_run(run, wires, &mut failures) {
            weighed.push(weight);
        }
    }

    let capacity = match strut_capacity(input.strut_length, &FeetInches) {
        Ok(row) => Some(row),
        Err(miss) => {
            failures.push(miss);
            None
        }
    };

    for miss in &failures {
        sink.report_miss(miss);
    }

    let mut result = LoadCalcResult {
        runs: weighed,
        run_length: input.run_length,
        strut_length: input.strut_length,
        pierced_hole_factor: input.pierced_hole_factor,
        failures,
        checks: Vec::new(),
    };

    let weight_per_foot = result.weight_per_foot();
    result.checks = SPACINGS_FT
        .map(|ft| SpacingCheck::evaluate(weight_per_foot, Feet(ft as f64), capacity, input.pierced_hole_factor))
        .collect();

    info!(
        runs = result.runs.len(),
        total_weight = result.total_weight().0,
        weight_per_foot = weight_per_foot.0,
        max_spacing = ?result.max_passing_spacing().map(|s| s.0),
        failures = result.failures.len(),
        "Rack load calculation complete"
    );
    Ok(result)
}

/// Calculate with the rack geometry from project settings.
pub fn calculate_with_settings(
    runs: &[ConduitRun],
    wires: &WireManager,
    settings: &EstimateSettings,
    sink: &mut dyn DiagnosticSink,
) -> TakeoffResult<LoadCalcResult> {
    calculate(runs, wires, &LoadCalcInput::from(settings), sink)
}

fn weigh_run(run: &ConduitRun, wires: &WireManager, failures: &mut Vec<LookupMiss>) -> Option<RunWeight> {
    let diameter = run.nominal_diameter();
    let Some(conduit_plf) = conduit_weight(run.material, diameter) else {
        failures.push(
            LookupMiss::new(LookupTable::ConduitWeight, format!("{} {}", run.material, diameter.label()))
                .for_run(run.id.clone()),
        );
        return None;
    };

    let mut wire_plf = PlF::default();
    for wire in wires.wires(&run.id) {
        match wire_weight(wire.size, wire.material) {
            Some(plf) => wire_plf += plf,
            None => failures.push(
                LookupMiss::new(
                    LookupTable::WireWeight,
                    format!("{} {}", wire.size, wire.material.display_name()),
                )
                .for_run(run.id.clone()),
            ),
        }
    }

    let weight = RunWeight {
        run_id: run.id.clone(),
        length: run.length,
        diameter,
        conduit_weight: conduit_plf.over(run.length).ceil(),
        wire_weight: wire_plf.over(run.length).ceil(),
    };
    debug!(
        run = %run.id,
        conduit_lb = weight.conduit_weight.0,
        wire_lb = weight.wire_weight.0,
        "Weighed run"
    );
    Some(weight)
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::strut::STRUT_CAPACITY_TABLE;
    use crate::catalog::{ConduitMaterial, WireSize, WireType};
    use crate::diagnostics::NullSink;
    use crate::takeoff::Wire;

    proptest! {
        #[test]
        fn total_weight_is_conduit_plus_wire(
            lengths in prop::collection::vec(0.0f64..500.0, 0..20),
            conductors in 0usize..6,
        ) {
            let mut runs = Vec::new();
            let mut wires = WireManager::new();
            for (i, length) in lengths.iter().enumerate() {
                let id = format!("R-{}", i);
                runs.push(ConduitRun::new(id.clone(), ConduitMaterial::Emt, Feet(0.75 / 12.0), Feet(*length)));
                for c in 0..conductors {
                    wires.assign(id.clone(), Wire::new(c.to_string(), WireSize::Awg10, "Black", WireType::Branch));
                }
            }
            let result = calculate(&runs, &wires, &LoadCalcInput::default(), &mut NullSink).unwrap();
            prop_assert_eq!(result.total_weight(), result.total_conduit_weight() + result.total_wire_weight());
            prop_assert_eq!(result.checks.len(), 12);
        }

        #[test]
        fn passing_spacings_are_a_prefix(weight_per_foot in 0.0f64..2000.0) {
            let row = STRUT_CAPACITY_TABLE[8];
            let checks: Vec<_> = SPACINGS_FT
                .map(|ft| SpacingCheck::evaluate(PlF(weight_per_foot), Feet(ft as f64), Some(row), 0.95))
                .collect();
            let first_fail = checks.iter().position(|c| !c.passed).unwrap_or(checks.len());
            prop_assert!(checks[first_fail..].iter().all(|c| !c.passed));
        }
    }
}
