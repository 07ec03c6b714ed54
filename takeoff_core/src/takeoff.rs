//! # Takeoff Records
//!
//! The abstract records the host model hands to the engine: conduit runs,
//! the wires pulled through them, fittings, electrical-room allowances, and
//! the [`Package`] that bundles one set of them for aggregation.
//!
//! ## Structure
//!
//! ```text
//! Package
//! ├── runs: Vec<ConduitRun>              (ordered as exported)
//! ├── wires: WireManager                 (run id -> WireSet)
//! ├── fittings: BTreeMap<id, FittingRecord>
//! ├── rules: Vec<VoltageDropRule>        (caller order is resolution order)
//! ├── electrical_rooms: Vec<ElectricalRoomRecord>
//! └── panels: BTreeMap<panel, Voltage>
//! ```
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::catalog::{ConduitMaterial, WireSize, WireType};
//! use takeoff_core::takeoff::{ConduitRun, Package, Wire};
//! use takeoff_core::units::Feet;
//!
//! let mut package = Package::new("Level 2 Lighting");
//! package.runs.push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(0.75 / 12.0), Feet(42.0)));
//! assert!(package.wires.assign("R-1", Wire::new("LP2-1", WireSize::Awg12, "Black", WireType::Branch)));
//! // Same circuit and color again is rejected
//! assert!(!package.wires.assign("R-1", Wire::new("LP2-1", WireSize::Awg12, "Black", WireType::Branch)));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{is_ground_color, ConduitMaterial, Voltage, WireMaterial, WireSize, WireType};
use crate::errors::{TakeoffError, TakeoffResult};
use crate::units::{Feet, NominalDiameter};
use crate::voltage_drop::VoltageDropRule;

/// One physical conduit run segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConduitRun {
    /// Run identifier, also the key into the [`WireManager`]
    pub id: String,

    /// Raceway material
    pub material: ConduitMaterial,

    /// Nominal diameter in feet
    pub diameter: Feet,

    /// Run length in feet
    pub length: Feet,

    /// Fitting ids along the run, in order
    #[serde(default)]
    pub fittings: Vec<String>,

    /// Free-text origin label (panel, box, device)
    #[serde(default)]
    pub from: String,

    /// Free-text destination label
    #[serde(default)]
    pub to: String,
}

impl ConduitRun {
    pub fn new(id: impl Into<String>, material: ConduitMaterial, diameter: Feet, length: Feet) -> Self {
        ConduitRun {
            id: id.into(),
            material,
            diameter,
            length,
            fittings: Vec::new(),
            from: String::new(),
            to: String::new(),
        }
    }

    /// Add fitting references (builder pattern)
    pub fn with_fittings<I, S>(mut self, fittings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fittings.extend(fittings.into_iter().map(Into::into));
        self
    }

    /// Set the from/to labels (builder pattern)
    pub fn with_labels(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.from = from.into();
        self.to = to.into();
        self
    }

    /// Diameter snapped to a trade size key
    pub fn nominal_diameter(&self) -> NominalDiameter {
        NominalDiameter::from_feet(self.diameter)
    }

    /// Validate geometry handed over by the host.
    pub fn validate(&self) -> TakeoffResult<()> {
        if self.id.trim().is_empty() {
            return Err(TakeoffError::invalid_input("id", "", "Run id must not be empty"));
        }
        if !self.length.0.is_finite() || self.length.0 < 0.0 {
            return Err(TakeoffError::invalid_input(
                "length",
                self.length.0.to_string(),
                "Run length must be zero or positive",
            ));
        }
        if !self.diameter.0.is_finite() || self.diameter.0 <= 0.0 {
            return Err(TakeoffError::invalid_input(
                "diameter",
                self.diameter.0.to_string(),
                "Diameter must be positive",
            ));
        }
        Ok(())
    }
}

/// One conductor pulled through a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// Circuit identifier (e.g. "LP2-14")
    pub circuit: String,

    pub size: WireSize,

    /// Insulation color
    pub color: String,

    pub wire_type: WireType,

    #[serde(default)]
    pub material: WireMaterial,

    /// Panel the circuit is fed from; its voltage drives upsizing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel: Option<String>,
}

impl Wire {
    pub fn new(circuit: impl Into<String>, size: WireSize, color: impl Into<String>, wire_type: WireType) -> Self {
        Wire {
            circuit: circuit.into(),
            size,
            color: color.into(),
            wire_type,
            material: WireMaterial::Copper,
            panel: None,
        }
    }

    pub fn with_material(mut self, material: WireMaterial) -> Self {
        self.material = material;
        self
    }

    pub fn with_panel(mut self, panel: impl Into<String>) -> Self {
        self.panel = Some(panel.into());
        self
    }

    /// Same wire at a different size
    pub fn resized(&self, size: WireSize) -> Self {
        Wire { size, ..self.clone() }
    }

    /// Equipment grounding conductor, by insulation color
    pub fn is_ground(&self) -> bool {
        is_ground_color(&self.color)
    }

    /// Identity within a run: one wire per circuit and color
    pub fn same_identity(&self, other: &Wire) -> bool {
        self.circuit == other.circuit && self.color.eq_ignore_ascii_case(&other.color)
    }
}

/// The wires assigned to a single run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireSet {
    /// Wires in assignment order, unique by identity
    pub(crate) wires: Vec<Wire>,

    /// Wire types excluded from export for this run
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub no_export: BTreeSet<WireType>,
}

impl WireSet {
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn contains_type(&self, wire_type: WireType) -> bool {
        self.wires.iter().any(|w| w.wire_type == wire_type)
    }

    pub fn is_no_export(&self, wire_type: WireType) -> bool {
        self.no_export.contains(&wire_type)
    }

    /// Push a wire unless one with the same identity is already present
    pub fn insert(&mut self, wire: Wire) -> bool {
        if self.wires.iter().any(|w| w.same_identity(&wire)) {
            return false;
        }
        self.wires.push(wire);
        true
    }

    /// First wire that repeats an earlier wire's identity
    pub fn duplicate(&self) -> Option<&Wire> {
        self.wires
            .iter()
            .enumerate()
            .find(|(i, wire)| self.wires[..*i].iter().any(|w| w.same_identity(wire)))
            .map(|(_, wire)| wire)
    }
}

/// Run id → wires assigned to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireManager {
    runs: BTreeMap<String, WireSet>,
}

impl WireManager {
    pub fn new() -> Self {
        WireManager::default()
    }

    /// Assign a wire to a run. Returns false if the run already carries a
    /// wire with the same identity.
    pub fn assign(&mut self, run_id: impl Into<String>, wire: Wire) -> bool {
        self.runs.entry(run_id.into()).or_default().insert(wire)
    }

    /// Flag a wire type as excluded from export for a run
    pub fn set_no_export(&mut self, run_id: impl Into<String>, wire_type: WireType) {
        self.runs.entry(run_id.into()).or_default().no_export.insert(wire_type);
    }

    pub fn wire_set(&self, run_id: &str) -> Option<&WireSet> {
        self.runs.get(run_id)
    }

    /// Wires of a run; empty when the run carries none
    pub fn wires(&self, run_id: &str) -> &[Wire] {
        self.runs.get(run_id).map(|s| s.wires.as_slice()).unwrap_or(&[])
    }

    pub(crate) fn insert_set(&mut self, run_id: impl Into<String>, set: WireSet) {
        self.runs.insert(run_id.into(), set);
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn wire_count(&self) -> usize {
        self.runs.values().map(|s| s.wires.len()).sum()
    }

    /// Reject a run carrying two wires with the same identity. Assignment
    /// already prevents this; deserialized wire maps are checked here.
    pub fn validate(&self) -> TakeoffResult<()> {
        for (run_id, set) in &self.runs {
            if let Some(wire) = set.duplicate() {
                return Err(TakeoffError::invalid_input(
                    format!("wires[{}]", run_id),
                    format!("{} {}", wire.circuit, wire.color),
                    "A run may carry only one wire per circuit and color",
                ));
            }
        }
        Ok(())
    }

    /// Every wire type present anywhere, ascending
    pub fn wire_types(&self) -> BTreeSet<WireType> {
        self.runs
            .values()
            .flat_map(|s| s.wires.iter().map(|w| w.wire_type))
            .collect()
    }
}

/// A fitting (elbow, offset, etc.) referenced by runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingRecord {
    /// Bend angle in degrees
    pub angle: f64,

    /// Nominal diameter in feet
    pub diameter: Feet,

    /// Family/type name (e.g. "EMT Elbow")
    pub type_name: String,
}

impl FittingRecord {
    pub fn new(angle: f64, diameter: Feet, type_name: impl Into<String>) -> Self {
        FittingRecord {
            angle,
            diameter,
            type_name: type_name.into(),
        }
    }
}

/// Length of a run already counted inside an electrical room takeoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricalRoomRecord {
    pub run_id: String,
    pub length: Feet,
}

/// One set of aggregation inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,

    pub name: String,

    #[serde(default)]
    pub runs: Vec<ConduitRun>,

    #[serde(default)]
    pub wires: WireManager,

    #[serde(default)]
    pub fittings: BTreeMap<String, FittingRecord>,

    /// Voltage drop rules; their order is the resolution order
    #[serde(default)]
    pub rules: Vec<VoltageDropRule>,

    #[serde(default)]
    pub electrical_rooms: Vec<ElectricalRoomRecord>,

    /// Panel name → panel voltage
    #[serde(default)]
    pub panels: BTreeMap<String, Voltage>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            id: Uuid::new_v4(),
            name: name.into(),
            runs: Vec::new(),
            wires: WireManager::new(),
            fittings: BTreeMap::new(),
            rules: Vec::new(),
            electrical_rooms: Vec::new(),
            panels: BTreeMap::new(),
        }
    }

    /// Validate every run, then the wire map; the first problem is reported.
    pub fn validate(&self) -> TakeoffResult<()> {
        for run in &self.runs {
            run.validate()?;
        }
        self.wires.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn black(circuit: &str) -> Wire {
        Wire::new(circuit, WireSize::Awg12, "Black", WireType::Branch)
    }

    #[test]
    fn test_assign_rejects_duplicate_identity() {
        let mut wm = WireManager::new();
        assert!(wm.assign("R-1", black("1")));
        assert!(!wm.assign("R-1", black("1")));
        // Color comparison ignores case
        assert!(!wm.assign("R-1", Wire::new("1", WireSize::Awg10, "BLACK", WireType::Branch)));
        // Same wire in another run is fine
        assert!(wm.assign("R-2", black("1")));
        assert_eq!(wm.wire_count(), 2);
    }

    #[test]
    fn test_deserialized_duplicate_wire_is_rejected() {
        let mut package = Package::new("Dupes");
        package
            .runs
            .push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(10.0)));
        package.wires.assign("R-1", black("1"));
        assert!(package.validate().is_ok());

        let mut json = serde_json::to_value(&package).unwrap();
        let wires = json["wires"]["R-1"]["wires"].as_array_mut().unwrap();
        let mut copy = wires[0].clone();
        copy["color"] = "BLACK".into();
        wires.push(copy);

        let loaded: Package = serde_json::from_value(json).unwrap();
        let err = loaded.validate().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(loaded.wires.wire_set("R-1").unwrap().duplicate().unwrap().color, "BLACK");
    }

    #[test]
    fn test_wires_for_unknown_run_is_empty() {
        let wm = WireManager::new();
        assert!(wm.wires("nope").is_empty());
        assert!(wm.wire_set("nope").is_none());
    }

    #[test]
    fn test_no_export_flags() {
        let mut wm = WireManager::new();
        wm.assign("R-1", black("1"));
        wm.set_no_export("R-1", WireType::Branch);
        let set = wm.wire_set("R-1").unwrap();
        assert!(set.is_no_export(WireType::Branch));
        assert!(!set.is_no_export(WireType::Feeder));
        assert!(set.contains_type(WireType::Branch));
    }

    #[test]
    fn test_ground_detection() {
        assert!(Wire::new("1", WireSize::Awg12, "Green", WireType::Branch).is_ground());
        assert!(!black("1").is_ground());
    }

    #[test]
    fn test_run_validation() {
        let run = ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(20.0));
        assert!(run.validate().is_ok());
        let bad = ConduitRun::new("R-2", ConduitMaterial::Emt, Feet(0.0), Feet(20.0));
        assert!(bad.validate().is_err());
        let negative = ConduitRun::new("R-3", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(-1.0));
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_package_roundtrip() {
        let mut package = Package::new("Roundtrip");
        package.runs.push(
            ConduitRun::new("R-1", ConduitMaterial::Pvc, Feet(2.0 / 12.0), Feet(80.0))
                .with_fittings(["F-1", "F-2"])
                .with_labels("MDP", "LP-1"),
        );
        package.wires.assign("R-1", black("1").with_panel("LP-1"));
        package.wires.set_no_export("R-1", WireType::Data);
        package.fittings.insert("F-1".into(), FittingRecord::new(90.0, Feet(2.0 / 12.0), "PVC Elbow"));
        package.panels.insert("LP-1".into(), Voltage::new("120V"));

        let json = serde_json::to_string_pretty(&package).unwrap();
        let back: Package = serde_json::from_str(&json).unwrap();
        assert_eq!(back, package);
    }
}
