//! # Voltage Drop
//!
//! Distance-driven wire upsizing. A [`VoltageDropRule`] says "at this panel
//! voltage, runs longer than `min` and shorter than `max` need at least this
//! wire size". The upsizing pass applies the rules to every run of a package
//! and re-sizes the run's grounds to match the largest new conductor.
//!
//! ## Resolution Order
//!
//! Rules may overlap. [`resolve`] scans them in the order the caller supplied
//! and returns the first hit; it never sorts. [`order_by_precedence`] exists
//! for display and is not part of resolution.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::catalog::{Voltage, WireSize};
//! use takeoff_core::units::Feet;
//! use takeoff_core::voltage_drop::{resolve, VoltageDropRule};
//!
//! let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
//! let v120 = Voltage::new("120V");
//!
//! assert_eq!(resolve(&rules, &v120, Feet(30.0)).map(|r| r.size), Some(WireSize::Awg10));
//! // Interval ends are excluded
//! assert!(resolve(&rules, &v120, Feet(50.0)).is_none());
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{ground_size_for_conductor, Voltage, WireSize};
use crate::diagnostics::{DiagnosticSink, LookupMiss};
use crate::takeoff::{ConduitRun, Package, Wire, WireManager, WireSet};
use crate::units::{Feet, FeetInches, LengthFormatter};

/// Upsizing rule for an open distance interval at one panel voltage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoltageDropRule {
    /// Lower bound, exclusive
    pub min: Feet,
    /// Upper bound, exclusive
    pub max: Feet,
    /// Minimum wire size for runs inside the interval
    pub size: WireSize,
    /// Panel voltage the rule applies to
    pub voltage: Voltage,
}

impl VoltageDropRule {
    pub fn new(min: Feet, max: Feet, size: WireSize, voltage: impl Into<String>) -> Self {
        VoltageDropRule {
            min,
            max,
            size,
            voltage: Voltage::new(voltage),
        }
    }

    /// `min < length < max`
    pub fn contains(&self, length: Feet) -> bool {
        self.min < length && length < self.max
    }

    pub fn applies_to(&self, voltage: &Voltage, length: Feet) -> bool {
        self.voltage == *voltage && self.contains(length)
    }
}

/// First rule, in caller order, matching the voltage exactly with the length
/// strictly inside its interval.
///
/// `length` must already include any makeup allowance.
pub fn resolve<'a>(rules: &'a [VoltageDropRule], voltage: &Voltage, length: Feet) -> Option<&'a VoltageDropRule> {
    rules.iter().find(|rule| rule.applies_to(voltage, length))
}

/// Rules sorted by lower bound for display. Stable, so rules with equal
/// bounds keep their declared order. Not used by [`resolve`].
pub fn order_by_precedence(rules: &[VoltageDropRule]) -> Vec<VoltageDropRule> {
    let mut ordered = rules.to_vec();
    ordered.sort_by(|a, b| a.min.0.total_cmp(&b.min.0));
    ordered
}

// ============================================================================
// Panel voltages
// ============================================================================

/// Where the upsizing pass gets a wire's panel voltage.
pub trait PanelVoltageSource {
    /// Voltage of the panel feeding `wire`, if it can be determined
    fn panel_voltage(&self, wire: &Wire) -> Option<&Voltage>;
}

impl PanelVoltageSource for BTreeMap<String, Voltage> {
    fn panel_voltage(&self, wire: &Wire) -> Option<&Voltage> {
        wire.panel.as_deref().and_then(|panel| self.get(panel))
    }
}

impl PanelVoltageSource for Package {
    fn panel_voltage(&self, wire: &Wire) -> Option<&Voltage> {
        self.panels.panel_voltage(wire)
    }
}

// ============================================================================
// Upsizing pass
// ============================================================================

/// Result of the upsizing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsizeOutcome {
    /// Same runs, same wire count per run, some sizes replaced
    pub wires: WireManager,
    /// Runs where at least one conductor was upsized, in run order
    pub changed_runs: Vec<String>,
    /// Ground resizing lookups that found nothing
    pub failures: Vec<LookupMiss>,
}

/// Apply voltage drop rules to every run's wires.
///
/// Best effort: a wire whose voltage cannot be determined or that no rule
/// covers is copied unchanged. Grounds follow the largest upsized conductor
/// of their run; low-voltage wires are never touched.
pub fn upsize_wires(
    runs: &[ConduitRun],
    wires: &WireManager,
    rules: &[VoltageDropRule],
    voltages: &dyn PanelVoltageSource,
    makeup: Feet,
    sink: &mut dyn DiagnosticSink,
) -> UpsizeOutcome {
    let mut out = wires.clone();
    let mut changed_runs = Vec::new();
    let mut failures = Vec::new();
    let mut seen = HashSet::new();

    for run in runs {
        if !seen.insert(run.id.as_str()) {
            continue;
        }
        let Some(set) = wires.wire_set(&run.id) else {
            continue;
        };

        let length = run.length + makeup;
        let (mut resized, largest) = upsize_set(set, rules, voltages, length);
        let Some(largest) = largest else {
            continue;
        };

        match ground_size_for_conductor(largest) {
            Ok(ground) => {
                for wire in resized.wires.iter_mut().filter(|w| w.is_ground() && !w.wire_type.is_low_voltage()) {
                    wire.size = ground;
                }
            }
            Err(miss) => {
                let miss = miss.for_run(run.id.clone());
                sink.report_miss(&miss);
                failures.push(miss);
            }
        }

        debug!(run = %run.id, largest = %largest, "Upsized run for voltage drop");
        out.insert_set(run.id.clone(), resized);
        changed_runs.push(run.id.clone());
    }

    info!(
        runs = runs.len(),
        changed = changed_runs.len(),
        failures = failures.len(),
        "Voltage drop upsizing complete"
    );

    UpsizeOutcome {
        wires: out,
        changed_runs,
        failures,
    }
}

/// Upsize the non-ground conductors of one run. Returns the new set and the
/// largest replacement size, if any replacement happened.
fn upsize_set(
    set: &WireSet,
    rules: &[VoltageDropRule],
    voltages: &dyn PanelVoltageSource,
    length: Feet,
) -> (WireSet, Option<WireSize>) {
    let mut largest: Option<WireSize> = None;
    let wires = set
        .wires
        .iter()
        .map(|wire| {
            if wire.is_ground() || wire.wire_type.is_low_voltage() {
                return wire.clone();
            }
            let rule = voltages
                .panel_voltage(wire)
                .and_then(|voltage| resolve(rules, voltage, length));
            match rule {
                Some(rule) if rule.size.is_larger_than(&wire.size) => {
                    largest = Some(match largest {
                        Some(current) if current.is_larger_than(&rule.size) => current,
                        _ => rule.size,
                    });
                    wire.resized(rule.size)
                }
                _ => wire.clone(),
            }
        })
        .collect();

    (
        WireSet {
            wires,
            no_export: set.no_export.clone(),
        },
        largest,
    )
}

// ============================================================================
// Rule import
// ============================================================================

/// Placeholder for a field that was left blank
pub const EMPTY_FIELD: &str = "<empty>";

/// Placeholder for a field that did not parse
pub const INVALID_FIELD: &str = "<invalid>";

/// One unparsed rule row: min, max, size, voltage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRuleRow {
    /// 1-based line number in the source
    pub line: usize,
    pub min: String,
    pub max: String,
    pub size: String,
    pub voltage: String,
}

/// A row that was skipped, with placeholders marking the bad fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedRow {
    pub line: usize,
    /// min, max, size, voltage; bad fields replaced by a placeholder
    pub fields: [String; 4],
}

impl fmt::Display for FailedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.fields.join(", "))
    }
}

/// Parsed rules in source order plus the rows that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleImport {
    pub rules: Vec<VoltageDropRule>,
    pub failed_rows: Vec<FailedRow>,
}

/// Split delimited text into raw rows.
///
/// Fields are separated by commas or tabs. Blank lines and `#` comments are
/// ignored, as is a header line whose first field is `min`. Short lines are
/// padded with empty fields so they surface as failed rows.
pub fn parse_rule_rows(text: &str) -> Vec<RawRuleRow> {
    text.lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                return None;
            }
            let mut fields = trimmed.split([',', '\t']).map(|f| f.trim().to_string());
            let mut next = || fields.next().unwrap_or_default();
            let row = RawRuleRow {
                line: i + 1,
                min: next(),
                max: next(),
                size: next(),
                voltage: next(),
            };
            if row.min.eq_ignore_ascii_case("min") {
                return None;
            }
            Some(row)
        })
        .collect()
}

/// Turn raw rows into rules, skipping and collecting malformed rows.
///
/// Lengths accept decimal feet or feet-inches (`50`, `50'`, `50' - 6"`).
pub fn import_rules(rows: &[RawRuleRow], sink: &mut dyn DiagnosticSink) -> RuleImport {
    let formatter = FeetInches;
    let mut import = RuleImport::default();

    for row in rows {
        let min = parse_field(&row.min, |s| formatter.parse(s));
        let max = parse_field(&row.max, |s| formatter.parse(s));
        let size = parse_field(&row.size, |s| s.parse::<WireSize>().ok());
        let voltage = parse_field(&row.voltage, |s| Some(Voltage::new(s)));

        match (&min, &max, &size, &voltage) {
            (Ok(min), Ok(max), Ok(size), Ok(voltage)) => import.rules.push(VoltageDropRule {
                min: *min,
                max: *max,
                size: *size,
                voltage: voltage.clone(),
            }),
            _ => {
                let failed = FailedRow {
                    line: row.line,
                    fields: [
                        shown(&row.min, &min),
                        shown(&row.max, &max),
                        shown(&row.size, &size),
                        shown(&row.voltage, &voltage),
                    ],
                };
                sink.report("Voltage Drop Import", &failed.to_string());
                import.failed_rows.push(failed);
            }
        }
    }

    debug!(
        imported = import.rules.len(),
        failed = import.failed_rows.len(),
        "Voltage drop rules imported"
    );
    import
}

/// Ok(value), or Err(placeholder) for an empty or unparseable field
fn parse_field<T>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(EMPTY_FIELD);
    }
    parse(raw).ok_or(INVALID_FIELD)
}

fn shown<T>(raw: &str, parsed: &Result<T, &'static str>) -> String {
    match parsed {
        Ok(_) => raw.trim().to_string(),
        Err(placeholder) => placeholder.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConduitMaterial, WireType};
    use crate::diagnostics::{CollectingSink, NullSink};

    fn v(label: &str) -> Voltage {
        Voltage::new(label)
    }

    fn one_run(length: f64) -> ConduitRun {
        ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(0.75 / 12.0), Feet(length))
    }

    fn panels() -> BTreeMap<String, Voltage> {
        let mut p = BTreeMap::new();
        p.insert("LP-1".to_string(), v("120V"));
        p.insert("HP-1".to_string(), v("277V"));
        p
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let rules = vec![
            VoltageDropRule::new(Feet(0.0), Feet(100.0), WireSize::Awg10, "120V"),
            VoltageDropRule::new(Feet(20.0), Feet(60.0), WireSize::Awg8, "120V"),
        ];
        let hit = resolve(&rules, &v("120V"), Feet(40.0)).unwrap();
        assert_eq!(hit.size, WireSize::Awg10);
    }

    #[test]
    fn test_resolve_voltage_must_match_exactly() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        assert!(resolve(&rules, &v("120 V"), Feet(30.0)).is_none());
        assert!(resolve(&rules, &v("277V"), Feet(30.0)).is_none());
    }

    #[test]
    fn test_resolve_bounds_are_exclusive() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        assert!(resolve(&rules, &v("120V"), Feet(10.0)).is_none());
        assert!(resolve(&rules, &v("120V"), Feet(50.0)).is_none());
        assert!(resolve(&rules, &v("120V"), Feet(10.001)).is_some());
    }

    #[test]
    fn test_order_by_precedence_is_not_applied_by_resolve() {
        let rules = vec![
            VoltageDropRule::new(Feet(50.0), Feet(200.0), WireSize::Awg8, "120V"),
            VoltageDropRule::new(Feet(0.0), Feet(100.0), WireSize::Awg10, "120V"),
        ];
        let ordered = order_by_precedence(&rules);
        assert_eq!(ordered[0].min, Feet(0.0));
        // Resolution still uses declared order
        assert_eq!(resolve(&rules, &v("120V"), Feet(75.0)).unwrap().size, WireSize::Awg8);
        assert_eq!(resolve(&ordered, &v("120V"), Feet(75.0)).unwrap().size, WireSize::Awg10);
    }

    #[test]
    fn test_upsize_resizes_hot_and_ground() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "White", WireType::Branch).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Green", WireType::Branch).with_panel("LP-1"));

        let out = upsize_wires(&[one_run(30.0)], &wm, &rules, &panels(), Feet(0.0), &mut NullSink);

        let sizes: Vec<_> = out.wires.wires("R-1").iter().map(|w| w.size).collect();
        // 30A breaker for #10 -> #10 ground
        assert_eq!(sizes, [WireSize::Awg10, WireSize::Awg10, WireSize::Awg10]);
        assert_eq!(out.changed_runs, ["R-1"]);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn test_upsize_boundary_length_is_untouched() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch).with_panel("LP-1"));

        let out = upsize_wires(&[one_run(50.0)], &wm, &rules, &panels(), Feet(0.0), &mut NullSink);
        assert_eq!(out.wires, wm);
        assert!(out.changed_runs.is_empty());
    }

    #[test]
    fn test_upsize_adds_makeup_before_resolving() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch).with_panel("LP-1"));

        // 8 ft run + 6 ft makeup = 14 ft, inside the interval
        let out = upsize_wires(&[one_run(8.0)], &wm, &rules, &panels(), Feet(6.0), &mut NullSink);
        assert_eq!(out.wires.wires("R-1")[0].size, WireSize::Awg10);
    }

    #[test]
    fn test_upsize_never_shrinks() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg6, "Black", WireType::Feeder).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("1", WireSize::Awg6, "Green", WireType::Feeder).with_panel("LP-1"));

        let out = upsize_wires(&[one_run(30.0)], &wm, &rules, &panels(), Feet(0.0), &mut NullSink);
        assert_eq!(out.wires, wm);
    }

    #[test]
    fn test_upsize_skips_unknown_voltage_and_low_voltage() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch));
        wm.assign("R-1", Wire::new("2", WireSize::Awg18, "Red", WireType::LowVoltage).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("3", WireSize::Awg12, "Blue", WireType::Branch).with_panel("NOPE"));

        let out = upsize_wires(&[one_run(30.0)], &wm, &rules, &panels(), Feet(0.0), &mut NullSink);
        assert_eq!(out.wires, wm);
    }

    #[test]
    fn test_upsize_keeps_largest_replacement_for_ground() {
        let rules = vec![
            VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg10, "120V"),
            VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg3, "277V"),
        ];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("2", WireSize::Awg12, "Brown", WireType::Branch).with_panel("HP-1"));
        wm.assign("R-1", Wire::new("2", WireSize::Awg12, "Green", WireType::Branch).with_panel("HP-1"));

        let out = upsize_wires(&[one_run(30.0)], &wm, &rules, &panels(), Feet(0.0), &mut NullSink);
        let sizes: Vec<_> = out.wires.wires("R-1").iter().map(|w| w.size).collect();
        // #3 -> 100A -> #8 ground
        assert_eq!(sizes, [WireSize::Awg10, WireSize::Awg3, WireSize::Awg8]);
    }

    #[test]
    fn test_upsize_ground_miss_is_recorded() {
        let rules = vec![VoltageDropRule::new(Feet(10.0), Feet(50.0), WireSize::Awg16, "120V")];
        let mut wm = WireManager::new();
        wm.assign("R-1", Wire::new("1", WireSize::Awg18, "Black", WireType::Branch).with_panel("LP-1"));
        wm.assign("R-1", Wire::new("1", WireSize::Awg18, "Green", WireType::Branch).with_panel("LP-1"));

        let mut sink = CollectingSink::default();
        let out = upsize_wires(&[one_run(30.0)], &wm, &rules, &panels(), Feet(0.0), &mut sink);
        let wires = out.wires.wires("R-1");
        assert_eq!(wires[0].size, WireSize::Awg16);
        assert_eq!(wires[1].size, WireSize::Awg18);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].run_id.as_deref(), Some("R-1"));
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn test_parse_rule_rows() {
        let text = "min,max,size,voltage\n# comment\n10,50,#10,120V\n\n50\t100\t#8\t120V\n0,,#6\n";
        let rows = parse_rule_rows(text);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[1].size, "#8");
        assert_eq!(rows[2].max, "");
        assert_eq!(rows[2].voltage, "");
    }

    #[test]
    fn test_import_collects_failed_rows() {
        let rows = parse_rule_rows("10,50,#10,120V\n0,,#6,120V\n5,10,#11,208V\n50' - 6\",100',#8,277V\n");
        let mut sink = CollectingSink::default();
        let import = import_rules(&rows, &mut sink);

        assert_eq!(import.rules.len(), 2);
        assert_eq!(import.rules[1].min, Feet(50.5));
        assert_eq!(import.rules[1].voltage, v("277V"));

        assert_eq!(import.failed_rows.len(), 2);
        assert_eq!(import.failed_rows[0].fields[1], EMPTY_FIELD);
        assert_eq!(import.failed_rows[0].fields[2], "#6");
        assert_eq!(import.failed_rows[1].fields[2], INVALID_FIELD);
        assert_eq!(sink.diagnostics().len(), 2);
    }
}
