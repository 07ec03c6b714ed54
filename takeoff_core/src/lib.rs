//! # takeoff_core - Electrical Estimating Engine
//!
//! `takeoff_core` turns the raw takeoff of an electrical model (conduit runs
//! and the wires pulled through them) into a bill of materials, and checks
//! the strut racks that carry the conduit. All inputs and outputs are
//! JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: Engines are functions over a snapshot of the takeoff
//! - **Two channels**: Data that could be produced comes back alongside every
//!   lookup that missed; a missing table entry never aborts a pass
//! - **Closed vocabularies**: Sizes and materials are enums that serialize to
//!   their catalog strings
//! - **Rich Errors**: Structured error types for the few hard failures
//!
//! ## Quick Start
//!
//! ```rust
//! use takeoff_core::catalog::{ConduitMaterial, WireSize, WireType};
//! use takeoff_core::diagnostics::CollectingSink;
//! use takeoff_core::project::{EstimateContext, Project};
//! use takeoff_core::takeoff::{ConduitRun, Package, Wire};
//! use takeoff_core::totals::build_report;
//! use takeoff_core::units::Feet;
//!
//! let mut package = Package::new("Level 1 Lighting");
//! package.runs.push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(0.75 / 12.0), Feet(42.0)));
//! package.wires.assign("R-1", Wire::new("LP1-1", WireSize::Awg12, "Black", WireType::Branch));
//!
//! let mut project = Project::new("J. Estimator", "25-014", "Acme Electric");
//! let index = project.add_package(package);
//!
//! let ctx = EstimateContext::new(&project, index).unwrap();
//! let report = build_report(&ctx, &mut CollectingSink::default());
//! assert_eq!(report.couplings[0].count, 6);
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - Wire sizes, materials, weight and strut tables
//! - [`takeoff`] - Runs, wires, fittings, packages
//! - [`project`] - Project container, metadata, and settings
//! - [`voltage_drop`] - Voltage drop rules and the wire upsizing pass
//! - [`totals`] - BOM totaling engines
//! - [`load_calc`] - Strut rack load calculation
//! - [`p3_box`] - P3 junction box classification
//! - [`diagnostics`] - Lookup misses and diagnostic sinks
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking
//! - [`pdf`] - BOM report rendering

pub mod catalog;
pub mod diagnostics;
pub mod errors;
pub mod file_io;
pub mod load_calc;
pub mod p3_box;
pub mod pdf;
pub mod project;
pub mod takeoff;
pub mod totals;
pub mod units;
pub mod voltage_drop;

// Re-export commonly used types at crate root for convenience
pub use diagnostics::{CollectingSink, DiagnosticSink, LookupMiss, Outcome, TracingSink};
pub use errors::{TakeoffError, TakeoffResult};
pub use file_io::{load_project, save_project, FileLock};
pub use project::{EstimateContext, EstimateSettings, Project, ProjectMetadata};
pub use takeoff::{ConduitRun, Package, Wire, WireManager};
