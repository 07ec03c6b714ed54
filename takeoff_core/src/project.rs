//! # Project Data Structures
//!
//! The `Project` struct is the root container for an estimate. Projects
//! serialize to `.tko` (Takeoff) files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (version, estimator, job info, timestamps)
//! ├── settings: EstimateSettings (makeup length, voltage drop, rack setup)
//! └── packages: Vec<Package> (aggregation inputs, addressed by index)
//! ```
//!
//! Engines never reach for a "current project". Callers build an
//! [`EstimateContext`] naming the project and the package to work on and pass
//! it in explicitly.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::project::{EstimateContext, Project};
//! use takeoff_core::takeoff::Package;
//!
//! let mut project = Project::new("Jane Estimator", "25-042", "ACME Corp");
//! project.add_package(Package::new("Level 1 Power"));
//!
//! let ctx = EstimateContext::new(&project, 0).unwrap();
//! assert_eq!(ctx.package().name, "Level 1 Power");
//!
//! // Asking for a package that is not there is a hard error
//! assert!(EstimateContext::new(&project, 3).is_err());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::takeoff::Package;
use crate::units::Feet;

/// Current schema version for .tko files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root project container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Project metadata (version, estimator, job info)
    pub meta: ProjectMetadata,

    /// Estimate settings shared by every package
    #[serde(default)]
    pub settings: EstimateSettings,

    /// Aggregation input packages, addressed by index
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Project {
    /// Create a new empty project.
    ///
    /// # Arguments
    ///
    /// * `estimator` - Name of the responsible estimator
    /// * `job_id` - Job/project number (e.g., "25-001")
    /// * `client` - Client name
    pub fn new(estimator: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                version: SCHEMA_VERSION.to_string(),
                estimator: estimator.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            settings: EstimateSettings::default(),
            packages: Vec::new(),
        }
    }

    /// Append a package, returning its index.
    pub fn add_package(&mut self, package: Package) -> usize {
        self.packages.push(package);
        self.touch();
        self.packages.len() - 1
    }

    /// Get a package by index.
    ///
    /// A missing index means the caller was set up wrong, so this is a hard
    /// [`TakeoffError::PackageNotFound`].
    pub fn package(&self, index: usize) -> TakeoffResult<&Package> {
        self.packages.get(index).ok_or(TakeoffError::PackageNotFound {
            index,
            count: self.packages.len(),
        })
    }

    /// Get a mutable package by index. Marks the project modified.
    pub fn package_mut(&mut self, index: usize) -> TakeoffResult<&mut Package> {
        let count = self.packages.len();
        if index >= count {
            return Err(TakeoffError::PackageNotFound { index, count });
        }
        self.meta.modified = Utc::now();
        Ok(&mut self.packages[index])
    }

    /// Remove a package by index.
    pub fn remove_package(&mut self, index: usize) -> TakeoffResult<Package> {
        let count = self.packages.len();
        if index >= count {
            return Err(TakeoffError::PackageNotFound { index, count });
        }
        self.touch();
        Ok(self.packages.remove(index))
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// Name of the responsible estimator
    pub estimator: String,

    /// Job/project number
    pub job_id: String,

    /// Client name
    pub client: String,

    /// When the project was created
    pub created: DateTime<Utc>,

    /// When the project was last modified
    pub modified: DateTime<Utc>,
}

/// Settings that shape every aggregation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateSettings {
    /// Slack/termination allowance added once per conduit group and to run
    /// lengths when resolving voltage drop rules
    pub makeup_length: Feet,

    /// Run the wire upsizing pass before totaling
    pub voltage_drop_enabled: bool,

    /// Length of the rack section weighed by the load calculator
    pub rack_run_length: Feet,

    /// Standard strut length; must be a tabulated span
    pub strut_length: Feet,

    /// Capacity reduction for pierced channel
    pub pierced_hole_factor: f64,
}

impl Default for EstimateSettings {
    fn default() -> Self {
        EstimateSettings {
            makeup_length: Feet(6.0),
            voltage_drop_enabled: false,
            rack_run_length: Feet(10.0),
            strut_length: Feet(10.0),
            pierced_hole_factor: 0.95,
        }
    }
}

impl EstimateSettings {
    /// Validate settings before a pass.
    pub fn validate(&self) -> TakeoffResult<()> {
        if !self.makeup_length.0.is_finite() || self.makeup_length.0 < 0.0 {
            return Err(TakeoffError::configuration(format!(
                "makeup_length must be zero or positive, got {}",
                self.makeup_length.0
            )));
        }
        if !self.rack_run_length.0.is_finite() || self.rack_run_length.0 <= 0.0 {
            return Err(TakeoffError::configuration(format!(
                "rack_run_length must be positive, got {}",
                self.rack_run_length.0
            )));
        }
        if !self.strut_length.0.is_finite() || self.strut_length.0 <= 0.0 {
            return Err(TakeoffError::configuration(format!(
                "strut_length must be positive, got {}",
                self.strut_length.0
            )));
        }
        if !(self.pierced_hole_factor > 0.0 && self.pierced_hole_factor <= 1.0) {
            return Err(TakeoffError::configuration(format!(
                "pierced_hole_factor must be in (0, 1], got {}",
                self.pierced_hole_factor
            )));
        }
        Ok(())
    }
}

/// What an engine call works on: a project snapshot and one of its packages.
#[derive(Debug, Clone, Copy)]
pub struct EstimateContext<'a> {
    project: &'a Project,
    package_index: usize,
}

impl<'a> EstimateContext<'a> {
    /// Bind a context, failing if the package index or settings are bad.
    pub fn new(project: &'a Project, package_index: usize) -> TakeoffResult<Self> {
        project.package(package_index)?;
        project.settings.validate()?;
        Ok(EstimateContext {
            project,
            package_index,
        })
    }

    pub fn project(&self) -> &'a Project {
        self.project
    }

    pub fn package_index(&self) -> usize {
        self.package_index
    }

    pub fn package(&self) -> &'a Package {
        // Index checked in `new`; the borrow keeps the project unchanged.
        &self.project.packages[self.package_index]
    }

    pub fn settings(&self) -> &'a EstimateSettings {
        &self.project.settings
    }
}
