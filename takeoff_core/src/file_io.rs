//! # File I/O Module
//!
//! Project and package files on disk:
//! - **Atomic saves**: write a temp file, sync, rename over the target
//! - **File locking**: one estimator at a time on a shared drive
//! - **Version validation**: refuse files written by a newer schema
//!
//! ## File Formats
//!
//! | extension   | contents                                             |
//! |-------------|------------------------------------------------------|
//! | `.tko`      | a whole [`Project`] as JSON                          |
//! | `.tko.lock` | [`LockInfo`] of whoever holds the project            |
//! | `.tkp`      | a single [`Package`] as handed over by the host model |
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::file_io::{load_project, save_project, FileLock};
//! use takeoff_core::project::Project;
//! use std::path::Path;
//!
//! let project = Project::new("Estimator", "25-014", "Client");
//! let path = Path::new("tower_b.tko");
//!
//! let lock = FileLock::acquire(path, "estimator@company.com").unwrap();
//! save_project(&project, path).unwrap();
//! drop(lock);
//!
//! let reloaded = load_project(path).unwrap();
//! assert_eq!(reloaded.meta.job_id, "25-014");
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{TakeoffError, TakeoffResult};
use crate::project::{Project, SCHEMA_VERSION};
use crate::takeoff::Package;

/// Project file extension
pub const PROJECT_EXTENSION: &str = "tko";

/// Package exchange file extension
pub const PACKAGE_EXTENSION: &str = "tkp";

/// Locks older than this are taken over
const STALE_LOCK_HOURS: i64 = 24;

fn io_error<'a>(operation: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> TakeoffError + 'a {
    move |e| TakeoffError::file_error(operation, path.display().to_string(), e.to_string())
}

// ============================================================================
// Locking
// ============================================================================

/// Who holds a project, stored in the `.tko.lock` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockInfo {
    /// Estimator identifier (email or username)
    pub user_id: String,
    pub machine: String,
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// Holder as shown in a "file locked" message
    pub fn holder(&self) -> String {
        format!("{} ({})", self.user_id, self.machine)
    }

    /// A lock is stale when its process is gone from this machine or it has
    /// been held longer than a working day.
    pub fn is_stale(&self) -> bool {
        let same_machine = hostname().is_some_and(|m| m == self.machine);
        if same_machine && !process_alive(self.pid) {
            return true;
        }
        Utc::now() - self.locked_at > Duration::hours(STALE_LOCK_HOURS)
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(windows)]
fn process_alive(pid: u32) -> bool {
    use std::process::Command;
    Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output()
        .map(|out| String::from_utf8_lossy(&out.stdout).contains(&pid.to_string()))
        .unwrap_or(true)
}

#[cfg(not(any(unix, windows)))]
fn process_alive(_pid: u32) -> bool {
    true
}

/// Exclusive hold on a project file, released on drop.
///
/// Combines an OS lock (fs2) on the `.tko.lock` file with the [`LockInfo`]
/// written into it, so other estimators can see who has the job open.
pub struct FileLock {
    project_path: PathBuf,
    lock_path: PathBuf,
    /// Keeps the OS lock alive
    _lock_file: File,
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire the lock on `path` for `user_id`.
    ///
    /// Fails with [`TakeoffError::FileLocked`] while someone else holds a
    /// live lock; a stale lock is taken over.
    ///
    /// ```rust,no_run
    /// use takeoff_core::file_io::FileLock;
    /// use std::path::Path;
    ///
    /// let lock = FileLock::acquire(Path::new("tower_b.tko"), "estimator@company.com")?;
    /// drop(lock);
    /// # Ok::<(), takeoff_core::errors::TakeoffError>(())
    /// ```
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> TakeoffResult<Self> {
        let lock_path = lock_path_for(path);

        if let Some(existing) = FileLock::check(path) {
            return Err(TakeoffError::file_locked(
                path.display().to_string(),
                existing.holder(),
                existing.locked_at.to_rfc3339(),
            ));
        }

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(io_error("create lock", &lock_path))?;

        lock_file.try_lock_exclusive().map_err(|_| {
            TakeoffError::file_locked(path.display().to_string(), "another process", "unknown")
        })?;

        let info = LockInfo::new(user_id);
        let json = serde_json::to_string_pretty(&info)?;
        lock_file
            .write_all(json.as_bytes())
            .map_err(io_error("write lock", &lock_path))?;
        lock_file.sync_all().map_err(io_error("sync lock", &lock_path))?;

        info!(path = %path.display(), user = %info.user_id, "Acquired project lock");
        Ok(FileLock {
            project_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Current live lock on `path`, if any.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if !lock_path.exists() {
            return None;
        }
        match read_lock_info(&lock_path) {
            Ok(info) if !info.is_stale() => Some(info),
            Ok(info) => {
                debug!(path = %lock_path.display(), holder = %info.holder(), "Ignoring stale lock");
                None
            }
            Err(e) => {
                warn!(path = %lock_path.display(), error = %e, "Unreadable lock file");
                None
            }
        }
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

/// `job.tko` -> `job.tko.lock`
fn lock_path_for(project_path: &Path) -> PathBuf {
    let extension = project_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    project_path.with_extension(extension)
}

fn read_lock_info(lock_path: &Path) -> TakeoffResult<LockInfo> {
    let contents = fs::read_to_string(lock_path).map_err(io_error("read lock", lock_path))?;
    Ok(serde_json::from_str(&contents)?)
}

// ============================================================================
// Atomic writes
// ============================================================================

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> TakeoffResult<()> {
    let tmp_path = tmp_path_for(path);

    let mut tmp_file = File::create(&tmp_path).map_err(io_error("create temp file", &tmp_path))?;
    tmp_file.write_all(bytes).map_err(io_error("write temp file", &tmp_path))?;
    tmp_file.sync_all().map_err(io_error("sync temp file", &tmp_path))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        TakeoffError::file_error("rename to final", path.display().to_string(), e.to_string())
    })
}

/// `job.tko` -> `job.tko.tmp`
fn tmp_path_for(path: &Path) -> PathBuf {
    let extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    path.with_extension(extension)
}

// ============================================================================
// Projects
// ============================================================================

/// Save a project as pretty JSON with an atomic write.
///
/// ```rust,no_run
/// use takeoff_core::file_io::save_project;
/// use takeoff_core::project::Project;
/// use std::path::Path;
///
/// let project = Project::new("Estimator", "25-014", "Client");
/// save_project(&project, Path::new("tower_b.tko"))?;
/// # Ok::<(), takeoff_core::errors::TakeoffError>(())
/// ```
pub fn save_project(project: &Project, path: &Path) -> TakeoffResult<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), packages = project.package_count(), "Saved project");
    Ok(())
}

/// Load a project and check its schema version.
///
/// # Errors
///
/// * [`TakeoffError::FileError`] - the file could not be read
/// * [`TakeoffError::SerializationError`] - not a project file
/// * [`TakeoffError::VersionMismatch`] - written by an incompatible schema
pub fn load_project(path: &Path) -> TakeoffResult<Project> {
    let contents = fs::read_to_string(path).map_err(io_error("read", path))?;
    let project: Project = serde_json::from_str(&contents).map_err(|e| TakeoffError::SerializationError {
        reason: format!("Invalid project JSON in {}: {}", path.display(), e),
    })?;
    validate_version(&project.meta.version)?;
    debug!(path = %path.display(), packages = project.package_count(), "Loaded project");
    Ok(project)
}

/// Load a project along with the live lock on it, if someone holds one.
/// A locked project is still returned, for read-only use.
pub fn load_project_with_lock_check(path: &Path) -> TakeoffResult<(Project, Option<LockInfo>)> {
    let project = load_project(path)?;
    Ok((project, FileLock::check(path)))
}

/// Major versions must match; within 0.x a newer minor is refused.
pub fn validate_version(file_version: &str) -> TakeoffResult<()> {
    let mismatch = || TakeoffError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let (Some(file), Some(current)) = (parse_version(file_version), parse_version(SCHEMA_VERSION)) else {
        return Err(mismatch());
    };
    if file.0 != current.0 {
        return Err(mismatch());
    }
    if current.0 == 0 && file.1 > current.1 {
        return Err(mismatch());
    }
    Ok(())
}

/// `major.minor[.patch]`
fn parse_version(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    Some((major, minor))
}

// ============================================================================
// Packages
// ============================================================================

/// Write one package as handed over by the host model.
pub fn save_package(package: &Package, path: &Path) -> TakeoffResult<()> {
    let json = serde_json::to_string_pretty(package)?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), runs = package.runs.len(), "Saved package");
    Ok(())
}

/// Read a package file and check its runs.
pub fn load_package(path: &Path) -> TakeoffResult<Package> {
    let contents = fs::read_to_string(path).map_err(io_error("read", path))?;
    let package: Package = serde_json::from_str(&contents).map_err(|e| TakeoffError::SerializationError {
        reason: format!("Invalid package JSON in {}: {}", path.display(), e),
    })?;
    package.validate()?;
    debug!(
        path = %path.display(),
        runs = package.runs.len(),
        wires = package.wires.wire_count(),
        "Loaded package"
    );
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ConduitMaterial, WireSize, WireType};
    use crate::takeoff::{ConduitRun, Wire};
    use crate::units::Feet;
    use std::env::temp_dir;

    fn temp_path(name: &str, extension: &str) -> PathBuf {
        temp_dir().join(format!("takeoff_test_{}_{}.{}", name, std::process::id(), extension))
    }

    #[test]
    fn test_sidecar_paths() {
        let path = Path::new("/jobs/tower_b.tko");
        assert_eq!(lock_path_for(path), Path::new("/jobs/tower_b.tko.lock"));
        assert_eq!(tmp_path_for(path), Path::new("/jobs/tower_b.tko.tmp"));
        assert_eq!(lock_path_for(Path::new("/jobs/raw")), Path::new("/jobs/raw.lock"));
    }

    #[test]
    fn test_fresh_lock_is_not_stale() {
        let info = LockInfo::new("estimator@example.com");
        assert_eq!(info.user_id, "estimator@example.com");
        assert!(!info.is_stale());
    }

    #[test]
    fn test_old_lock_is_stale() {
        let mut info = LockInfo::new("estimator@example.com");
        info.machine = "some-other-machine".to_string();
        info.locked_at = Utc::now() - Duration::hours(STALE_LOCK_HOURS + 1);
        assert!(info.is_stale());
    }

    #[test]
    fn test_project_roundtrip() {
        let path = temp_path("roundtrip", PROJECT_EXTENSION);
        let mut project = Project::new("Test Estimator", "TEST-001", "Test Client");
        project.settings.makeup_length = Feet(8.0);
        project.add_package(Package::new("Level 1"));

        save_project(&project, &path).unwrap();
        assert!(!tmp_path_for(&path).exists());

        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded.meta.estimator, "Test Estimator");
        assert_eq!(loaded.meta.job_id, "TEST-001");
        assert_eq!(loaded.settings.makeup_length, Feet(8.0));
        assert_eq!(loaded.packages[0].name, "Level 1");

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let path = temp_path("garbage", PROJECT_EXTENSION);
        fs::write(&path, "not json").unwrap();
        let err = load_project(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_project(&temp_path("missing", PROJECT_EXTENSION)).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let path = temp_path("lock", PROJECT_EXTENSION);
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "estimator@example.com").unwrap();
        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());
        assert_eq!(FileLock::check(&path).map(|i| i.user_id), Some("estimator@example.com".to_string()));

        // Second acquire sees the live lock
        let err = FileLock::acquire(&path, "someone@example.com").err().unwrap();
        assert!(err.is_recoverable());

        drop(lock);
        assert!(!lock_path.exists());
        assert!(FileLock::check(&path).is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_with_lock_check() {
        let path = temp_path("lock_check", PROJECT_EXTENSION);
        save_project(&Project::new("Test", "TEST", "Client"), &path).unwrap();

        let (loaded, lock_info) = load_project_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.job_id, "TEST");
        assert!(lock_info.is_none());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("banana").is_err());
    }

    #[test]
    fn test_package_roundtrip() {
        let path = temp_path("package", PACKAGE_EXTENSION);
        let mut package = Package::new("Level 2 Power");
        package
            .runs
            .push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(55.0)));
        package
            .wires
            .assign("R-1", Wire::new("LP2-3", WireSize::Awg10, "Red", WireType::Branch));

        save_package(&package, &path).unwrap();
        let loaded = load_package(&path).unwrap();
        assert_eq!(loaded, package);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_package_with_bad_run_is_rejected() {
        let path = temp_path("bad_package", PACKAGE_EXTENSION);
        let mut package = Package::new("Bad");
        package
            .runs
            .push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(-3.0)));
        save_package(&package, &path).unwrap();
        assert_eq!(load_package(&path).unwrap_err().error_code(), "INVALID_INPUT");
        let _ = fs::remove_file(&path);
    }
    #[test]
    fn test_package_with_duplicate_wire_is_rejected() {
        let path = temp_path("dup_wire", PACKAGE_EXTENSION);
        let mut package = Package::new("Hand edited");
        package
            .runs
            .push(ConduitRun::new("R-1", ConduitMaterial::Emt, Feet(1.0 / 12.0), Feet(10.0)));
        package
            .wires
            .assign("R-1", Wire::new("1", WireSize::Awg12, "Black", WireType::Branch));

        let mut json = serde_json::to_value(&package).unwrap();
        let wires = json["wires"]["R-1"]["wires"].as_array_mut().unwrap();
        let copy = wires[0].clone();
        wires.push(copy);
        fs::write(&path, serde_json::to_string_pretty(&json).unwrap()).unwrap();

        let err = load_package(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        let _ = fs::remove_file(&path);
    }
}
