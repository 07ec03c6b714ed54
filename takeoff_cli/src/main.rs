//! # Takeoff CLI
//!
//! Command-line front end over `takeoff_core`. Every command reads a `.tko`
//! project file; results are printed as JSON on stdout, logs go to stderr.
//!
//! Log level follows `RUST_LOG`; `--verbose` turns on debug output for the
//! engine when `RUST_LOG` is not set.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use takeoff_core::diagnostics::TracingSink;
use takeoff_core::errors::{TakeoffError, TakeoffResult};
use takeoff_core::file_io::{load_package, load_project, load_project_with_lock_check, save_project, write_atomic, FileLock};
use takeoff_core::load_calc::{calculate_with_settings, LoadCalcResult};
use takeoff_core::p3_box;
use takeoff_core::pdf::render_bom_pdf;
use takeoff_core::project::{EstimateContext, EstimateSettings, Project};
use takeoff_core::totals::build_report;
use takeoff_core::units::{Feet, FeetInches, LengthFormatter};
use takeoff_core::voltage_drop::{import_rules, parse_rule_rows, upsize_wires};

#[derive(Parser)]
#[command(name = "takeoff")]
#[command(about = "Takeoff CLI - electrical BOM totals, voltage drop upsizing and strut checks", long_about = None)]
struct Cli {
    /// Debug logging for the engine (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new project file
    New {
        /// Path of the .tko file to create
        project_path: PathBuf,
        #[arg(long)]
        estimator: String,
        #[arg(long)]
        job_id: String,
        #[arg(long, default_value = "")]
        client: String,
        /// Package files (.tkp) to add
        #[arg(long = "package")]
        packages: Vec<PathBuf>,
    },
    /// Add a package file exported by the host model
    AddPackage {
        project_path: PathBuf,
        package_path: PathBuf,
    },
    /// Print BOM totals for a package
    Totals {
        project_path: PathBuf,
        #[command(flatten)]
        target: Target,
    },
    /// Apply voltage drop rules and print the upsized wires
    Upsize {
        project_path: PathBuf,
        #[command(flatten)]
        target: Target,
        /// Store the upsized wires back into the project
        #[arg(long)]
        write: bool,
    },
    /// Check the strut rack carrying a package's runs
    LoadCalc {
        project_path: PathBuf,
        #[command(flatten)]
        target: Target,
    },
    /// Classify a P3 junction box
    P3 {
        /// Number of conduits landing on the box
        connections: usize,
        /// At least two of them are in line
        #[arg(long)]
        parallel: bool,
    },
    /// Import voltage drop rules from a comma or tab separated file
    ImportRules {
        project_path: PathBuf,
        /// Rows of min, max, size, voltage
        rules_path: PathBuf,
        #[arg(long, default_value_t = 0)]
        package: usize,
        /// Replace the package's rules instead of appending
        #[arg(long)]
        replace: bool,
    },
    /// Render the BOM for a package to PDF
    Report {
        project_path: PathBuf,
        #[command(flatten)]
        target: Target,
        /// Output PDF path
        #[arg(short, long)]
        output: PathBuf,
        /// Append the strut rack load check
        #[arg(long)]
        load_calc: bool,
    },
}

/// Package selection and per-invocation setting overrides.
#[derive(Args)]
struct Target {
    /// Package index
    #[arg(long, default_value_t = 0)]
    package: usize,

    /// Makeup length (e.g. `6`, `6'`, `4' - 6"`)
    #[arg(long)]
    makeup: Option<String>,

    /// Run the voltage drop upsizing pass before totaling
    #[arg(long)]
    voltage_drop: bool,

    /// Rack run length for the load calculation
    #[arg(long)]
    rack_length: Option<String>,

    /// Standard strut length for the load calculation
    #[arg(long)]
    strut_length: Option<String>,

    /// Pierced-hole capacity factor
    #[arg(long)]
    pierced_factor: Option<f64>,
}

impl Target {
    /// Project settings with this invocation's overrides applied.
    fn settings(&self, base: &EstimateSettings) -> TakeoffResult<EstimateSettings> {
        let mut settings = base.clone();
        if let Some(makeup) = &self.makeup {
            settings.makeup_length = parse_length("makeup", makeup)?;
        }
        if self.voltage_drop {
            settings.voltage_drop_enabled = true;
        }
        if let Some(rack) = &self.rack_length {
            settings.rack_run_length = parse_length("rack-length", rack)?;
        }
        if let Some(strut) = &self.strut_length {
            settings.strut_length = parse_length("strut-length", strut)?;
        }
        if let Some(factor) = self.pierced_factor {
            settings.pierced_hole_factor = factor;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Load the project with overrides applied in memory.
    fn load(&self, path: &Path) -> TakeoffResult<Project> {
        let mut project = load_project(path)?;
        project.settings = self.settings(&project.settings)?;
        Ok(project)
    }
}

fn parse_length(field: &str, text: &str) -> TakeoffResult<Feet> {
    FeetInches
        .parse(text)
        .ok_or_else(|| TakeoffError::invalid_input(field, text, "Expected feet, e.g. 10, 10' or 10' - 6\""))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.error_code(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "takeoff_core=debug,takeoff_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> TakeoffResult<()> {
    match command {
        Commands::New {
            project_path,
            estimator,
            job_id,
            client,
            packages,
        } => cmd_new(&project_path, estimator, job_id, client, &packages),
        Commands::AddPackage {
            project_path,
            package_path,
        } => cmd_add_package(&project_path, &package_path),
        Commands::Totals { project_path, target } => cmd_totals(&project_path, &target),
        Commands::Upsize {
            project_path,
            target,
            write,
        } => cmd_upsize(&project_path, &target, write),
        Commands::LoadCalc { project_path, target } => cmd_load_calc(&project_path, &target),
        Commands::P3 { connections, parallel } => cmd_p3(connections, parallel),
        Commands::ImportRules {
            project_path,
            rules_path,
            package,
            replace,
        } => cmd_import_rules(&project_path, &rules_path, package, replace),
        Commands::Report {
            project_path,
            target,
            output,
            load_calc,
        } => cmd_report(&project_path, &target, &output, load_calc),
    }
}

fn cmd_new(path: &Path, estimator: String, job_id: String, client: String, packages: &[PathBuf]) -> TakeoffResult<()> {
    if path.exists() {
        return Err(TakeoffError::file_error(
            "create",
            path.display().to_string(),
            "File already exists",
        ));
    }
    let mut project = Project::new(estimator, job_id, client);
    for package_path in packages {
        project.add_package(load_package(package_path)?);
    }
    save_project(&project, path)?;
    info!(path = %path.display(), packages = project.package_count(), "Created project");
    print_json(&project.meta)
}

fn cmd_add_package(path: &Path, package_path: &Path) -> TakeoffResult<()> {
    let _lock = FileLock::acquire(path, current_user())?;
    let mut project = load_project(path)?;
    let package = load_package(package_path)?;
    let name = package.name.clone();
    let index = project.add_package(package);
    save_project(&project, path)?;
    info!(package = %name, index, "Added package");
    print_json(&serde_json::json!({ "index": index, "name": name }))
}

fn cmd_totals(path: &Path, target: &Target) -> TakeoffResult<()> {
    let project = target.load(path)?;
    let ctx = EstimateContext::new(&project, target.package)?;
    let report = build_report(&ctx, &mut TracingSink);
    print_json(&report)
}

fn cmd_upsize(path: &Path, target: &Target, write: bool) -> TakeoffResult<()> {
    // Hold the lock across load and save when writing back
    let _lock = if write {
        Some(FileLock::acquire(path, current_user())?)
    } else {
        None
    };

    let mut project = target.load(path)?;
    let makeup = project.settings.makeup_length;
    let ctx = EstimateContext::new(&project, target.package)?;
    let package = ctx.package();
    let outcome = upsize_wires(
        &package.runs,
        &package.wires,
        &package.rules,
        package,
        makeup,
        &mut TracingSink,
    );
    print_json(&outcome)?;

    if write && !outcome.changed_runs.is_empty() {
        // Overrides were applied in memory only; keep the stored settings
        let stored = load_project(path)?.settings;
        project.package_mut(target.package)?.wires = outcome.wires;
        project.settings = stored;
        save_project(&project, path)?;
        info!(changed = outcome.changed_runs.len(), "Stored upsized wires");
    }
    Ok(())
}

fn cmd_load_calc(path: &Path, target: &Target) -> TakeoffResult<()> {
    let project = target.load(path)?;
    let result = load_calc(&project, target.package)?;
    print_json(&LoadCalcSummary::from(&result))
}

fn load_calc(project: &Project, package: usize) -> TakeoffResult<LoadCalcResult> {
    let ctx = EstimateContext::new(project, package)?;
    let package = ctx.package();
    calculate_with_settings(&package.runs, &package.wires, ctx.settings(), &mut TracingSink)
}

/// Load calculation result with its derived totals spelled out.
#[derive(Serialize)]
struct LoadCalcSummary<'a> {
    total_length: f64,
    total_conduit_weight: f64,
    total_wire_weight: f64,
    total_weight: f64,
    weight_per_foot: f64,
    max_passing_spacing: Option<f64>,
    #[serde(flatten)]
    result: &'a LoadCalcResult,
}

impl<'a> From<&'a LoadCalcResult> for LoadCalcSummary<'a> {
    fn from(result: &'a LoadCalcResult) -> Self {
        LoadCalcSummary {
            total_length: result.total_length().0,
            total_conduit_weight: result.total_conduit_weight().0,
            total_wire_weight: result.total_wire_weight().0,
            total_weight: result.total_weight().0,
            weight_per_foot: result.weight_per_foot().0,
            max_passing_spacing: result.max_passing_spacing().map(|s| s.0),
            result,
        }
    }
}

fn cmd_p3(connections: usize, parallel: bool) -> TakeoffResult<()> {
    let (config, bracket) = p3_box::resolve(connections, parallel);
    print_json(&serde_json::json!({
        "config": config,
        "description": config.description(),
        "bracket": bracket,
    }))
}

fn cmd_import_rules(path: &Path, rules_path: &Path, package: usize, replace: bool) -> TakeoffResult<()> {
    let text = fs::read_to_string(rules_path)
        .map_err(|e| TakeoffError::file_error("read", rules_path.display().to_string(), e.to_string()))?;
    let import = import_rules(&parse_rule_rows(&text), &mut TracingSink);

    let _lock = FileLock::acquire(path, current_user())?;
    let mut project = load_project(path)?;
    let target = project.package_mut(package)?;
    if replace {
        target.rules.clear();
    }
    target.rules.extend(import.rules.iter().cloned());
    save_project(&project, path)?;

    info!(
        imported = import.rules.len(),
        failed = import.failed_rows.len(),
        "Imported voltage drop rules"
    );
    print_json(&import)
}

fn cmd_report(path: &Path, target: &Target, output: &Path, with_load_calc: bool) -> TakeoffResult<()> {
    let (mut project, lock) = load_project_with_lock_check(path)?;
    if let Some(lock) = lock {
        info!(holder = %lock.holder(), "Project is open elsewhere; reporting from the saved copy");
    }
    project.settings = target.settings(&project.settings)?;

    let ctx = EstimateContext::new(&project, target.package)?;
    let report = build_report(&ctx, &mut TracingSink);
    let load = if with_load_calc {
        Some(load_calc(&project, target.package)?)
    } else {
        None
    };

    let pdf = render_bom_pdf(&project, &report, load.as_ref())?;
    write_atomic(output, &pdf)?;
    info!(path = %output.display(), bytes = pdf.len(), "Wrote BOM report");
    Ok(())
}

fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> TakeoffResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
