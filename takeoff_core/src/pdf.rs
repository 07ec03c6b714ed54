//! # PDF Generation Module
//!
//! Renders the bill of materials for a package to PDF using Typst.
//!
//! ## Architecture
//!
//! - The page setup is an embedded Typst string
//! - Sections are appended as Typst tables built from the report rows
//! - Only the fonts bundled with `typst-assets` are used
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use takeoff_core::diagnostics::TracingSink;
//! use takeoff_core::file_io::load_project;
//! use takeoff_core::pdf::render_bom_pdf;
//! use takeoff_core::project::EstimateContext;
//! use takeoff_core::totals::build_report;
//! use std::path::Path;
//!
//! let project = load_project(Path::new("tower_b.tko")).unwrap();
//! let ctx = EstimateContext::new(&project, 0).unwrap();
//! let report = build_report(&ctx, &mut TracingSink);
//! let pdf_bytes = render_bom_pdf(&project, &report, None).unwrap();
//! std::fs::write("tower_b_bom.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use tracing::debug;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::errors::{TakeoffError, TakeoffResult};
use crate::load_calc::LoadCalcResult;
use crate::project::Project;
use crate::totals::BomReport;
use crate::units::{FeetInches, LengthFormatter};

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling one in-memory document.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .flat_map(|data| Font::iter(Bytes::new(data)))
            .collect();
        let book = FontBook::from_fonts(&fonts);

        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(book),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Template
// ============================================================================

const PAGE_TEMPLATE: &str = r##"
#set page(
  paper: "us-letter",
  margin: (top: 0.75in, bottom: 0.75in, left: 0.75in, right: 0.75in),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Electrical Takeoff - Bill of Materials]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(font: "DejaVu Sans Mono", size: 9pt)

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 12pt, radius: 4pt)[
    #text(size: 16pt, weight: "bold")[Bill of Materials]
    #v(4pt)
    #text(size: 12pt)[{{PACKAGE}}]
  ]
]

#v(8pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 2pt,
  [Estimator:], [{{ESTIMATOR}}],
  [Job ID:], [{{JOB_ID}}],
  [Client:], [{{CLIENT}}],
  [Date:], [{{DATE}}],
  [Voltage drop:], [{{VOLTAGE_DROP}}],
)
"##;

// ============================================================================
// Rendering
// ============================================================================

/// Render a package BOM, optionally followed by its rack load calculation.
pub fn render_bom_pdf(project: &Project, report: &BomReport, load_calc: Option<&LoadCalcResult>) -> TakeoffResult<Vec<u8>> {
    let source = bom_source(project, report, load_calc);
    let pdf = compile(source)?;
    debug!(package = %report.package, bytes = pdf.len(), "Rendered BOM PDF");
    Ok(pdf)
}

/// Typst source for a BOM report
fn bom_source(project: &Project, report: &BomReport, load_calc: Option<&LoadCalcResult>) -> String {
    let voltage_drop = if !project.settings.voltage_drop_enabled {
        "off".to_string()
    } else {
        format!("on, {} runs upsized", report.upsized_runs.len())
    };

    let mut source = PAGE_TEMPLATE
        .replace("{{JOB_ID}}", &escape_typst(&project.meta.job_id))
        .replace("{{DATE}}", &Utc::now().format("%Y-%m-%d").to_string())
        .replace("{{PACKAGE}}", &escape_typst(&report.package))
        .replace("{{ESTIMATOR}}", &escape_typst(&project.meta.estimator))
        .replace("{{CLIENT}}", &escape_typst(&project.meta.client))
        .replace("{{VOLTAGE_DROP}}", &voltage_drop);

    source.push_str(&section(
        "Conduit",
        &["Material", "Size", "Length"],
        report.conduit.iter().map(|c| {
            vec![c.material.to_string(), c.diameter_label.clone(), FeetInches.format(c.length)]
        }),
    ));

    for (wire_type, rows) in &report.wire {
        source.push_str(&section(
            &format!("Wire - {}", wire_type),
            &["Size", "Color", "Material", "Length"],
            rows.iter().map(|w| {
                vec![
                    w.size.to_string(),
                    w.color.clone(),
                    w.material.display_name().to_string(),
                    FeetInches.format(w.length),
                ]
            }),
        ));
    }

    source.push_str(&section(
        "Connectors",
        &["Material", "Size", "Count"],
        report
            .connectors
            .iter()
            .map(|c| vec![c.material.to_string(), c.diameter_label.clone(), c.count.to_string()]),
    ));

    source.push_str(&section(
        "Couplings",
        &["Material", "Size", "Count"],
        report
            .couplings
            .iter()
            .map(|c| vec![c.material.to_string(), c.diameter_label.clone(), c.count.to_string()]),
    ));

    for (wire_type, rows) in &report.fittings {
        if rows.is_empty() {
            continue;
        }
        source.push_str(&section(
            &format!("Fittings - {}", wire_type),
            &["Type", "Size", "Angle", "Count"],
            rows.iter().map(|f| {
                vec![
                    f.type_name.clone(),
                    f.diameter_label.clone(),
                    format!("{:.0} deg", f.angle),
                    f.count.to_string(),
                ]
            }),
        ));
    }

    if let Some(result) = load_calc {
        source.push_str(&load_calc_section(result));
    }

    if !report.failures.is_empty() {
        source.push_str(&section(
            "Lookup Failures",
            &["Table", "Key", "Run"],
            report.failures.iter().map(|m| {
                vec![
                    m.table.display_name().to_string(),
                    m.key.clone(),
                    m.run_id.clone().unwrap_or_default(),
                ]
            }),
        ));
    }

    source
}

fn load_calc_section(result: &LoadCalcResult) -> String {
    let mut out = format!(
        r##"
#pagebreak()

== Strut Rack Load

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 2pt,
  [Conduit weight:], [{conduit:.0} lb],
  [Wire weight:], [{wire:.0} lb],
  [Rack run length:], [{run_length}],
  [Weight per foot:], [{wpf:.1} plf],
  [Strut length:], [{strut}],
  [Max spacing:], [{max_spacing}],
)
"##,
        conduit = result.total_conduit_weight().0,
        wire = result.total_wire_weight().0,
        run_length = escape_typst(&FeetInches.format(result.run_length)),
        wpf = result.weight_per_foot().0,
        strut = escape_typst(&FeetInches.format(result.strut_length)),
        max_spacing = result
            .max_passing_spacing()
            .map(|s| escape_typst(&FeetInches.format(s)))
            .unwrap_or_else(|| "none".to_string()),
    );

    out.push_str(&section(
        "Spacing Checks",
        &["Spacing", "Required", "Capacity", "Pierced", "Status"],
        result.checks.iter().map(|c| {
            vec![
                FeetInches.format(c.spacing),
                format!("{:.0} lb", c.required_load.0),
                c.capacity
                    .map(|cap| format!("{:.0} lb", cap.max_uniform_load.0))
                    .unwrap_or_else(|| "-".to_string()),
                c.pierced
                    .map(|cap| format!("{:.0} lb", cap.max_uniform_load.0))
                    .unwrap_or_else(|| "-".to_string()),
                if c.passed { "OK" } else { "FAIL" }.to_string(),
            ]
        }),
    ));
    out
}

/// A heading and a table; nothing when there are no rows.
fn section<I>(title: &str, headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let body = table_rows(rows);
    if body.is_empty() {
        return String::new();
    }
    let header_cells = headers
        .iter()
        .map(|h| format!("[*{}*]", escape_typst(h)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "\n== {title}\n\n#table(\n  columns: {columns},\n  inset: 5pt,\n  stroke: 0.5pt,\n  table.header({header_cells}),\n{body}\n)\n",
        title = escape_typst(title),
        columns = headers.len(),
    )
}

/// Rows of escaped content cells, one table row per line
fn table_rows<I>(rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .map(|cells| {
            let cells: Vec<String> = cells.iter().map(|c| format!("[{}]", escape_typst(c))).collect();
            format!("  {},", cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn compile(source: String) -> TakeoffResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    let document = warned.output.map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        TakeoffError::ReportFailed {
            reason: format!("Typst compilation failed: {}", messages.join("; ")),
        }
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        TakeoffError::ReportFailed {
            reason: format!("PDF rendering failed: {}", messages.join("; ")),
        }
    })
}

/// Escape Typst markup characters in user-provided text
fn escape_typst(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '_' | '#' | '$' | '@' | '<' | '>' | '\\' | '`' | '[' | ']' | '=' | '-' | '/' | '"' | '\'' | '~') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
