use std::path::PathBuf;
use std::process::Command;

use crate::error::{Result, SettlementError};
use crate::pdf::{DocumentExporter, SettlementDocument};

/// Embedded Typst template for the settlement report.
/// Uses a placeholder that gets replaced with the actual JSON file path
const SETTLEMENT_TEMPLATE: &str = r##"// Settlement Report Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  margin: (top: 2cm, bottom: 2cm, left: 1.5cm, right: 1.5cm),
)

#set text(font: "Helvetica", size: 10pt)

#grid(
  columns: (1fr, auto),
  align: (left, right),
  [#text(size: 18pt, weight: "bold")[#data.title]],
  [#text(size: 10pt, fill: gray)[Generated #data.generated_date]],
)

#v(1em)

// Summary fields
#table(
  columns: (auto, auto),
  stroke: none,
  align: (left, left),
  inset: 3pt,
  [*User:*], [#data.user],
  [*Directory:*], [#data.directory],
  [*Advance:*], [#data.currency_symbol#data.advance],
  [*Invoice total:*], [#data.currency_symbol#data.total],
  [*#data.reconciliation_label:*], [*#data.currency_symbol#data.reconciliation_amount*],
)

#v(1em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(1em)

// Invoice table
#table(
  columns: (1fr, auto, auto),
  align: (left, right, left),
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else if y > 0 { (bottom: 0.5pt + gray) },
  inset: 8pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },

  // Header
  [*ID*], [*Amount*], [*Date*],

  // Rows
  ..data.rows.map(row => (
    row.id,
    row.amount,
    row.date,
  )).flatten()
)
"##;

/// Per-run scratch directory for the template and its data, removed on drop
fn scratch_dir() -> Result<tempfile::TempDir> {
    Ok(tempfile::Builder::new().prefix("settlement-").tempdir()?)
}

/// Renders settlement documents with the Typst CLI
pub struct TypstExporter {
    output_dir: PathBuf,
    output_path: Option<PathBuf>,
}

impl TypstExporter {
    /// Documents land in `output_dir` as `reporte-<directory>.pdf` unless
    /// `output_path` names an explicit file.
    pub fn new(output_dir: PathBuf, output_path: Option<PathBuf>) -> Self {
        Self {
            output_dir,
            output_path,
        }
    }

    pub fn target_path(&self, document: &SettlementDocument) -> PathBuf {
        match &self.output_path {
            Some(path) => path.clone(),
            None => self.output_dir.join(document.file_name()),
        }
    }
}

impl DocumentExporter for TypstExporter {
    fn export(&self, document: &SettlementDocument) -> Result<PathBuf> {
        // Check if typst is available
        if Command::new("typst").arg("--version").output().is_err() {
            return Err(SettlementError::TypstNotFound);
        }

        let pdf_path = self.target_path(document);
        if let Some(parent) = pdf_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let scratch = scratch_dir()?;
        let temp_dir = scratch.path();

        let json_data = serde_json::to_string(document)
            .map_err(|e| SettlementError::PdfGeneration(e.to_string()))?;

        let json_path = temp_dir.join("settlement_data.json");
        std::fs::write(&json_path, &json_data)?;

        let template_content = SETTLEMENT_TEMPLATE.replace("DATA_JSON_PATH", "settlement_data.json");
        let template_path = temp_dir.join("settlement.typ");
        std::fs::write(&template_path, &template_content)?;

        tracing::debug!(template = %template_path.display(), output = %pdf_path.display(), "running typst");

        // Run typst compile with root set to temp directory
        let output = Command::new("typst")
            .arg("compile")
            .arg("--root")
            .arg(temp_dir)
            .arg(&template_path)
            .arg(&pdf_path)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SettlementError::PdfGeneration(stderr.to_string()));
        }

        tracing::info!(path = %pdf_path.display(), rows = document.rows.len(), "exported settlement PDF");
        Ok(pdf_path)
    }
}
