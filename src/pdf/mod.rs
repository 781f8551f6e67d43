mod typst;

pub use self::typst::TypstExporter;

use serde::Serialize;
use std::path::PathBuf;

use crate::error::Result;
use crate::report::{format_amount, reconcile, Invoice, Report};

pub const DOCUMENT_TITLE: &str = "Settlement Report";

/// A single row of the invoice table in the exported document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRow {
    pub id: String,
    pub amount: String,
    pub date: String,
}

impl From<&Invoice> for DocumentRow {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id.to_string(),
            amount: format_amount(invoice.amount),
            date: invoice.transaction_date.clone(),
        }
    }
}

/// Complete data for rendering the settlement PDF
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettlementDocument {
    pub title: String,
    pub user: String,
    pub directory: String,
    pub advance: String,
    pub total: String,
    pub reconciliation_label: String,
    pub reconciliation_amount: String,
    pub currency_symbol: String,
    pub rows: Vec<DocumentRow>,
    pub generated_date: String,
}

impl SettlementDocument {
    /// Lay out a loaded report against the advance the user entered
    pub fn build(report: &Report, advance: Option<f64>, currency_symbol: &str) -> Self {
        let reconciliation = reconcile(advance, Some(report.total_amount));

        let rows = report.invoices.iter().map(DocumentRow::from).collect();

        Self {
            title: DOCUMENT_TITLE.to_string(),
            user: report.user_id.clone(),
            directory: report.directory_id.clone(),
            advance: format_amount(reconciliation.advance),
            total: format_amount(report.total_amount),
            reconciliation_label: reconciliation.balance.label().to_string(),
            reconciliation_amount: format_amount(reconciliation.display_amount()),
            currency_symbol: currency_symbol.to_string(),
            rows,
            generated_date: chrono::Local::now().format("%B %d, %Y").to_string(),
        }
    }

    /// `reporte-<directorio>.pdf`
    pub fn file_name(&self) -> String {
        document_file_name(&self.directory)
    }
}

/// Path separators in the directory name are replaced so the file stays in its folder
pub fn document_file_name(directory_id: &str) -> String {
    let safe: String = directory_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("reporte-{}.pdf", safe)
}

/// Renders a settlement document to a file
pub trait DocumentExporter {
    /// Write the document and return the path it was written to
    fn export(&self, document: &SettlementDocument) -> Result<PathBuf>;
}
