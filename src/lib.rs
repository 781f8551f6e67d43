pub mod config;
pub mod error;
pub mod pdf;
pub mod report;
pub mod view;

pub use config::{Config, DEFAULT_API_BASE};
pub use error::{Result, SettlementError};
pub use pdf::{DocumentExporter, SettlementDocument, TypstExporter};
pub use report::{reconcile, Balance, HttpReportService, Invoice, Query, Reconciliation, Report, ReportService};
pub use view::{Phase, ReportViewModel};
