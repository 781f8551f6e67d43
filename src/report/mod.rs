mod model;
mod reconcile;
mod service;

pub use model::{format_amount, Invoice, InvoiceId, Query, Report};
pub use reconcile::{reconcile, Balance, Reconciliation};
pub use service::{error_message_from_body, HttpReportService, ReportService};
