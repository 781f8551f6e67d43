//! View state for the settlement report screen.
//!
//! The model owns the query inputs, the last loaded report and the error
//! message shown to the user. Every submit takes a new ticket; only the
//! completion carrying the latest ticket is applied, so a slow response to
//! an earlier submit can never overwrite a newer one.

use std::path::PathBuf;

use crate::error::{Result, SettlementError};
use crate::pdf::{DocumentExporter, DocumentRow, SettlementDocument};
use crate::report::{reconcile, Query, Reconciliation, Report, ReportService};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Handle for one outstanding fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Header figures shown above the invoice table
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub user: String,
    pub directory: String,
    pub invoice_count: u64,
    pub total_amount: f64,
    pub reconciliation: Reconciliation,
}

#[derive(Debug)]
pub struct ReportViewModel {
    query: Query,
    report: Option<Report>,
    error: Option<String>,
    phase: Phase,
    generation: u64,
    currency_symbol: String,
}

impl ReportViewModel {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            query: Query::default(),
            report: None,
            error: None,
            phase: Phase::Idle,
            generation: 0,
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    /// The advance can change after the report is loaded; the reconciliation follows it.
    pub fn set_advance(&mut self, advance: Option<f64>) {
        self.query.advance = advance;
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Validate the query and enter `Loading`.
    ///
    /// An incomplete query records the validation message and leaves the
    /// current report and phase untouched.
    pub fn begin_submit(&mut self) -> Result<Ticket> {
        if !self.query.is_complete() {
            let err = SettlementError::MissingQueryFields;
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.generation += 1;
        self.phase = Phase::Loading;
        self.error = None;
        self.report = None;
        tracing::debug!(generation = self.generation, "submit started");
        Ok(Ticket(self.generation))
    }

    /// Apply the outcome of a fetch. Returns false when the ticket was
    /// superseded by a later submit and the outcome was discarded.
    pub fn complete(&mut self, ticket: Ticket, outcome: std::result::Result<Report, String>) -> bool {
        if ticket.0 != self.generation {
            tracing::debug!(
                stale = ticket.0,
                current = self.generation,
                "discarding superseded report response"
            );
            return false;
        }

        match outcome {
            Ok(report) => {
                self.report = Some(report);
                self.error = None;
                self.phase = Phase::Loaded;
            }
            Err(message) => {
                self.report = None;
                self.error = Some(message);
                self.phase = Phase::Failed;
            }
        }
        true
    }

    /// Validate, fetch and store the report in one step
    pub fn submit<S: ReportService + ?Sized>(&mut self, service: &S) -> Result<()> {
        let ticket = self.begin_submit()?;
        let user = self.query.user_id.trim().to_string();
        let directory = self.query.directory_id.trim().to_string();

        match service.fetch_report(&user, &directory) {
            Ok(report) => {
                self.complete(ticket, Ok(report));
                Ok(())
            }
            Err(err) => {
                self.complete(ticket, Err(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn reconciliation(&self) -> Option<Reconciliation> {
        self.report
            .as_ref()
            .map(|report| reconcile(self.query.advance, Some(report.total_amount)))
    }

    pub fn summary(&self) -> Option<Summary> {
        let report = self.report.as_ref()?;
        let reconciliation = self.reconciliation()?;
        Some(Summary {
            user: report.user_id.clone(),
            directory: report.directory_id.clone(),
            invoice_count: report.invoice_count,
            total_amount: report.total_amount,
            reconciliation,
        })
    }

    /// One row per invoice of the loaded report, amounts with two decimals
    pub fn rows(&self) -> Vec<DocumentRow> {
        self.report
            .iter()
            .flat_map(|report| report.invoices.iter())
            .map(DocumentRow::from)
            .collect()
    }

    pub fn document(&self) -> Option<SettlementDocument> {
        self.report
            .as_ref()
            .map(|report| SettlementDocument::build(report, self.query.advance, &self.currency_symbol))
    }

    /// Hand the loaded report to the exporter. Does nothing without a report.
    pub fn export<E: DocumentExporter + ?Sized>(&self, exporter: &E) -> Result<Option<PathBuf>> {
        let Some(document) = self.document() else {
            tracing::debug!("export requested without a loaded report");
            return Ok(None);
        };
        exporter.export(&document).map(Some)
    }
}
