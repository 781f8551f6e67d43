use std::time::Duration;
use ureq::Agent;

use crate::error::{Result, SettlementError, GENERIC_FETCH_MESSAGE};
use crate::report::Report;

/// Source of settlement reports, keyed by user and directory
pub trait ReportService {
    fn fetch_report(&self, user_id: &str, directory_id: &str) -> Result<Report>;
}

/// Blocking HTTP client for `GET {base_url}/report`
pub struct HttpReportService {
    agent: Agent,
    base_url: String,
}

impl HttpReportService {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // Non-2xx responses come back as Ok so their body can be read.
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn report_url(&self) -> String {
        format!("{}/report", self.base_url)
    }
}

impl ReportService for HttpReportService {
    fn fetch_report(&self, user_id: &str, directory_id: &str) -> Result<Report> {
        let url = self.report_url();
        tracing::info!(%url, user = user_id, directory = directory_id, "fetching report");

        let mut response = self
            .agent
            .get(&url)
            .query("username", user_id)
            .query("directorio", directory_id)
            .call()
            .map_err(|e| {
                tracing::warn!(error = %e, "report request failed");
                SettlementError::Fetch(GENERIC_FETCH_MESSAGE.to_string())
            })?;

        let status = response.status();
        let body = response.body_mut().read_to_string().map_err(|e| {
            tracing::warn!(error = %e, %status, "could not read report response body");
            SettlementError::Fetch(GENERIC_FETCH_MESSAGE.to_string())
        })?;

        if !status.is_success() {
            tracing::debug!(%status, "report service returned an error");
            return Err(SettlementError::Fetch(error_message_from_body(&body)));
        }

        let report: Report = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "report response is not a valid report");
            SettlementError::Fetch(GENERIC_FETCH_MESSAGE.to_string())
        })?;

        tracing::debug!(
            invoices = report.invoices.len(),
            total = report.total_amount,
            "report received"
        );
        Ok(report)
    }
}

/// Turn an error response body into the message shown to the user.
/// JSON strings are unquoted, other non-empty bodies are shown as-is.
pub fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_FETCH_MESSAGE.to_string();
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Ok(serde_json::Value::String(_)) | Ok(serde_json::Value::Null) => {
            GENERIC_FETCH_MESSAGE.to_string()
        }
        _ => trimmed.to_string(),
    }
}
