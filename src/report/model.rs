use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoice identifier as the backend sends it: any JSON number or a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum InvoiceId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral floats print without a trailing ".0"
            InvoiceId::Number(n) if n.is_f64() => match n.as_f64() {
                Some(v) => write!(f, "{v}"),
                None => write!(f, "{n}"),
            },
            InvoiceId::Number(n) => write!(f, "{n}"),
            InvoiceId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A single invoice included in a settlement report
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Invoice {
    pub id: InvoiceId,
    #[serde(rename = "montoTotal")]
    pub amount: f64,
    #[serde(rename = "fechaTransaccion")]
    pub transaction_date: String,
}

/// Report returned by `GET {api}/report`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    #[serde(rename = "username")]
    pub user_id: String,
    #[serde(rename = "directorio")]
    pub directory_id: String,
    #[serde(rename = "numero_facturas")]
    pub invoice_count: u64,
    #[serde(rename = "monto_total_calculado")]
    pub total_amount: f64,
    #[serde(rename = "facturas", default)]
    pub invoices: Vec<Invoice>,
}

/// What the user typed before submitting
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub user_id: String,
    pub directory_id: String,
    pub advance: Option<f64>,
}

impl Query {
    pub fn new(user_id: impl Into<String>, directory_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            directory_id: directory_id.into(),
            advance: None,
        }
    }

    pub fn with_advance(mut self, advance: Option<f64>) -> Self {
        self.advance = advance;
        self
    }

    /// Both identifiers must be non-blank before a fetch is issued
    pub fn is_complete(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.directory_id.trim().is_empty()
    }

    pub fn advance_or_zero(&self) -> f64 {
        self.advance.unwrap_or(0.0)
    }
}

/// Format an amount with exactly two decimals.
///
/// Values lying exactly halfway between two cents round away from zero;
/// everything else rounds to the nearest cent of its exact binary value.
pub fn format_amount(value: f64) -> String {
    // -0.0 would otherwise print as "-0.00"
    let value = if value == 0.0 { 0.0 } else { value };
    if !is_half_cent_tie(value) {
        return format!("{:.2}", value);
    }

    // A tie is k/200 with k odd, so abs * 100 is exactly representable
    let cents = (value.abs() * 100.0).ceil();
    let whole = (cents / 100.0).trunc();
    let frac = cents - whole * 100.0;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{whole:.0}.{frac:02.0}")
}

/// True when the exact decimal expansion of `value` ends in a 5 at the third decimal
fn is_half_cent_tie(value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let exact = format!("{:.60}", value.abs());
    let Some((_, frac)) = exact.split_once('.') else {
        return false;
    };
    let digits = frac.as_bytes();
    digits.get(2) == Some(&b'5') && digits[3..].iter().all(|d| *d == b'0')
}
