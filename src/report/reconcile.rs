use serde::Serialize;
use std::fmt;

/// Which side owes money once the advance is set against the invoiced total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Balance {
    /// Advance exceeds the invoices: the difference goes back to the payer
    OwedToPayer,
    /// Invoices exceed the advance: the payer still owes the difference
    OwedByPayer,
    Balanced,
}

impl Balance {
    pub fn label(&self) -> &'static str {
        match self {
            Balance::OwedToPayer => "Difference to pay",
            Balance::OwedByPayer => "Difference to collect",
            Balance::Balanced => "Difference",
        }
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Signed difference between the advance and the invoiced total
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reconciliation {
    pub advance: f64,
    pub total_amount: f64,
    pub difference: f64,
    pub balance: Balance,
}

impl Reconciliation {
    /// Amount shown next to the label; the sign is carried by the label
    pub fn display_amount(&self) -> f64 {
        self.difference.abs()
    }
}

/// `advance - total_amount`. Absent inputs count as zero.
pub fn reconcile(advance: Option<f64>, total_amount: Option<f64>) -> Reconciliation {
    let advance = advance.unwrap_or(0.0);
    let total_amount = total_amount.unwrap_or(0.0);
    let difference = advance - total_amount;

    let balance = if difference > 0.0 {
        Balance::OwedToPayer
    } else if difference < 0.0 {
        Balance::OwedByPayer
    } else {
        Balance::Balanced
    };

    Reconciliation {
        advance,
        total_amount,
        difference,
        balance,
    }
}
