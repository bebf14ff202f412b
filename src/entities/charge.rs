// 🧾 Charge Entity - one unit's obligation for one billing period
//
// A charge is created unpaid by generation and flips to paid exactly once.
// paid_date is present if and only if paid is true.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Flat amount charged to every unit when the caller does not supply one
pub const DEFAULT_BASE_AMOUNT: f64 = 50000.0;

/// Wire format for payment dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// BILLING PERIOD
// ============================================================================

/// Billing period (month/year). Month is not range-checked on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub month: u32,
    pub year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Self {
        Period { month, year }
    }

    /// First calendar day of the period.
    ///
    /// A charge counts as paid on time only when paid on or before this date.
    pub fn due_reference(&self) -> LedgerResult<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or(LedgerError::InvalidPeriod {
            month: self.month,
            year: self.year,
        })
    }

    /// True when this period falls on or before `cutoff`
    pub fn is_on_or_before(&self, cutoff: Period) -> bool {
        self.year < cutoff.year || (self.year == cutoff.year && self.month <= cutoff.month)
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

// ============================================================================
// CHARGE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    pub id: i64,
    pub unit_id: i64,
    pub period: Period,
    pub amount: f64,
    pub paid: bool,
    pub paid_date: Option<NaiveDate>,
}

/// Insert payload for a charge that does not exist yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewCharge {
    pub unit_id: i64,
    pub period: Period,
    pub amount: f64,
}

/// Row returned by charge generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCharge {
    pub unit_number: String,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

/// Row returned by the pending listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCharge {
    pub unit_number: String,
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

// ============================================================================
// PAYMENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Paid on or before the due reference
    OnTime,

    /// Paid after the due reference
    Late,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::OnTime => "on_time",
            PaymentStatus::Late => "late",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PaymentStatus::OnTime => "Payment recorded on time",
            PaymentStatus::Late => "Payment recorded after the due date",
        }
    }
}

/// Result of marking a charge as paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub unit_number: String,
    pub month: u32,
    pub year: i32,
    /// Formatted as YYYY-MM-DD
    pub paid_date: String,
    pub status: PaymentStatus,
    pub message: String,
}
