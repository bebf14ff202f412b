// Ledger errors
//
// Every failure is request-scoped. Storage faults are the only kind that is
// not the caller's fault.

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Unit {0} already exists")]
    DuplicateUnit(String),

    #[error("No units registered")]
    NoUnitsRegistered,

    #[error("Unit {0} not found")]
    UnitNotFound(String),

    #[error("No charge for unit {unit_number} in {month:02}/{year}")]
    ChargeNotFound {
        unit_number: String,
        month: u32,
        year: i32,
    },

    #[error("Charge for unit {unit_number} in {month:02}/{year} is already paid")]
    DuplicatePayment {
        unit_number: String,
        month: u32,
        year: i32,
    },

    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid billing period {month}/{year}")]
    InvalidPeriod { month: u32, year: i32 },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error("Storage is unavailable")]
    StoreUnavailable,
}

impl LedgerError {
    /// Stable machine-readable name of the error
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::DuplicateUnit(_) => "DuplicateUnit",
            LedgerError::NoUnitsRegistered => "NoUnitsRegistered",
            LedgerError::UnitNotFound(_) => "UnitNotFound",
            LedgerError::ChargeNotFound { .. } => "ChargeNotFound",
            LedgerError::DuplicatePayment { .. } => "DuplicatePayment",
            LedgerError::InvalidDate(_) => "InvalidDate",
            LedgerError::InvalidPeriod { .. } => "InvalidPeriod",
            LedgerError::Storage(_) => "Storage",
            LedgerError::StoreUnavailable => "StoreUnavailable",
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            LedgerError::Storage(_) | LedgerError::StoreUnavailable
        )
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
