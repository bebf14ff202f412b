// Entity Models
//
// Unit: a billable residential unit, identified by its number
// Charge: one unit's obligation for one (month, year) billing period

pub mod unit;
pub mod charge;

pub use unit::Unit;
pub use charge::{
    Charge, GeneratedCharge, NewCharge, PaymentReceipt, PaymentStatus, PendingCharge, Period,
    DATE_FORMAT, DEFAULT_BASE_AMOUNT,
};
