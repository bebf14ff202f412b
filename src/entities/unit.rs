// 🏢 Unit Entity - a billable residential unit
//
// The database id is the identity, the unit number is what people type.
// Numbers are unique across the registry and never change once registered.

use serde::{Deserialize, Serialize};

/// Billable residential unit (apartment, office, storage room...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// System-assigned identity
    pub id: i64,

    /// User-supplied unit number, e.g. "1305"
    pub number: String,
}

impl Unit {
    pub fn new(id: i64, number: impl Into<String>) -> Self {
        Unit {
            id,
            number: number.into(),
        }
    }
}
