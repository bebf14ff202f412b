// 🏢 Unit Registry - the set of billable units
//
// Units are only ever created here. There is no update or delete.

use tracing::info;

use crate::db::LedgerStore;
use crate::entities::Unit;
use crate::error::{LedgerError, LedgerResult};

/// Register a new unit. Fails with `DuplicateUnit` if the number is taken.
pub fn register_unit<S: LedgerStore + ?Sized>(store: &mut S, number: &str) -> LedgerResult<Unit> {
    if store.find_unit_by_number(number)?.is_some() {
        return Err(LedgerError::DuplicateUnit(number.to_string()));
    }

    // insert_unit maps a racing UNIQUE violation to DuplicateUnit as well
    let unit = store.insert_unit(number)?;
    info!(unit = %unit.number, id = unit.id, "unit registered");

    Ok(unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;

    #[test]
    fn test_register_unit() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let unit = register_unit(&mut store, "1305").unwrap();
        assert_eq!(unit.number, "1305");

        let found = store.find_unit_by_number("1305").unwrap().unwrap();
        assert_eq!(found, unit);
    }

    #[test]
    fn test_register_same_number_twice() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        register_unit(&mut store, "1305").unwrap();
        let err = register_unit(&mut store, "1305").unwrap_err();

        assert!(matches!(err, LedgerError::DuplicateUnit(ref n) if n == "1305"));

        let units = store.list_units().unwrap();
        assert_eq!(units.len(), 1, "exactly one unit with that number");
    }

    #[test]
    fn test_registry_order_follows_registration() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        for number in ["B-2", "A-1", "C-3"] {
            register_unit(&mut store, number).unwrap();
        }

        let numbers: Vec<String> = store
            .list_units()
            .unwrap()
            .into_iter()
            .map(|u| u.number)
            .collect();
        assert_eq!(numbers, vec!["B-2", "A-1", "C-3"]);
    }
}
