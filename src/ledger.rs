// 🧾 Charge Ledger - generation, payment marking and pending listing
//
// Generation is idempotent per (unit, month, year): re-running it for a
// period only creates charges for units that were registered since.
//
// Timeliness rule:
//   paid_date <= first day of the charge's own month  => on time
//   anything later                                    => late
// Paying any day after the 1st of the billing month is therefore late.
// This is the established business rule and is kept as-is.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::db::LedgerStore;
use crate::entities::{
    GeneratedCharge, NewCharge, PaymentReceipt, PaymentStatus, PendingCharge, Period,
    DATE_FORMAT, DEFAULT_BASE_AMOUNT,
};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// GENERATION
// ============================================================================

/// Create one unpaid charge per registered unit for `period`.
///
/// Units that already have a charge for the period are skipped silently and
/// left out of the result. `base_amount` defaults to [`DEFAULT_BASE_AMOUNT`].
pub fn generate_charges<S: LedgerStore + ?Sized>(
    store: &mut S,
    period: Period,
    base_amount: Option<f64>,
) -> LedgerResult<Vec<GeneratedCharge>> {
    let amount = base_amount.unwrap_or(DEFAULT_BASE_AMOUNT);

    let units = store.list_units()?;
    if units.is_empty() {
        return Err(LedgerError::NoUnitsRegistered);
    }

    let mut batch = Vec::new();
    let mut generated = Vec::new();

    for unit in &units {
        if store.find_charge(unit.id, period)?.is_some() {
            debug!(unit = %unit.number, %period, "charge already exists, skipping");
            continue;
        }

        batch.push(NewCharge {
            unit_id: unit.id,
            period,
            amount,
        });
        generated.push(GeneratedCharge {
            unit_number: unit.number.clone(),
            month: period.month,
            year: period.year,
            amount,
        });
    }

    if !batch.is_empty() {
        store.insert_charges(&batch)?;
    }

    info!(
        %period,
        generated = generated.len(),
        skipped = units.len() - generated.len(),
        "charges generated"
    );

    Ok(generated)
}

// ============================================================================
// PAYMENT
// ============================================================================

/// On-time/late determination against the period's due reference
pub fn payment_status(period: Period, paid_date: NaiveDate) -> LedgerResult<PaymentStatus> {
    let due = period.due_reference()?;

    Ok(if paid_date <= due {
        PaymentStatus::OnTime
    } else {
        PaymentStatus::Late
    })
}

pub fn parse_paid_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| LedgerError::InvalidDate(raw.to_string()))
}

/// Record payment of one unit's charge for `period`.
///
/// Lookups happen in order (unit, then charge); a charge that is already
/// paid is rejected with `DuplicatePayment` and left untouched.
pub fn mark_paid<S: LedgerStore + ?Sized>(
    store: &mut S,
    unit_number: &str,
    period: Period,
    paid_date: &str,
) -> LedgerResult<PaymentReceipt> {
    let unit = store
        .find_unit_by_number(unit_number)?
        .ok_or_else(|| LedgerError::UnitNotFound(unit_number.to_string()))?;

    let charge = store
        .find_charge(unit.id, period)?
        .ok_or_else(|| LedgerError::ChargeNotFound {
            unit_number: unit.number.clone(),
            month: period.month,
            year: period.year,
        })?;

    let duplicate = || LedgerError::DuplicatePayment {
        unit_number: unit.number.clone(),
        month: period.month,
        year: period.year,
    };

    if charge.paid {
        return Err(duplicate());
    }

    // Validate everything before writing
    let paid_date = parse_paid_date(paid_date)?;
    let status = payment_status(charge.period, paid_date)?;

    if !store.mark_charge_paid(charge.id, paid_date)? {
        return Err(duplicate());
    }

    info!(
        unit = %unit.number,
        %period,
        paid_date = %paid_date,
        status = status.as_str(),
        "charge marked as paid"
    );

    Ok(PaymentReceipt {
        unit_number: unit.number,
        month: period.month,
        year: period.year,
        paid_date: paid_date.format(DATE_FORMAT).to_string(),
        status,
        message: status.message().to_string(),
    })
}

// ============================================================================
// PENDING
// ============================================================================

/// Unpaid charges on or before `cutoff`, ascending by (year, month).
///
/// An empty result is not an error.
pub fn list_pending<S: LedgerStore + ?Sized>(
    store: &S,
    cutoff: Period,
) -> LedgerResult<Vec<PendingCharge>> {
    let pending = store.pending_charges(cutoff)?;
    debug!(%cutoff, count = pending.len(), "pending charges listed");
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::registry::register_unit;

    fn store_with_units(numbers: &[&str]) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for number in numbers {
            register_unit(&mut store, number).unwrap();
        }
        store
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_requires_units() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = generate_charges(&mut store, Period::new(10, 2024), None).unwrap_err();
        assert!(matches!(err, LedgerError::NoUnitsRegistered));
        assert!(store.pending_charges(Period::new(12, 9999)).unwrap().is_empty());
    }

    #[test]
    fn test_generate_uses_default_amount_in_registry_order() {
        let mut store = store_with_units(&["1305", "101"]);

        let generated = generate_charges(&mut store, Period::new(10, 2024), None).unwrap();

        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].unit_number, "1305");
        assert_eq!(generated[1].unit_number, "101");
        assert!(generated.iter().all(|g| g.amount == 50000.0));
        assert!(generated.iter().all(|g| g.month == 10 && g.year == 2024));
    }

    #[test]
    fn test_generate_twice_creates_nothing_the_second_time() {
        let mut store = store_with_units(&["1305", "101"]);
        let period = Period::new(10, 2024);

        let first = generate_charges(&mut store, period, Some(42000.0)).unwrap();
        let second = generate_charges(&mut store, period, Some(42000.0)).unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert_eq!(store.pending_charges(period).unwrap().len(), 2);
    }

    #[test]
    fn test_generate_only_charges_new_units() {
        let mut store = store_with_units(&["1305"]);
        let period = Period::new(10, 2024);

        generate_charges(&mut store, period, None).unwrap();
        register_unit(&mut store, "202").unwrap();

        let generated = generate_charges(&mut store, period, Some(1.0)).unwrap();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].unit_number, "202");
        assert_eq!(generated[0].amount, 1.0);
    }

    #[test]
    fn test_payment_status_boundaries() {
        let period = Period::new(10, 2024);

        assert_eq!(payment_status(period, date(2024, 9, 15)).unwrap(), PaymentStatus::OnTime);
        assert_eq!(payment_status(period, date(2024, 10, 1)).unwrap(), PaymentStatus::OnTime);
        assert_eq!(payment_status(period, date(2024, 10, 15)).unwrap(), PaymentStatus::Late);
    }

    #[test]
    fn test_mark_paid_lookup_errors() {
        let mut store = store_with_units(&["1305"]);

        let err = mark_paid(&mut store, "999", Period::new(10, 2024), "2024-10-01").unwrap_err();
        assert!(matches!(err, LedgerError::UnitNotFound(_)));

        let err = mark_paid(&mut store, "1305", Period::new(10, 2024), "2024-10-01").unwrap_err();
        assert!(matches!(err, LedgerError::ChargeNotFound { .. }));
    }

    #[test]
    fn test_mark_paid_invalid_date_leaves_charge_unpaid() {
        let mut store = store_with_units(&["1305"]);
        let period = Period::new(10, 2024);
        generate_charges(&mut store, period, None).unwrap();

        for raw in ["03/11/2024", "2024-13-01", "", "2024-11-3x"] {
            let err = mark_paid(&mut store, "1305", period, raw).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidDate(_)), "{raw:?}");
        }

        assert_eq!(store.pending_charges(period).unwrap().len(), 1);
    }

    #[test]
    fn test_mark_paid_twice_keeps_first_date() {
        let mut store = store_with_units(&["1305"]);
        let period = Period::new(10, 2024);
        generate_charges(&mut store, period, None).unwrap();

        let receipt = mark_paid(&mut store, "1305", period, "2024-09-15").unwrap();
        assert_eq!(receipt.status, PaymentStatus::OnTime);

        let err = mark_paid(&mut store, "1305", period, "2024-10-20").unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatePayment { .. }));
        assert!(err.is_client_error());

        let unit = store.find_unit_by_number("1305").unwrap().unwrap();
        let charge = store.find_charge(unit.id, period).unwrap().unwrap();
        assert_eq!(charge.paid_date, Some(date(2024, 9, 15)));
    }

    #[test]
    fn test_duplicate_payment_checked_before_date_parsing() {
        let mut store = store_with_units(&["1305"]);
        let period = Period::new(10, 2024);
        generate_charges(&mut store, period, None).unwrap();
        mark_paid(&mut store, "1305", period, "2024-10-01").unwrap();

        let err = mark_paid(&mut store, "1305", period, "not-a-date").unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatePayment { .. }));
    }

    #[test]
    fn test_mark_paid_with_impossible_month_writes_nothing() {
        let mut store = store_with_units(&["1305"]);
        let period = Period::new(13, 2024);
        generate_charges(&mut store, period, None).unwrap();

        let err = mark_paid(&mut store, "1305", period, "2024-10-01").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidPeriod { month: 13, year: 2024 }));

        let unit = store.find_unit_by_number("1305").unwrap().unwrap();
        let charge = store.find_charge(unit.id, period).unwrap().unwrap();
        assert!(!charge.paid);
        assert_eq!(charge.paid_date, None);
    }

    #[test]
    fn test_list_pending_cutoff_and_order() {
        let mut store = store_with_units(&["1305", "101"]);

        generate_charges(&mut store, Period::new(11, 2024), None).unwrap();
        generate_charges(&mut store, Period::new(10, 2024), None).unwrap();
        generate_charges(&mut store, Period::new(12, 2023), None).unwrap();
        mark_paid(&mut store, "101", Period::new(10, 2024), "2024-10-01").unwrap();

        let pending = list_pending(&store, Period::new(10, 2024)).unwrap();
        let rows: Vec<(&str, u32, i32)> = pending
            .iter()
            .map(|p| (p.unit_number.as_str(), p.month, p.year))
            .collect();

        assert_eq!(
            rows,
            vec![("1305", 12, 2023), ("101", 12, 2023), ("1305", 10, 2024)]
        );
        assert!(pending.iter().all(|p| !(p.year == 2024 && p.month == 11)));
    }

    #[test]
    fn test_end_to_end_late_payment() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let period = Period::new(10, 2024);

        register_unit(&mut store, "1305").unwrap();

        let generated = generate_charges(&mut store, period, Some(50000.0)).unwrap();
        assert_eq!(
            generated,
            vec![GeneratedCharge {
                unit_number: "1305".to_string(),
                month: 10,
                year: 2024,
                amount: 50000.0,
            }]
        );

        let receipt = mark_paid(&mut store, "1305", period, "2024-11-03").unwrap();
        assert_eq!(receipt.status, PaymentStatus::Late);
        assert_eq!(receipt.paid_date, "2024-11-03");

        assert!(list_pending(&store, period).unwrap().is_empty());
    }
}
