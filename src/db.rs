use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

use crate::entities::{Charge, NewCharge, PendingCharge, Period, Unit, DATE_FORMAT};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// STORAGE ABSTRACTION
// ============================================================================

/// Storage collaborator for the registry and the ledger.
///
/// Operations receive the store explicitly; whoever owns it decides how long
/// a session lives (the server holds one per request).
pub trait LedgerStore {
    fn find_unit_by_number(&self, number: &str) -> LedgerResult<Option<Unit>>;

    fn insert_unit(&mut self, number: &str) -> LedgerResult<Unit>;

    /// All units in registry order (ascending id)
    fn list_units(&self) -> LedgerResult<Vec<Unit>>;

    fn find_charge(&self, unit_id: i64, period: Period) -> LedgerResult<Option<Charge>>;

    /// Persist a batch of charges atomically
    fn insert_charges(&mut self, charges: &[NewCharge]) -> LedgerResult<Vec<Charge>>;

    /// Flip an unpaid charge to paid. Returns false when the charge was
    /// already paid (or does not exist) and nothing changed.
    fn mark_charge_paid(&mut self, charge_id: i64, paid_date: NaiveDate) -> LedgerResult<bool>;

    /// Unpaid charges on or before `cutoff`, ordered by (year, month)
    fn pending_charges(&self, cutoff: Period) -> LedgerResult<Vec<PendingCharge>>;
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            number TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    // No uniqueness on (unit_id, month, year): generation checks before insert
    conn.execute(
        "CREATE TABLE IF NOT EXISTS charges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            unit_id INTEGER NOT NULL REFERENCES units(id),
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            amount REAL NOT NULL,
            paid INTEGER NOT NULL DEFAULT 0,
            paid_date TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_charges_unit_period ON charges(unit_id, month, year)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_charges_paid ON charges(paid)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> LedgerResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn charge_from_row(row: &Row<'_>) -> rusqlite::Result<Charge> {
    let paid_date: Option<String> = row.get(6)?;
    let paid_date = paid_date
        .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

    Ok(Charge {
        id: row.get(0)?,
        unit_id: row.get(1)?,
        period: Period::new(row.get(2)?, row.get(3)?),
        amount: row.get(4)?,
        paid: row.get(5)?,
        paid_date,
    })
}

impl LedgerStore for SqliteStore {
    fn find_unit_by_number(&self, number: &str) -> LedgerResult<Option<Unit>> {
        let unit = self
            .conn
            .query_row(
                "SELECT id, number FROM units WHERE number = ?1",
                params![number],
                |row| Ok(Unit::new(row.get(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        Ok(unit)
    }

    fn insert_unit(&mut self, number: &str) -> LedgerResult<Unit> {
        let result = self
            .conn
            .execute("INSERT INTO units (number) VALUES (?1)", params![number]);

        match result {
            Ok(_) => Ok(Unit::new(self.conn.last_insert_rowid(), number)),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(LedgerError::DuplicateUnit(number.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_units(&self) -> LedgerResult<Vec<Unit>> {
        let mut stmt = self.conn.prepare("SELECT id, number FROM units ORDER BY id")?;

        let units = stmt
            .query_map([], |row| Ok(Unit::new(row.get(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }

    fn find_charge(&self, unit_id: i64, period: Period) -> LedgerResult<Option<Charge>> {
        let charge = self
            .conn
            .query_row(
                "SELECT id, unit_id, month, year, amount, paid, paid_date
                 FROM charges
                 WHERE unit_id = ?1 AND month = ?2 AND year = ?3
                 ORDER BY id
                 LIMIT 1",
                params![unit_id, period.month, period.year],
                charge_from_row,
            )
            .optional()?;

        Ok(charge)
    }

    fn insert_charges(&mut self, charges: &[NewCharge]) -> LedgerResult<Vec<Charge>> {
        let tx = self.conn.transaction()?;
        let mut inserted = Vec::with_capacity(charges.len());

        for charge in charges {
            tx.execute(
                "INSERT INTO charges (unit_id, month, year, amount, paid)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![charge.unit_id, charge.period.month, charge.period.year, charge.amount],
            )?;

            inserted.push(Charge {
                id: tx.last_insert_rowid(),
                unit_id: charge.unit_id,
                period: charge.period,
                amount: charge.amount,
                paid: false,
                paid_date: None,
            });
        }

        tx.commit()?;
        debug!(count = inserted.len(), "charges inserted");

        Ok(inserted)
    }

    fn mark_charge_paid(&mut self, charge_id: i64, paid_date: NaiveDate) -> LedgerResult<bool> {
        let changed = self.conn.execute(
            "UPDATE charges SET paid = 1, paid_date = ?1 WHERE id = ?2 AND paid = 0",
            params![paid_date.format(DATE_FORMAT).to_string(), charge_id],
        )?;

        Ok(changed == 1)
    }

    fn pending_charges(&self, cutoff: Period) -> LedgerResult<Vec<PendingCharge>> {
        let mut stmt = self.conn.prepare(
            "SELECT u.number, c.month, c.year, c.amount
             FROM charges c
             JOIN units u ON u.id = c.unit_id
             WHERE c.paid = 0
               AND (c.year < ?2 OR (c.year = ?2 AND c.month <= ?1))
             ORDER BY c.year, c.month, c.id",
        )?;

        let pending = stmt
            .query_map(params![cutoff.month, cutoff.year], |row| {
                Ok(PendingCharge {
                    unit_number: row.get(0)?,
                    month: row.get(1)?,
                    year: row.get(2)?,
                    amount: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pending)
    }
}
