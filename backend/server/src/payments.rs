use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use thiserror::Error;

use crate::database::contains_pattern;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub paid_at: DateTime<Utc>,
    pub room_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReport {
    pub username: String,
    pub paid_at: DateTime<Utc>,
    pub room_type: String,
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("room type {0:?} is missing or sold out")]
    RoomUnavailable(String),

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub fn payments_for_user(connection: &Connection, user_id: i64) -> rusqlite::Result<Vec<Payment>> {
    let mut statement = connection.prepare(
        "SELECT tanggal_pembayaran, tipe_kamar FROM laporan_keuangan
         WHERE user_id = ?1 ORDER BY tanggal_pembayaran DESC",
    )?;
    let payments = statement.query_map(params![user_id], |row| {
        Ok(Payment {
            paid_at: row.get(0)?,
            room_type: row.get(1)?,
        })
    })?;
    payments.collect()
}

/// Every payment joined with its user, newest first. A non-empty `search` filters on
/// the username, ignoring case.
pub fn all_payments(connection: &Connection, search: &str) -> rusqlite::Result<Vec<PaymentReport>> {
    let search = search.trim();
    let mut sql = String::from(
        "SELECT u.username, l.tanggal_pembayaran, l.tipe_kamar
         FROM laporan_keuangan l
         JOIN users u ON l.user_id = u.user_id",
    );
    if !search.is_empty() {
        sql.push_str(" WHERE u.username LIKE ?1 ESCAPE '\\'");
    }
    sql.push_str(" ORDER BY l.tanggal_pembayaran DESC");

    let mut statement = connection.prepare(&sql)?;
    let reports = if search.is_empty() {
        statement.query_map([], report_from_row)?
    } else {
        statement.query_map(params![contains_pattern(search)], report_from_row)?
    };
    reports.collect()
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<PaymentReport> {
    Ok(PaymentReport {
        username: row.get(0)?,
        paid_at: row.get(1)?,
        room_type: row.get(2)?,
    })
}

/// Takes one room of `room_type` and records the payment, both or neither.
pub fn book_room(
    connection: &mut Connection,
    user_id: i64,
    room_type: &str,
    paid_at: DateTime<Utc>,
) -> Result<(), BookingError> {
    let transaction = connection.transaction()?;

    let taken = transaction.execute(
        "UPDATE kamar_tersedia SET jumlah_tersedia = jumlah_tersedia - 1
         WHERE tipe_kamar = ?1 AND jumlah_tersedia > 0",
        params![room_type],
    )?;
    if taken == 0 {
        return Err(BookingError::RoomUnavailable(room_type.to_string()));
    }

    transaction.execute(
        "INSERT INTO laporan_keuangan (user_id, tipe_kamar, tanggal_pembayaran) VALUES (?1, ?2, ?3)",
        params![user_id, room_type, paid_at],
    )?;
    transaction.commit()?;

    Ok(())
}
