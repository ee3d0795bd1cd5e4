//! # SQLite
//!
//! Single relational store for the portal.
//!
//! ## Tables
//!
//! - `users`: local and Google accounts. `password` holds a bcrypt hash, empty for accounts
//!   created through Google which therefore cannot log in locally.
//! - `kamar_tersedia`: room types, monthly price in rupiah and how many rooms are still free.
//! - `laporan_keuangan`: one row per booking, removed together with its user.
//!
//! ## Access
//!
//! - One connection, shared behind an async mutex in [`crate::state::AppState`]
//! - Every query function takes a plain `&Connection` so the `manage` CLI and tests reuse them
//! - Schema is idempotent and applied on every start
use std::path::Path;

use rusqlite::Connection;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id      INTEGER PRIMARY KEY AUTOINCREMENT,
        username     TEXT NOT NULL UNIQUE,
        password     TEXT NOT NULL DEFAULT '',
        first_name   TEXT,
        last_name    TEXT,
        email        TEXT,
        dob          TEXT,
        phone_number TEXT,
        role         TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
        google_id    TEXT UNIQUE
    );

    CREATE TABLE IF NOT EXISTS kamar_tersedia (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        tipe_kamar      TEXT NOT NULL UNIQUE,
        deskripsi       TEXT NOT NULL DEFAULT '',
        harga           INTEGER NOT NULL CHECK (harga >= 0),
        jumlah_tersedia INTEGER NOT NULL DEFAULT 0 CHECK (jumlah_tersedia >= 0)
    );

    CREATE TABLE IF NOT EXISTS laporan_keuangan (
        id                 INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id            INTEGER NOT NULL REFERENCES users (user_id) ON DELETE CASCADE,
        tipe_kamar         TEXT NOT NULL,
        tanggal_pembayaran TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_laporan_keuangan_user
        ON laporan_keuangan (user_id, tanggal_pembayaran);
"#;

pub fn init_db(path: impl AsRef<Path>) -> rusqlite::Result<Connection> {
    let connection = Connection::open(path)?;
    apply_schema(&connection)?;

    Ok(connection)
}

pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let connection = Connection::open_in_memory()?;
    apply_schema(&connection)?;

    Ok(connection)
}

pub fn apply_schema(connection: &Connection) -> rusqlite::Result<()> {
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.execute_batch(SCHEMA)
}

/// `LIKE` pattern matching `search` anywhere, with wildcards in the input taken literally.
pub(crate) fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');

    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }

    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_is_idempotent() {
        let connection = open_in_memory().unwrap();
        apply_schema(&connection).unwrap();
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("deluxe"), "%deluxe%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
