use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::database::contains_pattern;

pub const STATUS_AVAILABLE: &str = "Tersedia";
pub const STATUS_SOLD_OUT: &str = "Sold Out";

const ROOM_COLUMNS: &str = "id, tipe_kamar, deskripsi, harga, jumlah_tersedia";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: i64,
    pub room_type: String,
    pub description: String,
    pub price: i64,
    pub available: i64,
}

impl Room {
    pub fn is_available(&self) -> bool {
        self.available > 0
    }

    pub fn status(&self) -> &'static str {
        if self.is_available() {
            STATUS_AVAILABLE
        } else {
            STATUS_SOLD_OUT
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            room_type: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            available: row.get(4)?,
        })
    }
}

pub struct NewRoom<'a> {
    pub room_type: &'a str,
    pub description: &'a str,
    pub price: i64,
    pub available: i64,
}

/// Room types ordered by name. A non-empty `search` keeps only types whose name or
/// description contains it, ignoring case.
pub fn list_rooms(connection: &Connection, search: &str) -> rusqlite::Result<Vec<Room>> {
    let search = search.trim();

    if search.is_empty() {
        let mut statement = connection.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM kamar_tersedia ORDER BY tipe_kamar ASC"
        ))?;
        let rooms = statement.query_map([], Room::from_row)?;
        return rooms.collect();
    }

    let mut statement = connection.prepare(&format!(
        "SELECT {ROOM_COLUMNS} FROM kamar_tersedia
         WHERE tipe_kamar LIKE ?1 ESCAPE '\\' OR deskripsi LIKE ?1 ESCAPE '\\'
         ORDER BY tipe_kamar ASC"
    ))?;
    let rooms = statement.query_map(params![contains_pattern(search)], Room::from_row)?;
    rooms.collect()
}

pub fn available_rooms(connection: &Connection) -> rusqlite::Result<Vec<Room>> {
    Ok(list_rooms(connection, "")?
        .into_iter()
        .filter(Room::is_available)
        .collect())
}

pub fn find_room_by_type(connection: &Connection, room_type: &str) -> rusqlite::Result<Option<Room>> {
    connection
        .query_row(
            &format!("SELECT {ROOM_COLUMNS} FROM kamar_tersedia WHERE tipe_kamar = ?1"),
            params![room_type],
            Room::from_row,
        )
        .optional()
}

pub fn insert_room(connection: &Connection, room: &NewRoom<'_>) -> rusqlite::Result<i64> {
    connection.execute(
        "INSERT INTO kamar_tersedia (tipe_kamar, harga, deskripsi, jumlah_tersedia)
         VALUES (?1, ?2, ?3, ?4)",
        params![room.room_type, room.price, room.description, room.available],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn update_room_availability(connection: &Connection, id: i64, available: i64) -> rusqlite::Result<bool> {
    let changed = connection.execute(
        "UPDATE kamar_tersedia SET jumlah_tersedia = ?1 WHERE id = ?2",
        params![available, id],
    )?;

    Ok(changed > 0)
}

pub fn delete_room(connection: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = connection.execute("DELETE FROM kamar_tersedia WHERE id = ?1", params![id])?;

    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::open_in_memory;

    fn seeded() -> Connection {
        let connection = open_in_memory().unwrap();
        for (room_type, description, price, available) in [
            ("Standar", "Kamar nyaman dengan kipas", 800_000, 3),
            ("Deluxe", "Kamar luas dengan AC", 1_500_000, 0),
            ("VIP", "AC dan kamar mandi dalam", 2_500_000, 1),
        ] {
            insert_room(
                &connection,
                &NewRoom {
                    room_type,
                    description,
                    price,
                    available,
                },
            )
            .unwrap();
        }
        connection
    }

    #[test]
    fn lists_rooms_sorted_by_type() {
        let connection = seeded();
        let names: Vec<_> = list_rooms(&connection, "")
            .unwrap()
            .into_iter()
            .map(|room| room.room_type)
            .collect();

        assert_eq!(names, ["Deluxe", "Standar", "VIP"]);
    }

    #[test]
    fn search_matches_type_or_description_case_insensitively() {
        let connection = seeded();

        let by_description: Vec<_> = list_rooms(&connection, "ac")
            .unwrap()
            .into_iter()
            .map(|room| room.room_type)
            .collect();
        assert_eq!(by_description, ["Deluxe", "VIP"]);

        let by_type = list_rooms(&connection, "standar").unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].room_type, "Standar");

        assert!(list_rooms(&connection, "100%").unwrap().is_empty());
    }

    #[test]
    fn available_rooms_skip_sold_out() {
        let connection = seeded();
        let rooms = available_rooms(&connection).unwrap();

        assert_eq!(rooms.len(), 2);
        assert!(rooms.iter().all(|room| room.status() == STATUS_AVAILABLE));
    }

    #[test]
    fn update_and_delete_report_missing_rows() {
        let connection = seeded();
        let deluxe = find_room_by_type(&connection, "Deluxe").unwrap().unwrap();
        assert_eq!(deluxe.status(), STATUS_SOLD_OUT);

        assert!(update_room_availability(&connection, deluxe.id, 4).unwrap());
        let deluxe = find_room_by_type(&connection, "Deluxe").unwrap().unwrap();
        assert_eq!(deluxe.available, 4);

        assert!(delete_room(&connection, deluxe.id).unwrap());
        assert!(!delete_room(&connection, deluxe.id).unwrap());
        assert!(!update_room_availability(&connection, 999, 1).unwrap());
    }

    #[test]
    fn negative_availability_is_rejected_by_schema() {
        let connection = seeded();
        let vip = find_room_by_type(&connection, "VIP").unwrap().unwrap();

        assert!(update_room_availability(&connection, vip.id, -1).is_err());
    }
}
