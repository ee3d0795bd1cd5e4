use std::{fmt, str::FromStr};

use rusqlite::{
    params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, OptionalExtension, Row, ToSql,
};

const USER_COLUMNS: &str =
    "user_id, username, password, first_name, last_name, email, phone_number, role, google_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub google_id: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
            email: row.get(5)?,
            phone_number: row.get(6)?,
            role: row.get(7)?,
            google_id: row.get(8)?,
        })
    }
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub dob: Option<&'a str>,
    pub phone_number: Option<&'a str>,
    pub role: Role,
    pub google_id: Option<&'a str>,
}

pub struct ProfileUpdate<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone_number: &'a str,
}

fn find_user_where(connection: &Connection, condition: &str, value: &dyn ToSql) -> rusqlite::Result<Option<User>> {
    connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE {condition} = ?1"),
            params![value],
            User::from_row,
        )
        .optional()
}

pub fn find_user_by_id(connection: &Connection, user_id: i64) -> rusqlite::Result<Option<User>> {
    find_user_where(connection, "user_id", &user_id)
}

pub fn find_user_by_username(connection: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    find_user_where(connection, "username", &username)
}

pub fn find_user_by_google_id(connection: &Connection, google_id: &str) -> rusqlite::Result<Option<User>> {
    find_user_where(connection, "google_id", &google_id)
}

pub fn find_user_by_email(connection: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    if email.is_empty() {
        return Ok(None);
    }

    find_user_where(connection, "email", &email)
}

pub fn username_or_email_taken(connection: &Connection, username: &str, email: &str) -> rusqlite::Result<bool> {
    connection.query_row(
        "SELECT EXISTS (SELECT 1 FROM users WHERE username = ?1 OR (?2 <> '' AND email = ?2))",
        params![username, email],
        |row| row.get(0),
    )
}

pub fn insert_user(connection: &Connection, user: &NewUser<'_>) -> rusqlite::Result<i64> {
    connection.execute(
        "INSERT INTO users
            (username, password, first_name, last_name, email, dob, phone_number, role, google_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.username,
            user.password_hash,
            user.first_name,
            user.last_name,
            user.email,
            user.dob,
            user.phone_number,
            user.role,
            user.google_id,
        ],
    )?;

    Ok(connection.last_insert_rowid())
}

pub fn users_by_role(connection: &Connection, role: Role) -> rusqlite::Result<Vec<User>> {
    let mut statement = connection.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 ORDER BY username ASC"
    ))?;
    let users = statement.query_map(params![role], User::from_row)?;
    users.collect()
}

pub fn update_role(connection: &Connection, username: &str, role: Role) -> rusqlite::Result<bool> {
    let changed = connection.execute(
        "UPDATE users SET role = ?1 WHERE username = ?2",
        params![role, username],
    )?;

    Ok(changed > 0)
}

pub fn delete_user(connection: &Connection, username: &str) -> rusqlite::Result<bool> {
    let changed = connection.execute("DELETE FROM users WHERE username = ?1", params![username])?;

    Ok(changed > 0)
}

pub fn update_profile(connection: &Connection, user_id: i64, profile: &ProfileUpdate<'_>) -> rusqlite::Result<()> {
    connection.execute(
        "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3, phone_number = ?4
         WHERE user_id = ?5",
        params![
            profile.first_name,
            profile.last_name,
            profile.email,
            profile.phone_number,
            user_id,
        ],
    )?;

    Ok(())
}

pub fn link_google_id(connection: &Connection, user_id: i64, google_id: &str) -> rusqlite::Result<()> {
    connection.execute(
        "UPDATE users SET google_id = ?1 WHERE user_id = ?2",
        params![google_id, user_id],
    )?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::open_in_memory;

    pub(crate) fn add_user(connection: &Connection, username: &str, email: &str, role: Role) -> i64 {
        insert_user(
            connection,
            &NewUser {
                username,
                password_hash: "",
                first_name: "Budi",
                last_name: "Santoso",
                email,
                dob: None,
                phone_number: None,
                role,
                google_id: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("guest".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn finds_users_by_each_key() {
        let connection = open_in_memory().unwrap();
        let id = add_user(&connection, "budi", "budi@example.com", Role::User);

        let by_id = find_user_by_id(&connection, id).unwrap().unwrap();
        assert_eq!(by_id.username, "budi");
        assert_eq!(by_id.role, Role::User);
        assert_eq!(by_id.full_name(), "Budi Santoso");

        assert!(find_user_by_username(&connection, "budi").unwrap().is_some());
        assert!(find_user_by_email(&connection, "budi@example.com").unwrap().is_some());
        assert!(find_user_by_email(&connection, "").unwrap().is_none());
        assert!(find_user_by_username(&connection, "siti").unwrap().is_none());

        link_google_id(&connection, id, "g-123").unwrap();
        let linked = find_user_by_google_id(&connection, "g-123").unwrap().unwrap();
        assert_eq!(linked.user_id, id);
    }

    #[test]
    fn taken_checks_username_or_non_empty_email() {
        let connection = open_in_memory().unwrap();
        add_user(&connection, "budi", "", Role::User);

        assert!(username_or_email_taken(&connection, "budi", "other@example.com").unwrap());
        assert!(!username_or_email_taken(&connection, "siti", "").unwrap());

        add_user(&connection, "siti", "siti@example.com", Role::User);
        assert!(username_or_email_taken(&connection, "rina", "siti@example.com").unwrap());
    }

    #[test]
    fn role_changes_move_users_between_lists() {
        let connection = open_in_memory().unwrap();
        add_user(&connection, "budi", "budi@example.com", Role::User);
        add_user(&connection, "admin", "admin@example.com", Role::Admin);

        assert_eq!(users_by_role(&connection, Role::Admin).unwrap().len(), 1);
        assert!(update_role(&connection, "budi", Role::Admin).unwrap());
        assert_eq!(users_by_role(&connection, Role::Admin).unwrap().len(), 2);
        assert!(users_by_role(&connection, Role::User).unwrap().is_empty());

        assert!(delete_user(&connection, "budi").unwrap());
        assert!(!delete_user(&connection, "budi").unwrap());
        assert!(!update_role(&connection, "budi", Role::User).unwrap());
    }

    #[test]
    fn profile_update_overwrites_contact_fields() {
        let connection = open_in_memory().unwrap();
        let id = add_user(&connection, "budi", "budi@example.com", Role::User);

        update_profile(
            &connection,
            id,
            &ProfileUpdate {
                first_name: "Budi",
                last_name: "Hartono",
                email: "hartono@example.com",
                phone_number: "08123456789",
            },
        )
        .unwrap();

        let user = find_user_by_id(&connection, id).unwrap().unwrap();
        assert_eq!(user.last_name.as_deref(), Some("Hartono"));
        assert_eq!(user.email.as_deref(), Some("hartono@example.com"));
        assert_eq!(user.phone_number.as_deref(), Some("08123456789"));
    }
}
