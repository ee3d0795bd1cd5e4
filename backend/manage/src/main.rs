use std::env;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use server::{
    database::init_db,
    render::format_rupiah,
    rooms::{find_room_by_type, insert_room, list_rooms, NewRoom},
    users::{find_user_by_username, insert_user, update_role, NewUser, Role},
};

const BCRYPT_COST: u32 = 10;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// SQLite file, defaults to `DATABASE_PATH` or `kost.db`
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database file and tables
    Init,

    /// Create an admin account, or promote an existing user
    CreateAdmin {
        username: String,

        password: String,

        #[arg(long, default_value = "")]
        email: String,
    },

    /// Add a room type
    AddRoom {
        room_type: String,

        price: i64,

        available: i64,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// List room types with their status
    Rooms,
}

fn create_admin(connection: &Connection, username: &str, password: &str, email: &str) -> Result<()> {
    if find_user_by_username(connection, username)?.is_some() {
        update_role(connection, username, Role::Admin)?;
        println!("Promoted {username} to admin");
        return Ok(());
    }

    let password_hash = bcrypt::hash(password, BCRYPT_COST).context("Failed to hash password")?;
    insert_user(
        connection,
        &NewUser {
            username,
            password_hash: &password_hash,
            first_name: username,
            last_name: "",
            email,
            dob: None,
            phone_number: None,
            role: Role::Admin,
            google_id: None,
        },
    )?;
    println!("Created admin {username}");

    Ok(())
}

fn add_room(connection: &Connection, room: &NewRoom<'_>) -> Result<()> {
    if room.room_type.trim().is_empty() {
        bail!("Room type must not be empty");
    }
    if room.price < 0 || room.available < 0 {
        bail!("Price and available count must not be negative");
    }
    if find_room_by_type(connection, room.room_type)?.is_some() {
        bail!("Room type {} already exists", room.room_type);
    }

    insert_room(connection, room)?;
    println!("Added {} at Rp {}", room.room_type, format_rupiah(room.price));

    Ok(())
}

fn print_rooms(connection: &Connection) -> Result<()> {
    for room in list_rooms(connection, "")? {
        println!(
            "{:<20} Rp {:>12}  {:>3} left  {}",
            room.room_type,
            format_rupiah(room.price),
            room.available,
            room.status()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let path = args
        .database
        .or_else(|| env::var("DATABASE_PATH").ok())
        .unwrap_or_else(|| "kost.db".to_string());
    let connection = init_db(&path).with_context(|| format!("Failed to open {path}"))?;

    match args.command {
        Command::Init => println!("Database ready at {path}"),
        Command::CreateAdmin {
            username,
            password,
            email,
        } => create_admin(&connection, username.trim(), &password, email.trim())?,
        Command::AddRoom {
            room_type,
            price,
            available,
            description,
        } => add_room(
            &connection,
            &NewRoom {
                room_type: room_type.trim(),
                description: description.trim(),
                price,
                available,
            },
        )?,
        Command::Rooms => print_rooms(&connection)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use server::database::open_in_memory;

    use super::*;

    #[test]
    fn create_admin_promotes_existing_users() {
        let connection = open_in_memory().unwrap();

        create_admin(&connection, "sari", "rahasia", "sari@example.com").unwrap();
        let sari = find_user_by_username(&connection, "sari").unwrap().unwrap();
        assert_eq!(sari.role, Role::Admin);
        assert!(bcrypt::verify("rahasia", &sari.password).unwrap());

        update_role(&connection, "sari", Role::User).unwrap();
        create_admin(&connection, "sari", "ignored", "").unwrap();
        let sari = find_user_by_username(&connection, "sari").unwrap().unwrap();
        assert_eq!(sari.role, Role::Admin);
        assert!(bcrypt::verify("rahasia", &sari.password).unwrap());
    }

    #[test]
    fn add_room_rejects_duplicates_and_negatives() {
        let connection = open_in_memory().unwrap();
        let room = NewRoom {
            room_type: "Standar",
            description: "",
            price: 800_000,
            available: 3,
        };

        add_room(&connection, &room).unwrap();
        assert!(add_room(&connection, &room).is_err());
        assert!(add_room(&connection, &NewRoom { room_type: "VIP", price: -1, ..room }).is_err());
        assert_eq!(list_rooms(&connection, "").unwrap().len(), 1);
    }
}
