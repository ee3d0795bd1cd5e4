use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tracing::info;

use super::pages::{profile_page, room_image, SearchQuery};
use crate::{
    error::AppError,
    payments::all_payments,
    render::{escape, format_date, format_rupiah, format_time, render, Page},
    rooms::{delete_room, find_room_by_type, insert_room, list_rooms, update_room_availability, NewRoom, Room},
    session::Admin,
    state::AppState,
    users::{self, users_by_role, Role, User},
};

const NO_PAYMENTS: &str = r#"<tr><td colspan="4">Tidak ada data pembayaran yang ditemukan.</td></tr>"#;
const NO_ADMINS: &str = r#"<tr><td colspan="5">Tidak ada pengguna admin yang terdaftar.</td></tr>"#;
const NO_USERS: &str = r#"<tr><td colspan="5">Tidak ada pengguna biasa yang terdaftar.</td></tr>"#;
const NO_ROOMS: &str = r#"<p style="text-align: center;">Tidak ada tipe kamar yang terdaftar. Silakan tambahkan tipe kamar baru.</p>"#;

#[derive(Deserialize)]
pub struct RoleForm {
    username: String,
    #[serde(rename = "newRole")]
    new_role: String,
}

#[derive(Deserialize)]
pub struct UsernameForm {
    username: String,
}

#[derive(Deserialize)]
pub struct NewRoomForm {
    tipe_kamar: String,
    harga_kamar: i64,
    #[serde(default)]
    deskripsi_kamar: String,
    jumlah_tersedia: i64,
}

#[derive(Deserialize)]
pub struct AvailabilityForm {
    id: i64,
    jumlah_tersedia: i64,
}

#[derive(Deserialize)]
pub struct RoomIdForm {
    id: i64,
}

pub async fn dashboard(Admin(user): Admin) -> Html<String> {
    let username = escape(&user.username);

    Html(render(
        Page::DashboardAdmin,
        &[("username", username.as_str()), ("role", user.role.as_str())],
    ))
}

pub async fn profile(Admin(user): Admin) -> Html<String> {
    profile_page(Page::ProfileAdmin, &user)
}

pub async fn payments(
    State(state): State<Arc<AppState>>,
    Admin(user): Admin,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let reports = {
        let db = state.db.lock().await;
        all_payments(&db, &query.search)?
    };

    let rows = if reports.is_empty() {
        NO_PAYMENTS.to_string()
    } else {
        reports
            .iter()
            .map(|report| {
                format!(
                    "
                    <tr>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>",
                    escape(&report.username),
                    format_date(report.paid_at),
                    format_time(report.paid_at),
                    escape(&report.room_type)
                )
            })
            .collect()
    };

    let username = escape(&user.username);
    let search = escape(&query.search);

    Ok(Html(render(
        Page::PaymentsAdmin,
        &[
            ("username", username.as_str()),
            ("rows", rows.as_str()),
            ("searchQuery", search.as_str()),
        ],
    )))
}

fn user_row(user: &User) -> String {
    let (target, label, color) = match user.role {
        Role::Admin => (Role::User, "Ubah ke User", "#e67e22"),
        Role::User => (Role::Admin, "Ubah ke Admin", "var(--primary-color)"),
    };
    let username = escape(&user.username);
    let phone = user
        .phone_number
        .as_deref()
        .filter(|phone| !phone.is_empty())
        .map_or_else(|| "-".to_string(), escape);

    format!(
        r#"
                    <tr>
                        <td>{username}</td>
                        <td>{name}</td>
                        <td>{email}</td>
                        <td>{phone}</td>
                        <td>
                            <form action="/daftarUser/updateRole" method="POST" style="display:inline-block; margin-right: 5px;">
                                <input type="hidden" name="username" value="{username}">
                                <input type="hidden" name="newRole" value="{target}">
                                <button type="submit" class="action-btn" style="background-color: {color};">{label}</button>
                            </form>
                            <form action="/daftarUser/delete" method="POST" style="display:inline-block;">
                                <input type="hidden" name="username" value="{username}">
                                <button type="submit" class="action-btn" style="background-color: var(--red-alert);">Hapus</button>
                            </form>
                        </td>
                    </tr>"#,
        name = escape(&user.full_name()),
        email = escape(user.email.as_deref().unwrap_or_default()),
    )
}

fn user_rows(users: &[User], empty: &str) -> String {
    if users.is_empty() {
        return empty.to_string();
    }

    users.iter().map(user_row).collect()
}

pub async fn user_list(State(state): State<Arc<AppState>>, Admin(user): Admin) -> Result<Html<String>, AppError> {
    let (admins, regulars) = {
        let db = state.db.lock().await;
        (users_by_role(&db, Role::Admin)?, users_by_role(&db, Role::User)?)
    };

    let username = escape(&user.username);
    let admin_rows = user_rows(&admins, NO_ADMINS);
    let regular_rows = user_rows(&regulars, NO_USERS);

    Ok(Html(render(
        Page::UserList,
        &[
            ("username", username.as_str()),
            ("adminRows", admin_rows.as_str()),
            ("regularRows", regular_rows.as_str()),
        ],
    )))
}

pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let role: Role = form
        .new_role
        .parse()
        .map_err(|_| AppError::bad_request("Peran tidak valid."))?;

    let changed = {
        let db = state.db.lock().await;
        users::update_role(&db, &form.username, role)?
    };
    if changed {
        info!("{} set role of {} to {role}", admin.username, form.username);
    }

    Ok(Redirect::to("/daftarUser"))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Form(form): Form<UsernameForm>,
) -> Result<Redirect, AppError> {
    let deleted = {
        let db = state.db.lock().await;
        users::delete_user(&db, &form.username)?
    };
    if deleted {
        info!("{} deleted user {}", admin.username, form.username);
    }

    Ok(Redirect::to("/daftarUser"))
}

fn managed_room_card(room: &Room) -> String {
    format!(
        r#"
                    <div class="kamar-item">
                        {image}
                        <h3>{room_type}</h3>
                        <p class="harga">Rp {price} / bulan</p>
                        <p>{description}</p>
                        <div style="margin-top: 20px; border-top: 1px solid #eee; padding-top: 15px; text-align: center;">
                            <form action="/kelolaKamar/update" method="POST" style="display:inline-block; margin-right: 15px;">
                                <input type="hidden" name="id" value="{id}">
                                <label for="jumlah-{id}" style="font-weight: 600;">Tersedia:</label>
                                <input type="number" id="jumlah-{id}" name="jumlah_tersedia" value="{available}" min="0" style="width: 60px;">
                                <button type="submit" class="action-btn" style="background-color: var(--primary-color);">Update</button>
                            </form>
                            <form action="/kelolaKamar/delete" method="POST" style="display:inline-block;">
                                <input type="hidden" name="id" value="{id}">
                                <button type="submit" class="action-btn" style="background-color: var(--red-alert);">Hapus Tipe</button>
                            </form>
                        </div>
                    </div>"#,
        image = room_image(room),
        room_type = escape(&room.room_type),
        price = format_rupiah(room.price),
        description = escape(&room.description),
        id = room.id,
        available = room.available,
    )
}

pub async fn manage_rooms(State(state): State<Arc<AppState>>, Admin(user): Admin) -> Result<Html<String>, AppError> {
    let rooms = {
        let db = state.db.lock().await;
        list_rooms(&db, "")?
    };

    let cards = if rooms.is_empty() {
        NO_ROOMS.to_string()
    } else {
        rooms.iter().map(managed_room_card).collect()
    };
    let username = escape(&user.username);

    Ok(Html(render(
        Page::ManageRooms,
        &[("username", username.as_str()), ("kamarList", cards.as_str())],
    )))
}

pub async fn add_room(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Form(form): Form<NewRoomForm>,
) -> Result<Redirect, AppError> {
    let room_type = form.tipe_kamar.trim();

    if room_type.is_empty() {
        return Err(AppError::bad_request("Tipe kamar wajib diisi."));
    }
    if form.harga_kamar < 0 || form.jumlah_tersedia < 0 {
        return Err(AppError::bad_request("Harga dan jumlah kamar tidak boleh negatif."));
    }

    {
        let db = state.db.lock().await;

        if find_room_by_type(&db, room_type)?.is_some() {
            return Err(AppError::bad_request("Tipe kamar sudah terdaftar."));
        }

        insert_room(
            &db,
            &NewRoom {
                room_type,
                description: form.deskripsi_kamar.trim(),
                price: form.harga_kamar,
                available: form.jumlah_tersedia,
            },
        )?;
    }
    info!("{} added room type {room_type}", admin.username);

    Ok(Redirect::to("/kelolaKamar"))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Admin(_): Admin,
    Form(form): Form<AvailabilityForm>,
) -> Result<Redirect, AppError> {
    if form.jumlah_tersedia < 0 {
        return Err(AppError::bad_request("Jumlah kamar tidak boleh negatif."));
    }

    {
        let db = state.db.lock().await;
        update_room_availability(&db, form.id, form.jumlah_tersedia)?;
    }

    Ok(Redirect::to("/kelolaKamar"))
}

pub async fn remove_room(
    State(state): State<Arc<AppState>>,
    Admin(admin): Admin,
    Form(form): Form<RoomIdForm>,
) -> Result<Redirect, AppError> {
    let deleted = {
        let db = state.db.lock().await;
        delete_room(&db, form.id)?
    };
    if deleted {
        info!("{} deleted room type #{}", admin.username, form.id);
    }

    Ok(Redirect::to("/kelolaKamar"))
}
