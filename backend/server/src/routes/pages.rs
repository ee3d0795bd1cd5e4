use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::AppError,
    payments::payments_for_user,
    render::{encode_component, escape, format_date, format_rupiah, format_time, render, Page},
    rooms::{available_rooms, list_rooms, Room},
    session::{Member, Visitor},
    state::AppState,
    users::{update_profile, ProfileUpdate, User},
};

const NO_ROOM_TYPES: &str = r#"<p style="text-align: center;">Tidak ada tipe kamar yang ditemukan.</p>"#;
const NO_ROOMS_AVAILABLE: &str = "<p>Maaf, saat ini tidak ada kamar yang tersedia.</p>";
const NO_PAYMENTS: &str = r#"<tr><td colspan="3">Tidak ada data pembayaran yang ditemukan.</td></tr>"#;
const DEFAULT_EMAIL: &str = "belum_ada@gmail.com";

#[derive(Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_number: String,
}

pub(crate) fn room_image(room: &Room) -> String {
    format!(
        r#"<img src="https://placehold.co/400x250/3498db/ffffff?text={}" alt="Foto Kamar {}">"#,
        encode_component(&room.room_type),
        escape(&room.room_type)
    )
}

fn room_card(room: &Room, visitor: &Visitor) -> String {
    let status_class = if room.is_available() { "" } else { " sold-out" };

    let button = if visitor.is_guest() {
        r#"<a href="/login" class="btn-pesan">Login untuk Memesan</a>"#.to_string()
    } else if room.is_available() {
        format!(
            r#"<a href="/Form?tipe={}&amp;harga={}" class="btn-pesan">Pesan Sekarang</a>"#,
            encode_component(&room.room_type),
            room.price
        )
    } else {
        r#"<button class="btn-pesan sold-out-btn" disabled>Sold Out</button>"#.to_string()
    };

    format!(
        r#"
                    <div class="kamar-item{status_class}">
                        {image}
                        <h3>{room_type}</h3>
                        <p class="harga">Rp {price} / bulan</p>
                        <p>{description}</p>
                        <ul class="fasilitas">
                            <li>Ukuran Standar</li>
                            <li>Kamar Mandi Dalam</li>
                            <li>Fasilitas: AC, Lemari, Meja Belajar, Wifi</li>
                        </ul>
                        {button}
                    </div>"#,
        image = room_image(room),
        room_type = escape(&room.room_type),
        price = format_rupiah(room.price),
        description = escape(&room.description),
    )
}

fn room_cards(rooms: &[Room], visitor: &Visitor, empty: &str) -> String {
    if rooms.is_empty() {
        return empty.to_string();
    }

    rooms.iter().map(|room| room_card(room, visitor)).collect()
}

pub(crate) fn profile_page(page: Page, user: &User) -> Html<String> {
    let username = escape(&user.username);
    let first_name = escape(user.first_name.as_deref().unwrap_or_default());
    let last_name = escape(user.last_name.as_deref().unwrap_or_default());
    let email = escape(
        user.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or(DEFAULT_EMAIL),
    );
    let phone_number = escape(user.phone_number.as_deref().unwrap_or_default());

    Html(render(
        page,
        &[
            ("username", username.as_str()),
            ("firstName", first_name.as_str()),
            ("lastName", last_name.as_str()),
            ("email", email.as_str()),
            ("phoneNumber", phone_number.as_str()),
            ("role", user.role.as_str()),
        ],
    ))
}

pub async fn dashboard(State(state): State<Arc<AppState>>, visitor: Visitor) -> Result<Response, AppError> {
    if let Visitor::Member(user) = &visitor {
        if user.is_admin() {
            return Ok(Redirect::to("/dashboardAdmin").into_response());
        }
    }

    let available = {
        let db = state.db.lock().await;
        available_rooms(&db)?.len()
    };

    let username = escape(visitor.username());
    let html = render(
        Page::Dashboard,
        &[
            ("username", username.as_str()),
            ("role", visitor.role()),
            ("jumlahTersedia", available.to_string().as_str()),
        ],
    );

    Ok(Html(html).into_response())
}

pub async fn room_types(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Query(query): Query<SearchQuery>,
) -> Result<Html<String>, AppError> {
    let rooms = {
        let db = state.db.lock().await;
        list_rooms(&db, &query.search)?
    };

    let username = escape(visitor.username());
    let cards = room_cards(&rooms, &visitor, NO_ROOM_TYPES);
    let search = escape(&query.search);

    Ok(Html(render(
        Page::RoomTypes,
        &[("username", username.as_str()), ("kamarList", cards.as_str()), ("searchQuery", search.as_str())],
    )))
}

pub async fn available_rooms_page(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
) -> Result<Html<String>, AppError> {
    let rooms = {
        let db = state.db.lock().await;
        available_rooms(&db)?
    };

    let username = escape(visitor.username());
    let cards = room_cards(&rooms, &visitor, NO_ROOMS_AVAILABLE);

    Ok(Html(render(
        Page::AvailableRooms,
        &[("username", username.as_str()), ("kamarList", cards.as_str())],
    )))
}

pub async fn payments(State(state): State<Arc<AppState>>, Member(user): Member) -> Result<Html<String>, AppError> {
    let payments = {
        let db = state.db.lock().await;
        payments_for_user(&db, user.user_id)?
    };

    let rows = if payments.is_empty() {
        NO_PAYMENTS.to_string()
    } else {
        payments
            .iter()
            .map(|payment| {
                format!(
                    "
                    <tr>
                        <td>{}</td>
                        <td>{}</td>
                        <td>{}</td>
                    </tr>",
                    format_date(payment.paid_at),
                    format_time(payment.paid_at),
                    escape(&payment.room_type)
                )
            })
            .collect()
    };

    let username = escape(&user.username);

    Ok(Html(render(Page::Payments, &[("username", username.as_str()), ("rows", rows.as_str())])))
}

pub async fn profile(Member(user): Member) -> Response {
    if user.is_admin() {
        return Redirect::to("/profileAdmin").into_response();
    }

    profile_page(Page::Profile, &user).into_response()
}

pub async fn update_own_profile(
    State(state): State<Arc<AppState>>,
    Member(user): Member,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    {
        let db = state.db.lock().await;
        update_profile(
            &db,
            user.user_id,
            &ProfileUpdate {
                first_name: form.first_name.trim(),
                last_name: form.last_name.trim(),
                email: form.email.trim(),
                phone_number: form.phone_number.trim(),
            },
        )?;
    }
    info!("User {} updated their profile", user.username);

    Ok(Redirect::to(if user.is_admin() { "/profileAdmin" } else { "/profile" }))
}
