use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::{
    error::AppError,
    payments::book_room,
    render::{escape, format_iso_date, format_rupiah, render, Page},
    session::Member,
    state::AppState,
};

#[derive(Deserialize)]
pub struct BookingQuery {
    tipe: Option<String>,
    harga: Option<String>,
}

#[derive(Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    tipe_kamar: String,
    #[serde(default)]
    durasi: String,
    #[serde(default)]
    tanggal_masuk: String,
}

pub async fn booking_form(
    Member(user): Member,
    Query(query): Query<BookingQuery>,
) -> Result<Html<String>, AppError> {
    let invalid = || AppError::bad_request("Parameter tipe dan harga tidak valid.");

    let room_type = query
        .tipe
        .as_deref()
        .map(str::trim)
        .filter(|tipe| !tipe.is_empty())
        .ok_or_else(invalid)?;
    let price = query
        .harga
        .as_deref()
        .map(str::trim)
        .filter(|harga| !harga.is_empty())
        .ok_or_else(invalid)?;

    let username = escape(&user.username);
    let name = escape(&user.full_name());
    let email = escape(user.email.as_deref().unwrap_or_default());
    let today = format_iso_date(Utc::now());
    let room_type = escape(room_type);
    // Links from the catalogue carry a plain number; anything else is shown as given.
    let price = match price.parse::<i64>() {
        Ok(amount) => format_rupiah(amount),
        Err(_) => escape(price),
    };

    Ok(Html(render(
        Page::BookingForm,
        &[
            ("username", username.as_str()),
            ("nama", name.as_str()),
            ("email", email.as_str()),
            ("tanggal_sewa", today.as_str()),
            ("tipe_kamar", room_type.as_str()),
            ("hargaKamar", price.as_str()),
        ],
    )))
}

pub async fn submit_booking(
    State(state): State<Arc<AppState>>,
    Member(user): Member,
    Form(form): Form<BookingForm>,
) -> Result<Redirect, AppError> {
    let room_type = form.tipe_kamar.trim();

    {
        let mut db = state.db.lock().await;
        book_room(&mut db, user.user_id, room_type, Utc::now())?;
    }
    info!(
        "User {} booked {room_type} from {:?} for {:?} month(s)",
        user.username, form.tanggal_masuk, form.durasi
    );

    Ok(Redirect::to("/laporanKeuangan"))
}
