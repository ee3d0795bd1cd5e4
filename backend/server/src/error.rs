use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{payments::BookingError, render::escape};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::RoomUnavailable(_) => {
                AppError::bad_request("Kamar yang Anda pilih tidak lagi tersedia.")
            }
            BookingError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                format!("<h1>Error</h1><p>{}</p>", escape(message)),
            ),
            AppError::Database(_) | AppError::Hash(_) | AppError::Task(_) => {
                error!("Request failed: {self}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "<h1>Server Error</h1><p>Terjadi kesalahan server. Silakan coba lagi.</p>"
                        .to_string(),
                )
            }
        };

        (status, Html(body)).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid {key} value: {reason}")]
    Config { key: String, reason: String },

    #[error("Failed to open database: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
