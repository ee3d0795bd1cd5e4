//! Documentation of a boarding house (kost) room booking portal.
//!
//!
//!
//! # General Infrastructure
//! - Single axum server rendering every page on the server, no frontend build
//! - SQLite file as the only store, opened once and shared behind a mutex
//! - Sessions live in server memory, a restart logs everyone out
//! - Optional Google sign-in next to username/password accounts
//!
//!
//!
//! # Roles
//!
//! - **guest**: browses the dashboard and room catalogue, cannot book
//! - **user**: books rooms, sees own payments, edits own profile
//! - **admin**: manages users, room types and sees every payment
//!
//! Registration always creates a **user**. The first admin comes from the `manage` CLI,
//! later admins are promoted from `/daftarUser`.
//!
//!
//!
//! # Booking
//!
//! A booking takes one unit from the room type and records a payment for the user in one
//! transaction. When the last unit is gone the room shows as Sold Out and further bookings
//! fail with a 400 page.
//!
//!
//!
//! # Setup
//!
//! Create the database and the first admin.
//! ```sh
//! cargo run -p manage -- init
//! cargo run -p manage -- create-admin admin secret --email admin@example.com
//! cargo run -p manage -- add-room Standar 800000 5 --description "Kamar mandi luar"
//! ```
//!
//! Start the server.
//! ```sh
//! RUST_LOG=info cargo run -p kost
//! ```
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//!
//!
//! # Environment
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `3000` |
//! | `DATABASE_PATH` | `kost.db` |
//! | `APP_ENV` | `development`, `production` marks cookies `Secure` |
//! | `SESSION_TTL_HOURS` | `24` |
//! | `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` | unset, Google sign-in disabled |
//! | `GOOGLE_CALLBACK_URL` | `http://localhost:{port}/auth/google/callback` |
//!
//! Google credentials are read from `/run/secrets` first, then from the environment.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::{
    net::TcpListener,
    signal::{
        ctrl_c,
        unix::{signal, SignalKind},
    },
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod database;
pub mod error;
pub mod oauth;
pub mod payments;
pub mod render;
pub mod rooms;
pub mod routes;
pub mod session;
pub mod state;
pub mod users;

use config::Config;
use error::StartupError;
use routes::{admin, auth, booking, pages};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/guest", get(auth::guest))
        .route("/logout", get(auth::logout))
        .route("/auth/google", get(auth::google_start))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/dashboard", get(pages::dashboard))
        .route("/TipeKamar", get(pages::room_types))
        .route("/kamarTersedia", get(pages::available_rooms_page))
        .route("/laporanKeuangan", get(pages::payments))
        .route("/profile", get(pages::profile))
        .route("/profile/update", post(pages::update_own_profile))
        .route("/Form", get(booking::booking_form))
        .route("/submitForm", post(booking::submit_booking))
        .route("/dashboardAdmin", get(admin::dashboard))
        .route("/profileAdmin", get(admin::profile))
        .route("/laporanKeuanganAdmin", get(admin::payments))
        .route("/daftarUser", get(admin::user_list))
        .route("/daftarUser/updateRole", post(admin::update_role))
        .route("/daftarUser/delete", post(admin::delete_user))
        .route("/kelolaKamar", get(admin::manage_rooms))
        .route("/kelolaKamar/add", post(admin::add_room))
        .route("/kelolaKamar/update", post(admin::update_room))
        .route("/kelolaKamar/delete", post(admin::remove_room))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config)?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
