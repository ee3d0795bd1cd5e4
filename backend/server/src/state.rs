use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::info;

use super::{config::Config, database::init_db, error::StartupError, session::Sessions};

pub struct AppState {
    pub config: Config,
    pub db: Mutex<Connection>,
    pub sessions: Sessions,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let connection = init_db(&config.database_path)?;
        info!("Database ready at {}", config.database_path);

        Ok(Self::with_connection(config, connection))
    }

    pub fn with_connection(config: Config, connection: Connection) -> Arc<Self> {
        let sessions = Sessions::new(config.session_ttl);

        Arc::new(Self {
            config,
            db: Mutex::new(connection),
            sessions,
            http: reqwest::Client::new(),
        })
    }
}
