use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::services::AppServices;
use crate::util::clock::{Clock, SystemClock};
use presence_core::Geofence;
use presence_db::Db;

/// Paths and office settings needed to run the local tracker.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub office: Geofence,
}

/// Application state shared by frontends (CLI, poller).
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db_path: PathBuf, office: Geofence) -> Self {
        Self::with_clock(AppConfig { db_path, office }, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        let services = AppServices::new(&config, clock);
        Self { config, services }
    }

    pub fn setup_db(&self) -> Result<()> {
        setup_db(&self.config.db_path)
    }

    pub fn initialize(&self) -> Result<()> {
        self.setup_db()
            .map_err(|err| AppError::Message(format!("initialize db: {}", err)))?;
        self.services.ledger.prime_watch()?;
        Ok(())
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }
}

pub fn setup_db(path: &std::path::Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
