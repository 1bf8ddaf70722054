mod attendance;
mod error;
mod migrations;
mod settings;

use std::path::Path;

use rusqlite::Connection;

pub use attendance::{
    ATTENDANCE_STATE_KEY, AttendanceUpdate, CURRENT_EMPLOYEE_KEY, StateLoad, decode_state,
};
pub use error::{DbError, Result};

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "busy_timeout", 5_000)?;
        Ok(Self { conn })
    }
}
