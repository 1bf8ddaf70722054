use presence_core::AttendanceState;
use rusqlite::{Connection, TransactionBehavior};

use crate::Db;
use crate::error::Result;
use crate::settings::{read_setting, write_setting};

pub const ATTENDANCE_STATE_KEY: &str = "attendance_state";
pub const CURRENT_EMPLOYEE_KEY: &str = "current_employee_code";

/// Ledger state as read from storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateLoad {
    pub state: AttendanceState,
    /// A stored blob existed but could not be decoded and was replaced by the default.
    pub discarded_corrupt: bool,
}

/// Result of [`Db::update_attendance`], available once the transaction committed.
#[derive(Debug)]
pub struct AttendanceUpdate<T> {
    pub value: T,
    /// The state that was stored, `None` when nothing changed.
    pub written: Option<AttendanceState>,
    /// A corrupt blob was overwritten by this update.
    pub replaced_corrupt: bool,
}

pub fn decode_state(raw: &str) -> serde_json::Result<AttendanceState> {
    serde_json::from_str(raw)
}

fn load_state(conn: &Connection) -> Result<StateLoad> {
    let Some(raw) = read_setting(conn, ATTENDANCE_STATE_KEY)? else {
        return Ok(StateLoad::default());
    };
    match decode_state(&raw) {
        Ok(state) => Ok(StateLoad {
            state,
            discarded_corrupt: false,
        }),
        Err(err) => {
            tracing::warn!(
                error = %err,
                bytes = raw.len(),
                "stored attendance state is unreadable, starting from empty state"
            );
            Ok(StateLoad {
                state: AttendanceState::default(),
                discarded_corrupt: true,
            })
        }
    }
}

fn store_state(conn: &Connection, state: &AttendanceState) -> Result<()> {
    let raw = serde_json::to_string(state)?;
    write_setting(conn, ATTENDANCE_STATE_KEY, &raw)
}

impl Db {
    pub fn load_attendance(&self) -> Result<StateLoad> {
        load_state(&self.conn)
    }

    pub fn save_attendance(&self, state: &AttendanceState) -> Result<()> {
        store_state(&self.conn, state)
    }

    /// Read-modify-write of the whole ledger blob in one write transaction.
    ///
    /// The closure receives the loaded state (already reset to the default if the
    /// stored blob was corrupt). The state is written back only when the closure
    /// changed it, so a no-op leaves the stored bytes untouched.
    pub fn update_attendance<T>(
        &mut self,
        apply: impl FnOnce(&mut StateLoad) -> T,
    ) -> Result<AttendanceUpdate<T>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut load = load_state(&tx)?;
        let before = load.state.clone();
        let value = apply(&mut load);
        let written = if load.state != before {
            store_state(&tx, &load.state)?;
            Some(load.state)
        } else {
            None
        };
        tx.commit()?;
        Ok(AttendanceUpdate {
            value,
            replaced_corrupt: load.discarded_corrupt && written.is_some(),
            written,
        })
    }

    pub fn current_employee_code(&self) -> Result<Option<String>> {
        Ok(read_setting(&self.conn, CURRENT_EMPLOYEE_KEY)?.filter(|code| !code.is_empty()))
    }

    pub fn set_current_employee_code(&self, code: &str) -> Result<()> {
        write_setting(&self.conn, CURRENT_EMPLOYEE_KEY, code)
    }

    pub fn clear_current_employee_code(&self) -> Result<()> {
        self.delete_setting(CURRENT_EMPLOYEE_KEY)
    }
}
