use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use presence_core::{AttendanceState, EmployeeAttendance, SessionClose, SessionOpen, TrackingPing};
use presence_db::Db;

use crate::error::Result;
use crate::services::{SharedContext, open_db};
use crate::watch::StateWatch;

/// Result of a ledger mutation. Only `Applied` changed the employee record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Applied,
    UnknownEmployee,
    NotCheckedIn,
}

/// Counts of inconsistent state the ledger repaired instead of rejecting.
#[derive(Debug, Default)]
pub struct RecoveryCounters {
    sessions_recovered: AtomicU64,
    dangling_pointers_cleared: AtomicU64,
    corrupt_state_resets: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoverySnapshot {
    pub sessions_recovered: u64,
    pub dangling_pointers_cleared: u64,
    pub corrupt_state_resets: u64,
}

impl RecoveryCounters {
    pub fn snapshot(&self) -> RecoverySnapshot {
        RecoverySnapshot {
            sessions_recovered: self.sessions_recovered.load(Ordering::Relaxed),
            dangling_pointers_cleared: self.dangling_pointers_cleared.load(Ordering::Relaxed),
            corrupt_state_resets: self.corrupt_state_resets.load(Ordering::Relaxed),
        }
    }
}

/// Repairs made by one mutation, added to the counters after commit.
#[derive(Debug, Default)]
struct Repairs {
    sessions_recovered: u64,
    dangling_pointers_cleared: u64,
}

impl Repairs {
    fn note_session_open(&mut self, code: &str, open: SessionOpen, operation: &'static str) {
        match open {
            SessionOpen::Existing => {}
            SessionOpen::Started => tracing::info!(code, "attendance session started"),
            SessionOpen::Recovered => {
                self.sessions_recovered += 1;
                tracing::warn!(
                    code,
                    operation,
                    "checked-in employee had no usable active session, recovered one"
                );
            }
        }
    }
}

#[derive(Clone)]
pub struct LedgerService {
    ctx: SharedContext,
}

impl LedgerService {
    pub(super) fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.ctx.config)
    }

    pub fn watch(&self) -> &StateWatch {
        &self.ctx.watch
    }

    pub fn recovery(&self) -> RecoverySnapshot {
        self.ctx.recovery.snapshot()
    }

    /// Loads the stored state into the watch without counting as a mutation.
    pub fn prime_watch(&self) -> Result<()> {
        let state = self.get_attendance_state()?;
        self.ctx.watch.publish(state);
        Ok(())
    }

    fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut AttendanceState, DateTime<Utc>, &mut Repairs) -> T,
    ) -> Result<T> {
        let now = self.ctx.clock.now();
        let mut db = self.db()?;
        let mut repairs = Repairs::default();
        let update = db.update_attendance(|load| apply(&mut load.state, now, &mut repairs))?;
        // counted only once the transaction committed
        let recovery = &self.ctx.recovery;
        if update.replaced_corrupt {
            recovery.corrupt_state_resets.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(state) = update.written {
            recovery
                .sessions_recovered
                .fetch_add(repairs.sessions_recovered, Ordering::Relaxed);
            recovery
                .dangling_pointers_cleared
                .fetch_add(repairs.dangling_pointers_cleared, Ordering::Relaxed);
            self.ctx.watch.publish(state);
        }
        Ok(update.value)
    }

    pub fn upsert_employee(&self, code: &str) -> Result<bool> {
        let created = self.mutate(|state, now, _| state.upsert_employee(code, now))?;
        if created {
            tracing::info!(code, "employee attendance record created");
        }
        Ok(created)
    }

    /// Refreshes `lastPing` for a known employee.
    pub fn touch(&self, code: &str) -> Result<LedgerOutcome> {
        self.mutate(|state, now, _| match state.employee_mut(code) {
            Some(employee) => {
                employee.touch(now);
                LedgerOutcome::Applied
            }
            None => unknown(code, "touch"),
        })
    }

    /// Repeated check-ins keep the open session and only refresh timestamps.
    pub fn check_in(&self, code: &str) -> Result<LedgerOutcome> {
        self.mutate(|state, now, repairs| {
            let Some(employee) = state.employee_mut(code) else {
                return unknown(code, "check_in");
            };
            let open = employee.check_in(now);
            repairs.note_session_open(code, open, "check_in");
            LedgerOutcome::Applied
        })
    }

    pub fn check_out(&self, code: &str) -> Result<LedgerOutcome> {
        self.mutate(|state, now, repairs| {
            let Some(employee) = state.employee_mut(code) else {
                return unknown(code, "check_out");
            };
            match employee.check_out(now) {
                SessionClose::Closed(session_id) => {
                    tracing::info!(code, session_id = %session_id, "attendance session closed");
                }
                SessionClose::NoneActive => {
                    tracing::debug!(code, "check-out without an active session");
                }
                SessionClose::Dangling(session_id) => {
                    repairs.dangling_pointers_cleared += 1;
                    tracing::warn!(
                        code,
                        session_id = %session_id,
                        "active session pointer referenced no open session, cleared"
                    );
                }
            }
            LedgerOutcome::Applied
        })
    }

    /// `ping.inside_office` must already be evaluated against the office geofence.
    pub fn record_gps_ping(&self, code: &str, ping: TrackingPing) -> Result<LedgerOutcome> {
        self.mutate(|state, now, repairs| {
            let Some(employee) = state.employee_mut(code) else {
                return unknown(code, "record_gps_ping");
            };
            let Some(record) = employee.record_ping(ping, now) else {
                tracing::debug!(code, "dropping ping for checked-out employee");
                return LedgerOutcome::NotCheckedIn;
            };
            repairs.note_session_open(code, record.session, "record_gps_ping");
            if let Some(kind) = record.transition {
                tracing::info!(code, event = kind.as_str(), at = %ping.timestamp, "geofence transition");
            }
            LedgerOutcome::Applied
        })
    }

    pub fn record_signal_lost(&self, code: &str) -> Result<LedgerOutcome> {
        self.mutate(|state, now, repairs| {
            let Some(employee) = state.employee_mut(code) else {
                return unknown(code, "record_signal_lost");
            };
            let Some(open) = employee.record_signal_lost(now) else {
                tracing::debug!(code, "ignoring signal loss for checked-out employee");
                return LedgerOutcome::NotCheckedIn;
            };
            repairs.note_session_open(code, open, "record_signal_lost");
            tracing::info!(code, at = %now, "signal lost");
            LedgerOutcome::Applied
        })
    }

    pub fn get_employee(&self, code: &str) -> Result<Option<EmployeeAttendance>> {
        let db = self.db()?;
        let load = db.load_attendance()?;
        Ok(load
            .state
            .employees
            .into_iter()
            .find(|employee| employee.code == code))
    }

    pub fn get_attendance_state(&self) -> Result<AttendanceState> {
        let db = self.db()?;
        Ok(db.load_attendance()?.state)
    }
}

fn unknown(code: &str, operation: &'static str) -> LedgerOutcome {
    tracing::debug!(code, operation, "ignoring mutation for unknown employee");
    LedgerOutcome::UnknownEmployee
}
