#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use presence_core::{AttendanceState, TrackingPing};
use presence_db::Db;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let mut db = Db::open(&path).expect("open db");
    db.migrate().expect("migrate db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub fn make_ping(timestamp: DateTime<Utc>, inside_office: bool) -> TrackingPing {
    TrackingPing {
        timestamp,
        lat: 30.0444,
        lng: 31.2357,
        accuracy: 8.5,
        inside_office,
    }
}

pub fn checked_in_state(code: &str) -> AttendanceState {
    let mut state = AttendanceState::default();
    state.upsert_employee(code, t0());
    let employee = state.employee_mut(code).expect("employee");
    employee.check_in(t0());
    let at = t0() + chrono::Duration::minutes(1);
    employee.record_ping(make_ping(at, true), at);
    state
}
