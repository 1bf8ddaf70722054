#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use presence_app::{
    AppConfig, AppState, Clock, PositionError, PositionFix, PositionRequest, PositionSource,
};
use presence_core::{GeoPoint, Geofence, TrackingPing};
use tempfile::TempDir;

pub const OFFICE: GeoPoint = GeoPoint {
    lat: 30.0444,
    lng: 31.2357,
};
pub const OFFICE_RADIUS_METERS: f64 = 100.0;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, value: DateTime<Utc>) {
        *self.now.lock().unwrap() = value;
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct TestApp {
    pub _dir: TempDir,
    pub app: AppState,
    pub clock: ManualClock,
}

pub fn setup_app() -> TestApp {
    let dir = tempfile::tempdir().expect("temp dir");
    let clock = ManualClock::new(t0());
    let config = AppConfig {
        db_path: dir.path().join("app.sqlite"),
        office: Geofence::new(OFFICE, OFFICE_RADIUS_METERS),
    };
    let app = AppState::with_clock(config, Arc::new(clock.clone()));
    app.initialize().expect("initialize");
    TestApp {
        _dir: dir,
        app,
        clock,
    }
}

pub fn inside_point() -> GeoPoint {
    GeoPoint::new(OFFICE.lat + 0.0002, OFFICE.lng)
}

pub fn outside_point() -> GeoPoint {
    GeoPoint::new(OFFICE.lat + 0.01, OFFICE.lng)
}

pub fn make_ping(timestamp: DateTime<Utc>, inside_office: bool) -> TrackingPing {
    let point = if inside_office {
        inside_point()
    } else {
        outside_point()
    };
    TrackingPing {
        timestamp,
        lat: point.lat,
        lng: point.lng,
        accuracy: 10.0,
        inside_office,
    }
}

/// Replays scripted responses and records every request it saw.
#[derive(Default)]
pub struct ScriptedSource {
    pub responses: VecDeque<Result<PositionFix, PositionError>>,
    pub requests: Vec<PositionRequest>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<Result<PositionFix, PositionError>>) -> Self {
        Self {
            responses: responses.into(),
            requests: Vec::new(),
        }
    }
}

impl PositionSource for ScriptedSource {
    fn current_position(
        &mut self,
        request: &PositionRequest,
    ) -> Result<PositionFix, PositionError> {
        self.requests.push(*request);
        self.responses
            .pop_front()
            .unwrap_or(Err(PositionError::Unavailable))
    }
}

pub fn fix_at(point: GeoPoint) -> PositionFix {
    PositionFix {
        point,
        accuracy: 12.0,
        timestamp: None,
    }
}
