mod attendance;
mod geofence;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use attendance::{PingRecord, SessionClose, SessionOpen, new_session_id};
pub use geofence::{EARTH_RADIUS_METERS, GeoPoint, Geofence, haversine_distance_meters, inside_geofence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackingEventType {
    LeftOffice,
    BackInOffice,
    SignalLost,
}

impl TrackingEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingEventType::LeftOffice => "LeftOffice",
            TrackingEventType::BackInOffice => "BackInOffice",
            TrackingEventType::SignalLost => "SignalLost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingPing {
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f64,
    pub inside_office: bool,
}

impl TrackingPing {
    /// Classifies the sample against `office` and builds the ping.
    pub fn evaluated(
        timestamp: DateTime<Utc>,
        point: GeoPoint,
        accuracy: f64,
        office: &Geofence,
    ) -> Self {
        Self {
            timestamp,
            lat: point.lat,
            lng: point.lng,
            accuracy,
            inside_office: office.contains(point),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TrackingEventType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSession {
    pub id: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pings: Vec<TrackingPing>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeAttendance {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default)]
    pub last_check_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_check_out: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_ping: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_session_id: Option<String>,
    #[serde(default)]
    pub sessions: Vec<TrackingSession>,
}

/// Everything persisted under the ledger storage key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceState {
    pub employees: Vec<EmployeeAttendance>,
}

impl AttendanceState {
    pub fn employee(&self, code: &str) -> Option<&EmployeeAttendance> {
        self.employees.iter().find(|employee| employee.code == code)
    }

    pub fn employee_mut(&mut self, code: &str) -> Option<&mut EmployeeAttendance> {
        self.employees
            .iter_mut()
            .find(|employee| employee.code == code)
    }

    /// Returns true when a new record was created.
    pub fn upsert_employee(&mut self, code: &str, now: DateTime<Utc>) -> bool {
        if let Some(existing) = self.employee_mut(code) {
            existing.touch(now);
            return false;
        }
        self.employees.push(EmployeeAttendance::new(code, now));
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Both bounds are inclusive, so a range ending at `now` covers `now`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub employee_code: String,
    pub session_id: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub ping_count: usize,
    pub left_office_count: usize,
    pub back_in_office_count: usize,
    pub signal_lost_count: usize,
    pub seconds_outside: i64,
}

impl TrackingSession {
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    pub fn last_ping(&self) -> Option<&TrackingPing> {
        self.pings.last()
    }

    pub fn event_count(&self, kind: TrackingEventType) -> usize {
        self.events.iter().filter(|event| event.kind == kind).count()
    }

    /// Open sessions are measured up to `now`.
    pub fn summary(&self, employee_code: &str, now: DateTime<Utc>) -> SessionSummary {
        let until = self.end.unwrap_or(now);
        let mut outside_since: Option<DateTime<Utc>> = None;
        let mut seconds_outside = 0i64;
        for event in &self.events {
            match event.kind {
                TrackingEventType::LeftOffice => {
                    outside_since.get_or_insert(event.timestamp);
                }
                TrackingEventType::BackInOffice => {
                    if let Some(since) = outside_since.take() {
                        seconds_outside += (event.timestamp - since).num_seconds().max(0);
                    }
                }
                TrackingEventType::SignalLost => {}
            }
        }
        if let Some(since) = outside_since {
            seconds_outside += (until - since).num_seconds().max(0);
        }
        SessionSummary {
            employee_code: employee_code.to_string(),
            session_id: self.id.clone(),
            start: self.start,
            end: self.end,
            duration_seconds: (until - self.start).num_seconds().max(0),
            ping_count: self.pings.len(),
            left_office_count: self.event_count(TrackingEventType::LeftOffice),
            back_in_office_count: self.event_count(TrackingEventType::BackInOffice),
            signal_lost_count: self.event_count(TrackingEventType::SignalLost),
            seconds_outside,
        }
    }
}
