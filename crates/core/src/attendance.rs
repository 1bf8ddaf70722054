use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{EmployeeAttendance, TrackingEvent, TrackingEventType, TrackingPing, TrackingSession};

/// How the active session was obtained by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOpen {
    /// The pointer already referenced an open session.
    Existing,
    /// A fresh session was started by a regular check-in.
    Started,
    /// The record was inconsistent (checked in without a usable pointer) and a
    /// session had to be adopted or opened.
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionClose {
    Closed(String),
    NoneActive,
    /// The pointer referenced a session that is missing or already closed.
    Dangling(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingRecord {
    pub session: SessionOpen,
    pub transition: Option<TrackingEventType>,
}

pub fn new_session_id(now: DateTime<Utc>, existing: &[TrackingSession]) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let id = format!("{}-{:08x}", now.timestamp_millis(), rng.r#gen::<u32>());
        if !existing.iter().any(|session| session.id == id) {
            return id;
        }
    }
}

fn advance(slot: &mut Option<DateTime<Utc>>, ts: DateTime<Utc>) {
    match slot {
        Some(current) if *current >= ts => {}
        _ => *slot = Some(ts),
    }
}

impl EmployeeAttendance {
    pub fn new(code: &str, now: DateTime<Utc>) -> Self {
        Self {
            code: code.to_string(),
            name: None,
            checked_in: false,
            last_check_in: None,
            last_check_out: None,
            last_ping: Some(now),
            active_session_id: None,
            sessions: Vec::new(),
        }
    }

    fn active_index(&self) -> Option<usize> {
        let id = self.active_session_id.as_deref()?;
        self.sessions
            .iter()
            .position(|session| session.id == id && session.is_open())
    }

    pub fn active_session(&self) -> Option<&TrackingSession> {
        self.active_index().map(|index| &self.sessions[index])
    }

    fn open_session(&mut self, now: DateTime<Utc>) -> usize {
        let id = new_session_id(now, &self.sessions);
        self.sessions.push(TrackingSession {
            id: id.clone(),
            start: now,
            end: None,
            pings: Vec::new(),
            events: Vec::new(),
        });
        self.active_session_id = Some(id);
        self.sessions.len() - 1
    }

    /// Returns the index of the open session, repairing the pointer when needed.
    ///
    /// Repair adopts the most recent open session if one exists, so the record
    /// never ends up with two open sessions.
    pub fn ensure_active_session(&mut self, now: DateTime<Utc>) -> (usize, SessionOpen) {
        if let Some(index) = self.active_index() {
            return (index, SessionOpen::Existing);
        }
        if let Some(index) = self.sessions.iter().rposition(TrackingSession::is_open) {
            self.active_session_id = Some(self.sessions[index].id.clone());
            return (index, SessionOpen::Recovered);
        }
        (self.open_session(now), SessionOpen::Recovered)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        advance(&mut self.last_ping, now);
    }

    /// Idempotent on the session: an already open session is kept as is.
    pub fn check_in(&mut self, now: DateTime<Utc>) -> SessionOpen {
        let consistent_fresh = !self.checked_in && self.active_session_id.is_none();
        self.checked_in = true;
        advance(&mut self.last_check_in, now);
        advance(&mut self.last_ping, now);
        if self.active_index().is_some() {
            return SessionOpen::Existing;
        }
        if consistent_fresh && !self.sessions.iter().any(TrackingSession::is_open) {
            self.open_session(now);
            return SessionOpen::Started;
        }
        self.ensure_active_session(now).1
    }

    pub fn check_out(&mut self, now: DateTime<Utc>) -> SessionClose {
        self.checked_in = false;
        advance(&mut self.last_check_out, now);
        advance(&mut self.last_ping, now);
        let Some(id) = self.active_session_id.take() else {
            return SessionClose::NoneActive;
        };
        match self
            .sessions
            .iter_mut()
            .find(|session| session.id == id && session.is_open())
        {
            Some(session) => {
                session.end = Some(now.max(session.start));
                SessionClose::Closed(id)
            }
            None => SessionClose::Dangling(id),
        }
    }

    /// Appends the ping to the active session. Returns `None` (and changes
    /// nothing) when the employee is not checked in.
    ///
    /// `now` is the ledger clock; a session opened by recovery starts there,
    /// not at the sample's own timestamp.
    pub fn record_ping(&mut self, ping: TrackingPing, now: DateTime<Utc>) -> Option<PingRecord> {
        if !self.checked_in {
            return None;
        }
        let (index, session_open) = self.ensure_active_session(now);
        let session = &mut self.sessions[index];
        let previous_inside = session.last_ping().map(|previous| previous.inside_office);
        let transition = match previous_inside {
            Some(previous) if previous != ping.inside_office => {
                let kind = if ping.inside_office {
                    TrackingEventType::BackInOffice
                } else {
                    TrackingEventType::LeftOffice
                };
                session.events.push(TrackingEvent {
                    timestamp: ping.timestamp,
                    kind,
                });
                Some(kind)
            }
            _ => None,
        };
        session.pings.push(ping);
        advance(&mut self.last_ping, ping.timestamp);
        Some(PingRecord {
            session: session_open,
            transition,
        })
    }

    pub fn record_signal_lost(&mut self, now: DateTime<Utc>) -> Option<SessionOpen> {
        if !self.checked_in {
            return None;
        }
        let (index, session_open) = self.ensure_active_session(now);
        self.sessions[index].events.push(TrackingEvent {
            timestamp: now,
            kind: TrackingEventType::SignalLost,
        });
        advance(&mut self.last_ping, now);
        Some(session_open)
    }
}
