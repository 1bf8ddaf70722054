use std::time::Duration;

use chrono::{DateTime, Utc};
use presence_core::{GeoPoint, TrackingPing};
use thiserror::Error;

use crate::error::Result;
use crate::services::{LedgerOutcome, LedgerService, SharedContext, open_db};

/// Options for one location request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionRequest {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached fix the source may return.
    pub maximum_age: Duration,
}

impl PositionRequest {
    pub const HIGH_ACCURACY: Self = Self {
        high_accuracy: true,
        timeout: Duration::from_secs(15),
        maximum_age: Duration::ZERO,
    };

    pub const LOW_ACCURACY: Self = Self {
        high_accuracy: false,
        timeout: Duration::from_secs(20),
        maximum_age: Duration::from_secs(60),
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub point: GeoPoint,
    pub accuracy: f64,
    /// Acquisition time reported by the source, if any.
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("location permission denied, allow location access and retry")]
    PermissionDenied,
    #[error("location unavailable, turn on location services and try again")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported on this device")]
    Unsupported,
    #[error("location error: {0}")]
    Other(String),
}

impl PositionError {
    /// Errors after which a low-accuracy retry is worth attempting.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, PositionError::Unavailable | PositionError::Timeout)
    }
}

/// Obtains location samples. Implementations own cancellation and timeouts.
pub trait PositionSource {
    fn current_position(
        &mut self,
        request: &PositionRequest,
    ) -> std::result::Result<PositionFix, PositionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleReason {
    NoCurrentEmployee,
    UnknownEmployee,
    NotCheckedIn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    Idle(IdleReason),
    Pinged {
        code: String,
        ping: TrackingPing,
        degraded: bool,
    },
    SignalLost {
        code: String,
        error: PositionError,
    },
}

/// One step of the background poller: sample, classify, record.
#[derive(Clone)]
pub struct MonitorService {
    ctx: SharedContext,
    ledger: LedgerService,
}

impl MonitorService {
    pub(super) fn new(ctx: SharedContext, ledger: LedgerService) -> Self {
        Self { ctx, ledger }
    }

    /// High-accuracy request first, low accuracy when that is unavailable or slow.
    /// Returns the fix and whether the fallback was used.
    pub fn acquire(
        &self,
        source: &mut dyn PositionSource,
    ) -> std::result::Result<(PositionFix, bool), PositionError> {
        match source.current_position(&PositionRequest::HIGH_ACCURACY) {
            Ok(fix) => Ok((fix, false)),
            Err(err) if err.allows_fallback() => {
                tracing::debug!(error = %err, "high accuracy fix failed, retrying with low accuracy");
                source
                    .current_position(&PositionRequest::LOW_ACCURACY)
                    .map(|fix| (fix, true))
            }
            Err(err) => Err(err),
        }
    }

    pub fn tick(&self, source: &mut dyn PositionSource) -> Result<TickReport> {
        let Some(code) = open_db(&self.ctx.config)?.current_employee_code()? else {
            return Ok(TickReport::Idle(IdleReason::NoCurrentEmployee));
        };
        match self.ledger.get_employee(&code)? {
            None => return Ok(TickReport::Idle(IdleReason::UnknownEmployee)),
            Some(employee) if !employee.checked_in => {
                return Ok(TickReport::Idle(IdleReason::NotCheckedIn));
            }
            Some(_) => {}
        }

        match self.acquire(source) {
            Ok((fix, degraded)) => {
                let timestamp = fix.timestamp.unwrap_or_else(|| self.ctx.clock.now());
                let ping =
                    TrackingPing::evaluated(timestamp, fix.point, fix.accuracy, &self.ctx.config.office);
                match self.ledger.record_gps_ping(&code, ping)? {
                    LedgerOutcome::Applied => Ok(TickReport::Pinged {
                        code,
                        ping,
                        degraded,
                    }),
                    LedgerOutcome::UnknownEmployee => {
                        Ok(TickReport::Idle(IdleReason::UnknownEmployee))
                    }
                    LedgerOutcome::NotCheckedIn => Ok(TickReport::Idle(IdleReason::NotCheckedIn)),
                }
            }
            Err(error) => {
                tracing::warn!(code = %code, error = %error, "no location sample for checked-in employee");
                match self.ledger.record_signal_lost(&code)? {
                    LedgerOutcome::Applied => Ok(TickReport::SignalLost { code, error }),
                    LedgerOutcome::UnknownEmployee => {
                        Ok(TickReport::Idle(IdleReason::UnknownEmployee))
                    }
                    LedgerOutcome::NotCheckedIn => Ok(TickReport::Idle(IdleReason::NotCheckedIn)),
                }
            }
        }
    }
}
