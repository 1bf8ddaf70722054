pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod util;
pub mod watch;

pub use app::{AppConfig, AppState};
pub use config::RangeParams;
pub use error::{AppError, Result};
pub use services::{
    AppServices, CurrentEmployeeService, IdleReason, LedgerOutcome, LedgerService,
    MonitorService, PositionError, PositionFix, PositionRequest, PositionSource,
    RecoveryCounters, RecoverySnapshot, ReportService, TickReport,
};
pub use startup::{AppPaths, ensure_app_data_dir};
pub use util::clock::{Clock, SystemClock};
pub use util::time::{normalize_rfc3339_to_utc, resolve_range};
pub use watch::{StateWatch, Subscription};
