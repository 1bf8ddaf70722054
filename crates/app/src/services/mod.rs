mod current_employee;
mod ledger;
mod monitor;
mod reports;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use crate::util::clock::Clock;
use crate::watch::StateWatch;
use presence_db::Db;

pub use current_employee::CurrentEmployeeService;
pub use ledger::{LedgerOutcome, LedgerService, RecoveryCounters, RecoverySnapshot};
pub use monitor::{
    IdleReason, MonitorService, PositionError, PositionFix, PositionRequest, PositionSource,
    TickReport,
};
pub use reports::ReportService;

/// Everything the services share: config, clock, state watch and recovery counters.
pub(crate) struct ServiceContext {
    pub(crate) config: AppConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) watch: StateWatch,
    pub(crate) recovery: RecoveryCounters,
}

type SharedContext = Arc<ServiceContext>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub ledger: LedgerService,
    pub current_employee: CurrentEmployeeService,
    pub monitor: MonitorService,
    pub reports: ReportService,
}

impl AppServices {
    pub fn new(config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let shared = Arc::new(ServiceContext {
            config: config.clone(),
            clock,
            watch: StateWatch::new(),
            recovery: RecoveryCounters::default(),
        });
        let ledger = LedgerService::new(shared.clone());
        Self {
            current_employee: CurrentEmployeeService::new(shared.clone(), ledger.clone()),
            monitor: MonitorService::new(shared.clone(), ledger.clone()),
            reports: ReportService::new(shared),
            ledger,
        }
    }
}

fn open_db(config: &AppConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
