use crate::error::{AppError, Result};
use crate::services::{LedgerService, SharedContext, open_db};
use presence_db::Db;

/// Pointer to the employee logged in on this device. Lives apart from the ledger blob.
#[derive(Clone)]
pub struct CurrentEmployeeService {
    ctx: SharedContext,
    ledger: LedgerService,
}

impl CurrentEmployeeService {
    pub(super) fn new(ctx: SharedContext, ledger: LedgerService) -> Self {
        Self { ctx, ledger }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.ctx.config)
    }

    pub fn current(&self) -> Result<Option<String>> {
        Ok(self.db()?.current_employee_code()?)
    }

    /// Stores the pointer and makes sure the ledger knows the employee.
    pub fn login(&self, code: &str) -> Result<String> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AppError::InvalidInput(
                "employee code must not be empty".to_string(),
            ));
        }
        self.db()?.set_current_employee_code(code)?;
        self.ledger.upsert_employee(code)?;
        tracing::info!(code, "employee logged in on this device");
        Ok(code.to_string())
    }

    pub fn logout(&self) -> Result<Option<String>> {
        let db = self.db()?;
        let previous = db.current_employee_code()?;
        db.clear_current_employee_code()?;
        if let Some(code) = previous.as_deref() {
            tracing::info!(code, "employee logged out on this device");
        }
        Ok(previous)
    }

    pub fn require(&self) -> Result<String> {
        self.current()?
            .ok_or_else(|| AppError::NotFound("no employee is logged in".to_string()))
    }
}
