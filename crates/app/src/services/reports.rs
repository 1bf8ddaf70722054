use presence_core::{SessionSummary, TimeRange};
use presence_db::Db;

use crate::error::Result;
use crate::services::{SharedContext, open_db};

#[derive(Clone)]
pub struct ReportService {
    ctx: SharedContext,
}

impl ReportService {
    pub(super) fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    fn db(&self) -> Result<Db> {
        open_db(&self.ctx.config)
    }

    /// Sessions that started inside `range`, oldest first.
    pub fn sessions(&self, range: &TimeRange) -> Result<Vec<SessionSummary>> {
        let state = self.db()?.load_attendance()?.state;
        let now = self.ctx.clock.now();
        let mut summaries: Vec<SessionSummary> = state
            .employees
            .iter()
            .flat_map(|employee| {
                employee
                    .sessions
                    .iter()
                    .filter(|session| range.contains(session.start))
                    .map(|session| session.summary(&employee.code, now))
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.employee_code.cmp(&b.employee_code))
        });
        Ok(summaries)
    }

    pub fn employee_sessions(&self, code: &str, range: &TimeRange) -> Result<Vec<SessionSummary>> {
        Ok(self
            .sessions(range)?
            .into_iter()
            .filter(|summary| summary.employee_code == code)
            .collect())
    }
}
