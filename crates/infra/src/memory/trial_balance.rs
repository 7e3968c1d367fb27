//! In-memory trial-balance period store.

use std::sync::Mutex;

use chrono::NaiveDate;

use ledgerpost_core::LedgerResult;
use ledgerpost_journal::{TrialBalancePeriod, TrialBalanceStore};

#[derive(Debug, Default)]
pub struct InMemoryTrialBalance {
    periods: Mutex<Vec<TrialBalancePeriod>>,
}

impl InMemoryTrialBalance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_period(self, year: i32, month: u32) -> Self {
        self.periods.lock().unwrap().push(TrialBalancePeriod {
            id: format!("tb-{year}-{month:02}"),
            year,
            month,
            open: true,
            last_adjusted_on: None,
        });
        self
    }

    pub fn period(&self, period_id: &str) -> Option<TrialBalancePeriod> {
        self.periods
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == period_id)
            .cloned()
    }
}

impl TrialBalanceStore for InMemoryTrialBalance {
    fn open_period(&self, year: i32, month: u32) -> LedgerResult<Option<TrialBalancePeriod>> {
        Ok(self
            .periods
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.open && p.year == year && p.month == month)
            .cloned())
    }

    fn mark_adjusted(&self, period_id: &str, on: NaiveDate) -> LedgerResult<bool> {
        let mut periods = self.periods.lock().unwrap();
        let Some(period) = periods.iter_mut().find(|p| p.id == period_id) else {
            return Ok(false);
        };
        if period.last_adjusted_on == Some(on) {
            return Ok(false);
        }
        period.last_adjusted_on = Some(on);
        Ok(true)
    }
}
