use std::sync::Arc;

use async_trait::async_trait;
use tokio::time;

use crate::{plugins::Plugin, prelude::*, state::AppState, sv};

/// Re-runs attribution for completed sales that have none, e.g. because
/// the seller had no active plan when the sale completed.
pub struct Retry;

#[async_trait]
impl Plugin for Retry {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let every = app.config.retry_interval;
    if every.is_zero() {
      info!("Attribution retry disabled via config");
      return Ok(());
    }

    info!(
      "Attribution retry started (interval: {})",
      humantime::format_duration(every)
    );

    let mut interval = time::interval(every);
    loop {
      interval.tick().await;

      match retry_unattributed(&app.db).await {
        Ok(report) if report.is_empty() => trace!("nothing to retry"),
        Ok(report) => info!(
          "attribution retry: {} attributed, {} still failing",
          report.attributed, report.failed
        ),
        Err(err) => error!("attribution retry failed: {}", err),
      }
    }
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
  pub attributed: usize,
  pub failed: usize,
}

impl RetryReport {
  pub fn is_empty(&self) -> bool {
    self.attributed == 0 && self.failed == 0
  }
}

/// One retry pass. A failing sale is logged and skipped.
pub async fn retry_unattributed(
  db: &DatabaseConnection,
) -> Result<RetryReport> {
  let sales = sv::Sale::new(db);
  let mut report = RetryReport::default();

  for sale in sales.unattributed().await? {
    match sv::DbAttributor::for_db(db).attribute(&sale).await {
      Ok(sv::Recorded::Created(_)) => report.attributed += 1,
      Ok(sv::Recorded::Duplicate) => {}
      Err(err @ Error::PlanNotFound(_)) => {
        debug!("sale #{} still unattributed: {}", sale.id, err);
        report.failed += 1;
      }
      Err(err) => {
        warn!("sale #{} attribution failed: {}", sale.id, err);
        report.failed += 1;
      }
    }
  }

  Ok(report)
}
