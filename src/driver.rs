//! Periodic drivers: the scan ticker and the end-of-day report timer.

use std::future::Future;
use std::path::PathBuf;

use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use indicatif::ProgressBar;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::board::is_weekend;
use crate::config::AutofabConfig;
use crate::error::AutofabError;
use crate::index::IndexStore;
use crate::scan::{CycleReport, IndexSynchronizer, JobSource};

/// Next weekday moment at `time` strictly after `now`.
pub fn next_report_at(now: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    let mut date = now.date();
    if now.time() >= time {
        date = date + Days::new(1);
    }
    while is_weekend(date) {
        date = date + Days::new(1);
    }
    date.and_time(time)
}

/// Run scans every `scan.interval_minutes` and the daily report at
/// `report.time` until `shutdown` resolves. A shutdown during a scan raises
/// the cancel flag and waits for the cycle to save what it has.
pub async fn run_periodic<S, St, R, F>(
    sync: &IndexSynchronizer<S, St>,
    config: &AutofabConfig,
    report: R,
    shutdown: F,
) -> Result<(), AutofabError>
where
    S: JobSource,
    St: IndexStore,
    R: FnMut(NaiveDate) -> Result<Option<PathBuf>, AutofabError>,
    F: Future<Output = ()>,
{
    run_periodic_with_clock(sync, config, report, shutdown, || Local::now().naive_local()).await
}

/// [`run_periodic`] reading wall-clock time from `clock`.
///
/// The pending report moment survives scans: a report that falls due while a
/// scan is running fires as soon as the scan returns.
pub async fn run_periodic_with_clock<S, St, R, F, C>(
    sync: &IndexSynchronizer<S, St>,
    config: &AutofabConfig,
    mut report: R,
    shutdown: F,
    clock: C,
) -> Result<(), AutofabError>
where
    S: JobSource,
    St: IndexStore,
    R: FnMut(NaiveDate) -> Result<Option<PathBuf>, AutofabError>,
    F: Future<Output = ()>,
    C: Fn() -> NaiveDateTime,
{
    config.validate()?;
    let report_time = config.report.time_of_day()?;
    let mut ticker = tokio::time::interval(config.scan.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(
        scan = config.scan.enabled,
        interval_minutes = config.scan.interval_minutes,
        report = config.report.enabled,
        time = %report_time,
        "periodic drivers started"
    );

    let mut report_at = next_report_at(clock(), report_time);
    loop {
        let until_report = (report_at - clock()).to_std().unwrap_or_default();

        tokio::select! {
            _ = &mut shutdown => break,

            _ = ticker.tick(), if config.scan.enabled => {
                let cycle = sync.run_cycle(clock(), ProgressBar::hidden());
                tokio::pin!(cycle);
                let result = tokio::select! {
                    result = &mut cycle => result,
                    _ = &mut shutdown => {
                        info!("shutdown requested, cancelling scan");
                        sync.cancel_flag().cancel();
                        log_cycle(cycle.await);
                        break;
                    }
                };
                log_cycle(result);
            }

            _ = tokio::time::sleep(until_report), if config.report.enabled => {
                match report(report_at.date()) {
                    Ok(Some(path)) => info!(path = %path.display(), "daily report written"),
                    Ok(None) => info!(date = %report_at.date(), "no section to report on"),
                    Err(e) => warn!(error = %e, "daily report failed"),
                }
                report_at = next_report_at(report_at.max(clock()), report_time);
            }
        }
    }

    info!("periodic drivers stopped");
    Ok(())
}

fn log_cycle(result: Result<CycleReport, AutofabError>) {
    match result {
        Ok(cycle) => info!(
            found = cycle.found,
            watermark = cycle.watermark,
            saved = cycle.saved,
            "scheduled scan done"
        ),
        Err(AutofabError::ScanInProgress) => info!("previous scan still running, skipping tick"),
        Err(e) => warn!(error = %e, "scheduled scan failed"),
    }
}
