use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use autofab::board::{
    CellChange, DailySummary, LinkIndex, SectionIndex, Stage, TransitionEngine, focus_today,
};
use autofab::cli::{Cli, Command};
use autofab::config::AutofabConfig;
use autofab::driver::run_periodic;
use autofab::error::AutofabError;
use autofab::grid::{CellWrite, ColorTag, Grid, Workbook};
use autofab::index::{IndexStore, StoredIndex, WorkbookStore};
use autofab::scan::{HttpJobSource, IndexSynchronizer};
use autofab::ui::{self, ScanProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AutofabConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate().context("invalid configuration")?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Scan => {
            let sync = synchronizer(&config)?;
            let progress = ScanProgress::start();
            let cycle = sync
                .run_cycle(Local::now().naive_local(), progress.bar())
                .await?;
            progress.complete(&cycle);
        }
        Command::Watch => {
            let sync = synchronizer(&config)?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };
            run_periodic(&sync, &config, |date| write_report(&config, date), shutdown).await?;
        }
        Command::Edit {
            row,
            col,
            value,
            font,
        } => {
            let stored = load_index(&config)?;
            let links = LinkIndex::new(&config.links.base_url, &stored.index);
            let mut book = load_workbook(&config)?;
            let sheet = book.sheet_mut(&config.board.sheet)?;

            let mut write = CellWrite::default();
            write.value = value;
            write.font = font.map(ColorTag::from);
            sheet.write_cell(row, col, write)?;
            let cell = sheet.read_cell(row, col);
            let change = CellChange {
                row,
                col,
                value: cell.value,
                font: cell.font,
            };

            let transitions = TransitionEngine::new(sheet, &config.board, &links)
                .apply(&change, today)?;
            if transitions.is_empty() {
                println!("No transition triggered");
            }
            for transition in &transitions {
                ui::print_transition(transition);
            }
            book.save(&config.board.workbook)?;
        }
        Command::Sections => {
            let book = load_workbook(&config)?;
            let sheet = book.sheet(&config.board.sheet)?;
            ui::print_sections(&SectionIndex::locate(sheet, &config.board.layout));
        }
        Command::Focus => {
            let mut book = load_workbook(&config)?;
            let sheet = book.sheet_mut(&config.board.sheet)?;
            match focus_today(sheet, &config.board.layout, today)? {
                Some(row) => {
                    book.save(&config.board.workbook)?;
                    println!("Focused today's section at row {row}");
                }
                None => println!("No section for {}", today.format("%m/%d/%Y")),
            }
        }
        Command::ScheduleInstalls => {
            let stored = load_index(&config)?;
            let links = LinkIndex::new(&config.links.base_url, &stored.index);
            let mut book = load_workbook(&config)?;
            let sheet = book.sheet_mut(&config.board.sheet)?;

            let placed = TransitionEngine::new(sheet, &config.board, &links)
                .schedule_installs(&stored.index, today)?;
            for (job, outcome) in &placed {
                println!("{job}");
                ui::print_move(Stage::Polish, outcome);
            }
            book.save(&config.board.workbook)?;
        }
        Command::Report => {
            let book = load_workbook(&config)?;
            let sheet = book.sheet(&config.board.sheet)?;
            match DailySummary::collect(sheet, &config.board, today) {
                Some(summary) => {
                    ui::print_summary(&summary);
                    let path = summary.write_to(&config.report.directory)?;
                    println!("Daily summary saved to {}", path.display());
                }
                None => println!("No section for {}", today.format("%m/%d/%Y")),
            }
        }
        Command::Status => {
            let sync = synchronizer(&config)?;
            let stored = sync.snapshot().await?;
            ui::print_status(&stored, &config.scan.commercial_prefix);
            println!(
                "  Periodic scan:  {}",
                if config.scan.enabled {
                    format!("every {} minutes", config.scan.interval_minutes)
                } else {
                    "disabled".to_string()
                }
            );
            println!(
                "  Daily summary:  {}",
                if config.report.enabled {
                    format!("at {}", config.report.time)
                } else {
                    "disabled".to_string()
                }
            );
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "autofab=debug" } else { "autofab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn store(config: &AutofabConfig) -> WorkbookStore {
    WorkbookStore::new(
        &config.board.workbook,
        config.palette.clone(),
        config.index.clone(),
    )
}

fn synchronizer(
    config: &AutofabConfig,
) -> Result<IndexSynchronizer<HttpJobSource, WorkbookStore>> {
    let source = HttpJobSource::new(&config.source, config.scan.lookup_timeout())
        .context("building system-of-record client")?;
    Ok(IndexSynchronizer::new(
        source,
        store(config),
        config.scan.clone(),
    ))
}

fn load_index(config: &AutofabConfig) -> Result<StoredIndex> {
    store(config).load().context("loading job index")
}

fn load_workbook(config: &AutofabConfig) -> Result<Workbook> {
    Workbook::load(&config.board.workbook, &config.palette)
        .with_context(|| format!("loading {}", config.board.workbook.display()))
}

fn write_report(config: &AutofabConfig, date: NaiveDate) -> Result<Option<PathBuf>, AutofabError> {
    let book = Workbook::load(&config.board.workbook, &config.palette)?;
    let sheet = book.sheet(&config.board.sheet)?;
    match DailySummary::collect(sheet, &config.board, date) {
        Some(summary) => summary.write_to(&config.report.directory).map(Some),
        None => Ok(None),
    }
}
