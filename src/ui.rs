//! Interface de terminal do AUTOFAB: barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para a barra de progresso da varredura e
//! `console` para estilização com cores. O [`ScanProgress`] acompanha
//! visualmente um ciclo de varredura no terminal.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::board::{DailySummary, MoveOutcome, SectionIndex, Stage, Transition};
use crate::index::StoredIndex;
use crate::scan::CycleReport;

/// Indicador visual de progresso para um ciclo de varredura.
///
/// Exibe uma barra com identificadores processados durante a varredura e
/// mensagens coloridas para sucesso (verde), falha (vermelho) e avisos (amarelo).
pub struct ScanProgress {
    // Barra de progresso do indicatif.
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl ScanProgress {
    /// Cria a barra; o tamanho é definido pelo scanner ao iniciar.
    pub fn start() -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} jobs ({eta})")
                .expect("invalid template")
                .progress_chars("=> "),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Cópia da barra para entregar ao scanner.
    pub fn bar(&self) -> ProgressBar {
        self.pb.clone()
    }

    /// Finaliza a barra e exibe o resumo do ciclo.
    pub fn complete(&self, cycle: &CycleReport) {
        self.pb.finish_and_clear();
        println!(
            "  {} Scanned {} ids, found {} jobs, index now holds {}",
            self.green.apply_to("✓"),
            cycle.scanned,
            cycle.found,
            cycle.entries
        );
        println!("  High-watermark: {}", cycle.watermark);
        if cycle.failures > 0 {
            println!("  {} {} lookups failed", self.yellow.apply_to("!"), cycle.failures);
        }
        if cycle.cancelled {
            println!("  {} Scan cancelled, partial results kept", self.yellow.apply_to("!"));
        }
        if !cycle.saved {
            println!(
                "  {} Job index not saved, will retry next cycle",
                self.red.apply_to("✗")
            );
        }
    }
}

/// Imprime uma transição de etapa aplicada ao quadro.
pub fn print_transition(transition: &Transition) {
    let (label, job, moves): (&str, _, Vec<(Stage, &MoveOutcome)>) = match transition {
        Transition::SawToCnc { job, cnc } => ("SAW → CNC", job, vec![(Stage::Cnc, cnc)]),
        Transition::SkipCnc { job, cnc, polish } => {
            let mut moves = vec![(Stage::Cnc, cnc)];
            moves.extend(polish.iter().map(|p| (Stage::Polish, p)));
            ("SAW → POLISH (no CNC)", job, moves)
        }
        Transition::CncToPolish { job, polish } => {
            ("CNC → POLISH", job, vec![(Stage::Polish, polish)])
        }
        Transition::InstallsTomorrow { job, polish } => {
            ("INSTALLS TOMORROW", job, vec![(Stage::Polish, polish)])
        }
    };
    println!("{} {job}", Style::new().cyan().bold().apply_to(label));
    for (stage, outcome) in moves {
        print_move(stage, outcome);
    }
}

/// Imprime o resultado de uma movimentação.
pub fn print_move(stage: Stage, outcome: &MoveOutcome) {
    let mark = match outcome {
        MoveOutcome::Placed { .. } => Style::new().green().bold().apply_to("✓"),
        MoveOutcome::Duplicate { .. } => Style::new().yellow().apply_to("="),
        MoveOutcome::Full | MoveOutcome::NoSection => Style::new().red().bold().apply_to("✗"),
    };
    println!("  {mark} {stage}: {outcome}");
}

/// Lista as seções de dia encontradas no quadro.
pub fn print_sections(sections: &SectionIndex) {
    if sections.is_empty() {
        println!("No date sections found");
        return;
    }
    let dim = Style::new().dim();
    for section in sections.sections() {
        let date = section
            .date
            .map(|d| d.format("%a %m/%d/%Y").to_string())
            .unwrap_or_else(|| "no date".to_string());
        println!(
            "{:<16} {} {}",
            date,
            dim.apply_to(format!("rows {}-{}", section.start_row, section.end_row)),
            section.header_text
        );
    }
}

/// Imprime o estado do índice de jobs.
pub fn print_status(stored: &StoredIndex, prefix: &str) {
    let bold = Style::new().bold();
    println!("{}", bold.apply_to("─── Job Index ───"));
    println!("  Entries:        {}", stored.index.len());
    println!("  High-watermark: {}", stored.watermark);
    println!(
        "  Last scan:      {}",
        stored
            .last_scan
            .map(|at| at.format("%m/%d/%Y %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "  Commercial:     {}",
        stored.index.commercial_ids(prefix).len()
    );
}

/// Imprime o resumo diário gerado.
pub fn print_summary(summary: &DailySummary) {
    print!("{}", summary.render());
}
