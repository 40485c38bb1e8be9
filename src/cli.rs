//! Interface de linha de comando do AUTOFAB baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (scan, watch, edit,
//! sections, focus, schedule-installs, report, status) e flags globais
//! (--config, --verbose).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::grid::ColorTag;

/// AUTOFAB: automação do quadro de produção da fábrica.
#[derive(Debug, Parser)]
#[command(name = "autofab", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho do arquivo de configuração.
    #[arg(long, global = true, default_value = "autofab.toml")]
    pub config: PathBuf,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Cor de fonte aceita pela CLI, mapeada para [`ColorTag`] internamente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FontArg {
    /// Cor que marca a etapa como concluída.
    Advance,
    /// Cor padrão (preto).
    Ink,
}

impl From<FontArg> for ColorTag {
    fn from(arg: FontArg) -> Self {
        match arg {
            FontArg::Advance => ColorTag::Advance,
            FontArg::Ink => ColorTag::Ink,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Executa um ciclo de varredura e atualiza o índice de jobs.
    Scan,

    /// Roda os disparos periódicos (varredura e relatório) até Ctrl-C.
    Watch,

    /// Aplica uma edição de célula ao quadro e dispara as transições.
    Edit {
        /// Linha da célula (1-indexada).
        #[arg(long)]
        row: usize,

        /// Coluna da célula (1-indexada).
        #[arg(long)]
        col: usize,

        /// Novo valor; mantém o atual se omitido.
        #[arg(long)]
        value: Option<String>,

        /// Nova cor de fonte; mantém a atual se omitida.
        #[arg(long, value_enum)]
        font: Option<FontArg>,
    },

    /// Lista as seções de dia do quadro.
    Sections,

    /// Posiciona o quadro na seção de hoje.
    Focus,

    /// Coloca em Polish os jobs com instalação no próximo dia útil.
    ScheduleInstalls,

    /// Gera o resumo diário de atividades.
    Report,

    /// Mostra o estado do índice de jobs.
    Status,
}
