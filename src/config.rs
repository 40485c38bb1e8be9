//! Configuração do AUTOFAB carregada a partir de `autofab.toml`.
//!
//! A struct [`AutofabConfig`] contém todos os parâmetros configuráveis,
//! agrupados em seções (`[scan]`, `[report]`, `[board]`, `[palette]`,
//! `[index]`, `[source]`, `[links]`). Valores ausentes usam defaults sensíveis.
//! A variável de ambiente `AUTOFAB_SOURCE_PASSWORD` tem precedência sobre o arquivo.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::AutofabError;
use crate::grid::Palette;

/// Configuração de nível superior carregada de `autofab.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutofabConfig {
    pub scan: ScanConfig,
    pub report: ReportConfig,
    pub board: BoardConfig,
    pub palette: Palette,
    pub index: IndexLayout,
    pub source: SourceConfig,
    pub links: LinkConfig,
}

/// Janela de varredura e parâmetros do scanner.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Quantos identificadores abaixo do high-watermark entram na janela.
    pub window_below: u32,
    /// Quantos identificadores acima do high-watermark entram na janela.
    pub window_above: u32,
    /// High-watermark usado quando o índice ainda não tem nenhum.
    pub initial_watermark: u32,
    /// Número máximo de consultas simultâneas ao sistema de registro.
    pub workers: usize,
    pub lookup_timeout_secs: u64,
    pub interval_minutes: u64,
    /// Habilita a varredura periódica no modo `watch`.
    pub enabled: bool,
    /// Prefixo do nome do job que o marca como comercial.
    pub commercial_prefix: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_below: 1250,
            window_above: 100,
            initial_watermark: 19000,
            workers: 8,
            lookup_timeout_secs: 120,
            interval_minutes: 120,
            enabled: false,
            commercial_prefix: "Commercial".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

/// Relatório diário de atividades.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enabled: bool,
    /// Horário no formato "HH:MM".
    pub time: String,
    pub directory: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "17:00".to_string(),
            directory: PathBuf::from("reports"),
        }
    }
}

impl ReportConfig {
    pub fn time_of_day(&self) -> Result<NaiveTime, AutofabError> {
        NaiveTime::parse_from_str(self.time.trim(), "%H:%M").map_err(|e| {
            AutofabError::Config(format!("invalid report time {:?}: {e}", self.time))
        })
    }
}

/// Colunas (1-indexadas) de um par número/descrição.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SlotColumns {
    pub number: usize,
    pub description: usize,
}

/// Disposição das colunas do quadro.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    /// Coluna cujo fundo identifica uma linha de cabeçalho de dia.
    pub header: usize,
    pub saw: SlotColumns,
    /// Coluna de observações ao lado do slot de serra.
    pub note: usize,
    pub cnc: SlotColumns,
    pub polish: SlotColumns,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            header: 2,
            saw: SlotColumns {
                number: 2,
                description: 3,
            },
            note: 4,
            cnc: SlotColumns {
                number: 6,
                description: 7,
            },
            polish: SlotColumns {
                number: 9,
                description: 10,
            },
        }
    }
}

impl ColumnLayout {
    /// Última coluna usada pelo quadro.
    pub fn last_col(&self) -> usize {
        [
            self.header,
            self.saw.description,
            self.note,
            self.cnc.description,
            self.polish.description,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }

    fn columns(&self) -> [usize; 8] {
        [
            self.header,
            self.saw.number,
            self.saw.description,
            self.note,
            self.cnc.number,
            self.cnc.description,
            self.polish.number,
            self.polish.description,
        ]
    }
}

/// Textos reservados que disparam exceções no fluxo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Marcador (comparado em maiúsculas) que pula a etapa de CNC.
    pub skip_cnc: String,
    /// Frases (comparadas em minúsculas) que significam "instala amanhã".
    pub installs_tomorrow: Vec<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            skip_cnc: "NO CNC".to_string(),
            installs_tomorrow: vec![
                "installs tomorrow".to_string(),
                "installs tom".to_string(),
                "inst tom".to_string(),
            ],
        }
    }
}

/// Parâmetros do quadro de produção.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub sheet: String,
    /// Arquivo JSON com as planilhas (quadro e índice).
    pub workbook: PathBuf,
    pub layout: ColumnLayout,
    pub markers: Markers,
    /// Tamanho da fonte aplicado a um slot recém-movido.
    pub fresh_font_size: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            sheet: "AUTOFAB".to_string(),
            workbook: PathBuf::from("workbook.json"),
            layout: ColumnLayout::default(),
            markers: Markers::default(),
            fresh_font_size: 19,
        }
    }
}

/// Posição do índice de jobs dentro da sua planilha.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexLayout {
    pub sheet: String,
    pub first_row: usize,
    pub first_col: usize,
    pub watermark_row: usize,
    pub watermark_col: usize,
    /// Coluna, na linha do high-watermark, com a data da última varredura.
    pub last_scan_col: usize,
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self {
            sheet: "JobIndex".to_string(),
            first_row: 3,
            first_col: 2,
            watermark_row: 1,
            watermark_col: 2,
            last_scan_col: 3,
        }
    }
}

/// Acesso ao sistema de registro de jobs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// Destino dos hyperlinks adicionados aos números de job.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub base_url: String,
}

impl AutofabConfig {
    /// Carrega a configuração de `autofab.toml` no diretório atual.
    pub fn load() -> Result<Self, AutofabError> {
        Self::load_from(Path::new("autofab.toml"))
    }

    /// Carrega a configuração do caminho informado.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self, AutofabError> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<AutofabConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo para a senha.
        if let Ok(password) = std::env::var("AUTOFAB_SOURCE_PASSWORD") {
            if !password.is_empty() {
                config.source.password = password;
            }
        }

        Ok(config)
    }

    /// Rejeita configurações que tornariam uma varredura sem sentido.
    /// Deve rodar antes de qualquer varredura começar.
    pub fn validate(&self) -> Result<(), AutofabError> {
        if self.scan.workers == 0 {
            return Err(AutofabError::Config("scan.workers must be at least 1".into()));
        }
        if self.scan.interval_minutes == 0 {
            return Err(AutofabError::Config(
                "scan.interval_minutes must be at least 1".into(),
            ));
        }
        if u64::from(self.scan.window_below) + u64::from(self.scan.window_above) == 0 {
            return Err(AutofabError::Config("scan window is empty".into()));
        }
        if self.palette.header.is_empty() {
            return Err(AutofabError::Config(
                "palette.header needs at least one color".into(),
            ));
        }
        if self.board.layout.columns().contains(&0) {
            return Err(AutofabError::Config("board columns are 1-indexed".into()));
        }
        if self.index.first_row == 0 || self.index.first_col == 0 {
            return Err(AutofabError::Config("index position is 1-indexed".into()));
        }
        self.report.time_of_day()?;
        Ok(())
    }
}
