//! Layered settings: built-in defaults, optional TOML file, `TARIFFA__*` env.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tariffa_core::tariff::TariffColumns;
use tariffa_store::TableOptions;

pub const DEFAULT_LABORATORY: &str = "Laboratorio di analisi cliniche MONTEMURRO - Matera";

/// Settings file looked up in the working directory when `--config` is absent.
const DEFAULT_CONFIG_NAME: &str = "tariffa";

const ENV_PREFIX: &str = "TARIFFA";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub laboratory: String,
    pub table: TableSettings,
    pub pdf: PdfSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub path: PathBuf,
    pub delimiter: String,
    pub code_column: String,
    pub description_column: String,
    pub price_column: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// TrueType font embedded in the PDF (e.g. DejaVuSans.ttf).
    pub font: Option<PathBuf>,
    /// Bold variant; falls back to `font`.
    pub bold_font: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "warn".into(),
            laboratory: DEFAULT_LABORATORY.into(),
            table: TableSettings::default(),
            pdf: PdfSettings::default(),
        }
    }
}

impl Default for TableSettings {
    fn default() -> Self {
        let columns = TariffColumns::default();
        Self {
            path: PathBuf::from("TariffarioRegionePuglia.csv"),
            delimiter: ",".into(),
            code_column: columns.code,
            description_column: columns.description,
            price_column: columns.price,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default
    /// `tariffa.toml` is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let settings: Settings = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("parsing configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.laboratory.trim().is_empty() {
            anyhow::bail!("laboratory name cannot be empty");
        }
        self.table.delimiter_byte()?;
        for (key, value) in [
            ("table.code_column", &self.table.code_column),
            ("table.description_column", &self.table.description_column),
            ("table.price_column", &self.table.price_column),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{key} cannot be empty");
            }
        }
        Ok(())
    }
}

impl TableSettings {
    /// The delimiter as a single ASCII byte. `\t` is accepted for tabs.
    pub fn delimiter_byte(&self) -> anyhow::Result<u8> {
        match self.delimiter.as_str() {
            "\\t" | "\t" => Ok(b'\t'),
            d if d.len() == 1 && d.is_ascii() => Ok(d.as_bytes()[0]),
            d => anyhow::bail!("table.delimiter must be a single ASCII character, got {d:?}"),
        }
    }

    pub fn options(&self) -> anyhow::Result<TableOptions> {
        Ok(TableOptions {
            delimiter: self.delimiter_byte()?,
            columns: TariffColumns {
                code: self.code_column.clone(),
                description: self.description_column.clone(),
                price: self.price_column.clone(),
            },
        })
    }
}
