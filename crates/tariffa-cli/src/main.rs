mod display;
mod pdf;
mod settings;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tariffa_core::PriceTable;
use tariffa_store::load_price_table;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

/// Prefix of the user-facing message for a failed estimate.
const GENERATION_FAILED: &str = "Errore durante la generazione del preventivo";

#[derive(Parser)]
#[command(name = "tariffa", version, about = "Cost estimates from regional tariff codes")]
struct Cli {
    /// Settings file (default: ./tariffa.toml if present).
    #[arg(long, global = true, env = "TARIFFA_CONFIG")]
    config: Option<PathBuf>,

    /// Price table file, overriding `table.path`.
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an estimate for a list of regional codes.
    Estimate {
        /// Codes separated by commas or hyphens. Read from stdin when omitted.
        codes: Vec<String>,

        /// Add the blood draw surcharge.
        #[arg(long)]
        draw: bool,

        /// Also write the text estimate to this file.
        #[arg(long, value_name = "FILE")]
        text: Option<PathBuf>,

        /// Also write the PDF estimate to this file.
        #[arg(long, value_name = "FILE")]
        pdf: Option<PathBuf>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show price-table entries by code.
    Lookup {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Show price-table statistics.
    Stats,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&settings.log_level);
    tracing::debug!("tariffa v{}", env!("CARGO_PKG_VERSION"));

    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` overrides the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    let table_path = cli.table.unwrap_or_else(|| settings.table.path.clone());

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Estimate {
            codes,
            draw,
            text,
            pdf,
            json,
        } => {
            let input = if codes.is_empty() {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading codes from stdin")?;
                join_codes(buf.lines())
            } else {
                join_codes(codes.iter().map(String::as_str))
            };
            let request = EstimateRequest {
                input: &input,
                include_draw: draw,
                text_path: text,
                pdf_path: pdf,
                json,
            };
            run_estimate(&mut out, &table_path, settings, request)?;
        }
        Command::Lookup { codes } => {
            let table = load_table(&table_path, settings)?;
            for code in &codes {
                let code = code.trim();
                display::write_entry_card(&mut out, code, table.get(code))?;
            }
        }
        Command::Stats => {
            let table = load_table(&table_path, settings)?;
            display::write_summary(&mut out, &table.summary())?;
        }
    }
    Ok(())
}

struct EstimateRequest<'a> {
    input: &'a str,
    include_draw: bool,
    text_path: Option<PathBuf>,
    pdf_path: Option<PathBuf>,
    json: bool,
}

fn load_table(path: &Path, settings: &Settings) -> anyhow::Result<PriceTable> {
    load_price_table(path, &settings.table.options()?)
        .with_context(|| format!("loading price table {}", path.display()))
}

/// Load the price table and write one estimate. Any failure carries the
/// user-facing generation message.
fn run_estimate(
    out: &mut impl Write,
    table_path: &Path,
    settings: &Settings,
    request: EstimateRequest<'_>,
) -> anyhow::Result<()> {
    load_table(table_path, settings)
        .and_then(|table| write_estimate(out, &table, settings, request))
        .context(GENERATION_FAILED)
}

/// Generate, print and export one estimate.
fn write_estimate(
    out: &mut impl Write,
    table: &PriceTable,
    settings: &Settings,
    request: EstimateRequest<'_>,
) -> anyhow::Result<()> {
    let today = chrono::Local::now().date_naive();
    let estimate = tariffa_core::generate(request.input, table, request.include_draw, today);
    let text = estimate.render_text(&settings.laboratory);

    if request.json {
        serde_json::to_writer_pretty(&mut *out, &estimate)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{text}")?;
    }

    if let Some(path) = &request.text_path {
        std::fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote text estimate");
    }

    if let Some(path) = &request.pdf_path {
        let bytes = pdf::render_pdf(&estimate, &settings.laboratory, &settings.pdf)?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "wrote pdf estimate");
    }

    Ok(())
}

/// Join argument or stdin chunks into one comma-separated code list.
fn join_codes<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rust_decimal::Decimal;
    use tariffa_core::PriceEntry;

    fn table() -> PriceTable {
        PriceTable::new(vec![
            PriceEntry::new("12345", "DESC A", Decimal::new(1000, 2)),
            PriceEntry::new("34567", "DESC B", Decimal::new(500, 2)),
        ])
    }

    fn request(input: &str) -> EstimateRequest<'_> {
        EstimateRequest {
            input,
            include_draw: false,
            text_path: None,
            pdf_path: None,
            json: false,
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_estimate_flags() {
        let cli = Cli::parse_from([
            "tariffa", "--table", "t.csv", "estimate", "12345", "34567", "--draw", "--pdf",
            "out.pdf",
        ]);
        assert_eq!(cli.table, Some(PathBuf::from("t.csv")));
        match cli.command {
            Command::Estimate {
                codes, draw, pdf, ..
            } => {
                assert_eq!(codes, vec!["12345", "34567"]);
                assert!(draw);
                assert_eq!(pdf, Some(PathBuf::from("out.pdf")));
            }
            _ => panic!("expected estimate command"),
        }
    }

    #[test]
    fn join_codes_from_args_and_lines() {
        assert_eq!(join_codes(["12345", "23456-34567"].into_iter()), "12345,23456-34567");
        assert_eq!(join_codes("12345\n\n 34567 \n".lines()), "12345,34567");
    }

    #[test]
    fn estimate_prints_text() {
        let mut out = Vec::new();
        let settings = Settings::default();
        write_estimate(&mut out, &table(), &settings, request("12345,23456-34567")).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with(crate::settings::DEFAULT_LABORATORY));
        assert!(printed.contains("1) Preventivo: € 15.00"));
        assert!(printed.contains("- codice non trovato: 23456"));
    }

    #[test]
    fn estimate_prints_json() {
        let mut out = Vec::new();
        let settings = Settings::default();
        let req = EstimateRequest {
            include_draw: true,
            json: true,
            ..request("12345")
        };
        write_estimate(&mut out, &table(), &settings, req).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["total"], "13.80");
    }

    #[test]
    fn estimate_writes_exports() {
        let tmp = tempfile::TempDir::new().unwrap();
        let text_path = tmp.path().join("preventivo.txt");
        let pdf_path = tmp.path().join("preventivo.pdf");
        let req = EstimateRequest {
            text_path: Some(text_path.clone()),
            pdf_path: Some(pdf_path.clone()),
            ..request("12345,34567")
        };
        let mut out = Vec::new();
        write_estimate(&mut out, &table(), &Settings::default(), req).unwrap();

        let text = std::fs::read_to_string(&text_path).unwrap();
        assert!(text.contains("- Desc a € 10.00\n- Desc b € 5.00"));
        let pdf = std::fs::read(&pdf_path).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    const SHEET: &str = "Regionale-Puglia,Descrizione,Tariffa-Puglia\n12345,DESC A,10.00\n";

    #[test]
    fn estimate_loads_table_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let table_path = tmp.path().join("tariffario.csv");
        std::fs::write(&table_path, SHEET).unwrap();
        let mut out = Vec::new();
        run_estimate(&mut out, &table_path, &Settings::default(), request("12345")).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("1) Preventivo: € 10.00"));
    }

    #[test]
    fn export_failure_carries_user_message() {
        let tmp = tempfile::TempDir::new().unwrap();
        let table_path = tmp.path().join("tariffario.csv");
        std::fs::write(&table_path, SHEET).unwrap();
        let req = EstimateRequest {
            text_path: Some(PathBuf::from("/nonexistent/dir/preventivo.txt")),
            ..request("12345")
        };
        let mut out = Vec::new();
        let err = run_estimate(&mut out, &table_path, &Settings::default(), req).unwrap_err();
        assert!(format!("{err:#}").starts_with("Errore durante la generazione del preventivo: "));
    }

    #[test]
    fn missing_table_carries_user_message() {
        let mut out = Vec::new();
        let err = run_estimate(
            &mut out,
            Path::new("/nonexistent/tariffario.csv"),
            &Settings::default(),
            request("12345"),
        )
        .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.starts_with("Errore durante la generazione del preventivo: "));
        assert!(message.contains("price table not found"));
        assert!(out.is_empty());
    }

    #[test]
    fn lookup_errors_keep_plain_message() {
        let err = load_table(Path::new("/nonexistent/tariffario.csv"), &Settings::default())
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("loading price table /nonexistent/tariffario.csv"));
    }
}
