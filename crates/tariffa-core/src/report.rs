//! Typed report layout and plain-text rendering.
//!
//! An [`Estimate`] is laid out as a sequence of [`ReportLine`]s. Renderers
//! (plain text here, PDF in the CLI) style each line by its kind rather than
//! by its position in the document.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::estimate::{Estimate, LineKind};

pub const CURRENCY: &str = "€";

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine<'a> {
    /// Laboratory name.
    Title(&'a str),
    /// "Preventivo - data di generazione: DD/MM/YYYY"
    Generated(NaiveDate),
    Blank,
    /// "1) Preventivo: € <total>"
    Total(Decimal),
    /// "2) Dettaglio:"
    DetailHeader,
    /// A priced line: matched tariff or blood draw.
    Item { label: &'a str, amount: Decimal },
    /// "codice non trovato: <token>"
    Unresolved(&'a str),
}

impl ReportLine<'_> {
    /// Plain-text form of this line, with the given currency marker.
    pub fn text(&self, currency: &str) -> String {
        match self {
            ReportLine::Title(name) => name.to_string(),
            ReportLine::Generated(date) => format!(
                "Preventivo - data di generazione: {}",
                date.format(DATE_FORMAT)
            ),
            ReportLine::Blank => String::new(),
            ReportLine::Total(total) => format!("1) Preventivo: {currency} {total}"),
            ReportLine::DetailHeader => "2) Dettaglio:".to_string(),
            ReportLine::Item { label, amount } => format!("- {label} {currency} {amount}"),
            ReportLine::Unresolved(label) => format!("- {label}"),
        }
    }
}

impl Estimate {
    /// Lay out the estimate under the given laboratory header.
    pub fn report_lines<'a>(&'a self, laboratory: &'a str) -> Vec<ReportLine<'a>> {
        let mut out = vec![
            ReportLine::Title(laboratory),
            ReportLine::Generated(self.generated_at),
            ReportLine::Blank,
            ReportLine::Total(self.total),
            ReportLine::DetailHeader,
        ];
        for line in &self.lines {
            match (&line.kind, line.amount) {
                (LineKind::Unresolved { .. }, _) | (_, None) => {
                    out.push(ReportLine::Unresolved(&line.label))
                }
                (_, Some(amount)) => out.push(ReportLine::Item {
                    label: &line.label,
                    amount,
                }),
            }
        }
        out
    }

    /// Render the downloadable plain-text estimate.
    ///
    /// The detail section ends with a newline even when empty.
    pub fn render_text(&self, laboratory: &str) -> String {
        let lines = self.report_lines(laboratory);
        let (head, detail) = lines.split_at(5);
        let head: Vec<String> = head.iter().map(|l| l.text(CURRENCY)).collect();
        let detail: Vec<String> = detail.iter().map(|l| l.text(CURRENCY)).collect();
        format!("{}\n{}", head.join("\n"), detail.join("\n"))
    }
}
