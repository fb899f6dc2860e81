//! Estimate generation: parsed codes joined against the price table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::code::{ParsedCode, parse_codes};
use crate::table::{PriceEntry, PriceTable};

/// Fixed surcharge for the blood draw add-on (3.8).
pub const BLOOD_DRAW_SURCHARGE: Decimal = Decimal::from_parts(38, 0, 0, false, 1);

pub const BLOOD_DRAW_LABEL: &str = "Prelievo ematico";

pub const UNRESOLVED_LABEL: &str = "codice non trovato";

/// Where an estimate line came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    /// Matched price-table entry.
    Tariff { code: String },
    /// The fixed blood draw add-on.
    BloodDraw,
    /// Invalid shape or no table match. Carries no amount.
    Unresolved { token: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateLine {
    #[serde(flatten)]
    pub kind: LineKind,
    pub label: String,
    pub amount: Option<Decimal>,
}

impl EstimateLine {
    fn tariff(entry: &PriceEntry) -> Self {
        Self {
            kind: LineKind::Tariff {
                code: entry.code.clone(),
            },
            label: capitalize(&entry.description),
            amount: Some(entry.price),
        }
    }

    fn blood_draw() -> Self {
        Self {
            kind: LineKind::BloodDraw,
            label: BLOOD_DRAW_LABEL.to_string(),
            amount: Some(BLOOD_DRAW_SURCHARGE),
        }
    }

    fn unresolved(token: &str) -> Self {
        Self {
            kind: LineKind::Unresolved {
                token: token.to_string(),
            },
            label: format!("{UNRESOLVED_LABEL}: {token}"),
            amount: None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.kind, LineKind::Unresolved { .. })
    }
}

/// A generated cost estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Estimate {
    /// Sum of all line amounts, rounded to two decimal places.
    pub total: Decimal,
    pub lines: Vec<EstimateLine>,
    pub generated_at: NaiveDate,
}

impl Estimate {
    /// Lines that contribute to the total, in report order.
    pub fn priced_lines(&self) -> impl Iterator<Item = &EstimateLine> {
        self.lines.iter().filter(|l| l.amount.is_some())
    }

    /// Tokens that could not be resolved, in report order.
    pub fn unresolved_tokens(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| match &l.kind {
            LineKind::Unresolved { token } => Some(token.as_str()),
            _ => None,
        })
    }
}

/// Build an estimate from free-text input.
///
/// Matched lines follow price-table order, one line per occurrence in the
/// input. The blood draw line (if requested) comes next, then one error line
/// per invalid token and finally one per valid but unknown code, each group
/// in input order. Never fails: unusable input yields an all-error report.
pub fn generate(
    text: &str,
    table: &PriceTable,
    include_draw: bool,
    today: NaiveDate,
) -> Estimate {
    let parsed = parse_codes(text);

    let mut matched: Vec<usize> = Vec::new();
    let mut unmatched: Vec<&str> = Vec::new();
    let mut invalid: Vec<&str> = Vec::new();
    for code in &parsed {
        match code {
            ParsedCode::Valid(c) => match table.position(c) {
                Some(pos) => matched.push(pos),
                None => unmatched.push(c),
            },
            ParsedCode::Invalid(t) => invalid.push(t),
        }
    }
    matched.sort();

    let mut lines: Vec<EstimateLine> = matched
        .iter()
        .filter_map(|&pos| table.entry(pos))
        .map(EstimateLine::tariff)
        .collect();

    let mut total: Decimal = lines.iter().filter_map(|l| l.amount).sum();

    if include_draw {
        total += BLOOD_DRAW_SURCHARGE;
        lines.push(EstimateLine::blood_draw());
    }

    lines.extend(
        invalid
            .iter()
            .chain(unmatched.iter())
            .map(|t| EstimateLine::unresolved(t)),
    );

    let mut total = total.round_dp(2);
    total.rescale(2);

    debug!(
        tokens = parsed.len(),
        matched = matched.len(),
        unresolved = invalid.len() + unmatched.len(),
        %total,
        "estimate generated"
    );

    Estimate {
        total,
        lines,
        generated_at: today,
    }
}

/// Uppercase the first character and lowercase the rest.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn sample_table() -> PriceTable {
        PriceTable::new(vec![
            PriceEntry::new("12345", "DESC A", dec!(10.00)),
            PriceEntry::new("34567", "DESC B", dec!(5.00)),
        ])
    }

    fn labels(estimate: &Estimate) -> Vec<&str> {
        estimate.lines.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn reference_example() {
        let est = generate("12345,23456-34567", &sample_table(), false, today());
        assert_eq!(est.total, dec!(15.00));
        assert_eq!(est.total.to_string(), "15.00");
        assert_eq!(
            labels(&est),
            vec!["Desc a", "Desc b", "codice non trovato: 23456"]
        );
        assert_eq!(est.lines[0].amount, Some(dec!(10.00)));
        assert_eq!(est.lines[1].amount, Some(dec!(5.00)));
        assert_eq!(est.lines[2].amount, None);
        assert_eq!(est.generated_at, today());
    }

    #[test]
    fn reference_example_with_blood_draw() {
        let est = generate("12345,23456-34567", &sample_table(), true, today());
        assert_eq!(est.total.to_string(), "18.80");
        let draw = est
            .lines
            .iter()
            .find(|l| l.kind == LineKind::BloodDraw)
            .unwrap();
        assert_eq!(draw.label, "Prelievo ematico");
        assert_eq!(draw.amount.unwrap().to_string(), "3.8");
    }

    #[test]
    fn matched_lines_follow_table_order() {
        let est = generate("34567,12345", &sample_table(), false, today());
        assert_eq!(labels(&est), vec!["Desc a", "Desc b"]);
    }

    #[test]
    fn duplicate_codes_are_counted_each_time() {
        let est = generate("12345,12345,34567", &sample_table(), false, today());
        assert_eq!(est.total, dec!(25.00));
        assert_eq!(labels(&est), vec!["Desc a", "Desc a", "Desc b"]);
    }

    #[test]
    fn invalid_tokens_precede_unmatched_codes() {
        let est = generate("99999,abc,88888,1234", &sample_table(), true, today());
        assert_eq!(
            labels(&est),
            vec![
                "Prelievo ematico",
                "codice non trovato: ABC",
                "codice non trovato: 1234",
                "codice non trovato: 99999",
                "codice non trovato: 88888",
            ]
        );
        assert_eq!(est.total, dec!(3.80));
        assert_eq!(
            est.unresolved_tokens().collect::<Vec<_>>(),
            vec!["ABC", "1234", "99999", "88888"]
        );
    }

    #[test]
    fn non_ascii_digit_codes_are_unmatched_not_invalid() {
        let est = generate("٠١٢٣٤,abc,12345,", &sample_table(), false, today());
        assert_eq!(
            labels(&est),
            vec![
                "Desc a",
                "codice non trovato: ABC",
                "codice non trovato: ٠١٢٣٤",
            ]
        );
        assert_eq!(est.total.to_string(), "10.00");
    }

    #[test]
    fn malformed_input_yields_all_error_report() {
        let est = generate("hello, world", &sample_table(), false, today());
        assert_eq!(est.total.to_string(), "0.00");
        assert!(est.lines.iter().all(EstimateLine::is_unresolved));
        assert_eq!(est.lines.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let est = generate("", &sample_table(), false, today());
        assert!(est.lines.is_empty());
        assert_eq!(est.total, Decimal::ZERO);
    }

    #[test]
    fn total_matches_sum_of_priced_lines() {
        let table = PriceTable::new(vec![
            PriceEntry::new("00001", "A", dec!(0.333)),
            PriceEntry::new("00002", "B", dec!(12.10)),
            PriceEntry::new("00003", "C", dec!(7)),
        ]);
        let inputs = [
            "00001,00002,00003",
            "00001-00001-00001",
            "00003,x,00002,00009",
            "PAI00002",
            "",
        ];
        for input in inputs {
            for draw in [false, true] {
                let est = generate(input, &table, draw, today());
                let sum: Decimal = est.priced_lines().filter_map(|l| l.amount).sum();
                assert_eq!(est.total, sum.round_dp(2), "input {input:?} draw {draw}");
                assert_eq!(est.total.scale(), 2);
            }
        }
    }

    #[test]
    fn rounding_to_two_places() {
        let table = PriceTable::new(vec![PriceEntry::new("00001", "A", dec!(0.335))]);
        let est = generate("00001,00001,00001", &table, false, today());
        // 1.005 rounds half to even
        assert_eq!(est.total, dec!(1.00));
    }

    #[test]
    fn capitalize_rules() {
        assert_eq!(capitalize("EMOCROMO COMPLETO"), "Emocromo completo");
        assert_eq!(capitalize("vitamina D"), "Vitamina d");
        assert_eq!(capitalize("ÀCIDO"), "Àcido");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn json_shape() {
        let est = generate("12345,1", &sample_table(), true, today());
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["total"], "13.80");
        assert_eq!(json["generated_at"], "2026-10-19");
        assert_eq!(json["lines"][0]["kind"], "tariff");
        assert_eq!(json["lines"][0]["code"], "12345");
        assert_eq!(json["lines"][1]["kind"], "blood_draw");
        assert_eq!(json["lines"][2]["kind"], "unresolved");
        assert_eq!(json["lines"][2]["token"], "1");
        assert!(json["lines"][2]["amount"].is_null());
    }
}
