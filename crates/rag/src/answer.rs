//! Deterministic answer generation for `STATISTICAL` mode (spec §4.9).
//!
//! Every other mode hands its context to the LLM; `STATISTICAL` answers
//! are cheap enough, and precise enough, to compose directly from the
//! aggregated numbers — no upstream call, no chance of the model
//! mis-stating its own arithmetic.

use txrag_core::Statistics;

use crate::language::Language;

/// Renders a one-line verdict plus a markdown table of the salient
/// figures (count, total, average, min, max; per-type and per-mode rows
/// when the kernel filled them in) from `stats`, in the requested
/// `language`. Falls back to English phrasing for `Hinglish` (the numbers
/// carry the meaning; full Hindi phrasing would need more than a keyword
/// detector can promise).
pub fn generate_answer(stats: &Statistics, language: Language) -> String {
    if stats.count == 0 {
        return match language {
            Language::Hindi => "इस फ़िल्टर से कोई लेन-देन नहीं मिला।".to_string(),
            Language::English | Language::Hinglish => {
                "No transactions matched that filter.".to_string()
            }
        };
    }

    let verdict = match language {
        Language::Hindi => format!(
            "कुल {count} लेन-देन मिले, कुल राशि \u{20B9}{total:.2}।",
            count = stats.count,
            total = stats.total,
        ),
        Language::English | Language::Hinglish => format!(
            "Found {count} matching transactions totaling \u{20B9}{total:.2}.",
            count = stats.count,
            total = stats.total,
        ),
    };

    let mut out = verdict;
    out.push_str("\n\n");
    out.push_str(&summary_table(stats, language));

    if !stats.by_type.is_empty() {
        out.push_str("\n\n");
        out.push_str(&breakdown_table(
            match language {
                Language::Hindi => "प्रकार",
                Language::English | Language::Hinglish => "Type",
            },
            stats.by_type.iter().map(|(t, b)| (t.to_string(), b.count, b.sum)),
            language,
        ));
    }

    if !stats.by_mode.is_empty() {
        out.push_str("\n\n");
        out.push_str(&breakdown_table(
            match language {
                Language::Hindi => "माध्यम",
                Language::English | Language::Hinglish => "Mode",
            },
            stats.by_mode.iter().map(|(m, b)| (m.to_string(), b.count, b.sum)),
            language,
        ));
    }

    out
}

fn summary_table(stats: &Statistics, language: Language) -> String {
    let (metric, value) = match language {
        Language::Hindi => ("मेट्रिक", "मान"),
        Language::English | Language::Hinglish => ("Metric", "Value"),
    };
    let rows: [(&str, String); 5] = match language {
        Language::Hindi => [
            ("गिनती", stats.count.to_string()),
            ("कुल", format!("\u{20B9}{:.2}", stats.total)),
            ("औसत", format!("\u{20B9}{:.2}", stats.average)),
            ("न्यूनतम", format!("\u{20B9}{:.2}", stats.min.unwrap_or(0.0))),
            ("अधिकतम", format!("\u{20B9}{:.2}", stats.max.unwrap_or(0.0))),
        ],
        Language::English | Language::Hinglish => [
            ("Count", stats.count.to_string()),
            ("Total", format!("\u{20B9}{:.2}", stats.total)),
            ("Average", format!("\u{20B9}{:.2}", stats.average)),
            ("Min", format!("\u{20B9}{:.2}", stats.min.unwrap_or(0.0))),
            ("Max", format!("\u{20B9}{:.2}", stats.max.unwrap_or(0.0))),
        ],
    };

    let mut table = format!("| {metric} | {value} |\n|---|---|\n");
    for (label, val) in rows {
        table.push_str(&format!("| {label} | {val} |\n"));
    }
    table.trim_end().to_string()
}

fn breakdown_table(
    label_header: &str,
    rows: impl Iterator<Item = (String, usize, f64)>,
    language: Language,
) -> String {
    let (count, sum) = match language {
        Language::Hindi => ("गिनती", "राशि"),
        Language::English | Language::Hinglish => ("Count", "Sum"),
    };
    let mut table = format!("| {label_header} | {count} | {sum} |\n|---|---|---|\n");
    for (label, n, s) in rows {
        table.push_str(&format!("| {label} | {n} | \u{20B9}{s:.2} |\n"));
    }
    table.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_set_gets_a_no_match_answer() {
        let stats = Statistics::from_amounts(&[]);
        let answer = generate_answer(&stats, Language::English);
        assert!(answer.contains("No transactions"));
    }

    #[test]
    fn answer_contains_a_markdown_table_with_all_five_figures() {
        let stats = Statistics::from_amounts(&[100.0, 200.0, 300.0]);
        let answer = generate_answer(&stats, Language::English);
        assert!(answer.contains("| Metric | Value |"));
        assert!(answer.contains("3 matching"));
        assert!(answer.contains("600.00"));
        assert!(answer.contains("200.00"));
        assert!(answer.contains("100.00"));
        assert!(answer.contains("300.00"));
    }

    #[test]
    fn hindi_answer_uses_devanagari_and_a_table() {
        let stats = Statistics::from_amounts(&[50.0]);
        let answer = generate_answer(&stats, Language::Hindi);
        assert!(answer.contains("कुल"));
        assert!(answer.contains("| मेट्रिक | मान |"));
    }
}
