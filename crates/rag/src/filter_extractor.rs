//! Rule-based extraction of a [`FilterSpec`] from a free-text prompt
//! (spec §4.4). No ML, no LLM call: a fixed battery of regexes and keyword
//! tables over English, Devanagari Hindi, and Hinglish text.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use txrag_core::{FilterSpec, PaymentMode, Sort, SortField, SortOrder, TxnType};

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:₹|rs\.?|inr)?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(k|thousand|lakh|lakhs|l|crore|crores|cr)?")
        .unwrap()
});

static ABOVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:above|over|more than|greater than|se zyada|se jyada|se upar)\s*(?:₹|rs\.?|inr)?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(k|thousand|lakh|lakhs|l|crore|crores|cr)?").unwrap()
});

static BELOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:below|under|less than|kam se|se kam)\s*(?:₹|rs\.?|inr)?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(k|thousand|lakh|lakhs|l|crore|crores|cr)?").unwrap()
});

static BETWEEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)between\s*(?:₹|rs\.?|inr)?\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*(?:and|to|se|aur)\s*(?:₹|rs\.?|inr)?\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});

static TOP_N_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:top|sabse|last)\s*([0-9]+)").unwrap()
});

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static DMY_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4})\b").unwrap());
static ACCOUNT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\baccount\s*(?:no\.?|number)?\s*[:#]?\s*([A-Za-z0-9]{4,})\b").unwrap());
static TXN_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:txn|transaction)\s*(?:id)?\s*[:#]?\s*([A-Za-z0-9_-]{4,})\b").unwrap());

fn parse_amount_multiplier(suffix: &str) -> f64 {
    match suffix.to_lowercase().as_str() {
        "k" | "thousand" => 1_000.0,
        "l" | "lakh" | "lakhs" => 100_000.0,
        "cr" | "crore" | "crores" => 10_000_000.0,
        _ => 1.0,
    }
}

fn parse_amount(captures: &regex::Captures) -> Option<f64> {
    let raw = captures.get(1)?.as_str().replace(',', "");
    let value: f64 = raw.parse().ok()?;
    let mult = captures
        .get(2)
        .map(|m| parse_amount_multiplier(m.as_str()))
        .unwrap_or(1.0);
    Some(value * mult)
}

struct CreditWords;
struct DebitWords;

impl CreditWords {
    const WORDS: &'static [&'static str] = &[
        "credit", "credited", "received", "incoming", "income", "jama", "aaya", "aaye", "mila",
    ];
}
impl DebitWords {
    const WORDS: &'static [&'static str] = &[
        "debit", "debited", "spent", "spend", "spending", "paid", "payment", "outgoing", "kharcha",
        "kharch", "gaya", "diya", "nikala", "nikale",
    ];
}

static MODE_ALIASES: Lazy<Vec<(&'static str, PaymentMode)>> = Lazy::new(|| {
    vec![
        ("upi", PaymentMode::Upi),
        ("gpay", PaymentMode::Upi),
        ("google pay", PaymentMode::Upi),
        ("phonepe", PaymentMode::Upi),
        ("paytm", PaymentMode::Upi),
        ("neft", PaymentMode::Neft),
        ("imps", PaymentMode::Imps),
        ("rtgs", PaymentMode::Rtgs),
        ("fund transfer", PaymentMode::Ft),
        ("ft", PaymentMode::Ft),
        ("cash", PaymentMode::Cash),
        ("nakad", PaymentMode::Cash),
        ("card", PaymentMode::Card),
        ("debit card", PaymentMode::Card),
        ("credit card", PaymentMode::Card),
        ("atm", PaymentMode::Atm),
    ]
});

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "show", "me", "my", "please", "what", "how",
    "much", "many", "did", "do", "i", "in", "on", "of", "for", "to", "and", "or", "this", "that",
    "last", "top", "mera", "meri", "mujhe", "hai", "hain", "ka", "ki", "ke", "ko", "se", "aur",
];

fn month_range(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1).unwrap()
    }
    .pred_opt()
    .unwrap();
    (start, end)
}

fn relative_date_range(text: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let lower = text.to_lowercase();
    if lower.contains("today") || lower.contains("aaj") {
        return Some((today, today));
    }
    if lower.contains("yesterday") || lower.contains("kal") {
        let d = today.pred_opt()?;
        return Some((d, d));
    }
    if lower.contains("this week") || lower.contains("is hafte") {
        let start = today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
        return Some((start, today));
    }
    if lower.contains("last week") || lower.contains("pichle hafte") {
        let this_week_start =
            today - chrono::Duration::days(today.weekday().num_days_from_monday() as i64);
        let start = this_week_start - chrono::Duration::days(7);
        let end = this_week_start.pred_opt()?;
        return Some((start, end));
    }
    if lower.contains("this month") || lower.contains("is mahine") || lower.contains("is mahaine") {
        return Some(month_range(today.year(), today.month()));
    }
    if lower.contains("last month") || lower.contains("pichle mahine") || lower.contains("pichle mahaine") {
        let (year, month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        return Some(month_range(year, month));
    }
    if lower.contains("this year") || lower.contains("is saal") {
        return Some((
            NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap(),
            today,
        ));
    }
    if lower.contains("last year") || lower.contains("pichle saal") {
        return Some((
            NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(today.year() - 1, 12, 31).unwrap(),
        ));
    }
    None
}

fn extract_explicit_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE_RE.captures(text) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    if let Some(caps) = DMY_DATE_RE.captures(text) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }
    None
}

/// Extracts every recognized signal from `prompt`, folding all matches into
/// one conjunctive [`FilterSpec`]. `today` is injected so callers (and
/// tests) control what "this month"/"last week" resolve to.
pub fn extract_filters(prompt: &str, today: NaiveDate) -> FilterSpec {
    let mut spec = FilterSpec::default();
    let lower = prompt.to_lowercase();

    if let Some((from, to)) = relative_date_range(&lower, today) {
        spec.date_from = Some(from);
        spec.date_to = Some(to);
    } else if let Some(d) = extract_explicit_date(prompt) {
        spec.date_from = Some(d);
        spec.date_to = Some(d);
    }

    if let Some(caps) = BETWEEN_RE.captures(&lower) {
        let a: f64 = caps[1].replace(',', "").parse().unwrap_or(0.0);
        let b: f64 = caps[2].replace(',', "").parse().unwrap_or(0.0);
        spec.amount_min = Some(a.min(b));
        spec.amount_max = Some(a.max(b));
    } else {
        if let Some(caps) = ABOVE_RE.captures(&lower) {
            spec.amount_min = parse_amount(&caps);
        }
        if let Some(caps) = BELOW_RE.captures(&lower) {
            spec.amount_max = parse_amount(&caps);
        }
    }

    let has_credit_word = CreditWords::WORDS.iter().any(|w| lower.contains(w));
    let has_debit_word = DebitWords::WORDS.iter().any(|w| lower.contains(w));
    if has_credit_word && !has_debit_word {
        spec.type_in.insert(TxnType::Credit);
    } else if has_debit_word && !has_credit_word {
        spec.type_in.insert(TxnType::Debit);
    }

    let mut modes: BTreeSet<PaymentMode> = BTreeSet::new();
    for (alias, mode) in MODE_ALIASES.iter() {
        if lower.contains(alias) {
            modes.insert(*mode);
        }
    }
    spec.mode_in = modes;

    for caps in ACCOUNT_RE.captures_iter(prompt) {
        spec.account_in.insert(caps[1].to_string());
    }
    for caps in TXN_ID_RE.captures_iter(prompt) {
        spec.txn_id_in.insert(caps[1].to_string());
    }

    if let Some(caps) = TOP_N_RE.captures(&lower) {
        if let Ok(n) = caps[1].parse::<usize>() {
            spec.top_n = Some(n);
        }
    }

    spec.sort = if lower.contains("smallest") || lower.contains("lowest") || lower.contains("chota") {
        Sort { field: SortField::Amount, order: SortOrder::Asc }
    } else if lower.contains("biggest")
        || lower.contains("largest")
        || lower.contains("highest")
        || lower.contains("sabse bada")
        || lower.contains("sabse zyada")
    {
        Sort { field: SortField::Amount, order: SortOrder::Desc }
    } else if lower.contains("oldest") || lower.contains("earliest") {
        Sort { field: SortField::Date, order: SortOrder::Asc }
    } else {
        Sort::default()
    };

    spec.free_text_keywords = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .filter(|w| AMOUNT_RE.find(w).is_none())
        .map(|w| w.to_string())
        .collect();

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn extracts_amount_above() {
        let spec = extract_filters("show transactions above ₹5000", today());
        assert_eq!(spec.amount_min, Some(5000.0));
    }

    #[test]
    fn extracts_between_range() {
        let spec = extract_filters("transactions between 1000 and 5000", today());
        assert_eq!(spec.amount_min, Some(1000.0));
        assert_eq!(spec.amount_max, Some(5000.0));
    }

    #[test]
    fn extracts_last_month_range() {
        let spec = extract_filters("what did I spend last month", today());
        assert_eq!(spec.date_from, NaiveDate::from_ymd_opt(2024, 2, 1));
        assert_eq!(spec.date_to, NaiveDate::from_ymd_opt(2024, 2, 29));
    }

    #[test]
    fn extracts_mode_and_type() {
        let spec = extract_filters("how much did I spend via UPI", today());
        assert!(spec.mode_in.contains(&PaymentMode::Upi));
        assert!(spec.type_in.contains(&TxnType::Debit));
    }

    #[test]
    fn extracts_top_n_and_sort() {
        let spec = extract_filters("show me the top 5 biggest transactions", today());
        assert_eq!(spec.top_n, Some(5));
        assert_eq!(spec.sort.order, SortOrder::Desc);
    }

    #[test]
    fn hinglish_debit_words_are_recognized() {
        let spec = extract_filters("mera kharcha kitna hua upi se", today());
        assert!(spec.type_in.contains(&TxnType::Debit));
        assert!(spec.mode_in.contains(&PaymentMode::Upi));
    }
}
