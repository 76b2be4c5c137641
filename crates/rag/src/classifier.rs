//! Query-mode classifier (spec §4.5).
//!
//! A closed dispatch table rather than a polymorphic class hierarchy: each
//! mode is a set of signal words plus a precedence rule when more than one
//! set matches. Multilingual signal words (English, Hindi/Devanagari,
//! Hinglish) share one table so the same rules route every supported
//! language.

use txrag_core::{FilterSpec, QueryMode};

struct ModeSignals {
    mode: QueryMode,
    words: &'static [&'static str],
}

/// Checked top-to-bottom; the first set with a hit decides the mode. Order
/// encodes precedence: an explicit "total"/"average" ask (STATISTICAL)
/// outranks a generic "show me" (VECTOR_SEARCH) even if both phrases are
/// present, because the statistical fast path is strictly more specific.
const TABLE: &[ModeSignals] = &[
    ModeSignals {
        mode: QueryMode::Statistical,
        words: &[
            "total", "sum", "average", "avg", "mean", "count", "how many", "min", "max",
            "how much did i spend", "how much have i spent",
            "kul", "kitna", "kitne", "average kitna",
            "कुल", "कितना", "कितने", "औसत", "योग",
        ],
    },
    ModeSignals {
        mode: QueryMode::Analytical,
        words: &[
            "breakdown", "trend", "trends", "compare", "comparison", "by month", "by category",
            "by type", "monthly", "month wise", "month-wise", "pattern", "analysis",
            "summarize", "summary", "overview", "analyze", "unusual", "anomal*", "scan", "insights",
            "vishleshan",
        ],
    },
    ModeSignals {
        mode: QueryMode::SmartFull,
        words: &[
            "everything", "all transactions", "full history", "complete history", "sab kuch",
            "poora", "poori",
        ],
    },
];

/// A single-word signal (e.g. "sum", "count") is matched on word
/// boundaries so it doesn't substring-match inside an unrelated word like
/// "summarize" or "discount". A trailing `*` (e.g. "anomal*") instead
/// matches any word with that prefix ("anomaly", "anomalous"). A
/// multi-word phrase (e.g. "how many") is matched by plain substring
/// containment, since it can't collide with a single larger word the same
/// way.
fn contains_signal(lower: &str, signal: &str) -> bool {
    if signal.contains(' ') {
        lower.contains(signal)
    } else if let Some(stem) = signal.strip_suffix('*') {
        lower.split(|c: char| !c.is_alphanumeric()).any(|word| word.starts_with(stem))
    } else {
        lower.split(|c: char| !c.is_alphanumeric()).any(|word| word == signal)
    }
}

/// Classifies one query into the closed `QueryMode` set.
///
/// A prompt that hits no signal word falls back to whether `filters` has
/// any predicate set at all: a populated `FilterSpec` with no explicit
/// signal word still deserves a full contextual answer (SMART_FULL, spec
/// §4.5 row 4), while a wholly unconstrained prompt is a targeted lookup
/// over semantically similar documents (VECTOR_SEARCH, spec §4.5 row 5).
pub fn classify(prompt: &str, filters: &FilterSpec) -> QueryMode {
    let lower = prompt.to_lowercase();

    for signals in TABLE {
        if signals.words.iter().any(|w| contains_signal(&lower, w)) {
            return signals.mode;
        }
    }

    if !filters.is_empty() {
        QueryMode::SmartFull
    } else {
        QueryMode::VectorSearch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_keyword_routes_statistical() {
        let filters = FilterSpec::default();
        assert_eq!(classify("what is my total spending", &filters), QueryMode::Statistical);
    }

    #[test]
    fn devanagari_statistical_keyword_routes_statistical() {
        let filters = FilterSpec::default();
        assert_eq!(classify("कुल कितने डेबिट हुए?", &filters), QueryMode::Statistical);
    }

    #[test]
    fn summarize_does_not_substring_match_sum() {
        let filters = FilterSpec::default();
        assert_eq!(classify("Summarize my spending last month", &filters), QueryMode::Analytical);
    }

    #[test]
    fn breakdown_keyword_routes_analytical() {
        let filters = FilterSpec::default();
        assert_eq!(classify("give me a monthly breakdown", &filters), QueryMode::Analytical);
    }

    #[test]
    fn anomaly_keyword_routes_analytical() {
        let filters = FilterSpec::default();
        assert_eq!(classify("any unusual or anomalous charges?", &filters), QueryMode::Analytical);
    }

    #[test]
    fn everything_keyword_routes_smart_full() {
        let filters = FilterSpec::default();
        assert_eq!(classify("show me everything", &filters), QueryMode::SmartFull);
    }

    #[test]
    fn populated_filters_without_signal_word_routes_smart_full() {
        let mut filters = FilterSpec::default();
        filters.amount_min = Some(500.0);
        assert_eq!(classify("show me my zomato transactions", &filters), QueryMode::SmartFull);
    }

    #[test]
    fn plain_lookup_defaults_to_vector_search() {
        let filters = FilterSpec::default();
        assert_eq!(classify("show me my zomato transactions", &filters), QueryMode::VectorSearch);
    }

    #[test]
    fn statistical_outranks_vector_search_when_both_present() {
        let filters = FilterSpec::default();
        let mode = classify("show me the total amount I spent", &filters);
        assert_eq!(mode, QueryMode::Statistical);
    }
}
