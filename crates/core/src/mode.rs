//! `QueryMode` — the closed tagged variant each query is routed to (spec §4.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryMode {
    VectorSearch,
    Analytical,
    Statistical,
    SmartFull,
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryMode::VectorSearch => "VECTOR_SEARCH",
            QueryMode::Analytical => "ANALYTICAL",
            QueryMode::Statistical => "STATISTICAL",
            QueryMode::SmartFull => "SMART_FULL",
        };
        write!(f, "{s}")
    }
}
