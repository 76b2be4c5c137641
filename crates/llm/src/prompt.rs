//! Prompt assembly (spec §4.8): a two-message bundle built from the
//! user's prompt, the filters the extractor derived, the kernel's
//! statistics (for `ANALYTICAL`/`SMART_FULL`), and the retrieved context
//! documents. Truncation under a token budget drops from the tail of the
//! context, never from the statistics or the user's own words.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use txrag_core::{Document, FilterSpec, Statistics};
use txrag_rag::Language;

/// Message role in a chat-completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

const SYSTEM_PROMPT: &str = "You are a careful financial analyst. You format answers as markdown \
tables when that makes the numbers easier to read, you match the language the user asked in, \
and you never invent a transaction that is not present in the context you were given.";

fn language_directive(language: Language) -> &'static str {
    match language {
        Language::English => "Respond in English.",
        Language::Hindi => "Respond in Hindi (Devanagari script).",
        Language::Hinglish => "Respond in Hinglish (Hindi written in Latin script), matching the user's style.",
    }
}

fn render_statistics(stats: &Statistics) -> String {
    let mut out = format!(
        "## Statistics\ncount: {}\ntotal: \u{20B9}{:.2}\naverage: \u{20B9}{:.2}\nmin: \u{20B9}{:.2}\nmax: \u{20B9}{:.2}\n",
        stats.count,
        stats.total,
        stats.average,
        stats.min.unwrap_or(0.0),
        stats.max.unwrap_or(0.0),
    );

    if !stats.by_type.is_empty() {
        out.push_str("\nBy type:\n");
        for (ty, b) in &stats.by_type {
            out.push_str(&format!("- {ty}: count={}, sum=\u{20B9}{:.2}\n", b.count, b.sum));
        }
    }
    if !stats.by_mode.is_empty() {
        out.push_str("\nBy mode:\n");
        for (mode, b) in &stats.by_mode {
            out.push_str(&format!("- {mode}: count={}, sum=\u{20B9}{:.2}\n", b.count, b.sum));
        }
    }
    if !stats.monthly.is_empty() {
        out.push_str("\nBy month:\n");
        for (month, bucket) in &stats.monthly {
            out.push_str(&format!(
                "- {month}: count={}, credit=\u{20B9}{:.2}, debit=\u{20B9}{:.2}, net=\u{20B9}{:.2}\n",
                bucket.count, bucket.credit_sum, bucket.debit_sum, bucket.net
            ));
        }
    }
    out
}

/// Estimate of tokens consumed by `text`, in the same grapheme-based
/// heuristic the rest of the engine uses: Devanagari runs cheaply
/// because a single codepoint there carries more of a token's worth of
/// meaning than a single Latin character does.
pub fn estimate_tokens(text: &str) -> usize {
    let grapheme_count = text.graphemes(true).count();
    let devanagari_count = text
        .chars()
        .filter(|c| ('\u{0900}'..='\u{097F}').contains(c))
        .count();

    if devanagari_count > grapheme_count / 3 {
        grapheme_count.max(1) / 2
    } else {
        grapheme_count.max(1) / 4
    }
}

/// Assembles the system + user message pair described in spec §4.8.
pub struct PromptAssembler {
    max_context_tokens: usize,
}

impl PromptAssembler {
    pub fn new(max_context_tokens: usize) -> Self {
        Self { max_context_tokens }
    }

    /// Builds the two-message bundle. `statistics` is `Some` only for
    /// `ANALYTICAL`/`SMART_FULL`; `documents` is the kernel's retrieved
    /// context, already capped upstream. Context documents are dropped
    /// from the tail, in order, until the whole user message fits the
    /// token budget — the statistics block and the user's own prompt are
    /// never truncated.
    pub fn assemble(
        &self,
        user_prompt: &str,
        language: Language,
        filters: &FilterSpec,
        statistics: Option<&Statistics>,
        documents: &[Document],
    ) -> Vec<Message> {
        let mut fixed = String::new();
        fixed.push_str(language_directive(language));
        fixed.push_str("\n\n");
        fixed.push_str(user_prompt);
        fixed.push('\n');

        let filter_lines = filters.describe();
        if !filter_lines.is_empty() {
            fixed.push_str("\n## Applied filters\n");
            for line in &filter_lines {
                fixed.push_str("- ");
                fixed.push_str(line);
                fixed.push('\n');
            }
        }

        if let Some(stats) = statistics {
            fixed.push('\n');
            fixed.push_str(&render_statistics(stats));
        }

        let fixed_tokens = estimate_tokens(&fixed);
        let mut budget = self.max_context_tokens.saturating_sub(fixed_tokens);

        let mut context = String::new();
        let mut included = 0;
        for doc in documents {
            let rendered = format!("\n---\n{}\n", doc.text);
            let doc_tokens = estimate_tokens(&rendered);
            if doc_tokens > budget {
                break;
            }
            budget -= doc_tokens;
            context.push_str(&rendered);
            included += 1;
        }

        let mut user_message = fixed;
        if included > 0 {
            user_message.push_str("\n## Context documents\n");
            user_message.push_str(&context);
        }

        vec![Message::system(SYSTEM_PROMPT), Message::user(user_message)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use txrag_core::{format_transaction, Transaction};

    fn sample_documents(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| {
                format_transaction(&Transaction {
                    txn_id: format!("T{i}"),
                    amount: Some(100.0 + i as f64),
                    txn_type: Some("DEBIT".into()),
                    mode: Some("UPI".into()),
                    date: Some("2024-01-01".into()),
                    narration: Some("Zomato".into()),
                    ..Default::default()
                })
            })
            .collect()
    }

    #[test]
    fn bundle_has_exactly_two_messages() {
        let assembler = PromptAssembler::new(4000);
        let messages = assembler.assemble(
            "how much did I spend",
            Language::English,
            &FilterSpec::default(),
            None,
            &sample_documents(2),
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn user_message_never_invents_transactions_instruction_lives_in_system() {
        let assembler = PromptAssembler::new(4000);
        let messages = assembler.assemble(
            "show me my zomato spend",
            Language::English,
            &FilterSpec::default(),
            None,
            &[],
        );
        assert!(messages[0].content.contains("never invent"));
    }

    #[test]
    fn tight_budget_truncates_context_from_the_tail() {
        let assembler = PromptAssembler::new(40);
        let docs = sample_documents(20);
        let messages = assembler.assemble(
            "show me everything",
            Language::English,
            &FilterSpec::default(),
            None,
            &docs,
        );
        let user_msg = &messages[1].content;
        assert!(user_msg.contains("T0"));
        assert!(!user_msg.contains("T19"));
    }

    #[test]
    fn statistics_block_is_never_truncated_away() {
        let assembler = PromptAssembler::new(10);
        let stats = Statistics::from_amounts(&[100.0, 200.0]);
        let messages = assembler.assemble(
            "give me a breakdown",
            Language::English,
            &FilterSpec::default(),
            Some(&stats),
            &sample_documents(50),
        );
        assert!(messages[1].content.contains("## Statistics"));
        assert!(messages[1].content.contains("count: 2"));
    }

    #[test]
    fn hindi_directive_is_included() {
        let assembler = PromptAssembler::new(4000);
        let messages = assembler.assemble(
            "mera kharcha kitna hua",
            Language::Hindi,
            &FilterSpec::default(),
            None,
            &[],
        );
        assert!(messages[1].content.contains("Hindi"));
    }

    #[test]
    fn filters_render_as_a_bullet_list() {
        let assembler = PromptAssembler::new(4000);
        let mut filters = FilterSpec::default();
        filters.amount_min = Some(500.0);
        let messages = assembler.assemble(
            "show debits over 500",
            Language::English,
            &filters,
            None,
            &[],
        );
        assert!(messages[1].content.contains("## Applied filters"));
        assert!(messages[1].content.contains("500.00"));
    }
}
