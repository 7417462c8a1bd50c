use crate::pipeline::normalize::{NormalizedSubmission, PayloadStatus};
use crate::pipeline::rules::{Priority, RuleSet, Suggestion, SuggestionKind};
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_LIMIT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionReport {
    pub suggestions: Vec<Suggestion>,
    /// Records left out because their payload could not be decoded.
    pub skipped: usize,
    /// Set when the rule set was unusable and an error advisory was returned.
    pub degraded: bool,
}

pub fn no_data_advisory() -> Suggestion {
    Suggestion {
        priority: Priority::Low,
        category: "general".to_string(),
        kind: SuggestionKind::Info,
        message: "No data available for analysis. Submit forms to get AI suggestions.".to_string(),
        summary: "INFO: No data available for analysis".to_string(),
    }
}

pub fn error_advisory() -> Suggestion {
    Suggestion {
        priority: Priority::Medium,
        category: "system".to_string(),
        kind: SuggestionKind::Warning,
        message: "Error analyzing data. Please refresh to try again.".to_string(),
        summary: "ERROR: Failed to analyze data".to_string(),
    }
}

/// Evaluates every record against `rules` in list order, drops repeated
/// messages (first occurrence wins), orders by priority keeping emission
/// order within a priority, and keeps at most `limit` entries.
pub fn generate(records: &[NormalizedSubmission], rules: &RuleSet, limit: usize) -> SuggestionReport {
    if records.is_empty() {
        return SuggestionReport {
            suggestions: vec![no_data_advisory()],
            skipped: 0,
            degraded: false,
        };
    }

    if let Err(e) = rules.validate() {
        tracing::error!("Suggestion rules are invalid: {}", e);
        return SuggestionReport {
            suggestions: vec![error_advisory()],
            skipped: 0,
            degraded: true,
        };
    }

    let mut skipped = 0;
    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for record in records {
        if record.status == PayloadStatus::Recovered {
            tracing::warn!("Skipping submission {} in suggestions: payload unreadable", record.id);
            skipped += 1;
            continue;
        }
        for suggestion in rules.evaluate(record) {
            if seen.insert(suggestion.message.clone()) {
                suggestions.push(suggestion);
            }
        }
    }

    suggestions.sort_by_key(|s| s.priority);
    suggestions.truncate(limit.max(1));

    SuggestionReport {
        suggestions,
        skipped,
        degraded: false,
    }
}

/// One line per suggestion, the plain text form offered for download.
pub fn summary_text(suggestions: &[Suggestion]) -> String {
    suggestions
        .iter()
        .map(|s| s.summary.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
