//! Natural-language query classification
//!
//! Maps free-text questions such as "which cloud is cheapest for us?" onto a
//! small set of intents the optimizer can answer. Classification is pure
//! pattern matching and always yields the same intent for the same input.

use crate::models::Provider;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// What a question is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Cheapest,
    Fastest,
    MostReliable,
    Recommend,
    Compare,
    Trend,
    Unknown,
}

/// Classified question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub intent: QueryIntent,
    /// Providers mentioned in the question, in first-mention order
    pub providers: Vec<Provider>,
    pub raw_input: String,
}

// Checked in order; the first match wins.
const INTENT_PATTERNS: &[(QueryIntent, &str)] = &[
    (
        QueryIntent::Trend,
        r"(?i)\b(trends?|history|historical|over time|savings?|how much .*save)\b",
    ),
    (
        QueryIntent::Compare,
        r"(?i)\b(compare|comparison|vs\.?|versus|difference between|rank(ing)?)\b",
    ),
    (
        QueryIntent::Cheapest,
        r"(?i)\b(cheap(est|er)?|lowest cost|least expensive|low(est)? price|affordable|budget|costs? less)\b",
    ),
    (
        QueryIntent::Fastest,
        r"(?i)\b(fast(est|er)?|quick(est|er)?|latency|speed|response times?|lowest delay)\b",
    ),
    (
        QueryIntent::MostReliable,
        r"(?i)\b(reliab(le|ility)|availab(le|ility)|uptime|stable|most stable|sla)\b",
    ),
    (
        QueryIntent::Recommend,
        r"(?i)\b(recommend(ation)?|best|optimal|should i|which (provider|cloud)|suggest(ion)?|pick|choose)\b",
    ),
];

const PROVIDER_PATTERN: &str = r"(?i)\b(aws|amazon|azure|microsoft|gcp|google)\b";

fn intent_patterns() -> &'static [(QueryIntent, Regex)] {
    static PATTERNS: OnceLock<Vec<(QueryIntent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        INTENT_PATTERNS
            .iter()
            .map(|(intent, pattern)| {
                (
                    *intent,
                    Regex::new(pattern).expect("intent pattern must compile"),
                )
            })
            .collect()
    })
}

fn provider_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PROVIDER_PATTERN).expect("provider pattern must compile"))
}

/// Classify a question into an intent and extract provider mentions
pub fn classify(input: &str) -> ParsedQuery {
    let input = input.trim();

    let intent = intent_patterns()
        .iter()
        .find(|(_, regex)| regex.is_match(input))
        .map(|(intent, _)| *intent)
        .unwrap_or(QueryIntent::Unknown);

    let mut providers = Vec::new();
    for capture in provider_pattern().find_iter(input) {
        if let Ok(provider) = capture.as_str().parse::<Provider>() {
            if !providers.contains(&provider) {
                providers.push(provider);
            }
        }
    }

    ParsedQuery {
        intent,
        providers,
        raw_input: input.to_string(),
    }
}

/// Answer given for questions no pattern recognises
pub const HELP_TEXT: &str = "Try asking which provider is cheapest, fastest or most reliable, \
ask for a recommendation, compare providers (e.g. \"aws vs gcp\"), or ask about cost trends.";
