//! Heuristic spam scoring for submission messages.
//!
//! Each rule that fires adds its weight and a reason; the total is clamped to
//! 1.0. Lengths are counted in Unicode scalar values. Rules other than
//! `near_limit` and `contains_url` look at the message with URLs removed, so
//! appending a link can only ever raise the score.

use regex::Regex;
use std::ops::RangeInclusive;

const TOO_SHORT_CHARS: usize = 10;
const REPETITION_RUN: usize = 6;
const SYMBOL_RATIO: f64 = 0.30;
const SHOUTING_MIN_LETTERS: usize = 12;
const SHOUTING_UPPER_RATIO: f64 = 0.70;

const W_TOO_SHORT: f64 = 0.2;
const W_NEAR_LIMIT: f64 = 0.2;
const W_URL_FIRST: f64 = 0.3;
const W_URL_EXTRA: f64 = 0.1;
const W_URL_CAP: f64 = 0.6;
const W_REPETITION: f64 = 0.35;
const W_SYMBOL_NOISE: f64 = 0.25;
const W_SHOUTING: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpamReason {
    TooShort,
    NearLimit,
    ContainsUrl,
    Repetition,
    SymbolNoise,
    UppercaseShouting,
}

impl SpamReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpamReason::TooShort => "too_short",
            SpamReason::NearLimit => "near_limit",
            SpamReason::ContainsUrl => "contains_url",
            SpamReason::Repetition => "repetition",
            SpamReason::SymbolNoise => "symbol_noise",
            SpamReason::UppercaseShouting => "uppercase_shouting",
        }
    }
}

impl std::fmt::Display for SpamReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one message.
#[derive(Debug, Clone, PartialEq)]
pub struct SpamAssessment {
    pub score: f64,
    pub reasons: Vec<SpamReason>,
}

impl SpamAssessment {
    pub fn is_flagged(&self, threshold: f64) -> bool {
        self.score >= threshold
    }

    pub fn reason_names(&self) -> Vec<&'static str> {
        self.reasons.iter().map(|r| r.as_str()).collect()
    }
}

/// Tunable parameters of the heuristics.
#[derive(Debug, Clone)]
pub struct SpamRules {
    pub near_limit_length: usize,
    pub near_limit_margin: usize,
    /// Script whose marks and signs are not counted as symbols.
    pub allowed_script: RangeInclusive<char>,
}

impl Default for SpamRules {
    fn default() -> Self {
        Self {
            near_limit_length: 500,
            near_limit_margin: 5,
            allowed_script: '\u{0900}'..='\u{097F}',
        }
    }
}

/// Stateless spam scorer. Safe to share between requests.
#[derive(Debug, Clone)]
pub struct SpamAssessor {
    rules: SpamRules,
    url_pattern: Regex,
}

impl SpamAssessor {
    pub fn new(rules: SpamRules) -> Self {
        // Literal pattern, always valid
        let url_pattern = Regex::new(r"(?i)https?://\S*").expect("valid URL pattern");
        Self { rules, url_pattern }
    }

    pub fn rules(&self) -> &SpamRules {
        &self.rules
    }

    pub fn assess(&self, message: &str) -> SpamAssessment {
        let mut score: f64 = 0.0;
        let mut reasons = Vec::new();
        let mut hit = |reason: SpamReason, weight: f64| {
            score += weight;
            reasons.push(reason);
        };

        let total_len = message.chars().count();
        let url_count = self.url_pattern.find_iter(message).count();
        let stripped = self.url_pattern.replace_all(message, "");
        let text = stripped.trim();
        let text_len = text.chars().count();

        if text_len < TOO_SHORT_CHARS {
            hit(SpamReason::TooShort, W_TOO_SHORT);
        }

        let near_limit_at = self
            .rules
            .near_limit_length
            .saturating_sub(self.rules.near_limit_margin);
        if total_len >= near_limit_at {
            hit(SpamReason::NearLimit, W_NEAR_LIMIT);
        }

        if url_count > 0 {
            let weight = W_URL_FIRST + W_URL_EXTRA * (url_count - 1) as f64;
            hit(SpamReason::ContainsUrl, weight.min(W_URL_CAP));
        }

        if longest_run(text) >= REPETITION_RUN {
            hit(SpamReason::Repetition, W_REPETITION);
        }

        if text_len > 0 {
            let symbols = text
                .chars()
                .filter(|c| {
                    !c.is_alphanumeric()
                        && !c.is_whitespace()
                        && !self.rules.allowed_script.contains(c)
                })
                .count();
            if symbols as f64 / text_len as f64 > SYMBOL_RATIO {
                hit(SpamReason::SymbolNoise, W_SYMBOL_NOISE);
            }
        }

        let latin: Vec<char> = text.chars().filter(|c| is_latin_letter(*c)).collect();
        if latin.len() > SHOUTING_MIN_LETTERS {
            let upper = latin.iter().filter(|c| c.is_uppercase()).count();
            if upper as f64 / latin.len() as f64 > SHOUTING_UPPER_RATIO {
                hit(SpamReason::UppercaseShouting, W_SHOUTING);
            }
        }

        SpamAssessment {
            score: score.min(1.0),
            reasons,
        }
    }
}

/// Letters of the Latin script: ASCII, Latin-1, Extended-A/B and Extended Additional.
fn is_latin_letter(c: char) -> bool {
    c.is_alphabetic()
        && matches!(
            c,
            'A'..='Z' | 'a'..='z' | '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}'
        )
}

impl Default for SpamAssessor {
    fn default() -> Self {
        Self::new(SpamRules::default())
    }
}

/// Length of the longest run of one repeated non-whitespace character.
fn longest_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<char> = None;
    for c in text.chars() {
        if c.is_whitespace() {
            current = 0;
            previous = None;
            continue;
        }
        if previous == Some(c) {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}
