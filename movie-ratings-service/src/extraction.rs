//! Recovery of rating records from the model's free-form final answer.
//!
//! Strategies run in a fixed order and the first one that yields a structured list wins.
//! Each strategy is a pure `&str -> Option<Vec<RawRecord>>` function.

use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Platform;

pub type RawRecord = Map<String, Value>;

/// Phrases that mark an answer as a refusal rather than data
const REFUSAL_PHRASES: &[&str] = &[
    "sorry",
    "unable",
    "couldn't",
    "could not",
    "can't",
    "cannot",
    "don't have",
    "do not have",
    "no information",
    "not available",
];

/// Rating used by the heuristic when a platform is named without a number
const HEURISTIC_DEFAULT_RATING: f64 = 8.5;

static FENCE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n[ \t]*```",
        r"(?s)```[A-Za-z0-9_+-]*(.*?)```",
    ]
    .into_iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static BARE_ARRAY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*?\}\s*\]").ok());

static BARE_KEY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([\{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:").ok());

static TRAILING_COMMA_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r",\s*([\]\}])").ok());

static PLATFORM_RATING_PATTERNS: LazyLock<Vec<(Platform, Regex)>> = LazyLock::new(|| {
    Platform::ALL
        .into_iter()
        .filter_map(|platform| {
            let pattern = format!(
                r"(?is){}.*?rating.*?(\d+(?:\.\d+)?)",
                regex::escape(platform.display_name())
            );
            Regex::new(&pattern).ok().map(|re| (platform, re))
        })
        .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectParse,
    BracketSlice,
    FencedBlock,
    Repair,
    Heuristic,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::DirectParse => "direct_parse",
            Strategy::BracketSlice => "bracket_slice",
            Strategy::FencedBlock => "fenced_block",
            Strategy::Repair => "repair",
            Strategy::Heuristic => "heuristic",
        }
    }
}

type StrategyFn = fn(&str) -> Option<Vec<RawRecord>>;

const STRATEGIES: [(Strategy, StrategyFn); 5] = [
    (Strategy::DirectParse, parse_direct),
    (Strategy::BracketSlice, parse_bracket_slice),
    (Strategy::FencedBlock, parse_fenced_block),
    (Strategy::Repair, parse_repaired),
    (Strategy::Heuristic, reconstruct_from_mentions),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub strategy: Strategy,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no extraction strategy could parse a {length}-byte response")]
    Unparseable { length: usize },
}

/// True when the answer reads as an apology or refusal.
pub fn is_refusal(text: &str) -> bool {
    let lowered = text.to_lowercase();
    REFUSAL_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

/// Run the strategy chain over `text`. Fails only when every strategy fails.
pub fn extract(text: &str) -> Result<Extraction, ExtractionError> {
    for (strategy, run) in STRATEGIES {
        match run(text) {
            Some(records) => {
                info!(
                    strategy = strategy.name(),
                    records = records.len(),
                    "Extracted rating records"
                );
                return Ok(Extraction { strategy, records });
            }
            None => debug!(strategy = strategy.name(), "Extraction strategy did not match"),
        }
    }

    Err(ExtractionError::Unparseable { length: text.len() })
}

/// Parse `candidate` as a JSON array, keeping its object elements. An array that has elements
/// but no objects is not a record list.
fn parse_array(candidate: &str) -> Option<Vec<RawRecord>> {
    let Value::Array(items) = serde_json::from_str::<Value>(candidate.trim()).ok()? else {
        return None;
    };
    let had_items = !items.is_empty();
    let records: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

    if had_items && records.is_empty() {
        None
    } else {
        Some(records)
    }
}

fn slice_between(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (start < end).then(|| &text[start..=end])
}

fn fenced_contents(text: &str) -> Vec<&str> {
    FENCE_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

pub fn parse_direct(text: &str) -> Option<Vec<RawRecord>> {
    parse_array(text)
}

pub fn parse_bracket_slice(text: &str) -> Option<Vec<RawRecord>> {
    parse_array(slice_between(text, '[', ']')?)
}

pub fn parse_fenced_block(text: &str) -> Option<Vec<RawRecord>> {
    if let Some(records) = fenced_contents(text).into_iter().find_map(parse_array) {
        return Some(records);
    }
    BARE_ARRAY_PATTERN
        .as_ref()?
        .find_iter(text)
        .find_map(|m| parse_array(m.as_str()))
}

pub fn parse_repaired(text: &str) -> Option<Vec<RawRecord>> {
    let mut candidates = fenced_contents(text);
    candidates.extend(slice_between(text, '[', ']'));
    candidates.extend(slice_between(text, '{', '}'));
    candidates.push(text);

    candidates.into_iter().find_map(|candidate| {
        let quoted = wrap_and_requote(candidate);
        parse_array(&quoted).or_else(|| parse_array(&quote_bare_keys(&quoted)))
    })
}

/// Trim, add missing outer brackets, swap single quotes for double quotes, drop trailing commas.
fn wrap_and_requote(candidate: &str) -> String {
    let mut repaired = candidate.trim().to_string();
    if !repaired.starts_with('[') {
        repaired.insert(0, '[');
    }
    if !repaired.ends_with(']') {
        repaired.push(']');
    }
    let repaired = repaired.replace('\'', "\"");
    match TRAILING_COMMA_PATTERN.as_ref() {
        Some(re) => re.replace_all(&repaired, "$1").into_owned(),
        None => repaired,
    }
}

fn quote_bare_keys(candidate: &str) -> String {
    match BARE_KEY_PATTERN.as_ref() {
        Some(re) => re.replace_all(candidate, r#"${1}"${2}":"#).into_owned(),
        None => candidate.to_string(),
    }
}

/// Build minimal records for platforms named in prose, reading the first number after the
/// word "rating". Values of 5 or less are taken as five-point ratings and doubled.
pub fn reconstruct_from_mentions(text: &str) -> Option<Vec<RawRecord>> {
    let lowered = text.to_lowercase();
    let records: Vec<RawRecord> = PLATFORM_RATING_PATTERNS
        .iter()
        .filter(|(platform, _)| lowered.contains(&platform.display_name().to_lowercase()))
        .map(|(platform, pattern)| {
            let rating = pattern
                .captures(text)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|r| if r <= 5.0 { r * 2.0 } else { r })
                .unwrap_or(HEURISTIC_DEFAULT_RATING);

            let mut record = RawRecord::new();
            record.insert("platform".to_string(), json!(platform.display_name()));
            record.insert("movie_rating".to_string(), json!(rating));
            record.insert("positive_review_percentage".to_string(), json!(80));
            record.insert("negative_review_percentage".to_string(), json!(20));
            record
        })
        .collect();

    (!records.is_empty()).then_some(records)
}
