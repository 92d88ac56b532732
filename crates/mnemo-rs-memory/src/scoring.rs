//! Hybrid lexical + vector scoring shared by the bundled search backends.

use crate::backend::{HybridQuery, SearchHit};
use serde_json::Value;
use std::collections::HashSet;

/// Split text into lowercase search terms.
///
/// ASCII words are lightly stemmed so "works" and "worked" share a term.
/// CJK ideographs and kana are emitted one character per term.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if is_cjk(ch) {
            flush_word(&mut current, &mut tokens);
            tokens.push(ch.to_string());
        } else if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else {
            flush_word(&mut current, &mut tokens);
        }
    }
    flush_word(&mut current, &mut tokens);
    tokens
}

fn flush_word(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    tokens.push(stem(current));
    current.clear();
}

fn stem(word: &str) -> String {
    if !word.is_ascii() {
        return word.to_string();
    }
    for suffix in ["ing", "ed", "s"] {
        if let Some(base) = word.strip_suffix(suffix) {
            if base.len() < 3 || (suffix == "s" && base.ends_with('s')) {
                continue;
            }
            return base.to_string();
        }
    }
    word.to_string()
}

fn is_cjk(ch: char) -> bool {
    matches!(
        ch,
        '\u{3040}'..='\u{30FF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{AC00}'..='\u{D7AF}'
            | '\u{F900}'..='\u{FAFF}'
    )
}

/// Fraction of distinct query terms present in the document.
pub fn lexical_score(query_terms: &HashSet<String>, document: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let document_terms: HashSet<String> = tokenize(document).into_iter().collect();
    let matched = query_terms
        .iter()
        .filter(|term| document_terms.contains(*term))
        .count();
    matched as f32 / query_terms.len() as f32
}

/// Cosine similarity between two vectors; 0 when lengths differ or either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Decode a JSON array of numbers into a vector.
pub fn vector_from_value(value: &Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_f64().map(|number| number as f32))
        .collect()
}

/// Score a stored document against a hybrid query.
///
/// Returns `None` when the document matches neither lexically nor by vector,
/// or when the combined score does not clear the query threshold.
pub fn score_document(
    query: &HybridQuery,
    query_terms: &HashSet<String>,
    source: &Value,
) -> Option<f32> {
    let text_weight = query.text_weight.max(0.0);
    let vector_weight = query.vector_weight.max(0.0);

    let lexical = if text_weight > 0.0 {
        source
            .get(&query.text_field)
            .and_then(Value::as_str)
            .map(|text| lexical_score(query_terms, text))
            .unwrap_or(0.0)
    } else {
        0.0
    };
    let similarity = if vector_weight > 0.0 {
        source
            .get(&query.vector_field)
            .and_then(vector_from_value)
            .map(|vector| cosine_similarity(&query.vector, &vector).max(0.0))
            .unwrap_or(0.0)
    } else {
        0.0
    };

    if lexical <= 0.0 && similarity <= 0.0 {
        return None;
    }
    let score = text_weight * lexical + vector_weight * similarity;
    if score <= 0.0 {
        return None;
    }
    if let Some(min_score) = query.min_score
        && score < min_score
    {
        return None;
    }
    Some(score)
}

/// Score every document, then keep the best `top_k` by descending score.
///
/// Equal scores keep the iteration order of `documents`.
pub fn rank_documents<'a>(
    query: &HybridQuery,
    documents: impl IntoIterator<Item = (&'a str, &'a Value)>,
) -> Vec<SearchHit> {
    if query.top_k == 0 {
        return Vec::new();
    }
    let query_terms: HashSet<String> = tokenize(&query.text).into_iter().collect();
    let mut hits: Vec<SearchHit> = documents
        .into_iter()
        .filter_map(|(id, source)| {
            score_document(query, &query_terms, source).map(|score| SearchHit {
                id: id.to_string(),
                source: source.clone(),
                score,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(query.top_k);
    hits
}
