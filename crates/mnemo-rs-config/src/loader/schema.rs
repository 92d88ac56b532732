//! Schema validation helpers for Mnemo JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
///
/// Every layer is checked on its own, so a partial layer only needs to be
/// well-formed for the keys it sets.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "memory", "backends", "models"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    if let Some(value) = map.get("backends") {
        validate_backends(value, layer, "backends")?;
    }
    if let Some(value) = map.get("models") {
        validate_models(value, layer, "models")?;
    }
    Ok(())
}

/// Validate the "memory" block.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    let allowed = [
        "window_size",
        "top_k",
        "summary",
        "recall",
        "triggers",
        "serialize_session_turns",
        "fact_kind",
    ];
    ensure_allowed_keys(map, &allowed, layer, path)?;

    if let Some(value) = map.get("window_size") {
        expect_u64(value, layer, &join_path(path, "window_size"))?;
    }
    if let Some(value) = map.get("top_k") {
        expect_u64(value, layer, &join_path(path, "top_k"))?;
    }
    if let Some(value) = map.get("serialize_session_turns") {
        expect_bool(value, layer, &join_path(path, "serialize_session_turns"))?;
    }
    if let Some(value) = map.get("fact_kind") {
        expect_string(value, layer, &join_path(path, "fact_kind"))?;
    }
    if let Some(value) = map.get("summary") {
        validate_summary(value, layer, &join_path(path, "summary"))?;
    }
    if let Some(value) = map.get("recall") {
        validate_recall(value, layer, &join_path(path, "recall"))?;
    }
    if let Some(value) = map.get("triggers") {
        let triggers_path = join_path(path, "triggers");
        let triggers = expect_object(value, layer, &triggers_path)?;
        ensure_allowed_keys(
            triggers,
            &["recall_patterns", "persist_patterns"],
            layer,
            &triggers_path,
        )?;
        for key in ["recall_patterns", "persist_patterns"] {
            if let Some(value) = triggers.get(key) {
                validate_string_array(value, layer, &join_path(&triggers_path, key))?;
            }
        }
    }
    Ok(())
}

/// Validate summary settings.
fn validate_summary(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["strategy", "max_chars"], layer, path)?;

    if let Some(value) = map.get("strategy") {
        let strategy_path = join_path(path, "strategy");
        let Some(strategy) = value.as_str() else {
            return Err(invalid_field(layer, &strategy_path, "expected string"));
        };
        if !matches!(strategy, "from_scratch" | "incremental") {
            return Err(invalid_field(layer, &strategy_path, "invalid summary strategy"));
        }
    }
    if let Some(value) = map.get("max_chars")
        && !value.is_null()
    {
        expect_u64(value, layer, &join_path(path, "max_chars"))?;
    }
    Ok(())
}

/// Validate recall settings.
fn validate_recall(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["mode", "text_weight", "vector_weight", "min_score"],
        layer,
        path,
    )?;

    if let Some(value) = map.get("mode") {
        let mode_path = join_path(path, "mode");
        let Some(mode) = value.as_str() else {
            return Err(invalid_field(layer, &mode_path, "expected string"));
        };
        if !matches!(mode, "text" | "vector" | "hybrid") {
            return Err(invalid_field(layer, &mode_path, "invalid recall mode"));
        }
    }
    for key in ["text_weight", "vector_weight"] {
        if let Some(value) = map.get(key) {
            expect_f64(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("min_score")
        && !value.is_null()
    {
        expect_f64(value, layer, &join_path(path, "min_score"))?;
    }
    Ok(())
}

/// Validate the "backends" block.
fn validate_backends(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    let allowed = [
        "backing_store_endpoint",
        "search_store_endpoint",
        "search_index",
    ];
    ensure_allowed_keys(map, &allowed, layer, path)?;
    for key in allowed {
        if let Some(value) = map.get(key) {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "models" block.
fn validate_models(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "embedding_model_ref",
            "generation_model_ref",
            "generation_timeout_secs",
        ],
        layer,
        path,
    )?;
    for key in ["embedding_model_ref", "generation_model_ref"] {
        if let Some(value) = map.get(key)
            && !value.is_null()
        {
            expect_string(value, layer, &join_path(path, key))?;
        }
    }
    if let Some(value) = map.get("generation_timeout_secs") {
        expect_u64(value, layer, &join_path(path, "generation_timeout_secs"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Expect a non-negative integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(entries) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    if let Some(idx) = entries.iter().position(|entry| !entry.is_string()) {
        return Err(invalid_field(
            layer,
            &format!("{path}[{idx}]"),
            "expected string",
        ));
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
