//! Specialization Record Validation
//!
//! Raw JSON records are checked structurally before they may enter the
//! catalog:
//! - Required top-level fields: `name`, `class`, `icon_path`, `effects`
//! - Length limits on every string field
//! - Icon paths follow `[raid]icons/[subfolder/]file.(png|jpg|jpeg|svg)`
//! - Each effect carries a known `type` and `scope`
//!
//! Effect icon paths that miss the pattern only produce a warning since the
//! icon resolver substitutes a fallback for anything it cannot serve.

use crate::constants::{
    MAX_CLASS_LEN, MAX_DESCRIPTION_LEN, MAX_EFFECTS, MAX_ICON_PATH_LEN, MAX_NAME_LEN,
};
use crate::error::ValidationError;
use crate::specialization::{EffectScope, EffectType, Specialization};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

const REQUIRED_FIELDS: [&str; 4] = ["name", "class", "icon_path", "effects"];
const EFFECT_FIELDS: [&str; 5] = ["name", "type", "scope", "description", "icon_path"];

fn icon_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(raid)?icons/([a-zA-Z0-9_-]+/)*[a-zA-Z0-9_-]+\.(png|jpg|jpeg|svg)$")
            .expect("icon path pattern is a valid regex")
    })
}

/// Check an icon path against the servable pattern
pub fn is_valid_icon_path(path: &str) -> bool {
    icon_pattern().is_match(path)
}

/// Collect every structural problem with a raw record. Empty means valid.
pub fn validation_errors(value: &Value) -> Vec<String> {
    let mut errors = Vec::new();

    let Some(obj) = value.as_object() else {
        errors.push("Specialization data must be an object".to_string());
        return errors;
    };

    for field in REQUIRED_FIELDS {
        if !obj.contains_key(field) {
            errors.push(format!("Missing required field: {field}"));
        }
    }
    if !errors.is_empty() {
        return errors;
    }

    match non_empty_str(obj, "name") {
        None => errors.push("Name must be a non-empty string".to_string()),
        Some(name) if char_len(name) > MAX_NAME_LEN => {
            errors.push(format!("Name must be {MAX_NAME_LEN} characters or less"))
        }
        Some(_) => {}
    }

    match non_empty_str(obj, "class") {
        None => errors.push("Class must be a non-empty string".to_string()),
        Some(class) if char_len(class) > MAX_CLASS_LEN => {
            errors.push(format!("Class must be {MAX_CLASS_LEN} characters or less"))
        }
        Some(_) => {}
    }

    match non_empty_str(obj, "icon_path") {
        None => errors.push("Icon path must be a non-empty string".to_string()),
        Some(path) if char_len(path) > MAX_ICON_PATH_LEN => errors.push(format!(
            "Icon path must be {MAX_ICON_PATH_LEN} characters or less"
        )),
        Some(path) if !is_valid_icon_path(path) => errors.push(
            "Icon path must follow pattern: icons/[subfolder/]filename.(png|jpg|jpeg|svg)"
                .to_string(),
        ),
        Some(_) => {}
    }

    match obj.get("effects").and_then(Value::as_array) {
        None => errors.push("Effects must be an array".to_string()),
        Some(effects) if effects.len() > MAX_EFFECTS => {
            errors.push(format!("Effects array must have {MAX_EFFECTS} items or less"))
        }
        Some(effects) => {
            for (index, effect) in effects.iter().enumerate() {
                if let Err(problem) = check_effect(effect) {
                    errors.push(format!("Effect at index {index} is invalid: {problem}"));
                }
            }
        }
    }

    errors
}

/// Validate a raw record and convert it into a typed specialization
pub fn validate_specialization(value: &Value) -> Result<Specialization, ValidationError> {
    let errors = validation_errors(value);
    if !errors.is_empty() {
        return Err(ValidationError::new(errors));
    }
    serde_json::from_value(value.clone()).map_err(|e| ValidationError::single(e.to_string()))
}

fn check_effect(effect: &Value) -> Result<(), String> {
    let obj = effect
        .as_object()
        .ok_or_else(|| "effect must be an object".to_string())?;

    for field in EFFECT_FIELDS {
        if !obj.contains_key(field) {
            return Err(format!("missing field {field}"));
        }
    }

    let name = non_empty_str(obj, "name").ok_or("name must be a non-empty string")?;
    if char_len(name) > MAX_NAME_LEN {
        return Err(format!("name must be {MAX_NAME_LEN} characters or less"));
    }

    let kind = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    if EffectType::parse(kind).is_none() {
        return Err(format!("unknown type '{kind}'"));
    }

    let scope = obj.get("scope").and_then(Value::as_str).unwrap_or_default();
    if EffectScope::parse(scope).is_none() {
        return Err(format!("unknown scope '{scope}'"));
    }

    let description =
        non_empty_str(obj, "description").ok_or("description must be a non-empty string")?;
    if char_len(description) > MAX_DESCRIPTION_LEN {
        return Err(format!(
            "description must be {MAX_DESCRIPTION_LEN} characters or less"
        ));
    }

    let icon = non_empty_str(obj, "icon_path").ok_or("icon path must be a non-empty string")?;
    if char_len(icon) > MAX_ICON_PATH_LEN {
        return Err(format!(
            "icon path must be {MAX_ICON_PATH_LEN} characters or less"
        ));
    }
    if !is_valid_icon_path(icon) {
        tracing::warn!(
            effect = name,
            icon_path = icon,
            "effect icon path does not follow the icon pattern, fallback will be used"
        );
    }

    Ok(())
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
