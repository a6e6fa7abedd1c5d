//! Dot-separated key access over a serde_json tree, shared by the TOML
//! config and the stored preferences.

use serde_json::Value;

use crate::error::ConfigError;

pub(crate) fn get<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    if key.is_empty() {
        return None;
    }

    let mut current = root;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Render a leaf for display: strings unquoted, everything else as JSON.
pub(crate) fn get_string(root: &Value, key: &str) -> Option<String> {
    match get(root, key)? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Replace an existing leaf, parsing `value` according to the leaf's
/// current type. Unknown keys are rejected.
pub(crate) fn set(root: &mut Value, key: &str, value: &str) -> Result<(), ConfigError> {
    let unknown = || ConfigError::UnknownKey(key.to_string());
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };

    let mut parts = key.split('.').peekable();
    if key.is_empty() {
        return Err(unknown());
    }

    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_some() {
            current = current.get_mut(part).ok_or_else(unknown)?;
            continue;
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(part).ok_or_else(unknown)?;

        let new_value = match existing {
            Value::Bool(_) => Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    Value::Number(n.into())
                } else if let Ok(n) = value.parse::<i64>() {
                    Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            Value::Object(_) | Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            // Unset optional: take JSON if it parses, otherwise a plain string.
            Value::Null => {
                serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()))
            }
            Value::String(_) => Value::String(value.into()),
        };

        obj.insert(part.to_string(), new_value);
        return Ok(());
    }

    Err(unknown())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_get_and_set() {
        let mut root = json!({ "engine": { "tick_interval_ms": 10, "label": "x" }, "flag": true });
        set(&mut root, "engine.tick_interval_ms", "25").unwrap();
        set(&mut root, "flag", "false").unwrap();
        set(&mut root, "engine.label", "hello").unwrap();
        assert_eq!(get(&root, "engine.tick_interval_ms"), Some(&json!(25)));
        assert_eq!(get_string(&root, "engine.label").as_deref(), Some("hello"));
        assert_eq!(get_string(&root, "flag").as_deref(), Some("false"));
    }

    #[test]
    fn rejects_unknown_and_mistyped() {
        let mut root = json!({ "a": { "b": true } });
        assert!(matches!(
            set(&mut root, "a.c", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            set(&mut root, "a.b", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(set(&mut root, "", "1").is_err());
    }

    #[test]
    fn arrays_parse_as_json() {
        let mut root = json!({ "presets": [] });
        set(&mut root, "presets", "[60000, 300000]").unwrap();
        assert_eq!(get(&root, "presets"), Some(&json!([60000, 300000])));
    }
}
