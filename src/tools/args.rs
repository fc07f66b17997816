//! Argument extraction for tool calls: required/optional strings, clamped limits.

use serde_json::Value;

pub fn get_string(args: &Value, key: &str) -> Result<String, String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| format!("missing or invalid '{key}'"))
}

pub fn get_opt_string(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Numeric limit, defaulted then clamped to `[1, max]`.
pub fn get_limit(args: &Value, key: &str, default: u32, max: u32) -> u32 {
    args.get(key)
        .and_then(Value::as_u64)
        .map_or(default, |v| (v as u32).clamp(1, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_string_rejects_missing_empty_and_nonstring() {
        assert!(get_string(&json!({}), "channel").is_err());
        assert!(get_string(&json!({ "channel": "" }), "channel").is_err());
        assert!(get_string(&json!({ "channel": "   " }), "channel").is_err());
        assert!(get_string(&json!({ "channel": 7 }), "channel").is_err());
        assert_eq!(
            get_string(&json!({ "channel": " C1 " }), "channel").unwrap(),
            "C1"
        );
    }

    #[test]
    fn limit_clamps_to_range() {
        assert_eq!(get_limit(&json!({}), "limit", 20, 100), 20);
        assert_eq!(get_limit(&json!({ "limit": 0 }), "limit", 20, 100), 1);
        assert_eq!(get_limit(&json!({ "limit": 5000 }), "limit", 20, 100), 100);
        assert_eq!(get_limit(&json!({ "limit": 50 }), "limit", 20, 100), 50);
    }
}
