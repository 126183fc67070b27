//! Setting value validation.

use regex::Regex;
use std::sync::LazyLock;

use unifiedpush::QuirkTable;
use unifiedpush::endpoint::is_valid_endpoint;

static RE_BASE64URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+={0,2}$").unwrap());

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "notification_style" => {
            if !["multi", "hybrid", "single"].contains(&value) {
                return Err("must be 'multi' or 'hybrid'".into());
            }
        }
        "retry_max_attempts" => validate_int_range(value, 1, 50)?,
        "retry_base_delay_ms" => validate_int_range(value, 100, 60_000)?,
        "retry_max_delay_ms" => validate_int_range(value, 1000, 600_000)?,
        "server_port" => validate_int_range(value, 1, 65_535)?,
        "current_endpoint" => {
            if !value.is_empty() && !is_valid_endpoint(value) {
                return Err("must be a reachable http(s) URL".into());
            }
        }
        "vapid_public_key" | "vapid_private_key" | "webpush_public_key" | "webpush_auth_secret" => {
            if !value.is_empty() && !RE_BASE64URL.is_match(value) {
                return Err("must be base64url encoded".into());
            }
        }
        "distributor_quirks" => {
            if !value.trim().is_empty() {
                QuirkTable::from_json(value).map_err(|e| e.to_string())?;
            }
        }
        k if is_boolean_setting(k) => {
            if value != "true" && value != "false" {
                return Err("must be 'true' or 'false'".into());
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

fn is_boolean_setting(key: &str) -> bool {
    matches!(
        key,
        "first_launch" | "notification_style_set" | "notifications_enabled" | "vapid_enabled"
    )
}
