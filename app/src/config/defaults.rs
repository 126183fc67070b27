//! All setting definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

type DefTuple = (&'static str, &'static str, bool, bool, &'static str);

const DEFS: &[DefTuple] = &[
    // (key, default, secret, required, description)
    ("first_launch", "true", false, false, "Show the setup screen on next start"),
    ("notification_style", "hybrid", false, false, "multi: one notification per message, hybrid: replace in place"),
    ("notification_style_set", "false", false, false, "Whether the user has picked a notification style"),
    ("notifications_enabled", "true", false, false, "Master switch for message notifications"),
    ("current_distributor", "", false, false, "Distributor used for the last registration"),
    ("current_endpoint", "", false, false, "Push endpoint from the last successful registration"),
    ("vapid_enabled", "false", false, false, "Attach a VAPID public key when registering"),
    ("vapid_public_key", "", false, false, "VAPID public key (base64url, uncompressed P-256)"),
    ("vapid_private_key", "", true, false, "VAPID private key (base64url)"),
    ("webpush_public_key", "", true, false, "Web push public key handed over by the distributor"),
    ("webpush_auth_secret", "", true, false, "Web push auth secret handed over by the distributor"),
    ("push_instance", "", false, false, "Instance token identifying this installation"),
    ("up_saved_distributor", "", false, false, "Distributor selection kept by the D-Bus connector"),
    ("retry_max_attempts", "5", false, false, "Automatic registration retries before giving up"),
    ("retry_base_delay_ms", "1000", false, false, "Delay before the first automatic retry"),
    ("retry_max_delay_ms", "30000", false, false, "Upper bound for the retry delay"),
    ("distributor_quirks", "", false, false, "JSON array overriding the built-in distributor quirks"),
    ("server_port", "8737", false, true, "Local API port"),
];

/// A single setting definition.
#[derive(Debug, Clone)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub secret: bool,
    pub required: bool,
    pub description: &'static str,
}

/// Global setting definitions indexed by key.
pub static DEFAULT_SETTINGS: LazyLock<HashMap<&'static str, SettingDef>> = LazyLock::new(|| {
    DEFS.iter()
        .map(|&(key, default, secret, required, description)| {
            (
                key,
                SettingDef {
                    key,
                    default,
                    secret,
                    required,
                    description,
                },
            )
        })
        .collect()
});

/// Get the default value for a setting key, or `None` if not defined.
pub fn get_default(key: &str) -> Option<&'static str> {
    DEFAULT_SETTINGS.get(key).map(|d| d.default)
}
