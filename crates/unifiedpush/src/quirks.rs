//! Per-distributor workarounds, matched by configuration instead of code.

use serde::{Deserialize, Serialize};

use crate::PushError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quirk {
    /// Case-insensitive substring of the distributor identifier.
    pub pattern: String,
    /// Unregister before registering.
    #[serde(default)]
    pub clean_start: bool,
    /// Wait this long between the clean-start unregister and the register.
    #[serde(default)]
    pub settle_delay_ms: u64,
    /// Re-issue the registration once if no outcome arrived by then.
    #[serde(default)]
    pub verify_after_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuirkTable {
    quirks: Vec<Quirk>,
}

impl QuirkTable {
    pub fn new(quirks: Vec<Quirk>) -> Self {
        Self { quirks }
    }

    /// NextPush drops registrations that arrive right after a previous one.
    pub fn builtin() -> Self {
        Self::new(vec![Quirk {
            pattern: "nextpush".into(),
            clean_start: true,
            settle_delay_ms: 2000,
            verify_after_ms: Some(5000),
        }])
    }

    pub fn from_json(json: &str) -> Result<Self, PushError> {
        let table: Self = serde_json::from_str(json)?;
        if table.quirks.iter().any(|q| q.pattern.trim().is_empty()) {
            return Err(PushError::InvalidQuirks("empty pattern".into()));
        }
        Ok(table)
    }

    /// First quirk whose pattern occurs in `distributor`.
    pub fn lookup(&self, distributor: &str) -> Option<&Quirk> {
        let distributor = distributor.to_lowercase();
        self.quirks
            .iter()
            .find(|q| distributor.contains(&q.pattern.trim().to_lowercase()))
    }

    pub fn is_empty(&self) -> bool {
        self.quirks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.quirks.len()
    }
}
