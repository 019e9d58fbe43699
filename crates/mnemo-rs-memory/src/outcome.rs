//! Outcome types that make degraded search modes observable.

use crate::model::ScoredMemory;
use serde::{Deserialize, Serialize};

/// Availability of one scoring signal during an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum SignalStatus {
    #[default]
    Available,
    /// The signal could not be used; the reason is kept for callers and logs.
    Degraded(String),
}

impl SignalStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, SignalStatus::Available)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            SignalStatus::Available => None,
            SignalStatus::Degraded(reason) => Some(reason),
        }
    }
}

/// Ranked hits plus the state of each signal that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub hits: Vec<ScoredMemory>,
    /// Semantic (embedding) signal.
    pub vector: SignalStatus,
    /// Lexical (full-text) signal.
    pub keyword: SignalStatus,
    /// Stored vectors skipped because their layout did not match the dimension.
    pub skipped_vectors: usize,
}

impl SearchOutcome {
    /// True when either signal was unavailable.
    pub fn is_degraded(&self) -> bool {
        !self.vector.is_available() || !self.keyword.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::SignalStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn status_serializes_with_state_tag() {
        assert_eq!(
            serde_json::to_value(SignalStatus::Available).expect("serialize"),
            json!({ "state": "available" })
        );
        let degraded = SignalStatus::Degraded("model missing".to_string());
        assert_eq!(
            serde_json::to_value(&degraded).expect("serialize"),
            json!({ "state": "degraded", "reason": "model missing" })
        );
        assert_eq!(degraded.reason(), Some("model missing"));
    }
}
