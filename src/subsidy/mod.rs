use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod backend;
pub mod http;
pub mod store;
pub mod token;

pub use backend::SubsidyBackend;
pub use http::HttpSubsidyBackend;
pub use store::SubsidyStore;
pub use token::{FileTokenStore, StaticToken, TokenSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyCriterion {
    pub id: i64,
    pub text: String,
}

/// A set of subsidy criteria, either a draft or a persisted result.
///
/// A draft has no `saved_id`; the backend assigns one on save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidyResult {
    #[serde(default)]
    pub criteria: Vec<SubsidyCriterion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_selection: Option<bool>,
}

impl SubsidyResult {
    pub fn draft(criteria: Vec<SubsidyCriterion>) -> Self {
        Self {
            criteria,
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.saved_id.is_some()
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.saved_id.as_deref() == Some(id)
    }

    /// Display label: the name, else the timestamp, else the id
    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.timestamp.clone())
            .or_else(|| self.saved_id.clone())
            .unwrap_or_else(|| "Naamloze selectie".to_string())
    }
}

/// Client-generated identifier used when the backend does not return one
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Snapshot of the subsidy store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsidyStoreState {
    pub saved_outputs: Vec<SubsidyResult>,
    pub selected_output: Option<SubsidyResult>,
    pub is_loading: bool,
}
