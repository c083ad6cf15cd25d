use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod routes;
pub mod store;

pub use store::{FilteredModelsWatch, ModelContextStore};

/// Application context selecting which models are relevant for the current screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppContext {
    #[default]
    Chat,
    Versimpelaar,
    Subsidie,
}

impl AppContext {
    pub const ALL: [AppContext; 3] = [
        AppContext::Chat,
        AppContext::Versimpelaar,
        AppContext::Subsidie,
    ];

    /// Capability flag a model must carry to be offered in this context
    pub fn capability_key(&self) -> &'static str {
        match self {
            AppContext::Chat => "chat_app_access",
            AppContext::Versimpelaar => "versimpelaar_app_access",
            AppContext::Subsidie => "subsidie_app_access",
        }
    }
}

impl std::fmt::Display for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppContext::Chat => write!(f, "chat"),
            AppContext::Versimpelaar => write!(f, "versimpelaar"),
            AppContext::Subsidie => write!(f, "subsidie"),
        }
    }
}

impl std::str::FromStr for AppContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(AppContext::Chat),
            "versimpelaar" => Ok(AppContext::Versimpelaar),
            "subsidie" => Ok(AppContext::Subsidie),
            other => Err(format!("unknown app context '{}'", other)),
        }
    }
}

/// What to show when a non-empty model list has no model for the current context
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyMatchPolicy {
    #[default]
    FailClosed,
    ShowAll,
}

/// A model as published by the model registry. Unknown fields are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<ModelInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ModelMeta>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    #[serde(default)]
    pub capabilities: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            info: None,
            extra: Map::new(),
        }
    }

    pub fn with_capability(mut self, key: &str, enabled: bool) -> Self {
        self.info
            .get_or_insert_with(ModelInfo::default)
            .meta
            .get_or_insert_with(ModelMeta::default)
            .capabilities
            .insert(key.to_string(), Value::Bool(enabled));
        self
    }

    /// Only a literal JSON `true` grants the capability
    pub fn has_capability(&self, key: &str) -> bool {
        self.info
            .as_ref()
            .and_then(|info| info.meta.as_ref())
            .and_then(|meta| meta.capabilities.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelList {
    Bare(Vec<ModelDescriptor>),
    Wrapped { data: Vec<ModelDescriptor> },
}

/// Parse a model list as served by the model registry: either a bare array
/// or the `{"data": [...]}` envelope of `/api/models`.
pub fn parse_model_list(json: &str) -> crate::error::Result<Vec<ModelDescriptor>> {
    match serde_json::from_str::<ModelList>(json) {
        Ok(ModelList::Bare(models)) | Ok(ModelList::Wrapped { data: models }) => Ok(models),
        Err(_) => {
            // Re-parse as a bare array for a precise error location
            let models: Vec<ModelDescriptor> = serde_json::from_str(json)?;
            Ok(models)
        }
    }
}

/// Models usable in `context`, in input order.
///
/// `None` and an empty slice both mean "not loaded" and yield an empty list.
/// `policy` only kicks in when models are loaded but none carries the key.
pub fn filter_models(
    models: Option<&[ModelDescriptor]>,
    context: AppContext,
    policy: EmptyMatchPolicy,
) -> Vec<ModelDescriptor> {
    let models = match models {
        Some(models) if !models.is_empty() => models,
        _ => {
            tracing::debug!("No models available or models not loaded yet");
            return Vec::new();
        }
    };

    let key = context.capability_key();
    let matching: Vec<ModelDescriptor> = models
        .iter()
        .filter(|m| m.has_capability(key))
        .cloned()
        .collect();

    tracing::debug!(
        "{} context: {} of {} models carry {}",
        context,
        matching.len(),
        models.len(),
        key
    );

    if matching.is_empty() && policy == EmptyMatchPolicy::ShowAll {
        tracing::debug!("No model matches {}, showing all models", key);
        return models.to_vec();
    }

    matching
}
