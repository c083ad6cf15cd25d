use tokio::sync::watch;

use crate::models::routes::context_for_route;
use crate::models::{filter_models, AppContext, EmptyMatchPolicy, ModelDescriptor};

/// Session-scoped holder of the current app context and the loaded model list.
///
/// Both cells are `watch` channels, so subscribers see whole values only and
/// recompute the filtered view from one consistent snapshot.
pub struct ModelContextStore {
    context: watch::Sender<AppContext>,
    models: watch::Sender<Option<Vec<ModelDescriptor>>>,
    policy: EmptyMatchPolicy,
}

impl ModelContextStore {
    pub fn new(policy: EmptyMatchPolicy) -> Self {
        let (context, _) = watch::channel(AppContext::default());
        let (models, _) = watch::channel(None);
        Self {
            context,
            models,
            policy,
        }
    }

    pub fn context(&self) -> AppContext {
        *self.context.borrow()
    }

    /// Returns true when the context actually changed
    pub fn set_context(&self, context: AppContext) -> bool {
        self.context.send_if_modified(|current| {
            if *current == context {
                return false;
            }
            *current = context;
            true
        })
    }

    pub fn set_context_from_route(&self, route: &str) -> AppContext {
        match context_for_route(route) {
            Some(context) => {
                if self.set_context(context) {
                    tracing::info!("App context set to {} for route {}", context, route);
                }
                context
            }
            None => {
                let current = self.context();
                tracing::debug!("Route {} is outside the app surface, keeping {}", route, current);
                current
            }
        }
    }

    /// `None` marks the model list as not loaded
    pub fn set_models(&self, models: Option<Vec<ModelDescriptor>>) {
        self.models.send_replace(models);
    }

    pub fn filtered_models(&self) -> Vec<ModelDescriptor> {
        let context = self.context();
        let models = self.models.borrow();
        filter_models(models.as_deref(), context, self.policy)
    }

    pub fn subscribe(&self) -> FilteredModelsWatch {
        FilteredModelsWatch {
            context: self.context.subscribe(),
            models: self.models.subscribe(),
            policy: self.policy,
        }
    }
}

impl Default for ModelContextStore {
    fn default() -> Self {
        Self::new(EmptyMatchPolicy::default())
    }
}

/// Derived view over a [`ModelContextStore`], recomputed on demand.
pub struct FilteredModelsWatch {
    context: watch::Receiver<AppContext>,
    models: watch::Receiver<Option<Vec<ModelDescriptor>>>,
    policy: EmptyMatchPolicy,
}

impl FilteredModelsWatch {
    /// Filtered models for the latest context and model list; marks both as seen
    pub fn current(&mut self) -> Vec<ModelDescriptor> {
        let context = *self.context.borrow_and_update();
        let models = self.models.borrow_and_update();
        filter_models(models.as_deref(), context, self.policy)
    }

    pub fn has_changed(&self) -> bool {
        self.context.has_changed().unwrap_or(false) || self.models.has_changed().unwrap_or(false)
    }

    /// Waits until either input changes and returns the recomputed view.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Vec<ModelDescriptor>> {
        let result = tokio::select! {
            r = self.context.changed() => r,
            r = self.models.changed() => r,
        };
        result.ok()?;
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_models() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("a", "A").with_capability("chat_app_access", true),
            ModelDescriptor::new("b", "B").with_capability("versimpelaar_app_access", true),
        ]
    }

    fn ids(models: &[ModelDescriptor]) -> Vec<String> {
        models.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn test_context_switch_scenario() {
        let store = ModelContextStore::default();
        store.set_models(Some(scenario_models()));

        assert_eq!(store.context(), AppContext::Chat);
        assert_eq!(ids(&store.filtered_models()), vec!["a"]);

        store.set_context_from_route("/app-launcher/versimpelaar");
        assert_eq!(store.context(), AppContext::Versimpelaar);
        assert_eq!(ids(&store.filtered_models()), vec!["b"]);
    }

    #[test]
    fn test_route_mapping_is_idempotent() {
        let store = ModelContextStore::default();
        let once = store.set_context_from_route("/app-launcher/subsidies");
        let twice = store.set_context_from_route("/app-launcher/subsidies");
        assert_eq!(once, twice);
        assert_eq!(store.context(), AppContext::Subsidie);
    }

    #[test]
    fn test_unrecognized_route_keeps_context() {
        let store = ModelContextStore::default();
        store.set_context(AppContext::Versimpelaar);
        let context = store.set_context_from_route("/admin/settings");
        assert_eq!(context, AppContext::Versimpelaar);
        assert_eq!(store.context(), AppContext::Versimpelaar);
    }

    #[test]
    fn test_not_loaded_models_give_empty_view() {
        let store = ModelContextStore::new(EmptyMatchPolicy::ShowAll);
        assert!(store.filtered_models().is_empty());
        store.set_models(Some(Vec::new()));
        assert!(store.filtered_models().is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_recomputes_on_context_change() {
        let store = ModelContextStore::default();
        store.set_models(Some(scenario_models()));

        let mut view = store.subscribe();
        assert_eq!(ids(&view.current()), vec!["a"]);

        store.set_context_from_route("/app-launcher/versimpelaar");
        let updated = view.changed().await.unwrap();
        assert_eq!(ids(&updated), vec!["b"]);
    }

    #[tokio::test]
    async fn test_subscriber_recomputes_on_model_change() {
        let store = ModelContextStore::default();
        let mut view = store.subscribe();
        assert!(view.current().is_empty());

        store.set_models(Some(scenario_models()));
        let updated = view.changed().await.unwrap();
        assert_eq!(ids(&updated), vec!["a"]);
    }

    #[test]
    fn test_same_context_does_not_notify() {
        let store = ModelContextStore::default();
        let mut view = store.subscribe();
        view.current();

        assert!(!store.set_context(AppContext::Chat));
        store.set_context_from_route("/chat/abc");
        assert!(!view.has_changed());

        assert!(store.set_context(AppContext::Subsidie));
        assert!(view.has_changed());
    }

    #[tokio::test]
    async fn test_changed_returns_none_after_store_dropped() {
        let store = ModelContextStore::default();
        let mut view = store.subscribe();
        drop(store);
        assert!(view.changed().await.is_none());
    }
}
