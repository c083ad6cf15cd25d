use crate::models::AppContext;

/// How a rule matches a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMatch {
    Contains(&'static str),
    Exact(&'static str),
}

impl RouteMatch {
    pub fn matches(&self, route: &str) -> bool {
        match self {
            RouteMatch::Contains(fragment) => route.contains(fragment),
            RouteMatch::Exact(path) => route == *path,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub matchers: &'static [RouteMatch],
    pub context: AppContext,
}

/// Ordered; the first rule with a matching matcher wins.
pub const ROUTE_RULES: &[RouteRule] = &[
    RouteRule {
        matchers: &[RouteMatch::Contains("/app-launcher/versimpelaar")],
        context: AppContext::Versimpelaar,
    },
    // Older deployments mount the simplifier under its B1 language-level name
    RouteRule {
        matchers: &[RouteMatch::Contains("/app-launcher/b1-taalniveau")],
        context: AppContext::Versimpelaar,
    },
    RouteRule {
        matchers: &[RouteMatch::Contains("/app-launcher/subsidies")],
        context: AppContext::Subsidie,
    },
    RouteRule {
        matchers: &[
            RouteMatch::Contains("/chat"),
            RouteMatch::Exact("/"),
            RouteMatch::Exact("/(app)"),
            RouteMatch::Exact("/(app)/"),
        ],
        context: AppContext::Chat,
    },
];

/// Context for a route, or `None` for routes outside the app surface
/// (admin pages, settings, ...) which must leave the current context alone.
pub fn context_for_route(route: &str) -> Option<AppContext> {
    if route.is_empty() {
        return None;
    }

    ROUTE_RULES
        .iter()
        .find(|rule| rule.matchers.iter().any(|m| m.matches(route)))
        .map(|rule| rule.context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_launcher_routes() {
        assert_eq!(
            context_for_route("/app-launcher/versimpelaar"),
            Some(AppContext::Versimpelaar)
        );
        assert_eq!(
            context_for_route("/app-launcher/b1-taalniveau/editor"),
            Some(AppContext::Versimpelaar)
        );
        assert_eq!(
            context_for_route("/app-launcher/subsidies"),
            Some(AppContext::Subsidie)
        );
    }

    #[test]
    fn test_chat_routes() {
        assert_eq!(context_for_route("/"), Some(AppContext::Chat));
        assert_eq!(context_for_route("/(app)"), Some(AppContext::Chat));
        assert_eq!(context_for_route("/(app)/"), Some(AppContext::Chat));
        assert_eq!(
            context_for_route("/chat/3f2c9a10"),
            Some(AppContext::Chat)
        );
    }

    #[test]
    fn test_unrelated_routes_are_ignored() {
        assert_eq!(context_for_route("/admin/settings"), None);
        assert_eq!(context_for_route("/workspace/models"), None);
        assert_eq!(context_for_route(""), None);
    }

    #[test]
    fn test_first_rule_wins() {
        // Contains both the simplifier path and "/chat"
        assert_eq!(
            context_for_route("/app-launcher/versimpelaar/chat"),
            Some(AppContext::Versimpelaar)
        );
    }
}
