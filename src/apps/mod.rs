use serde_json::Value;

use crate::models::AppContext;

/// Signed-in user as delivered by the auth layer: an open attribute bag.
///
/// Lookups never fail; anything missing, `null` or of the wrong type reads as
/// "not granted".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User(Value);

impl User {
    pub fn new(attributes: Value) -> Self {
        Self(attributes)
    }

    pub fn anonymous() -> Self {
        Self(Value::Null)
    }

    pub fn role(&self) -> Option<&str> {
        self.0.get("role").and_then(Value::as_str)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some("admin")
    }

    /// Boolean at a nested path, e.g. `["permissions", "app_launcher", "versimpelaar"]`
    pub fn flag(&self, path: &[&str]) -> bool {
        path.iter()
            .try_fold(&self.0, |value, key| value.get(*key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl From<Value> for User {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// An entry of the app launcher
#[derive(Debug, Clone, Copy)]
pub struct AppDescriptor {
    pub name: &'static str,
    pub icon: &'static str,
    pub route: &'static str,
    pub capability_key: Option<&'static str>,
    pub context: AppContext,
    permission: fn(&User) -> bool,
}

impl AppDescriptor {
    pub fn is_permitted(&self, user: &User) -> bool {
        (self.permission)(user)
    }
}

fn always(_user: &User) -> bool {
    true
}

fn can_use_versimpelaar(user: &User) -> bool {
    user.is_admin() || user.flag(&["permissions", "app_launcher", "versimpelaar"])
}

fn can_use_subsidies(user: &User) -> bool {
    user.is_admin() || user.flag(&["permissions", "app_launcher", "subsidies"])
}

static APPS: &[AppDescriptor] = &[
    AppDescriptor {
        name: "Chat",
        icon: "💬",
        route: "/",
        capability_key: Some("chat_app_access"),
        context: AppContext::Chat,
        permission: always,
    },
    AppDescriptor {
        name: "Versimpelaar",
        icon: "🔤",
        route: "/app-launcher/versimpelaar",
        capability_key: Some("versimpelaar_app_access"),
        context: AppContext::Versimpelaar,
        permission: can_use_versimpelaar,
    },
    AppDescriptor {
        name: "Subsidies",
        icon: "💶",
        route: "/app-launcher/subsidies",
        capability_key: Some("subsidie_app_access"),
        context: AppContext::Subsidie,
        permission: can_use_subsidies,
    },
];

/// Every registered app, in declaration order
pub fn apps() -> &'static [AppDescriptor] {
    APPS
}

/// Apps the user may open, in declaration order
pub fn list_apps(user: &User) -> Vec<&'static AppDescriptor> {
    APPS.iter().filter(|app| app.is_permitted(user)).collect()
}

pub fn find_by_route(route: &str) -> Option<&'static AppDescriptor> {
    APPS.iter().find(|app| app.route == route)
}
