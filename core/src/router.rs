//! Route table and authentication guard for the UI.
//!
//! # Design
//! The table is static and never mutated. The guard is a pure function of
//! the target path and whether a token exists; `Navigator` re-reads the
//! token from its `SessionStore` on every navigation so a login or logout is
//! picked up immediately.

use tracing::{debug, warn};

use crate::session::{SessionStore, TokenStore};

pub const LOGIN_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// The screen a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Signup,
    Dashboard,
    Folders,
    FolderDetail,
    Agriculture,
    Livestock,
    Metrics,
    Review,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Pattern: literal segments, `:name` captures, and a trailing optional `:name?`.
    pub path: &'static str,
    pub name: &'static str,
    pub view: View,
    pub requires_auth: bool,
}

pub static ROUTES: &[RouteDescriptor] = &[
    RouteDescriptor {
        path: "/",
        name: "Login",
        view: View::Login,
        requires_auth: false,
    },
    RouteDescriptor {
        path: "/signup",
        name: "Signup",
        view: View::Signup,
        requires_auth: false,
    },
    RouteDescriptor {
        path: "/dashboard",
        name: "Dashboard",
        view: View::Dashboard,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/folders",
        name: "Folders",
        view: View::Folders,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/folders/:id",
        name: "FolderDetail",
        view: View::FolderDetail,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/agriculture/:superKeyId?",
        name: "Agriculture",
        view: View::Agriculture,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/livestock/:superKeyId?",
        name: "Livestock",
        view: View::Livestock,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/metrics/:superKeyId",
        name: "Metrics",
        view: View::Metrics,
        requires_auth: true,
    },
    RouteDescriptor {
        path: "/review",
        name: "Review",
        view: View::Review,
        requires_auth: true,
    },
];

/// A concrete path matched against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static RouteDescriptor,
    pub params: Vec<(String, String)>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of a navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Redirect(&'static str),
}

/// Strip query string, fragment and redundant slashes.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segments: Vec<&str> = segments(path).collect();
    format!("/{}", segments.join("/"))
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Find the first route whose pattern matches `path`.
///
/// Literal segments match without regard to ASCII case; captured parameters
/// keep the case they were sent with.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let path = normalize_path(path);
    let actual: Vec<&str> = segments(&path).collect();
    ROUTES.iter().find_map(|route| {
        match_pattern(route.path, &actual).map(|params| RouteMatch { route, params })
    })
}

fn match_pattern(pattern: &str, actual: &[&str]) -> Option<Vec<(String, String)>> {
    let mut params = Vec::new();
    let mut rest = actual.iter();

    for part in segments(pattern) {
        match part.strip_prefix(':') {
            Some(param) => {
                let (name, optional) = match param.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (param, false),
                };
                match rest.next() {
                    Some(value) => params.push((name.to_string(), (*value).to_string())),
                    None if optional => {}
                    None => return None,
                }
            }
            None => match rest.next() {
                Some(value) if value.eq_ignore_ascii_case(part) => {}
                _ => return None,
            },
        }
    }

    if rest.next().is_some() {
        return None;
    }
    Some(params)
}

/// Decide a navigation to `to` given whether a session token exists.
///
/// Paths outside the table carry no auth requirement and are allowed.
pub fn guard(to: &str, has_token: bool) -> NavigationDecision {
    let requires_auth = resolve(to).is_some_and(|m| m.route.requires_auth);
    if requires_auth && !has_token {
        NavigationDecision::Redirect(LOGIN_PATH)
    } else if normalize_path(to) == LOGIN_PATH && has_token {
        NavigationDecision::Redirect(DASHBOARD_PATH)
    } else {
        NavigationDecision::Allow
    }
}

/// Applies `guard` using the token currently held by a `SessionStore`.
pub struct Navigator<'a, S: TokenStore> {
    sessions: &'a SessionStore<S>,
}

impl<'a, S: TokenStore> Navigator<'a, S> {
    pub fn new(sessions: &'a SessionStore<S>) -> Self {
        Self { sessions }
    }

    pub fn navigate(&self, to: &str, from: &str) -> NavigationDecision {
        let has_token = match self.sessions.current() {
            Ok(session) => session.is_some(),
            Err(e) => {
                warn!(error = %e, "token storage read failed; treating as signed out");
                false
            }
        };
        let decision = guard(to, has_token);
        if let NavigationDecision::Redirect(target) = decision {
            debug!(from, to, redirect = target, "navigation redirected");
        }
        decision
    }
}
