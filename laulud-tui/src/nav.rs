//! Routes, view switching and the auth redirect.
//!
//! A route is the textual address of what is on screen, e.g.
//! `/search/spotify:track:123?q=myth`. It is persisted between runs and used
//! as the `next` target of the login redirect.

use laulud_client::AuthStatus;
use laulud_core::{SpotifyUri, ValidationError};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Search,
    Tags,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Search => "Search",
            View::Tags => "Tags",
        }
    }

    pub fn all() -> &'static [View] {
        &[View::Search, View::Tags]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn next(&self) -> View {
        let all = Self::all();
        all[(self.index() + 1) % all.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login {
        next: Option<String>,
    },
    Search {
        uri: Option<SpotifyUri>,
        query: Option<String>,
    },
    Tags {
        tag: Option<String>,
    },
}

impl Default for Route {
    fn default() -> Self {
        Route::search()
    }
}

impl Route {
    pub fn search() -> Self {
        Route::Search {
            uri: None,
            query: None,
        }
    }

    pub fn login(next: &Route) -> Self {
        Route::Login {
            next: Some(next.to_string()),
        }
    }

    /// The tabbed view this route belongs to.
    pub fn view(&self) -> Option<View> {
        match self {
            Route::Search { .. } => Some(View::Search),
            Route::Tags { .. } => Some(View::Tags),
            Route::Home | Route::Login { .. } => None,
        }
    }

    pub fn is_login(&self) -> bool {
        matches!(self, Route::Login { .. })
    }
}

/// Where the user may actually go given the session state. Unauthenticated
/// users land on the login page with their original route as `next`;
/// authenticated users are sent on from the login page and from home.
pub fn guard(route: Route, auth: &AuthStatus) -> Route {
    match auth {
        AuthStatus::Checking => route,
        AuthStatus::Unauthenticated => match route {
            Route::Login { .. } => route,
            other => Route::login(&other),
        },
        AuthStatus::Authenticated => match route {
            Route::Home => Route::search(),
            Route::Login { next } => next
                .and_then(|next| next.parse::<Route>().ok())
                .filter(|next| next.view().is_some())
                .unwrap_or_default(),
            other => other,
        },
    }
}

fn invalid(path: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidRoute {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

fn decode(path: &str, value: &str) -> Result<String, ValidationError> {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid(path, "invalid percent-encoding"))
}

impl FromStr for Route {
    type Err = ValidationError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let (location, query_string) = match path.split_once('?') {
            Some((location, query_string)) => (location, query_string),
            None => (path, ""),
        };
        let mut params = Vec::new();
        for pair in query_string.split('&').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            params.push((key, decode(path, value)?));
        }
        let param = |name: &str| {
            params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.clone())
                .filter(|value| !value.is_empty())
        };

        let segments: Vec<&str> = location.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Ok(Route::Home),
            ["login"] => Ok(Route::Login {
                next: param("next"),
            }),
            ["search"] => Ok(Route::Search {
                uri: None,
                query: param("q"),
            }),
            ["search", uri] => {
                let uri = decode(path, uri)?
                    .parse::<SpotifyUri>()
                    .map_err(|err| invalid(path, &err.to_string()))?;
                Ok(Route::Search {
                    uri: Some(uri),
                    query: param("q"),
                })
            }
            ["tags"] => Ok(Route::Tags { tag: None }),
            ["tags", tag] => Ok(Route::Tags {
                tag: Some(decode(path, tag)?),
            }),
            _ => Err(invalid(path, "unknown route")),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Login { next } => {
                f.write_str("/login")?;
                if let Some(next) = next {
                    write!(f, "?next={}", urlencoding::encode(next))?;
                }
                Ok(())
            }
            Route::Search { uri, query } => {
                f.write_str("/search")?;
                if let Some(uri) = uri {
                    write!(f, "/{}", uri)?;
                }
                if let Some(query) = query {
                    write!(f, "?q={}", urlencoding::encode(query))?;
                }
                Ok(())
            }
            Route::Tags { tag } => {
                f.write_str("/tags")?;
                if let Some(tag) = tag {
                    write!(f, "/{}", urlencoding::encode(tag))?;
                }
                Ok(())
            }
        }
    }
}
