//! The views a front end can navigate between.

use crate::store::ResultId;
use std::fmt;

/// A navigable view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/` — landing page.
    Home,
    /// `/diagnosis` — upload and processing.
    Diagnosis,
    /// `/results/:id` — a stored result.
    Results(ResultId),
    /// Anything else.
    NotFound(String),
}

impl Route {
    /// Resolve a path; unknown paths (including malformed result ids) map
    /// to [`Route::NotFound`].
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let normalised = trimmed.trim_end_matches('/');
        match normalised {
            "" => Route::Home,
            "/diagnosis" => Route::Diagnosis,
            other => other
                .strip_prefix("/results/")
                .and_then(|id| id.parse().ok())
                .map(Route::Results)
                .unwrap_or_else(|| Route::NotFound(trimmed.to_string())),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Diagnosis => f.write_str("/diagnosis"),
            Route::Results(id) => write!(f, "/results/{id}"),
            Route::NotFound(path) => f.write_str(path),
        }
    }
}
