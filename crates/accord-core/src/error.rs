//! Error types for Accord.
//!
//! - [`ContractError`] - a contract, or an implementation tree, is malformed.
//!   Raised while building, never while serving.
//! - [`RequestValidationError`] - one or more request facets failed their
//!   schema. Carries every failing facet so the server can report them
//!   together.
//! - [`ResponseValidationError`] - a handler produced a body its declared
//!   response schema rejects.

use std::fmt;

use accord_router::TemplateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::Issues;

/// Result type alias using [`ContractError`].
pub type ContractResult<T> = Result<T, ContractError>;

/// The kind of node at some position of a contract or implementation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A single endpoint.
    Route,
    /// A named group of nodes.
    Router,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route => f.write_str("route"),
            Self::Router => f.write_str("router"),
        }
    }
}

/// Errors raised while building contracts and resolving implementations.
///
/// Key paths are the dotted names of nodes from the contract root, for
/// example `posts.getPost`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A route path template is malformed.
    #[error("invalid path `{path}`: {source}")]
    InvalidPath {
        /// The offending template.
        path: String,
        /// Why it was rejected.
        #[source]
        source: TemplateError,
    },

    /// A declared response status is outside `100..=599`.
    #[error("invalid response status {status} on route `{path}`")]
    InvalidStatus {
        /// Route path.
        path: String,
        /// The status.
        status: u16,
    },

    /// A router declares the same key twice.
    #[error("duplicate key `{key}`")]
    DuplicateKey {
        /// Key path of the duplicate.
        key: String,
    },

    /// The contract has a route where the implementation has a router.
    #[error("expected route but got router at `{path}`")]
    ExpectedRoute {
        /// Key path of the node.
        path: String,
    },

    /// The contract has a router where the implementation has a leaf.
    #[error("expected router but got route at `{path}`")]
    ExpectedRouter {
        /// Key path of the node.
        path: String,
    },

    /// A contract route has no implementation.
    #[error("missing implementation for `{path}`")]
    MissingImplementation {
        /// Key path of the route.
        path: String,
    },

    /// An implementation has no counterpart in the contract.
    #[error("implementation `{path}` does not match any contract route")]
    UnknownImplementation {
        /// Key path of the implementation.
        path: String,
    },
}

impl ContractError {
    /// Returns the key path or route path the error refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidPath { path, .. }
            | Self::InvalidStatus { path, .. }
            | Self::ExpectedRoute { path }
            | Self::ExpectedRouter { path }
            | Self::MissingImplementation { path }
            | Self::UnknownImplementation { path } => path,
            Self::DuplicateKey { key } => key,
        }
    }
}

/// A request facet that is validated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Facet {
    /// Path parameters.
    PathParams,
    /// Headers.
    Headers,
    /// Query parameters.
    Query,
    /// Body.
    Body,
}

impl Facet {
    /// All facets, in reporting order.
    pub const ALL: [Self; 4] = [Self::PathParams, Self::Headers, Self::Query, Self::Body];

    /// Returns the key used for this facet in combined error bodies.
    #[must_use]
    pub const fn error_key(self) -> &'static str {
        match self {
            Self::PathParams => "pathParameterErrors",
            Self::Headers => "headerErrors",
            Self::Query => "queryParameterErrors",
            Self::Body => "bodyErrors",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PathParams => "path parameters",
            Self::Headers => "headers",
            Self::Query => "query parameters",
            Self::Body => "body",
        })
    }
}

/// Issues for every failing facet of one request.
///
/// Serializes to the combined wire shape, with `null` for facets that
/// passed:
///
/// ```json
/// {"pathParameterErrors": null, "headerErrors": {"issues": [..]},
///  "queryParameterErrors": {"issues": [..]}, "bodyErrors": null}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestValidationError {
    /// Path parameter issues.
    #[serde(rename = "pathParameterErrors")]
    pub path_params: Option<Issues>,
    /// Header issues.
    #[serde(rename = "headerErrors")]
    pub headers: Option<Issues>,
    /// Query issues.
    #[serde(rename = "queryParameterErrors")]
    pub query: Option<Issues>,
    /// Body issues.
    #[serde(rename = "bodyErrors")]
    pub body: Option<Issues>,
}

impl RequestValidationError {
    /// Returns the issues for `facet`.
    #[must_use]
    pub fn facet(&self, facet: Facet) -> Option<&Issues> {
        match facet {
            Facet::PathParams => self.path_params.as_ref(),
            Facet::Headers => self.headers.as_ref(),
            Facet::Query => self.query.as_ref(),
            Facet::Body => self.body.as_ref(),
        }
    }

    /// Records issues for `facet`, replacing earlier ones.
    pub fn set(&mut self, facet: Facet, issues: Issues) {
        let slot = match facet {
            Facet::PathParams => &mut self.path_params,
            Facet::Headers => &mut self.headers,
            Facet::Query => &mut self.query,
            Facet::Body => &mut self.body,
        };
        *slot = Some(issues);
    }

    /// Returns the failing facets in reporting order.
    #[must_use]
    pub fn failing_facets(&self) -> Vec<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| self.facet(*facet).is_some())
            .collect()
    }

    /// Returns the first failing facet and its issues.
    #[must_use]
    pub fn first(&self) -> Option<(Facet, &Issues)> {
        Facet::ALL
            .into_iter()
            .find_map(|facet| self.facet(facet).map(|issues| (facet, issues)))
    }

    /// Returns true if no facet failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }

    /// Returns the total number of issues across facets.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        Facet::ALL
            .into_iter()
            .filter_map(|facet| self.facet(facet))
            .map(Issues::len)
            .sum()
    }
}

impl fmt::Display for RequestValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facets: Vec<String> = self
            .failing_facets()
            .iter()
            .map(ToString::to_string)
            .collect();
        write!(f, "request validation failed for {}", facets.join(", "))
    }
}

impl std::error::Error for RequestValidationError {}

/// A handler response rejected by its declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("response with status {status} failed validation: {issues}")]
pub struct ResponseValidationError {
    /// Response status.
    pub status: u16,
    /// What was wrong.
    pub issues: Issues,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{codes, Issue};
    use serde_json::json;

    #[test]
    fn test_combined_wire_shape() {
        let mut error = RequestValidationError::default();
        error.set(
            Facet::Query,
            Issues::single(Issue::new(codes::INVALID_TYPE, "Expected number, received string").at(["take"])),
        );
        error.set(
            Facet::Headers,
            Issues::single(Issue::new(codes::REQUIRED, "Required").at(["x-api-key"])),
        );

        let wire = serde_json::to_value(&error).unwrap();
        assert_eq!(wire["pathParameterErrors"], json!(null));
        assert_eq!(wire["bodyErrors"], json!(null));
        assert_eq!(wire["headerErrors"]["issues"][0]["path"], json!(["x-api-key"]));
        assert_eq!(wire["queryParameterErrors"]["issues"][0]["path"], json!(["take"]));
    }

    #[test]
    fn test_first_follows_reporting_order() {
        let mut error = RequestValidationError::default();
        assert!(error.is_empty());
        error.set(Facet::Body, Issues::single(Issue::new("b", "b")));
        error.set(Facet::Headers, Issues::single(Issue::new("h", "h")));

        let (facet, _) = error.first().unwrap();
        assert_eq!(facet, Facet::Headers);
        assert_eq!(error.failing_facets(), vec![Facet::Headers, Facet::Body]);
        assert_eq!(error.issue_count(), 2);
        assert_eq!(
            error.to_string(),
            "request validation failed for headers, body"
        );
    }

    #[test]
    fn test_contract_error_display() {
        let error = ContractError::ExpectedRoute {
            path: "posts.getPost".to_string(),
        };
        assert_eq!(error.to_string(), "expected route but got router at `posts.getPost`");
        assert_eq!(error.path(), "posts.getPost");
    }
}
