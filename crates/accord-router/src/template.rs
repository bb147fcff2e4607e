//! Path template parsing, matching and filling.

use std::borrow::Cow;
use std::fmt;

use crate::{Params, TemplateError};

/// One segment of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal segment that must match exactly (e.g. `posts`).
    Literal(String),
    /// A required parameter (e.g. `:id`).
    Param(String),
    /// An optional trailing parameter (e.g. `:page?`).
    OptionalParam(String),
}

impl Segment {
    /// Returns the parameter name, if this segment is a parameter.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Param(name) | Self::OptionalParam(name) => Some(name),
        }
    }

    fn is_optional(&self) -> bool {
        matches!(self, Self::OptionalParam(_))
    }
}

/// A parsed contract path such as `/posts/:id/comments/:commentId?`.
///
/// Empty segments are ignored, so `/posts/` and `/posts` describe the same
/// route. Optional parameters may only appear at the end of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    required: usize,
}

impl PathTemplate {
    /// Parses a template.
    ///
    /// # Example
    ///
    /// ```rust
    /// use accord_router::{PathTemplate, Segment};
    ///
    /// let template = PathTemplate::parse("/posts/:id/:tab?").unwrap();
    /// assert_eq!(template.segments()[0], Segment::Literal("posts".into()));
    /// assert_eq!(template.param_names().collect::<Vec<_>>(), vec!["id", "tab"]);
    /// ```
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut seen_optional: Option<String> = None;

        for part in template.split('/').filter(|s| !s.is_empty()) {
            let segment = match part.strip_prefix(':') {
                Some(rest) => {
                    let (name, optional) = match rest.strip_suffix('?') {
                        Some(name) => (name, true),
                        None => (rest, false),
                    };
                    validate_name(name, template)?;
                    if segments
                        .iter()
                        .any(|s: &Segment| s.param_name() == Some(name))
                    {
                        return Err(TemplateError::DuplicateParam {
                            name: name.to_string(),
                            template: template.to_string(),
                        });
                    }
                    if optional {
                        Segment::OptionalParam(name.to_string())
                    } else {
                        Segment::Param(name.to_string())
                    }
                }
                None => Segment::Literal(part.to_string()),
            };

            if let Some(name) = &seen_optional {
                if !segment.is_optional() {
                    return Err(TemplateError::OptionalNotTrailing {
                        name: name.clone(),
                        template: template.to_string(),
                    });
                }
            }
            if let Segment::OptionalParam(name) = &segment {
                seen_optional.get_or_insert_with(|| name.clone());
            }
            segments.push(segment);
        }

        let required = segments.iter().filter(|s| !s.is_optional()).count();
        Ok(Self {
            raw: template.to_string(),
            segments,
            required,
        })
    }

    /// Returns the template exactly as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterates parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Matches a concrete request path, returning the captured parameters.
    ///
    /// A path matches when its segment count lies between the number of
    /// required segments and the total number of segments, every literal
    /// matches exactly, and every parameter position is present or optional.
    /// Captured values are percent-decoded.
    ///
    /// ```rust
    /// use accord_router::PathTemplate;
    ///
    /// let template = PathTemplate::parse("/files/:name/:version?").unwrap();
    /// let params = template.match_path("/files/report%20v2").unwrap();
    /// assert_eq!(params.get("name"), Some("report v2"));
    /// assert_eq!(params.get("version"), None);
    /// assert!(template.match_path("/files").is_none());
    /// ```
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<Params> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if actual.len() < self.required || actual.len() > self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (pattern, value) in self.segments.iter().zip(&actual) {
            match pattern {
                Segment::Literal(literal) => {
                    if literal != value {
                        return None;
                    }
                }
                Segment::Param(name) | Segment::OptionalParam(name) => {
                    params.push(name.as_str(), decode_segment(value));
                }
            }
        }

        Some(params)
    }

    /// Substitutes parameter values into the template.
    ///
    /// Values are percent-encoded. A missing optional parameter ends the
    /// path; a missing required parameter is an error.
    ///
    /// ```rust
    /// use accord_router::PathTemplate;
    ///
    /// let template = PathTemplate::parse("/users/:name/:tab?").unwrap();
    /// let path = template
    ///     .fill(|name| (name == "name").then(|| "ada lovelace".to_string()))
    ///     .unwrap();
    /// assert_eq!(path, "/users/ada%20lovelace");
    /// ```
    pub fn fill<F>(&self, mut lookup: F) -> Result<String, TemplateError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut path = String::with_capacity(self.raw.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    path.push('/');
                    path.push_str(literal);
                }
                Segment::Param(name) => {
                    let value = lookup(name).ok_or_else(|| TemplateError::MissingParam {
                        name: name.clone(),
                    })?;
                    path.push('/');
                    path.push_str(&urlencoding::encode(&value));
                }
                Segment::OptionalParam(name) => match lookup(name) {
                    Some(value) => {
                        path.push('/');
                        path.push_str(&urlencoding::encode(&value));
                    }
                    None => break,
                },
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Concatenates a router prefix with a route path.
///
/// ```rust
/// use accord_router::join_paths;
///
/// assert_eq!(join_paths("/api/", "/posts"), "/api/posts");
/// assert_eq!(join_paths("", "/posts"), "/posts");
/// assert_eq!(join_paths("/api", "/"), "/api");
/// ```
#[must_use]
pub fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => ensure_leading_slash(prefix),
        (false, false) => format!("{}/{path}", ensure_leading_slash(prefix)),
    }
}

fn ensure_leading_slash(s: &str) -> String {
    if s.starts_with('/') {
        s.to_string()
    } else {
        format!("/{s}")
    }
}

fn validate_name(name: &str, template: &str) -> Result<(), TemplateError> {
    if name.is_empty() {
        return Err(TemplateError::EmptyParamName {
            template: template.to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(TemplateError::InvalidParamName {
            name: name.to_string(),
            template: template.to_string(),
        });
    }
    Ok(())
}

fn decode_segment(value: &str) -> String {
    urlencoding::decode(value)
        .map_or_else(|_| Cow::Borrowed(value), |decoded| decoded)
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_literals_and_params() {
        let template = PathTemplate::parse("/posts/:postId/comments/:id").unwrap();
        assert_eq!(
            template.segments(),
            &[
                Segment::Literal("posts".into()),
                Segment::Param("postId".into()),
                Segment::Literal("comments".into()),
                Segment::Param("id".into()),
            ]
        );
        assert_eq!(template.to_string(), "/posts/:postId/comments/:id");
    }

    #[test]
    fn test_parse_rejects_bad_templates() {
        assert!(matches!(
            PathTemplate::parse("/posts/:"),
            Err(TemplateError::EmptyParamName { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/posts/:id-x"),
            Err(TemplateError::InvalidParamName { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/:id/b/:id"),
            Err(TemplateError::DuplicateParam { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/a/:tab?/edit"),
            Err(TemplateError::OptionalNotTrailing { .. })
        ));
    }

    #[test]
    fn test_root_template() {
        let template = PathTemplate::parse("/").unwrap();
        assert!(template.segments().is_empty());
        assert!(template.match_path("/").unwrap().is_empty());
        assert!(template.match_path("").is_some());
        assert!(template.match_path("/x").is_none());
        assert_eq!(template.fill(|_| None).unwrap(), "/");
    }

    #[test]
    fn test_match_literal_mismatch() {
        let template = PathTemplate::parse("/posts/:id").unwrap();
        assert!(template.match_path("/users/1").is_none());
        assert!(template.match_path("/posts").is_none());
        assert!(template.match_path("/posts/1/2").is_none());
    }

    #[test]
    fn test_match_optional_trailing_segment() {
        let template = PathTemplate::parse("/posts/:id/:tab?").unwrap();

        let short = template.match_path("/posts/1").unwrap();
        assert_eq!(short.get("id"), Some("1"));
        assert!(!short.contains("tab"));

        let long = template.match_path("/posts/1/comments").unwrap();
        assert_eq!(long.get("tab"), Some("comments"));
    }

    #[test]
    fn test_match_ignores_query_and_trailing_slash() {
        let template = PathTemplate::parse("/posts/:id").unwrap();
        let params = template.match_path("/posts/5/?draft=true").unwrap();
        assert_eq!(params.get("id"), Some("5"));
    }

    #[test]
    fn test_fill_missing_required_param() {
        let template = PathTemplate::parse("/posts/:id").unwrap();
        assert_eq!(
            template.fill(|_| None),
            Err(TemplateError::MissingParam { name: "id".into() })
        );
    }

    #[test]
    fn test_fill_encodes_values() {
        let template = PathTemplate::parse("/search/:term").unwrap();
        let path = template.fill(|_| Some("a/b c".to_string())).unwrap();
        assert_eq!(path, "/search/a%2Fb%20c");
        assert_eq!(template.match_path(&path).unwrap().get("term"), Some("a/b c"));
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/v1", "/posts/:id"), "/v1/posts/:id");
        assert_eq!(join_paths("v1/", "posts"), "/v1/posts");
        assert_eq!(join_paths("", ""), "/");
    }

    proptest! {
        #[test]
        fn prop_fill_then_match_recovers_params(
            first in "[^/]{1,16}",
            second in "[ -~]{1,16}",
        ) {
            let template = PathTemplate::parse("/orgs/:org/repos/:repo").unwrap();
            let path = template
                .fill(|name| match name {
                    "org" => Some(first.clone()),
                    "repo" => Some(second.clone()),
                    _ => None,
                })
                .unwrap();

            let params = template.match_path(&path).unwrap();
            prop_assert_eq!(params.get("org"), Some(first.as_str()));
            prop_assert_eq!(params.get("repo"), Some(second.as_str()));
        }
    }
}
