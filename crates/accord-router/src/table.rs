//! Ordered route table.

use http::Method;

use crate::{Params, PathTemplate};

/// One registered route.
#[derive(Debug, Clone)]
pub struct TableEntry<T> {
    /// HTTP method.
    pub method: Method,
    /// Path template.
    pub template: PathTemplate,
    /// Payload returned on a match.
    pub value: T,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Position of the entry in declaration order.
    pub index: usize,
    /// The matched payload.
    pub value: &'a T,
    /// Captured path parameters.
    pub params: Params,
}

/// Routes kept in declaration order.
///
/// Lookups scan entries in the order they were inserted and return the first
/// whose method and template both match, so overlapping templates such as
/// `/posts/latest` and `/posts/:id` resolve by declaration order. `HEAD`
/// requests fall back to `GET` entries when no `HEAD` entry matches.
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    entries: Vec<TableEntry<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route and returns its index.
    pub fn insert(&mut self, method: Method, template: PathTemplate, value: T) -> usize {
        self.entries.push(TableEntry {
            method,
            template,
            value,
        });
        self.entries.len() - 1
    }

    /// Finds the first entry matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.find(method, path).or_else(|| {
            if *method == Method::HEAD {
                self.find(&Method::GET, path)
            } else {
                None
            }
        })
    }

    /// Returns the methods registered for templates matching `path`, in
    /// declaration order and without duplicates.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for entry in &self.entries {
            if entry.template.match_path(path).is_some() && !methods.contains(&entry.method) {
                methods.push(entry.method.clone());
            }
        }
        methods
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TableEntry<T>> {
        self.entries.get(index)
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TableEntry<T>> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.method == *method)
            .find_map(|(index, entry)| {
                entry.template.match_path(path).map(|params| RouteMatch {
                    index,
                    value: &entry.value,
                    params,
                })
            })
    }
}
