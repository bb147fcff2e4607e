//! Pairing a contract with its implementation.
//!
//! An implementation tree mirrors the contract: wherever the contract has a
//! router, the implementation has an [`ImplNode::Router`] with the same keys;
//! wherever it has a route, the implementation has an [`ImplNode::Leaf`].
//! [`flatten`] walks both trees together and produces one [`FlatRoute`] per
//! contract route, in declaration order.

use indexmap::IndexMap;

use crate::contract::{Route, Router, RouterNode};
use crate::error::{ContractError, ContractResult, NodeKind};

/// A node of an implementation tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplNode<T> {
    /// The implementation of one route.
    Leaf(T),
    /// Implementations of a nested router, by key.
    Router(IndexMap<String, ImplNode<T>>),
}

impl<T> Default for ImplNode<T> {
    fn default() -> Self {
        Self::Router(IndexMap::new())
    }
}

impl<T> ImplNode<T> {
    /// Creates a leaf.
    pub fn leaf(value: T) -> Self {
        Self::Leaf(value)
    }

    /// Creates a router node from `(key, node)` pairs.
    pub fn router<I, K>(children: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Router(
            children
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    /// Returns the kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Leaf(_) => NodeKind::Route,
            Self::Router(_) => NodeKind::Router,
        }
    }

    /// Places `value` at `path`, creating intermediate routers.
    ///
    /// # Errors
    ///
    /// Fails with [`ContractError::ExpectedRoute`] for an empty `path`, since
    /// the root is always a router. Fails with
    /// [`ContractError::ExpectedRouter`] if a leaf is in the way, and with
    /// [`ContractError::DuplicateKey`] if `path` is already taken.
    pub fn insert(&mut self, path: &[&str], value: T) -> ContractResult<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(ContractError::ExpectedRoute { path: String::new() });
        };

        let mut node = self;
        for (depth, key) in parents.iter().enumerate() {
            let Self::Router(children) = node else {
                return Err(ContractError::ExpectedRouter {
                    path: path[..depth].join("."),
                });
            };
            node = children
                .entry((*key).to_string())
                .or_insert_with(Self::default);
        }

        let Self::Router(children) = node else {
            return Err(ContractError::ExpectedRouter {
                path: parents.join("."),
            });
        };
        if children.contains_key(*last) {
            return Err(ContractError::DuplicateKey {
                key: path.join("."),
            });
        }
        children.insert((*last).to_string(), Self::Leaf(value));
        Ok(())
    }
}

/// A contract route paired with its implementation.
#[derive(Debug, Clone)]
pub struct FlatRoute<T> {
    /// Keys from the contract root to the route.
    pub key_path: Vec<String>,
    /// The route, with router-level options applied.
    pub route: Route,
    /// The implementation.
    pub implementation: T,
}

impl<T> FlatRoute<T> {
    /// Returns the key path joined with dots.
    #[must_use]
    pub fn name(&self) -> String {
        self.key_path.join(".")
    }
}

/// Walks `router` and `implementation` together.
///
/// # Errors
///
/// - [`ContractError::ExpectedRoute`] / [`ContractError::ExpectedRouter`]
///   when a route is implemented by a router or the reverse
/// - [`ContractError::MissingImplementation`] when a route has no leaf
/// - [`ContractError::UnknownImplementation`] when the implementation has a
///   key the contract lacks
///
/// Every error names the full key path.
///
/// # Example
///
/// ```
/// use accord_core::{flatten, ImplNode, Route, Router};
///
/// let contract = Router::builder()
///     .route("health", Route::get("/health"))
///     .router("posts", Router::builder().route("list", Route::get("/posts")))
///     .build()
///     .unwrap();
///
/// let implementation = ImplNode::router([
///     ("health", ImplNode::leaf("health handler")),
///     ("posts", ImplNode::router([("list", ImplNode::leaf("list handler"))])),
/// ]);
///
/// let flat = flatten(&contract, implementation).unwrap();
/// assert_eq!(flat[1].name(), "posts.list");
/// assert_eq!(flat[1].implementation, "list handler");
/// ```
pub fn flatten<T>(router: &Router, implementation: ImplNode<T>) -> ContractResult<Vec<FlatRoute<T>>> {
    let ImplNode::Router(children) = implementation else {
        return Err(ContractError::ExpectedRouter {
            path: String::new(),
        });
    };

    let mut out = Vec::new();
    walk(router, children, &mut Vec::new(), &mut out)?;
    Ok(out)
}

fn walk<T>(
    router: &Router,
    mut implementation: IndexMap<String, ImplNode<T>>,
    prefix: &mut Vec<String>,
    out: &mut Vec<FlatRoute<T>>,
) -> ContractResult<()> {
    for (key, node) in router.iter() {
        prefix.push(key.to_string());
        let Some(implemented) = implementation.shift_remove(key) else {
            return Err(ContractError::MissingImplementation {
                path: prefix.join("."),
            });
        };

        match (node, implemented) {
            (RouterNode::Route(route), ImplNode::Leaf(value)) => out.push(FlatRoute {
                key_path: prefix.clone(),
                route: route.clone(),
                implementation: value,
            }),
            (RouterNode::Router(inner), ImplNode::Router(children)) => {
                walk(inner, children, prefix, out)?;
            }
            (RouterNode::Route(_), ImplNode::Router(_)) => {
                return Err(ContractError::ExpectedRoute {
                    path: prefix.join("."),
                });
            }
            (RouterNode::Router(_), ImplNode::Leaf(_)) => {
                return Err(ContractError::ExpectedRouter {
                    path: prefix.join("."),
                });
            }
        }
        prefix.pop();
    }

    if let Some(extra) = implementation.keys().next() {
        prefix.push(extra.clone());
        return Err(ContractError::UnknownImplementation {
            path: prefix.join("."),
        });
    }
    Ok(())
}
