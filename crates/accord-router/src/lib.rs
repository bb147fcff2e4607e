//! Path templates and ordered route matching for Accord.
//!
//! Contract routes declare their paths as templates such as
//! `/posts/:id/comments/:commentId?`. This crate parses those templates,
//! matches concrete request paths against them, fills them back in on the
//! client side, and keeps an ordered [`RouteTable`] for platforms that hand
//! over a raw path instead of doing their own parameter extraction.
//!
//! # Features
//!
//! - **Templates**: literal segments, `:name` parameters and trailing
//!   optional `:name?` parameters
//! - **Declaration-order matching**: the first structurally matching route
//!   wins, so ties resolve the same way the contract was written
//! - **Inline parameters**: [`Params`] stores up to four captures without
//!   touching the heap
//!
//! # Example
//!
//! ```rust
//! use accord_router::{PathTemplate, RouteTable};
//! use http::Method;
//!
//! let mut table = RouteTable::new();
//! table.insert(Method::GET, PathTemplate::parse("/posts").unwrap(), "listPosts");
//! table.insert(Method::GET, PathTemplate::parse("/posts/:id").unwrap(), "getPost");
//!
//! let matched = table.match_route(&Method::GET, "/posts/42").unwrap();
//! assert_eq!(*matched.value, "getPost");
//! assert_eq!(matched.params.get("id"), Some("42"));
//! ```

mod error;
mod params;
mod table;
mod template;

pub use error::TemplateError;
pub use params::Params;
pub use table::{RouteMatch, RouteTable, TableEntry};
pub use template::{join_paths, PathTemplate, Segment};
