//! Ready-made middleware stages.

mod request_id;

pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
