//! Query Handlers 实现

mod revision_handlers;

pub use revision_handlers::*;
