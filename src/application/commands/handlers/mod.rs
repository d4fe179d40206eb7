//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod batch_handlers;
mod proposal_handlers;
mod revision_handlers;

pub use batch_handlers::*;
pub use proposal_handlers::*;
pub use revision_handlers::*;
