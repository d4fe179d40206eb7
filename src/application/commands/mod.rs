//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod batch_commands;
mod proposal_commands;
mod revision_commands;

pub mod handlers;

pub use batch_commands::*;
pub use proposal_commands::*;
pub use revision_commands::*;
