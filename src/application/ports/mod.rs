//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod batch_tracker;
mod chapter_source;
mod content_condenser;
mod repositories;
mod revision_lock;

pub use batch_tracker::{BatchError, BatchKind, BatchProgress, BatchTrackerPort};
pub use chapter_source::{ChapterSnapshot, ChapterSourceError, ChapterSourcePort};
pub use content_condenser::{
    CondenseRequest, CondenseResponse, CondenserError, ContentCondenserPort,
};
pub use repositories::{RepositoryError, RevisionRepositoryPort};
pub use revision_lock::{LockGuard, RevisionLockPort};
