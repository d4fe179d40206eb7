//! Memory Layer - In-Memory State Management
//!
//! 实现修订锁、批量进度和本地章节来源的内存状态

mod batch_tracker;
mod chapter_source;
mod revision_locks;

pub use batch_tracker::InMemoryBatchTracker;
pub use chapter_source::InMemoryChapterSource;
pub use revision_locks::InMemoryRevisionLocks;
