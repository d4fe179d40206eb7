//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod chapters;
pub mod condenser;

pub use chapters::*;
pub use condenser::*;
