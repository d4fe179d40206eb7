//! HTTP Handlers

mod batch;
mod ping;
mod proposal;
mod revision;

pub use batch::*;
pub use ping::*;
pub use proposal::*;
pub use revision::*;
