//! Chapter Source Adapter

mod http_chapter_source;

pub use http_chapter_source::{HttpChapterSource, HttpChapterSourceConfig};
