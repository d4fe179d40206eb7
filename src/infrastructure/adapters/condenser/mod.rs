//! Condenser Adapter - 文本压缩服务客户端

mod fake_condenser;
mod http_condenser_client;

pub use fake_condenser::{FakeCondenserConfig, FakeContentCondenser};
pub use http_condenser_client::{HttpCondenserConfig, HttpContentCondenser};
