//! # Transport
//!
//! 文件传输后端。
//!
//! 负责：
//! - 解析目标 URI 并选择后端 (对象存储 / HTTP PUT / 远程拷贝)
//! - 每个单元构建一次后端，之后对每次曝光重复调用
//! - 失败只影响当前曝光，后端保持可用
//!
//! ## 使用示例
//!
//! ```ignore
//! use transport::Backend;
//! use contracts::TransportBackend;
//!
//! let mut backend = Backend::connect("gsapi://bucket/prefix", &options).await?;
//! backend.transfer(&staged.local, &staged.artifact).await?;
//! ```

mod backend;
pub mod backends;
mod destination;

pub use backend::Backend;
pub use destination::{CopyMode, Destination, ObjectStoreTarget, RemoteTarget, StoreFlavor};

// Re-export contracts types
pub use contracts::{LocalTransportBackend, TransportBackend, TransportOptions};
