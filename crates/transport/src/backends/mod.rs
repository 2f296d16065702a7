//! Backend implementations
//!
//! Contains ObjectStoreBackend, HttpPutBackend, and RemoteCopyBackend.

mod http;
mod remote_copy;
mod store;

pub use self::http::HttpPutBackend;
pub use self::remote_copy::{shell_quote, RemoteCopyBackend};
pub use self::store::{ObjectStoreBackend, PRIME_OBJECT};
