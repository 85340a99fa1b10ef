//! Built-in [`Store`](crate::core::Store) adapters.
//!
//! - [`CookieStore`]: shared cookie jar with path scoping and expiry (default)
//! - [`MemoryStore`]: plain shared slot table, with fault and latency switches
//! - [`FileStore`]: one file per slot, shareable between processes

mod cookie;
mod file;
mod memory;

pub use cookie::CookieStore;
pub use file::FileStore;
pub use memory::MemoryStore;
