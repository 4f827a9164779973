//! Small helpers shared by the cache store and the exporters.

mod fs;

pub use fs::write_atomic;
