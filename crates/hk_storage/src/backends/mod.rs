pub mod memory;

pub use memory::{MemoryCache, MemoryConfig};
