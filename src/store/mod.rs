//! Store interfaces and the in-memory implementation

mod memory;
mod traits;

pub use memory::MemStore;
pub use traits::{Kv, RtConf};
