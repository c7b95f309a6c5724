#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod file_store;
pub mod memory;
pub mod selection;

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use selection::StoredSelection;
