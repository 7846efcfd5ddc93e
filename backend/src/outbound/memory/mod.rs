//! In-process adapters.

mod in_memory_linkup_store;

pub use in_memory_linkup_store::InMemoryLinkupStore;
