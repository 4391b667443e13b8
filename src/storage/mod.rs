//! Storage implementations for the persistence contract

pub mod in_memory;

pub use in_memory::InMemoryPersistenceHandler;
