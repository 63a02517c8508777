//! Adapters for the domain ports: game stores, id generation and notification.

pub mod ids;
pub mod in_memory;
pub mod notifier;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
