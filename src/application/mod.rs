//! Application layer: request handling around the assignment engine.
//!
//! `SantaService` owns the storage and notification ports and applies the
//! engine's results to persisted games with optimistic concurrency.

pub mod service;
