//! Domain layer: the gift-exchange data model, its invariants and the pure
//! assignment engine. Nothing in here performs IO.

pub mod assignment;
pub mod engine;
pub mod game;
pub mod participant;
pub mod ports;
