//! Credence Engine
//!
//! Wires the packet store, keyring, and graph layers into the typed
//! operation surface consumed by a request layer (which lives outside
//! this workspace): packet CRUD, indexed listings, trust path queries,
//! identifier resolution and search, signing, and key management.

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
