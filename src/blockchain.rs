// Thin re-export module: the engine lives in `blockchain/core.rs`, split into
// the owned chain, the lock-guarded handle and the chain audit.

pub mod core;
pub use self::core::*;
