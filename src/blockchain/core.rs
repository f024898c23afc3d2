// core.rs splits the engine into the owned chain, its shared handle and the
// chain audit.
pub mod chain;
pub mod ledger;
pub mod validation;

pub use chain::*;
pub use ledger::*;
pub use validation::*;
