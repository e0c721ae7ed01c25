//! Bundled DAO implementations.
//!
//! - [`EchoDao`] answers every operation with a description of the call. Used
//!   by the CLI and for wiring checks.
//! - [`MemoryDao`] is a thread-safe in-process store keyed by `id`.

mod echo;
mod memory;

pub use echo::EchoDao;
pub use memory::MemoryDao;
