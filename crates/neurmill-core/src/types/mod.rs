//! Type system utilities and aliases.
//!
//! ## Modules
//!
//! - [`aliases`]: Type aliases for the `Arc<Mutex<T>>` / `Arc<RwLock<T>>` wrappers
//!   used to share recommendation state across threads.

pub mod aliases;

pub use aliases::*;
