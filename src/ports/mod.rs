//! External collaborators of the engine.
//!
//! The engine performs no I/O of its own; it talks to the environment through
//! two narrow ports supplied at construction:
//!
//! - [`Fetch`]: async `fetch(url) -> Result<Body, FetchError>`, no retry built in
//! - [`IdentityStore`]: string key/value store holding the "current user id"
//!
//! [`MemoryIdentityStore`] is an in-process implementation of the identity port.

mod fetch;
mod identity;

pub use fetch::{Body, Fetch, FetchError, FetchRef};
pub use identity::{IdentityRef, IdentityStore, MemoryIdentityStore};
