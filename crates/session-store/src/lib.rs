//! Session persistence for evaluated batches.
//!
//! [`sanitize`](sanitize::sanitize) flattens a Decision batch into a JSON
//! primitive tree, [`desanitize`](sanitize::desanitize) restores it, and
//! [`SessionStore`](store::SessionStore) holds sanitized batches under
//! opaque session ids with TTL expiry.

pub mod error;
pub mod sanitize;
pub mod store;

pub use error::SessionStoreError;
pub use sanitize::{desanitize, sanitize};
pub use store::{SessionStore, DEFAULT_TTL_SECONDS};
