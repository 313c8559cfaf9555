//! Domain types - identifiers, storage keys and limits.

mod key;
mod limit;

pub use key::{Identifier, KEY_NAMESPACE, StorageKey};
pub use limit::Limit;
