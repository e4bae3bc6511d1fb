mod blacklist_store;
mod identity_token_repo;

pub use blacklist_store::*;
pub use identity_token_repo::*;
