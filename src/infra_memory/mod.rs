mod blacklist_store_memory;
mod identity_token_repo_memory;

pub use blacklist_store_memory::*;
pub use identity_token_repo_memory::*;
