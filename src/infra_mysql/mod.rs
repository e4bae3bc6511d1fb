mod blacklist_store_mysql;
mod identity_token_repo_mysql;

pub use blacklist_store_mysql::*;
pub use identity_token_repo_mysql::*;
