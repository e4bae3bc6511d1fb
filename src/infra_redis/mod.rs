mod blacklist_store_redis;

pub use blacklist_store_redis::*;
