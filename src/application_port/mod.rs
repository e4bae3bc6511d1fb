mod auth_service;
mod refresh_token_crypto;
mod token_codec;
mod token_lifecycle;

pub use auth_service::*;
pub use refresh_token_crypto::*;
pub use token_codec::*;
pub use token_lifecycle::*;
