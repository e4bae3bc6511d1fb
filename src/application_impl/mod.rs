mod auth_service_impl;
mod blacklist_sweeper;
pub(crate) mod jwt_codec;
mod refresh_rotation_service_impl;
mod refresh_token_crypto_impl;
mod revocation_service_impl;
mod token_blacklist;

pub use auth_service_impl::*;
pub use blacklist_sweeper::*;
pub use jwt_codec::*;
pub use refresh_rotation_service_impl::*;
pub use refresh_token_crypto_impl::*;
pub use revocation_service_impl::*;
pub use token_blacklist::*;
