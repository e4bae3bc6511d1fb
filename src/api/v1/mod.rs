mod error;
mod handler;
mod router;

pub use error::recover_error;
pub use handler::{REFRESH_TOKEN_HEADER, REQUEST_ID_HEADER};
pub use router::routes;
