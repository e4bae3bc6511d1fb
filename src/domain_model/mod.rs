mod context;
mod identity;
mod token;

pub use context::*;
pub use identity::*;
pub use token::*;
