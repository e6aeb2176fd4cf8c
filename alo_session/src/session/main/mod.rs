mod context;
mod cookie;
mod handler;
mod session;
mod token;

#[cfg(test)]
pub(crate) mod test_utils;


pub use context::{RequestInfo, SessionContext};
pub use handler::SessionHandler;
pub use session::Session;
pub use token::Token;
