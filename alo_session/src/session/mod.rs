mod config;
mod errors;
mod main;
mod types;

pub(crate) use config::is_sql_identifier;
pub use config::SessionConfig;
pub use errors::SessionError;
pub use main::{RequestInfo, Session, SessionContext, SessionHandler, Token};
pub use types::{ExecutionMode, SessionData, StartOutcome};
