//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;


pub use cli::TesterArgs;
pub use defaults::{
    DEFAULT_CIPHER_SUITE, DEFAULT_PATH, DEFAULT_PORT, DEFAULT_TIMEOUT, HOST_ENV_VAR, USER_AGENT,
};
pub use types::{PositiveU64, Scheme, TlsVersion};
