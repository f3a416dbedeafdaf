//! Cipher suite registry and the OpenSSL connector policy built from it.
mod policy;
mod suites;


pub use policy::TlsPolicy;
pub use suites::{CipherSuite, resolve_suites};
