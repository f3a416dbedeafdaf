/// Environment variable naming the target service host.
pub const HOST_ENV_VAR: &str = "HELLONGINX_SERVICE_HOST";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_PATH: &str = "/";
pub const DEFAULT_CIPHER_SUITE: &str = "TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256";
/// Per-request timeout, matching k6's default.
pub const DEFAULT_TIMEOUT: &str = "60s";

pub const USER_AGENT: &str = concat!("tlsload/", env!("CARGO_PKG_VERSION"));
