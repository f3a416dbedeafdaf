use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONNECTION, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1::{self, SendRequest};
use hyper_util::rt::TokioIo;
use openssl::ssl::{SslConnector, SslRef};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;
use tracing::debug;
use url::{Host, Position, Url};

use crate::args::USER_AGENT as USER_AGENT_VALUE;
use crate::error::HttpError;
use crate::tls::{CipherSuite, TlsPolicy};

use super::exchange::{ErrorKind, Exchange, RequestError, Timings, TlsInfo};
use super::reuse::ReusePolicy;
use super::{Session, Transport};

const HTTPS_DEFAULT_PORT: u16 = 443;

/// HTTP/1.1 over OpenSSL with the policy's cipher list and protocol bounds.
pub struct PinnedTlsTransport {
    connector: SslConnector,
    verify_hostname: bool,
    keep_alive: bool,
}

impl PinnedTlsTransport {
    /// # Errors
    ///
    /// Returns an error when OpenSSL rejects the policy.
    pub fn new(policy: &TlsPolicy, reuse: ReusePolicy) -> Result<Self, HttpError> {
        Ok(Self {
            connector: policy.connector()?,
            verify_hostname: !policy.insecure_skip_verify(),
            keep_alive: reuse.keeps_alive(),
        })
    }
}

impl Transport for PinnedTlsTransport {
    fn open_session(&self) -> Result<Box<dyn Session>, HttpError> {
        Ok(Box::new(PinnedSession {
            connector: self.connector.clone(),
            verify_hostname: self.verify_hostname,
            keep_alive: self.keep_alive,
            idle: None,
        }))
    }

    fn name(&self) -> &'static str {
        "pinned-tls"
    }
}

struct PinnedConnection {
    sender: SendRequest<Empty<Bytes>>,
    tls: TlsInfo,
}

struct PinnedSession {
    connector: SslConnector,
    verify_hostname: bool,
    keep_alive: bool,
    idle: Option<PinnedConnection>,
}

#[async_trait]
impl Session for PinnedSession {
    async fn get(&mut self, url: &Url) -> Result<Exchange, RequestError> {
        let mut timings = Timings::default();

        let reused = match self.idle.take() {
            Some(mut connection) => {
                let ready = connection.sender.ready().await;
                match ready {
                    Ok(()) => Some(connection),
                    Err(err) => {
                        debug!("Dropping idle connection: {}", err);
                        None
                    }
                }
            }
            None => None,
        };
        let new_connection = reused.is_none();
        let mut connection = match reused {
            Some(connection) => connection,
            None => connect(&self.connector, self.verify_hostname, url, &mut timings).await?,
        };

        // Like k6's http_req_duration: sending, waiting, and receiving only.
        let started = Instant::now();
        let request = build_request(url, self.keep_alive)?;
        let response = connection
            .sender
            .send_request(request)
            .await
            .map_err(|err| RequestError::new(ErrorKind::Protocol, err))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| RequestError::new(ErrorKind::Body, err))?
            .to_bytes();
        timings.duration = started.elapsed();

        let tls = Some(connection.tls.clone());
        if self.keep_alive && !connection.sender.is_closed() {
            self.idle = Some(connection);
        }

        Ok(Exchange {
            status,
            bytes_received: u64::try_from(body.len()).unwrap_or(u64::MAX),
            timings,
            new_connection: Some(new_connection),
            tls,
        })
    }
}

async fn connect(
    connector: &SslConnector,
    verify_hostname: bool,
    url: &Url,
    timings: &mut Timings,
) -> Result<PinnedConnection, RequestError> {
    let port = url.port_or_known_default().unwrap_or(HTTPS_DEFAULT_PORT);
    let (server_name, addrs) = resolve(url, port).await?;

    let connect_started = Instant::now();
    let tcp = connect_any(&addrs).await?;
    if let Err(err) = tcp.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", err);
    }
    timings.connecting = Some(connect_started.elapsed());

    let handshake_started = Instant::now();
    let ssl = connector
        .configure()
        .map(|config| config.verify_hostname(verify_hostname))
        .and_then(|config| config.into_ssl(&server_name))
        .map_err(|err| RequestError::new(ErrorKind::TlsHandshake, err))?;
    let mut stream = SslStream::new(ssl, tcp)
        .map_err(|err| RequestError::new(ErrorKind::TlsHandshake, err))?;
    Pin::new(&mut stream)
        .connect()
        .await
        .map_err(|err| RequestError::new(ErrorKind::TlsHandshake, err))?;
    timings.tls_handshaking = Some(handshake_started.elapsed());

    let tls = negotiated(stream.ssl());
    debug!(
        "TLS established with {} ({}, {})",
        server_name, tls.version, tls.cipher
    );

    let (sender, connection) = http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|err| RequestError::new(ErrorKind::Protocol, err))?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!("Connection closed with error: {}", err);
        }
    });

    Ok(PinnedConnection { sender, tls })
}

async fn resolve(url: &Url, port: u16) -> Result<(String, Vec<SocketAddr>), RequestError> {
    match url.host() {
        Some(Host::Ipv4(ip)) => Ok((ip.to_string(), vec![SocketAddr::new(IpAddr::V4(ip), port)])),
        Some(Host::Ipv6(ip)) => Ok((ip.to_string(), vec![SocketAddr::new(IpAddr::V6(ip), port)])),
        Some(Host::Domain(domain)) => {
            let addrs: Vec<SocketAddr> = tokio::net::lookup_host((domain, port))
                .await
                .map_err(|err| RequestError::new(ErrorKind::Dns, err))?
                .collect();
            if addrs.is_empty() {
                return Err(RequestError::new(
                    ErrorKind::Dns,
                    format!("no addresses resolved for {}", domain),
                ));
            }
            Ok((domain.to_owned(), addrs))
        }
        None => Err(RequestError::new(
            ErrorKind::Dns,
            format!("URL '{}' has no host", url),
        )),
    }
}

async fn connect_any(addrs: &[SocketAddr]) -> Result<TcpStream, RequestError> {
    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!("Connect to {} failed: {}", addr, err);
                last_error = Some(err);
            }
        }
    }
    Err(RequestError::new(
        ErrorKind::Connect,
        last_error.map_or_else(|| "no addresses".to_owned(), |err| err.to_string()),
    ))
}

fn negotiated(ssl: &SslRef) -> TlsInfo {
    let cipher = ssl.current_cipher().map_or_else(
        || "unknown".to_owned(),
        |cipher| {
            CipherSuite::from_openssl_name(cipher.name())
                .map_or_else(|| cipher.name().to_owned(), |suite| suite.iana_name().to_owned())
        },
    );
    TlsInfo {
        version: ssl.version_str().to_owned(),
        cipher,
    }
}

fn build_request(url: &Url, keep_alive: bool) -> Result<Request<Empty<Bytes>>, RequestError> {
    let path_and_query = &url[Position::BeforePath..Position::AfterQuery];
    let authority = &url[Position::BeforeHost..Position::AfterPort];
    Request::builder()
        .method(Method::GET)
        .uri(path_and_query)
        .header(HOST, authority)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(CONNECTION, if keep_alive { "keep-alive" } else { "close" })
        .body(Empty::<Bytes>::new())
        .map_err(|err| RequestError::new(ErrorKind::Protocol, err))
}

#[cfg(test)]
pub(super) fn request_for_test(
    url: &Url,
    keep_alive: bool,
) -> Result<Request<Empty<Bytes>>, RequestError> {
    build_request(url, keep_alive)
}
