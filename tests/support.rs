use std::ffi::OsStr;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::ssl::{SslAcceptor, SslMethod};
use openssl::x509::{X509, X509NameBuilder};

const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK";
const KEEP_ALIVE_RESPONSE: &[u8] =
    b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: keep-alive\r\n\r\nOK";

pub struct ServerHandle {
    pub port: u16,
    connections: Arc<AtomicUsize>,
    shutdown: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Connections accepted so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _send_result = self.shutdown.send(());
        if let Some(handle) = self.thread.take() {
            drop(handle.join());
        }
    }
}

/// Spawn a plain HTTP/1.1 server that answers `200 OK` and closes.
///
/// # Errors
///
/// Returns an error if the listener cannot be created or configured.
pub fn spawn_http_server() -> Result<ServerHandle, String> {
    spawn_server(None, false)
}

/// Spawn an HTTPS server with a fresh self-signed certificate that only
/// negotiates the given OpenSSL cipher list over TLS 1.2.
///
/// # Errors
///
/// Returns an error if the certificate, acceptor, or listener cannot be set up.
pub fn spawn_tls_server(cipher_list: &str) -> Result<ServerHandle, String> {
    let acceptor = build_acceptor(cipher_list)?;
    spawn_server(Some(Arc::new(acceptor)), false)
}

/// Like [`spawn_tls_server`], but answers every request on a connection
/// until the client closes it.
///
/// # Errors
///
/// Returns an error if the certificate, acceptor, or listener cannot be set up.
pub fn spawn_keep_alive_tls_server(cipher_list: &str) -> Result<ServerHandle, String> {
    let acceptor = build_acceptor(cipher_list)?;
    spawn_server(Some(Arc::new(acceptor)), true)
}

/// Like the spawners above, but skips when the sandbox forbids sockets.
///
/// # Errors
///
/// Returns an error for any failure other than a denied bind.
pub fn or_skip(result: Result<ServerHandle, String>) -> Result<Option<ServerHandle>, String> {
    match result {
        Ok(server) => Ok(Some(server)),
        Err(err) if err.contains("Operation not permitted") => {
            eprintln!("Skipping e2e test: {}", err);
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

fn spawn_server(
    acceptor: Option<Arc<SslAcceptor>>,
    keep_alive: bool,
) -> Result<ServerHandle, String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .map_err(|err| format!("bind test server failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("server addr failed: {}", err))?;
    listener
        .set_nonblocking(true)
        .map_err(|err| format!("set_nonblocking failed: {}", err))?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let connections = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&connections);

    let handle = thread::spawn(move || {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            match listener.accept() {
                Ok((stream, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let acceptor = acceptor.clone();
                    thread::spawn(move || handle_client(stream, acceptor.as_deref(), keep_alive));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(10));
                }
                Err(_) => break,
            }
        }
    });

    Ok(ServerHandle {
        port: addr.port(),
        connections,
        shutdown: shutdown_tx,
        thread: Some(handle),
    })
}

fn handle_client(stream: TcpStream, acceptor: Option<&SslAcceptor>, keep_alive: bool) {
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    match acceptor {
        Some(acceptor) => {
            let Ok(mut tls) = acceptor.accept(stream) else {
                return;
            };
            if keep_alive {
                serve_until_closed(&mut tls);
            } else if respond(&mut tls).is_ok() {
                drop(tls.shutdown());
            }
        }
        None => {
            let mut stream = stream;
            if respond(&mut stream).is_ok() {
                drop(stream.shutdown(Shutdown::Both));
            }
        }
    }
}

fn serve_until_closed<S: Read + Write>(stream: &mut S) {
    let mut buffer = [0u8; 1024];
    loop {
        match stream.read(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if stream.write_all(KEEP_ALIVE_RESPONSE).is_err() || stream.flush().is_err() {
                    break;
                }
            }
        }
    }
}

fn respond<S: Read + Write>(stream: &mut S) -> std::io::Result<()> {
    let mut buffer = [0u8; 1024];
    let _read = stream.read(&mut buffer)?;
    stream.write_all(RESPONSE)?;
    stream.flush()
}

fn build_acceptor(cipher_list: &str) -> Result<SslAcceptor, String> {
    let (key, cert) = self_signed().map_err(|err| format!("self-signed cert failed: {}", err))?;
    let mut builder = SslAcceptor::mozilla_intermediate(SslMethod::tls())
        .map_err(|err| format!("acceptor builder failed: {}", err))?;
    builder
        .set_private_key(&key)
        .map_err(|err| format!("set key failed: {}", err))?;
    builder
        .set_certificate(&cert)
        .map_err(|err| format!("set cert failed: {}", err))?;
    builder
        .set_cipher_list(cipher_list)
        .map_err(|err| format!("set cipher list failed: {}", err))?;
    builder
        .set_max_proto_version(Some(openssl::ssl::SslVersion::TLS1_2))
        .map_err(|err| format!("set max proto failed: {}", err))?;
    Ok(builder.build())
}

fn self_signed() -> Result<(PKey<Private>, X509), openssl::error::ErrorStack> {
    let key = PKey::from_rsa(Rsa::generate(2048)?)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", "hellonginx")?;
    let name = name.build();

    let mut builder = X509::builder()?;
    builder.set_version(2)?;
    let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    let not_after = Asn1Time::days_from_now(1)?;
    builder.set_not_before(&not_before)?;
    builder.set_not_after(&not_after)?;
    builder.sign(&key, MessageDigest::sha256())?;
    Ok((key, builder.build()))
}

/// Run the `tlsload` binary with extra environment and capture output.
///
/// # Errors
///
/// Returns an error if the binary cannot be executed.
pub fn run_tlsload<I, S>(args: I, host_env: Option<&str>) -> Result<Output, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = tlsload_bin()?;
    let mut command = Command::new(bin);
    command
        .args(args)
        .env("RUST_LOG", "error")
        .env_remove("TLSLOAD_LOG")
        .env_remove("HELLONGINX_SERVICE_HOST");
    if let Some(host) = host_env {
        command.env("HELLONGINX_SERVICE_HOST", host);
    }
    command
        .output()
        .map_err(|err| format!("run tlsload failed: {}", err))
}

fn tlsload_bin() -> Result<String, String> {
    option_env!("CARGO_BIN_EXE_tlsload").map_or_else(
        || Err("CARGO_BIN_EXE_tlsload missing at compile time.".to_owned()),
        |path| Ok(path.to_owned()),
    )
}

/// Formats a process failure for test errors.
#[must_use]
pub fn describe(output: &Output) -> String {
    format!(
        "status: {}\nstdout: {}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
