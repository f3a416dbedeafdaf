use super::{apply_config, load_config_file, types::ConfigFile};
use clap::{CommandFactory, FromArgMatches};
use std::time::Duration;
use tempfile::tempdir;

use crate::args::{Scheme, TesterArgs, TlsVersion};

fn parse_with_matches(argv: &[&str]) -> Result<(TesterArgs, clap::ArgMatches), String> {
    let matches = TesterArgs::command()
        .try_get_matches_from(argv)
        .map_err(|err| format!("parse failed: {}", err))?;
    let args =
        TesterArgs::from_arg_matches(&matches).map_err(|err| format!("from matches: {}", err))?;
    Ok((args, matches))
}

#[test]
fn parse_toml_config_with_k6_option_names() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("tlsload.toml");
    let content = r#"
host = "hellonginx.default.svc"
port = 9443
vus = 4
iterations = 40
duration = "30s"
timeout = 5
insecureSkipTLSVerify = false
noConnectionReuse = false
noVUConnectionReuse = true
tlsCipherSuites = ["TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", "TLS_AES_128_GCM_SHA256"]

[tlsVersion]
min = "1.2"
max = "1.3"
"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    let checks = [
        (
            config.host.as_deref() == Some("hellonginx.default.svc"),
            "Unexpected host",
        ),
        (config.port == Some(9443), "Unexpected port"),
        (config.vus == Some(4), "Unexpected vus"),
        (config.iterations == Some(40), "Unexpected iterations"),
        (
            config.insecure_skip_tls_verify == Some(false),
            "Unexpected insecureSkipTLSVerify",
        ),
        (
            config.no_connection_reuse == Some(false),
            "Unexpected noConnectionReuse",
        ),
        (
            config.no_vu_connection_reuse == Some(true),
            "Unexpected noVUConnectionReuse",
        ),
        (
            config.tls_cipher_suites.as_ref().map(Vec::len) == Some(2),
            "Unexpected tlsCipherSuites",
        ),
        (
            config
                .tls_version
                .as_ref()
                .and_then(|version| version.min)
                == Some(TlsVersion::V1_2),
            "Unexpected tlsVersion.min",
        ),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(message.to_owned());
        }
    }

    let duration = config
        .duration
        .as_ref()
        .ok_or_else(|| "Expected duration".to_owned())?
        .to_duration()
        .map_err(|err| err.to_string())?;
    if duration != Duration::from_secs(30) {
        return Err(format!("Unexpected duration: {:?}", duration));
    }
    Ok(())
}

#[test]
fn parse_json_config() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("tlsload.json");
    let content = r#"{
  "insecureSkipTLSVerify": true,
  "noConnectionReuse": true,
  "noVUConnectionReuse": true,
  "tlsCipherSuites": ["TLS_ECDHE_RSA_WITH_AES_128_CBC_SHA256"],
  "scheme": "https",
  "summaryExport": "summary.json"
}"#;
    std::fs::write(&path, content).map_err(|err| format!("write failed: {}", err))?;

    let config = load_config_file(&path).map_err(|err| err.to_string())?;
    if config.scheme != Some(Scheme::Https) {
        return Err("Unexpected scheme".to_owned());
    }
    if config.summary_export.as_deref() != Some("summary.json") {
        return Err("Unexpected summaryExport".to_owned());
    }
    Ok(())
}

#[test]
fn unknown_config_field_is_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("tlsload.toml");
    std::fs::write(&path, "insecureSkipTlsVerify = true\n")
        .map_err(|err| format!("write failed: {}", err))?;
    match load_config_file(&path) {
        Ok(_) => Err("Expected unknown field error".to_owned()),
        Err(_) => Ok(()),
    }
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), String> {
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let path = dir.path().join("tlsload.yaml");
    std::fs::write(&path, "vus: 1\n").map_err(|err| format!("write failed: {}", err))?;
    match load_config_file(&path) {
        Ok(_) => Err("Expected extension error".to_owned()),
        Err(_) => Ok(()),
    }
}

#[test]
fn cli_values_override_config() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["tlsload", "--host", "cli-host", "--vus", "2"])?;
    let config = ConfigFile {
        host: Some("config-host".to_owned()),
        vus: Some(8),
        iterations: Some(16),
        ..ConfigFile::default()
    };
    apply_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.host.as_deref() != Some("cli-host") {
        return Err(format!("Unexpected host: {:?}", args.host));
    }
    if args.vus.get() != 2 {
        return Err(format!("Unexpected vus: {}", args.vus.get()));
    }
    if args.iterations.map(|value| value.get()) != Some(16) {
        return Err("Expected iterations from config".to_owned());
    }
    Ok(())
}

#[test]
fn config_overrides_defaults() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["tlsload"])?;
    let config = ConfigFile {
        host: Some("config-host".to_owned()),
        no_connection_reuse: Some(false),
        tls_cipher_suites: Some(vec![]),
        ..ConfigFile::default()
    };
    apply_config(&mut args, &matches, &config).map_err(|err| err.to_string())?;

    if args.host.as_deref() != Some("config-host") {
        return Err(format!("Unexpected host: {:?}", args.host));
    }
    if args.no_connection_reuse {
        return Err("Expected connection reuse enabled".to_owned());
    }
    if !args.tls_cipher_suites.is_empty() {
        return Err("Expected cipher suites cleared".to_owned());
    }
    Ok(())
}

#[test]
fn config_zero_vus_is_rejected() -> Result<(), String> {
    let (mut args, matches) = parse_with_matches(&["tlsload"])?;
    let config = ConfigFile {
        vus: Some(0),
        ..ConfigFile::default()
    };
    match apply_config(&mut args, &matches, &config) {
        Ok(()) => Err("Expected vus error".to_owned()),
        Err(_) => Ok(()),
    }
}
