mod support;

use std::fs;

use tempfile::tempdir;

use support::{describe, or_skip, run_tlsload, spawn_http_server};

fn read_export(path: &std::path::Path) -> Result<serde_json::Value, String> {
    let content = fs::read_to_string(path).map_err(|err| format!("read export failed: {}", err))?;
    serde_json::from_str(&content).map_err(|err| format!("parse export failed: {}", err))
}

#[test]
fn e2e_plain_http_run_prints_summary() -> Result<(), String> {
    let Some(server) = or_skip(spawn_http_server())? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let export = dir.path().join("summary.json");

    let port = server.port.to_string();
    let export_arg = export.to_string_lossy().into_owned();
    let output = run_tlsload(
        [
            "--scheme",
            "http",
            "--port",
            port.as_str(),
            "-i",
            "3",
            "--summary-export",
            export_arg.as_str(),
        ],
        Some("127.0.0.1"),
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("http_reqs") || !stdout.contains("http_req_duration") {
        return Err(format!("Missing summary lines:\n{}", stdout));
    }

    let summary = read_export(&export)?;
    let checks = [
        (
            summary.get("http_reqs").and_then(serde_json::Value::as_u64) == Some(3),
            "Expected 3 requests",
        ),
        (
            summary
                .pointer("/http_req_failed/count")
                .and_then(serde_json::Value::as_u64)
                == Some(0),
            "Expected no failures",
        ),
        (
            summary.pointer("/statuses/200").and_then(serde_json::Value::as_u64) == Some(3),
            "Expected three 200 responses",
        ),
        (server.connections() == 3, "Expected one connection per request"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(format!("{}: {}", message, summary));
        }
    }
    Ok(())
}

#[test]
fn e2e_config_file_supplies_target() -> Result<(), String> {
    let Some(server) = or_skip(spawn_http_server())? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = dir.path().join("tlsload.toml");
    let export = dir.path().join("summary.json");
    fs::write(
        &config,
        format!(
            "host = \"127.0.0.1\"\nscheme = \"http\"\nport = {}\nvus = 2\niterations = 4\nsummaryExport = \"{}\"\n",
            server.port,
            export.to_string_lossy()
        ),
    )
    .map_err(|err| format!("write config failed: {}", err))?;

    let config_arg = config.to_string_lossy().into_owned();
    let output = run_tlsload(["--config", config_arg.as_str()], None)?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let summary = read_export(&export)?;
    if summary.get("http_reqs").and_then(serde_json::Value::as_u64) != Some(4) {
        return Err(format!("Expected 4 requests: {}", summary));
    }
    if summary.get("vus").and_then(serde_json::Value::as_u64) != Some(2) {
        return Err(format!("Expected 2 VUs: {}", summary));
    }
    Ok(())
}

#[test]
fn e2e_missing_host_fails() -> Result<(), String> {
    let output = run_tlsload(["-i", "1"], None)?;
    if output.status.success() {
        return Err(format!("Expected failure without a host\n{}", describe(&output)));
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.contains("Missing target host") {
        return Err(format!("Unexpected error output:\n{}", stderr));
    }
    Ok(())
}

#[test]
fn e2e_more_vus_than_iterations_fails() -> Result<(), String> {
    let output = run_tlsload(["--vus", "4", "-i", "2"], Some("127.0.0.1"))?;
    if output.status.success() {
        return Err(format!("Expected failure for vus > iterations\n{}", describe(&output)));
    }
    Ok(())
}

#[test]
fn e2e_refused_connection_is_reported_not_fatal() -> Result<(), String> {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")
            .map_err(|err| format!("bind failed: {}", err))?;
        listener
            .local_addr()
            .map_err(|err| format!("addr failed: {}", err))?
            .port()
    };
    let port = port.to_string();
    let output = run_tlsload(
        ["--scheme", "http", "--port", port.as_str()],
        Some("127.0.0.1"),
    )?;
    if !output.status.success() {
        return Err(describe(&output));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.contains("100.00% 1 out of 1") {
        return Err(format!("Expected a failed request in summary:\n{}", stdout));
    }
    Ok(())
}

#[test]
fn e2e_config_host_beats_env_host() -> Result<(), String> {
    let Some(server) = or_skip(spawn_http_server())? else {
        return Ok(());
    };
    let dir = tempdir().map_err(|err| format!("tempdir failed: {}", err))?;
    let config = dir.path().join("tlsload.json");
    let export = dir.path().join("summary.json");
    let body = serde_json::json!({
        "host": "127.0.0.1",
        "scheme": "http",
        "port": server.port,
        "timeout": "5s",
        "summaryExport": export.to_string_lossy(),
    });
    fs::write(&config, body.to_string()).map_err(|err| format!("write config failed: {}", err))?;

    let config_arg = config.to_string_lossy().into_owned();
    // TEST-NET-3 address: unroutable, so a run against it could not succeed.
    let output = run_tlsload(["--config", config_arg.as_str()], Some("203.0.113.1"))?;
    if !output.status.success() {
        return Err(describe(&output));
    }

    let summary = read_export(&export)?;
    let checks = [
        (
            summary.get("target").and_then(serde_json::Value::as_str)
                == Some(format!("http://127.0.0.1:{}/", server.port).as_str()),
            "Expected the config host in the target",
        ),
        (
            summary
                .pointer("/http_req_failed/count")
                .and_then(serde_json::Value::as_u64)
                == Some(0),
            "Expected no failures",
        ),
        (server.connections() == 1, "Expected the local server to be hit"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(format!("{}: {}", message, summary));
        }
    }
    Ok(())
}
