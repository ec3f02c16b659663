//! Daemon mode – JSON-lines protocol over a Unix socket.
//!
//! Every connection runs on its own task with its own engine, so sessions
//! never share state and a slow client never blocks the others. Only the
//! command registry is shared.

use calc_engine::types::*;
use calc_engine::{CalculationEngine, CommandRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

pub async fn run_daemon(socket_path: PathBuf, scale: u32, registry: CommandRegistry) -> anyhow::Result<()> {
    // Remove stale socket if it exists
    let _ = std::fs::remove_file(&socket_path);

    let listener = UnixListener::bind(&socket_path)
        .map_err(|e| anyhow::anyhow!("cannot bind socket {}: {}", socket_path.display(), e))?;

    tracing::info!(socket = %socket_path.display(), "calcctl daemon listening");
    serve_listener(listener, scale, Arc::new(registry)).await
}

async fn serve_listener(listener: UnixListener, scale: u32, registry: Arc<CommandRegistry>) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    handle_session(stream, scale, &registry).await;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept error");
            }
        }
    }
}

async fn handle_session(stream: UnixStream, scale: u32, registry: &CommandRegistry) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut engine = CalculationEngine::with_scale(scale);
    tracing::debug!("session opened");

    while let Ok(Some(line)) = lines.next_line().await {
        let response = handle_request(&line, &mut engine, registry);
        let mut resp_json = serde_json::to_string(&response).unwrap_or_else(|_| "{}".into());
        resp_json.push('\n');
        if writer.write_all(resp_json.as_bytes()).await.is_err() {
            break;
        }
    }
    tracing::debug!(history = engine.history().len(), "session closed");
}

fn error_response(id: String, message: String) -> DaemonResponse {
    DaemonResponse {
        id,
        result: None,
        error: Some(ErrorInfo {
            code: ErrorCode::InvalidInput,
            message,
        }),
    }
}

fn handle_request(
    line: &str,
    engine: &mut CalculationEngine,
    registry: &CommandRegistry,
) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => return error_response("unknown".into(), format!("invalid JSON request: {}", e)),
    };

    let result = match req.method.as_str() {
        "call" => {
            let cmd_name = req.params.get("cmd").and_then(|v| v.as_str()).unwrap_or("");
            let args = req
                .params
                .get("args")
                .cloned()
                .unwrap_or(serde_json::Value::Object(Default::default()));
            let r = registry.execute(cmd_name, args, engine);
            serde_json::to_value(r).unwrap_or_default()
        }
        "list" => serde_json::json!({ "commands": registry.list() }),
        other => return error_response(req.id, format!("unknown method: {}", other)),
    };

    DaemonResponse {
        id: req.id,
        result: Some(result),
        error: None,
    }
}
