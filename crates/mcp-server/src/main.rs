use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tracing::{error, info, warn};

use shared::config::MosaicConfig;
use shared::notifier::Notifier;
use shared::repos::Store;

use mcp_server::errors::McpError;
use mcp_server::facade::Facade;

/// One line of the newline-delimited JSON request stream (spec §6
/// "The MCP transport framing ... [is] out of scope"; this is the
/// minimal line protocol the core's façade is wired to, grounded on
/// the same newline-delimited convention the MCP stdio transport
/// uses end to end).
#[derive(Debug, Deserialize)]
struct ToolRequest {
    id: Value,
    tool: String,
    #[serde(default)]
    input: Value,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "mcp_server=info".to_string()))
        .init();

    let config = match MosaicConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let store = match Store::connect(&config.database_url, config.database_max_connections).await {
        Ok(store) => store,
        Err(err) => {
            error!("failed to connect to postgres: {err}");
            std::process::exit(1);
        }
    };

    let user = match store
        .get_or_create_user(
            "Mosaic user",
            &config.user_time_zone,
            config.default_week_boundary,
            config.default_privacy_level,
        )
        .await
    {
        Ok(user) => user,
        Err(err) => {
            error!("failed to load user profile: {err}");
            std::process::exit(1);
        }
    };

    let notifier = build_notifier(&config);
    let facade = Facade::new(store, notifier, config.notification_sound.clone(), &user);

    info!("mcp-server starting (timezone={}, week_boundary={})", user.timezone, user.default_week_boundary.as_str());

    run_stdio_loop(&facade).await;

    info!("shutdown signal received, draining pool");
    facade.store().close().await;
}

fn build_notifier(config: &MosaicConfig) -> Option<Notifier> {
    if !config.notifications_enabled {
        return None;
    }

    let bridge_url = config.notification_bridge_url.clone()?;
    match Notifier::new(bridge_url) {
        Ok(notifier) => Some(notifier),
        Err(err) => {
            error!("failed to build notification client: {err}");
            None
        }
    }
}

/// Reads one JSON request per line from stdin, dispatches it, and
/// writes one JSON response per line to stdout (spec §5: cooperative
/// single-event-loop concurrency; spec §6 "Exit behavior" — a
/// shutdown signal stops accepting new requests).
async fn run_stdio_loop(facade: &Facade) {
    let stdin = io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        let line = tokio::select! {
            _ = signal::ctrl_c() => break,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!("failed to read request line: {err}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(facade, &line).await;
        let Ok(serialized) = serde_json::to_string(&response) else {
            warn!("failed to serialize response");
            continue;
        };

        if stdout.write_all(serialized.as_bytes()).await.is_err() || stdout.write_all(b"\n").await.is_err() {
            warn!("failed to write response, stopping");
            break;
        }
        if stdout.flush().await.is_err() {
            warn!("failed to flush stdout");
            break;
        }
    }
}

async fn handle_line(facade: &Facade, line: &str) -> ToolResponse {
    let request: ToolRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(err) => {
            return ToolResponse {
                id: Value::Null,
                output: None,
                error: Some(McpError {
                    code: "InvalidArgument",
                    message: format!("malformed request: {err}"),
                }),
            };
        }
    };

    let id = request.id.clone();
    match dispatch(facade, request).await {
        Ok(output) => ToolResponse { id, output: Some(output), error: None },
        Err(err) => ToolResponse { id, output: None, error: Some(err.into()) },
    }
}

/// One arm per spec §6 tool. Input is deserialized per tool so an
/// unknown field or wrong shape surfaces as `InvalidArgument` rather
/// than silently ignored (spec §4.10).
async fn dispatch(facade: &Facade, request: ToolRequest) -> Result<Value, shared::error::CoreError> {
    use shared::error::CoreError;

    fn parse<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, CoreError> {
        serde_json::from_value(input).map_err(|err| CoreError::InvalidArgument(err.to_string()))
    }

    fn to_value<T: Serialize>(value: T) -> Result<Value, CoreError> {
        serde_json::to_value(value).map_err(|err| CoreError::Internal(err.to_string()))
    }

    let now = Utc::now();

    match request.tool.as_str() {
        "log_work_session" => to_value(facade.log_work_session(parse(request.input)?).await?),
        "log_meeting" => to_value(facade.log_meeting(parse(request.input)?).await?),
        "add_person" => to_value(facade.add_person(parse(request.input)?).await?),
        "add_client" => to_value(facade.add_client(parse(request.input)?).await?),
        "add_project" => to_value(facade.add_project(parse(request.input)?).await?),
        "add_employer" => to_value(facade.add_employer(parse(request.input)?).await?),
        "add_employment_history" => to_value(facade.add_employment_history(parse(request.input)?).await?),
        "add_note" => to_value(facade.add_note(parse(request.input)?).await?),
        "add_reminder" => to_value(facade.add_reminder(parse(request.input)?).await?),
        "update_work_session" => to_value(facade.update_work_session(parse(request.input)?).await?),
        "update_meeting" => to_value(facade.update_meeting(parse(request.input)?).await?),
        "update_person" => to_value(facade.update_person(parse(request.input)?).await?),
        "update_client" => to_value(facade.update_client(parse(request.input)?).await?),
        "update_project" => to_value(facade.update_project(parse(request.input)?).await?),
        "update_employer" => to_value(facade.update_employer(parse(request.input)?).await?),
        "update_note" => to_value(facade.update_note(parse(request.input)?).await?),
        "update_reminder" => to_value(facade.update_reminder(parse(request.input)?).await?),
        "complete_reminder" => to_value(facade.complete_reminder(parse(request.input)?).await?),
        "snooze_reminder" => to_value(facade.snooze_reminder(parse(request.input)?).await?),
        "get_timecard" => to_value(facade.get_timecard(parse(request.input)?).await?),
        "query" => to_value(facade.query(parse(request.input)?, now).await?),
        "query_loose" => to_value(facade.query_loose(parse(request.input)?, now).await?),
        "trigger_notification" => to_value(facade.trigger_notification(parse(request.input)?).await?),
        other => Err(CoreError::InvalidArgument(format!("unknown tool: {other}"))),
    }
}
