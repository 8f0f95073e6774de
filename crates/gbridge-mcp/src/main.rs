mod format;
mod initialize;
mod protocol;
mod tools;

use clap::Parser;
use gbridge_protocol::ApiClient;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use protocol::{
    InitializeRequest, JsonRpcRequest, JsonRpcResponse, ToolsCallRequest, INVALID_PARAMS,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
use tools::{ToolCallError, ToolRegistry};

#[derive(Parser, Debug)]
#[command(name = "gbridge-mcp", about = "MCP stdio bridge to a gbridge server")]
struct Args {
    #[arg(long, default_value = "stdio")]
    transport: String,

    /// Root URL of the gbridge HTTP server
    #[arg(long, env = "MCP_BASE_URL", default_value = "http://127.0.0.1:8011")]
    base_url: String,

    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    if args.transport != "stdio" {
        anyhow::bail!("only stdio transport is supported");
    }

    let api_key = args.api_key.filter(|k| !k.is_empty());
    let client = ApiClient::new(&args.base_url, api_key.as_deref())?;
    let registry = ToolRegistry::new(client, api_key.is_some());

    tracing::info!(base_url = %args.base_url, "Starting gbridge MCP bridge");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let request = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
            Ok(req) => req,
            Err(e) => {
                let resp = JsonRpcResponse::error(serde_json::Value::Null, PARSE_ERROR, format!("parse error: {}", e));
                write_response(&mut stdout, &resp).await?;
                continue;
            }
        };

        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "notification");
            continue;
        };

        let response = match request.method.as_str() {
            "initialize" => match serde_json::from_value::<InitializeRequest>(request.params) {
                Ok(init_req) => JsonRpcResponse::success(id, serde_json::to_value(initialize::handle_initialize(init_req))?),
                Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid initialize params: {}", e)),
            },
            "tools/list" => JsonRpcResponse::success(id, serde_json::to_value(registry.list_response())?),
            "tools/call" => match serde_json::from_value::<ToolsCallRequest>(request.params) {
                Ok(call_req) => {
                    tracing::info!(tool = %call_req.name, "tools/call");
                    match registry.call_tool(&call_req.name, call_req.arguments).await {
                        Ok(result) => JsonRpcResponse::success(id, serde_json::to_value(result)?),
                        Err(ToolCallError::UnknownTool(name)) => {
                            JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("unknown tool: {}", name))
                        }
                        Err(ToolCallError::InvalidParams(msg)) => JsonRpcResponse::error(id, INVALID_PARAMS, msg),
                    }
                }
                Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, format!("invalid tools/call params: {}", e)),
            },
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("method not found: {}", request.method)),
        };

        write_response(&mut stdout, &response).await?;
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}

async fn write_response(stdout: &mut tokio::io::Stdout, response: &JsonRpcResponse) -> anyhow::Result<()> {
    stdout.write_all(serde_json::to_string(response)?.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
