use crate::protocol::{
    InitializeRequest, InitializeResponse, PeerInfo, ServerCapabilities, ToolsCapabilities, MCP_PROTOCOL_VERSION,
};

pub const SERVER_NAME: &str = "google-api-server";

pub fn handle_initialize(request: InitializeRequest) -> InitializeResponse {
    tracing::info!(
        client = %request.client_info.name,
        client_version = %request.client_info.version,
        requested = %request.protocol_version,
        "initialize"
    );

    InitializeResponse {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapabilities { list_changed: false },
        },
        server_info: PeerInfo {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        instructions: "Gmail and Google Calendar tools backed by a local gbridge server. Use read_emails to find message IDs and read_calendar_reminders to find event IDs before downloading or deleting.".to_string(),
    }
}
