use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "gbridge", about = "HTTP bridge to Gmail, Google Calendar and YouTube captions")]
struct Args {
    /// Listen address (overrides BIND_ADDR)
    #[arg(long)]
    bind: Option<String>,

    /// Token file path (overrides TOKEN_FILE)
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Attachment directory (overrides ATTACHMENT_DIR)
    #[arg(long)]
    attachment_dir: Option<PathBuf>,

    /// Poll for new attachments in the background
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    gbridge_lib::run(gbridge_lib::Overrides {
        bind: args.bind,
        token_file: args.token_file,
        attachment_dir: args.attachment_dir,
        watch: args.watch,
    })
    .await
}
