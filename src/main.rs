use reading_list::infra::json_store::{JsonReadingListRepository, DEFAULT_FILE_NAME};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdoutはMCPの通信路なのでログはstderrへ
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let repo = match std::env::args().nth(1) {
        Some(arg) => JsonReadingListRepository::new(arg),
        None => JsonReadingListRepository::at_default_location().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to the current directory");
            JsonReadingListRepository::new(DEFAULT_FILE_NAME)
        }),
    };

    reading_list::interface::mcp::run(repo).await
}
