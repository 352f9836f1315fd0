use etf_chat::runtime::SendError;
use etf_chat::{terminal, BearerToken, ChatSession, ClientConfig, ConversationStore, HttpTransport};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "etf_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, authenticated = config.token.is_some(), "Starting ETF chat");

    let auth = Arc::new(BearerToken::new(config.token.clone()));
    let transport = HttpTransport::new(&config, auth)?;
    let (session, handle) =
        ChatSession::new(ConversationStore::new(), transport, config.session_config());
    let session_task = session.spawn();
    let render_task = tokio::spawn(terminal::render_to_stdout(handle.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/cancel" => handle.cancel().await?,
            "/reset" => handle.reset().await?,
            _ => match handle.send(line).await {
                Ok(()) => {}
                Err(e @ (SendError::Empty | SendError::Busy)) => {
                    print!("({e})\n> ");
                    std::io::stdout().flush()?;
                }
                Err(e) => return Err(e.into()),
            },
        }
    }

    drop(handle);
    session_task.await?;
    render_task.await??;
    println!();
    Ok(())
}
