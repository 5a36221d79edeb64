//! Advisor chat terminal client.
//!
//! Each line read from stdin is one submission; the conversation is printed
//! to stdout and logs go to stderr.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use advisor_chat::config::AppConfig;
use advisor_chat::proxy::HttpProxyClient;
use advisor_chat::session::ChatSession;
use advisor_chat::telemetry;
use advisor_chat::ui::{ChatView, TerminalView};
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    telemetry::init(&config.logging);

    let endpoint = config.endpoint_url()?;
    let settings = config.session_settings()?;

    info!(
        name: "proxy.config.loaded",
        endpoint = %endpoint,
        timeout_secs = ?config.proxy.timeout_secs,
        policy_chars = settings.policy.chars().count(),
        "Proxy configuration loaded"
    );

    let transport = Arc::new(HttpProxyClient::with_timeout(
        endpoint,
        config.request_timeout(),
    )?);
    let view = TerminalView::stdout().with_in_place(!telemetry::debug_logs_on_terminal());
    let mut session = ChatSession::start(view, transport, settings);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(line) = line else { break };

        let outcome = tokio::select! {
            outcome = session.submit(&line) => outcome,
            _ = tokio::signal::ctrl_c() => break,
        };
        if outcome.is_none() {
            // Blank line: nothing was sent, offer the prompt again.
            session.view_mut().set_input_enabled(true);
        }
    }

    println!();
    session.finish();
    Ok(())
}
