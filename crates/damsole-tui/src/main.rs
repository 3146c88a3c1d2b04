// Damsole chat entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the HTTP transport
// 4. Create mpsc channels
// 5. Mount the widget (renders the greeting)
// 6. Spawn the conversation loop
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

use damsole_app::bootstrap;
use damsole_core::config;
use damsole_transport::{ChatTransport, HttpTransport};
use damsole_tui::ViewState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Damsole chat starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        endpoint = %config.endpoint,
        credentials = ?config.credentials,
        "Config loaded"
    );

    // 3. Build the HTTP transport
    let transport: Arc<dyn ChatTransport> = Arc::new(
        HttpTransport::from_config(&config).context("failed to build HTTP client")?,
    );

    // 4. Create mpsc channels
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 5. Mount the widget. The greeting is queued on ui_tx before the TUI
    //    starts, so it is the first thing the view sees.
    let view_state = ViewState::from_config(&config);
    let widget = bootstrap::mount(config, transport, ui_tx)
        .await
        .context("failed to mount chat widget")?;

    // 6. Spawn the conversation loop
    let app_handle = tokio::spawn(async move {
        if let Err(e) = damsole_app::run(cmd_rx, widget).await {
            error!("Conversation loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until the user quits)
    info!("Application ready");
    if let Err(e) = damsole_tui::run(ui_rx, cmd_tx, view_state).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for the conversation loop to finish (with timeout)
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("Damsole chat shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("damsole-chat.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("damsole=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
