use futures_util::future::join_all;
use hedge_chat::tickers::extract_tickers;
use hedge_chat::transcript::{ChatMessage, Role};
use hedge_chat::{AnalysisHandle, AppConfig, ChatClient, ChatSession, TranscriptEvent};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Load Configuration
    let config = AppConfig::load()?;

    // Setup Logging (stderr, so stdout only carries the chat)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting HedgeChat...");
    info!("Loaded Configuration: {:?}", config);

    let client = ChatClient::from_config(&config)?;
    info!("Using analysis endpoint: {}", client.endpoint());

    let session = ChatSession::new(client, config.chat.welcome_message.as_deref());
    for message in session.snapshot() {
        print_message(&message);
    }

    // Renderer: print transcript changes as they happen, drain on shutdown
    let shutdown = CancellationToken::new();
    let renderer = {
        let session = session.clone();
        let mut rx = session.subscribe();
        let show_progress = config.chat.show_progress;
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    biased;
                    received = rx.recv() => received,
                    _ = shutdown.cancelled() => break,
                };
                match received {
                    Ok(TranscriptEvent::Appended(id)) => {
                        if let Some(m) = session.message(id).filter(|m| m.role != Role::Assistant) {
                            print_message(&m);
                        }
                    }
                    Ok(TranscriptEvent::Updated(id)) if show_progress => {
                        if let Some(m) = session.message(id) {
                            println!("  … {}", m.content.lines().next().unwrap_or_default());
                        }
                    }
                    Ok(TranscriptEvent::Updated(_)) => {}
                    Ok(TranscriptEvent::Finished(id)) => {
                        if let Some(m) = session.message(id) {
                            print_message(&m);
                        }
                    }
                    Err(RecvError::Lagged(n)) => warn!("⚠️ [CHAT] Renderer skipped {} updates", n),
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let active: Arc<Mutex<Vec<AnalysisHandle>>> = Arc::new(Mutex::new(Vec::new()));

    // Ctrl-C cancels whatever is streaming
    {
        let active = active.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                let handles: Vec<AnalysisHandle> = lock(&active).drain(..).collect();
                info!("🛑 Cancelling {} active analyses", handles.len());
                for handle in &handles {
                    handle.cancel();
                }
            }
        });
    }

    println!("Type a question (\"/json\" dumps the transcript, \"/quit\" exits, Ctrl-C cancels streaming).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/json" => {
                println!("{}", session.to_json()?);
                continue;
            }
            _ => {}
        }

        if !line.trim().is_empty() && extract_tickers(&line).is_empty() {
            warn!("⚠️ No ticker symbols recognised in your message; the backend will likely reject it");
        }

        if let Some(turn) = session.send(&line) {
            let mut active = lock(&active);
            active.retain(|h| !h.is_finished());
            active.push(turn.handle);
        }
    }

    // Input is done; let open answers finish unless Ctrl-C cancels them
    let pending: Vec<AnalysisHandle> = lock(&active).drain(..).collect();
    if !pending.is_empty() {
        info!("⏳ Waiting for {} active analyses", pending.len());
        let cancellers: Vec<_> = pending.iter().map(AnalysisHandle::canceller).collect();
        tokio::select! {
            states = join_all(pending.into_iter().map(AnalysisHandle::join)) => {
                debug!("Analyses settled: {:?}", states);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Cancelling {} active analyses", cancellers.len());
                for c in &cancellers {
                    c.cancel();
                }
            }
        }
    }

    info!("Shutting down...");
    shutdown.cancel();
    renderer.await?;

    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn print_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
        Role::System => "system",
    };
    println!(
        "[{}] {}:\n{}\n",
        message.created_at.format("%H:%M:%S"),
        who,
        message.content
    );
}
