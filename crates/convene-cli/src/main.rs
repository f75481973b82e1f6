//! convene — run a mediated chat stage from the terminal.
//!
//! Reads participant lines from stdin, gives every configured mediator a
//! turn after each one, and reports when an awaited reply times out.

use std::path::PathBuf;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use convene_core::chat::ChatMessage;
use convene_core::config::Config;
use convene_core::events::SessionEvent;
use convene_core::profiles::assign_anonymous_profiles;
use convene_core::session::ChatSession;
use convene_core::stages::chat::{ChatDiscussion, ChatStageConfig, MediatorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match Config::load_from_dir(&project_root) {
        Ok(config) => config,
        Err(err) => {
            warn!(%err, "no usable config.yaml, falling back to defaults");
            Config::default()
        }
    };
    info!(provider = %config.provider, model = %config.model, "starting chat");

    let stage = ChatStageConfig::new("Group discussion")
        .with_discussion(ChatDiscussion::open("Introduce yourselves"))
        .with_mediator(MediatorConfig::new(
            "Moderator",
            "🦉",
            "You are a friendly discussion moderator. Keep the conversation \
             welcoming and on topic, and step in when it stalls.",
        ));

    let profile = assign_anonymous_profiles(1, &stage.base.id)
        .into_iter()
        .next()
        .unwrap_or_default();
    println!("You are {} {}. Type a message, or Ctrl-D to quit.", profile.avatar, profile.name);

    let mut session = ChatSession::new(stage, config.response_timeout());

    // Surface timeout events as they fire, between prompts.
    let mut events = session.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::ResponseTimedOut) => {
                    println!();
                    println!("(no reply arrived in time — the conversation may have stalled)");
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        session.append(ChatMessage::participant(text, "cli", profile.clone()));

        let posted = session.run_mediator_turns(&config).await?;
        if posted.is_empty() {
            println!("(mediators stayed silent)");
        }
        for message in posted {
            println!("{} {}: {}", message.profile.avatar, message.profile.name, message.message);
        }
    }

    info!(messages = session.history().len(), "chat ended");
    Ok(())
}
