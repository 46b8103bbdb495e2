//! Interactive terminal chat with the Acme Dental assistant
//!
//! Logs go to stderr at `error` level; set `ACME_DEBUG` for debug output.

use acme_dental::build_router;
use acme_dental::config::AppConfig;
use acme_dental::runtime::{TurnInput, TurnOutcome, TurnStatus};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if std::env::var_os("ACME_DEBUG").is_some() {
        "acme_dental=debug"
    } else {
        "error"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let router = build_router(&config)?;
    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(session_id = %session_id, "Chat session started");

    match router.open_session(&session_id).await {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => println!("Error: {e}\n"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&text.to_lowercase().as_str()) {
            break;
        }

        match router
            .handle_turn(&session_id, TurnInput::Message(text.to_string()))
            .await
        {
            Ok(outcome) => {
                print_outcome(&outcome);
                if outcome.status == TurnStatus::Ended {
                    break;
                }
            }
            Err(e) => println!("Error: {e}\n"),
        }
    }

    Ok(())
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(error) = &outcome.error {
        println!("Error: {error}\n");
        return;
    }
    match outcome.reply() {
        Some(reply) if !reply.is_empty() => println!("Agent: {reply}\n"),
        Some(_) => println!("Agent: No response generated.\n"),
        None => {}
    }
}
