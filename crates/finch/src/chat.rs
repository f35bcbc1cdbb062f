// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `finch chat` and `finch shell`.

use std::sync::{Arc, RwLock};

use colored::Colorize;
use finch_agent::{ChatRequest, ChatResponse, install_signal_handler};
use finch_config::FinchConfig;
use finch_core::FinchError;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::app::App;

/// Who is talking, and where.
#[derive(Debug, Clone)]
pub struct Speaker {
    pub user_id: String,
    pub conversation_id: String,
    pub persona_id: Option<String>,
}

impl Speaker {
    fn request(&self, message: &str) -> ChatRequest {
        let request = ChatRequest::new(&self.user_id, &self.conversation_id, message);
        match &self.persona_id {
            Some(persona) => request.with_persona(persona),
            None => request,
        }
    }
}

/// Run one turn and print the reply.
pub async fn run_chat(
    config: FinchConfig,
    secrets: Arc<RwLock<Vec<String>>>,
    speaker: Speaker,
    message: String,
) -> Result<(), FinchError> {
    let app = App::open(&config, &secrets).await?;
    let result = app.pipeline.handle(speaker.request(&message)).await;
    app.shutdown().await;

    let response = result?;
    print_notes(&response);
    println!("{}", response.reply);
    Ok(())
}

/// Interactive loop over one conversation.
pub async fn run_shell(
    config: FinchConfig,
    secrets: Arc<RwLock<Vec<String>>>,
    speaker: Speaker,
) -> Result<(), FinchError> {
    let app = App::open(&config, &secrets).await?;
    let shutdown = install_signal_handler();

    let mut rl = DefaultEditor::new()
        .map_err(|e| FinchError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "finch shell".bold().green());
    println!(
        "user {} / conversation {}. Type {} to exit, {} to show the summary.\n",
        speaker.user_id.cyan(),
        speaker.conversation_id.cyan(),
        "/quit".yellow(),
        "/summary".yellow()
    );

    let prompt = format!("{}> ", "finch".green());
    loop {
        if shutdown.is_cancelled() {
            break;
        }
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/summary" {
                    match app
                        .pipeline
                        .summarizer()
                        .get_summary(&speaker.user_id, &speaker.conversation_id)
                        .await
                    {
                        Ok(s) if s.is_empty() => println!("{}", "(no summary yet)".dimmed()),
                        Ok(s) => println!("{}", s.dimmed()),
                        Err(e) => eprintln!("{}: {}", "error".red(), e.user_message()),
                    }
                    continue;
                }

                match app.pipeline.handle(speaker.request(trimmed)).await {
                    Ok(response) => {
                        print_notes(&response);
                        println!("{}\n", response.reply);
                    }
                    Err(e @ FinchError::RateLimited { .. }) => {
                        eprintln!("{}", e.user_message().yellow());
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "turn failed");
                        eprintln!("{}: {}", "error".red(), e.user_message());
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    shutdown.cancel();
    app.shutdown().await;
    Ok(())
}

fn print_notes(response: &ChatResponse) {
    if response.over_limit {
        eprintln!("{}", "(older history left out of the prompt)".dimmed());
    }
    if response.summary_updated {
        eprintln!("{}", "(summary updated)".dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speaker_builds_requests() {
        let speaker = Speaker {
            user_id: "u1".into(),
            conversation_id: "c1".into(),
            persona_id: None,
        };
        let req = speaker.request("hi");
        assert_eq!(req.persona_id, None);
        assert_eq!(req.message, "hi");

        let coach = Speaker {
            persona_id: Some("coach".into()),
            ..speaker
        };
        assert_eq!(coach.request("hi").persona_id.as_deref(), Some("coach"));
    }
}
