// SPDX-FileCopyrightText: 2026 Finch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finch - a memory-backed chat pipeline.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod chat;
mod inspect;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, RwLock};

use clap::{Args, Parser, Subcommand};
use finch_core::FinchError;

use crate::chat::Speaker;

/// Finch - a memory-backed chat pipeline.
#[derive(Parser, Debug)]
#[command(name = "finch", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct SpeakerArgs {
    /// User the turn belongs to.
    #[arg(long, short, default_value = "local")]
    user: String,
    /// Conversation within the user's history.
    #[arg(long, short, default_value = "default")]
    conversation: String,
    /// Persona answering the turn (defaults to `agent.persona`).
    #[arg(long)]
    persona: Option<String>,
}

impl From<SpeakerArgs> for Speaker {
    fn from(args: SpeakerArgs) -> Self {
        Self {
            user_id: args.user,
            conversation_id: args.conversation,
            persona_id: args.persona,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one message and print the reply.
    Chat {
        #[command(flatten)]
        speaker: SpeakerArgs,
        /// Message text; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Launch an interactive chat loop.
    Shell {
        #[command(flatten)]
        speaker: SpeakerArgs,
    },
    /// Search a user's remembered facts.
    Recall {
        #[arg(long, short, default_value = "local")]
        user: String,
        /// Maximum hits (defaults to `memory.top_k`).
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print the rolling summary of a conversation.
    Summary {
        #[arg(long, short, default_value = "local")]
        user: String,
        #[arg(long, short, default_value = "default")]
        conversation: String,
    },
    /// Print the effective configuration as TOML.
    Config,
}

/// Exit status for a turn rejected by the rate limiter.
const EXIT_RATE_LIMITED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => finch_config::load_and_validate_path(path),
        None => finch_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            finch_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    let secrets = Arc::new(RwLock::new(Vec::new()));
    app::init_tracing(&config.agent.log_level, secrets.clone());

    let result = match cli.command {
        Commands::Chat { speaker, message } => {
            chat::run_chat(config, secrets, speaker.into(), message.join(" ")).await
        }
        Commands::Shell { speaker } => chat::run_shell(config, secrets, speaker.into()).await,
        Commands::Recall { user, top_k, query } => {
            inspect::run_recall(config, secrets, user, query.join(" "), top_k).await
        }
        Commands::Summary { user, conversation } => {
            inspect::run_summary(config, user, conversation).await
        }
        Commands::Config => inspect::run_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("error: {}", describe(&e));
            match e {
                FinchError::RateLimited { .. } => ExitCode::from(EXIT_RATE_LIMITED),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Local errors keep their detail; remote and storage failures get the
/// public wording.
fn describe(err: &FinchError) -> String {
    match err {
        FinchError::Config(_) | FinchError::Validation(_) => err.to_string(),
        _ => err.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn chat_joins_words_and_uses_defaults() {
        let cli = Cli::try_parse_from(["finch", "chat", "what", "did", "I", "spend?"]).unwrap();
        match cli.command {
            Commands::Chat { speaker, message } => {
                assert_eq!(message.join(" "), "what did I spend?");
                assert_eq!(speaker.user, "local");
                assert_eq!(speaker.conversation, "default");
                assert_eq!(speaker.persona, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "finch", "summary", "-u", "alice", "-c", "budget", "--config", "/tmp/finch.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/finch.toml")));
        assert!(matches!(
            cli.command,
            Commands::Summary { ref user, ref conversation } if user == "alice" && conversation == "budget"
        ));
    }

    #[test]
    fn chat_requires_a_message() {
        assert!(Cli::try_parse_from(["finch", "chat"]).is_err());
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = finch_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.agent.persona, "prime");
    }

    #[test]
    fn capability_errors_are_described_without_detail() {
        let err = FinchError::provider("upstream said: sk-live-secret");
        assert!(!describe(&err).contains("sk-live-secret"));
        let err = FinchError::Validation("message is required".into());
        assert!(describe(&err).contains("message is required"));
        let err = FinchError::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert!(describe(&err).contains("30"));
    }
}
