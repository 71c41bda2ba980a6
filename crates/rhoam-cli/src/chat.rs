//! Interactive chat session against a single observer.

use std::future::Future;

use rhoam_observer::{Agent, Observer};
use rhoam_rules::{load_rule_set_or_empty, UnknownRulePolicy};
use rhoam_types::ApprovedMessage;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ObserverConfig;

/// Prompt written before each line is read.
pub const PROMPT: &str = "You> ";

/// What a single line of user input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `exit` or `quit`, in any case.
    Quit,
    /// Trimmed, non-empty content to submit.
    Say(String),
    /// Blank line.
    Empty,
}

impl ChatCommand {
    /// Classifies one line of input.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            Self::Quit
        } else {
            Self::Say(trimmed.to_string())
        }
    }
}

/// Why a chat session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatExit {
    Quit,
    EndOfInput,
    Interrupted,
}

impl ChatExit {
    /// Label used in the session-end log line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::EndOfInput => "end_of_input",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Renders an approved message the way the chat transcript shows it.
pub fn format_approved(event: &ApprovedMessage) -> String {
    format!("[{}]: {}", event.sender_id, event.content)
}

/// Builds the session's observer from configuration.
///
/// An unreadable rules file leaves the observer with no rules. A configured
/// `fail_open` replaces whatever policy the rules file declared.
pub fn build_observer(config: &ObserverConfig) -> Observer {
    let mut rules = load_rule_set_or_empty(&config.rules_path);
    if let Some(fail_open) = config.fail_open {
        rules = rules.with_unknown_policy(UnknownRulePolicy::from_fail_open(fail_open));
    }
    Observer::new(config.id.clone(), rules)
}

/// Runs the read-submit loop until the user quits, input ends, or
/// `shutdown` resolves. The agent is disconnected and the observer stopped
/// before returning.
///
/// # Errors
///
/// Returns an I/O error if reading input or writing the prompt fails. The
/// agent and observer are cleaned up in that case too.
pub async fn run_chat<R, W, S>(
    observer: &Observer,
    agent: &Agent,
    input: R,
    mut output: W,
    shutdown: S,
) -> std::io::Result<ChatExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let result = chat_loop(observer, agent, input, &mut output, shutdown).await;

    agent.disconnect(observer);
    observer.stop();

    match &result {
        Ok(exit) => tracing::info!(
            observer_id = observer.id(),
            agent_id = agent.id.as_str(),
            reason = exit.as_str(),
            "chat session ended"
        ),
        Err(e) => tracing::error!(
            observer_id = observer.id(),
            agent_id = agent.id.as_str(),
            error = %e,
            "chat session failed"
        ),
    }
    result
}

async fn chat_loop<R, W, S>(
    observer: &Observer,
    agent: &Agent,
    input: R,
    output: &mut W,
    shutdown: S,
) -> std::io::Result<ChatExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ()>,
{
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let line = tokio::select! {
            () = &mut shutdown => return Ok(ChatExit::Interrupted),
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            return Ok(ChatExit::EndOfInput);
        };

        match ChatCommand::parse(&line) {
            ChatCommand::Quit => return Ok(ChatExit::Quit),
            ChatCommand::Empty => continue,
            ChatCommand::Say(content) => {
                // Rejections are reported by the observer's own log line.
                agent.speak(observer, content);
            }
        }
    }
}
