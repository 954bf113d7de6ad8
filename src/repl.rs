//! Terminal REPL — stdin/stdout surface over the orchestrator.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::orchestrator::Orchestrator;
use crate::session::SessionState;

const HELP: &str = "\
Commands:
  /id <user id>     set your user ID
  /link             connect your Strava account
  /weight <kg>      set your weight (omit the value to clear)
  /ftp <watts>      set your FTP (omit the value to clear)
  /profile          send your stats to the coach
  /health           check the coach backend
  /status           show the session state
  /quit             exit
Anything else is sent to the coach as a message.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Identity(String),
    Link,
    Weight(Option<String>),
    Ftp(Option<String>),
    Profile,
    Health,
    Status,
    Help,
    Quit,
    Chat(String),
    Unknown(String),
}

impl Command {
    /// Parse a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
            return Some(Self::Quit);
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Chat(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };
        let arg_opt = (!arg.is_empty()).then(|| arg.to_string());

        let cmd = match name {
            "id" => Self::Identity(arg.to_string()),
            "link" => Self::Link,
            "weight" => Self::Weight(arg_opt),
            "ftp" => Self::Ftp(arg_opt),
            "profile" => Self::Profile,
            "health" => Self::Health,
            "status" => Self::Status,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        };
        Some(cmd)
    }
}

/// One line of REPL output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Conversation text, printed to stdout.
    Stdout(String),
    /// Notices and status, printed to stderr.
    Stderr(String),
}

impl Output {
    fn print(&self) {
        match self {
            Self::Stdout(line) => println!("{line}"),
            Self::Stderr(line) => eprintln!("{line}"),
        }
    }
}

/// Print the interim placeholder each time an exchange starts.
///
/// Final advice is printed by the REPL once the exchange returns, so merged
/// watch updates can never swallow it.
pub fn spawn_placeholder_printer(mut rx: watch::Receiver<SessionState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut was_in_flight = rx.borrow_and_update().in_flight;
        while rx.changed().await.is_ok() {
            let (in_flight, advice) = {
                let state = rx.borrow_and_update();
                (state.in_flight, state.advice.clone())
            };
            if in_flight && !was_in_flight {
                eprintln!("⏳ {advice}");
            }
            was_in_flight = in_flight;
        }
    })
}

/// Run the REPL until EOF or `/quit`.
pub async fn run(mut orchestrator: Orchestrator) -> anyhow::Result<()> {
    let printer = spawn_placeholder_printer(orchestrator.session().subscribe());

    eprintln!("🚴 Crank'd coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("{}", gate_line(&orchestrator));
    eprintln!("   Type /help for commands, /quit to exit.\n");
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                break;
            }
        };
        let Some(command) = Command::parse(&line) else {
            eprint!("> ");
            continue;
        };
        if command == Command::Quit {
            break;
        }
        for output in handle(&mut orchestrator, command).await {
            output.print();
        }
        eprint!("> ");
    }

    printer.abort();
    eprintln!("Goodbye!");
    Ok(())
}

/// Execute one command and return what to show.
pub async fn handle(orchestrator: &mut Orchestrator, command: Command) -> Vec<Output> {
    match command {
        Command::Identity(value) => {
            orchestrator.set_identity(value).await;
            let saved = if orchestrator.identity().is_empty() {
                "ℹ️  User ID cleared."
            } else {
                "ℹ️  User ID saved."
            };
            vec![
                Output::Stderr(saved.to_string()),
                Output::Stderr(gate_line(orchestrator)),
            ]
        }
        Command::Link => match orchestrator.begin_linking() {
            Ok(url) => vec![
                Output::Stdout(format!("Open this link to connect Strava:\n{url}")),
                Output::Stdout(
                    "When you are sent back, restart with --location \"<the URL you landed on>\"."
                        .to_string(),
                ),
            ],
            Err(e) => vec![Output::Stderr(format!("⚠️  {e}"))],
        },
        Command::Weight(weight) => {
            orchestrator.set_weight(weight);
            Vec::new()
        }
        Command::Ftp(ftp) => {
            orchestrator.set_ftp(ftp);
            Vec::new()
        }
        Command::Profile => match orchestrator.update_profile().await {
            Ok(notice) => vec![
                advice_line(orchestrator),
                Output::Stderr(format!("✅ {notice}")),
            ],
            Err(e) => vec![Output::Stderr(format!("⚠️  {e}"))],
        },
        Command::Chat(text) => {
            orchestrator.set_transcript(text);
            match orchestrator.send_chat().await {
                Ok(_) => vec![advice_line(orchestrator)],
                Err(e) => vec![Output::Stderr(format!("⚠️  {e}"))],
            }
        }
        Command::Health => match orchestrator.health().await {
            Ok(status) => vec![Output::Stderr(format!("ℹ️  Backend status: {status}"))],
            Err(e) => vec![Output::Stderr(format!("❌ {e}"))],
        },
        Command::Status => {
            let state = orchestrator.snapshot();
            let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
            vec![
                Output::Stderr(format!("   User ID:  {}", display_or_dash(&state.identity))),
                Output::Stderr(format!("   Strava:   {}", state.authorization)),
                Output::Stderr(format!("   Weight:   {}", or_unset(&state.draft.weight))),
                Output::Stderr(format!("   FTP:      {}", or_unset(&state.draft.ftp))),
                Output::Stderr(format!("   Message:  {}", display_or_dash(&state.transcript))),
                Output::Stderr(format!("   Waiting:  {}", state.in_flight)),
            ]
        }
        Command::Help => vec![Output::Stderr(HELP.to_string())],
        Command::Unknown(name) => vec![Output::Stderr(format!(
            "Unknown command /{name}. Type /help."
        ))],
        Command::Quit => Vec::new(),
    }
}

/// Advice left in the session by the exchange that just returned.
fn advice_line(orchestrator: &Orchestrator) -> Output {
    Output::Stdout(format!("\nCoach: {}\n", orchestrator.session().advice()))
}

fn gate_line(orchestrator: &Orchestrator) -> String {
    if orchestrator.identity().is_empty() {
        "   Set your user ID with /id <value> to get started.".to_string()
    } else if !orchestrator.chat_available() {
        "   Connect Strava with /link to start chatting.".to_string()
    } else {
        format!("   Chatting as {}.", orchestrator.identity())
    }
}

fn display_or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use url::Url;

    use super::*;
    use crate::coach::{COACH_ERROR_MESSAGE, CoachBackend, CoachReply, CoachRequest, HealthStatus};
    use crate::config::ClientConfig;
    use crate::error::ExchangeError;
    use crate::linker::History;
    use crate::orchestrator::PROFILE_SENT_NOTICE;
    use crate::store::MemoryStore;

    /// Backend that is always down.
    struct DownBackend;

    #[async_trait]
    impl CoachBackend for DownBackend {
        async fn advise(&self, _request: &CoachRequest) -> Result<CoachReply, ExchangeError> {
            Err(ExchangeError::Status { status: 503 })
        }

        async fn health(&self) -> Result<HealthStatus, ExchangeError> {
            Err(ExchangeError::Status { status: 503 })
        }
    }

    async fn linked_orchestrator() -> Orchestrator {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        let history =
            History::new(Url::parse("http://localhost:3000/?strava_auth_success=true").unwrap());
        let mut orch = Orchestrator::start(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(DownBackend),
            Box::new(history),
        )
        .await;
        orch.set_identity("alice").await;
        orch
    }

    #[tokio::test]
    async fn repeated_failures_are_each_reported() {
        let mut orch = linked_orchestrator().await;
        let expected = Output::Stdout(format!("\nCoach: {COACH_ERROR_MESSAGE}\n"));

        let first = handle(&mut orch, Command::Chat("first try".into())).await;
        let second = handle(&mut orch, Command::Chat("second try".into())).await;

        assert_eq!(first, vec![expected.clone()]);
        assert_eq!(second, vec![expected]);
    }

    #[tokio::test]
    async fn profile_reports_advice_then_notice() {
        let mut orch = linked_orchestrator().await;
        orch.set_weight(Some("70".into()));

        let output = handle(&mut orch, Command::Profile).await;
        assert_eq!(
            output,
            vec![
                Output::Stdout(format!("\nCoach: {COACH_ERROR_MESSAGE}\n")),
                Output::Stderr(format!("✅ {PROFILE_SENT_NOTICE}")),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_chat_prints_no_advice() {
        let mut orch = linked_orchestrator().await;
        orch.set_identity("").await;

        let output = handle(&mut orch, Command::Chat("hello".into())).await;
        assert_eq!(
            output,
            vec![Output::Stderr("⚠️  Please enter a user ID first.".to_string())]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(
            Command::parse("  how did I ride today? "),
            Some(Command::Chat("how did I ride today?".into()))
        );
    }

    #[test]
    fn exit_words_quit() {
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse("QUIT"), Some(Command::Quit));
        assert_eq!(Command::parse("/quit"), Some(Command::Quit));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(
            Command::parse("/id alice"),
            Some(Command::Identity("alice".into()))
        );
        assert_eq!(
            Command::parse("/weight  70.5"),
            Some(Command::Weight(Some("70.5".into())))
        );
        assert_eq!(Command::parse("/ftp"), Some(Command::Ftp(None)));
        assert_eq!(Command::parse("/id"), Some(Command::Identity(String::new())));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            Command::parse("/teleport now"),
            Some(Command::Unknown("teleport".into()))
        );
    }
}
