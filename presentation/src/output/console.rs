//! Console renderer for chat updates
//!
//! Turns the [`ChatUpdate`] stream into terminal text. Streaming replies are
//! printed incrementally: each snapshot of the open assistant message only
//! contributes the part not printed yet.

use colored::Colorize;
use kubechat_application::ChatUpdate;
use kubechat_domain::{Message, MessageId, Role, Session, SessionId, StreamingStatus};

/// Stateful renderer; [`render`](Self::render) returns the text to print.
#[derive(Debug)]
pub struct ConsoleRenderer {
    show_status: bool,
    sessions: Vec<Session>,
    /// Open assistant message and what has been printed of it
    streaming: Option<(MessageId, String)>,
    at_line_start: bool,
}

impl ConsoleRenderer {
    pub fn new(show_status: bool) -> Self {
        Self {
            show_status,
            sessions: Vec::new(),
            streaming: None,
            at_line_start: true,
        }
    }

    /// Title of a known session.
    pub fn title_of(&self, id: &SessionId) -> Option<&str> {
        self.sessions
            .iter()
            .find(|s| &s.id == id)
            .map(|s| s.title.as_str())
    }

    /// Apply one update and return what should be written to the terminal.
    pub fn render(&mut self, update: ChatUpdate) -> String {
        let out = match update {
            ChatUpdate::SessionsChanged(sessions) => {
                self.sessions = sessions;
                String::new()
            }
            ChatUpdate::CurrentSessionChanged(id) => {
                let title = self.title_of(&id).unwrap_or("New Chat").to_string();
                self.line(&format!("{} {}", "Session:".cyan().bold(), title))
            }
            ChatUpdate::TranscriptLoaded { messages, .. } => {
                self.streaming = None;
                messages
                    .iter()
                    .map(|m| self.line(&Self::format_message(m)))
                    .collect()
            }
            ChatUpdate::MessageAdded(message) => self.message_added(message),
            ChatUpdate::MessageUpdated(message) => self.message_updated(message),
            ChatUpdate::Status(status) => self.status(&status),
            ChatUpdate::ExchangeFinished {
                commands_executed, ..
            } => {
                let mut out = self.break_line();
                if !commands_executed.is_empty() {
                    out.push_str(&self.line(&format!(
                        "{} {}",
                        "Commands executed:".dimmed(),
                        commands_executed.join(", ")
                    )));
                }
                out
            }
            ChatUpdate::Help => self.line(&Self::help()),
            ChatUpdate::Exit => self.line("Bye!"),
            ChatUpdate::SessionList { sessions, current } => {
                self.line(&Self::format_session_list(&sessions, &current))
            }
            ChatUpdate::CommandError { message } => {
                self.line(&format!("{} {}", "Error:".red().bold(), message))
            }
            ChatUpdate::UnknownCommand { command } => self.line(&format!(
                "Unknown command: {}\nType /help for available commands",
                command
            )),
            ChatUpdate::Notification { text } => {
                self.line(&format!("{} {}", "✗".red().bold(), text.red()))
            }
            ChatUpdate::Info { text } => self.line(&text.dimmed().to_string()),
        };
        if let Some(last) = out.chars().last() {
            self.at_line_start = last == '\n';
        }
        out
    }

    fn message_added(&mut self, message: Message) -> String {
        match message.role {
            // The user just typed it.
            Role::User => String::new(),
            Role::Assistant if message.is_streaming => {
                let mut out = self.break_line();
                out.push_str(&format!("{} ", "kubechat ›".green().bold()));
                out.push_str(&message.content);
                self.streaming = Some((message.id, message.content));
                out
            }
            Role::Assistant => self.line(&Self::format_message(&message)),
        }
    }

    fn message_updated(&mut self, message: Message) -> String {
        let Some((id, printed)) = &mut self.streaming else {
            return String::new();
        };
        if id != &message.id {
            return String::new();
        }

        let mut out = String::new();
        if message.is_error {
            out.push('\n');
            out.push_str(&message.content.red().to_string());
        } else if let Some(suffix) = message.content.strip_prefix(printed.as_str()) {
            out.push_str(suffix);
        } else {
            out.push('\n');
            out.push_str(&message.content);
        }
        *printed = message.content.clone();

        if !message.is_streaming {
            self.streaming = None;
            out.push('\n');
        }
        out
    }

    fn status(&mut self, status: &StreamingStatus) -> String {
        if !self.show_status {
            return String::new();
        }
        let label = match status {
            StreamingStatus::Investigating
            | StreamingStatus::Analyzing
            | StreamingStatus::ExecutingCommand { .. } => format!("⋯ {}", status).yellow(),
            StreamingStatus::CommandResult { success: true, .. } => {
                format!("✓ {}", status).green()
            }
            StreamingStatus::CommandResult { success: false, .. } => format!("✗ {}", status).red(),
            _ => return String::new(),
        };
        let mut out = self.break_line();
        out.push_str(&format!("{}\n", label.dimmed()));
        out
    }

    fn line(&self, text: &str) -> String {
        format!("{}{}\n", self.break_line(), text)
    }

    fn break_line(&self) -> String {
        if self.at_line_start {
            String::new()
        } else {
            "\n".to_string()
        }
    }

    /// Format one stored message for a transcript replay
    pub fn format_message(message: &Message) -> String {
        let label = match message.role {
            Role::User => "you ›".cyan().bold(),
            Role::Assistant => "kubechat ›".green().bold(),
        };
        let content = if message.is_error {
            message.content.red().to_string()
        } else {
            message.content.clone()
        };
        format!("{} {}", label, content)
    }

    /// Format the `/sessions` listing
    pub fn format_session_list(sessions: &[Session], current: &SessionId) -> String {
        let mut output = format!("{}\n", "Sessions:".cyan().bold());
        for (i, session) in sessions.iter().enumerate() {
            let marker = if &session.id == current { "*" } else { " " };
            let detail = if session.is_ephemeral {
                "unsaved".to_string()
            } else {
                format!(
                    "{} messages, id {}, {}",
                    session.message_count,
                    session.id,
                    session.last_activity.format("%Y-%m-%d %H:%M")
                )
            };
            output.push_str(&format!(
                "{} {:>2}. {} {}\n",
                marker,
                i + 1,
                session.title,
                format!("({})", detail).dimmed()
            ));
        }
        output.trim_end().to_string()
    }

    pub fn help() -> String {
        [
            "Commands:",
            "  /help, /h, /?           - Show this help",
            "  /sessions, /ls          - List sessions",
            "  /new                    - Start a new chat",
            "  /switch <n|id>          - Switch to a session",
            "  /rename <n|id> <title>  - Rename a saved session",
            "  /delete, /rm <n|id>     - Delete a session",
            "  /refresh                - Reload sessions from the backend",
            "  /quit, /exit, /q        - Exit",
            "",
            "Anything else is sent to the assistant. Ctrl-C stops a running reply.",
        ]
        .join("\n")
    }
}
