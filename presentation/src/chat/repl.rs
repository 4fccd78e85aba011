//! REPL (Read-Eval-Print Loop) for the ops console

use crate::config::ReplConfig;
use crate::output::console::ConsoleRenderer;
use colored::Colorize;
use kubechat_application::{
    ChatController, ChatStreamPort, ChatUpdate, CommandAction, SessionApiPort,
};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::io::Write;
use tokio::sync::mpsc;
use tracing::debug;

/// Interactive chat REPL
///
/// Input is read line by line. While a reply streams, updates are rendered
/// as they arrive and Ctrl-C cancels the exchange instead of exiting.
pub struct ChatRepl<S: ChatStreamPort + 'static, A: SessionApiPort + 'static> {
    controller: ChatController<S, A>,
    updates: mpsc::UnboundedReceiver<ChatUpdate>,
    renderer: ConsoleRenderer,
    config: ReplConfig,
    backend_label: Option<String>,
}

impl<S: ChatStreamPort + 'static, A: SessionApiPort + 'static> ChatRepl<S, A> {
    /// Create a new ChatRepl
    pub fn new(
        controller: ChatController<S, A>,
        updates: mpsc::UnboundedReceiver<ChatUpdate>,
        config: ReplConfig,
    ) -> Self {
        Self {
            controller,
            updates,
            renderer: ConsoleRenderer::new(config.show_status),
            config,
            backend_label: None,
        }
    }

    /// Show the backend address in the welcome banner
    pub fn with_backend_label(mut self, label: impl Into<String>) -> Self {
        self.backend_label = Some(label.into());
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.config.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();
        self.flush_updates();

        loop {
            let prompt = self.controller.prompt_string().await;
            let readline = rl.readline(&prompt);

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    // Skip empty lines
                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        let action = self.controller.handle_command(line).await;
                        self.flush_updates();
                        if action == CommandAction::Exit {
                            break;
                        }
                        continue;
                    }

                    self.send(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    /// Send one message, rendering updates until the exchange ends.
    async fn send(&mut self, text: &str) {
        let mut interrupted = false;
        {
            let send = self.controller.send(text);
            tokio::pin!(send);
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);

            loop {
                tokio::select! {
                    result = &mut send => {
                        if let Err(e) = result {
                            debug!("Send rejected: {}", e);
                        }
                        break;
                    }
                    Some(update) = self.updates.recv() => {
                        write_out(&self.renderer.render(update));
                    }
                    _ = &mut ctrl_c, if !interrupted => {
                        interrupted = true;
                        self.controller.cancel_exchange();
                    }
                }
            }
        }

        self.flush_updates();
        if interrupted {
            println!("{}", "(stopped)".dimmed());
        }
    }

    /// Render every update queued so far.
    fn flush_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            write_out(&self.renderer.render(update));
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│        kubechat - Kubernetes ops chat       │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        if let Some(label) = &self.backend_label {
            println!("Backend: {}", label);
            println!();
        }
        println!("{}", ConsoleRenderer::help());
        println!();
    }
}

fn write_out(text: &str) {
    if text.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}
