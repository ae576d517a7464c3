//! Interactive chat loop.
//!
//! Plain lines are sent to the current session; lines starting with `/` are
//! commands. Sends run in the background so the prompt stays usable while
//! the model is generating; replies are printed by a response handler task.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use colored::Colorize;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tokio::sync::mpsc;

use crate::commands::{self, send::print_outcome};
use crate::{clipboard, render};
use aura_application::{ChatService, Draft, SendOutcome};

const COMMANDS: &[(&str, &str)] = &[
    ("/new", "start a new session"),
    ("/list", "list sessions"),
    ("/select", "<n|id> switch to a session"),
    ("/delete", "<n|id> delete a session"),
    ("/clear", "delete all sessions"),
    ("/attach", "<path>... add files to the next message (no args: show pending)"),
    ("/detach", "<n> remove a pending attachment"),
    ("/history", "show the current conversation"),
    ("/copy", "[n] copy message n (default: last reply) to the clipboard"),
    ("/export", "[dir] save the conversation as a text transcript"),
    ("/share", "print a share link for the conversation"),
    ("/import", "<link> open a shared conversation"),
    ("/help", "show this help"),
    ("/quit", "exit"),
];

/// rustyline helper providing slash-command completion, highlighting and hints.
#[derive(Clone)]
struct ReplHelper {
    commands: Vec<String>,
}

impl ReplHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ReplHelper {}

/// What the loop should do after a line was handled.
enum Flow {
    Continue,
    Quit,
}

struct Repl {
    service: ChatService,
    draft: Draft,
    export_dir: PathBuf,
    responses: mpsc::Sender<SendOutcome>,
}

/// Runs the REPL until `/quit` or end of input.
pub async fn run(service: ChatService, export_dir: PathBuf) -> Result<()> {
    let (response_tx, mut response_rx) = mpsc::channel::<SendOutcome>(32);

    let response_handler = tokio::spawn(async move {
        while let Some(outcome) = response_rx.recv().await {
            print_outcome(&outcome);
        }
    });

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ReplHelper::new()));

    println!("{}", "=== Aura AI ===".bright_magenta().bold());
    println!(
        "{}",
        "Type a message to chat, '/help' for commands, '/quit' to exit.".bright_black()
    );
    let mut repl = Repl {
        service,
        draft: Draft::new(),
        export_dir,
        responses: response_tx,
    };
    if let Some(session) = repl.service.current_session().await {
        render::print_history(&session);
    }
    println!();

    loop {
        let prompt = repl.prompt();
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match repl.handle_line(trimmed).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(e) => render::error(e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                render::error(format!("{:?}", err));
                break;
            }
        }
    }

    // Pending replies still get written before exit
    drop(repl);
    let _ = response_handler.await;
    Ok(())
}

impl Repl {
    fn prompt(&self) -> String {
        match self.draft.attachments().len() {
            0 => "aura> ".to_string(),
            1 => "aura [1 file]> ".to_string(),
            n => format!("aura [{n} files]> "),
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if !line.starts_with('/') {
            self.send(line).await?;
            return Ok(Flow::Continue);
        }

        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (line, ""),
        };

        match command {
            "/quit" | "/exit" => return Ok(Flow::Quit),
            "/help" => print_help(),
            "/new" => commands::sessions::new(&self.service).await?,
            "/list" => commands::sessions::list(&self.service).await?,
            "/select" => {
                commands::sessions::select(&self.service, required(args, "/select <n|id>")?)
                    .await?;
                commands::sessions::history(&self.service).await?;
            }
            "/delete" => {
                commands::sessions::delete(&self.service, required(args, "/delete <n|id>")?)
                    .await?
            }
            "/clear" => commands::sessions::clear(&self.service).await?,
            "/history" => commands::sessions::history(&self.service).await?,
            "/attach" => self.attach(args).await,
            "/detach" => self.detach(required(args, "/detach <n>")?)?,
            "/copy" => self.copy(args).await?,
            "/export" => {
                let dir = if args.is_empty() {
                    self.export_dir.clone()
                } else {
                    PathBuf::from(args)
                };
                commands::transcript::export(&self.service, &dir).await?;
            }
            "/share" => commands::share::share(&self.service, true).await?,
            "/import" => {
                commands::share::import(&self.service, required(args, "/import <link>")?).await?;
                commands::sessions::history(&self.service).await?;
            }
            other => bail!("Unknown command '{}'. Type /help for a list.", other),
        }
        Ok(Flow::Continue)
    }

    /// Appends the draft as a user turn and waits for the reply in the
    /// background; the reply arrives via the handler.
    ///
    /// The draft is only cleared once the turn has been accepted.
    async fn send(&mut self, text: &str) -> Result<()> {
        self.draft.set_text(text);
        if !self.draft.is_sendable() {
            return Ok(());
        }
        let Some(session_id) = self.service.current_session_id().await else {
            bail!("No active session. Use /new to start one.");
        };

        let submitted = self
            .service
            .submit(&session_id, self.draft.text(), self.draft.attachments().to_vec())
            .await;
        let pending = match commands::saved(submitted)? {
            Some(Some(pending)) => pending,
            Some(None) => {
                render::warn(
                    "Aura is still answering in this session. Press Up to resend after the reply.",
                );
                return Ok(());
            }
            None => {
                // The turn is kept in memory even though it was not saved
                self.draft.take();
                return Ok(());
            }
        };
        self.draft.take();

        let service = self.service.clone();
        let responses = self.responses.clone();
        render::info("Aura is thinking...");
        tokio::spawn(async move {
            match service.complete(pending).await {
                Ok(outcome) => {
                    let _ = responses.send(outcome).await;
                }
                Err(e) => render::warn(format!("changes could not be saved: {e}")),
            }
        });
        Ok(())
    }

    async fn attach(&mut self, args: &str) {
        if args.is_empty() {
            self.print_pending();
            return;
        }
        let paths: Vec<PathBuf> = args.split_whitespace().map(PathBuf::from).collect();
        let added = self.draft.attach_files(&paths).await;
        if added < paths.len() {
            render::warn(format!("{} file(s) could not be read", paths.len() - added));
        }
        self.print_pending();
    }

    fn detach(&mut self, args: &str) -> Result<()> {
        let index = args
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.draft.remove_attachment(i));
        match index {
            Some(removed) => render::info(format!("Removed {}", removed.name)),
            None => bail!("No pending attachment #{}", args),
        }
        Ok(())
    }

    fn print_pending(&self) {
        if self.draft.attachments().is_empty() {
            render::info("No pending attachments.");
            return;
        }
        for (i, attachment) in self.draft.attachments().iter().enumerate() {
            render::info(format!(
                "{:>2}. {} ({})",
                i + 1,
                attachment.name,
                attachment.mime_type
            ));
        }
    }

    async fn copy(&self, args: &str) -> Result<()> {
        let Some(session) = self.service.current_session().await else {
            bail!("No active session");
        };
        let message = if args.is_empty() {
            session.messages.iter().rev().find(|m| !m.is_user())
        } else {
            args.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| session.messages.get(i))
        };
        let Some(message) = message else {
            bail!("No message to copy");
        };
        clipboard::copy(&message.content)?;
        render::info("Copied to clipboard.");
        Ok(())
    }
}

fn required<'a>(args: &'a str, usage: &str) -> Result<&'a str> {
    if args.is_empty() {
        bail!("Usage: {}", usage);
    }
    Ok(args)
}

fn print_help() {
    for (name, description) in COMMANDS {
        println!("  {:<10} {}", name.bright_cyan(), description.bright_black());
    }
}

/// Default directory for `/export`.
pub fn default_export_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf())
}
