//! Terminal chat loop.
//!
//! Reads lines from stdin, turns them into session intents and prints every
//! message appended to the transcript since the last command.

use std::future::Future;
use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use urlgenie_chat::session::lock_session;
use urlgenie_chat::{
    ChatError, IgnoreReason, InputDraft, ResponseCoordinator, SendOutcome, VoiceInput, VoiceState,
};
use urlgenie_core::error::Result;

use crate::render::{format_message, HELP_TEXT};

pub const CONTEXT_HINT: &str = "Use /url <address> to choose a website first.";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    SetUrl(String),
    ClearUrl,
    ToggleVoice,
    Help,
    Quit,
    Send(String),
}

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub fn parse_line(line: &str) -> ReplCommand {
    let trimmed = line.trim();
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (trimmed, ""),
    };

    match head {
        "/url" => ReplCommand::SetUrl(rest.to_string()),
        "/clear" if rest.is_empty() => ReplCommand::ClearUrl,
        "/voice" if rest.is_empty() => ReplCommand::ToggleVoice,
        "/help" if rest.is_empty() => ReplCommand::Help,
        "/quit" | "/exit" if rest.is_empty() => ReplCommand::Quit,
        _ => ReplCommand::Send(line.to_string()),
    }
}

pub struct Repl {
    coordinator: ResponseCoordinator,
    voice: VoiceInput,
    draft: InputDraft,
    printed: usize,
}

impl Repl {
    pub fn new(coordinator: ResponseCoordinator, voice: VoiceInput) -> Self {
        Self {
            coordinator,
            voice,
            draft: InputDraft::new(),
            printed: 0,
        }
    }

    /// Print messages appended since the last flush.
    fn flush_transcript<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let session = lock_session(self.coordinator.session())?;
        let messages = session.transcript().messages();
        for message in messages.iter().skip(self.printed) {
            writeln!(out, "{}\n", format_message(message))?;
        }
        self.printed = messages.len();
        Ok(())
    }

    fn print_context<W: Write>(&self, out: &mut W) -> Result<()> {
        let session = lock_session(self.coordinator.session())?;
        match session.active_url() {
            Some(url) => writeln!(out, "Chatting about: {}", url)?,
            None => writeln!(out, "{}", CONTEXT_HINT)?,
        }
        Ok(())
    }

    /// Resolve a finished voice listen into the draft.
    fn poll_voice<W: Write>(&mut self, out: &mut W) -> Result<()> {
        match self.voice.poll(&mut self.draft) {
            Some(Ok(_)) if !self.draft.is_blank() => {
                writeln!(out, "Voice draft: {}", self.draft.as_str())?;
            }
            Some(Ok(_)) => writeln!(out, "Nothing was recognized.")?,
            Some(Err(e)) => writeln!(out, "Voice input failed: {}", e)?,
            None => {}
        }
        Ok(())
    }

    /// Print the transcript so far and the context line.
    pub fn start<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.flush_transcript(out)?;
        self.print_context(out)?;
        writeln!(out, "Type /help for commands.")?;
        Ok(())
    }

    /// Apply one command.
    pub async fn handle<W: Write>(&mut self, command: ReplCommand, out: &mut W) -> Result<Flow> {
        self.poll_voice(out)?;

        match command {
            ReplCommand::Quit => return Ok(Flow::Exit),
            ReplCommand::Help => writeln!(out, "{}", HELP_TEXT)?,
            ReplCommand::SetUrl(url) => {
                let result = lock_session(self.coordinator.session())?.set_url(&url);
                match result {
                    Ok(_) => {
                        self.flush_transcript(out)?;
                        self.print_context(out)?;
                    }
                    Err(ChatError::EmptyUrl) => writeln!(out, "Usage: /url <address>")?,
                    Err(e) => return Err(e.into()),
                }
            }
            ReplCommand::ClearUrl => {
                lock_session(self.coordinator.session())?.clear_url()?;
                self.flush_transcript(out)?;
            }
            ReplCommand::ToggleVoice => match self.voice.toggle() {
                Ok(VoiceState::Listening) => {
                    writeln!(out, "Listening... press Enter to use what was heard.")?
                }
                Ok(_) => writeln!(out, "Voice input stopped.")?,
                Err(e) => writeln!(out, "Voice input unavailable: {}", e)?,
            },
            ReplCommand::Send(text) => {
                self.draft.append_transcript(text.trim());
                let text = self.draft.take();
                self.send(&text, out).await?;
            }
        }

        Ok(Flow::Continue)
    }

    async fn send<W: Write>(&mut self, text: &str, out: &mut W) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let outcome = self.coordinator.send(text).await?;
        self.flush_transcript(out)?;

        match outcome {
            SendOutcome::NeedsContext { .. } => writeln!(out, "{}", CONTEXT_HINT)?,
            SendOutcome::Ignored(IgnoreReason::Busy) => {
                writeln!(out, "Still waiting for the previous answer.")?
            }
            SendOutcome::Failed { reply: None, .. } => {
                tracing::debug!("No reply appended after model failure");
            }
            _ => {}
        }
        Ok(())
    }

    /// Run on stdin and stdout until /quit, end of input or Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
        };
        self.run_until(BufReader::new(tokio::io::stdin()), std::io::stdout(), shutdown)
            .await
    }

    /// Read commands from `input` until /quit, end of input or `shutdown`.
    ///
    /// `shutdown` is watched while waiting for a line and while a command,
    /// including a model call, is running.
    pub async fn run_until<R, W, S>(mut self, input: R, mut out: W, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.start(&mut out)?;

        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut shutdown => None,
            };
            let Some(line) = line else {
                break;
            };

            let flow = tokio::select! {
                flow = self.handle(parse_line(&line), &mut out) => flow?,
                _ = &mut shutdown => Flow::Exit,
            };
            if flow == Flow::Exit {
                break;
            }
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}
