//! Line-oriented chat loop
//!
//! Reads one line at a time from any async reader and writes replies to any
//! writer, so the same loop drives the terminal and scripted tests.

use crate::integration::{Assistant, Reply, Utterance};
use crate::llm::{matches_model, KNOWN_MODELS};
use crate::{MurmurError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info, warn};

/// Question used by `/debug` when none is given
pub const DEFAULT_DEBUG_QUESTION: &str = "What's my name?";

const HELP: &str = "\
Commands:
  exit, quit          leave the chat
  /debug [question]   show the prompt that would be sent to the model
  /history            list the conversation so far
  /clear              forget the conversation
  /voice <file.wav>   ask a question by voice
  /lang [code]        show or change the spoken reply language
  /model [name]       show models or switch to another one
  /help               show this help";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Exit,
    Debug(String),
    History,
    Clear,
    Voice(PathBuf),
    Lang(Option<String>),
    Model(Option<String>),
    Help,
    /// Recognized command with missing arguments
    Usage(&'static str),
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let lowered = line.to_lowercase();
    if lowered == "exit" || lowered == "quit" {
        return Command::Exit;
    }
    if lowered == "debug" {
        return Command::Debug(DEFAULT_DEBUG_QUESTION.to_string());
    }

    let Some(command) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name.to_lowercase().as_str() {
        "exit" | "quit" => Command::Exit,
        "debug" if rest.is_empty() => Command::Debug(DEFAULT_DEBUG_QUESTION.to_string()),
        "debug" => Command::Debug(rest.to_string()),
        "history" => Command::History,
        "clear" | "reset" => Command::Clear,
        "voice" if rest.is_empty() => Command::Usage("Usage: /voice <file.wav>"),
        "voice" => Command::Voice(PathBuf::from(rest)),
        "lang" if rest.is_empty() => Command::Lang(None),
        "lang" => Command::Lang(Some(rest.to_lowercase())),
        "model" if rest.is_empty() => Command::Model(None),
        "model" => Command::Model(Some(rest.to_string())),
        "help" | "?" => Command::Help,
        _ => Command::Unknown(name.to_string()),
    }
}

/// Write one streamed fragment, opening the `AI:` line on the first
fn emit(output: &mut impl Write, started: &mut bool, fragment: &str) -> std::io::Result<()> {
    if !*started {
        write!(output, "AI: ")?;
        *started = true;
    }
    write!(output, "{}", fragment)?;
    output.flush()
}

pub struct Repl<R, W> {
    assistant: Assistant,
    lines: Lines<R>,
    output: W,
    stream: bool,
    speech_dir: PathBuf,
    replies_saved: usize,
}

impl<R, W> Repl<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    pub fn new(assistant: Assistant, input: R, output: W) -> Self {
        Self {
            assistant,
            lines: input.lines(),
            output,
            stream: false,
            speech_dir: PathBuf::from("speech"),
            replies_saved: 0,
        }
    }

    /// Print answers as they are generated
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Directory receiving `reply-<n>.mp3` files
    pub fn with_speech_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.speech_dir = dir.into();
        self
    }

    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    pub fn into_assistant(self) -> Assistant {
        self.assistant
    }

    /// Run until `exit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "\n🤖 AI Chatbot with Memory")?;
        writeln!(self.output, "Type 'exit' or 'quit' to stop.")?;
        writeln!(self.output, "Type '/debug' to see the prompt being sent to the model.")?;
        writeln!(self.output, "Type '/help' for all commands.\n")?;

        loop {
            write!(self.output, "You: ")?;
            self.output.flush()?;

            let Some(line) = self.lines.next_line().await? else {
                writeln!(self.output)?;
                break;
            };

            match parse_command(&line) {
                Command::Empty => continue,
                Command::Exit => break,
                Command::Ask(question) => self.respond(Utterance::Typed(question)).await?,
                Command::Debug(question) => self.show_prompt(&question)?,
                Command::History => self.show_history()?,
                Command::Clear => {
                    self.assistant.session_mut().reset();
                    writeln!(self.output, "Conversation history cleared.\n")?;
                }
                Command::Voice(path) => self.respond_to_recording(&path).await?,
                Command::Lang(code) => self.change_language(code.as_deref())?,
                Command::Model(name) => self.change_model(name.as_deref()).await?,
                Command::Help => writeln!(self.output, "{}\n", HELP)?,
                Command::Usage(usage) => writeln!(self.output, "{}\n", usage)?,
                Command::Unknown(name) => {
                    writeln!(self.output, "Unknown command: /{}. Type /help for commands.\n", name)?
                }
            }
        }

        writeln!(self.output, "Goodbye! 👋")?;
        self.output.flush()?;
        info!(
            session = %self.assistant.session().id(),
            turns = self.assistant.session().history().len(),
            "Chat ended"
        );
        Ok(())
    }

    async fn respond(&mut self, utterance: Utterance) -> Result<()> {
        let spoken = matches!(utterance, Utterance::Spoken(_));
        let mut started = false;
        let mut write_error: Option<std::io::Error> = None;

        let result = if self.stream {
            let output = &mut self.output;
            let mut on_token = |fragment: &str| {
                if write_error.is_none() {
                    if let Err(e) = emit(&mut *output, &mut started, fragment) {
                        write_error = Some(e);
                    }
                }
            };
            self.assistant.handle(utterance, Some(&mut on_token)).await
        } else {
            self.assistant.handle(utterance, None).await
        };

        // Whatever the session recorded stays recorded
        if let Some(e) = write_error {
            warn!("Lost output while streaming a reply: {}", e);
            return Err(e.into());
        }

        match result {
            Ok(reply) => self.show_reply(reply, spoken, started).await,
            Err(e) => {
                if started {
                    writeln!(self.output)?;
                }
                self.show_error(&e)
            }
        }
    }

    async fn show_reply(&mut self, reply: Reply, spoken: bool, streamed: bool) -> Result<()> {
        if streamed {
            writeln!(self.output)?;
        }
        if spoken {
            writeln!(self.output, "(heard: {})", reply.exchange.question)?;
        }
        if !streamed {
            writeln!(self.output, "AI: {}", reply.exchange.answer)?;
        }
        writeln!(self.output)?;

        match reply.speech {
            Some(Ok(audio)) => match self.save_speech(&audio).await {
                Ok(path) => writeln!(self.output, "(reply audio saved to {})\n", path.display())?,
                Err(e) => {
                    warn!("Could not save reply audio: {}", e);
                    writeln!(self.output, "{}\n", e.user_message())?;
                }
            },
            Some(Err(e)) => self.show_error(&MurmurError::from(e))?,
            None => {}
        }

        debug!("{}", reply.exchange.timings.summary());
        Ok(())
    }

    fn show_error(&mut self, error: &MurmurError) -> Result<()> {
        debug!("Reporting error to user: {}", error);
        writeln!(self.output, "{}\n", error.user_message())?;
        Ok(())
    }

    async fn respond_to_recording(&mut self, path: &Path) -> Result<()> {
        if !self.assistant.listens() {
            writeln!(self.output, "Speech input is not configured.\n")?;
            return Ok(());
        }

        match tokio::fs::read(path).await {
            Ok(audio) => self.respond(Utterance::Spoken(audio)).await,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                writeln!(self.output, "Could not read {}: {}\n", path.display(), e)?;
                Ok(())
            }
        }
    }

    fn show_prompt(&mut self, question: &str) -> Result<()> {
        let prompt = self.assistant.session().preview_prompt(question);
        writeln!(self.output, "=== DEBUG: Prompt being sent to model ===")?;
        writeln!(self.output, "{}", prompt)?;
        writeln!(self.output, "=== END DEBUG ===\n")?;
        Ok(())
    }

    fn show_history(&mut self) -> Result<()> {
        let history = self.assistant.session().history();
        if history.is_empty() {
            writeln!(self.output, "No conversation history yet. Start chatting!\n")?;
            return Ok(());
        }

        writeln!(self.output, "=== Conversation history ({} turns) ===", history.len())?;
        for turn in history {
            writeln!(self.output, "{}", turn.render())?;
        }
        writeln!(self.output, "=== END HISTORY ===\n")?;
        Ok(())
    }

    fn change_language(&mut self, code: Option<&str>) -> Result<()> {
        let Some(code) = code else {
            writeln!(self.output, "Speech language: {}\n", self.assistant.language())?;
            return Ok(());
        };

        match self.assistant.set_language(code) {
            Ok(name) => writeln!(self.output, "Speech language set to {}.\n", name)?,
            Err(e) => writeln!(self.output, "{}\n", e)?,
        }
        Ok(())
    }

    async fn change_model(&mut self, name: Option<&str>) -> Result<()> {
        let installed = match self.assistant.session().available_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Could not list installed models: {}", e);
                Vec::new()
            }
        };

        let Some(name) = name else {
            let current = self.assistant.session().model().unwrap_or("unknown");
            writeln!(self.output, "Model: {}", current)?;
            if !installed.is_empty() {
                writeln!(self.output, "Installed: {}", installed.join(", "))?;
            }
            writeln!(self.output, "Suggested: {}\n", KNOWN_MODELS.join(", "))?;
            return Ok(());
        };

        if !installed.is_empty() && !installed.iter().any(|m| matches_model(m, name)) {
            writeln!(
                self.output,
                "Model {} is not installed. Run `ollama pull {}` first.\n",
                name, name
            )?;
            return Ok(());
        }

        if self.assistant.session_mut().switch_model(name) {
            writeln!(self.output, "Model set to {}.\n", name)?;
        } else {
            writeln!(self.output, "This completion service cannot switch models.\n")?;
        }
        Ok(())
    }

    async fn save_speech(&mut self, audio: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.speech_dir).await?;
        self.replies_saved += 1;
        let path = self
            .speech_dir
            .join(format!("reply-{}.mp3", self.replies_saved));
        tokio::fs::write(&path, audio).await?;
        debug!("Saved {} bytes of reply audio to {}", audio.len(), path.display());
        Ok(path)
    }
}
