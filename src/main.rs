use anyhow::{bail, Context, Result};
use clap::Parser;
use murmur::conversation::ContextWindow;
use murmur::integration::{AppConfig, Assistant, ChatSession};
use murmur::llm::{OllamaClient, PromptTemplate, TextCompletionService};
use murmur::speech::{HttpSynthesizer, HttpTranscriber, SpeechToText, SttBackend, TextToSpeech};
use murmur::ui::Repl;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chat with a local model that remembers the conversation
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about)]
struct Cli {
    /// Configuration file (default: <config dir>/murmur/config.toml)
    #[arg(short = 'c', long, env = "MURMUR_CONFIG")]
    config: Option<PathBuf>,

    /// Ollama model name
    #[arg(short = 'm', long, env = "MURMUR_MODEL")]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long, env = "MURMUR_URL")]
    url: Option<String>,

    /// Render at most this many recent turns
    #[arg(long, env = "MURMUR_WINDOW_TURNS", conflicts_with = "window_chars")]
    window_turns: Option<usize>,

    /// Render at most this many characters of recent history
    #[arg(long, env = "MURMUR_WINDOW_CHARS")]
    window_chars: Option<usize>,

    /// Prompt template: memory, simple or concise
    #[arg(long, env = "MURMUR_TEMPLATE")]
    template: Option<String>,

    /// Seconds to wait for an answer (0 waits forever)
    #[arg(long, env = "MURMUR_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Print answers as they are generated
    #[arg(long, env = "MURMUR_STREAM")]
    stream: bool,

    /// Synthesize every answer to an audio file
    #[arg(long, env = "MURMUR_SPEAK")]
    speak: bool,

    /// Language of spoken answers
    #[arg(long, env = "MURMUR_LANG")]
    lang: Option<String>,

    /// Directory receiving reply audio
    #[arg(long, env = "MURMUR_SPEECH_DIR")]
    speech_dir: Option<PathBuf>,

    /// OpenAI-compatible transcription server URL
    #[arg(long, env = "MURMUR_STT_URL")]
    stt_url: Option<String>,

    /// Transcribe with a local Whisper model instead of a server
    #[cfg(feature = "whisper")]
    #[arg(long, env = "MURMUR_WHISPER_MODEL")]
    whisper_model: Option<PathBuf>,
}

impl Cli {
    /// Command-line values take priority over the configuration file
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(url) = &self.url {
            config.llm.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.llm.timeout_secs = secs;
        }
        if self.stream {
            config.llm.stream = true;
        }

        if let Some(n) = self.window_turns {
            config.context.window = ContextWindow::Turns(n);
        }
        if let Some(n) = self.window_chars {
            config.context.window = ContextWindow::Chars(n);
        }
        if let Some(name) = &self.template {
            config.context.template = match PromptTemplate::from_name(name) {
                Some(template) => template,
                None => bail!("Unknown template '{}' (expected memory, simple or concise)", name),
            };
        }

        if self.speak {
            config.speech.tts.enabled = true;
        }
        if let Some(lang) = &self.lang {
            config.speech.tts.language = lang.to_lowercase();
        }
        if let Some(dir) = &self.speech_dir {
            config.speech.tts.output_dir = dir.clone();
        }
        if let Some(url) = &self.stt_url {
            config.speech.stt.base_url = url.clone();
            config.speech.stt.backend = SttBackend::Http;
        }

        #[cfg(feature = "whisper")]
        if let Some(path) = &self.whisper_model {
            config.speech.whisper.model_path = path.clone();
            config.speech.stt.backend = SttBackend::Whisper;
        }

        config.validate()?;
        Ok(())
    }
}

fn speech_input(config: &AppConfig) -> Result<Arc<dyn SpeechToText>> {
    match config.speech.stt.backend {
        SttBackend::Http => {
            info!("Speech input via {}", config.speech.stt.base_url);
            Ok(Arc::new(HttpTranscriber::new(config.speech.stt.clone())?))
        }
        #[cfg(feature = "whisper")]
        SttBackend::Whisper => {
            let whisper = murmur::speech::WhisperTranscriber::new(config.speech.whisper.clone())?;
            Ok(Arc::new(whisper))
        }
        #[cfg(not(feature = "whisper"))]
        SttBackend::Whisper => bail!("Whisper transcription requires the whisper feature"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the chat on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config)?;

    info!("Starting Murmur chat assistant");

    let ollama = OllamaClient::new(config.llm.clone())?;
    match ollama.has_model().await {
        Ok(true) => {}
        Ok(false) => warn!(
            "Model '{}' is not installed; run `ollama pull {}`",
            config.llm.model, config.llm.model
        ),
        Err(e) => warn!("Could not list Ollama models: {}", e),
    }
    let completion: Arc<dyn TextCompletionService> = Arc::new(ollama);

    let session = ChatSession::new(completion, config.context.builder())
        .with_timeout(config.llm.timeout());

    let mut assistant = Assistant::new(session).with_speech_input(speech_input(&config)?);
    if config.speech.tts.enabled {
        let tts: Arc<dyn TextToSpeech> =
            Arc::new(HttpSynthesizer::new(config.speech.tts.clone())?);
        assistant = assistant.with_speech_output(tts, &config.speech.tts.language);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut repl = Repl::new(assistant, stdin, std::io::stdout())
        .with_streaming(config.llm.stream)
        .with_speech_dir(config.speech.tts.output_dir.clone());

    repl.run().await?;

    Ok(())
}
