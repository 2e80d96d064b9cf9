//! Loading configuration from disk

use murmur::conversation::ContextWindow;
use murmur::integration::AppConfig;
use murmur::llm::PromptTemplate;
use murmur::MurmurError;
use std::io::Write;
use std::time::Duration;

#[test]
fn loads_file_and_fills_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[llm]
model = "llama3"
base_url = "http://gpu-box:11434"
timeout_secs = 0

[context]
template = "simple"
window = {{ policy = "turns", limit = 4 }}

[speech.stt]
base_url = "http://stt:8000"
language = "de"

[speech.tts]
enabled = true
language = "de"
output_dir = "/tmp/murmur-speech"
"#
    )
    .unwrap();

    let config = AppConfig::load(file.path()).unwrap();

    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.base_url, "http://gpu-box:11434");
    assert_eq!(config.llm.timeout(), None);
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.context.window, ContextWindow::Turns(4));
    assert_eq!(config.context.template, PromptTemplate::Simple);
    assert_eq!(config.speech.stt.base_url, "http://stt:8000");
    assert_eq!(config.speech.stt.model, "whisper-1");
    assert!(config.speech.tts.enabled);
    assert_eq!(
        config.speech.tts.output_dir,
        std::path::PathBuf::from("/tmp/murmur-speech")
    );
}

#[test]
fn explicit_path_wins_over_default() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[llm]\nmodel = \"phi3\"\ntimeout_secs = 30").unwrap();

    let config = AppConfig::load_or_default(Some(file.path())).unwrap();

    assert_eq!(config.llm.model, "phi3");
    assert_eq!(config.llm.timeout(), Some(Duration::from_secs(30)));
}

#[test]
fn invalid_file_names_the_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[speech.tts]\nlanguage = \"tlh\"").unwrap();

    let err = AppConfig::load(file.path()).unwrap_err();

    match err {
        MurmurError::ConfigError(msg) => {
            assert!(msg.contains(&file.path().display().to_string()), "{}", msg);
            assert!(msg.contains("tlh"), "{}", msg);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn builder_follows_context_config() {
    let config = AppConfig::from_toml(
        "[context]\ntemplate = \"concise\"\nwindow = { policy = \"unbounded\" }\n",
    )
    .unwrap();

    let builder = config.context.builder();

    assert_eq!(builder.window(), ContextWindow::Unbounded);
    assert!(builder
        .build_prompt("User: hi\nAI: hello", "and now?")
        .contains("concise"));
}
