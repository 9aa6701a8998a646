use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::file_utils::FileManager;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Where run workspaces and finished videos live
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model used for the script and the slide deck
    #[serde(default)]
    pub llm: LlmConfig,

    /// Text-to-speech service
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Headless browser slide renderer
    #[serde(default)]
    pub renderer: RendererConfig,

    /// ffmpeg based video assembler
    #[serde(default)]
    pub assembler: AssemblerConfig,

    /// Document text extraction
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Timeout and retry policy for one external collaborator
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CallPolicy {
    /// Maximum time a single attempt may take
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry a failed attempt exactly once
    #[serde(default)]
    pub retry_once: bool,

    /// Delay before the retry, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl CallPolicy {
    /// Policy with the given timeout and no retry
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            retry_once: false,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }

    /// Enable the single retry
    pub fn retrying(mut self) -> Self {
        self.retry_once = true;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::with_timeout(default_timeout_secs())
    }
}

/// Storage locations for pipeline runs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Parent directory of the per-run workspaces
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Directory holding finished videos available for download
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Keep the run workspace (audio, markup, slide images) after the run
    #[serde(default)]
    pub keep_artifacts: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            output_dir: default_output_dir(),
            keep_artifacts: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on an uploaded document, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Language model provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    // @provider: Any OpenAI-compatible chat completions API (OpenAI, Together.ai, LM Studio)
    #[default]
    OpenAI,
    // @provider: Ollama
    Ollama,
}

impl LlmProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI-compatible",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    /// Whether calls to this provider need an API key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAI)
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Language model configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,

    /// Service URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key; prefer `api_key_env` so the secret stays out of files
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Environment variable holding the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_script_max_tokens")]
    pub script_max_tokens: u32,

    #[serde(default = "default_deck_max_tokens")]
    pub deck_max_tokens: u32,

    /// System prompt for the narration script
    #[serde(default = "default_script_system_prompt")]
    pub script_system_prompt: String,

    /// System prompt for the Reveal.js slide deck
    #[serde(default = "default_deck_system_prompt")]
    pub deck_system_prompt: String,

    #[serde(default = "default_llm_policy")]
    pub policy: CallPolicy,
}

impl LlmConfig {
    /// Resolve the API key from the config value or the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: String::new(),
            api_key_env: default_llm_api_key_env(),
            temperature: default_temperature(),
            script_max_tokens: default_script_max_tokens(),
            deck_max_tokens: default_deck_max_tokens(),
            script_system_prompt: default_script_system_prompt(),
            deck_system_prompt: default_deck_system_prompt(),
            policy: default_llm_policy(),
        }
    }
}

/// Text-to-speech configuration (OpenAI-compatible `/audio/speech`)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_speech_model")]
    pub model: String,

    #[serde(default = "default_speech_voice")]
    pub voice: String,

    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_speech_api_key_env")]
    pub api_key_env: String,

    /// Longest text sent in one request; longer scripts are chunked
    #[serde(default = "default_speech_max_input_chars")]
    pub max_input_chars: usize,

    #[serde(default = "default_speech_policy")]
    pub policy: CallPolicy,
}

impl SpeechConfig {
    /// Resolve the API key from the config value or the environment
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, &self.api_key_env)
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            model: default_speech_model(),
            voice: default_speech_voice(),
            api_key: String::new(),
            api_key_env: default_speech_api_key_env(),
            max_input_chars: default_speech_max_input_chars(),
            policy: default_speech_policy(),
        }
    }
}

/// Headless browser renderer configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RendererConfig {
    /// Chromium compatible browser binary
    #[serde(default = "default_browser")]
    pub browser: String,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// How long to wait for Reveal.js to report ready
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,

    /// Time allowed for a slide transition before capture
    #[serde(default = "default_transition_delay_ms")]
    pub transition_delay_ms: u64,

    /// Applies to each browser invocation
    #[serde(default = "default_renderer_policy")]
    pub policy: CallPolicy,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            browser: default_browser(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            ready_timeout_secs: default_ready_timeout_secs(),
            transition_delay_ms: default_transition_delay_ms(),
            policy: default_renderer_policy(),
        }
    }
}

/// Video assembler configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssemblerConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,

    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    #[serde(default = "default_fps")]
    pub fps: u32,

    #[serde(default = "default_assembler_policy")]
    pub policy: CallPolicy,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            fps: default_fps(),
            policy: default_assembler_policy(),
        }
    }
}

/// Document extraction configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExtractorConfig {
    #[serde(default = "default_pdftotext")]
    pub pdftotext: String,

    #[serde(default = "default_extractor_policy")]
    pub policy: CallPolicy,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            pdftotext: default_pdftotext(),
            policy: default_extractor_policy(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn resolve_secret(value: &str, env_name: &str) -> Option<String> {
    if !value.is_empty() {
        return Some(value.to_string());
    }
    if env_name.is_empty() {
        return None;
    }
    std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
}

fn default_data_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("deckcast")
}

fn default_work_dir() -> PathBuf {
    default_data_root().join("runs")
}

fn default_output_dir() -> PathBuf {
    default_data_root().join("videos")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_script_max_tokens() -> u32 {
    1000
}

fn default_deck_max_tokens() -> u32 {
    2000
}

fn default_llm_endpoint() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".to_string()
}

fn default_llm_api_key_env() -> String {
    "DECKCAST_LLM_API_KEY".to_string()
}

fn default_llm_policy() -> CallPolicy {
    CallPolicy::with_timeout(120).retrying()
}

fn default_speech_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_speech_model() -> String {
    "tts-1".to_string()
}

fn default_speech_voice() -> String {
    "alloy".to_string()
}

fn default_speech_api_key_env() -> String {
    "DECKCAST_TTS_API_KEY".to_string()
}

fn default_speech_max_input_chars() -> usize {
    4000
}

fn default_speech_policy() -> CallPolicy {
    CallPolicy::with_timeout(180).retrying()
}

fn default_browser() -> String {
    "chromium".to_string()
}

fn default_viewport_width() -> u32 {
    1920
}

fn default_viewport_height() -> u32 {
    1080
}

fn default_ready_timeout_secs() -> u64 {
    30
}

fn default_transition_delay_ms() -> u64 {
    1000
}

fn default_renderer_policy() -> CallPolicy {
    CallPolicy::with_timeout(60)
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_fps() -> u32 {
    24
}

fn default_assembler_policy() -> CallPolicy {
    CallPolicy::with_timeout(600)
}

fn default_pdftotext() -> String {
    "pdftotext".to_string()
}

fn default_extractor_policy() -> CallPolicy {
    CallPolicy::with_timeout(60)
}

fn default_script_system_prompt() -> String {
    "You are a friendly and engaging Teaching Assistant. Respond in a conversational tone, making the \
     explanation easy to follow. Break down concepts step-by-step, use examples, and incorporate \
     questions related to the topic to keep the user engaged. Separate each logical block of the \
     explanation with a single blank line; every block will become one slide."
        .to_string()
}

fn default_deck_system_prompt() -> String {
    "You are a creative and detail-oriented presentation designer skilled in Reveal.js. Generate a \
     clean, professional, and fully functional Reveal.js HTML presentation based on the provided \
     content. Use the 'moon' theme for a stylish look. Divide the content into multiple slides using \
     `<section>` tags in Reveal.js. Each paragraph or logical block should be placed in a new \
     `<section>`. Use the first line of each logical block as the slide title, formatted as `<h1>` or \
     `<h2>`. Ensure each slide contains no more than 3-4 sentences or a single logical idea. \
     Automatically include all necessary script and link tags for Reveal.js and MathJax. Initialize \
     Reveal.js in the HTML file, ensuring the presentation is fully functional without requiring manual \
     modifications. Use MathJax to render LaTeX equations properly. For block equations, use `\\[ ... \\]`, \
     and for inline equations, use `$ ... $`. Ensure the HTML is standalone, includes all dependencies, \
     and is ready to open in any modern browser. Highlight code blocks using Highlight.js."
        .to_string()
}

impl Config {
    /// Load a configuration file, creating one with defaults if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if FileManager::file_exists(path) {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        FileManager::write_to_file(path, &config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.llm.provider.requires_api_key() && self.llm.resolve_api_key().is_none() {
            return Err(anyhow!(
                "An API key is required for the {} provider: set `llm.api_key` or the {} environment variable",
                self.llm.provider.display_name(),
                self.llm.api_key_env
            ));
        }

        if self.speech.resolve_api_key().is_none() {
            return Err(anyhow!(
                "A speech API key is required: set `speech.api_key` or the {} environment variable",
                self.speech.api_key_env
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must not be empty"));
        }

        if self.renderer.viewport_width == 0 || self.renderer.viewport_height == 0 {
            return Err(anyhow!("Renderer viewport dimensions must be positive"));
        }

        if self.renderer.ready_timeout_secs == 0 {
            return Err(anyhow!("renderer.ready_timeout_secs must be positive"));
        }

        if self.speech.max_input_chars == 0 {
            return Err(anyhow!("speech.max_input_chars must be positive"));
        }

        if self.assembler.fps == 0 {
            return Err(anyhow!("assembler.fps must be positive"));
        }

        let policies = [
            ("llm", &self.llm.policy),
            ("speech", &self.speech.policy),
            ("renderer", &self.renderer.policy),
            ("assembler", &self.assembler.policy),
            ("extractor", &self.extractor.policy),
        ];
        for (name, policy) in policies {
            if policy.timeout_secs == 0 {
                return Err(anyhow!("{}.policy.timeout_secs must be positive", name));
            }
        }

        Ok(())
    }
}
