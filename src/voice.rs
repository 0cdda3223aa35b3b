//! Speech-to-text for voice comments: ffmpeg records, whisper transcribes.

use crate::settings::Settings;
use crate::utils::find_executable;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Lifecycle of one dictation session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoicePhase {
    Idle,
    CountingDown,
    Listening,
    Completed,
    Failed,
}

impl VoicePhase {
    pub fn is_active(self) -> bool {
        matches!(self, VoicePhase::CountingDown | VoicePhase::Listening)
    }
}

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("speech recognition is not available")]
    Unavailable,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}")]
    Command { program: String, status: String },
    #[error("no-speech")]
    NoSpeech,
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Capability check; false means the button raises an alert instead of recording.
    fn is_available(&self) -> bool;

    /// One single-shot session returning the final transcript.
    async fn recognize(&self) -> Result<String, VoiceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperConfig {
    pub ffmpeg_cmd: String,
    pub ffmpeg_device: Option<String>,
    pub whisper_cmd: String,
    pub whisper_model: String,
    /// Set for whisper.cpp, which takes a model file instead of a model name
    pub whisper_model_path: Option<String>,
    pub lang: String,
    pub seconds: u64,
}

impl WhisperConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ffmpeg_cmd: settings.ffmpeg_cmd.clone(),
            ffmpeg_device: settings.ffmpeg_device.clone(),
            whisper_cmd: settings.whisper_cmd.clone(),
            whisper_model: settings.whisper_model.clone(),
            whisper_model_path: settings.whisper_model_path.clone(),
            lang: settings.voice_lang.clone(),
            seconds: settings.voice_seconds.max(1),
        }
    }

    fn is_python_whisper(&self) -> bool {
        Path::new(&self.whisper_cmd)
            .file_name()
            .and_then(OsStr::to_str)
            .map(|s| s.to_lowercase().starts_with("whisper"))
            .unwrap_or(false)
            && self.whisper_model_path.is_none()
    }
}

pub struct WhisperRecognizer {
    config: WhisperConfig,
}

impl WhisperRecognizer {
    pub fn new(config: WhisperConfig) -> Self {
        Self { config }
    }

    async fn record_wav(&self, wav_path: &Path) -> Result<(), VoiceError> {
        let mut cmd = Command::new(&self.config.ffmpeg_cmd);
        cmd.args(["-y", "-loglevel", "quiet", "-nostats"]);
        cmd.args(capture_input_args(self.config.ffmpeg_device.as_deref())?);
        cmd.args([
            "-t",
            &self.config.seconds.to_string(),
            "-ac",
            "1",
            "-ar",
            "16000",
            "-vn",
        ]);
        cmd.arg(wav_path);

        debug!(seconds = self.config.seconds, path = %wav_path.display(), "Recording");
        run_quiet(&mut cmd, &self.config.ffmpeg_cmd).await
    }

    async fn transcribe(&self, wav_path: &Path, tmp_dir: &Path) -> Result<String, VoiceError> {
        let txt_path = if self.config.is_python_whisper() {
            let mut cmd = Command::new(&self.config.whisper_cmd);
            cmd.arg(wav_path)
                .args(["--language", &self.config.lang])
                .args(["--model", &self.config.whisper_model])
                .args(["--output_format", "txt"])
                .arg("--output_dir")
                .arg(tmp_dir);
            run_quiet(&mut cmd, &self.config.whisper_cmd).await?;

            let stem = wav_path
                .file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or("audio");
            tmp_dir.join(format!("{stem}.txt"))
        } else {
            let base = tmp_dir.join("transcript");
            let mut cmd = Command::new(&self.config.whisper_cmd);
            if let Some(model) = &self.config.whisper_model_path {
                cmd.args(["-m", model]);
            }
            cmd.arg("-f")
                .arg(wav_path)
                .args(["-l", &self.config.lang, "-otxt", "-of"])
                .arg(&base);
            run_quiet(&mut cmd, &self.config.whisper_cmd).await?;
            PathBuf::from(format!("{}.txt", base.display()))
        };

        let raw = tokio::fs::read_to_string(&txt_path).await?;
        let transcript = normalize_transcript(&raw);
        if transcript.is_empty() {
            return Err(VoiceError::NoSpeech);
        }
        info!(chars = transcript.len(), "Transcription complete");
        Ok(transcript)
    }
}

#[async_trait]
impl SpeechRecognizer for WhisperRecognizer {
    fn is_available(&self) -> bool {
        find_executable(&self.config.ffmpeg_cmd).is_some()
            && find_executable(&self.config.whisper_cmd).is_some()
    }

    async fn recognize(&self) -> Result<String, VoiceError> {
        if !self.is_available() {
            return Err(VoiceError::Unavailable);
        }
        let tmp = tempfile::TempDir::new()?;
        let wav_path = tmp.path().join("audio.wav");
        self.record_wav(&wav_path).await?;
        self.transcribe(&wav_path, tmp.path()).await
    }
}

fn capture_input_args(device: Option<&str>) -> Result<Vec<String>, VoiceError> {
    let (format, default_device) = match std::env::consts::OS {
        "macos" => ("avfoundation", ":0"),
        "linux" => ("pulse", "default"),
        "windows" => ("dshow", "audio=Microphone (Default)"),
        other => {
            return Err(VoiceError::Io(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                format!("unsupported OS for audio capture: {other}"),
            )))
        }
    };
    Ok(vec![
        "-f".to_string(),
        format.to_string(),
        "-i".to_string(),
        device.unwrap_or(default_device).to_string(),
    ])
}

/// Children die with the future, so cancelling a session stops the recording.
async fn run_quiet(cmd: &mut Command, program: &str) -> Result<(), VoiceError> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(VoiceError::Command {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}

/// Whisper writes one segment per line; fold them into a single sentence.
fn normalize_transcript(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
