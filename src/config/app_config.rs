use crate::error::InitProcessError;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub file: Option<PathBuf>,
    pub skip_invalid: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = InitProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(InitProcessError::EnvVarParseError(format!(
                "CAPSULE_OUTPUT は text か json を指定してください: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

// 読み込めなかった.envは無視せずエラーにする (存在しない場合のみ許容)
fn load_env_file(result: dotenv::Result<()>) -> Result<(), InitProcessError> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(InitProcessError::EnvFileReadError(e.to_string())),
    }
}

impl AppConfig {
    // 指定した.envファイルを読み込んでから環境変数を読む
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self, InitProcessError> {
        load_env_file(dotenv::from_path(path.as_ref()))?;
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, InitProcessError> {
        // .envが無くても環境変数だけで動作させる
        load_env_file(dotenv::dotenv().map(|_| ()))?;

        let skip_invalid = match std::env::var("CAPSULE_SKIP_INVALID") {
            Ok(value) => value
                .trim()
                .parse::<bool>()
                .map_err(|e| InitProcessError::EnvVarParseError(format!("CAPSULE_SKIP_INVALID: {}", e)))?,
            Err(_) => true,
        };

        let format = match std::env::var("CAPSULE_OUTPUT") {
            Ok(value) => value.parse::<OutputFormat>()?,
            Err(_) => OutputFormat::Text,
        };

        Ok(Self {
            capture: CaptureConfig {
                file: std::env::var("CAPSULE_CAPTURE_FILE").ok().map(PathBuf::from),
                skip_invalid,
            },
            logging: LoggingConfig {
                level: std::env::var("CAPSULE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                file: std::env::var("CAPSULE_LOG_FILE").ok().map(PathBuf::from),
            },
            output: OutputConfig { format },
        })
    }

    pub fn log_level(&self) -> Result<LevelFilter, InitProcessError> {
        self.logging
            .level
            .parse::<LevelFilter>()
            .map_err(|e| InitProcessError::EnvVarParseError(format!("CAPSULE_LOG_LEVEL: {}", e)))
    }

    // コマンドライン引数で渡されたパスを優先する
    pub fn capture_file(&self, arg: Option<PathBuf>) -> Result<PathBuf, InitProcessError> {
        arg.or_else(|| self.capture.file.clone())
            .ok_or_else(|| InitProcessError::EnvVarError("CAPSULE_CAPTURE_FILE が設定されていません".to_string()))
    }

    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            capture: CaptureConfig {
                file: Some(PathBuf::from("tests/test_ethernet.pcap")),
                skip_invalid: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                file: None,
            },
            output: OutputConfig {
                format: OutputFormat::Text,
            },
        }
    }
}
