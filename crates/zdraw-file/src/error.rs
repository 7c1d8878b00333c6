//! 文件与导出错误定义

use std::path::PathBuf;
use thiserror::Error;
use zdraw_renderer::RenderError;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
}

/// LaTeX 工具链错误
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} did not produce {}\n{log}", .path.display())]
    MissingArtifact {
        stage: String,
        path: PathBuf,
        log: String,
    },

    #[error("Invalid export target: {}", .0.display())]
    InvalidTarget(PathBuf),
}

/// 单次导出中的失败，由导出命令上报给错误收集器
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Encode(String),

    #[error("Rendering error: {0}")]
    Raster(#[from] RenderError),

    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => ExportError::Io(e),
            other => ExportError::Encode(other.to_string()),
        }
    }
}

/// 导出命令的调用约定错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Export command executed before it was ready")]
    NotReady,

    #[error("Export command already executed")]
    AlreadyExecuted,
}
