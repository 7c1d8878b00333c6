//! ZDraw 文件与导出
//!
//! 支持：
//! - `.json` 绘图文档
//! - 导出为 PSTricks 代码（`.tex`）
//! - 经 LaTeX 工具链导出为 PDF、裁剪后的 PDF 和 EPS
//! - 导出为 BMP、PNG、JPEG 位图

pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod latex;
pub mod pst;
pub mod settings;
pub mod sink;

pub use document::Document;
pub use error::{CommandError, ExportError, FileError, ToolchainError};
pub use export::{jpeg_quality, ExportCommand, OverwriteConfirm, PathResolver};
pub use format::{ExportFormat, FileFilter, FileKind};
pub use latex::LatexToolchain;
pub use pst::PstGenerator;
pub use settings::{ExportSettings, FigurePosition, LatexOptions, ToolchainConfig};
pub use sink::{ErrorCollector, ErrorSink, LogErrorSink};
