//! 导出设置
//!
//! 可从 JSON 文件加载，缺省字段使用默认值。

use serde::{Deserialize, Serialize};
use std::path::Path;
use zdraw_core::units::DEFAULT_PPC;

use crate::error::FileError;

/// 图形环境的位置参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FigurePosition {
    /// 不放入 figure 环境
    #[default]
    None,
    /// `[h]`
    Here,
    /// `[H]`，需要 float 宏包
    HereExactly,
    /// `[t]`
    Top,
    /// `[b]`
    Bottom,
    /// `[p]`
    Page,
}

impl FigurePosition {
    /// figure 环境的位置参数；None 时不生成 figure 环境
    pub fn latex_token(&self) -> Option<&'static str> {
        match self {
            FigurePosition::None => None,
            FigurePosition::Here => Some("h"),
            FigurePosition::HereExactly => Some("H"),
            FigurePosition::Top => Some("t"),
            FigurePosition::Bottom => Some("b"),
            FigurePosition::Page => Some("p"),
        }
    }
}

/// PST/LaTeX 代码生成选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexOptions {
    /// 每厘米像素数
    pub pixels_per_cm: f64,
    /// `\psscalebox` 缩放比例
    pub scale: f64,
    pub caption: String,
    pub label: String,
    /// 写在代码开头的注释，每行加 `%`
    pub comment: String,
    pub position: FigurePosition,
    /// 是否放入 center 环境
    pub centered: bool,
    /// 额外的导言区代码
    pub packages: String,
}

impl Default for LatexOptions {
    fn default() -> Self {
        Self {
            pixels_per_cm: DEFAULT_PPC,
            scale: 1.0,
            caption: String::new(),
            label: String::new(),
            comment: String::new(),
            position: FigurePosition::None,
            centered: false,
            packages: String::new(),
        }
    }
}

/// 外部工具链程序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub latex: String,
    pub dvips: String,
    pub ps2pdf: String,
    pub ps2eps: String,
    pub pdfcrop: String,
    /// 生成 PDF 时嵌入全部字体
    pub embed_fonts: bool,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            latex: "latex".to_string(),
            dvips: "dvips".to_string(),
            ps2pdf: "ps2pdf".to_string(),
            ps2eps: "ps2eps".to_string(),
            pdfcrop: "pdfcrop".to_string(),
            embed_fonts: true,
        }
    }
}

/// 导出设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub toolchain: ToolchainConfig,
    pub latex: LatexOptions,
    /// JPEG 压缩率（0-100，0 表示最高质量）
    pub jpeg_compression_rate: u8,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            toolchain: ToolchainConfig::default(),
            latex: LatexOptions::default(),
            jpeg_compression_rate: 0,
        }
    }
}

impl ExportSettings {
    /// 从 JSON 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let settings: ExportSettings = serde_json::from_str(&text)?;
        if settings.jpeg_compression_rate > 100 {
            return Err(FileError::InvalidFormat(format!(
                "jpeg_compression_rate must be within 0..=100, got {}",
                settings.jpeg_compression_rate
            )));
        }
        if settings.latex.pixels_per_cm <= 0.0 {
            return Err(FileError::InvalidFormat(
                "pixels_per_cm must be positive".to_string(),
            ));
        }
        Ok(settings)
    }
}
