//! 导出格式
//!
//! 每种导出格式对应一种输出文件类型，文件类型决定扩展名和文件过滤器。
//! 文件类型到扩展名是一一对应的；PDF 与裁剪后的 PDF 共用同一种文件类型。

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 输出文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Tex,
    Pdf,
    Eps,
    Bmp,
    Png,
    Jpg,
}

impl FileKind {
    pub const ALL: [FileKind; 6] = [
        FileKind::Tex,
        FileKind::Pdf,
        FileKind::Eps,
        FileKind::Bmp,
        FileKind::Png,
        FileKind::Jpg,
    ];

    /// 规范扩展名（含点号）
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Tex => ".tex",
            FileKind::Pdf => ".pdf",
            FileKind::Eps => ".eps",
            FileKind::Bmp => ".bmp",
            FileKind::Png => ".png",
            FileKind::Jpg => ".jpg",
        }
    }

    /// 过滤器接受的全部扩展名
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            FileKind::Tex => &[".tex"],
            FileKind::Pdf => &[".pdf"],
            FileKind::Eps => &[".eps"],
            FileKind::Bmp => &[".bmp"],
            FileKind::Png => &[".png"],
            FileKind::Jpg => &[".jpg", ".jpeg"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FileKind::Tex => "LaTeX files (*.tex)",
            FileKind::Pdf => "PDF documents (*.pdf)",
            FileKind::Eps => "Encapsulated PostScript (*.eps)",
            FileKind::Bmp => "BMP images (*.bmp)",
            FileKind::Png => "PNG images (*.png)",
            FileKind::Jpg => "JPEG images (*.jpg, *.jpeg)",
        }
    }
}

/// 按文件类型过滤文件，供保存对话框使用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFilter {
    kind: FileKind,
}

impl FileFilter {
    pub fn new(kind: FileKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    /// 文件名是否以该类型的扩展名结尾（忽略大小写）
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.kind
            .accepted_extensions()
            .iter()
            .any(|ext| name.len() > ext.len() && name.ends_with(ext))
    }

    /// 接受目录（便于浏览）和匹配扩展名的文件
    pub fn accepts(&self, path: &Path) -> bool {
        if path.is_dir() {
            return true;
        }
        path.file_name()
            .map(|name| self.matches_name(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// PSTricks 代码
    VectorMarkup,
    /// 经 LaTeX 编译的 PDF
    Document,
    /// 经 LaTeX 编译的 EPS
    DocumentFromLatex,
    /// 经 LaTeX 编译并裁剪的 PDF
    DocumentCropped,
    BitmapBmp,
    BitmapPng,
    BitmapJpeg,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 7] = [
        ExportFormat::VectorMarkup,
        ExportFormat::Document,
        ExportFormat::DocumentFromLatex,
        ExportFormat::DocumentCropped,
        ExportFormat::BitmapBmp,
        ExportFormat::BitmapPng,
        ExportFormat::BitmapJpeg,
    ];

    pub fn file_kind(&self) -> FileKind {
        match self {
            ExportFormat::VectorMarkup => FileKind::Tex,
            ExportFormat::Document | ExportFormat::DocumentCropped => FileKind::Pdf,
            ExportFormat::DocumentFromLatex => FileKind::Eps,
            ExportFormat::BitmapBmp => FileKind::Bmp,
            ExportFormat::BitmapPng => FileKind::Png,
            ExportFormat::BitmapJpeg => FileKind::Jpg,
        }
    }

    pub fn extension(&self) -> &'static str {
        self.file_kind().extension()
    }

    pub fn filter(&self) -> FileFilter {
        FileFilter::new(self.file_kind())
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(
            self,
            ExportFormat::BitmapBmp | ExportFormat::BitmapPng | ExportFormat::BitmapJpeg
        )
    }

    /// 除位图外的格式都需要 PST 代码生成器
    pub fn requires_generator(&self) -> bool {
        !self.is_bitmap()
    }

    /// 命令行名称
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::VectorMarkup => "tex",
            ExportFormat::Document => "pdf",
            ExportFormat::DocumentFromLatex => "eps",
            ExportFormat::DocumentCropped => "pdf-crop",
            ExportFormat::BitmapBmp => "bmp",
            ExportFormat::BitmapPng => "png",
            ExportFormat::BitmapJpeg => "jpg",
        }
    }

    /// 目标路径：文件名中（忽略大小写）不含扩展名时追加扩展名。
    ///
    /// 这是子串检查而不是后缀检查，`plan.png.old` 不会再被追加 `.png`。
    /// 末尾的路径分隔符会被去掉，`out/drawing/` 得到 `out/drawing.png`。
    pub fn target_path(&self, path: &Path) -> PathBuf {
        let ext = self.extension();
        let Some(name) = path.file_name() else {
            let mut raw: OsString = path.as_os_str().to_owned();
            raw.push(ext);
            return PathBuf::from(raw);
        };

        let mut name = name.to_os_string();
        if !name.to_string_lossy().to_lowercase().contains(ext) {
            name.push(ext);
        }
        match path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "jpeg" => return Ok(ExportFormat::BitmapJpeg),
            "pst" => return Ok(ExportFormat::VectorMarkup),
            _ => {}
        }
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| format!("Unknown export format: {}", s))
    }
}
