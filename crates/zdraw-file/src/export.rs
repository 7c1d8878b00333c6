//! 导出命令
//!
//! 一次导出的完整流程：
//!
//! 1. 通过路径选择器取得目标路径，未选择则结束
//! 2. 文件名中不含扩展名时追加扩展名
//! 3. 目标已存在时请求覆盖确认，拒绝则结束
//! 4. 按格式分派到位图、PST 代码或 LaTeX 文档处理函数
//!
//! 处理函数中的失败不会传给调用方，只上报给错误收集器，调用方通过
//! [`ExportCommand::had_effect`] 得知结果。

use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::bmp::BmpEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tiny_skia::Pixmap;
use tracing::{debug, info};
use zdraw_renderer::{render_image, ViewTree};

use crate::error::{CommandError, ExportError, ToolchainError};
use crate::format::ExportFormat;
use crate::latex::LatexToolchain;
use crate::pst::PstGenerator;
use crate::settings::ExportSettings;
use crate::sink::{ErrorSink, LogErrorSink};

/// 目标路径选择器（通常是保存对话框）
pub trait PathResolver {
    /// 用户取消时返回 None
    fn resolve(&self) -> Option<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn() -> Option<PathBuf>,
{
    fn resolve(&self) -> Option<PathBuf> {
        self()
    }
}

/// 覆盖确认，只在目标文件已存在时调用
pub trait OverwriteConfirm {
    fn confirm(&self, path: &Path) -> bool;
}

impl<F> OverwriteConfirm for F
where
    F: Fn(&Path) -> bool,
{
    fn confirm(&self, path: &Path) -> bool {
        self(path)
    }
}

/// 位图编码函数：像素缓冲 + JPEG 压缩率 → 文件内容
type EncodeFn = fn(&Pixmap, u8) -> Result<Vec<u8>, ExportError>;

/// 需要代码生成器的处理函数
type GenerateFn =
    fn(&ViewTree, &PstGenerator, &LatexToolchain, &Path) -> Result<(), ExportError>;

#[derive(Clone, Copy)]
enum Handler<'a> {
    Bitmap(EncodeFn),
    Generated(GenerateFn, &'a PstGenerator),
}

/// 格式到处理函数的映射；需要生成器而未提供时返回 None
fn handler_for(format: ExportFormat, generator: Option<&PstGenerator>) -> Option<Handler<'_>> {
    let handler = match format {
        ExportFormat::BitmapBmp => Handler::Bitmap(encode_bmp),
        ExportFormat::BitmapPng => Handler::Bitmap(encode_png),
        ExportFormat::BitmapJpeg => Handler::Bitmap(encode_jpeg),
        ExportFormat::VectorMarkup => Handler::Generated(export_markup, generator?),
        ExportFormat::Document => Handler::Generated(export_pdf, generator?),
        ExportFormat::DocumentCropped => Handler::Generated(export_cropped_pdf, generator?),
        ExportFormat::DocumentFromLatex => Handler::Generated(export_eps, generator?),
    };
    Some(handler)
}

/// 已就绪命令的执行计划
struct Plan<'a> {
    tree: &'a ViewTree,
    format: ExportFormat,
    resolver: &'a dyn PathResolver,
    handler: Handler<'a>,
}

static LOG_SINK: LogErrorSink = LogErrorSink;

/// 导出命令
///
/// 借用视图树和代码生成器，只执行一次。
pub struct ExportCommand<'a> {
    format: Option<ExportFormat>,
    tree: Option<&'a ViewTree>,
    generator: Option<&'a PstGenerator>,
    resolver: Option<&'a dyn PathResolver>,
    confirm: Option<&'a dyn OverwriteConfirm>,
    sink: Option<&'a dyn ErrorSink>,
    toolchain: LatexToolchain,
    compression_rate: u8,
    exported: bool,
    executed: bool,
}

impl<'a> Default for ExportCommand<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> ExportCommand<'a> {
    pub fn new() -> Self {
        Self {
            format: None,
            tree: None,
            generator: None,
            resolver: None,
            confirm: None,
            sink: None,
            toolchain: LatexToolchain::default(),
            compression_rate: 0,
            exported: false,
            executed: false,
        }
    }

    /// 使用设置中的工具链和 JPEG 压缩率
    pub fn from_settings(settings: &ExportSettings) -> Self {
        let mut command = Self::new();
        command.set_toolchain(LatexToolchain::new(settings.toolchain.clone()));
        command.set_compression_rate(settings.jpeg_compression_rate);
        command
    }

    /// 保存引用，不做检查
    pub fn configure(
        &mut self,
        tree: &'a ViewTree,
        format: ExportFormat,
        resolver: &'a dyn PathResolver,
        generator: Option<&'a PstGenerator>,
    ) {
        self.tree = Some(tree);
        self.format = Some(format);
        self.resolver = Some(resolver);
        self.generator = generator;
    }

    /// 未设置时，已存在的目标文件不会被覆盖
    pub fn set_overwrite_confirm(&mut self, confirm: &'a dyn OverwriteConfirm) {
        self.confirm = Some(confirm);
    }

    /// 未设置时错误写入日志
    pub fn set_error_sink(&mut self, sink: &'a dyn ErrorSink) {
        self.sink = Some(sink);
    }

    pub fn set_toolchain(&mut self, toolchain: LatexToolchain) {
        self.toolchain = toolchain;
    }

    /// JPEG 压缩率，超过 100 按 100 处理
    pub fn set_compression_rate(&mut self, rate: u8) {
        self.compression_rate = rate.min(100);
    }

    pub fn compression_rate(&self) -> u8 {
        self.compression_rate
    }

    pub fn format(&self) -> Option<ExportFormat> {
        self.format
    }

    /// 视图树、格式和路径选择器都已设置，且需要时已提供代码生成器
    pub fn is_ready(&self) -> bool {
        self.plan().is_some()
    }

    /// 执行导出
    ///
    /// 未就绪时返回 [`CommandError::NotReady`]，不做任何 I/O；
    /// 第二次调用返回 [`CommandError::AlreadyExecuted`]。
    /// 导出本身的失败不在返回值中体现。
    pub fn execute(&mut self) -> Result<(), CommandError> {
        if self.executed {
            return Err(CommandError::AlreadyExecuted);
        }
        let plan = self.plan().ok_or(CommandError::NotReady)?;
        self.executed = true;
        self.exported = self.run(plan);
        Ok(())
    }

    /// 已执行且确实导出了文件
    pub fn had_effect(&self) -> bool {
        self.executed && self.exported
    }

    /// 清除全部引用，可重复调用
    pub fn release(&mut self) {
        self.tree = None;
        self.generator = None;
        self.resolver = None;
        self.confirm = None;
        self.sink = None;
    }

    fn plan(&self) -> Option<Plan<'a>> {
        let tree = self.tree?;
        let format = self.format?;
        let resolver = self.resolver?;
        let handler = handler_for(format, self.generator)?;
        Some(Plan {
            tree,
            format,
            resolver,
            handler,
        })
    }

    fn run(&self, plan: Plan<'a>) -> bool {
        let Some(selected) = plan.resolver.resolve() else {
            debug!("Export aborted: no target selected");
            return false;
        };

        let target = plan.format.target_path(&selected);
        if target.exists() && !self.confirm_overwrite(&target) {
            debug!("Export aborted: {} kept", target.display());
            return false;
        }

        let result = match plan.handler {
            Handler::Bitmap(encode) => {
                export_bitmap(plan.tree, &target, encode, self.compression_rate)
            }
            Handler::Generated(handle, generator) => {
                handle(plan.tree, generator, &self.toolchain, &target)
            }
        };

        match result {
            Ok(()) => {
                info!("Exported {} to {}", plan.format, target.display());
                true
            }
            Err(err) => {
                self.sink.unwrap_or(&LOG_SINK).report(&err);
                false
            }
        }
    }

    fn confirm_overwrite(&self, target: &Path) -> bool {
        self.confirm
            .map(|confirm| confirm.confirm(target))
            .unwrap_or(false)
    }
}

/// JPEG 压缩率（0-100）对应的编码质量（1.0-0.0）
pub fn jpeg_quality(compression_rate: u8) -> f32 {
    1.0 - f32::from(compression_rate.min(100)) / 100.0
}

/// 编码器接受的质量为 1-100
fn encoder_quality(compression_rate: u8) -> u8 {
    (jpeg_quality(compression_rate) * 100.0).round().clamp(1.0, 100.0) as u8
}

/// 渲染、编码并写出位图，像素缓冲在写文件前释放
fn export_bitmap(
    tree: &ViewTree,
    target: &Path,
    encode: EncodeFn,
    compression_rate: u8,
) -> Result<(), ExportError> {
    let bytes = {
        let pixmap = render_image(tree)?;
        encode(&pixmap, compression_rate)?
    };
    write_atomically(target, &bytes)
}

fn encode_png(pixmap: &Pixmap, _compression_rate: u8) -> Result<Vec<u8>, ExportError> {
    pixmap
        .encode_png()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

fn encode_bmp(pixmap: &Pixmap, _compression_rate: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = to_rgb8(pixmap);
    let mut bytes = Vec::new();
    BmpEncoder::new(&mut bytes).write_image(
        &rgb,
        pixmap.width(),
        pixmap.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

fn encode_jpeg(pixmap: &Pixmap, compression_rate: u8) -> Result<Vec<u8>, ExportError> {
    let rgb = to_rgb8(pixmap);
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, encoder_quality(compression_rate)).write_image(
        &rgb,
        pixmap.width(),
        pixmap.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(bytes)
}

/// 预乘 RGBA 转为 RGB
fn to_rgb8(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue()]
        })
        .collect()
}

fn export_markup(
    tree: &ViewTree,
    generator: &PstGenerator,
    _toolchain: &LatexToolchain,
    target: &Path,
) -> Result<(), ExportError> {
    let mut text = generator.generate(tree);
    text.push('\n');
    write_atomically(target, text.as_bytes())
}

fn export_pdf(
    tree: &ViewTree,
    generator: &PstGenerator,
    toolchain: &LatexToolchain,
    target: &Path,
) -> Result<(), ExportError> {
    ensure_produced(toolchain.create_pdf(tree, target, false, generator)?)
}

fn export_cropped_pdf(
    tree: &ViewTree,
    generator: &PstGenerator,
    toolchain: &LatexToolchain,
    target: &Path,
) -> Result<(), ExportError> {
    ensure_produced(toolchain.create_pdf(tree, target, true, generator)?)
}

fn export_eps(
    tree: &ViewTree,
    generator: &PstGenerator,
    toolchain: &LatexToolchain,
    target: &Path,
) -> Result<(), ExportError> {
    ensure_produced(toolchain.create_eps(tree, target, generator)?)
}

/// 文档导出成功与否只看产物是否存在
fn ensure_produced(produced: PathBuf) -> Result<(), ExportError> {
    if produced.exists() {
        Ok(())
    } else {
        Err(ToolchainError::MissingArtifact {
            stage: "copy".to_string(),
            path: produced,
            log: String::new(),
        }
        .into())
    }
}

/// 先写同目录临时文件再重命名，失败时不留下半个文件
fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}
