//! ZDraw 命令行入口
//! 读取绘图文档并导出为指定格式

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use zdraw_file::{
    Document, ExportCommand, ExportFormat, ExportSettings, OverwriteConfirm, PathResolver,
    PstGenerator,
};

#[derive(Parser, Debug)]
#[command(name = "zdraw")]
#[command(version, about = "Export a ZDraw drawing to PSTricks, PDF, EPS or a bitmap")]
struct Cli {
    /// Drawing document (JSON)
    drawing: PathBuf,

    /// Export format: tex, pdf, eps, pdf-crop, bmp, png, jpg
    #[arg(short, long)]
    format: ExportFormat,

    /// Target file; asked interactively when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite an existing target without asking
    #[arg(long)]
    force: bool,

    /// Crop the PDF to the drawing
    #[arg(long)]
    crop: bool,

    /// JPEG compression rate, 0 keeps the best quality
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: Option<u8>,

    /// Export settings (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn export_format(&self) -> ExportFormat {
        match self.format {
            ExportFormat::Document if self.crop => ExportFormat::DocumentCropped,
            format => format,
        }
    }
}

/// 命令行参数给出的路径，没有时交互输入
struct CliTarget {
    output: Option<PathBuf>,
}

impl PathResolver for CliTarget {
    fn resolve(&self) -> Option<PathBuf> {
        if let Some(path) = &self.output {
            return Some(path.clone());
        }
        let answer: String = dialoguer::Input::new()
            .with_prompt("Export to")
            .allow_empty(true)
            .interact_text()
            .ok()?;
        let answer = answer.trim();
        (!answer.is_empty()).then(|| PathBuf::from(answer))
    }
}

/// `--force` 或交互确认
struct CliConfirm {
    force: bool,
}

impl OverwriteConfirm for CliConfirm {
    fn confirm(&self, path: &Path) -> bool {
        if self.force {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", path.display()))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let settings = match &cli.config {
        Some(path) => ExportSettings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => ExportSettings::default(),
    };

    let document = Document::open(&cli.drawing)
        .with_context(|| format!("Failed to open {}", cli.drawing.display()))?;
    let tree = document.view_tree();
    let generator = PstGenerator::new(settings.latex.clone());
    let format = cli.export_format();
    info!(
        "Exporting {} shapes from {} as {}",
        document.entity_count(),
        cli.drawing.display(),
        format
    );

    let resolver = CliTarget {
        output: cli.output.clone(),
    };
    let confirm = CliConfirm { force: cli.force };

    let mut command = ExportCommand::from_settings(&settings);
    if let Some(rate) = cli.quality {
        command.set_compression_rate(rate);
    }
    command.configure(&tree, format, &resolver, Some(&generator));
    command.set_overwrite_confirm(&confirm);
    command.execute()?;

    let exported = command.had_effect();
    command.release();
    Ok(exported)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // 初始化日志
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(cli.verbose))
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
