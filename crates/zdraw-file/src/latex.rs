//! LaTeX 工具链驱动
//!
//! 在临时工作目录中依次调用外部程序：
//!
//! 1. `latex`：`.tex` → `.dvi`
//! 2. `dvips`：`.dvi` → `.ps`
//! 3. `ps2pdf`（PDF）或 `ps2eps`（EPS）
//! 4. `pdfcrop`（仅裁剪 PDF）
//!
//! 每一步是否成功只看预期的输出文件是否存在，不解析输出也不检查退出码。
//! 临时目录在任何返回路径上都会被删除。

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use zdraw_core::units::format_number;
use zdraw_renderer::ViewTree;

use crate::error::ToolchainError;
use crate::pst::PstGenerator;
use crate::settings::ToolchainConfig;

/// 工具链生成的文档类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf { crop: bool },
    Eps,
}

/// 工具链中的一步
#[derive(Debug)]
struct Stage<'a> {
    name: &'static str,
    program: &'a str,
    args: Vec<OsString>,
    output: PathBuf,
}

/// LaTeX 工具链
#[derive(Debug, Clone, Default)]
pub struct LatexToolchain {
    config: ToolchainConfig,
}

impl LatexToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    /// 生成 PDF，可选裁剪
    pub fn create_pdf(
        &self,
        tree: &ViewTree,
        target: &Path,
        crop: bool,
        generator: &PstGenerator,
    ) -> Result<PathBuf, ToolchainError> {
        self.create_document(tree, target, DocumentKind::Pdf { crop }, generator)
    }

    /// 生成 EPS
    pub fn create_eps(
        &self,
        tree: &ViewTree,
        target: &Path,
        generator: &PstGenerator,
    ) -> Result<PathBuf, ToolchainError> {
        self.create_document(tree, target, DocumentKind::Eps, generator)
    }

    /// 运行完整工具链，成功时返回已存在的目标文件路径
    fn create_document(
        &self,
        tree: &ViewTree,
        target: &Path,
        kind: DocumentKind,
        generator: &PstGenerator,
    ) -> Result<PathBuf, ToolchainError> {
        let target = std::path::absolute(target)?;
        let name = job_name(&target)?;
        let work = tempfile::Builder::new().prefix("zdraw-").tempdir()?;
        let work_dir = work.path();
        let mut log = String::new();

        let ps = self.create_ps(tree, work_dir, &name, generator, &mut log)?;

        let artifact = match kind {
            DocumentKind::Pdf { crop } => {
                let mut args: Vec<OsString> = Vec::new();
                if self.config.embed_fonts {
                    args.push(embed_fonts_flag().into());
                }
                args.push(ps.into_os_string());
                let pdf = work_dir.join(format!("{}.pdf", name));
                args.push(pdf.clone().into_os_string());
                let pdf = self.run_stage(
                    &Stage {
                        name: "ps2pdf",
                        program: &self.config.ps2pdf,
                        args,
                        output: pdf,
                    },
                    work_dir,
                    &mut log,
                )?;

                if crop {
                    let cropped = work_dir.join(format!("{}-crop.pdf", name));
                    self.run_stage(
                        &Stage {
                            name: "pdfcrop",
                            program: &self.config.pdfcrop,
                            args: vec![pdf.into_os_string(), cropped.clone().into_os_string()],
                            output: cropped,
                        },
                        work_dir,
                        &mut log,
                    )?
                } else {
                    pdf
                }
            }
            DocumentKind::Eps => {
                let eps = work_dir.join(format!("{}.eps", name));
                self.run_stage(
                    &Stage {
                        name: "ps2eps",
                        program: &self.config.ps2eps,
                        args: vec![ps.into_os_string(), eps.clone().into_os_string()],
                        output: eps,
                    },
                    work_dir,
                    &mut log,
                )?
            }
        };

        install(&artifact, &target)?;
        if !target.exists() {
            return Err(ToolchainError::MissingArtifact {
                stage: "copy".to_string(),
                path: target,
                log,
            });
        }

        tracing::debug!("Toolchain produced {}", target.display());
        Ok(target)
    }

    /// 写出 LaTeX 文档并编译为 PostScript
    fn create_ps(
        &self,
        tree: &ViewTree,
        work_dir: &Path,
        name: &str,
        generator: &PstGenerator,
        log: &mut String,
    ) -> Result<PathBuf, ToolchainError> {
        let tex = work_dir.join(format!("{}.tex", name));
        fs::write(&tex, generator.latex_document(tree))?;

        let mut output_dir = OsString::from("--output-directory=");
        output_dir.push(work_dir.as_os_str());
        let dvi = self.run_stage(
            &Stage {
                name: "latex",
                program: &self.config.latex,
                args: vec![
                    "--interaction=nonstopmode".into(),
                    output_dir,
                    tex.into_os_string(),
                ],
                output: work_dir.join(format!("{}.dvi", name)),
            },
            work_dir,
            log,
        )?;

        let (width, height) = generator.page_size_cm(tree);
        let ps = work_dir.join(format!("{}.ps", name));
        self.run_stage(
            &Stage {
                name: "dvips",
                program: &self.config.dvips,
                args: vec![
                    "-Pdownload35".into(),
                    "-T".into(),
                    format!("{}cm,{}cm", format_number(width), format_number(height)).into(),
                    dvi.into_os_string(),
                    "-o".into(),
                    ps.clone().into_os_string(),
                ],
                output: ps,
            },
            work_dir,
            log,
        )
    }

    /// 同步运行一步，输出追加到日志；预期文件不存在时中止整条工具链
    fn run_stage(
        &self,
        stage: &Stage<'_>,
        work_dir: &Path,
        log: &mut String,
    ) -> Result<PathBuf, ToolchainError> {
        tracing::debug!("Running {}: {} {:?}", stage.name, stage.program, stage.args);

        let output = Command::new(stage.program)
            .args(&stage.args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ToolchainError::Launch {
                program: stage.program.to_string(),
                source,
            })?;

        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !stage.output.exists() {
            tracing::warn!(
                "{} did not produce {}",
                stage.name,
                stage.output.display()
            );
            return Err(ToolchainError::MissingArtifact {
                stage: stage.name.to_string(),
                path: stage.output.clone(),
                log: log.clone(),
            });
        }
        Ok(stage.output.clone())
    }
}

/// 经同目录临时文件复制到目标，已有文件要么完整保留要么整体替换
fn install(artifact: &Path, target: &Path) -> Result<(), ToolchainError> {
    let dir = target
        .parent()
        .ok_or_else(|| ToolchainError::InvalidTarget(target.to_path_buf()))?;
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    io::copy(&mut fs::File::open(artifact)?, &mut staged)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

/// ps2pdf 的字体嵌入参数，Windows 下 `=` 需写作 `#`
fn embed_fonts_flag() -> &'static str {
    if cfg!(windows) {
        "-dEmbedAllFonts#true"
    } else {
        "-dEmbedAllFonts=true"
    }
}

/// 由目标文件名得到工具链作业名，只保留安全字符
fn job_name(target: &Path) -> Result<String, ToolchainError> {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ToolchainError::InvalidTarget(target.to_path_buf()))?;

    Ok(stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_name_is_sanitised() {
        assert_eq!(job_name(Path::new("/tmp/my figure.pdf")).unwrap(), "my_figure");
        assert_eq!(job_name(Path::new("plain.eps")).unwrap(), "plain");
        assert!(matches!(
            job_name(Path::new("/")),
            Err(ToolchainError::InvalidTarget(_))
        ));
    }

    #[cfg(unix)]
    mod pipeline {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;

        const TOUCH_LAST: &str = "#!/bin/sh\nfor last; do :; done\n: > \"$last\"\n";
        const FAIL: &str = "#!/bin/sh\necho 'fatal error' >&2\nexit 1\n";

        fn script(dir: &Path, name: &str, body: &str) -> String {
            let path = dir.join(name);
            fs::write(&path, body).expect("write script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path.to_string_lossy().into_owned()
        }

        /// 模拟工具链；latex 会把工作目录记录到 `workdir.txt`
        fn fake_config(dir: &Path) -> ToolchainConfig {
            let record = dir.join("workdir.txt");
            let latex = format!(
                "#!/bin/sh\npwd > \"{}\"\nfor last; do :; done\nbase=$(basename \"$last\" .tex)\necho 'This is fake TeX'\n: > \"$base.dvi\"\n",
                record.display()
            );
            let dvips = "#!/bin/sh\nout=''\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then shift; out=\"$1\"; fi\n  shift\ndone\n: > \"$out\"\n";
            ToolchainConfig {
                latex: script(dir, "latex", &latex),
                dvips: script(dir, "dvips", dvips),
                ps2pdf: script(dir, "ps2pdf", TOUCH_LAST),
                ps2eps: script(dir, "ps2eps", TOUCH_LAST),
                pdfcrop: script(dir, "pdfcrop", TOUCH_LAST),
                embed_fonts: true,
            }
        }

        #[test]
        fn test_pdf_pipeline() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let toolchain = LatexToolchain::new(fake_config(tools.path()));
            let target = out.path().join("drawing.pdf");

            let produced = toolchain
                .create_pdf(&ViewTree::new(), &target, false, &PstGenerator::default())
                .expect("pipeline");

            assert_eq!(produced, target);
            assert!(target.exists());

            let work_dir = fs::read_to_string(tools.path().join("workdir.txt")).expect("record");
            assert!(!Path::new(work_dir.trim()).exists());
        }

        #[test]
        fn test_cropped_pdf_and_eps() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let toolchain = LatexToolchain::new(fake_config(tools.path()));
            let generator = PstGenerator::default();

            let cropped = out.path().join("cropped.pdf");
            assert!(toolchain
                .create_pdf(&ViewTree::new(), &cropped, true, &generator)
                .is_ok());
            assert!(cropped.exists());

            let eps = out.path().join("figure.eps");
            assert!(toolchain.create_eps(&ViewTree::new(), &eps, &generator).is_ok());
            assert!(eps.exists());
        }

        #[test]
        fn test_failed_compilation_stops_pipeline() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let mut config = fake_config(tools.path());
            config.latex = script(tools.path(), "broken-latex", FAIL);
            let toolchain = LatexToolchain::new(config);
            let target = out.path().join("drawing.pdf");

            let err = toolchain
                .create_pdf(&ViewTree::new(), &target, false, &PstGenerator::default())
                .unwrap_err();

            match err {
                ToolchainError::MissingArtifact { stage, log, .. } => {
                    assert_eq!(stage, "latex");
                    assert!(log.contains("fatal error"));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(!target.exists());
        }

        #[test]
        fn test_existing_target_is_replaced_whole() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let toolchain = LatexToolchain::new(fake_config(tools.path()));
            let target = out.path().join("figure.eps");
            fs::write(&target, "previous figure").expect("write");

            toolchain
                .create_eps(&ViewTree::new(), &target, &PstGenerator::default())
                .expect("pipeline");

            assert_eq!(fs::read(&target).expect("read"), Vec::<u8>::new());
            let names: Vec<_> = fs::read_dir(out.path())
                .expect("dir")
                .map(|e| e.expect("entry").file_name())
                .collect();
            assert_eq!(names, vec![std::ffi::OsString::from("figure.eps")]);
        }

        #[test]
        fn test_failed_pipeline_keeps_existing_target() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let mut config = fake_config(tools.path());
            config.ps2pdf = script(tools.path(), "lazy-ps2pdf", "#!/bin/sh\nexit 0\n");
            let toolchain = LatexToolchain::new(config);
            let target = out.path().join("drawing.pdf");
            fs::write(&target, "previous pdf").expect("write");

            assert!(toolchain
                .create_pdf(&ViewTree::new(), &target, false, &PstGenerator::default())
                .is_err());
            assert_eq!(fs::read_to_string(&target).expect("read"), "previous pdf");
        }

        #[test]
        fn test_missing_crop_output_is_failure() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let mut config = fake_config(tools.path());
            config.pdfcrop = script(tools.path(), "lazy-pdfcrop", "#!/bin/sh\nexit 0\n");
            let toolchain = LatexToolchain::new(config);
            let target = out.path().join("drawing.pdf");

            let err = toolchain
                .create_pdf(&ViewTree::new(), &target, true, &PstGenerator::default())
                .unwrap_err();

            assert!(matches!(err, ToolchainError::MissingArtifact { ref stage, .. } if stage == "pdfcrop"));
            assert!(!target.exists());
        }

        #[test]
        fn test_missing_program_is_launch_error() {
            let tools = tempfile::tempdir().expect("tempdir");
            let out = tempfile::tempdir().expect("tempdir");
            let mut config = fake_config(tools.path());
            config.latex = tools.path().join("no-such-latex").to_string_lossy().into_owned();
            let toolchain = LatexToolchain::new(config);

            let err = toolchain
                .create_eps(&ViewTree::new(), &out.path().join("x.eps"), &PstGenerator::default())
                .unwrap_err();

            assert!(matches!(err, ToolchainError::Launch { .. }));
        }
    }
}
