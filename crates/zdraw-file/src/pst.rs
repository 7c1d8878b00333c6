//! PSTricks 代码生成
//!
//! 将视图树转换为可嵌入 LaTeX 文档的 PSTricks 代码。
//! 坐标单位为厘米：`x / ppc`，`-y / ppc`（画布 Y 轴向下，PSTricks 向上）。

use std::fmt::Write as _;

use zdraw_core::entity::Entity;
use zdraw_core::geometry::Shape;
use zdraw_core::math::Point2;
use zdraw_core::properties::{Color, LineStyle};
use zdraw_core::units::{format_length, format_number, pixels_to_cm};
use zdraw_renderer::ViewTree;

use crate::settings::{FigurePosition, LatexOptions};

/// 页面四周额外留出的空间（厘米），供 dvips 裁切页面
const PAGE_MARGIN_CM: f64 = 0.2;

/// 生成过程中登记的非预定义颜色
#[derive(Debug, Default)]
struct ColorTable {
    defined: Vec<Color>,
}

impl ColorTable {
    /// 颜色在代码中的名字；首次遇到的自定义颜色登记为 `colourN`
    fn name(&mut self, color: Color) -> String {
        if let Some(name) = color.latex_name() {
            return name.to_string();
        }
        let index = match self.defined.iter().position(|c| *c == color) {
            Some(index) => index,
            None => {
                self.defined.push(color);
                self.defined.len() - 1
            }
        };
        format!("colour{}", index)
    }

    fn definitions(&self) -> String {
        let mut out = String::new();
        for (i, color) in self.defined.iter().enumerate() {
            let [r, g, b] = color.to_rgb_f64();
            let _ = writeln!(
                out,
                "\\definecolor{{colour{}}}{{rgb}}{{{},{},{}}}",
                i,
                format_number(r),
                format_number(g),
                format_number(b)
            );
        }
        out
    }
}

/// PST 代码生成器
#[derive(Debug, Clone, Default)]
pub struct PstGenerator {
    options: LatexOptions,
}

impl PstGenerator {
    pub fn new(options: LatexOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LatexOptions {
        &self.options
    }

    fn ppc(&self) -> f64 {
        self.options.pixels_per_cm
    }

    fn coord(&self, p: &Point2) -> String {
        format!(
            "({},{})",
            format_number(p.x / self.ppc()),
            format_number(-p.y / self.ppc())
        )
    }

    fn cm(&self, pixels: f64) -> String {
        format_number(pixels_to_cm(pixels, self.ppc()))
    }

    /// `\psscalebox` 包裹的 pspicture 代码
    pub fn pst_code(&self, tree: &ViewTree) -> String {
        let bl = tree.bottom_left();
        let tr = tree.top_right();
        let mut colors = ColorTable::default();

        let body = tree.with_views(|views| {
            let mut body = String::new();
            for view in views.iter().filter(|v| v.entity().visible) {
                body.push_str(&self.entity_code(view.entity(), &mut colors));
                body.push('\n');
            }
            body
        });

        let scale = format_number(self.options.scale);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "\\psscalebox{{{} {}}} % Change this value to rescale the drawing.",
            scale, scale
        );
        out.push_str("{\n");
        let _ = writeln!(out, "\\begin{{pspicture}}{}{}", self.coord(&bl), self.coord(&tr));
        out.push_str(&colors.definitions());
        out.push_str(&body);
        out.push_str("\\end{pspicture}\n");
        out.push('}');
        out
    }

    /// 完整的绘图代码：注释、figure/center 环境、PST 代码、标题与标签
    pub fn generate(&self, tree: &ViewTree) -> String {
        let opts = &self.options;
        let mut out = String::new();

        for line in opts.comment.lines() {
            let _ = writeln!(out, "% {}", line);
        }

        let figure = opts.position.latex_token();
        if let Some(token) = figure {
            let _ = writeln!(out, "\\begin{{figure}}[{}]", token);
        }
        if opts.centered {
            out.push_str("\\begin{center}\n");
        }

        out.push_str(&self.pst_code(tree));
        out.push('\n');

        if opts.centered {
            out.push_str("\\end{center}\n");
        }
        if figure.is_some() {
            if !opts.caption.is_empty() {
                let _ = writeln!(out, "\\caption{{{}}}", opts.caption);
            }
            if !opts.label.is_empty() {
                let _ = writeln!(out, "\\label{{{}}}", opts.label);
            }
            out.push_str("\\end{figure}\n");
        }

        out.trim_end().to_string()
    }

    /// 可直接编译的完整 LaTeX 文档
    pub fn latex_document(&self, tree: &ViewTree) -> String {
        let mut out = String::new();
        out.push_str("\\documentclass{article}\n");
        out.push_str("\\pagestyle{empty}\n");
        out.push_str("\\usepackage[usenames,dvipsnames]{pstricks}\n");
        out.push_str("\\usepackage{epsfig}\n");
        out.push_str("\\usepackage{pst-grad} % For gradients\n");
        out.push_str("\\usepackage{pst-plot} % For axes\n");
        if self.options.position == FigurePosition::HereExactly {
            out.push_str("\\usepackage{float}\n");
        }
        if !self.options.packages.trim().is_empty() {
            out.push_str(self.options.packages.trim());
            out.push('\n');
        }
        out.push_str("\\begin{document}\n");
        out.push_str("\\begin{flushleft}\n");
        out.push_str(&self.generate(tree));
        out.push('\n');
        out.push_str("\\end{flushleft}\n");
        out.push_str("\\end{document}\n");
        out
    }

    /// dvips 使用的页面尺寸（厘米）
    pub fn page_size_cm(&self, tree: &ViewTree) -> (f64, f64) {
        let tr = tree.top_right();
        let bl = tree.bottom_left();
        let scale = self.options.scale;
        (
            tr.x / self.ppc() * scale + PAGE_MARGIN_CM,
            bl.y / self.ppc() * scale + PAGE_MARGIN_CM,
        )
    }

    fn params(&self, entity: &Entity, colors: &mut ColorTable) -> String {
        let props = &entity.properties;
        let mut params = vec![
            format!("linecolor={}", colors.name(props.line_color)),
            format!("linewidth={}", self.cm(props.line_width)),
        ];

        match props.line_style {
            LineStyle::Solid => {}
            LineStyle::Dashed { black, white } => {
                params.push("linestyle=dashed".to_string());
                params.push(format!(
                    "dash={} {}",
                    format_length(black, self.ppc()),
                    format_length(white, self.ppc())
                ));
            }
            LineStyle::Dotted { sep } => {
                params.push("linestyle=dotted".to_string());
                params.push(format!(
                    "dotsep={}",
                    format_length(sep, self.ppc())
                ));
            }
        }

        if let Some(fill) = props.fill {
            if entity.shape.is_closed() {
                params.push("fillstyle=solid".to_string());
                params.push(format!("fillcolor={}", colors.name(fill)));
            }
        }

        params.join(", ")
    }

    fn entity_code(&self, entity: &Entity, colors: &mut ColorTable) -> String {
        let arrows = if entity.shape.is_arrowable() {
            entity.properties.arrows.pst_code()
        } else {
            String::new()
        };

        match &entity.shape {
            Shape::Dot(dot) => format!(
                "\\psdots[linecolor={}, dotsize={}]{}",
                colors.name(entity.properties.line_color),
                self.cm(dot.diameter),
                self.coord(&dot.position)
            ),
            Shape::Line(line) => format!(
                "\\psline[{}]{}{}{}",
                self.params(entity, colors),
                arrows,
                self.coord(&line.start),
                self.coord(&line.end)
            ),
            Shape::Rectangle(rect) => {
                let br = rect.bottom_right();
                format!(
                    "\\psframe[{}]{}{}",
                    self.params(entity, colors),
                    self.coord(&Point2::new(rect.top_left.x, br.y)),
                    self.coord(&Point2::new(br.x, rect.top_left.y))
                )
            }
            Shape::Circle(circle) => format!(
                "\\pscircle[{}]{}{{{}}}",
                self.params(entity, colors),
                self.coord(&circle.center),
                self.cm(circle.radius)
            ),
            Shape::Ellipse(ellipse) => format!(
                "\\psellipse[{}]{}({},{})",
                self.params(entity, colors),
                self.coord(&ellipse.center),
                self.cm(ellipse.rx),
                self.cm(ellipse.ry)
            ),
            Shape::Arc(arc) => {
                let start = arc.start_angle.to_degrees();
                let end = start + arc.sweep_angle().to_degrees();
                format!(
                    "\\psarc[{}]{}{}{{{}}}{{{}}}{{{}}}",
                    self.params(entity, colors),
                    arrows,
                    self.coord(&arc.center),
                    self.cm(arc.radius),
                    format_number(start),
                    format_number(end)
                )
            }
            Shape::Polyline(polyline) => {
                let points: String = polyline.points.iter().map(|p| self.coord(p)).collect();
                if polyline.closed {
                    format!("\\pspolygon[{}]{}", self.params(entity, colors), points)
                } else {
                    format!("\\psline[{}]{}{}", self.params(entity, colors), arrows, points)
                }
            }
            Shape::Triangle(triangle) => format!(
                "\\pstriangle[{}]{}({},{})",
                self.params(entity, colors),
                self.coord(&triangle.base_middle()),
                self.cm(triangle.width),
                self.cm(triangle.height)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdraw_core::arrow::{ArrowStyle, Arrows};
    use zdraw_core::geometry::{Circle, Dot, Line, Polyline, Rectangle, Triangle};
    use zdraw_core::properties::Properties;

    fn tree_of(entities: Vec<Entity>) -> ViewTree {
        ViewTree::from_entities(entities)
    }

    #[test]
    fn test_line_with_arrows() {
        let line = Line::new(Point2::new(50.0, 50.0), Point2::new(150.0, 100.0));
        let props = Properties::default()
            .set_line_width(2.0)
            .set_arrows(Arrows::new(ArrowStyle::None, ArrowStyle::RightArrow));
        let tree = tree_of(vec![Entity::new(Shape::Line(line)).with_properties(props)]);

        let code = PstGenerator::default().pst_code(&tree);
        assert!(code.contains("\\psline[linecolor=black, linewidth=0.04]{->}(1,-1)(3,-2)"));
    }

    #[test]
    fn test_pspicture_bounds_and_wrapper() {
        let rect = Rectangle::new(Point2::new(0.0, 0.0), 100.0, 50.0);
        let props = Properties::default().set_line_width(0.0);
        let tree = tree_of(vec![Entity::new(Shape::Rectangle(rect)).with_properties(props)]);

        let code = PstGenerator::default().pst_code(&tree);
        let mut lines = code.lines();
        assert_eq!(
            lines.next(),
            Some("\\psscalebox{1 1} % Change this value to rescale the drawing.")
        );
        assert_eq!(lines.next(), Some("{"));
        assert_eq!(lines.next(), Some("\\begin{pspicture}(0,-1)(2,0)"));
        assert_eq!(
            lines.next(),
            Some("\\psframe[linecolor=black, linewidth=0](0,-1)(2,0)")
        );
        assert_eq!(lines.next(), Some("\\end{pspicture}"));
        assert_eq!(lines.next(), Some("}"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_custom_colors_are_defined_once() {
        let orange = Color::new(255, 128, 0);
        let props = Properties::with_color(orange).set_fill(orange);
        let circle = Circle::new(Point2::new(50.0, 50.0), 25.0);
        let tri = Triangle::new(Point2::new(0.0, 0.0), 100.0, 50.0);
        let tree = tree_of(vec![
            Entity::new(Shape::Circle(circle)).with_properties(props.clone()),
            Entity::new(Shape::Triangle(tri)).with_properties(props),
        ]);

        let code = PstGenerator::default().pst_code(&tree);
        assert_eq!(code.matches("\\definecolor").count(), 1);
        assert!(code.contains("\\definecolor{colour0}{rgb}{1,0.502,0}"));
        assert!(code.contains(
            "\\pscircle[linecolor=colour0, linewidth=0.04, fillstyle=solid, fillcolor=colour0](1,-1){0.5}"
        ));
        assert!(code.contains("\\pstriangle["));
        assert!(code.contains("](1,-1)(2,1)"));
    }

    #[test]
    fn test_line_styles() {
        let poly = Polyline::new(
            vec![Point2::new(0.0, 0.0), Point2::new(50.0, 0.0), Point2::new(50.0, 50.0)],
            true,
        );
        let props = Properties::default().set_line_style(LineStyle::DASHED);
        let tree = tree_of(vec![Entity::new(Shape::Polyline(poly)).with_properties(props)]);

        let code = PstGenerator::default().pst_code(&tree);
        assert!(code.contains(
            "\\pspolygon[linecolor=black, linewidth=0.04, linestyle=dashed, dash=0.17cm 0.1cm](0,0)(1,0)(1,-1)"
        ));
    }

    #[test]
    fn test_hidden_entities_are_skipped() {
        let mut hidden = Entity::new(Shape::Dot(Dot::new(Point2::new(10.0, 10.0), 5.0)));
        hidden.visible = false;
        let tree = tree_of(vec![hidden]);

        let code = PstGenerator::default().pst_code(&tree);
        assert!(!code.contains("\\psdots"));
    }

    #[test]
    fn test_figure_environment() {
        let options = LatexOptions {
            caption: "A drawing".to_string(),
            label: "fig:drawing".to_string(),
            comment: "first\nsecond".to_string(),
            position: FigurePosition::Top,
            centered: true,
            ..LatexOptions::default()
        };
        let generator = PstGenerator::new(options);
        let code = generator.generate(&ViewTree::new());

        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(lines[0], "% first");
        assert_eq!(lines[1], "% second");
        assert_eq!(lines[2], "\\begin{figure}[t]");
        assert_eq!(lines[3], "\\begin{center}");
        assert!(lines.contains(&"\\end{center}"));
        assert!(lines.contains(&"\\caption{A drawing}"));
        assert!(lines.contains(&"\\label{fig:drawing}"));
        assert_eq!(lines.last(), Some(&"\\end{figure}"));
    }

    #[test]
    fn test_caption_needs_figure() {
        let options = LatexOptions {
            caption: "ignored".to_string(),
            ..LatexOptions::default()
        };
        let code = PstGenerator::new(options).generate(&ViewTree::new());
        assert!(!code.contains("\\caption"));
        assert!(code.ends_with('}'));
    }

    #[test]
    fn test_latex_document_wraps_drawing() {
        let doc = PstGenerator::default().latex_document(&ViewTree::new());
        assert!(doc.starts_with("\\documentclass{article}\n"));
        assert!(doc.contains("\\usepackage[usenames,dvipsnames]{pstricks}"));
        assert!(doc.contains("\\begin{pspicture}(0,0)(0,0)"));
        assert!(doc.ends_with("\\end{document}\n"));
    }

    #[test]
    fn test_page_size() {
        let rect = Rectangle::new(Point2::new(0.0, 0.0), 100.0, 50.0);
        let props = Properties::default().set_line_width(0.0);
        let tree = tree_of(vec![Entity::new(Shape::Rectangle(rect)).with_properties(props)]);

        let (w, h) = PstGenerator::default().page_size_cm(&tree);
        assert!((w - 2.2).abs() < 1e-9);
        assert!((h - 1.2).abs() < 1e-9);
    }
}
