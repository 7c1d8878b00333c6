//! 形状属性定义
//!
//! 包含颜色、线型、线宽、填充和箭头等视觉属性。

use crate::arrow::Arrows;
use serde::{Deserialize, Serialize};

/// RGBA颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// 转换为 [0.0, 1.0] 范围的RGB分量
    pub fn to_rgb_f64(&self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// PSTricks 预定义的颜色名，不在预定义表中时返回 None
    pub fn latex_name(&self) -> Option<&'static str> {
        if self.a != 255 {
            return None;
        }
        match (self.r, self.g, self.b) {
            (0, 0, 0) => Some("black"),
            (255, 255, 255) => Some("white"),
            (255, 0, 0) => Some("red"),
            (0, 255, 0) => Some("green"),
            (0, 0, 255) => Some("blue"),
            (0, 255, 255) => Some("cyan"),
            (255, 0, 255) => Some("magenta"),
            (255, 255, 0) => Some("yellow"),
            (128, 128, 128) => Some("gray"),
            (191, 191, 191) => Some("lightgray"),
            (64, 64, 64) => Some("darkgray"),
            _ => None,
        }
    }

    pub const RED: Color = Color::new(255, 0, 0);
    pub const YELLOW: Color = Color::new(255, 255, 0);
    pub const GREEN: Color = Color::new(0, 255, 0);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const MAGENTA: Color = Color::new(255, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const GRAY: Color = Color::new(128, 128, 128);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// 线型
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum LineStyle {
    /// 实线
    #[default]
    Solid,
    /// 虚线（画线长度与空白长度，像素）
    Dashed { black: f64, white: f64 },
    /// 点线（点间距，像素）
    Dotted { sep: f64 },
}

impl LineStyle {
    /// 默认虚线：8.5px 画线，5px 空白
    pub const DASHED: LineStyle = LineStyle::Dashed {
        black: 8.5,
        white: 5.0,
    };

    /// 默认点线：点间距 5px
    pub const DOTTED: LineStyle = LineStyle::Dotted { sep: 5.0 };

    /// 线型的重复模式（像素），实线为空
    pub fn pattern(&self, line_width: f64) -> Vec<f64> {
        match self {
            LineStyle::Solid => vec![],
            LineStyle::Dashed { black, white } => vec![*black, *white],
            LineStyle::Dotted { sep } => vec![line_width.max(0.5), *sep],
        }
    }
}

/// 形状的视觉属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    /// 线条颜色
    pub line_color: Color,
    /// 线宽（像素）
    pub line_width: f64,
    /// 线型
    pub line_style: LineStyle,
    /// 填充颜色，None 表示不填充
    pub fill: Option<Color>,
    /// 两端箭头
    pub arrows: Arrows,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            line_color: Color::BLACK,
            line_width: 2.0,
            line_style: LineStyle::Solid,
            fill: None,
            arrows: Arrows::default(),
        }
    }
}

impl Properties {
    /// 创建带有指定线条颜色的属性
    pub fn with_color(color: Color) -> Self {
        Self {
            line_color: color,
            ..Default::default()
        }
    }

    /// 设置线宽
    pub fn set_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    /// 设置线型
    pub fn set_line_style(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }

    /// 设置填充色
    pub fn set_fill(mut self, fill: Color) -> Self {
        self.fill = Some(fill);
        self
    }

    /// 设置箭头
    pub fn set_arrows(mut self, arrows: Arrows) -> Self {
        self.arrows = arrows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latex_color_names() {
        assert_eq!(Color::BLACK.latex_name(), Some("black"));
        assert_eq!(Color::GRAY.latex_name(), Some("gray"));
        assert_eq!(Color::new(0x12, 0x34, 0x56).latex_name(), None);
        assert_eq!(Color { a: 10, ..Color::RED }.latex_name(), None);
    }

    #[test]
    fn test_line_style_pattern() {
        assert!(LineStyle::Solid.pattern(2.0).is_empty());
        assert_eq!(LineStyle::DASHED.pattern(2.0), vec![8.5, 5.0]);
        assert_eq!(LineStyle::DOTTED.pattern(2.0), vec![2.0, 5.0]);
    }
}
