//! 线端箭头样式
//!
//! 样式是绝对方向的：`LeftArrow` 总是指向左侧（`<`），
//! 放在起点时朝外，放在终点时朝内。

use serde::{Deserialize, Serialize};

/// 箭头样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ArrowStyle {
    #[default]
    None,
    LeftArrow,
    RightArrow,
    Bar,
    Disk,
    Circle,
    LeftSquareBracket,
    RightSquareBracket,
    LeftRoundBracket,
    RightRoundBracket,
}

impl ArrowStyle {
    /// PSTricks 箭头记号
    pub fn pst_token(&self) -> &'static str {
        match self {
            ArrowStyle::None => "",
            ArrowStyle::LeftArrow => "<",
            ArrowStyle::RightArrow => ">",
            ArrowStyle::Bar => "|",
            ArrowStyle::Disk => "*",
            ArrowStyle::Circle => "o",
            ArrowStyle::LeftSquareBracket => "[",
            ArrowStyle::RightSquareBracket => "]",
            ArrowStyle::LeftRoundBracket => "(",
            ArrowStyle::RightRoundBracket => ")",
        }
    }

    pub fn is_arrow(&self) -> bool {
        matches!(self, ArrowStyle::LeftArrow | ArrowStyle::RightArrow)
    }

    pub fn is_circle_disk(&self) -> bool {
        matches!(self, ArrowStyle::Disk | ArrowStyle::Circle)
    }

    /// 括号和竖线都按横杠绘制
    pub fn is_bar_like(&self) -> bool {
        matches!(
            self,
            ArrowStyle::Bar
                | ArrowStyle::LeftSquareBracket
                | ArrowStyle::RightSquareBracket
                | ArrowStyle::LeftRoundBracket
                | ArrowStyle::RightRoundBracket
        )
    }

    /// 箭头尖端是否朝向线段外侧
    pub fn points_outward(&self, at_start: bool) -> bool {
        match self {
            ArrowStyle::LeftArrow => at_start,
            ArrowStyle::RightArrow => !at_start,
            _ => false,
        }
    }
}

/// 线段两端的箭头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Arrows {
    pub start: ArrowStyle,
    pub end: ArrowStyle,
}

impl Arrows {
    pub fn new(start: ArrowStyle, end: ArrowStyle) -> Self {
        Self { start, end }
    }

    pub fn is_none(&self) -> bool {
        self.start == ArrowStyle::None && self.end == ArrowStyle::None
    }

    /// PSTricks 箭头参数，如 `{<->}`；两端都没有箭头时为空
    pub fn pst_code(&self) -> String {
        if self.is_none() {
            return String::new();
        }
        format!("{{{}-{}}}", self.start.pst_token(), self.end.pst_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pst_code() {
        assert_eq!(Arrows::default().pst_code(), "");
        assert_eq!(
            Arrows::new(ArrowStyle::LeftArrow, ArrowStyle::RightArrow).pst_code(),
            "{<->}"
        );
        assert_eq!(
            Arrows::new(ArrowStyle::None, ArrowStyle::Disk).pst_code(),
            "{-*}"
        );
    }

    #[test]
    fn test_orientation() {
        assert!(ArrowStyle::LeftArrow.points_outward(true));
        assert!(!ArrowStyle::LeftArrow.points_outward(false));
        assert!(ArrowStyle::RightArrow.points_outward(false));
        assert!(ArrowStyle::RightSquareBracket.is_bar_like());
    }
}
