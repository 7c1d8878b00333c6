//! ZDraw 图形模型
//!
//! 提供可导出为 PSTricks 代码的二维矢量图形。
//!
//! # 架构设计
//!
//! - `Entity`: 唯一标识符 + 图形 + 属性
//! - `Shape`: 几何数据（点、线、圆等），画布像素坐标
//! - `Properties`: 视觉属性（颜色、线型、填充、箭头）
//!
//! # 示例
//!
//! ```rust
//! use zdraw_core::prelude::*;
//!
//! // 创建一条线段
//! let line = Line::new(Point2::origin(), Point2::new(100.0, 50.0));
//!
//! // 计算长度
//! println!("Length: {}", line.length());
//! ```

pub mod arrow;
pub mod entity;
pub mod geometry;
pub mod math;
pub mod properties;
pub mod units;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::arrow::{ArrowStyle, Arrows};
    pub use crate::entity::{Entity, EntityId};
    pub use crate::geometry::{
        Arc, Circle, Dot, Ellipse, Line, Polyline, Rectangle, Shape, Triangle,
    };
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::properties::{Color, LineStyle, Properties};
}
