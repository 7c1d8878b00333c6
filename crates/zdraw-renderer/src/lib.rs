//! ZDraw 渲染器
//!
//! 基于 tiny-skia 的 2D 光栅渲染。
//!
//! # 特点
//!
//! - **视图树**：有序视图集合，读写锁保护，遍历期间才持锁
//! - **抗锯齿**：所有填充和描边都开启抗锯齿
//! - **箭头**：开放线状图形按样式绘制两端箭头

pub mod raster;
pub mod view;

pub use raster::{render_image, RenderError};
pub use view::{RenderHints, ShapeView, ViewTree};
