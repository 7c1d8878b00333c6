//! 光栅渲染
//!
//! 将视图树绘制到内存像素缓冲区。缓冲区尺寸由绘图右上角的 x 和
//! 左下角的 y 加上固定边距得到，背景预先填充为白色。

use thiserror::Error;
use tiny_skia::Pixmap;
use zdraw_core::properties::Color;

use crate::view::{visible_bounds, RenderHints, ShapeView, ViewTree};

/// 绘图四周留出的边距（像素）
pub const MARGIN: f64 = 5.0;

/// 背景色
pub const BACKGROUND: Color = Color::WHITE;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid raster size: {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
}

/// 计算像素缓冲区尺寸（宽，高）
pub fn raster_size(tree: &ViewTree) -> (f64, f64) {
    tree.with_views(size_of)
}

fn size_of(views: &[ShapeView]) -> (f64, f64) {
    let (right, bottom) = visible_bounds(views)
        .map(|b| (b.top_right().x, b.bottom_left().y))
        .unwrap_or((0.0, 0.0));
    ((right + MARGIN).ceil(), (bottom + MARGIN).ceil())
}

/// 渲染视图树，返回的像素缓冲区归调用方所有
///
/// 尺寸计算与绘制在同一次加锁内完成。
pub fn render_image(tree: &ViewTree) -> Result<Pixmap, RenderError> {
    let hints = RenderHints::highest();
    let (pixmap, painted) = tree.with_views(|views| -> Result<(Pixmap, usize), RenderError> {
        let (width, height) = size_of(views);
        if width < 1.0 || height < 1.0 || width > u32::MAX as f64 || height > u32::MAX as f64 {
            return Err(RenderError::InvalidSize { width, height });
        }

        let mut pixmap = Pixmap::new(width as u32, height as u32)
            .ok_or(RenderError::InvalidSize { width, height })?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            BACKGROUND.r,
            BACKGROUND.g,
            BACKGROUND.b,
            BACKGROUND.a,
        ));

        for view in views {
            view.paint(&mut pixmap, hints);
        }
        Ok((pixmap, views.len()))
    })?;

    tracing::debug!(
        "Rendered {} views into {}x{} raster",
        painted,
        pixmap.width(),
        pixmap.height()
    );
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdraw_core::entity::Entity;
    use zdraw_core::geometry::{Dot, Line, Rectangle, Shape};
    use zdraw_core::math::Point2;
    use zdraw_core::properties::Properties;

    fn is_background(pixmap: &Pixmap, x: u32, y: u32) -> bool {
        let px = pixmap.pixel(x, y).expect("pixel in range");
        (px.red(), px.green(), px.blue(), px.alpha()) == (255, 255, 255, 255)
    }

    #[test]
    fn test_empty_tree_is_background_only() {
        let tree = ViewTree::new();
        let pixmap = render_image(&tree).expect("render");

        assert_eq!((pixmap.width(), pixmap.height()), (5, 5));
        for y in 0..pixmap.height() {
            for x in 0..pixmap.width() {
                assert!(is_background(&pixmap, x, y));
            }
        }
    }

    #[test]
    fn test_size_follows_extremal_points() {
        // 线宽 2 → 包围盒 (9, 9)-(30.5, 20.2)
        let rect = Rectangle::new(Point2::new(10.0, 10.0), 19.5, 9.2);
        let tree = ViewTree::from_entities([Entity::new(Shape::Rectangle(rect))]);

        let (w, h) = raster_size(&tree);
        assert_eq!((w, h), (36.0, 26.0));

        let pixmap = render_image(&tree).expect("render");
        assert_eq!((pixmap.width(), pixmap.height()), (36, 26));
    }

    #[test]
    fn test_filled_rectangle_is_painted() {
        let rect = Rectangle::new(Point2::new(10.0, 10.0), 20.0, 20.0);
        let props = Properties::with_color(Color::BLUE).set_fill(Color::RED);
        let entity = Entity::new(Shape::Rectangle(rect)).with_properties(props);
        let tree = ViewTree::from_entities([entity]);

        let pixmap = render_image(&tree).expect("render");
        let inside = pixmap.pixel(20, 20).expect("pixel");
        assert_eq!((inside.red(), inside.green(), inside.blue()), (255, 0, 0));
        assert!(is_background(&pixmap, 2, 2));
    }

    #[test]
    fn test_invisible_view_is_not_painted() {
        let mut entity = Entity::new(Shape::Dot(Dot::new(Point2::new(10.0, 10.0), 6.0)));
        entity.visible = false;
        let visible = Entity::new(Shape::Line(Line::new(
            Point2::new(0.0, 30.0),
            Point2::new(30.0, 30.0),
        )));
        let tree = ViewTree::from_entities([entity, visible]);

        let pixmap = render_image(&tree).expect("render");
        assert!(is_background(&pixmap, 10, 10));
        assert!(!is_background(&pixmap, 15, 30));
    }

    #[test]
    fn test_size_matches_tree_corners() {
        let hidden = {
            let mut entity = Entity::new(Shape::Rectangle(Rectangle::new(
                Point2::new(0.0, 0.0),
                200.0,
                200.0,
            )));
            entity.visible = false;
            entity
        };
        let line = Entity::new(Shape::Line(Line::new(
            Point2::new(3.0, 40.0),
            Point2::new(47.0, 12.0),
        )));
        let tree = ViewTree::from_entities([hidden, line]);

        let expected = (
            (tree.top_right().x + MARGIN).ceil(),
            (tree.bottom_left().y + MARGIN).ceil(),
        );
        assert_eq!(raster_size(&tree), expected);

        let pixmap = render_image(&tree).expect("render");
        assert_eq!((pixmap.width() as f64, pixmap.height() as f64), expected);
    }

    #[test]
    fn test_negative_extent_is_rejected() {
        let rect = Rectangle::new(Point2::new(-100.0, -100.0), 10.0, 10.0);
        let tree = ViewTree::from_entities([Entity::new(Shape::Rectangle(rect))]);

        assert!(matches!(
            render_image(&tree),
            Err(RenderError::InvalidSize { .. })
        ));
    }
}
