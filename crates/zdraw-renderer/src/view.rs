//! 形状视图与视图树
//!
//! 视图树由编辑会话和导出共享：编辑会话持写锁增删视图，
//! 绘制遍历只在遍历期间持读锁。

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tiny_skia::{FillRule, LineCap, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform};
use zdraw_core::arrow::ArrowStyle;
use zdraw_core::entity::{Entity, EntityId};
use zdraw_core::geometry::{Arc, Shape};
use zdraw_core::math::{BoundingBox2, Point2, Vector2, EPSILON};
use zdraw_core::properties::{Color, LineStyle};

/// 绘制质量提示
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderHints {
    /// 抗锯齿
    pub anti_alias: bool,
}

impl RenderHints {
    /// 最高质量
    pub const fn highest() -> Self {
        Self { anti_alias: true }
    }
}

impl Default for RenderHints {
    fn default() -> Self {
        Self::highest()
    }
}

/// 单个实体的可绘制视图
#[derive(Debug, Clone)]
pub struct ShapeView {
    entity: Entity,
}

impl ShapeView {
    pub fn new(entity: Entity) -> Self {
        Self { entity }
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    /// 视图包围盒（含线宽）
    pub fn bounds(&self) -> BoundingBox2 {
        self.entity.bounding_box()
    }

    /// 将视图绘制到像素缓冲区
    pub fn paint(&self, pixmap: &mut Pixmap, hints: RenderHints) {
        if !self.entity.visible {
            return;
        }

        let props = &self.entity.properties;
        let shape = &self.entity.shape;

        if let Shape::Dot(dot) = shape {
            if let Some(path) = PathBuilder::from_circle(
                dot.position.x as f32,
                dot.position.y as f32,
                (dot.diameter / 2.0) as f32,
            ) {
                let paint = solid_paint(props.line_color, hints);
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            return;
        }

        let Some(path) = shape_path(shape) else {
            tracing::debug!("Skipping degenerate {} view", shape.type_name());
            return;
        };

        if let Some(fill) = props.fill {
            if shape.is_closed() {
                let paint = solid_paint(fill, hints);
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }

        let stroke = stroke_for(props.line_width, props.line_style);
        let paint = solid_paint(props.line_color, hints);
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

        if shape.is_arrowable() && !props.arrows.is_none() {
            if let Some((start, end)) = line_ends(shape) {
                paint_arrow(pixmap, start, props.arrows.start, true, props.line_width, props.line_color, hints);
                paint_arrow(pixmap, end, props.arrows.end, false, props.line_width, props.line_color, hints);
            }
        }
    }
}

/// 线端：端点及指向线外的单位方向
type LineEnd = (Point2, Vector2);

fn solid_paint(color: Color, hints: RenderHints) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = hints.anti_alias;
    paint
}

fn stroke_for(line_width: f64, style: LineStyle) -> Stroke {
    let pattern: Vec<f32> = style.pattern(line_width).into_iter().map(|v| v as f32).collect();
    let mut stroke = Stroke {
        width: line_width.max(0.0) as f32,
        ..Default::default()
    };
    if matches!(style, LineStyle::Dotted { .. }) {
        stroke.line_cap = LineCap::Round;
    }
    if !pattern.is_empty() {
        stroke.dash = StrokeDash::new(pattern, 0.0);
    }
    stroke
}

/// 构建图形轮廓路径；退化图形返回 None
fn shape_path(shape: &Shape) -> Option<Path> {
    match shape {
        Shape::Dot(dot) => PathBuilder::from_circle(
            dot.position.x as f32,
            dot.position.y as f32,
            (dot.diameter / 2.0) as f32,
        ),
        Shape::Line(line) => {
            let mut pb = PathBuilder::new();
            pb.move_to(line.start.x as f32, line.start.y as f32);
            pb.line_to(line.end.x as f32, line.end.y as f32);
            pb.finish()
        }
        Shape::Rectangle(rect) => {
            let r = Rect::from_xywh(
                rect.top_left.x as f32,
                rect.top_left.y as f32,
                rect.width as f32,
                rect.height as f32,
            )?;
            Some(PathBuilder::from_rect(r))
        }
        Shape::Circle(circle) => PathBuilder::from_circle(
            circle.center.x as f32,
            circle.center.y as f32,
            circle.radius as f32,
        ),
        Shape::Ellipse(ellipse) => {
            let r = Rect::from_xywh(
                (ellipse.center.x - ellipse.rx) as f32,
                (ellipse.center.y - ellipse.ry) as f32,
                (ellipse.rx * 2.0) as f32,
                (ellipse.ry * 2.0) as f32,
            )?;
            PathBuilder::from_oval(r)
        }
        Shape::Arc(arc) => arc_path(arc),
        Shape::Polyline(polyline) => polygon_path(&polyline.points, polyline.closed),
        Shape::Triangle(triangle) => polygon_path(&triangle.vertices(), true),
    }
}

fn polygon_path(points: &[Point2], closed: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    if closed {
        pb.close();
    }
    pb.finish()
}

/// 用三次贝塞尔曲线逼近圆弧，每段不超过90度
fn arc_path(arc: &Arc) -> Option<Path> {
    if arc.radius <= EPSILON {
        return None;
    }
    let sweep = arc.sweep_angle();
    let segments = (sweep / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
    let step = sweep / segments as f64;
    let handle = 4.0 / 3.0 * (step / 4.0).tan();

    let mut pb = PathBuilder::new();
    let start = arc.start_point();
    pb.move_to(start.x as f32, start.y as f32);
    for i in 0..segments {
        let a0 = arc.start_angle + step * i as f64;
        let a1 = a0 + step;
        let p0 = arc.point_at(a0);
        let p1 = arc.point_at(a1);
        let c1 = p0 + arc_derivative(arc, a0) * handle;
        let c2 = p1 - arc_derivative(arc, a1) * handle;
        pb.cubic_to(
            c1.x as f32,
            c1.y as f32,
            c2.x as f32,
            c2.y as f32,
            p1.x as f32,
            p1.y as f32,
        );
    }
    pb.finish()
}

/// 圆弧对角度的导数（画布坐标）
fn arc_derivative(arc: &Arc, angle: f64) -> Vector2 {
    Vector2::new(-arc.radius * angle.sin(), -arc.radius * angle.cos())
}

/// 开放线状图形的两端
fn line_ends(shape: &Shape) -> Option<(LineEnd, LineEnd)> {
    match shape {
        Shape::Line(line) => {
            let dir = (line.end - line.start).try_normalize(EPSILON)?;
            Some(((line.start, -dir), (line.end, dir)))
        }
        Shape::Polyline(polyline) if !polyline.closed && polyline.points.len() >= 2 => {
            let pts = &polyline.points;
            let n = pts.len();
            let start_dir = (pts[0] - pts[1]).try_normalize(EPSILON)?;
            let end_dir = (pts[n - 1] - pts[n - 2]).try_normalize(EPSILON)?;
            Some(((pts[0], start_dir), (pts[n - 1], end_dir)))
        }
        Shape::Arc(arc) => {
            let end_angle = arc.start_angle + arc.sweep_angle();
            let start_dir = (-arc_derivative(arc, arc.start_angle)).try_normalize(EPSILON)?;
            let end_dir = arc_derivative(arc, end_angle).try_normalize(EPSILON)?;
            Some(((arc.start_point(), start_dir), (arc.end_point(), end_dir)))
        }
        _ => None,
    }
}

fn paint_arrow(
    pixmap: &mut Pixmap,
    (tip, outward): LineEnd,
    style: ArrowStyle,
    at_start: bool,
    line_width: f64,
    color: Color,
    hints: RenderHints,
) {
    let size = (line_width * 2.0).max(4.0) * 1.5;
    let perp = Vector2::new(-outward.y, outward.x);
    let paint = solid_paint(color, hints);

    if style.is_arrow() {
        // 朝外：尖端在端点；朝内：底边在端点
        let (point, base) = if style.points_outward(at_start) {
            (tip, tip - outward * size)
        } else {
            (tip - outward * size, tip)
        };
        let a = base + perp * (size / 2.0);
        let b = base - perp * (size / 2.0);
        if let Some(path) = polygon_path(&[point, a, b], true) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
    } else if style.is_circle_disk() {
        let radius = (line_width * 1.5).max(2.5);
        let center = tip + outward * radius;
        let Some(path) = PathBuilder::from_circle(center.x as f32, center.y as f32, radius as f32) else {
            return;
        };
        if style == ArrowStyle::Disk {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        } else {
            let background = solid_paint(Color::WHITE, hints);
            pixmap.fill_path(&path, &background, FillRule::Winding, Transform::identity(), None);
            let stroke = stroke_for(line_width.max(1.0) / 2.0, LineStyle::Solid);
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    } else if style.is_bar_like() {
        let half = (line_width * 2.0).max(3.0);
        if let Some(path) = polygon_path(&[tip + perp * half, tip - perp * half], false) {
            let stroke = stroke_for(line_width, LineStyle::Solid);
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

/// 有序、受读写锁保护的视图集合
#[derive(Debug, Default)]
pub struct ViewTree {
    views: RwLock<Vec<ShapeView>>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按给定顺序为实体创建视图
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            views: RwLock::new(entities.into_iter().map(ShapeView::new).collect()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<ShapeView>> {
        self.views.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ShapeView>> {
        self.views.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 在末尾添加视图
    pub fn push(&self, view: ShapeView) {
        self.write().push(view);
    }

    /// 在指定位置插入视图（越界时追加到末尾）
    pub fn insert(&self, index: usize, view: ShapeView) {
        let mut views = self.write();
        let index = index.min(views.len());
        views.insert(index, view);
    }

    /// 删除指定实体的视图
    pub fn remove(&self, id: EntityId) -> Option<ShapeView> {
        let mut views = self.write();
        let index = views.iter().position(|v| v.id() == id)?;
        Some(views.remove(index))
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// 持读锁访问全部视图；锁只在闭包执行期间持有
    pub fn with_views<R>(&self, f: impl FnOnce(&[ShapeView]) -> R) -> R {
        let views = self.read();
        f(&views)
    }

    /// 当前实体快照（按树顺序）
    pub fn entities(&self) -> Vec<Entity> {
        self.with_views(|views| views.iter().map(|v| v.entity().clone()).collect())
    }

    /// 可见视图的总包围盒
    pub fn bounds(&self) -> Option<BoundingBox2> {
        self.with_views(visible_bounds)
    }

    /// 绘图右上角（x最大，y最小）；空树返回原点
    pub fn top_right(&self) -> Point2 {
        self.bounds()
            .map(|b| b.top_right())
            .unwrap_or_else(Point2::origin)
    }

    /// 绘图左下角（x最小，y最大）；空树返回原点
    pub fn bottom_left(&self) -> Point2 {
        self.bounds()
            .map(|b| b.bottom_left())
            .unwrap_or_else(Point2::origin)
    }
}

/// 一组视图中可见部分的总包围盒，全部不可见或为空时返回 `None`
pub(crate) fn visible_bounds(views: &[ShapeView]) -> Option<BoundingBox2> {
    let bbox = views
        .iter()
        .filter(|v| v.entity().visible)
        .fold(BoundingBox2::empty(), |acc, v| acc.union(&v.bounds()));
    (!bbox.is_empty()).then_some(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdraw_core::geometry::{Circle, Line, Rectangle};
    use zdraw_core::math::points_approx_eq;
    use zdraw_core::properties::Properties;

    fn rect_entity(x: f64, y: f64, w: f64, h: f64) -> Entity {
        Entity::new(Shape::Rectangle(Rectangle::new(Point2::new(x, y), w, h)))
            .with_properties(Properties::default().set_line_width(2.0))
    }

    #[test]
    fn test_extremal_points() {
        let tree = ViewTree::from_entities([
            rect_entity(10.0, 20.0, 30.0, 40.0),
            rect_entity(50.0, 5.0, 10.0, 10.0),
        ]);

        assert!(points_approx_eq(&tree.top_right(), &Point2::new(61.0, 4.0)));
        assert!(points_approx_eq(&tree.bottom_left(), &Point2::new(9.0, 61.0)));
    }

    #[test]
    fn test_empty_tree_extremal_points() {
        let tree = ViewTree::new();
        assert!(tree.bounds().is_none());
        assert!(points_approx_eq(&tree.top_right(), &Point2::origin()));
        assert!(points_approx_eq(&tree.bottom_left(), &Point2::origin()));
    }

    #[test]
    fn test_invisible_views_do_not_count() {
        let mut hidden = rect_entity(100.0, 100.0, 10.0, 10.0);
        hidden.visible = false;
        let tree = ViewTree::from_entities([rect_entity(0.0, 0.0, 10.0, 10.0), hidden]);
        assert!(points_approx_eq(&tree.top_right(), &Point2::new(11.0, -1.0)));
    }

    #[test]
    fn test_structural_edits_keep_order() {
        let a = rect_entity(0.0, 0.0, 1.0, 1.0);
        let b = Entity::new(Shape::Circle(Circle::new(Point2::origin(), 2.0)));
        let c = Entity::new(Shape::Line(Line::new(Point2::origin(), Point2::new(1.0, 1.0))));
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);

        let tree = ViewTree::new();
        tree.push(ShapeView::new(a));
        tree.push(ShapeView::new(c));
        tree.insert(1, ShapeView::new(b));

        let ids: Vec<_> = tree.entities().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a_id, b_id, c_id]);

        assert!(tree.remove(b_id).is_some());
        assert!(tree.remove(b_id).is_none());
        assert_eq!(tree.len(), 2);

        tree.clear();
        assert!(tree.is_empty());
    }
}
