//! 几何图形定义
//!
//! 支持的基本图形：
//! - 点 (Dot)
//! - 线段 (Line)
//! - 矩形 (Rectangle)
//! - 圆 (Circle)
//! - 椭圆 (Ellipse)
//! - 圆弧 (Arc)
//! - 多段线 (Polyline)
//! - 三角形 (Triangle)
//!
//! 所有坐标均为画布像素坐标（Y轴向下）。角度按数学方向（屏幕上逆时针）计，单位为弧度。

use crate::math::{BoundingBox2, Point2, EPSILON};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// 图形类型枚举
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Dot(Dot),
    Line(Line),
    Rectangle(Rectangle),
    Circle(Circle),
    Ellipse(Ellipse),
    Arc(Arc),
    Polyline(Polyline),
    Triangle(Triangle),
}

impl Shape {
    /// 获取图形的包围盒
    pub fn bounding_box(&self) -> BoundingBox2 {
        match self {
            Shape::Dot(d) => d.bounding_box(),
            Shape::Line(l) => l.bounding_box(),
            Shape::Rectangle(r) => r.bounding_box(),
            Shape::Circle(c) => c.bounding_box(),
            Shape::Ellipse(e) => e.bounding_box(),
            Shape::Arc(a) => a.bounding_box(),
            Shape::Polyline(pl) => pl.bounding_box(),
            Shape::Triangle(t) => t.bounding_box(),
        }
    }

    /// 获取图形的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Dot(_) => "Dot",
            Shape::Line(_) => "Line",
            Shape::Rectangle(_) => "Rectangle",
            Shape::Circle(_) => "Circle",
            Shape::Ellipse(_) => "Ellipse",
            Shape::Arc(_) => "Arc",
            Shape::Polyline(_) => "Polyline",
            Shape::Triangle(_) => "Triangle",
        }
    }

    /// 是否可以带箭头（开放的线状图形）
    pub fn is_arrowable(&self) -> bool {
        match self {
            Shape::Line(_) | Shape::Arc(_) => true,
            Shape::Polyline(pl) => !pl.closed,
            _ => false,
        }
    }

    /// 是否是封闭图形（可填充）
    pub fn is_closed(&self) -> bool {
        match self {
            Shape::Line(_) | Shape::Arc(_) | Shape::Dot(_) => false,
            Shape::Polyline(pl) => pl.closed,
            _ => true,
        }
    }
}

/// 点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub position: Point2,
    /// 直径（像素）
    pub diameter: f64,
}

impl Dot {
    pub fn new(position: Point2, diameter: f64) -> Self {
        Self { position, diameter }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let r = self.diameter / 2.0;
        BoundingBox2::new(
            Point2::new(self.position.x - r, self.position.y - r),
            Point2::new(self.position.x + r, self.position.y + r),
        )
    }
}

/// 线段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point2,
    pub end: Point2,
}

impl Line {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.start, self.end])
    }
}

/// 轴对齐矩形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// 左上角
    pub top_left: Point2,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(top_left: Point2, width: f64, height: f64) -> Self {
        Self {
            top_left,
            width,
            height,
        }
    }

    pub fn bottom_right(&self) -> Point2 {
        Point2::new(self.top_left.x + self.width, self.top_left.y + self.height)
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points([self.top_left, self.bottom_right()])
    }
}

/// 圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Point2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.radius, self.center.y - self.radius),
            Point2::new(self.center.x + self.radius, self.center.y + self.radius),
        )
    }
}

/// 轴对齐椭圆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ellipse {
    pub center: Point2,
    /// 水平半轴
    pub rx: f64,
    /// 垂直半轴
    pub ry: f64,
}

impl Ellipse {
    pub fn new(center: Point2, rx: f64, ry: f64) -> Self {
        Self { center, rx, ry }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::new(
            Point2::new(self.center.x - self.rx, self.center.y - self.ry),
            Point2::new(self.center.x + self.rx, self.center.y + self.ry),
        )
    }
}

/// 圆弧（从 start_angle 逆时针到 end_angle）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point2,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl Arc {
    pub fn new(center: Point2, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// 扫过的角度，范围 (0, 2π]
    pub fn sweep_angle(&self) -> f64 {
        let sweep = (self.end_angle - self.start_angle).rem_euclid(TAU);
        if sweep < EPSILON {
            TAU
        } else {
            sweep
        }
    }

    /// 指定角度处的点（画布坐标，Y轴向下）
    pub fn point_at(&self, angle: f64) -> Point2 {
        Point2::new(
            self.center.x + self.radius * angle.cos(),
            self.center.y - self.radius * angle.sin(),
        )
    }

    pub fn start_point(&self) -> Point2 {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point2 {
        self.point_at(self.start_angle + self.sweep_angle())
    }

    /// 角度是否在圆弧范围内
    fn contains_angle(&self, angle: f64) -> bool {
        let offset = (angle - self.start_angle).rem_euclid(TAU);
        offset <= self.sweep_angle() + EPSILON
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::from_points([self.start_point(), self.end_point()]);
        for quadrant in [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2] {
            if self.contains_angle(quadrant) {
                bbox.expand_to_include(&self.point_at(quadrant));
            }
        }
        bbox
    }
}

/// 多段线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point2>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point2>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.points.iter().copied())
    }
}

/// 等腰三角形，顶点位于外接框上边中点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// 外接框左上角
    pub top_left: Point2,
    pub width: f64,
    pub height: f64,
}

impl Triangle {
    pub fn new(top_left: Point2, width: f64, height: f64) -> Self {
        Self {
            top_left,
            width,
            height,
        }
    }

    /// 三个顶点：顶点、右下、左下
    pub fn vertices(&self) -> [Point2; 3] {
        let bottom = self.top_left.y + self.height;
        [
            Point2::new(self.top_left.x + self.width / 2.0, self.top_left.y),
            Point2::new(self.top_left.x + self.width, bottom),
            Point2::new(self.top_left.x, bottom),
        ]
    }

    /// 底边中点
    pub fn base_middle(&self) -> Point2 {
        Point2::new(
            self.top_left.x + self.width / 2.0,
            self.top_left.y + self.height,
        )
    }

    pub fn bounding_box(&self) -> BoundingBox2 {
        BoundingBox2::from_points(self.vertices())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, points_approx_eq};

    #[test]
    fn test_arc_bounding_box() {
        // 上半圆：从 0 到 π，最高点在 y = center.y - r
        let arc = Arc::new(Point2::new(10.0, 10.0), 5.0, 0.0, PI);
        let bbox = arc.bounding_box();
        assert!(approx_eq(bbox.min.x, 5.0));
        assert!(approx_eq(bbox.max.x, 15.0));
        assert!(approx_eq(bbox.min.y, 5.0));
        assert!(approx_eq(bbox.max.y, 10.0));
    }

    #[test]
    fn test_arc_full_sweep() {
        let arc = Arc::new(Point2::origin(), 1.0, 0.5, 0.5);
        assert!(approx_eq(arc.sweep_angle(), TAU));
    }

    #[test]
    fn test_triangle_vertices() {
        let tri = Triangle::new(Point2::new(0.0, 0.0), 4.0, 3.0);
        let [apex, right, left] = tri.vertices();
        assert!(points_approx_eq(&apex, &Point2::new(2.0, 0.0)));
        assert!(points_approx_eq(&right, &Point2::new(4.0, 3.0)));
        assert!(points_approx_eq(&left, &Point2::new(0.0, 3.0)));
        assert!(points_approx_eq(&tri.base_middle(), &Point2::new(2.0, 3.0)));
    }

    #[test]
    fn test_arrowable() {
        let open = Shape::Polyline(Polyline::new(vec![Point2::origin()], false));
        let closed = Shape::Polyline(Polyline::new(vec![Point2::origin()], true));
        assert!(open.is_arrowable());
        assert!(!closed.is_arrowable());
        assert!(closed.is_closed());
        assert!(!Shape::Circle(Circle::new(Point2::origin(), 1.0)).is_arrowable());
    }
}
