//! 实体标识和管理
//!
//! 采用生成式ID设计，编辑会话中删除后重新加入的实体可复用ID。

use crate::geometry::Shape;
use crate::properties::Properties;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 全局实体ID生成器
static ENTITY_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 实体唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// 唯一ID
    pub id: u64,
    /// 代数
    pub generation: u32,
}

impl EntityId {
    /// 创建新的实体ID
    pub fn new() -> Self {
        Self {
            id: ENTITY_COUNTER.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    /// 空ID（无效）
    pub const NULL: EntityId = EntityId {
        id: 0,
        generation: 0,
    };

    /// 检查是否为空ID
    pub fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// 绘图实体：一个图形加上它的视觉属性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// 唯一标识符，文件中缺省时重新分配
    #[serde(default)]
    pub id: EntityId,

    /// 图形数据
    pub shape: Shape,

    /// 视觉属性
    #[serde(default)]
    pub properties: Properties,

    /// 是否可见
    #[serde(default = "visible_by_default")]
    pub visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl Entity {
    /// 创建新实体
    pub fn new(shape: Shape) -> Self {
        Self {
            id: EntityId::new(),
            shape,
            properties: Properties::default(),
            visible: true,
        }
    }

    /// 获取包围盒（含半个线宽）
    pub fn bounding_box(&self) -> crate::math::BoundingBox2 {
        self.shape
            .bounding_box()
            .inflate(self.properties.line_width / 2.0)
    }

    /// 使用指定的属性
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }
}
