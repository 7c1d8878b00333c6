//! 绘图文档
//!
//! JSON 格式：`{ "metadata": {...}, "entities": [...] }`，实体按绘制顺序排列。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use zdraw_core::entity::{Entity, EntityId};
use zdraw_renderer::ViewTree;

use crate::error::FileError;

/// 当前文件格式版本
pub const FORMAT_VERSION: u32 = 1;

/// 文档元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    /// 文档唯一标识
    pub id: Uuid,

    /// 文档标题
    pub title: String,

    /// 作者
    pub author: String,

    /// 创建时间
    pub created_at: DateTime<Utc>,

    /// 最后修改时间
    pub modified_at: DateTime<Utc>,

    /// 文件格式版本
    pub format_version: u32,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: "Untitled".to_string(),
            author: String::new(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
            format_version: FORMAT_VERSION,
        }
    }
}

/// 绘图文档
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Document {
    /// 元数据
    #[serde(default)]
    pub metadata: DocumentMetadata,

    /// 所有实体，按绘制顺序
    #[serde(default)]
    entities: Vec<Entity>,

    /// 文件路径（如果已保存）
    #[serde(skip)]
    file_path: Option<PathBuf>,
}

impl Document {
    /// 创建新文档
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut document: Document = serde_json::from_str(&text)?;

        if document.metadata.format_version > FORMAT_VERSION {
            return Err(FileError::UnsupportedVersion(format!(
                "File version {} is newer than supported version {}",
                document.metadata.format_version, FORMAT_VERSION
            )));
        }

        document.file_path = Some(path.to_path_buf());
        tracing::debug!(
            "Opened {} with {} entities",
            path.display(),
            document.entities.len()
        );
        Ok(document)
    }

    /// 另存为
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), FileError> {
        let path = path.as_ref();
        self.metadata.modified_at = Utc::now();
        self.metadata.format_version = FORMAT_VERSION;

        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;

        self.file_path = Some(path.to_path_buf());
        Ok(())
    }

    /// 添加实体到末尾（最上层）
    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// 按绘制顺序遍历
    pub fn all_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// 按实体顺序构建视图树
    pub fn view_tree(&self) -> ViewTree {
        ViewTree::from_entities(self.entities.iter().cloned())
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }
}
