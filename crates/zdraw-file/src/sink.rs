//! 错误收集
//!
//! 导出过程中的失败不会传播给调用方，而是上报到错误收集器。

use std::sync::{Mutex, PoisonError};

use crate::error::ExportError;

/// 错误上报接口，只写不读
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &ExportError);
}

/// 写入日志的错误收集器
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &ExportError) {
        tracing::error!("Export failed: {}", error);
    }
}

/// 内存错误收集器，可供界面的错误面板读取
#[derive(Debug, Default)]
pub struct ErrorCollector {
    errors: Mutex<Vec<String>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收集的错误消息
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorSink for ErrorCollector {
    fn report(&self, error: &ExportError) {
        tracing::error!("Export failed: {}", error);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}
