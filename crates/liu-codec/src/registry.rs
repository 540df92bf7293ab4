//! 解码器注册表.
//!
//! 按模块标识管理解码器工厂. 同一模块可注册多个工厂, 先注册者优先.

use std::collections::HashMap;
use std::sync::Arc;

use liu_core::{LiuError, LiuResult};
use liu_loader::ModuleId;

use crate::decoder::DecoderFactory;

/// 解码器注册表
pub struct DecoderRegistry {
    /// 模块 → 工厂列表
    factories: HashMap<ModuleId, Vec<Arc<dyn DecoderFactory>>>,
}

impl DecoderRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// 注册一个解码器工厂
    pub fn register(&mut self, module: ModuleId, factory: Arc<dyn DecoderFactory>) {
        self.factories.entry(module).or_default().push(factory);
    }

    /// 查找模块对应的工厂
    pub fn factory(&self, module: ModuleId) -> LiuResult<Arc<dyn DecoderFactory>> {
        self.factories
            .get(&module)
            .and_then(|entries| entries.first())
            .cloned()
            .ok_or_else(|| LiuError::NoMapping(format!("模块 {module} 没有注册解码器")))
    }

    /// 获取所有已注册的 (模块, 工厂名称)
    pub fn list(&self) -> Vec<(ModuleId, &str)> {
        let mut result = Vec::new();
        for (id, entries) in &self.factories {
            for entry in entries {
                result.push((*id, entry.name()));
            }
        }
        result
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
