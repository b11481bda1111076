//! 方法描述

use crate::metadata::TypeInfo;
use std::any::TypeId;
use std::collections::BTreeSet;

/// 方法标识: 所属组件 + 方法名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub component: TypeId,
    pub name: &'static str,
}

impl MethodKey {
    pub fn new(component: TypeId, name: &'static str) -> Self {
        Self { component, name }
    }
}

/// 方法描述符
///
/// 路径格式为 `声明类型路径.方法名`, 组件自身与每个声明该方法的能力各贡献一条路径。
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    key: MethodKey,
    component: TypeInfo,
    paths: BTreeSet<String>,
}

impl MethodDescriptor {
    pub fn new(key: MethodKey, component: &TypeInfo) -> Self {
        let mut paths = BTreeSet::new();
        paths.insert(format!("{}.{}", component.path, key.name));
        Self {
            key,
            component: component.clone(),
            paths,
        }
    }

    /// 添加声明该方法的类型
    pub fn add_declaring_type(&mut self, declaring: &TypeInfo) {
        self.paths.insert(format!("{}.{}", declaring.path, self.key.name));
    }

    pub fn key(&self) -> MethodKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    pub fn component(&self) -> &TypeInfo {
        &self.component
    }

    /// 候选路径集合
    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }
}
