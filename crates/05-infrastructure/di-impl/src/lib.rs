//! # 组件注册表实现
//!
//! 按能力索引单例实例, 解析时先按类型、再按名称消歧。

use di_abstractions::{ComponentInstance, ComponentRegistry};
use infrastructure_common::{CapabilityHandle, DependencyError, DependencyResult, TypeInfo};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 能力索引项
#[derive(Clone)]
struct RegistryEntry {
    /// 实例在实例集合中的位置
    instance: usize,
    /// 实例的具体类型
    concrete: TypeInfo,
    /// 能力句柄
    handle: CapabilityHandle,
}

/// 组件注册表实现
#[derive(Default)]
pub struct ComponentRegistryImpl {
    /// 能力到候选实例的索引
    index: HashMap<TypeId, Vec<RegistryEntry>>,
    /// 全部实例
    instances: Vec<Arc<ComponentInstance>>,
}

impl ComponentRegistryImpl {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 已索引的能力数量
    pub fn capability_count(&self) -> usize {
        self.index.len()
    }

    /// 指定能力的候选实例类型
    pub fn candidates(&self, capability: &TypeInfo) -> Vec<&TypeInfo> {
        self.index
            .get(&capability.id)
            .map(|entries| entries.iter().map(|e| &e.concrete).collect())
            .unwrap_or_default()
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn register(&mut self, instance: ComponentInstance) -> DependencyResult<()> {
        if self
            .instances
            .iter()
            .any(|existing| Arc::ptr_eq(&existing.target, &instance.target))
        {
            debug!("组件实例已注册, 忽略: {}", instance.type_info.path);
            return Ok(());
        }

        if instance.exposures().is_empty() {
            return Err(DependencyError::RegistrationFailed {
                type_name: instance.type_info.path.clone(),
                message: "实例未暴露任何能力".to_string(),
            });
        }

        let position = self.instances.len();
        for (capability, handle) in instance.exposures() {
            let entries = self.index.entry(capability.id).or_default();
            if entries.iter().any(|entry| entry.instance == position) {
                continue;
            }
            entries.push(RegistryEntry {
                instance: position,
                concrete: instance.type_info.clone(),
                handle: Arc::clone(handle),
            });
            debug!("能力 {} <- {}", capability.path, instance.type_info.short_name());
        }

        info!(
            "注册组件: {} ({} 个能力{})",
            instance.type_info.short_name(),
            instance.exposures().len(),
            if instance.is_proxied() { ", 代理" } else { "" }
        );
        self.instances.push(Arc::new(instance));
        Ok(())
    }

    fn resolve_handle(
        &self,
        capability: &TypeInfo,
        disambiguator: Option<&str>,
    ) -> DependencyResult<CapabilityHandle> {
        let entries = match self.index.get(&capability.id) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                return Err(DependencyError::NotFound {
                    capability: capability.path.clone(),
                })
            }
        };

        if let [only] = entries.as_slice() {
            return Ok(Arc::clone(&only.handle));
        }

        let name = disambiguator.unwrap_or_default();
        match entries.iter().find(|entry| entry.concrete.matches_name(name)) {
            Some(entry) => {
                debug!(
                    "按名称 `{}` 解析能力 {} -> {}",
                    name,
                    capability.path,
                    entry.concrete.short_name()
                );
                Ok(Arc::clone(&entry.handle))
            }
            None => Err(DependencyError::Ambiguous {
                capability: capability.path.clone(),
                disambiguator: name.to_string(),
                candidates: entries
                    .iter()
                    .map(|entry| entry.concrete.short_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    fn all_instances(&self) -> &[Arc<ComponentInstance>] {
        &self.instances
    }

    fn contains(&self, capability: &TypeInfo) -> bool {
        self.index
            .get(&capability.id)
            .is_some_and(|entries| !entries.is_empty())
    }
}
