//! 组件发现源
//!
//! - [`StaticDiscovery`]: 显式登记的描述符
//! - [`CatalogDiscovery`]: 按命名空间读取生成代码登记的描述符
//! - [`CompositeDiscovery`]: 按顺序合并多个发现源

use async_trait::async_trait;
use di_abstractions::ComponentDiscovery;
use infrastructure_common::{
    registered_advice_descriptors, registered_component_descriptors, AdviceDescriptor,
    ComponentDescriptor, InfrastructureError, TypeInfo,
};
use tracing::debug;

/// 显式登记的发现源
#[derive(Default, Clone)]
pub struct StaticDiscovery {
    components: Vec<ComponentDescriptor>,
    advices: Vec<AdviceDescriptor>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记组件描述符
    pub fn add_component(&mut self, descriptor: ComponentDescriptor) {
        self.components.push(descriptor);
    }

    /// 登记通知描述符
    pub fn add_advice(&mut self, descriptor: AdviceDescriptor) {
        self.advices.push(descriptor);
    }

    pub fn with_component(mut self, descriptor: ComponentDescriptor) -> Self {
        self.add_component(descriptor);
        self
    }

    pub fn with_advice(mut self, descriptor: AdviceDescriptor) -> Self {
        self.add_advice(descriptor);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.advices.is_empty()
    }
}

#[async_trait]
impl ComponentDiscovery for StaticDiscovery {
    async fn discover_managed_types(&self) -> Result<Vec<ComponentDescriptor>, InfrastructureError> {
        Ok(self.components.clone())
    }

    async fn discover_advice_types(&self) -> Result<Vec<AdviceDescriptor>, InfrastructureError> {
        Ok(self.advices.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// 描述符目录发现源
///
/// 只返回类型路径位于指定命名空间下的描述符, 命名空间为空时返回全部。
#[derive(Debug, Clone, Default)]
pub struct CatalogDiscovery {
    namespaces: Vec<String>,
}

impl CatalogDiscovery {
    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    /// 类型是否位于命名空间下
    pub fn accepts(&self, type_info: &TypeInfo) -> bool {
        self.namespaces.is_empty()
            || self.namespaces.iter().any(|namespace| {
                type_info.path == *namespace
                    || type_info
                        .path
                        .strip_prefix(namespace.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
    }
}

#[async_trait]
impl ComponentDiscovery for CatalogDiscovery {
    async fn discover_managed_types(&self) -> Result<Vec<ComponentDescriptor>, InfrastructureError> {
        let components: Vec<ComponentDescriptor> = registered_component_descriptors()
            .into_iter()
            .filter(|descriptor| self.accepts(&descriptor.type_info))
            .collect();
        debug!("目录中发现 {} 个组件 {:?}", components.len(), self.namespaces);
        Ok(components)
    }

    async fn discover_advice_types(&self) -> Result<Vec<AdviceDescriptor>, InfrastructureError> {
        let advices: Vec<AdviceDescriptor> = registered_advice_descriptors()
            .into_iter()
            .filter(|descriptor| self.accepts(&descriptor.type_info))
            .collect();
        debug!("目录中发现 {} 个通知 {:?}", advices.len(), self.namespaces);
        Ok(advices)
    }

    fn name(&self) -> &str {
        "catalog"
    }
}

/// 组合发现源
#[derive(Default)]
pub struct CompositeDiscovery {
    sources: Vec<Box<dyn ComponentDiscovery>>,
}

impl CompositeDiscovery {
    pub fn new(sources: Vec<Box<dyn ComponentDiscovery>>) -> Self {
        Self { sources }
    }

    pub fn push<D: ComponentDiscovery + 'static>(&mut self, source: D) {
        self.sources.push(Box::new(source));
    }

    pub fn push_boxed(&mut self, source: Box<dyn ComponentDiscovery>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl ComponentDiscovery for CompositeDiscovery {
    async fn discover_managed_types(&self) -> Result<Vec<ComponentDescriptor>, InfrastructureError> {
        let mut components = Vec::new();
        for source in &self.sources {
            components.extend(source.discover_managed_types().await?);
        }
        Ok(components)
    }

    async fn discover_advice_types(&self) -> Result<Vec<AdviceDescriptor>, InfrastructureError> {
        let mut advices = Vec::new();
        for source in &self.sources {
            advices.extend(source.discover_advice_types().await?);
        }
        Ok(advices)
    }

    fn name(&self) -> &str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod beans {
        pub struct StepImpl1;
    }

    #[test]
    fn test_catalog_namespace_filter() {
        let info = TypeInfo::named::<beans::StepImpl1>("app::beans::StepImpl1");

        assert!(CatalogDiscovery::default().accepts(&info));
        assert!(CatalogDiscovery::new(["app"]).accepts(&info));
        assert!(CatalogDiscovery::new(["app::beans"]).accepts(&info));
        assert!(CatalogDiscovery::new(["other", "app::beans::StepImpl1"]).accepts(&info));
        assert!(!CatalogDiscovery::new(["app::bean"]).accepts(&info));
        assert!(!CatalogDiscovery::new(["ap"]).accepts(&info));
    }
}
