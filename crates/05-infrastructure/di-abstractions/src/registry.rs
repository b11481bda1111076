//! 组件注册表抽象接口

use infrastructure_common::{
    CapabilityHandle, ComponentHandle, DependencyResult, DependencySlot, TypeInfo,
};
use std::fmt;
use std::sync::Arc;

/// 组件实例记录
///
/// 保存单例实例本身以及它在注册表中暴露的全部能力句柄。
/// 被代理的能力句柄指向代理对象, 自身类型句柄始终指向原始实例。
#[derive(Clone)]
pub struct ComponentInstance {
    /// 组件类型信息
    pub type_info: TypeInfo,
    /// 原始实例
    pub target: ComponentHandle,
    /// 依赖字段
    pub slots: Vec<DependencySlot>,
    exposures: Vec<(TypeInfo, CapabilityHandle)>,
    proxied: bool,
}

impl ComponentInstance {
    pub fn new(type_info: TypeInfo, target: ComponentHandle, slots: Vec<DependencySlot>) -> Self {
        Self {
            type_info,
            target,
            slots,
            exposures: Vec::new(),
            proxied: false,
        }
    }

    /// 添加暴露的能力
    pub fn expose(mut self, capability: TypeInfo, handle: CapabilityHandle) -> Self {
        self.exposures.push((capability, handle));
        self
    }

    /// 标记为代理实例
    pub fn proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// 暴露的能力列表
    pub fn exposures(&self) -> &[(TypeInfo, CapabilityHandle)] {
        &self.exposures
    }

    /// 是否包含代理能力
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exposures: Vec<&str> = self.exposures.iter().map(|(c, _)| c.path.as_str()).collect();
        f.debug_struct("ComponentInstance")
            .field("type_info", &self.type_info.path)
            .field("exposures", &exposures)
            .field("slots", &self.slots)
            .field("proxied", &self.proxied)
            .finish()
    }
}

/// 组件注册表 trait
///
/// 按能力索引单例实例。装配完成后注册表只读, 可被多个调用方并发查询。
pub trait ComponentRegistry: Send + Sync {
    /// 注册组件实例
    ///
    /// 实例出现在自身类型与每个暴露的能力之下; 同一实例重复注册不会增加实例集合。
    fn register(&mut self, instance: ComponentInstance) -> DependencyResult<()>;

    /// 按能力解析唯一实例
    ///
    /// 只有一个候选时忽略 `disambiguator`; 多个候选时按简短类型名称（忽略大小写）匹配。
    fn resolve_handle(
        &self,
        capability: &TypeInfo,
        disambiguator: Option<&str>,
    ) -> DependencyResult<CapabilityHandle>;

    /// 所有已注册实例
    fn all_instances(&self) -> &[Arc<ComponentInstance>];

    /// 能力是否至少有一个实例
    fn contains(&self, capability: &TypeInfo) -> bool;

    /// 实例数量
    fn len(&self) -> usize {
        self.all_instances().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
