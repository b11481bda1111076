//! 类型化依赖解析

use crate::registry::ComponentRegistry;
use infrastructure_common::{downcast_capability, DependencyError, DependencyResult, TypeInfo};
use std::sync::Arc;

/// 类型化解析接口
///
/// 为所有注册表提供按 Rust 类型解析的能力, `T` 可以是具体类型或 `dyn Trait`。
pub trait ComponentResolver {
    /// 解析组件
    fn resolve<T>(&self, disambiguator: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static;

    /// 解析组件, 使用显式的能力类型信息
    fn resolve_as<T>(
        &self,
        capability: &TypeInfo,
        disambiguator: Option<&str>,
    ) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static;
}

impl<R: ComponentRegistry + ?Sized> ComponentResolver for R {
    fn resolve<T>(&self, disambiguator: Option<&str>) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_as::<T>(&TypeInfo::of::<T>(), disambiguator)
    }

    fn resolve_as<T>(
        &self,
        capability: &TypeInfo,
        disambiguator: Option<&str>,
    ) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let handle = self.resolve_handle(capability, disambiguator)?;
        downcast_capability::<T>(&handle).ok_or_else(|| DependencyError::InjectionFailed {
            type_name: capability.path.clone(),
            slot: disambiguator.unwrap_or_default().to_string(),
            message: "能力句柄类型不匹配".to_string(),
        })
    }
}
