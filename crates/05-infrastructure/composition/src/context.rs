//! 应用上下文
//!
//! 装配流程严格按顺序执行: 收集描述符 → 计算通知绑定 → 实例化（代理或普通） → 字段注入。
//! 任一阶段失败都会终止装配, 不会产生部分可用的上下文。

use crate::builder::ContextBuilder;
use crate::config::ContextConfig;
use aop_impl::{InterceptorIndex, InterceptorPolicy, MethodDispatcher};
use chrono::{DateTime, Utc};
use di_abstractions::{ComponentDiscovery, ComponentInstance, ComponentRegistry, ComponentResolver};
use di_impl::ComponentRegistryImpl;
use infrastructure_common::{
    AdviceDescriptor, ComponentDescriptor, DependencyError, DependencyResult, DependencySlot,
    InfrastructureResult, Injectable, MethodDescriptor, MethodKey, TypeInfo,
};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 装配阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyPhase {
    Init,
    BindAdvices,
    Instantiate,
    Inject,
    Ready,
}

impl fmt::Display for AssemblyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "收集描述符",
            Self::BindAdvices => "绑定通知",
            Self::Instantiate => "实例化",
            Self::Inject => "依赖注入",
            Self::Ready => "就绪",
        };
        f.write_str(name)
    }
}

/// 上下文统计信息
#[derive(Debug, Clone)]
pub struct ContextStats {
    /// 上下文标识
    pub id: Uuid,
    /// 装配完成时间
    pub created_at: DateTime<Utc>,
    /// 组件数量
    pub component_count: usize,
    /// 已索引的能力数量
    pub capability_count: usize,
    /// 拦截器数量
    pub interceptor_count: usize,
    /// 包含代理能力的组件数量
    pub proxied_count: usize,
    /// 拦截策略
    pub policy: InterceptorPolicy,
}

/// 应用上下文
///
/// 装配完成后只读, 可被多个调用方并发查询。
pub struct ApplicationContext {
    id: Uuid,
    created_at: DateTime<Utc>,
    registry: ComponentRegistryImpl,
    interceptors: InterceptorIndex,
    policy: InterceptorPolicy,
}

impl ApplicationContext {
    /// 创建上下文构建器
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// 使用发现源装配上下文
    pub async fn bootstrap(
        discovery: &dyn ComponentDiscovery,
        config: &ContextConfig,
    ) -> InfrastructureResult<Self> {
        let id = Uuid::new_v4();
        let policy = config.interceptor_policy;
        info!("开始装配上下文 {} (发现源: {}, 策略: {})", id, discovery.name(), policy);

        let (components, advices) = phase(AssemblyPhase::Init, collect(discovery).await)?;
        info!("发现 {} 个组件, {} 个通知", components.len(), advices.len());

        let candidates: Vec<MethodDescriptor> = components
            .iter()
            .flat_map(ComponentDescriptor::public_methods)
            .collect();
        let interceptors = phase(
            AssemblyPhase::BindAdvices,
            InterceptorIndex::build(&advices, &candidates).map_err(Into::into),
        )?;
        info!("计算通知绑定完成: {} 个拦截器", interceptors.len());

        let registry = phase(
            AssemblyPhase::Instantiate,
            instantiate(&components, &interceptors, policy),
        )?;

        phase(
            AssemblyPhase::Inject,
            inject_all(&registry).map_err(Into::into),
        )?;

        let context = Self {
            id,
            created_at: Utc::now(),
            registry,
            interceptors,
            policy,
        };
        info!(
            "上下文 {} {}: {} 个组件",
            id,
            AssemblyPhase::Ready,
            context.registry.len()
        );
        Ok(context)
    }

    /// 获取组件, 不提供消歧名称
    pub fn get_bean<T>(&self) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.resolve::<T>(None)
    }

    /// 按名称获取组件
    pub fn get_bean_named<T>(&self, name: &str) -> DependencyResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry.resolve::<T>(Some(name))
    }

    /// 为外部对象注入依赖
    pub fn inject<T: Injectable>(&self, target: &T) -> DependencyResult<()> {
        let slots = T::dependency_slots();
        let injected = inject_slots(&self.registry, target, &slots)?;
        debug!("外部对象 {} 注入 {} 个依赖", std::any::type_name::<T>(), injected);
        Ok(())
    }

    /// 组件注册表
    pub fn registry(&self) -> &ComponentRegistryImpl {
        &self.registry
    }

    /// 拦截器索引
    pub fn interceptors(&self) -> &InterceptorIndex {
        &self.interceptors
    }

    pub fn policy(&self) -> InterceptorPolicy {
        self.policy
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 统计信息
    pub fn stats(&self) -> ContextStats {
        ContextStats {
            id: self.id,
            created_at: self.created_at,
            component_count: self.registry.len(),
            capability_count: self.registry.capability_count(),
            interceptor_count: self.interceptors.len(),
            proxied_count: self
                .registry
                .all_instances()
                .iter()
                .filter(|instance| instance.is_proxied())
                .count(),
            policy: self.policy,
        }
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("components", &self.registry.len())
            .field("interceptors", &self.interceptors.len())
            .field("policy", &self.policy)
            .finish()
    }
}

fn phase<T>(phase: AssemblyPhase, result: InfrastructureResult<T>) -> InfrastructureResult<T> {
    if let Err(e) = &result {
        error!("装配阶段 [{}] 失败: {}", phase, e);
    }
    result
}

async fn collect(
    discovery: &dyn ComponentDiscovery,
) -> InfrastructureResult<(Vec<ComponentDescriptor>, Vec<AdviceDescriptor>)> {
    let components = dedupe(discovery.discover_managed_types().await?, |d| &d.type_info, "组件");
    let advices = dedupe(discovery.discover_advice_types().await?, |d| &d.type_info, "通知");
    Ok((components, advices))
}

/// 同一类型只保留首个描述符
fn dedupe<T>(items: Vec<T>, type_info: impl Fn(&T) -> &TypeInfo, kind: &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let info = type_info(item);
            let fresh = seen.insert(info.id);
            if !fresh {
                warn!("{} {} 重复登记, 忽略后续描述符", kind, info.path);
            }
            fresh
        })
        .collect()
}

fn instantiate(
    components: &[ComponentDescriptor],
    interceptors: &InterceptorIndex,
    policy: InterceptorPolicy,
) -> InfrastructureResult<ComponentRegistryImpl> {
    let mut registry = ComponentRegistryImpl::new();

    for descriptor in components {
        let component = descriptor.type_info.id;
        // 代理决策必须在实例创建之前完成
        let proxied = interceptors.has_any_binding(component);
        let bindings = if proxied {
            interceptors.interceptors_per_method(component)
        } else {
            Default::default()
        };

        let target = descriptor.instantiate()?;
        let mut instance = ComponentInstance::new(
            descriptor.type_info.clone(),
            Arc::clone(&target),
            descriptor.slots().to_vec(),
        );

        for capability in descriptor.exposures() {
            let plain = capability
                .upcast(&target)
                .ok_or_else(|| DependencyError::RegistrationFailed {
                    type_name: descriptor.type_info.path.clone(),
                    message: format!("无法转换为能力 {}", capability.type_info.path),
                })?;

            let intercepted = capability.is_advisable()
                && capability
                    .methods()
                    .iter()
                    .any(|method| bindings.contains_key(&MethodKey::new(component, *method)));

            let handle = if intercepted {
                let dispatcher = MethodDispatcher::new(
                    descriptor.type_info.clone(),
                    capability.type_info.clone(),
                    Arc::clone(&target),
                    capability.methods(),
                    &bindings,
                    policy,
                );
                debug!("构建代理: {:?}", dispatcher);
                capability
                    .proxy(&plain, Arc::new(dispatcher))
                    .ok_or_else(|| DependencyError::RegistrationFailed {
                        type_name: descriptor.type_info.path.clone(),
                        message: format!("无法为能力 {} 构建代理", capability.type_info.path),
                    })?
            } else {
                plain
            };

            instance = instance.expose(capability.type_info.clone(), handle);
        }

        registry.register(instance.proxied(proxied))?;
    }

    Ok(registry)
}

fn inject_all(registry: &ComponentRegistryImpl) -> DependencyResult<()> {
    let mut total = 0;
    for instance in registry.all_instances() {
        total += inject_slots(registry, &*instance.target, &instance.slots)?;
    }
    info!("依赖注入完成: {} 个字段", total);
    Ok(())
}

/// 逐个解析并写入依赖字段, 任一字段失败即返回错误
fn inject_slots(
    registry: &dyn ComponentRegistry,
    target: &(dyn Any + Send + Sync),
    slots: &[DependencySlot],
) -> DependencyResult<usize> {
    for slot in slots {
        let dependency = registry.resolve_handle(&slot.capability, Some(slot.name.as_str()))?;
        slot.inject_into(target, &dependency)?;
        debug!("注入 {} <- {}", slot.name, slot.capability.short_name());
    }
    Ok(slots.len())
}
