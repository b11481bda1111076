//! 拦截器索引
//!
//! 装配开始时为每个环绕方法计算其切入点命中的方法集合, 按方法建立索引。
//! 索引建立后不再变化。

use crate::joinpoint::Joinpoint;
use infrastructure_common::{
    AdviceDescriptor, AdviceHandle, AopError, AopResult, Arguments, AroundMethod, Invoker,
    JoinPoint, MethodDescriptor, MethodKey, TypeInfo, Value,
};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// 拦截器
///
/// 一个环绕方法与其命中方法集合的绑定。
pub struct Interceptor {
    name: String,
    advice_type: TypeInfo,
    advice: AdviceHandle,
    around: AroundMethod,
    joinpoint: Joinpoint,
    intercepted: Vec<MethodKey>,
}

impl Interceptor {
    /// 拦截器名称, 格式为 `通知类型::方法名`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn advice_type(&self) -> &TypeInfo {
        &self.advice_type
    }

    pub fn joinpoint(&self) -> &Joinpoint {
        &self.joinpoint
    }

    /// 命中的方法
    pub fn intercepted_methods(&self) -> &[MethodKey] {
        &self.intercepted
    }

    /// 执行环绕方法
    ///
    /// 环绕方法返回的错误统一包装为 [`AopError::AdviceInvocation`], 已包装的错误原样传递。
    pub fn invoke(&self, join_point: &JoinPoint, args: Arguments, invoker: Invoker) -> AopResult<Value> {
        trace!("执行通知 {} @ {}", self.name, join_point.path());
        self.around
            .invoke(self.advice.as_ref(), join_point, args, invoker)
            .map_err(|source| match source.downcast::<AopError>() {
                Ok(err) if matches!(*err, AopError::AdviceInvocation { .. }) => *err,
                Ok(err) => AopError::AdviceInvocation {
                    advice: self.name.clone(),
                    method: join_point.path(),
                    source: err,
                },
                Err(source) => AopError::AdviceInvocation {
                    advice: self.name.clone(),
                    method: join_point.path(),
                    source,
                },
            })
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("name", &self.name)
            .field("joinpoint", &self.joinpoint)
            .field("intercepted", &self.intercepted.len())
            .finish()
    }
}

/// 计算通知绑定
///
/// 每个通知类型实例化一次; 每个命中至少一个方法的环绕方法生成一个拦截器。
/// 未命中任何方法的切入点不产生拦截器, 也不视为错误。
pub fn discover_advices(
    advices: &[AdviceDescriptor],
    candidates: &[MethodDescriptor],
) -> AopResult<Vec<Arc<Interceptor>>> {
    let mut interceptors = Vec::new();

    for descriptor in advices {
        let advice = descriptor.instantiate();

        for around in descriptor.arounds() {
            let joinpoint = Joinpoint::parse(&around.joinpoint)?;
            let name = format!("{}::{}", descriptor.type_info.short_name(), around.name);

            let matched: Vec<&MethodDescriptor> = candidates
                .iter()
                .filter(|method| joinpoint.matches(method.paths()))
                .collect();

            if matched.is_empty() {
                warn!("切入点 `{}` ({}) 未命中任何方法", joinpoint, name);
                continue;
            }

            for method in &matched {
                debug!(
                    "绑定通知 {} -> {}.{}",
                    name,
                    method.component().short_name(),
                    method.name()
                );
            }

            interceptors.push(Arc::new(Interceptor {
                name,
                advice_type: descriptor.type_info.clone(),
                advice: Arc::clone(&advice),
                around: around.clone(),
                joinpoint,
                intercepted: matched.iter().map(|method| method.key()).collect(),
            }));
        }
    }

    Ok(interceptors)
}

/// 拦截器索引
#[derive(Default)]
pub struct InterceptorIndex {
    interceptors: Vec<Arc<Interceptor>>,
    by_method: HashMap<MethodKey, Vec<Arc<Interceptor>>>,
}

impl InterceptorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算绑定并建立索引
    pub fn build(advices: &[AdviceDescriptor], candidates: &[MethodDescriptor]) -> AopResult<Self> {
        let mut index = Self::new();
        for interceptor in discover_advices(advices, candidates)? {
            index.register(interceptor);
        }
        Ok(index)
    }

    /// 登记拦截器到其命中的每个方法
    pub fn register(&mut self, interceptor: Arc<Interceptor>) {
        if self
            .interceptors
            .iter()
            .any(|existing| Arc::ptr_eq(existing, &interceptor))
        {
            return;
        }

        for key in interceptor.intercepted_methods() {
            self.by_method
                .entry(*key)
                .or_default()
                .push(Arc::clone(&interceptor));
        }
        self.interceptors.push(interceptor);
    }

    /// 绑定到指定方法的拦截器, 按绑定顺序排列; 没有绑定时为空
    pub fn interceptors_for(&self, method: &MethodKey) -> &[Arc<Interceptor>] {
        self.by_method.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 组件是否存在被拦截的方法
    pub fn has_any_binding(&self, component: TypeId) -> bool {
        self.by_method
            .iter()
            .any(|(key, bound)| key.component == component && !bound.is_empty())
    }

    /// 组件的方法到拦截器映射
    pub fn interceptors_per_method(&self, component: TypeId) -> HashMap<MethodKey, Vec<Arc<Interceptor>>> {
        self.by_method
            .iter()
            .filter(|(key, bound)| key.component == component && !bound.is_empty())
            .map(|(key, bound)| (*key, bound.clone()))
            .collect()
    }

    /// 全部拦截器
    pub fn interceptors(&self) -> &[Arc<Interceptor>] {
        &self.interceptors
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}
