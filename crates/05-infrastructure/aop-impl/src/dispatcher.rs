//! 方法分派器
//!
//! 每个被代理的（组件, 能力）对应一个分派器。未绑定通知的方法直接执行原方法体。

use crate::interceptor::Interceptor;
use infrastructure_common::{
    AopResult, Arguments, ComponentHandle, Invoker, JoinPoint, MethodBody, MethodDispatch,
    MethodKey, TypeInfo, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 多个通知命中同一方法时的执行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptorPolicy {
    /// 只执行绑定顺序中的第一个通知
    #[default]
    First,
    /// 按绑定顺序嵌套执行全部通知, 第一个通知在最外层
    Chain,
}

impl fmt::Display for InterceptorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::Chain => f.write_str("chain"),
        }
    }
}

/// 方法分派器
pub struct MethodDispatcher {
    component: Arc<TypeInfo>,
    capability: Arc<TypeInfo>,
    target: ComponentHandle,
    table: HashMap<&'static str, Vec<Arc<Interceptor>>>,
    policy: InterceptorPolicy,
}

impl MethodDispatcher {
    /// 创建分派器
    ///
    /// `bindings` 为组件的方法到拦截器映射, 只保留属于 `methods` 的条目。
    pub fn new(
        component: TypeInfo,
        capability: TypeInfo,
        target: ComponentHandle,
        methods: &[&'static str],
        bindings: &HashMap<MethodKey, Vec<Arc<Interceptor>>>,
        policy: InterceptorPolicy,
    ) -> Self {
        let table = bindings
            .iter()
            .filter(|(key, bound)| {
                key.component == component.id && methods.contains(&key.name) && !bound.is_empty()
            })
            .map(|(key, bound)| (key.name, bound.clone()))
            .collect();

        Self {
            component: Arc::new(component),
            capability: Arc::new(capability),
            target,
            table,
            policy,
        }
    }

    /// 方法上绑定的拦截器
    pub fn interceptors_for(&self, method: &str) -> &[Arc<Interceptor>] {
        self.table.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 是否存在绑定
    pub fn has_bindings(&self) -> bool {
        !self.table.is_empty()
    }

    fn join_point(&self, method: &'static str) -> JoinPoint {
        JoinPoint::new(
            Arc::clone(&self.component),
            Arc::clone(&self.capability),
            method,
            Arc::clone(&self.target),
        )
    }

    fn path(&self, method: &str) -> String {
        format!("{}.{}", self.capability.path, method)
    }
}

impl MethodDispatch for MethodDispatcher {
    fn dispatch(&self, method: &'static str, args: Arguments, body: MethodBody) -> AopResult<Value> {
        let bound = self.interceptors_for(method);
        let Some((first, rest)) = bound.split_first() else {
            return body(args);
        };

        trace!(
            "分派 {}.{} ({} 个通知, 策略 {})",
            self.component.short_name(),
            method,
            bound.len(),
            self.policy
        );

        let mut invoker = Invoker::new(self.path(method), body);
        if self.policy == InterceptorPolicy::Chain {
            // 由内向外包装, 每层调用器执行下一个通知
            for interceptor in rest.iter().rev() {
                let interceptor = Arc::clone(interceptor);
                let join_point = self.join_point(method);
                let next = invoker;
                invoker = Invoker::new(
                    self.path(method),
                    Box::new(move |args: Arguments| interceptor.invoke(&join_point, args, next)),
                );
            }
        }

        first.invoke(&self.join_point(method), args, invoker)
    }
}

impl fmt::Debug for MethodDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.table.keys().copied().collect();
        methods.sort_unstable();
        f.debug_struct("MethodDispatcher")
            .field("component", &self.component.path)
            .field("capability", &self.capability.path)
            .field("methods", &methods)
            .field("policy", &self.policy)
            .finish()
    }
}
