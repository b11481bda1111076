//! 方法分派
//!
//! 代理对象把每次调用交给 [`MethodDispatch`], 由它决定直接执行原方法还是交给通知。
//! 原方法体只能通过一次性的 [`Invoker`] 执行。

use crate::component::{CapabilityDescriptor, ComponentHandle};
use crate::errors::AopResult;
use crate::metadata::TypeInfo;
use crate::value::{downcast_value, Arguments, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 原方法体
pub type MethodBody = Box<dyn FnOnce(Arguments) -> AopResult<Value>>;

/// 方法分派 trait
pub trait MethodDispatch: Send + Sync {
    /// 分派一次方法调用
    fn dispatch(&self, method: &'static str, args: Arguments, body: MethodBody) -> AopResult<Value>;
}

/// 可被拦截的能力
///
/// 由 `#[advisable]` 为 `dyn Trait` 生成实现。
pub trait Advisable: Send + Sync + 'static {
    /// 能力类型信息, 路径即切入点匹配使用的声明类型路径
    fn capability() -> TypeInfo;

    /// 公开方法名称, 包含从可拦截父 trait 继承的方法
    fn methods() -> Vec<&'static str>;

    /// 使用分派器包装目标实例
    fn proxy(target: Arc<Self>, dispatch: Arc<dyn MethodDispatch>) -> Arc<Self>;
}

/// 组件类型 `T` 经由可拦截能力获得的父能力
///
/// `#[advisable]` 为每个实现该 trait 的 `T` 生成实现, 返回全部可拦截父 trait
/// (递归展开) 的能力描述符。
pub trait AdvisableFor<T>: Advisable {
    fn supertraits() -> Vec<CapabilityDescriptor>;
}

/// 可拦截能力的代理
///
/// `#[advisable]` 为所有 `Proxy<C>` (`C` 实现该 trait) 生成转发实现,
/// 因此子 trait 的代理同样满足其可拦截父 trait。
pub struct Proxy<C: ?Sized> {
    target: Arc<C>,
    dispatch: Arc<dyn MethodDispatch>,
}

impl<C: ?Sized> Proxy<C> {
    pub fn new(target: Arc<C>, dispatch: Arc<dyn MethodDispatch>) -> Self {
        Self { target, dispatch }
    }

    /// 被代理的原始实例
    pub fn target(&self) -> &Arc<C> {
        &self.target
    }

    pub fn dispatcher(&self) -> &dyn MethodDispatch {
        self.dispatch.as_ref()
    }
}

impl<C: ?Sized> fmt::Debug for Proxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proxy")
            .field("capability", &std::any::type_name::<C>())
            .finish()
    }
}

/// 原方法调用器
///
/// 只能调用一次, `proceed` 消耗调用器本身。
pub struct Invoker {
    method: String,
    body: MethodBody,
}

impl Invoker {
    pub fn new(method: impl Into<String>, body: MethodBody) -> Self {
        Self {
            method: method.into(),
            body,
        }
    }

    /// 被调用方法路径
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 执行原方法
    pub fn proceed(self, args: Arguments) -> AopResult<Value> {
        (self.body)(args)
    }

    /// 执行原方法并还原返回值类型
    pub fn proceed_as<T: Any>(self, args: Arguments) -> AopResult<T> {
        let method = self.method.clone();
        downcast_value(self.proceed(args)?, &method)
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invoker").field("method", &self.method).finish()
    }
}

/// 连接点
///
/// 描述一次被拦截的调用: 接收者、声明能力与方法名。
#[derive(Clone)]
pub struct JoinPoint {
    component: Arc<TypeInfo>,
    capability: Arc<TypeInfo>,
    method: &'static str,
    target: ComponentHandle,
}

impl JoinPoint {
    pub fn new(
        component: Arc<TypeInfo>,
        capability: Arc<TypeInfo>,
        method: &'static str,
        target: ComponentHandle,
    ) -> Self {
        Self {
            component,
            capability,
            method,
            target,
        }
    }

    pub fn component(&self) -> &TypeInfo {
        &self.component
    }

    pub fn capability(&self) -> &TypeInfo {
        &self.capability
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// 调用路径, 格式为 `能力路径.方法名`
    pub fn path(&self) -> String {
        format!("{}.{}", self.capability.path, self.method)
    }

    /// 访问接收者
    pub fn target<T: Any>(&self) -> Option<&T> {
        self.target.downcast_ref::<T>()
    }
}

impl fmt::Debug for JoinPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("component", &self.component.path)
            .field("capability", &self.capability.path)
            .field("method", &self.method)
            .finish()
    }
}
