//! 通知描述
//!
//! 一个通知类型包含若干环绕方法, 每个环绕方法带有一个切入点表达式。
//! 通知实例在装配时创建一次, 不参与依赖注入。

use crate::dispatch::{Invoker, JoinPoint};
use crate::errors::AopError;
use crate::metadata::TypeInfo;
use crate::value::{Arguments, Value};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 通知实例句柄
pub type AdviceHandle = Arc<dyn Any + Send + Sync>;

/// 环绕方法返回值
pub type AdviceResult = Result<Value, Box<dyn Error + Send + Sync>>;

type AroundFn =
    Arc<dyn Fn(&(dyn Any + Send + Sync), &JoinPoint, Arguments, Invoker) -> AdviceResult + Send + Sync>;
type AdviceFactoryFn = Arc<dyn Fn() -> AdviceHandle + Send + Sync>;

/// 通知类型 trait
///
/// 由 `#[aspect]` 生成实现。
pub trait Aspect: Any + Send + Sync {
    fn advice_descriptor() -> AdviceDescriptor;
}

/// 环绕方法
#[derive(Clone)]
pub struct AroundMethod {
    /// 方法名称
    pub name: String,
    /// 切入点表达式
    pub joinpoint: String,
    handler: AroundFn,
}

impl AroundMethod {
    /// 在通知实例上执行环绕方法
    pub fn invoke(
        &self,
        advice: &(dyn Any + Send + Sync),
        join_point: &JoinPoint,
        args: Arguments,
        invoker: Invoker,
    ) -> AdviceResult {
        (self.handler)(advice, join_point, args, invoker)
    }
}

impl fmt::Debug for AroundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AroundMethod")
            .field("name", &self.name)
            .field("joinpoint", &self.joinpoint)
            .finish()
    }
}

/// 通知描述符
#[derive(Clone)]
pub struct AdviceDescriptor {
    /// 通知类型信息
    pub type_info: TypeInfo,
    arounds: Vec<AroundMethod>,
    factory: AdviceFactoryFn,
}

impl AdviceDescriptor {
    /// 使用 `Default` 构造通知实例的描述符构建器
    pub fn builder<A: Default + Send + Sync + 'static>() -> AdviceDescriptorBuilder<A> {
        AdviceDescriptorBuilder {
            arounds: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// 环绕方法
    pub fn arounds(&self) -> &[AroundMethod] {
        &self.arounds
    }

    /// 创建通知实例
    pub fn instantiate(&self) -> AdviceHandle {
        (self.factory)()
    }
}

impl fmt::Debug for AdviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdviceDescriptor")
            .field("type_info", &self.type_info.path)
            .field("arounds", &self.arounds)
            .finish()
    }
}

/// 通知描述符构建器
pub struct AdviceDescriptorBuilder<A> {
    arounds: Vec<AroundMethod>,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Default + Send + Sync + 'static> AdviceDescriptorBuilder<A> {
    /// 声明环绕方法
    pub fn around<F>(mut self, name: &str, joinpoint: &str, handler: F) -> Self
    where
        F: Fn(&A, &JoinPoint, Arguments, Invoker) -> AdviceResult + Send + Sync + 'static,
    {
        let advice_name = format!("{}::{}", TypeInfo::of::<A>().short_name(), name);
        let handler: AroundFn = Arc::new(
            move |advice: &(dyn Any + Send + Sync),
                  join_point: &JoinPoint,
                  args: Arguments,
                  invoker: Invoker|
                  -> AdviceResult {
                match advice.downcast_ref::<A>() {
                    Some(advice) => handler(advice, join_point, args, invoker),
                    None => Err(AopError::AdviceTypeMismatch {
                        advice: advice_name.clone(),
                    }
                    .into()),
                }
            },
        );

        self.arounds.push(AroundMethod {
            name: name.to_string(),
            joinpoint: joinpoint.to_string(),
            handler,
        });
        self
    }

    pub fn build(self) -> AdviceDescriptor {
        AdviceDescriptor {
            type_info: TypeInfo::of::<A>(),
            arounds: self.arounds,
            factory: Arc::new(|| Arc::new(A::default()) as AdviceHandle),
        }
    }
}
