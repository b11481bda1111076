//! 调用值
//!
//! 被拦截方法的参数与返回值以类型擦除的形式在代理、通知与原方法之间传递。

use crate::errors::{AopError, AopResult};
use std::any::Any;
use std::fmt;

/// 类型擦除的调用值
pub type Value = Box<dyn Any>;

/// 包装调用值
pub fn value<T: Any>(value: T) -> Value {
    Box::new(value)
}

/// 将调用值还原为具体类型
pub fn downcast_value<T: Any>(value: Value, method: &str) -> AopResult<T> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| AopError::ReturnTypeMismatch {
            method: method.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

/// 方法调用参数
///
/// 参数按声明顺序保存, 通知可以读取、替换参数后再交给 [`crate::Invoker`]。
#[derive(Default)]
pub struct Arguments {
    values: Vec<Option<Value>>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加参数（链式）
    pub fn with<T: Any>(mut self, arg: T) -> Self {
        self.push(arg);
        self
    }

    /// 追加参数
    pub fn push<T: Any>(&mut self, arg: T) {
        self.values.push(Some(value(arg)));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 读取参数
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values
            .get(index)
            .and_then(Option::as_ref)
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// 可变读取参数
    pub fn get_mut<T: Any>(&mut self, index: usize) -> Option<&mut T> {
        self.values
            .get_mut(index)
            .and_then(Option::as_mut)
            .and_then(|v| v.downcast_mut::<T>())
    }

    /// 替换参数, 返回是否替换成功
    pub fn replace<T: Any>(&mut self, index: usize, arg: T) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = Some(value(arg));
                true
            }
            None => false,
        }
    }

    /// 取出参数的所有权
    ///
    /// 参数缺失、已被取出或类型不符时返回 [`AopError::ArgumentMismatch`]。
    pub fn take<T: Any>(&mut self, index: usize, method: &str) -> AopResult<T> {
        let mismatch = || AopError::ArgumentMismatch {
            method: method.to_string(),
            index,
            expected: std::any::type_name::<T>(),
        };

        let slot = self.values.get_mut(index).ok_or_else(mismatch)?;
        match slot.take() {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(arg) => Ok(*arg),
                Err(original) => {
                    *slot = Some(original);
                    Err(mismatch())
                }
            },
            None => Err(mismatch()),
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arguments")
            .field("len", &self.values.len())
            .finish()
    }
}
