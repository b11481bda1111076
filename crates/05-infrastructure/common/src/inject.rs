//! 依赖字段

use once_cell::sync::OnceCell;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// 可注入的依赖字段
///
/// 组件实例化时为空, 在装配的注入阶段写入一次。注入完成前解引用会 panic,
/// 对受管组件而言装配成功即保证所有字段已写入。
pub struct Inject<T: ?Sized> {
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> Inject<T> {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// 获取已注入的依赖
    pub fn get(&self) -> Option<&Arc<T>> {
        self.cell.get()
    }

    /// 是否已注入
    pub fn is_injected(&self) -> bool {
        self.cell.get().is_some()
    }

    /// 写入依赖
    ///
    /// 重复写入同一实例视为成功, 写入不同实例返回 `false`。
    pub(crate) fn set(&self, dependency: Arc<T>) -> bool {
        match self.cell.get() {
            Some(existing) => Arc::ptr_eq(existing, &dependency),
            None => self.cell.set(dependency).is_ok(),
        }
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.cell.get() {
            Some(dependency) => dependency,
            None => panic!(
                "依赖 {} 尚未注入, 请在装配完成后访问",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}
