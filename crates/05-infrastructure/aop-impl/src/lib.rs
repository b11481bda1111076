//! # AOP Implementation
//!
//! 方法拦截的核心实现。
//!
//! ## 核心组件
//!
//! - [`Joinpoint`] - 切入点表达式匹配
//! - [`InterceptorIndex`] - 按方法索引的拦截器
//! - [`MethodDispatcher`] - 代理对象的方法分派

pub mod dispatcher;
pub mod interceptor;
pub mod joinpoint;

pub use dispatcher::*;
pub use interceptor::*;
pub use joinpoint::*;
