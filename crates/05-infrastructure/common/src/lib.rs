//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn DI 运行时的公共组件模型、调用值与错误类型。
//!
//! ## 核心组件
//!
//! - [`ComponentDescriptor`] - 受管组件的静态描述
//! - [`Inject`] - 可注入的依赖字段
//! - [`Advisable`] - 可被拦截的能力
//! - [`AdviceDescriptor`] - 通知与环绕方法描述
//! - [`Invoker`] - 一次性的原方法调用器
//!
//! ## 设计原则
//!
//! - 描述符显式登记, 不依赖运行时反射
//! - 拦截基于能力 trait 的代理实现
//! - 装配完成后只读

pub mod advice;
pub mod catalog;
pub mod component;
pub mod dispatch;
pub mod errors;
pub mod inject;
pub mod metadata;
pub mod method;
pub mod value;

pub use advice::*;
pub use catalog::*;
pub use component::*;
pub use dispatch::*;
pub use errors::*;
pub use inject::*;
pub use metadata::*;
pub use method::*;
pub use value::*;
