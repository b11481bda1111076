//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件注册和依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`ComponentRegistry`] - 组件注册表接口
//! - [`ComponentResolver`] - 类型化依赖解析接口
//! - [`ComponentDiscovery`] - 组件发现接口

pub mod discovery;
pub mod registry;
pub mod resolver;

pub use discovery::*;
pub use registry::*;
pub use resolver::*;
