//! # 应用上下文组合层
//!
//! 把组件注册表、拦截器索引与方法分派器组合为一个完整的应用上下文。
//!
//! ## 主要功能
//!
//! - **上下文构建器**: 显式登记组件与通知, 或按命名空间扫描生成代码登记的描述符
//! - **装配流程**: 计算通知绑定 → 实例化（必要时构建代理） → 字段注入
//! - **配置加载**: 文件与 `LORN_DI__*` 环境变量
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ApplicationContext;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let context = ApplicationContext::builder()
//!         .scan("my_app::beans")
//!         .build()
//!         .await?;
//!
//!     println!("组件数量: {}", context.stats().component_count);
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod discovery;

pub use builder::{ContextBuilder, LoggingConfig};
pub use config::{ContextConfig, ENV_PREFIX, ENV_SEPARATOR};
pub use context::{ApplicationContext, AssemblyPhase, ContextStats};
pub use discovery::{CatalogDiscovery, CompositeDiscovery, StaticDiscovery};

// 重新导出常用类型
pub use aop_impl::InterceptorPolicy;
pub use infrastructure_common::{DependencyError, InfrastructureError};

#[cfg(test)]
mod tests;
