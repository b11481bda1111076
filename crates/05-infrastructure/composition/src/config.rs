//! 上下文配置
//!
//! 配置只调整拦截策略、扫描命名空间与日志, 组件装配关系始终来自静态声明。

use crate::builder::LoggingConfig;
use aop_impl::InterceptorPolicy;
use infrastructure_common::{InfrastructureError, InfrastructureResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// 环境变量前缀, 例如 `LORN_DI__INTERCEPTOR_POLICY=chain`
pub const ENV_PREFIX: &str = "LORN_DI";

/// 环境变量分隔符
pub const ENV_SEPARATOR: &str = "__";

/// 上下文配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// 多个通知命中同一方法时的执行策略
    pub interceptor_policy: InterceptorPolicy,
    /// 扫描的命名空间
    pub scan_namespaces: Vec<String>,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl ContextConfig {
    /// 从配置文件（可选）与环境变量加载
    pub fn load(path: Option<&Path>) -> InfrastructureResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(InfrastructureError::ConfigError {
                    message: format!("配置文件不存在: {}", path.display()),
                });
            }
            info!("加载上下文配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(config_error)
    }

    /// 从 TOML 文本加载
    pub fn from_toml_str(content: &str) -> InfrastructureResult<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()
            .and_then(|settings| settings.try_deserialize::<Self>())
            .map_err(config_error)
    }
}

fn config_error(err: config::ConfigError) -> InfrastructureError {
    InfrastructureError::ConfigError {
        message: format!("上下文配置解析失败: {}", err),
    }
}
