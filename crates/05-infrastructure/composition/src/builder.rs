//! 上下文构建器

use crate::config::ContextConfig;
use crate::context::ApplicationContext;
use crate::discovery::{CatalogDiscovery, CompositeDiscovery, StaticDiscovery};
use aop_impl::InterceptorPolicy;
use di_abstractions::ComponentDiscovery;
use infrastructure_common::{
    AdviceDescriptor, Aspect, Component, ComponentDescriptor, InfrastructureError,
    InfrastructureResult,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// 上下文构建器
///
/// 使用建造者模式显式登记组件与通知, 再执行装配
pub struct ContextBuilder {
    /// 显式登记的描述符
    registrations: StaticDiscovery,
    /// 额外的发现源
    discoveries: Vec<Box<dyn ComponentDiscovery>>,
    /// 上下文配置
    config: ContextConfig,
    /// 是否启用日志初始化
    logging_enabled: bool,
}

impl ContextBuilder {
    /// 创建新的上下文构建器
    pub fn new() -> Self {
        Self {
            registrations: StaticDiscovery::new(),
            discoveries: Vec::new(),
            config: ContextConfig::default(),
            logging_enabled: false, // 默认不启用日志初始化
        }
    }

    /// 登记组件
    pub fn register<T: Component>(self) -> Self {
        self.register_descriptor(T::descriptor())
    }

    /// 登记组件描述符
    pub fn register_descriptor(mut self, descriptor: ComponentDescriptor) -> Self {
        debug!("登记组件: {}", descriptor.type_info.path);
        self.registrations.add_component(descriptor);
        self
    }

    /// 登记通知
    pub fn advice<A: Aspect>(self) -> Self {
        self.advice_descriptor(A::advice_descriptor())
    }

    /// 登记通知描述符
    pub fn advice_descriptor(mut self, descriptor: AdviceDescriptor) -> Self {
        debug!("登记通知: {}", descriptor.type_info.path);
        self.registrations.add_advice(descriptor);
        self
    }

    /// 扫描命名空间下由生成代码登记的组件与通知
    pub fn scan<S: Into<String>>(mut self, namespace: S) -> Self {
        let namespace = namespace.into();
        info!("添加命名空间扫描: {}", namespace);
        self.config.scan_namespaces.push(namespace);
        self
    }

    /// 添加自定义发现源
    pub fn add_discovery<D: ComponentDiscovery + 'static>(mut self, discovery: D) -> Self {
        info!("添加组件发现源: {}", discovery.name());
        self.discoveries.push(Box::new(discovery));
        self
    }

    /// 设置拦截策略
    pub fn interceptor_policy(mut self, policy: InterceptorPolicy) -> Self {
        self.config.interceptor_policy = policy;
        self
    }

    /// 使用配置, 已添加的扫描命名空间会保留
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        let mut namespaces = std::mem::take(&mut self.config.scan_namespaces);
        self.config = config;
        namespaces.append(&mut self.config.scan_namespaces);
        self.config.scan_namespaces = namespaces;
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.config.logging = config;
        self.logging_enabled = true; // 启用日志初始化
        self
    }

    /// 当前配置
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// 装配上下文
    pub async fn build(self) -> InfrastructureResult<ApplicationContext> {
        // 只有在明确配置了日志时才初始化日志
        // 避免在测试环境中重复初始化
        if self.logging_enabled {
            self.config.logging.init()?;
        }

        let mut discovery = CompositeDiscovery::default();
        if !self.registrations.is_empty() {
            discovery.push(self.registrations);
        }
        if !self.config.scan_namespaces.is_empty() {
            discovery.push(CatalogDiscovery::new(self.config.scan_namespaces.clone()));
        }
        for source in self.discoveries {
            discovery.push_boxed(source);
        }

        ApplicationContext::bootstrap(&discovery, &self.config).await
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 解析日志级别
    pub fn max_level(&self) -> InfrastructureResult<tracing::Level> {
        tracing::Level::from_str(&self.level).map_err(|e| InfrastructureError::ConfigError {
            message: format!("无效的日志级别 `{}`: {}", self.level, e),
        })
    }

    /// 初始化日志系统
    pub fn init(&self) -> InfrastructureResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.max_level()?)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
