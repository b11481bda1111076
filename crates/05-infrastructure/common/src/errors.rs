//! 错误类型定义

use thiserror::Error;

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("未找到满足能力的组件: {capability}")]
    NotFound { capability: String },

    #[error("能力 {capability} 存在多个候选组件 [{candidates}], 名称 `{disambiguator}` 无法唯一匹配")]
    Ambiguous {
        capability: String,
        disambiguator: String,
        candidates: String,
    },

    #[error("组件实例化失败: {type_name}, 原因: {source}")]
    InstantiationError {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("依赖注入失败: {type_name}.{slot}, 原因: {message}")]
    InjectionFailed {
        type_name: String,
        slot: String,
        message: String,
    },

    #[error("组件注册失败: {type_name}, 原因: {message}")]
    RegistrationFailed { type_name: String, message: String },
}

/// 方法拦截错误类型
#[derive(Error, Debug)]
pub enum AopError {
    #[error("通知方法执行失败: {advice} @ {method}, 原因: {source}")]
    AdviceInvocation {
        advice: String,
        method: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("切入点表达式无效: {pattern}, 原因: {message}")]
    InvalidJoinpoint { pattern: String, message: String },

    #[error("方法参数不匹配: {method} 第 {index} 个参数, 期望类型 {expected}")]
    ArgumentMismatch {
        method: String,
        index: usize,
        expected: &'static str,
    },

    #[error("方法返回值类型不匹配: {method}, 期望类型 {expected}")]
    ReturnTypeMismatch {
        method: String,
        expected: &'static str,
    },

    #[error("通知实例类型不匹配: {advice}")]
    AdviceTypeMismatch { advice: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("依赖注入错误: {0}")]
    Dependency(#[from] DependencyError),

    #[error("方法拦截错误: {0}")]
    Aop(#[from] AopError),

    #[error("配置错误: {message}")]
    ConfigError { message: String },

    #[error("组件发现失败: {message}")]
    DiscoveryFailed { message: String },

    #[error("启动失败: {message}")]
    BootstrapFailed { message: String },
}

impl InfrastructureError {
    /// 取出内部的依赖注入错误
    pub fn as_dependency(&self) -> Option<&DependencyError> {
        match self {
            Self::Dependency(err) => Some(err),
            _ => None,
        }
    }

    /// 取出内部的方法拦截错误
    pub fn as_aop(&self) -> Option<&AopError> {
        match self {
            Self::Aop(err) => Some(err),
            _ => None,
        }
    }
}

/// 结果类型别名
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type AopResult<T> = Result<T, AopError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
