//! 组件发现抽象接口
//!
//! 提供受管组件与通知类型的发现能力

use async_trait::async_trait;
use infrastructure_common::{AdviceDescriptor, ComponentDescriptor, InfrastructureError};

/// 组件发现器 trait
///
/// 为上下文装配提供候选组件与通知描述符
#[async_trait]
pub trait ComponentDiscovery: Send + Sync {
    /// 发现受管组件
    async fn discover_managed_types(&self) -> Result<Vec<ComponentDescriptor>, InfrastructureError>;

    /// 发现通知类型
    async fn discover_advice_types(&self) -> Result<Vec<AdviceDescriptor>, InfrastructureError>;

    /// 获取发现器名称
    fn name(&self) -> &str;
}
