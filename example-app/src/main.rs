//! # 示例应用程序
//!
//! 演示如何使用 Lorn DI 扫描组件、装配上下文并通过代理调用被拦截的方法

mod beans;

use anyhow::Context;
use beans::{ReportJob, Root};
use clap::{Parser, ValueEnum};
use infrastructure_composition::{ApplicationContext, ContextConfig, InterceptorPolicy};
use std::path::PathBuf;
use tracing::info;

/// 拦截策略参数
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    First,
    Chain,
}

impl From<PolicyArg> for InterceptorPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::First => InterceptorPolicy::First,
            PolicyArg::Chain => InterceptorPolicy::Chain,
        }
    }
}

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn DI 示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 拦截策略, 覆盖配置文件
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// 日志级别, 覆盖配置文件
    #[arg(long)]
    log_level: Option<String>,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// 用命令行参数覆盖配置, 未给出的参数保留配置文件中的值
    fn apply(&self, config: &mut ContextConfig) {
        if let Some(policy) = self.policy {
            config.interceptor_policy = policy.into();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        config.logging.json_format |= self.json_logs;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = ContextConfig::load(args.config.as_deref()).context("加载上下文配置失败")?;
    args.apply(&mut config);
    let logging = config.logging.clone();

    let context = ApplicationContext::builder()
        .with_config(config)
        .with_logging(logging)
        .scan(concat!(module_path!(), "::beans"))
        .build()
        .await
        .context("上下文装配失败")?;

    info!("启动 Lorn DI 示例应用, 拦截策略: {}", context.policy());

    demonstrate_injection(&context)?;
    demonstrate_external_injection(&context)?;

    let stats = context.stats();
    info!(
        "上下文 {}: {} 个组件, {} 个能力, {} 个拦截器, {} 个代理组件",
        stats.id,
        stats.component_count,
        stats.capability_count,
        stats.interceptor_count,
        stats.proxied_count
    );

    Ok(())
}

/// 演示组件解析与被拦截的方法调用
fn demonstrate_injection(context: &ApplicationContext) -> anyhow::Result<()> {
    let root = context.get_bean::<Root>()?;
    info!("root.step_impl1 = {}", root.step_impl1.implem_name());
    info!("root.step_impl2 = {}", root.step_impl2.implem_name());
    info!("root.rule = {}", root.rule.get_rule_name());
    info!("root.rule.score(7) = {}", root.rule.score(7));

    let step = context.get_bean_named::<dyn beans::Step>("stepImpl1")?;
    info!("按名称解析 stepImpl1: {}", step.implem_name());
    Ok(())
}

/// 演示外部对象注入
fn demonstrate_external_injection(context: &ApplicationContext) -> anyhow::Result<()> {
    let job = ReportJob::default();
    context.inject(&job)?;
    info!("外部对象注入完成: {}", job.rule.get_rule_name());
    Ok(())
}
