//! 上下文装配集成测试

use crate::builder::ContextBuilder;
use crate::config::ContextConfig;
use crate::discovery::StaticDiscovery;
use crate::{ApplicationContext, InterceptorPolicy};
use di_abstractions::ComponentRegistry;
use infrastructure_common::{
    downcast_value, value, AdviceDescriptor, AdvisableFor, CapabilityDescriptor, AdviceResult, AopError, AopResult, Arguments,
    ComponentDescriptor, DependencyError, DependencySlot, Inject, Injectable, InfrastructureError,
    Invoker, JoinPoint, MethodDispatch, TypeInfo, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// 初始化测试日志系统（只初始化一次）
fn init_test_logger() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init()
            .ok(); // 忽略初始化失败的错误
    });
}

trait Step: Send + Sync {
    fn implem_name(&self) -> String;
}

struct StepProxy {
    target: Arc<dyn Step>,
    dispatch: Arc<dyn MethodDispatch>,
}

impl Step for StepProxy {
    fn implem_name(&self) -> String {
        let target = Arc::clone(&self.target);
        let result = self.dispatch.dispatch(
            "implem_name",
            Arguments::new(),
            Box::new(move |_: Arguments| -> AopResult<Value> { Ok(value(target.implem_name())) }),
        );
        match result.and_then(|v| downcast_value::<String>(v, "implem_name")) {
            Ok(name) => name,
            Err(e) => panic!("{}", e),
        }
    }
}

impl infrastructure_common::Advisable for dyn Step {
    fn capability() -> TypeInfo {
        TypeInfo::named::<dyn Step>("app::bean::Step")
    }

    fn methods() -> Vec<&'static str> {
        vec!["implem_name"]
    }

    fn proxy(target: Arc<Self>, dispatch: Arc<dyn MethodDispatch>) -> Arc<Self> {
        Arc::new(StepProxy { target, dispatch })
    }
}

impl<T: Step + 'static> AdvisableFor<T> for dyn Step {
    fn supertraits() -> Vec<CapabilityDescriptor> {
        Vec::new()
    }
}

#[derive(Default)]
struct StepImpl1;

impl Step for StepImpl1 {
    fn implem_name(&self) -> String {
        "stepImpl1".to_string()
    }
}

#[derive(Default)]
struct StepImpl2;

impl Step for StepImpl2 {
    fn implem_name(&self) -> String {
        "stepImpl2".to_string()
    }
}

macro_rules! no_slots {
    ($($ty:ty),*) => {
        $(impl Injectable for $ty {
            fn dependency_slots() -> Vec<DependencySlot> {
                Vec::new()
            }
        })*
    };
}

no_slots!(StepImpl1, StepImpl2);

#[derive(Default)]
struct Root {
    step_impl1: Inject<dyn Step>,
}

impl Injectable for Root {
    fn dependency_slots() -> Vec<DependencySlot> {
        vec![DependencySlot::new::<Root, dyn Step>("step_impl1", |root| &root.step_impl1)]
    }
}

fn step1() -> ComponentDescriptor {
    ComponentDescriptor::builder::<StepImpl1>()
        .advisable::<dyn Step>(|c: Arc<StepImpl1>| -> Arc<dyn Step> { c })
        .build()
}

fn step2() -> ComponentDescriptor {
    ComponentDescriptor::builder::<StepImpl2>()
        .advisable::<dyn Step>(|c: Arc<StepImpl2>| -> Arc<dyn Step> { c })
        .build()
}

fn root() -> ComponentDescriptor {
    ComponentDescriptor::builder::<Root>().build()
}

#[derive(Default)]
struct Advice1 {
    calls: AtomicUsize,
}

impl Advice1 {
    fn intercept1(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name: String = invoker.proceed_as(args)?;
        Ok(value(format!("interceptor => {}", name)))
    }

    fn wrap(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        let name: String = invoker.proceed_as(args)?;
        Ok(value(format!("[{}]", name)))
    }
}

fn advice(joinpoint: &str) -> AdviceDescriptor {
    AdviceDescriptor::builder::<Advice1>()
        .around("intercept1", joinpoint, Advice1::intercept1)
        .build()
}

#[tokio::test]
async fn test_bootstrap_with_static_discovery() {
    init_test_logger();

    let discovery = StaticDiscovery::new()
        .with_component(step1())
        .with_component(step2())
        .with_component(root())
        .with_advice(advice(r".*StepImpl1\.implem_name"));

    let context = ApplicationContext::bootstrap(&discovery, &ContextConfig::default())
        .await
        .expect("装配应该成功");

    let root = context.get_bean::<Root>().unwrap();
    assert_eq!(root.step_impl1.implem_name(), "interceptor => stepImpl1");

    let step2 = context.get_bean_named::<dyn Step>("stepImpl2").unwrap();
    assert_eq!(step2.implem_name(), "stepImpl2");

    let stats = context.stats();
    assert_eq!(stats.component_count, 3);
    assert_eq!(stats.interceptor_count, 1);
    assert_eq!(stats.proxied_count, 1);
    assert_eq!(stats.policy, InterceptorPolicy::First);
}

#[tokio::test]
async fn test_concrete_lookup_is_not_proxied() {
    init_test_logger();

    let context = ContextBuilder::new()
        .register_descriptor(step1())
        .advice_descriptor(advice(r".*implem_name"))
        .build()
        .await
        .unwrap();

    let concrete = context.get_bean::<StepImpl1>().unwrap();
    assert_eq!(concrete.implem_name(), "stepImpl1");

    let capability = context.get_bean::<dyn Step>().unwrap();
    assert_eq!(capability.implem_name(), "interceptor => stepImpl1");
}

#[tokio::test]
async fn test_ambiguous_dependency_fails_build() {
    init_test_logger();

    #[derive(Default)]
    struct Loose {
        step: Inject<dyn Step>,
    }

    impl Injectable for Loose {
        fn dependency_slots() -> Vec<DependencySlot> {
            vec![DependencySlot::new::<Loose, dyn Step>("step", |c| &c.step)]
        }
    }

    let result = ContextBuilder::new()
        .register_descriptor(step1())
        .register_descriptor(step2())
        .register_descriptor(ComponentDescriptor::builder::<Loose>().build())
        .build()
        .await;

    match result {
        Err(InfrastructureError::Dependency(DependencyError::Ambiguous { candidates, .. })) => {
            assert!(candidates.contains("StepImpl1"));
            assert!(candidates.contains("StepImpl2"));
        }
        other => panic!("期望 Ambiguous, 实际 {:?}", other.map(|c| c.id())),
    }
}

#[tokio::test]
async fn test_missing_dependency_fails_build() {
    init_test_logger();

    let result = ContextBuilder::new().register_descriptor(root()).build().await;
    assert!(matches!(
        result,
        Err(InfrastructureError::Dependency(DependencyError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn test_chain_policy_from_config_file() {
    init_test_logger();

    let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    std::fs::write(file.path(), "interceptor_policy = \"chain\"\n").unwrap();
    let config = ContextConfig::load(Some(file.path())).unwrap();

    let outer = AdviceDescriptor::builder::<Advice1>()
        .around("intercept1", r".*Step\.implem_name", Advice1::intercept1)
        .around("wrap", r".*Step\.implem_name", Advice1::wrap)
        .build();

    let context = ContextBuilder::new()
        .with_config(config)
        .register_descriptor(step1())
        .advice_descriptor(outer)
        .build()
        .await
        .unwrap();

    assert_eq!(context.policy(), InterceptorPolicy::Chain);
    let step = context.get_bean::<dyn Step>().unwrap();
    assert_eq!(step.implem_name(), "interceptor => [stepImpl1]");
}

#[tokio::test]
async fn test_invalid_joinpoint_fails_build() {
    init_test_logger();

    let result = ContextBuilder::new()
        .register_descriptor(step1())
        .advice_descriptor(advice("(unclosed"))
        .build()
        .await;

    assert!(matches!(
        result,
        Err(InfrastructureError::Aop(AopError::InvalidJoinpoint { .. }))
    ));
}

#[tokio::test]
async fn test_inject_external_object() {
    init_test_logger();

    let context = ContextBuilder::new()
        .register_descriptor(step1())
        .build()
        .await
        .unwrap();

    let external = Root::default();
    assert!(!external.step_impl1.is_injected());
    context.inject(&external).unwrap();
    assert_eq!(external.step_impl1.implem_name(), "stepImpl1");
}

#[tokio::test]
async fn test_duplicate_descriptor_is_ignored() {
    init_test_logger();

    let context = ContextBuilder::new()
        .register_descriptor(step1())
        .register_descriptor(step1())
        .build()
        .await
        .unwrap();

    assert_eq!(context.registry().len(), 1);
    assert!(context.get_bean::<dyn Step>().is_ok());
}

#[tokio::test]
async fn test_factory_failure_aborts_build() {
    init_test_logger();

    struct NeedsConfig;

    impl Injectable for NeedsConfig {
        fn dependency_slots() -> Vec<DependencySlot> {
            Vec::new()
        }
    }

    let descriptor =
        ComponentDescriptor::builder_with_factory(|| Err::<NeedsConfig, _>("缺少配置项")).build();

    let result = ContextBuilder::new()
        .register_descriptor(step1())
        .register_descriptor(descriptor)
        .build()
        .await;

    match result {
        Err(InfrastructureError::Dependency(DependencyError::InstantiationError { type_name, .. })) => {
            assert!(type_name.ends_with("NeedsConfig"));
        }
        other => panic!("期望 InstantiationError, 实际 {:?}", other.map(|c| c.id())),
    }
}
