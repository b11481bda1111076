//! 基于过程宏与命名空间扫描的上下文装配测试

use infrastructure_common::{DependencyError, InfrastructureError};
use infrastructure_composition::{ApplicationContext, InterceptorPolicy};
use std::sync::atomic::Ordering;

mod beans {
    use component_macros::{advisable, aspect, Component, Injectable};
    use infrastructure_common::{value, AdviceResult, Arguments, Inject, Invoker, JoinPoint};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static INTERCEPTED: AtomicUsize = AtomicUsize::new(0);

    #[advisable]
    pub trait Step: Send + Sync {
        fn implem_name(&self) -> String;
    }

    #[advisable]
    pub trait Rule: Send + Sync {
        fn get_rule_name(&self) -> String;
    }

    #[derive(Default, Component)]
    #[component(advisable(dyn Step))]
    pub struct StepImpl1;

    impl Step for StepImpl1 {
        fn implem_name(&self) -> String {
            "stepImpl1".to_string()
        }
    }

    #[derive(Default, Component)]
    #[component(advisable(dyn Step))]
    pub struct StepImpl2;

    impl Step for StepImpl2 {
        fn implem_name(&self) -> String {
            "stepImpl2".to_string()
        }
    }

    #[derive(Default, Component)]
    #[component(advisable(dyn Rule))]
    pub struct RuleImpl {
        step_impl2: Inject<dyn Step>,
    }

    impl Rule for RuleImpl {
        fn get_rule_name(&self) -> String {
            format!("ruleImpl({})", self.step_impl2.implem_name())
        }
    }

    #[derive(Default, Component)]
    pub struct Root {
        pub step_impl1: Inject<dyn Step>,
        #[inject(name = "stepImpl2")]
        pub second: Inject<dyn Step>,
        pub rule: Inject<dyn Rule>,
    }

    #[derive(Default, Injectable)]
    pub struct Handler {
        pub rule: Inject<dyn Rule>,
    }

    #[derive(Default)]
    pub struct Advice1;

    #[aspect]
    impl Advice1 {
        #[around(joinpoint = r".*StepImpl1\.implem_name")]
        fn intercept1(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
            INTERCEPTED.fetch_add(1, Ordering::SeqCst);
            let name: String = invoker.proceed_as(args)?;
            Ok(value(format!("interceptor => {}", name)))
        }

        #[around(joinpoint = r".*get_rule_name")]
        fn intercept2(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
            let name: String = invoker.proceed_as(args)?;
            Ok(value(format!("interceptor2 => {}", name)))
        }
    }
}

mod layered {
    use component_macros::{advisable, aspect, Component};
    use infrastructure_common::{value, AdviceResult, Arguments, Invoker, JoinPoint};

    #[advisable(path = "app::layered::Greeter")]
    pub trait Greeter: Send + Sync {
        fn greet(&self, name: String) -> String;
    }

    #[derive(Default, Component)]
    #[component(advisable(dyn Greeter))]
    pub struct GreeterImpl;

    impl Greeter for GreeterImpl {
        fn greet(&self, name: String) -> String {
            format!("hello {}", name)
        }
    }

    #[derive(Default)]
    pub struct Decorations;

    #[aspect]
    impl Decorations {
        #[around(joinpoint = r"app::layered::Greeter\.greet")]
        fn brackets(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
            let text: String = invoker.proceed_as(args)?;
            Ok(value(format!("[{}]", text)))
        }

        #[around(joinpoint = "glob:*.greet")]
        fn upper(&self, _: &JoinPoint, mut args: Arguments, invoker: Invoker) -> AdviceResult {
            if let Some(name) = args.get_mut::<String>(0) {
                *name = name.to_uppercase();
            }
            invoker.proceed(args).map_err(Into::into)
        }
    }
}

mod hierarchy {
    use component_macros::{advisable, aspect, Component};
    use infrastructure_common::{value, AdviceResult, Arguments, Inject, Invoker, JoinPoint};

    #[advisable(path = "app::hierarchy::Base")]
    pub trait Base: Send + Sync {
        fn base_name(&self) -> String;
    }

    #[advisable(path = "app::hierarchy::Step")]
    pub trait Step: Base + Send + Sync {
        fn implem_name(&self) -> String;
    }

    #[derive(Default, Component)]
    #[component(advisable(dyn Step))]
    pub struct StepImpl;

    impl Base for StepImpl {
        fn base_name(&self) -> String {
            "base".to_string()
        }
    }

    impl Step for StepImpl {
        fn implem_name(&self) -> String {
            "step".to_string()
        }
    }

    #[derive(Default, Component)]
    pub struct Holder {
        pub base: Inject<dyn Base>,
    }

    #[derive(Default)]
    pub struct BaseAdvice;

    #[aspect]
    impl BaseAdvice {
        #[around(joinpoint = r"app::hierarchy::Base\.base_name")]
        fn mark(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
            let name: String = invoker.proceed_as(args)?;
            Ok(value(format!("advised => {}", name)))
        }
    }
}

mod broken {
    use component_macros::Component;
    use infrastructure_common::Inject;

    pub trait Missing: Send + Sync {}

    #[derive(Default, Component)]
    pub struct Orphan {
        pub missing: Inject<dyn Missing>,
    }
}

#[tokio::test]
async fn test_scan_and_intercept() {
    let context = ApplicationContext::builder()
        .scan(concat!(module_path!(), "::beans"))
        .build()
        .await
        .expect("装配应该成功");

    let root = context.get_bean::<beans::Root>().unwrap();
    let before = beans::INTERCEPTED.load(Ordering::SeqCst);
    assert_eq!(root.step_impl1.implem_name(), "interceptor => stepImpl1");
    assert!(beans::INTERCEPTED.load(Ordering::SeqCst) > before);

    assert_eq!(root.second.implem_name(), "stepImpl2");
    assert_eq!(root.rule.get_rule_name(), "interceptor2 => ruleImpl(stepImpl2)");

    let stats = context.stats();
    assert_eq!(stats.component_count, 4);
    assert_eq!(stats.interceptor_count, 2);
    assert_eq!(stats.proxied_count, 2);
}

#[tokio::test]
async fn test_get_bean_by_capability() {
    use beans::Step as _;

    let context = ApplicationContext::builder()
        .scan(concat!(module_path!(), "::beans"))
        .build()
        .await
        .unwrap();

    assert!(matches!(
        context.get_bean::<dyn beans::Step>(),
        Err(DependencyError::Ambiguous { .. })
    ));
    let step = context.get_bean_named::<dyn beans::Step>("STEPIMPL1").unwrap();
    assert_eq!(step.implem_name(), "interceptor => stepImpl1");

    // 具体类型查找得到原始实例
    let concrete = context.get_bean::<beans::StepImpl1>().unwrap();
    assert_eq!(concrete.implem_name(), "stepImpl1");
}

#[tokio::test]
async fn test_supertrait_hierarchy() {
    use hierarchy::{Base as _, Step as _};

    let context = ApplicationContext::builder()
        .scan(concat!(module_path!(), "::hierarchy"))
        .build()
        .await
        .unwrap();

    let base = context.get_bean::<dyn hierarchy::Base>().unwrap();
    assert_eq!(base.base_name(), "advised => base");

    // 父 trait 方法经子 trait 代理调用时同样被拦截
    let step = context.get_bean::<dyn hierarchy::Step>().unwrap();
    assert_eq!(step.implem_name(), "step");
    assert_eq!(step.base_name(), "advised => base");

    let holder = context.get_bean::<hierarchy::Holder>().unwrap();
    assert_eq!(holder.base.base_name(), "advised => base");
    assert_eq!(context.stats().proxied_count, 1);
}

#[tokio::test]
async fn test_inject_external_object() {
    let context = ApplicationContext::builder()
        .scan(concat!(module_path!(), "::beans"))
        .build()
        .await
        .unwrap();

    let handler = beans::Handler::default();
    context.inject(&handler).unwrap();
    assert_eq!(handler.rule.get_rule_name(), "interceptor2 => ruleImpl(stepImpl2)");
}

#[tokio::test]
async fn test_policies_on_layered_advices() {
    let namespace = concat!(module_path!(), "::layered");

    let first = ApplicationContext::builder().scan(namespace).build().await.unwrap();
    let greeter = first.get_bean::<dyn layered::Greeter>().unwrap();
    assert_eq!(first.policy(), InterceptorPolicy::First);
    assert_eq!(greeter.greet("lorn".to_string()), "[hello lorn]");

    let chain = ApplicationContext::builder()
        .scan(namespace)
        .interceptor_policy(InterceptorPolicy::Chain)
        .build()
        .await
        .unwrap();
    let greeter = chain.get_bean::<dyn layered::Greeter>().unwrap();
    assert_eq!(greeter.greet("lorn".to_string()), "[hello LORN]");
}

#[tokio::test]
async fn test_missing_dependency_aborts_assembly() {
    let result = ApplicationContext::builder()
        .scan(concat!(module_path!(), "::broken"))
        .build()
        .await;

    match result {
        Err(InfrastructureError::Dependency(DependencyError::NotFound { capability })) => {
            assert!(capability.contains("Missing"));
        }
        Err(other) => panic!("期望 NotFound, 实际 {}", other),
        Ok(_) => panic!("缺少依赖时装配不应成功"),
    }
}
