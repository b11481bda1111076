//! 示例组件与通知

use component_macros::{advisable, aspect, Component, Injectable};
use infrastructure_common::{value, AdviceResult, Arguments, Inject, Invoker, JoinPoint};
use std::time::Instant;
use tracing::info;

#[advisable]
pub trait Step: Send + Sync {
    fn implem_name(&self) -> String;
}

#[advisable]
pub trait Rule: Send + Sync {
    fn get_rule_name(&self) -> String;
    fn score(&self, base: u32) -> u32;
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
        format!("ruleImpl -> {}", self.step_impl2.implem_name())
    }

    fn score(&self, base: u32) -> u32 {
        base * 10
    }
}

#[derive(Default, Component)]
pub struct Root {
    pub step_impl1: Inject<dyn Step>,
    pub step_impl2: Inject<dyn Step>,
    pub rule: Inject<dyn Rule>,
}

/// 不受上下文管理的对象, 装配完成后通过 `inject` 注入
#[derive(Default, Injectable)]
pub struct ReportJob {
    pub rule: Inject<dyn Rule>,
}

#[derive(Default)]
pub struct Advice1;

#[aspect]
impl Advice1 {
    #[around(joinpoint = r".*StepImpl1\.implem_name")]
    fn intercept1(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        let name: String = invoker.proceed_as(args)?;
        Ok(value(format!("interceptor => {}", name)))
    }

    #[around(joinpoint = r".*Rule\.get_rule_name")]
    fn intercept2(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        let name: String = invoker.proceed_as(args)?;
        Ok(value(format!("interceptor2 => {}", name)))
    }
}

#[derive(Default)]
pub struct Timing;

#[aspect]
impl Timing {
    #[around(joinpoint = "glob:*Rule.*")]
    fn measure(&self, jp: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        let started = Instant::now();
        let result = invoker.proceed(args)?;
        info!("{} 耗时 {:?}", jp.path(), started.elapsed());
        Ok(result)
    }
}
