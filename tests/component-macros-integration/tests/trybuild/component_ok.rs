use component_macros::{advisable, aspect, Component, Injectable};
use infrastructure_common::{
    value, AdviceResult, Advisable, Arguments, Aspect, Component, Inject, Injectable, Invoker,
    JoinPoint,
};

#[advisable]
pub trait Greeter: Send + Sync {
    fn greet(&self, name: String) -> String;
    fn reset(&self);
}

#[derive(Default, Component)]
#[component(advisable(dyn Greeter))]
pub struct GreeterImpl;

impl Greeter for GreeterImpl {
    fn greet(&self, name: String) -> String {
        format!("hello {}", name)
    }

    fn reset(&self) {}
}

#[derive(Default, Injectable)]
pub struct Client {
    greeter: Inject<dyn Greeter>,
}

#[derive(Default)]
pub struct Shout;

#[aspect]
impl Shout {
    #[around(joinpoint = ".*greet")]
    fn shout(&self, _: &JoinPoint, args: Arguments, invoker: Invoker) -> AdviceResult {
        let text: String = invoker.proceed_as(args)?;
        Ok(value(text.to_uppercase()))
    }
}

fn main() {
    assert_eq!(<dyn Greeter as Advisable>::methods(), &["greet", "reset"]);
    assert_eq!(GreeterImpl::descriptor().capabilities().len(), 1);
    assert_eq!(Client::dependency_slots()[0].name, "greeter");
    assert!(!Client::default().greeter.is_injected());
    assert_eq!(Shout::advice_descriptor().arounds().len(), 1);
}
