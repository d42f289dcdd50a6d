#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use maint_core::param::Param;
use maint_core::step::{StepContext, StepDefinition, StepInterrupt, StepKind, StepMetadata, StepRef, StepResult};
use maint_core::{ParamValues, Scenario, ScenarioMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail,
    Warn,
    Fault,
}

/// Step configurable para tests. `kind_id` es el label, así que dos probes
/// con distinto label son tipos distintos.
#[derive(Debug, Clone)]
pub struct Probe {
    pub label: &'static str,
    pub kind: StepKind,
    pub outcome: Outcome,
    pub necessary: bool,
    pub needed: Option<Arc<AtomicBool>>,
    pub prerequisites: Vec<Probe>,
    pub next: Vec<Probe>,
    /// Si está presente el step sólo pasa cuando la bandera es `true`.
    pub gate: Option<Arc<AtomicBool>>,
    /// Bandera que el step pone en `true` al correr.
    pub sets: Option<Arc<AtomicBool>>,
}

impl Probe {
    pub fn check(label: &'static str) -> Self {
        Self { label,
               kind: StepKind::Check,
               outcome: Outcome::Pass,
               necessary: true,
               needed: None,
               prerequisites: Vec::new(),
               next: Vec::new(),
               gate: None,
               sets: None }
    }

    pub fn procedure(label: &'static str) -> Self {
        Self { kind: StepKind::Procedure,
               ..Self::check(label) }
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn unnecessary(mut self) -> Self {
        self.necessary = false;
        self
    }

    pub fn needed_when(mut self, flag: &Arc<AtomicBool>) -> Self {
        self.needed = Some(Arc::clone(flag));
        self
    }

    pub fn requires(mut self, prerequisite: Probe) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    pub fn offers(mut self, next: Probe) -> Self {
        self.next.push(next);
        self
    }

    pub fn gated_by(mut self, flag: &Arc<AtomicBool>) -> Self {
        self.gate = Some(Arc::clone(flag));
        self
    }

    pub fn sets(mut self, flag: &Arc<AtomicBool>) -> Self {
        self.sets = Some(Arc::clone(flag));
        self
    }

    pub fn step(self) -> StepRef {
        StepRef::kind(self)
    }
}

impl StepDefinition for Probe {
    fn metadata(&self) -> StepMetadata {
        let description = format!("{} step", self.label);
        match self.kind {
            StepKind::Check => StepMetadata::check(self.label, description),
            StepKind::Procedure => StepMetadata::procedure(self.label, description),
        }
    }

    fn params(&self) -> Vec<Param> {
        vec![Param::string("target")]
    }

    fn necessary(&self, _params: &ParamValues) -> bool {
        match &self.needed {
            Some(flag) => flag.load(Ordering::SeqCst),
            None => self.necessary,
        }
    }

    fn preparation_steps(&self, _params: &ParamValues) -> Vec<StepRef> {
        self.prerequisites.iter().cloned().map(Probe::step).collect()
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> StepResult {
        ctx.say(format!("running {}", self.label));
        if let Some(flag) = &self.sets {
            flag.store(true, Ordering::SeqCst);
        }
        for next in &self.next {
            ctx.add_next_step(next.clone().step());
        }
        if let Some(gate) = &self.gate {
            if !gate.load(Ordering::SeqCst) {
                return Err(StepInterrupt::fail(format!("{} gate closed", self.label)));
            }
            return Ok(());
        }
        match self.outcome {
            Outcome::Pass => Ok(()),
            Outcome::Fail => Err(StepInterrupt::fail(format!("{} failed", self.label))),
            Outcome::Warn => Err(StepInterrupt::warn(format!("{} warned", self.label))),
            Outcome::Fault => Err(StepInterrupt::fault(format!("{} crashed", self.label))),
        }
    }

    fn kind_id(&self) -> &'static str {
        self.label
    }
}

pub fn scenario(label: &str, metadata: impl FnOnce(ScenarioMetadata) -> ScenarioMetadata, steps: Vec<Probe>) -> Scenario {
    let mut scenario = Scenario::new(metadata(ScenarioMetadata::new(label, format!("{label} scenario"))));
    scenario.add_steps(steps.into_iter().map(Probe::step)).expect("probe steps build");
    scenario
}

pub fn labels<'a, I>(steps: I) -> Vec<&'a str>
    where I: IntoIterator<Item = &'a maint_core::Executable>
{
    steps.into_iter().map(maint_core::Executable::label).collect()
}

pub fn flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}
