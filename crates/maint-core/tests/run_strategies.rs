mod common;

use common::{labels, scenario, Outcome, Probe};
use maint_core::{LogReporter, RunStrategy, Runner, RunnerConfig, ScenarioState};

fn abc(strategy: RunStrategy) -> maint_core::Scenario {
    scenario("abc",
             |m| m.run_strategy(strategy),
             vec![Probe::check("a"), Probe::check("b").outcome(Outcome::Fail), Probe::check("c")])
}

#[test]
fn fail_fast_stops_at_first_failure() {
    let mut s = abc(RunStrategy::FailFast);
    let mut runner = Runner::in_memory(LogReporter::new());
    let summary = runner.run(std::slice::from_mut(&mut s)).unwrap();

    assert_eq!(labels(s.executed_steps()), vec!["a", "b"]);
    assert_eq!(labels(s.steps_with_error(None)), vec!["b"]);
    assert_eq!(s.state(), ScenarioState::Stopped);
    assert!(s.failed());
    assert!(!summary.passed);
    assert_eq!(summary.exit_code, 1);
}

#[test]
fn fail_slow_runs_everything_but_blocks_next_scenario() {
    let mut scenarios = vec![abc(RunStrategy::FailSlow),
                             scenario("after", |m| m, vec![Probe::check("d")])];
    let mut runner = Runner::in_memory(LogReporter::new());
    let summary = runner.run(&mut scenarios).unwrap();

    assert_eq!(labels(scenarios[0].executed_steps()), vec!["a", "b", "c"]);
    assert_eq!(scenarios[0].state(), ScenarioState::Completed);
    assert!(scenarios[0].failed());
    assert_eq!(scenarios[1].state(), ScenarioState::NotStarted);
    assert!(scenarios[1].executed_steps().is_empty());
    assert!(summary.quit);
    assert_eq!(summary.skipped_scenarios, vec!["after"]);
}

#[test]
fn whitelisting_flips_aggregate_without_touching_status() {
    let mut s = abc(RunStrategy::FailSlow);
    let mut runner = Runner::in_memory(LogReporter::new());
    runner.run_scenario(&mut s).unwrap();
    assert!(s.failed());

    assert_eq!(s.whitelist("b").unwrap(), 1);
    assert!(s.passed());
    assert!(s.steps_with_error(Some(false)).is_empty());
    assert_eq!(labels(s.steps_with_error(Some(true))), vec!["b"]);
    assert_eq!(labels(s.steps_with_error(None)), vec!["b"]);
    assert!(s.steps()[1].fail());
}

#[test]
fn configured_whitelist_does_not_stop_fail_fast() {
    let mut scenarios = vec![abc(RunStrategy::FailFast), scenario("after", |m| m, vec![Probe::check("d")])];
    let config = RunnerConfig::default().with_whitelist(["b"]);
    let mut runner = Runner::in_memory(LogReporter::new()).with_config(config);
    let summary = runner.run(&mut scenarios).unwrap();

    assert_eq!(labels(scenarios[0].executed_steps()), vec!["a", "b", "c"]);
    assert!(scenarios[0].steps()[1].whitelisted());
    assert!(scenarios[0].passed());
    assert_eq!(scenarios[1].state(), ScenarioState::Completed);
    assert!(summary.passed);
    assert_eq!(summary.exit_code, 0);
}

#[test]
fn warnings_ask_before_next_scenario() {
    let build = || {
        vec![scenario("warns", |m| m, vec![Probe::check("a").outcome(Outcome::Warn), Probe::check("b")]),
             scenario("after", |m| m, vec![Probe::check("d")])]
    };

    let mut declined = build();
    let mut runner = Runner::in_memory(LogReporter::new().plan_input(["n"]));
    let summary = runner.run(&mut declined).unwrap();
    assert_eq!(labels(declined[0].executed_steps()), vec!["a", "b"]);
    assert!(runner.reporter().output.contains("Continue with [after scenario], [y(yes), n(no), q(quit)]"));
    assert_eq!(declined[1].state(), ScenarioState::NotStarted);
    assert_eq!(summary.skipped_scenarios, vec!["after"]);

    let mut accepted = build();
    let mut runner = Runner::in_memory(LogReporter::new().plan_input(["y"]));
    runner.run(&mut accepted).unwrap();
    assert_eq!(accepted[1].state(), ScenarioState::Completed);

    let mut assumed = build();
    let mut runner = Runner::in_memory(LogReporter::new()).with_config(RunnerConfig::default().with_assumeyes(true));
    runner.run(&mut assumed).unwrap();
    assert_eq!(assumed[1].state(), ScenarioState::Completed);
    assert!(runner.reporter().calls().iter().all(|c| *c != "ask"));
}

#[test]
fn same_answers_give_same_outcomes() {
    let outcomes = || {
        let mut scenarios = vec![abc(RunStrategy::FailSlow)];
        let mut runner = Runner::in_memory(LogReporter::new());
        let summary = runner.run(&mut scenarios).unwrap();
        let statuses: Vec<_> = scenarios[0].steps().iter().map(|s| s.status()).collect();
        (statuses, summary.passed, runner.reporter().calls().len())
    };
    assert_eq!(outcomes(), outcomes());
}
