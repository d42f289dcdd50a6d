mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{labels, scenario, Probe};
use maint_core::step::StepDefinition;
use maint_core::{EngineError, Executable};
use proptest::prelude::*;
use serde_json::json;

fn build(label: &'static str, target: &str) -> Executable {
    Executable::from_json(Probe::check(label), json!({ "target": target })).unwrap()
}

#[test]
fn same_kind_and_options_are_interchangeable() {
    let a = build("disk_io", "/var");
    let b = build("disk_io", "/var");
    assert_eq!(a, b);
    assert_eq!(a.fingerprint(), b.fingerprint());

    let set: HashSet<Executable> = [a, b, build("disk_io", "/tmp"), build("db_up", "/var")].into_iter().collect();
    assert_eq!(set.len(), 3);
}

#[test]
fn bare_kind_equals_instance_with_empty_options() {
    let definition: Arc<dyn StepDefinition> = Arc::new(Probe::check("disk_io"));
    let from_kind = Executable::with_defaults(Arc::clone(&definition)).unwrap();
    let from_json = Executable::from_json(Probe::check("disk_io"), json!({})).unwrap();
    assert_eq!(from_kind, from_json);
}

#[test]
fn options_must_be_an_object() {
    let err = Executable::from_json(Probe::check("disk_io"), json!(["x"])).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOptions { .. }));
}

#[test]
fn overlapping_prerequisites_are_deduplicated_in_first_seen_order() {
    let shared = Probe::procedure("install_tools");
    let s = scenario("upgrade",
                     |m| m,
                     vec![Probe::check("a").requires(shared.clone()).requires(Probe::procedure("stop_cron")),
                          Probe::check("b").requires(Probe::procedure("stop_cron")).requires(shared),
                          Probe::check("c")]);
    let prep = s.preparation_steps().unwrap();
    assert_eq!(labels(&prep), vec!["install_tools", "stop_cron"]);
}

#[test]
fn scenario_level_prerequisites_come_first() {
    let mut s = scenario("upgrade", |m| m, vec![Probe::check("a").requires(Probe::procedure("stop_cron"))]);
    s.add_preparation_step(Probe::procedure("stop_cron").step());
    s.add_preparation_step(Probe::procedure("backup").step());
    assert_eq!(labels(&s.preparation_steps().unwrap()), vec!["stop_cron", "backup"]);
}

const KINDS: [&str; 3] = ["disk_io", "db_up", "proxy_up"];

proptest! {
    #[test]
    fn equality_tracks_kind_and_options(k1 in 0usize..3, k2 in 0usize..3, t1 in "[a-c]{0,2}", t2 in "[a-c]{0,2}") {
        let a = build(KINDS[k1], &t1);
        let b = build(KINDS[k2], &t2);
        prop_assert_eq!(a == b, k1 == k2 && t1 == t2);
        prop_assert_eq!(a.fingerprint() == b.fingerprint(), k1 == k2 && t1 == t2);
    }

    #[test]
    fn preparation_never_contains_duplicates(picks in proptest::collection::vec((0usize..3, 0usize..3), 1..6)) {
        let prereq = ["install_tools", "stop_cron", "backup"];
        let steps: Vec<Probe> = picks.iter()
                                     .enumerate()
                                     .map(|(i, (p1, p2))| {
                                         let label: &'static str = Box::leak(format!("check_{i}").into_boxed_str());
                                         Probe::check(label).requires(Probe::procedure(prereq[*p1]))
                                                            .requires(Probe::procedure(prereq[*p2]))
                                     })
                                     .collect();
        let s = scenario("generated", |m| m, steps);
        let prep = s.preparation_steps().unwrap();
        let unique: HashSet<&Executable> = prep.iter().collect();
        prop_assert_eq!(unique.len(), prep.len());
        let expected: HashSet<usize> = picks.iter().flat_map(|(a, b)| [*a, *b]).collect();
        prop_assert_eq!(prep.len(), expected.len());
    }
}
