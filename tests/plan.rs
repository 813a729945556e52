//! Execution plans: building, persisting and re-running.
mod common;
use common::*;
use nagare::prelude::*;
use std::fs;

#[test]
fn test_plan_contains_schedule_and_fingerprint() {
    let engine = test_engine();
    let plan = engine.plan(&arithmetic_chain()).unwrap();

    assert_eq!(plan.registry_fingerprint(), engine.registry().fingerprint());
    assert_eq!(plan.schedule().len(), 6);
    assert_eq!(plan.schedule().layers()[0], vec!["n1", "n2", "n3"]);
}

#[test]
fn test_invalid_request_cannot_be_planned() {
    let engine = test_engine();
    match engine.plan(&triangle_cycle()) {
        Err(EngineError::Plan(PlanError::InvalidPipeline(count))) => assert_eq!(count, 1),
        other => panic!("expected InvalidPipeline, got {:?}", other),
    }
}

#[test]
fn test_plan_bytes_round_trip() {
    let engine = test_engine();
    let plan = engine.plan(&diamond("fail")).unwrap();
    let bytes = plan.to_bytes().unwrap();
    let restored = ExecutionPlan::from_bytes(&bytes).unwrap();
    assert_eq!(restored, plan);
}

#[test]
fn test_corrupt_plan_is_rejected() {
    assert!(matches!(
        ExecutionPlan::from_bytes(&[0xff, 0x00, 0x13]),
        Err(PlanError::Generic(_))
    ));
}

#[test]
fn test_plan_file_round_trip() {
    let engine = test_engine();
    let plan = engine.plan(&arithmetic_chain()).unwrap();

    let path = std::env::temp_dir().join(format!("nagare-plan-{}.bin", std::process::id()));
    let path_str = path.to_str().unwrap();
    plan.save(path_str).unwrap();
    let loaded = ExecutionPlan::from_file(path_str).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(loaded, plan);
    assert!(matches!(
        ExecutionPlan::from_file("/definitely/not/here.plan"),
        Err(PlanError::Generic(_))
    ));
}

#[tokio::test]
async fn test_executing_a_plan_matches_a_direct_run() {
    let engine = test_engine();
    for request in [arithmetic_chain(), diamond("fail")] {
        let plan = engine.plan(&request).unwrap();
        let planned = engine.execute_plan(&plan).await.unwrap();
        let direct = engine.run(&request).await.unwrap();
        assert_eq!(planned, direct);
    }
}

#[tokio::test]
async fn test_plan_from_another_registry_is_refused() {
    let planner = test_engine();
    let plan = planner.plan(&arithmetic_chain()).unwrap();

    let builtin_only = TypeRegistry::builder().with_builtin_kinds().build().unwrap();
    let runner = Engine::new(Arc::new(builtin_only));
    match runner.execute_plan(&plan).await {
        Err(EngineError::Plan(PlanError::RegistryMismatch { expected, found })) => {
            assert_eq!(expected, planner.registry().fingerprint());
            assert_eq!(found, runner.registry().fingerprint());
        }
        other => panic!("expected RegistryMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plan_with_swapped_request_is_refused() {
    let engine = test_engine();
    let single = engine
        .plan(&PipelineRequest::new(vec![number("n1", 1.0)], vec![]))
        .unwrap();

    let swapped = ExecutionPlan::new(
        arithmetic_chain(),
        single.schedule().clone(),
        single.registry_fingerprint(),
    );
    match engine.execute_plan(&swapped).await {
        Err(EngineError::Plan(PlanError::ScheduleMismatch(message))) => {
            assert!(message.contains("never scheduled"), "{}", message);
        }
        other => panic!("expected ScheduleMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plan_with_cyclic_request_is_refused() {
    let engine = test_engine();
    let planned = engine.plan(&arithmetic_chain()).unwrap();

    let cyclic = ExecutionPlan::new(
        triangle_cycle(),
        planned.schedule().clone(),
        planned.registry_fingerprint(),
    );
    match engine.execute_plan(&cyclic).await {
        Err(EngineError::Plan(PlanError::InvalidPipeline(count))) => assert_eq!(count, 1),
        other => panic!("expected InvalidPipeline, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plan_schedule_against_reversed_edges_is_refused() {
    let engine = test_engine();
    let forward = PipelineRequest::new(
        vec![node("a", "pass"), node("b", "pass")],
        vec![edge("e1", "a", "value", "b", "value")],
    );
    let backward = PipelineRequest::new(
        vec![node("a", "pass"), node("b", "pass")],
        vec![edge("e1", "b", "value", "a", "value")],
    );
    let planned = engine.plan(&forward).unwrap();

    let reversed = ExecutionPlan::new(
        backward,
        planned.schedule().clone(),
        planned.registry_fingerprint(),
    );
    match engine.execute_plan(&reversed).await {
        Err(EngineError::Plan(PlanError::ScheduleMismatch(message))) => {
            assert_eq!(message, "edge 'e1' runs from layer 1 to layer 0");
        }
        other => panic!("expected ScheduleMismatch, got {:?}", other),
    }
}

#[test]
fn test_schedule_check_against_own_graph() {
    let registry = test_registry();
    let request = diamond("pass");
    let (graph, _) = nagare::graph::GraphBuilder::new(&registry).build(&request);
    let schedule = Scheduler::schedule(&graph).unwrap();
    assert!(schedule.check_against(&graph).is_ok());

    let (other, _) = nagare::graph::GraphBuilder::new(&registry).build(&arithmetic_chain());
    assert!(matches!(
        schedule.check_against(&other),
        Err(PlanError::ScheduleMismatch(_))
    ));
}
