//! Graph building, structural validation and type validation.
mod common;
use common::*;
use nagare::graph::GraphBuilder;
use nagare::prelude::*;
use nagare::validation::{StructuralValidator, TypeValidator, validate_request};

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_empty_graph_is_valid() {
        let engine = test_engine();
        let response = engine.check(&PipelineRequest::default());
        assert_eq!(response.status, PipelineStatus::Valid);
        assert!(response.errors.is_empty());
        assert!(response.results.is_none());
    }

    #[test]
    fn test_two_unconnected_nodes_are_valid() {
        let engine = test_engine();
        let request = PipelineRequest::new(vec![number("a", 1.0), number("b", 2.0)], vec![]);
        assert!(engine.validate(&request).is_valid);
    }

    #[test]
    fn test_unknown_kind_and_duplicate_id_are_batched() {
        let registry = test_registry();
        let request = PipelineRequest::new(
            vec![
                node("a", "teleport"),
                number("b", 1.0),
                number("b", 2.0),
                node("c", "warp"),
            ],
            vec![],
        );
        let (graph, errors) = GraphBuilder::new(&registry).build(&request);

        assert_eq!(graph.len(), 3);
        let kinds: Vec<ErrorKind> = errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::UnknownNodeKind,
                ErrorKind::DuplicateId,
                ErrorKind::UnknownNodeKind
            ]
        );
        assert_eq!(errors[0].node_id.as_deref(), Some("a"));
        assert_eq!(errors[1].node_id.as_deref(), Some("b"));
        assert_eq!(errors[2].node_id.as_deref(), Some("c"));

        // The first node with a colliding id wins.
        assert_eq!(graph.node_by_id("b").unwrap().data["value"], 1.0);
    }

    #[test]
    fn test_duplicate_and_empty_edge_ids() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("n", 1.0), node("o1", "output"), node("o2", "output")],
            vec![
                edge("e1", "n", "value", "o1", "value"),
                edge("e1", "n", "value", "o2", "value"),
            ],
        );
        let result = engine.validate(&request);
        assert_eq!(result.count(ErrorKind::DuplicateId), 1);
        assert_eq!(result.errors[0].edge_id.as_deref(), Some("e1"));

        let request = PipelineRequest::new(
            vec![number("n", 1.0), node("o", "output")],
            vec![edge("", "n", "value", "o", "value")],
        );
        let result = engine.validate(&request);
        assert_eq!(result.count(ErrorKind::DuplicateId), 1);
    }

    #[test]
    fn test_dangling_edges() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("n", 1.0), number("m", 2.0), node("o", "output")],
            vec![
                edge("to_nowhere", "n", "value", "ghost", "value"),
                edge("bad_handle", "n", "nope", "o", "value"),
                edge("backwards", "n", "value", "m", "value"),
            ],
        );
        let result = engine.validate(&request);
        let dangling: Vec<&ValidationError> = result
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::DanglingEdge)
            .collect();

        assert_eq!(dangling.len(), 3);
        assert_eq!(dangling[0].edge_id.as_deref(), Some("to_nowhere"));
        assert!(dangling[0].message.contains("ghost"));
        assert_eq!(dangling[1].edge_id.as_deref(), Some("bad_handle"));
        assert!(dangling[1].message.contains("'nope'"));
        // `m` is a number node: `value` is its output, not an input.
        assert_eq!(dangling[2].edge_id.as_deref(), Some("backwards"));
        assert_eq!(dangling[2].node_id.as_deref(), Some("m"));
        assert!(dangling[2].message.contains("is not an input"));

        // Type checking is skipped while edges dangle.
        assert!(!result.has(ErrorKind::TypeMismatch));
    }

    #[test]
    fn test_multiple_edges_on_one_input() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("x", 1.0), number("y", 2.0), node("sum", "add")],
            vec![
                edge("e1", "x", "value", "sum", "a"),
                edge("e2", "y", "value", "sum", "a"),
            ],
        );
        let result = engine.validate(&request);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::MultipleEdgesOnInput);
        assert_eq!(error.node_id.as_deref(), Some("sum"));
        assert_eq!(error.edge_id.as_deref(), Some("e2"));
        assert!(error.message.contains("e1, e2"));
    }

    #[test]
    fn test_one_output_may_feed_many_inputs() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("x", 1.0), node("o1", "output"), node("o2", "output")],
            vec![
                edge("e1", "x", "value", "o1", "value"),
                edge("e2", "x", "value", "o2", "value"),
            ],
        );
        assert!(engine.validate(&request).is_valid);
    }

    #[test]
    fn test_missing_required_input_names_node_and_handle() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("x", 1.0), node("sum", "add"), node("o", "output")],
            vec![edge("e1", "x", "value", "o", "value")],
        );
        let result = engine.validate(&request);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::MissingRequiredInput);
        assert_eq!(error.node_id.as_deref(), Some("sum"));
        assert!(error.message.contains("'a'"));
        // The optional `b` is never reported.
        assert!(!error.message.contains("'b'"));
    }

    #[test]
    fn test_cycle_reported_once_with_all_nodes() {
        let engine = test_engine();
        let result = engine.validate(&triangle_cycle());

        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::CycleDetected);
        assert_eq!(
            error.message,
            "Cycle detected through nodes [A, B, C]: A -> B -> C -> A"
        );
        assert_eq!(error.node_id.as_deref(), Some("A"));
        assert_eq!(error.edge_id.as_deref(), Some("e3"));
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![node("solo", "pass")],
            vec![edge("loop", "solo", "value", "solo", "value")],
        );
        let result = engine.validate(&request);
        assert_eq!(result.count(ErrorKind::CycleDetected), 1);
        assert!(result.errors[0].message.contains("solo -> solo"));
    }

    #[test]
    fn test_disjoint_cycles_are_each_reported() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![
                node("a", "pass"),
                node("b", "pass"),
                node("c", "pass"),
                node("d", "pass"),
            ],
            vec![
                edge("e1", "a", "value", "b", "value"),
                edge("e2", "b", "value", "a", "value"),
                edge("e3", "c", "value", "d", "value"),
                edge("e4", "d", "value", "c", "value"),
            ],
        );
        assert_eq!(engine.validate(&request).count(ErrorKind::CycleDetected), 2);
    }

    #[test]
    fn test_type_mismatch_exactly_once() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("n", 5.0), node("c", "concat")],
            vec![edge("bad", "n", "value", "c", "a")],
        );
        let result = engine.validate(&request);
        assert_eq!(result.errors.len(), 1);
        let error = &result.errors[0];
        assert_eq!(error.kind, ErrorKind::TypeMismatch);
        assert_eq!(error.edge_id.as_deref(), Some("bad"));
        assert_eq!(error.node_id.as_deref(), Some("c"));
        assert!(error.message.contains("(number)"));
        assert!(error.message.contains("(string)"));
    }

    #[test]
    fn test_any_is_compatible_both_ways() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![number("n", 5.0), node("p", "pass"), node("c", "concat")],
            vec![
                edge("e1", "n", "value", "p", "value"),
                edge("e2", "p", "value", "c", "a"),
            ],
        );
        assert!(engine.validate(&request).is_valid);
    }

    #[test]
    fn test_validators_run_independently() {
        let registry = test_registry();
        let request = PipelineRequest::new(
            vec![number("n", 5.0), node("c", "concat")],
            vec![edge("bad", "n", "value", "c", "a")],
        );
        let (graph, errors) = GraphBuilder::new(&registry).build(&request);
        assert!(errors.is_empty());
        assert!(StructuralValidator::new(&graph).validate().is_empty());
        assert_eq!(TypeValidator::new(&graph).validate().len(), 1);
    }

    #[test]
    fn test_findings_are_batched_across_passes() {
        let engine = test_engine();
        let request = PipelineRequest::new(
            vec![
                node("mystery", "teleport"),
                node("sum", "add"),
                node("A", "pass"),
                node("B", "pass"),
            ],
            vec![
                edge("e1", "A", "value", "B", "value"),
                edge("e2", "B", "value", "A", "value"),
            ],
        );
        let result = engine.validate(&request);
        let kinds: Vec<ErrorKind> = result.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::UnknownNodeKind,
                ErrorKind::MissingRequiredInput,
                ErrorKind::CycleDetected
            ]
        );
    }

    #[test]
    fn test_validation_is_deterministic_and_idempotent() {
        let registry = test_registry();
        let request = PipelineRequest::new(
            vec![
                node("sum", "add"),
                number("n", 1.0),
                node("c", "concat"),
                node("x", "nothing"),
            ],
            vec![
                edge("e1", "n", "value", "c", "a"),
                edge("e2", "n", "value", "ghost", "a"),
            ],
        );
        let (_, first) = validate_request(&registry, &request);
        for _ in 0..5 {
            let (_, again) = validate_request(&registry, &request);
            assert_eq!(again, first);
        }

        let valid = arithmetic_chain();
        let (_, once) = validate_request(&registry, &valid);
        let (_, twice) = validate_request(&registry, &valid);
        assert!(once.is_valid && twice.is_valid);
    }

    #[test]
    fn test_analysis_reports_stats() {
        let engine = test_engine();
        let analysis = engine.analyze(&diamond("fail"));
        assert!(analysis.is_dag);
        assert_eq!(analysis.response.status, PipelineStatus::Valid);
        assert_eq!(analysis.stats.node_count, 4);
        assert_eq!(analysis.stats.edge_count, 4);
        assert_eq!(analysis.stats.max_in_degree, 2);
        assert_eq!(analysis.stats.max_out_degree, 2);
        assert_eq!(analysis.stats.isolated_nodes, 0);

        let cyclic = engine.analyze(&triangle_cycle());
        assert!(!cyclic.is_dag);
        assert_eq!(cyclic.response.status, PipelineStatus::Invalid);
    }
}
