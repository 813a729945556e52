//! Common test utilities for building registries and pipeline requests.
use nagare::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;

type ComputeResult = std::result::Result<PortValues, ComputeError>;

fn pass_through(invocation: &Invocation) -> ComputeResult {
    let value = invocation.input("value").cloned().unwrap_or(Value::Null);
    Ok(PortValues::from([("value".to_string(), value)]))
}

fn always_fail(_: &Invocation) -> ComputeResult {
    Err(ComputeError::Failed("boom".to_string()))
}

fn always_panic(_: &Invocation) -> ComputeResult {
    panic!("kaboom");
}

/// Sleeps for `data.ms` milliseconds, then forwards its input.
fn sleepy(invocation: &Invocation) -> ComputeResult {
    let ms = invocation
        .data_field("ms")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    std::thread::sleep(Duration::from_millis(ms));
    pass_through(invocation)
}

fn forgetful(_: &Invocation) -> ComputeResult {
    Ok(PortValues::new())
}

fn chatty(_: &Invocation) -> ComputeResult {
    Ok(PortValues::from([
        ("value".to_string(), json!(1)),
        ("extra".to_string(), json!("dropped")),
    ]))
}

fn any_in_any_out(kind: &str) -> NodeMetadata {
    NodeMetadata::new(kind)
        .with_input(HandleDefinition::optional("value", DataType::any()))
        .with_output(HandleDefinition::output("value", DataType::any()))
}

/// Built-in kinds plus a handful of misbehaving ones.
///
/// - `pass`: optional `value: any` in, `value: any` out
/// - `fail`: like `pass`, but always returns an error
/// - `explode`: like `pass`, but panics
/// - `sleep`: like `pass`, after sleeping `data.ms` milliseconds
/// - `forgetful`: declares `value: number` out, produces nothing
/// - `chatty`: declares `value: number` out, also produces an undeclared `extra`
#[allow(dead_code)]
pub fn test_registry_builder() -> RegistryBuilder {
    TypeRegistry::builder()
        .with_builtin_kinds()
        .register(any_in_any_out("pass"), pass_through)
        .register(any_in_any_out("fail"), always_fail)
        .register(any_in_any_out("explode"), always_panic)
        .register(any_in_any_out("sleep"), sleepy)
        .register(
            NodeMetadata::new("forgetful")
                .with_output(HandleDefinition::output("value", DataType::number())),
            forgetful,
        )
        .register(
            NodeMetadata::new("chatty")
                .with_output(HandleDefinition::output("value", DataType::number())),
            chatty,
        )
}

#[allow(dead_code)]
pub fn test_registry() -> Arc<TypeRegistry> {
    Arc::new(
        test_registry_builder()
            .build()
            .expect("test registry should build"),
    )
}

#[allow(dead_code)]
pub fn test_engine() -> Engine {
    Engine::new(test_registry())
}

#[allow(dead_code)]
pub fn node(id: &str, kind: &str) -> NodeRecord {
    NodeRecord::new(id, kind)
}

#[allow(dead_code)]
pub fn number(id: &str, value: f64) -> NodeRecord {
    NodeRecord::new(id, "number").with_data(json!({ "value": value }))
}

#[allow(dead_code)]
pub fn edge(id: &str, source: &str, source_handle: &str, target: &str, target_handle: &str) -> EdgeRecord {
    EdgeRecord::new(
        id,
        HandleRef::new(source, source_handle),
        HandleRef::new(target, target_handle),
    )
}

/// Diamond `A -> B`, `A -> C`, `B -> D`, `C -> D` where `B` is of kind `b_kind`.
///
/// `A` is a number, `C` converts it to text and `D` concatenates `B` and `C`.
#[allow(dead_code)]
pub fn diamond(b_kind: &str) -> PipelineRequest {
    PipelineRequest::new(
        vec![
            number("A", 2.0),
            node("B", b_kind),
            node("C", "toText"),
            node("D", "concat").with_data(json!({ "separator": "+" })),
        ],
        vec![
            edge("e1", "A", "value", "B", "value"),
            edge("e2", "A", "value", "C", "value"),
            edge("e3", "B", "value", "D", "a"),
            edge("e4", "C", "text", "D", "b"),
        ],
    )
}

/// Three `pass` nodes wired `A -> B -> C -> A`.
#[allow(dead_code)]
pub fn triangle_cycle() -> PipelineRequest {
    PipelineRequest::new(
        vec![node("A", "pass"), node("B", "pass"), node("C", "pass")],
        vec![
            edge("e1", "A", "value", "B", "value"),
            edge("e2", "B", "value", "C", "value"),
            edge("e3", "C", "value", "A", "value"),
        ],
    )
}

/// `(n1 + n2) * n3` rendered through an `output` sink.
#[allow(dead_code)]
pub fn arithmetic_chain() -> PipelineRequest {
    PipelineRequest::new(
        vec![
            number("n1", 2.0),
            number("n2", 3.0),
            number("n3", 4.0),
            node("sum", "add"),
            node("product", "multiply"),
            node("out", "output"),
        ],
        vec![
            edge("e1", "n1", "value", "sum", "a"),
            edge("e2", "n2", "value", "sum", "b"),
            edge("e3", "sum", "result", "product", "a"),
            edge("e4", "n3", "value", "product", "b"),
            edge("e5", "product", "result", "out", "value"),
        ],
    )
}

/// A small request in the native wire format.
#[allow(dead_code)]
pub const SIMPLE_REQUEST_JSON: &str = r#"{
  "nodes": [
    { "id": "greeting", "kind": "text", "data": { "value": "hello" } },
    { "id": "name", "kind": "text", "data": { "value": "world" } },
    { "id": "joined", "kind": "concat", "data": { "separator": ", " } },
    { "id": "sink", "kind": "output" }
  ],
  "edges": [
    { "id": "e1", "source": { "nodeId": "greeting", "handle": "value" }, "target": { "nodeId": "joined", "handle": "a" } },
    { "id": "e2", "source": { "nodeId": "name", "handle": "value" }, "target": { "nodeId": "joined", "handle": "b" } },
    { "id": "e3", "source": { "nodeId": "joined", "handle": "text" }, "target": { "nodeId": "sink", "handle": "value" } }
  ]
}"#;

/// The same pipeline as `SIMPLE_REQUEST_JSON`, exported by the editor canvas.
#[allow(dead_code)]
pub const SIMPLE_CANVAS_JSON: &str = r#"{
  "nodes": [
    { "id": "greeting", "type": "text", "data": { "value": "hello" }, "position": { "x": 0, "y": 0 } },
    { "id": "name", "type": "text", "data": { "value": "world" }, "position": { "x": 0, "y": 120 } },
    { "id": "joined", "type": "concat", "data": { "separator": ", " }, "position": { "x": 240, "y": 60 } },
    { "id": "sink", "type": "output", "position": { "x": 480, "y": 60 } }
  ],
  "edges": [
    { "id": "e1", "source": "greeting", "sourceHandle": "value", "target": "joined", "targetHandle": "a" },
    { "id": "e2", "source": "name", "sourceHandle": "value", "target": "joined", "targetHandle": "b" },
    { "id": "e3", "source": "joined", "sourceHandle": "text", "target": "sink", "targetHandle": "value" }
  ],
  "metadata": { "version": "1.0.0" }
}"#;
