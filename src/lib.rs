//! # Nagare - Pipeline Graph Validation and Execution Engine
//!
//! **Nagare** is the backend half of a visual pipeline editor. Users wire typed nodes
//! together on a canvas; the editor submits the resulting graph, and Nagare decides
//! whether it is well formed, type checks every connection, orders the nodes and runs
//! their computations, returning either the computed outputs or a precise list of
//! findings that point back at the offending nodes and edges.
//!
//! ## Core Workflow
//!
//! 1.  **Register Node Kinds**: Build a `TypeRegistry` once at startup. Every kind declares
//!     its typed input and output handles and binds a computation.
//! 2.  **Submit a Request**: Parse a `PipelineRequest` from JSON, or convert your own editor
//!     format through the `IntoPipeline` trait (`editor::CanvasDocument` ships ready-made).
//! 3.  **Validate**: The engine builds the graph and collects every structural and type
//!     finding in one pass. Nothing runs while findings remain.
//! 4.  **Execute**: Valid graphs are layered deterministically and each layer runs
//!     concurrently. A failing node only takes its downstream nodes with it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nagare::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     // 1. Built-in kinds plus one of our own.
//!     let registry = TypeRegistry::builder()
//!         .with_builtin_kinds()
//!         .register(
//!             NodeMetadata::new("square")
//!                 .with_input(HandleDefinition::required("x", DataType::number()))
//!                 .with_output(HandleDefinition::output("y", DataType::number())),
//!             |inv: &Invocation| -> std::result::Result<PortValues, ComputeError> {
//!                 let x = inv.number("x")?;
//!                 Ok(PortValues::from([("y".to_string(), json!(x * x))]))
//!             },
//!         )
//!         .build()?;
//!
//!     // 2. The engine is shared by every request.
//!     let engine = Engine::builder(Arc::new(registry))
//!         .with_max_concurrent_nodes(8)
//!         .build();
//!
//!     // 3. A two-node pipeline: number -> square.
//!     let request = PipelineRequest::new(
//!         vec![
//!             NodeRecord::new("n1", "number").with_data(json!({ "value": 7 })),
//!             NodeRecord::new("n2", "square"),
//!         ],
//!         vec![EdgeRecord::new(
//!             "e1",
//!             HandleRef::new("n1", "value"),
//!             HandleRef::new("n2", "x"),
//!         )],
//!     );
//!
//!     // 4. Validate, schedule and run.
//!     let response = engine.run(&request).await?;
//!     println!("{}", response.to_json_pretty());
//!
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod plan;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod schedule;
pub mod validation;
