use clap::Parser;
use nagare::pipeline::{EdgeRecord, HandleRef, NodeRecord, PipelineRequest};
use rand::Rng;
use rand::rngs::ThreadRng;
use serde_json::json;
use std::fs;

/// A CLI tool to generate random layered pipelines over the built-in node kinds
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_pipeline.json")]
    output: String,

    /// Number of layers below the source layer
    #[arg(long, default_value_t = 4)]
    layers: usize,

    /// The minimum number of nodes per layer
    #[arg(long, default_value_t = 1)]
    min: usize,

    /// The maximum number of nodes per layer
    #[arg(long, default_value_t = 8)]
    max: usize,
}

const ARITHMETIC_KINDS: [&str; 3] = ["add", "subtract", "multiply"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min == 0 || cli.min > cli.max {
        eprintln!(
            "Error: need 1 <= --min ({}) <= --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating pipeline ({} layer(s), {} to {} nodes per layer)...",
        cli.layers, cli.min, cli.max
    );

    let request = generate_pipeline(&mut rng, cli.layers, cli.min, cli.max);
    let json_output = serde_json::to_string_pretty(&request)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated {} node(s) and {} edge(s) into '{}'",
        request.nodes.len(),
        request.edges.len(),
        cli.output
    );

    Ok(())
}

/// Source layer of `number` nodes, then arithmetic layers wired to random earlier
/// nodes, then one `output` sink per node of the last layer. The result is always
/// a valid DAG.
fn generate_pipeline(rng: &mut ThreadRng, layers: usize, min: usize, max: usize) -> PipelineRequest {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut previous: Vec<String> = Vec::new();

    for i in 0..rng.random_range(min..=max) {
        let id = format!("n0_{}", i);
        let value = rng.random_range(-100.0..100.0_f64).round();
        nodes.push(NodeRecord::new(&id, "number").with_data(json!({ "value": value })));
        previous.push(id);
    }
    println!("-> Generated {} source node(s).", previous.len());

    for layer in 1..=layers {
        let mut current = Vec::new();
        for i in 0..rng.random_range(min..=max) {
            let id = format!("n{}_{}", layer, i);
            let kind = ARITHMETIC_KINDS[rng.random_range(0..ARITHMETIC_KINDS.len())];
            nodes.push(NodeRecord::new(&id, kind).with_data(json!({ "b": 1 })));

            let a = &previous[rng.random_range(0..previous.len())];
            edges.push(connect(edges.len(), a, &id, "a", &nodes));
            if rng.random_bool(0.5) {
                let b = &previous[rng.random_range(0..previous.len())];
                edges.push(connect(edges.len(), b, &id, "b", &nodes));
            }
            current.push(id);
        }
        println!("-> Generated layer {} with {} node(s).", layer, current.len());
        previous = current;
    }

    for source in &previous {
        let id = format!("out_{}", source);
        nodes.push(NodeRecord::new(&id, "output"));
        edges.push(connect(edges.len(), source, &id, "value", &nodes));
    }

    PipelineRequest::new(nodes, edges)
}

fn connect(
    n: usize,
    source: &str,
    target: &str,
    target_handle: &str,
    nodes: &[NodeRecord],
) -> EdgeRecord {
    let source_handle = match nodes.iter().find(|node| node.id == source) {
        Some(node) if node.kind == "number" => "value",
        _ => "result",
    };
    EdgeRecord::new(
        format!("e{}", n),
        HandleRef::new(source, source_handle),
        HandleRef::new(target, target_handle),
    )
}
