use clap::{Parser, Subcommand};
use nagare::prelude::*;
use std::fs;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Validate, analyze and run node-based pipelines from the command line
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. "info", "nagare=debug")
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Read inputs as editor canvas documents instead of pipeline requests
    #[arg(long, global = true)]
    canvas: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a pipeline without running it
    Check {
        /// Path to the pipeline JSON file
        path: String,
        /// Print the response as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Validate, schedule and execute a pipeline
    Run {
        /// Path to the pipeline JSON file
        path: String,
        /// Wall-clock bound for execution in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Maximum node computations running at once
        #[arg(long)]
        max_concurrent: Option<usize>,
        /// Print the response as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Validate a pipeline and print graph statistics
    Analyze {
        /// Path to the pipeline JSON file
        path: String,
        /// Print the analysis as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
    /// Validate and schedule a pipeline, then save the plan for later runs
    Plan {
        /// Path to the pipeline JSON file
        path: String,
        /// Where to write the compiled plan
        #[arg(short, long, default_value = "pipeline.plan")]
        output: String,
    },
    /// Execute a previously saved plan
    Exec {
        /// Path to a plan written by `plan`
        plan_path: String,
        /// Print the response as JSON instead of a report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let registry = TypeRegistry::builder()
        .with_builtin_kinds()
        .build()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to build the type registry: {}", e)));
    let config = EngineConfig::from_env();

    match cli.command {
        Command::Check { path, json } => {
            let request = load_request(&path, cli.canvas, config.max_request_bytes);
            let engine = Engine::builder(Arc::new(registry)).with_config(config).build();
            let response = engine.check(&request);
            print_response(&response, json);
            exit_for(&response);
        }
        Command::Run {
            path,
            timeout_ms,
            max_concurrent,
            json,
        } => {
            let request = load_request(&path, cli.canvas, config.max_request_bytes);
            let mut builder = Engine::builder(Arc::new(registry)).with_config(config);
            if let Some(ms) = timeout_ms {
                builder = builder.with_timeout(Duration::from_millis(ms));
            }
            if let Some(max) = max_concurrent {
                builder = builder.with_max_concurrent_nodes(max);
            }
            let engine = builder.build();

            let started = Instant::now();
            let response = engine
                .run(&request)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Engine failure: {}", e)));
            print_response(&response, json);
            if !json {
                println!("Finished in {:?}", started.elapsed());
            }
            exit_for(&response);
        }
        Command::Analyze { path, json } => {
            let request = load_request(&path, cli.canvas, config.max_request_bytes);
            let engine = Engine::builder(Arc::new(registry)).with_config(config).build();
            let analysis = engine.analyze(&request);
            if json {
                let encoded = serde_json::to_string_pretty(&analysis).unwrap_or_else(|e| {
                    exit_with_error(&format!("Failed to encode analysis: {}", e))
                });
                println!("{}", encoded);
            } else {
                print!("{}", ReportFormatter::format_analysis(&analysis));
            }
            exit_for(&analysis.response);
        }
        Command::Plan { path, output } => {
            let request = load_request(&path, cli.canvas, config.max_request_bytes);
            let engine = Engine::builder(Arc::new(registry)).with_config(config).build();
            let plan = match engine.plan(&request) {
                Ok(plan) => plan,
                Err(e) => {
                    print!("{}", ReportFormatter::format_response(&engine.check(&request)));
                    exit_with_error(&format!("Planning failed: {}", e))
                }
            };
            plan.save(&output)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to save plan: {}", e)));
            print!("{}", ReportFormatter::format_schedule(plan.schedule()));
            println!("Plan with {} node(s) saved to '{}'", plan.schedule().len(), output);
        }
        Command::Exec { plan_path, json } => {
            let plan = ExecutionPlan::from_file(&plan_path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to load plan: {}", e)));
            let engine = Engine::builder(Arc::new(registry)).with_config(config).build();
            let response = engine
                .execute_plan(&plan)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to execute plan: {}", e)));
            print_response(&response, json);
            exit_for(&response);
        }
    }
}

fn load_request(path: &str, canvas: bool, limit: usize) -> PipelineRequest {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
    let request = if canvas {
        CanvasDocument::from_json_limited(&json, limit).and_then(IntoPipeline::into_pipeline)
    } else {
        PipelineRequest::from_json_limited(&json, limit)
    };
    request.unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", path, e)))
}

fn print_response(response: &PipelineResponse, json: bool) {
    if json {
        println!("{}", response.to_json_pretty());
    } else {
        print!("{}", ReportFormatter::format_response(response));
    }
}

fn exit_for(response: &PipelineResponse) {
    match response.status {
        PipelineStatus::Valid | PipelineStatus::Executed => {}
        PipelineStatus::Invalid | PipelineStatus::Failed => std::process::exit(2),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
