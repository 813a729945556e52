use crate::engine::Analysis;
use crate::pipeline::{PipelineResponse, ValidationError};
use crate::schedule::Schedule;
use serde_json::Value;
use std::fmt::Write;

/// Formats engine responses into human-readable text
pub struct ReportFormatter;

impl ReportFormatter {
    /// Render a response as a status line, then findings, then computed outputs.
    pub fn format_response(response: &PipelineResponse) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Status: {}", response.status);

        if !response.errors.is_empty() {
            let _ = writeln!(out, "Errors ({}):", response.errors.len());
            for error in &response.errors {
                let _ = writeln!(out, "  - {}", Self::format_error(error));
            }
        }

        if let Some(results) = &response.results {
            let _ = writeln!(out, "Results ({} node(s)):", results.len());
            for (node_id, handles) in results {
                let _ = writeln!(out, "  {}", node_id);
                for (handle, value) in handles {
                    let _ = writeln!(out, "    {} = {}", handle, Self::format_value(value));
                }
            }
        }
        out
    }

    pub fn format_analysis(analysis: &Analysis) -> String {
        let stats = &analysis.stats;
        let mut out = Self::format_response(&analysis.response);
        let _ = writeln!(
            out,
            "Graph: {} node(s), {} edge(s), acyclic: {}",
            stats.node_count, stats.edge_count, analysis.is_dag
        );
        let _ = writeln!(
            out,
            "Degrees: max in {}, max out {}, isolated {}",
            stats.max_in_degree, stats.max_out_degree, stats.isolated_nodes
        );
        let _ = writeln!(out, "Processed in {:.3} ms", analysis.processing_time_ms);
        out
    }

    pub fn format_schedule(schedule: &Schedule) -> String {
        let mut out = String::new();
        for (n, layer) in schedule.layers().iter().enumerate() {
            let _ = writeln!(out, "Layer {}: {}", n, layer.join(", "));
        }
        out
    }

    /// One finding on one line, with its location when known.
    fn format_error(error: &ValidationError) -> String {
        let location = match (&error.node_id, &error.edge_id) {
            (Some(node), Some(edge)) => format!(" (node {}, edge {})", node, edge),
            (Some(node), None) => format!(" (node {})", node),
            (None, Some(edge)) => format!(" (edge {})", edge),
            (None, None) => String::new(),
        };
        format!("{}: {}{}", error.kind, error.message, location)
    }

    fn format_value(value: &Value) -> String {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
                _ => n.to_string(),
            },
            Value::String(s) => format!("\"{}\"", s),
            other => other.to_string(),
        }
    }
}
