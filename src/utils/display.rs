//! Display and output formatting utilities

use crate::recognition::{RecognitionOutcome, SolutionRecord, ValidationReport};
use anyhow::Result;

/// Format recognition results for display
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// Format a single solution for console output
    pub fn format_solution(record: &SolutionRecord) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== {} realization ===\n", record.kind));
        output.push_str(&format!("Backend: {}\n", record.metadata.backend));
        output.push_str(&format!(
            "Solve Time: {:.3}s\n",
            record.metadata.solve_time_ms as f64 / 1000.0
        ));
        match record.metadata.min_slack {
            Some(slack) => output.push_str(&format!("Min Slack: {:.3e}\n", slack)),
            None => output.push_str("Min Slack: n/a\n"),
        }
        output.push('\n');
        output.push_str(&Self::format_disk_table(record));

        output
    }

    /// Format the disks of a solution as a table
    pub fn format_disk_table(record: &SolutionRecord) -> String {
        let mut output = String::new();

        output.push_str("Vertex |          x |          y |          r\n");
        output.push_str("-------|------------|------------|-----------\n");
        for (vertex, disk) in &record.disks {
            output.push_str(&format!(
                "{:6} | {:10.6} | {:10.6} | {:10.6}\n",
                vertex, disk.x, disk.y, disk.r
            ));
        }

        output
    }

    /// One-line verdict for an outcome
    pub fn format_outcome(outcome: &RecognitionOutcome) -> String {
        match outcome {
            RecognitionOutcome::Feasible(record) => ColorOutput::success(&format!(
                "✅ Realizable as a {} graph ({} disks)",
                record.kind,
                record.vertex_count()
            )),
            RecognitionOutcome::Infeasible => {
                ColorOutput::error("❌ Not realizable within the configured domain")
            }
            RecognitionOutcome::Unknown(reason) => {
                ColorOutput::warning(&format!("❔ Undecided: {}", reason))
            }
        }
    }

    /// Format batch results as a summary table
    pub fn format_batch_summary(names: &[String], results: &[Result<RecognitionOutcome>]) -> String {
        let mut output = String::new();

        output.push_str("Recognition Summary:\n");
        output.push_str("Graph                | Result\n");
        output.push_str("---------------------|--------------------------\n");

        for (name, result) in names.iter().zip(results) {
            let verdict = match result {
                Ok(RecognitionOutcome::Feasible(_)) => "feasible".to_string(),
                Ok(RecognitionOutcome::Infeasible) => "infeasible".to_string(),
                Ok(RecognitionOutcome::Unknown(reason)) => format!("unknown ({})", reason),
                Err(e) => format!("error: {}", e),
            };
            output.push_str(&format!("{:20} | {}\n", name, verdict));
        }

        output
    }

    /// Verdict line for a validation report
    pub fn format_validation(report: &ValidationReport) -> String {
        if report.is_valid && report.near_boundary_pairs.is_empty() {
            ColorOutput::success("✅ Arrangement realizes the graph")
        } else if report.is_valid {
            ColorOutput::warning(&format!(
                "⚠️  Arrangement realizes the graph, {} pair(s) within epsilon of tangency",
                report.near_boundary_pairs.len()
            ))
        } else {
            ColorOutput::error(&format!(
                "❌ Arrangement does not realize the graph ({} mismatched pair(s))",
                report.mismatched_pairs.len()
            ))
        }
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color
    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Disk, DiskArrangement};
    use crate::nlp::RealizationKind;
    use crate::recognition::{SolutionMetadata, UndecidedReason};

    fn record() -> SolutionRecord {
        let disks: DiskArrangement = [(1, Disk::new(1.5, 1.25, 0.5)), (2, Disk::new(2.0, 1.0, 0.25))]
            .into_iter()
            .collect();
        SolutionRecord::new(
            RealizationKind::General,
            disks,
            SolutionMetadata {
                backend: "hybrid".to_string(),
                solve_time_ms: 1500,
                min_slack: Some(0.125),
            },
        )
    }

    #[test]
    fn test_solution_formatting() {
        let text = SolutionFormatter::format_solution(&record());

        assert!(text.contains("disk realization"));
        assert!(text.contains("Solve Time: 1.500s"));
        assert!(text.contains("1.250000"));
        assert_eq!(text.lines().filter(|l| l.contains(" | ")).count(), 3);
    }

    #[test]
    fn test_batch_summary() {
        let names = vec!["edge".to_string(), "k33".to_string(), "broken".to_string()];
        let results = vec![
            Ok(RecognitionOutcome::Feasible(record())),
            Ok(RecognitionOutcome::Unknown(UndecidedReason::Inconclusive)),
            Err(anyhow::anyhow!("bad file")),
        ];

        let summary = SolutionFormatter::format_batch_summary(&names, &results);
        assert!(summary.contains("edge"));
        assert!(summary.contains("feasible"));
        assert!(summary.contains("unknown (solver inconclusive)"));
        assert!(summary.contains("error: bad file"));
    }

    #[test]
    fn test_color_output() {
        let colored = ColorOutput::colored("test", Color::Red);
        // Should either be colored or plain text
        assert!(colored.contains("test"));
        assert!(SolutionFormatter::format_outcome(&RecognitionOutcome::Infeasible)
            .contains("Not realizable"));
    }
}
