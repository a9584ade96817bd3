//! Console reporter with colored output

use crate::{HistoryAnalysis, HistoryStatus, ProjectReport, SmellInstance};
use colored::Colorize;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a full project analysis
    pub fn report(&self, report: &ProjectReport) {
        self.print_header(report);
        self.print_files(report);
        self.print_skipped(report);

        if let Some(ref history) = report.history {
            self.print_history(history);
        }

        println!();
    }

    /// Report in quiet mode (per-file counts only)
    pub fn report_quiet(&self, report: &ProjectReport) {
        for file in &report.files {
            println!("{}: {}", file.file, file.smell_count);
        }
    }

    fn print_header(&self, report: &ProjectReport) {
        println!();
        println!(
            "{}",
            format!("Test Smell Analysis: {}", report.project_root.display()).bold()
        );
        println!(
            "   Test files: {} | Smell instances: {}",
            report.total_files, report.total_smells
        );
        println!();
    }

    fn print_files(&self, report: &ProjectReport) {
        for file in &report.files {
            if file.smells.is_empty() {
                if self.verbose {
                    println!("   {} {}", "✓".green(), file.file.dimmed());
                }
                continue;
            }
            println!(
                "   {} {} ({})",
                "⚠".yellow(),
                file.file.bold(),
                file.smell_count
            );
            for smell in &file.smells {
                self.print_smell(smell);
            }
        }
    }

    fn print_smell(&self, smell: &SmellInstance) {
        let location = format!("L{}", smell.line);
        println!(
            "      {} [{}] {}",
            location.dimmed(),
            smell.smell_type.abbreviation().dimmed(),
            smell.message
        );
    }

    fn print_skipped(&self, report: &ProjectReport) {
        if report.skipped.is_empty() {
            return;
        }
        println!();
        println!("   {}", "Skipped:".bold());
        for skipped in &report.skipped {
            println!(
                "   {} {} ({})",
                "✗".red(),
                skipped.file,
                skipped.reason.dimmed()
            );
        }
    }

    fn print_history(&self, history: &HistoryAnalysis) {
        println!();
        println!("{}", "─".repeat(60));
        println!("   {}", "Prioritization".bold());

        if history.status != HistoryStatus::Ok {
            if let Some(ref note) = history.note {
                println!("   {} {}", "ℹ".blue(), note);
            }
            return;
        }

        let stats = &history.statistics;
        println!(
            "   Commits: {} ({} fault-fixing, {}%)",
            stats.total_commits, stats.faulty_commits, stats.fault_percentage
        );
        println!(
            "   Files in history: {} ({} test, {} production)",
            stats.total_files, stats.test_files, stats.production_files
        );
        println!();

        for metric in &history.metrics {
            let score = format!("{:+.4}", metric.prioritization_score);
            let score_colored = if metric.prioritization_score > 0.0 {
                score.red()
            } else {
                score.green()
            };
            println!(
                "   {:>2}. {} {} [{}]",
                metric.rank,
                score_colored,
                metric.name,
                metric.abbreviation.dimmed()
            );
            if self.verbose {
                println!(
                    "       CP {:+.4} | FP {:+.4} | {} instances in {} files",
                    metric.cp_score,
                    metric.fp_score,
                    metric.instance_count,
                    metric.affected_file_count
                );
            }
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
