use console::style;
use std::io;

use crate::api::Usage;
use crate::materialize::MaterializeReport;

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self { verbose: false }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn print_banner(&mut self) -> io::Result<()> {
        println!("{}", style("╔══════════════════════════════════════╗").cyan().bold());
        println!("{}", style("║   codeloom — round-based generator   ║").cyan().bold());
        println!("{}", style("╚══════════════════════════════════════╝").cyan().bold());
        Ok(())
    }

    pub fn print_system(&mut self, content: &str) -> io::Result<()> {
        println!("{}", style(content).yellow().dim());
        Ok(())
    }

    pub fn print_error(&mut self, content: &str) -> io::Result<()> {
        println!("{} {}", style("Error:").red().bold(), content);
        Ok(())
    }

    pub fn print_round_header(&mut self, round: u32) -> io::Result<()> {
        println!();
        println!("{}", style(format!("── Round {round} ──────────────────────")).cyan());
        Ok(())
    }

    pub fn print_report(&mut self, report: &MaterializeReport) -> io::Result<()> {
        for path in &report.written {
            println!("{} {}", style("wrote").green().bold(), path);
        }
        for path in &report.unchanged {
            println!("{} {}", style("unchanged").dim(), style(path).dim());
        }
        if self.verbose {
            for dir in &report.dirs_created {
                println!("{} {}/", style("mkdir").dim(), style(dir).dim());
            }
        }
        for warning in &report.warnings {
            println!("{} {}", style("warning:").yellow().bold(), warning);
        }
        if report.files_touched() == 0 && report.warnings.is_empty() {
            self.print_system("No file content found in this response.")?;
        }
        Ok(())
    }

    pub fn print_usage(&mut self, usage: Option<&Usage>) -> io::Result<()> {
        if let Some(usage) = usage {
            println!(
                "{}",
                style(format!(
                    "{} prompt + {} completion = {} tokens",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                ))
                .dim()
            );
        } else if self.verbose {
            println!("{}", style("No usage data returned by the API.").dim());
        }
        Ok(())
    }

    pub fn print_prompt_preview(&mut self, prompt: &str) -> io::Result<()> {
        println!();
        println!("{}", style("Proposed prompt for the next round:").bold());
        println!("{}", style(truncate_lines(prompt, 20)).dim());
        Ok(())
    }

    pub fn print_summary(&mut self, files: usize, rounds: u32) -> io::Result<()> {
        println!();
        println!(
            "{} {} file(s) across {} round(s).",
            style("Done:").green().bold(),
            files,
            rounds
        );
        Ok(())
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        text.to_string()
    } else {
        format!(
            "{}\n... ({} more lines)",
            lines[..max_lines].join("\n"),
            lines.len() - max_lines
        )
    }
}
