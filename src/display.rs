use crate::core::error::SmartCloudError;
use crate::metrics::MetricsSnapshot;
use crate::providers::Message;
use console::{Term, measure_text_width, style};
use std::io::{self, Write};

/// Box width that fits the terminal, clamped to `[min, max]`.
fn box_width(min: usize, max: usize) -> usize {
    let terminal_width = Term::stdout().size().1 as usize;
    terminal_width.saturating_sub(4).clamp(min, max)
}

/// Wraps one line to `max_width` display columns, preferring to break at spaces.
pub fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split(' ') {
        let candidate_width = if current.is_empty() {
            measure_text_width(word)
        } else {
            measure_text_width(&current) + 1 + measure_text_width(word)
        };

        if candidate_width <= max_width {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // A single word wider than the box is cut by characters.
        let mut chunk = String::new();
        for ch in word.chars() {
            chunk.push(ch);
            if measure_text_width(&chunk) >= max_width {
                lines.push(std::mem::take(&mut chunk));
            }
        }
        current = chunk;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Prints one agent-authored message. Markdown-looking replies go through termimad.
pub fn display_agent_reply(message: &Message) {
    let (label, body) = message
        .content
        .split_once(": ")
        .unwrap_or(("Agent", message.content.as_str()));

    println!("\n{}", style(format!("🤖 {}", label.to_uppercase())).bold().blue());

    if looks_like_markdown(body) {
        termimad::print_text(body);
    } else {
        display_response(body);
    }
}

fn looks_like_markdown(text: &str) -> bool {
    text.contains("```") || text.contains('`') || text.contains("**") || text.contains("\n#")
}

/// Display a reply in a formatted box
pub fn display_response(response: &str) {
    let max_width = box_width(60, 120);
    let inner = max_width.saturating_sub(4);

    let wrapped: Vec<String> = response
        .lines()
        .flat_map(|line| wrap_line(line, inner))
        .collect();

    let content_width = wrapped
        .iter()
        .map(|line| measure_text_width(line))
        .max()
        .unwrap_or(0);
    let width = (content_width + 4).min(max_width);

    println!("{}", style(format!("┌{}┐", "─".repeat(width - 2))).dim().blue());
    for line in wrapped {
        let padding = width.saturating_sub(measure_text_width(&line) + 3);
        println!("│ {}{}│", style(&line).bold().white(), " ".repeat(padding));
    }
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().blue());
}

/// Informational line that is not part of the conversation log.
pub fn display_notice(text: &str) {
    println!("{} {}", style("ℹ").bold().yellow(), style(text).italic());
}

pub fn display_error(err: &SmartCloudError) {
    eprintln!("{} {}", style("✖").bold().red(), style(err).red());
}

fn gauge(percent: f32, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// CPU and RAM readout with progress bars.
pub fn display_metrics(snapshot: &MetricsSnapshot) {
    let bar_width = box_width(50, 80).saturating_sub(20);
    println!("\n{}", style("🖥️  SYSTEM MONITOR").bold().cyan());
    for (name, value) in [("CPU", snapshot.cpu_percent), ("RAM", snapshot.ram_percent)] {
        let bar = gauge(value, bar_width);
        let bar = if value > 90.0 {
            style(bar).red()
        } else if value > 70.0 {
            style(bar).yellow()
        } else {
            style(bar).green()
        };
        println!("{:<4}{:>6.1}%  {}", style(name).bold(), value, bar);
    }
}

/// Display a suggested command in a formatted box
pub fn display_command(command: &str) {
    let width = box_width(50, 100);
    let lines = wrap_line(command, width.saturating_sub(6));

    println!("\n{}", style("🤖 SUGGESTED COMMAND").bold().magenta());
    println!(
        "{}",
        style(format!("┌─ shell {}┐", "─".repeat(width.saturating_sub(10))))
            .dim()
            .green()
    );
    for (i, line) in lines.iter().enumerate() {
        let prompt = if i == 0 { "$ " } else { "  " };
        let padding = width.saturating_sub(prompt.len() + measure_text_width(line) + 3);
        println!(
            "│ {}{}{}│",
            style(prompt).bold().green(),
            style(line).bold().white(),
            " ".repeat(padding)
        );
    }
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().green());
}

/// Ask the user to confirm execution. Anything but `y` declines.
pub fn prompt_execution_confirmation() -> Result<bool, SmartCloudError> {
    println!(
        "\n{} {}",
        style("❓").bold().yellow(),
        style("Execute this command? [y/N]").bold().cyan()
    );
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| SmartCloudError::Input(format!("Failed to read confirmation: {}", e)))?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

pub fn display_execution_banner(command: &str) {
    let width = box_width(50, 100);
    let label = "⚡ EXECUTING:";
    let max_cmd = width.saturating_sub(measure_text_width(label) + 6);
    let shown = if measure_text_width(command) > max_cmd {
        let cut: String = command.chars().take(max_cmd.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        command.to_string()
    };

    println!("\n{}", style(format!("┌{}┐", "─".repeat(width - 2))).dim().cyan());
    let padding = width.saturating_sub(measure_text_width(label) + measure_text_width(&shown) + 4);
    println!(
        "│ {} {}{}│",
        style(label).bold().green(),
        style(&shown).bold().yellow(),
        " ".repeat(padding)
    );
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().cyan());
}

pub fn display_stdout(output: &[u8]) {
    let width = box_width(50, 100);
    println!("\n{}", style("📤 OUTPUT:").bold().blue());
    println!(
        "{}",
        style(format!("┌─ stdout {}┐", "─".repeat(width.saturating_sub(11))))
            .dim()
            .blue()
    );
    let _ = io::stdout().write_all(output);
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().blue());
}

pub fn display_stderr(output: &[u8]) {
    if output.is_empty() {
        return;
    }
    let width = box_width(50, 100);
    println!("\n{}", style("⚠️  ERROR:").bold().red());
    println!(
        "{}",
        style(format!("┌─ stderr {}┐", "─".repeat(width.saturating_sub(11))))
            .dim()
            .red()
    );
    let _ = io::stderr().write_all(output);
    println!("{}", style(format!("└{}┘", "─".repeat(width - 2))).dim().red());
}

pub fn display_execution_status(success: bool) {
    let status = if success {
        style("✅ COMPLETED").bold().green()
    } else {
        style("❌ FAILED").bold().red()
    };
    println!("{}", status);
}

pub fn display_execution_cancelled() {
    println!(
        "{} {}",
        style("🚫").bold().red(),
        style("Command execution cancelled").bold().red()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_spaces() {
        let lines = wrap_line("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn cuts_words_longer_than_the_box() {
        let lines = wrap_line("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn empty_line_stays_one_line() {
        assert_eq!(wrap_line("", 10), vec![String::new()]);
    }

    #[test]
    fn gauge_fills_proportionally() {
        assert_eq!(gauge(50.0, 10), "█████░░░░░");
        assert_eq!(gauge(150.0, 4), "████");
    }

    #[test]
    fn markdown_detection() {
        assert!(looks_like_markdown("```python\nprint(1)\n```"));
        assert!(!looks_like_markdown("Your CPU is at 3.0% and RAM is 40.0%."));
    }
}
