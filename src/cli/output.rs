//! Colored output helpers for CLI
//!
//! Terminal rendering for the raglib commands.

use crate::types::{DocumentChunk, ScoredChunk};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

/// Longest chunk preview printed before eliding, in characters.
const PREVIEW_CHARS: usize = 240;

fn preview(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print one chunk with its index, size and an elided preview.
    pub fn chunk(&self, chunk: &DocumentChunk) {
        let label = format!("#{}", chunk.index);
        let size = format!("{} chars", chunk.content.chars().count());
        if self.colored {
            println!("\n  {} {}", label.bright_cyan().bold(), size.dimmed());
            println!("    {}", preview(&chunk.content));
        } else {
            println!("\n  {} ({})", label, size);
            println!("    {}", preview(&chunk.content));
        }
    }

    /// Print a ranked search hit.
    pub fn hit(&self, rank: usize, hit: &ScoredChunk) {
        let label = format!("{}.", rank);
        let score = format!("score {:.4}", hit.score);
        let source = hit
            .chunk
            .metadata
            .file_name
            .as_deref()
            .map(|name| format!("{} #{}", name, hit.chunk.index))
            .unwrap_or_else(|| format!("#{}", hit.chunk.index));

        if self.colored {
            println!(
                "\n  {} {} {}",
                label.bright_cyan().bold(),
                score.green(),
                source.dimmed()
            );
        } else {
            println!("\n  {} {} ({})", label, score, source);
        }
        println!("    {}", preview(&hit.chunk.content));
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}
