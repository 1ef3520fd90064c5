//! Console and file formatting
//!
//! Console lines are colored and wrapped; file lines are plain with a full
//! timestamp.

use super::file::write_to_file;
use super::levels::LogLevel;
use super::tags::LogTag;
use chrono::Local;
use colored::*;
use std::io::{stdout, ErrorKind, Write};

const TAG_WIDTH: usize = 10;
const LEVEL_WIDTH: usize = 8;
const MAX_LINE_LENGTH: usize = 140;

pub fn format_and_log(tag: &LogTag, level: LogLevel, message: &str, console: bool) {
    let now = Local::now();
    let time = now.format("%H:%M:%S").to_string();
    let timestamp = now.format("%Y-%m-%d %H:%M:%S").to_string();

    // time + space + [tag] + space + [level] + space
    let prefix_width = time.len() + 1 + TAG_WIDTH + 3 + LEVEL_WIDTH + 3;
    let available = MAX_LINE_LENGTH.saturating_sub(prefix_width).max(40);
    let lines = wrap_text(message, available);

    let tag_plain = tag.to_plain_string();

    if console {
        let base = format!(
            "{} [{}] [{}] ",
            time.dimmed(),
            format_tag(tag),
            format_level(level)
        );
        let continuation = " ".repeat(prefix_width);
        for (i, line) in lines.iter().enumerate() {
            if i == 0 {
                print_stdout_safe(&format!("{}{}", base, line));
            } else {
                print_stdout_safe(&format!("{}{}", continuation, line));
            }
        }
    }

    for line in &lines {
        write_to_file(&format!(
            "{} [{}] [{}] {}",
            timestamp,
            tag_plain,
            level.as_str(),
            line
        ));
    }
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let label = format!("{:<width$}", tag.to_plain_string(), width = TAG_WIDTH);
    match tag {
        LogTag::System => label.bright_yellow().bold(),
        LogTag::Config => label.bright_white().bold(),
        LogTag::Webserver => label.bright_green().bold(),
        LogTag::Dashboard => label.bright_cyan().bold(),
        LogTag::Metrics => label.bright_magenta().bold(),
        LogTag::Store => label.bright_blue().bold(),
        LogTag::Test => label.blue().bold(),
        LogTag::Other(_) => label.white().bold(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let label = format!("{:<width$}", level.as_str(), width = LEVEL_WIDTH);
    match level {
        LogLevel::Error => label.bright_red().bold(),
        LogLevel::Warning => label.yellow().bold(),
        LogLevel::Debug | LogLevel::Verbose => label.dimmed(),
        LogLevel::Info => label.white().bold(),
    }
}

/// Print to stdout, exit quietly on a broken pipe
fn print_stdout_safe(message: &str) {
    let mut out = stdout().lock();
    if let Err(e) = writeln!(out, "{}", message).and_then(|_| out.flush()) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        let _ = writeln!(std::io::stderr(), "Logger stdout error: {}", e);
    }
}

/// Wrap at word boundaries, keeping existing newlines. Words longer than
/// `max_width` are split on char boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for line in text.split('\n') {
        if line.chars().count() <= max_width {
            result.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in line.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if word_len > max_width {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
                let chars: Vec<char> = word.chars().collect();
                for chunk in chars.chunks(max_width) {
                    result.push(chunk.iter().collect());
                }
            } else if current.is_empty() {
                current.push_str(word);
            } else if current_len + 1 + word_len <= max_width {
                current.push(' ');
                current.push_str(word);
            } else {
                result.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }

    if result.is_empty() {
        result.push(String::new());
    }
    result
}
