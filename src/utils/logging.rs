//! Logging utilities for colorful console output

use colored::Colorize;

/// Log levels for the indexer
#[derive(Clone, Copy)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

/// Logs a message with color and formatting
pub fn log(level: LogLevel, message: &str) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

    match level {
        LogLevel::Info => {
            println!(
                "{} {} {}",
                format!("[{timestamp}]").bright_black(),
                "ℹ".bright_blue(),
                message
            );
        }
        LogLevel::Success => {
            println!(
                "{} {} {}",
                format!("[{timestamp}]").bright_black(),
                "✓".bright_green(),
                message.green()
            );
        }
        LogLevel::Warning => {
            println!(
                "{} {} {}",
                format!("[{timestamp}]").bright_black(),
                "⚠".bright_yellow(),
                message.yellow()
            );
        }
        LogLevel::Error => {
            eprintln!(
                "{} {} {}",
                format!("[{timestamp}]").bright_black(),
                "✗".bright_red(),
                message.red()
            );
        }
        LogLevel::Debug => {
            println!(
                "{} {} {}",
                format!("[{timestamp}]").bright_black(),
                "·".bright_magenta(),
                message.bright_black()
            );
        }
    }
}

/// Logs watcher startup information
pub fn log_startup(stream: &str, rpc_url: &str, poll_interval_ms: u64) {
    println!("\n{}", "═".repeat(80).bright_blue());
    println!("{}", "  Market Indexer".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_blue());
    println!("  {} {}", "Stream:       ".bright_white(), stream.cyan());
    println!("  {} {}", "RPC URL:      ".bright_white(), rpc_url.cyan());
    println!(
        "  {} {}ms",
        "Poll Interval:".bright_white(),
        poll_interval_ms.to_string().cyan()
    );
    println!("{}\n", "═".repeat(80).bright_blue());
}

/// Logs batch processing summary
pub fn log_batch(handled: usize, total: usize, duration_ms: u64) {
    if total > 0 {
        println!(
            "{} {} {} {} {} {}ms",
            "▣".bright_blue(),
            "Batch:".bright_white(),
            format!("{handled}/{total}").bright_cyan(),
            "events handled".bright_white(),
            "in".bright_black(),
            duration_ms.to_string().bright_yellow()
        );
    }
}

/// Logs an error with context
pub fn log_error(context: &str, error: &str) {
    eprintln!(
        "{} {} {} {}",
        "✗".bright_red(),
        context.red().bold(),
        "│".bright_black(),
        error.bright_red()
    );
}
