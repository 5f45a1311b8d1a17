//! Informational/warning/error stderr lines, colored with `owo-colors`
//! when stderr is a TTY (§7: "Informational conditions ... log to stderr
//! and continue").

use owo_colors::OwoColorize;

pub fn info(colorize: bool, message: impl AsRef<str>) {
    if colorize {
        eprintln!("{} {}", "info:".green().bold(), message.as_ref());
    } else {
        eprintln!("info: {}", message.as_ref());
    }
}

pub fn warn(colorize: bool, message: impl AsRef<str>) {
    if colorize {
        eprintln!("{} {}", "warn:".yellow().bold(), message.as_ref());
    } else {
        eprintln!("warn: {}", message.as_ref());
    }
}

pub fn error(colorize: bool, message: impl AsRef<str>) {
    if colorize {
        eprintln!("{} {}", "error:".red().bold(), message.as_ref());
    } else {
        eprintln!("error: {}", message.as_ref());
    }
}
