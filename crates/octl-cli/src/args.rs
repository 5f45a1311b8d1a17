//! Global flags recognized by every leaf (§6 "Common flags"), plus the
//! `--log-level`/`-v` pair every invocation accepts regardless of subcommand.

use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{s}")
    }
}

pub const OUTPUT_FLAG: &str = "output";
pub const FILTER_FLAG: &str = "filter";
pub const JQ_FLAG: &str = "jq";
pub const COLUMNS_FLAG: &str = "columns";
pub const TEMPLATE_FLAG: &str = "template";
pub const YES_FLAG: &str = "yes";
pub const NO_UPGRADE_FLAG: &str = "no-upgrade";
pub const DATA_DIR_FLAG: &str = "data-dir";
pub const LOG_LEVEL_FLAG: &str = "log-level";
pub const VERBOSE_FLAG: &str = "verbose";

/// Default `-o` value (§6: "Default `json,raw`").
pub const DEFAULT_OUTPUT: &str = "json,raw";

/// Builds the flags shared by every leaf command: `-o`, `--filter`, `--jq`,
/// `--columns`, `--template`, `-y`, `--no-upgrade` (§6). Registered once on
/// the root command as `global(true)` so every leaf and alias inherits them
/// without per-command duplication.
pub fn global_args() -> Vec<clap::Arg> {
    use clap::Arg;
    vec![
        Arg::new(OUTPUT_FLAG)
            .short('o')
            .long("output")
            .help("json|yaml|table|base64|none[,single|,raw]")
            .default_value(DEFAULT_OUTPUT)
            .global(true),
        Arg::new(FILTER_FLAG)
            .long("filter")
            .help("FIELD:REGEX predicate shortcut, repeatable")
            .action(clap::ArgAction::Append)
            .global(true),
        Arg::new(JQ_FLAG)
            .long("jq")
            .help("free-form filter expression")
            .action(clap::ArgAction::Append)
            .global(true),
        Arg::new(COLUMNS_FLAG)
            .long("columns")
            .help("[+]Title:Expr|Title:Expr overriding or appending table columns")
            .global(true),
        Arg::new(TEMPLATE_FLAG)
            .long("template")
            .help("JSON body file, with {{.Path}} substitution")
            .global(true),
        Arg::new(YES_FLAG)
            .short('y')
            .help("suppress delete confirmation")
            .action(clap::ArgAction::SetTrue)
            .global(true),
        Arg::new(NO_UPGRADE_FLAG)
            .long("no-upgrade")
            .help("internal: suppress update-check on alias re-entry")
            .action(clap::ArgAction::SetTrue)
            .hide(true)
            .global(true),
        Arg::new(DATA_DIR_FLAG)
            .long("data-dir")
            .help("profile/config directory")
            .default_value("~/.octl")
            .global(true),
        Arg::new(LOG_LEVEL_FLAG)
            .long("log-level")
            .help("error|warn|info|debug|trace")
            .value_parser(clap::value_parser!(LogLevel))
            .default_value("info")
            .global(true),
        Arg::new(VERBOSE_FLAG)
            .short('v')
            .long("verbose")
            .help("show a progress spinner around remote calls")
            .action(clap::ArgAction::SetTrue)
            .global(true),
    ]
}

pub fn expand_tilde(path: &str) -> std::path::PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| dirs::home_dir().map(Into::into)) {
            return std::path::Path::new(&home).join(stripped);
        }
    }
    std::path::PathBuf::from(path)
}
