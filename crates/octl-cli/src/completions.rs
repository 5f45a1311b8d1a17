//! Shell-completion generation (§EXPANSION 3: "Shell-completion hints for
//! enumerated flag values ... `clap` expresses this natively"). Enumerated
//! flag values are handled inline by `builder::flag_to_arg`'s
//! `value_parser`; this module covers the complementary piece — emitting a
//! full completion script per shell, the way `clap_complete` is meant to be
//! driven from a `clap::Command` built at runtime.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

pub fn build_completions_command() -> Command {
    Command::new("completions")
        .about("generate a shell completion script")
        .arg(
            clap::Arg::new("shell")
                .required(true)
                .value_parser(clap::value_parser!(Shell)),
        )
}

/// Writes the completion script for `shell` to stdout, generated against
/// `root` — the same fully assembled command tree the rest of the CLI
/// dispatches through, so a generated script always matches the operations
/// and entities this process actually knows about.
pub fn dispatch_completions(root: &mut Command, matches: &clap::ArgMatches) {
    let shell = *matches.get_one::<Shell>("shell").expect("required");
    let name = root.get_name().to_string();
    generate(shell, root, name, &mut io::stdout());
}
