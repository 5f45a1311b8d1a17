//! Assembles the `api <Operation>` command tree: one leaf `clap::Command`
//! per descriptor operation, its flags synthesized from the operation's
//! input shape and enriched with schema help text (§4.2/§4.3).

use crate::schema_enrich;
use octl_client::descriptor;
use octl_schema::SchemaView;
use octl_types::field::ScalarKind;
use octl_types::{Flag, Operation};
use std::collections::HashMap;

/// Prescans already-present `--<root>.<N>.` flags in `argv` so a second
/// slice entry becomes visible on re-parse once the caller has actually
/// supplied one, instead of being capped at `DEFAULT_SLICE_ENTRIES` forever
/// (§4.2 "visibility grows with use").
pub fn visible_slice_entries_from_argv(argv: &[String]) -> HashMap<String, usize> {
    let mut visible = HashMap::new();
    for arg in argv {
        let Some(body) = arg.strip_prefix("--") else { continue };
        let body = body.split('=').next().unwrap_or(body);
        let segments: Vec<&str> = body.split('.').collect();
        for (i, seg) in segments.iter().enumerate() {
            if i == 0 {
                continue;
            }
            if seg.parse::<usize>().is_ok() {
                let root = segments[..i].join(".");
                let index: usize = seg.parse().unwrap();
                let entry = visible.entry(root).or_insert(0usize);
                *entry = (*entry).max(index + 2);
            }
        }
    }
    visible
}

pub fn flags_for_operation(op: &Operation, argv: &[String], schema: &SchemaView) -> Vec<Flag> {
    let visible = visible_slice_entries_from_argv(argv);
    let mut flags = octl_flags::synthesize_with_visible_slices(&op.input, &visible);
    schema_enrich::enrich(&mut flags, &op.input, schema);
    flags
}

pub fn flag_to_arg(flag: &Flag) -> clap::Arg {
    let mut arg = clap::Arg::new(flag.field_path.clone()).long(flag.name.clone());
    if !flag.help.is_empty() {
        arg = arg.help(flag.help.clone());
    }
    if flag.required {
        arg = arg.required(true);
    }
    if flag.slice {
        arg = arg.action(clap::ArgAction::Set).value_delimiter(',');
    } else if matches!(flag.kind, ScalarKind::Bool) && flag.custom_parser.is_none() {
        arg = arg.action(clap::ArgAction::SetTrue);
    } else {
        arg = arg.action(clap::ArgAction::Set);
    }
    if !flag.allowed_values.is_empty() {
        arg = arg.value_parser(flag.allowed_values.clone());
    }
    arg
}

/// Builds the `api` subcommand: one leaf per operation, sorted by group
/// then name so related operations list together even without clap's
/// visual subcommand-group headings (a known simplification — §REDESIGN
/// FLAGS has no grouping requirement the builder API can satisfy natively;
/// recorded in DESIGN.md).
pub fn build_api_command(argv: &[String], schema: &SchemaView) -> clap::Command {
    let mut ops = descriptor::all();
    ops.sort_by(|a, b| (a.group.as_str(), a.name.as_str()).cmp(&(b.group.as_str(), b.name.as_str())));

    let mut cmd = clap::Command::new("api")
        .about("invoke a single API operation directly")
        .subcommand_required(true);

    for op in &ops {
        let summary = schema.summary_for_operation(&op.name);
        let flags = flags_for_operation(op, argv, schema);

        let mut leaf = clap::Command::new(op.name.clone());
        leaf = if !summary.short.is_empty() {
            leaf.about(summary.short.clone())
        } else {
            leaf.about(format!("invoke {}", op.name))
        };
        if !summary.long.is_empty() {
            leaf = leaf.long_about(summary.long.clone());
        }
        for flag in &flags {
            leaf = leaf.arg(flag_to_arg(flag));
        }
        cmd = cmd.subcommand(leaf);
    }

    cmd
}
