//! Assembles the high-level entity command tree (`vol list`, `vm describe
//! <id>`, ...) from the generated/merged [`Config`] (§4.3/§4.4). Each leaf
//! grafts the full flag set of its target `api` operation, minus whatever
//! field a positional substitution already pins.

use crate::builder::{flag_to_arg, flags_for_operation};
use octl_client::descriptor;
use octl_schema::SchemaView;
use octl_types::alias::{Alias, CommandToken};
use octl_types::config::Config;

/// Finds the operation name an alias's command targets: the literal token
/// following a literal `"api"` token (§4.4, "every alias command begins
/// with `api <Operation>`").
fn target_operation_name(alias: &Alias) -> Option<&str> {
    alias.command.windows(2).find_map(|pair| match pair {
        [CommandToken::Literal(a), CommandToken::Literal(op)] if a == "api" => Some(op.as_str()),
        _ => None,
    })
}

/// External flag names whose value is already pinned by a positional
/// substitution: a literal `--X` token immediately followed by a
/// `Positional` token in the alias's command (§4.4 "Flag grafting" implies
/// the inverse too — a field supplied positionally must not also be
/// settable as its own flag).
fn locked_flags(alias: &Alias) -> Vec<String> {
    alias
        .command
        .windows(2)
        .filter_map(|pair| match pair {
            [CommandToken::Literal(lit), CommandToken::Positional(_)] => {
                let name = lit.strip_prefix("--")?;
                Some(name.to_string())
            }
            _ => None,
        })
        .collect()
}

/// Builds one leaf `clap::Command` per alias, exposing `pos1..posN`
/// positionals for the alias's `%N` tokens plus the target operation's
/// flags (minus any locked by positional substitution).
pub fn build_alias_command(alias: &Alias, argv: &[String], schema: &SchemaView) -> clap::Command {
    let mut cmd = clap::Command::new(alias.r#use.clone());
    for short in &alias.aliases {
        cmd = cmd.visible_alias(short.clone());
    }
    cmd = if !alias.short.is_empty() {
        cmd.about(alias.short.clone())
    } else {
        cmd
    };

    if let Some(max) = alias.max_positional() {
        for n in 1..=max {
            cmd = cmd.arg(clap::Arg::new(format!("pos{n}")).required(true));
        }
    }

    if let Some(op_name) = target_operation_name(alias) {
        if let Some(op) = descriptor::by_name(op_name) {
            let locked = locked_flags(alias);
            let flags = flags_for_operation(&op, argv, schema);
            for flag in &flags {
                if locked.contains(&flag.name) {
                    continue;
                }
                cmd = cmd.arg(flag_to_arg(flag));
            }
        }
    }

    cmd
}

/// Builds one `clap::Command` per entity, grouping its aliases as
/// subcommands sorted by `use` (§4.3 "entity verbs ... under a `service`
/// group").
pub fn build_entity_commands(config: &Config, argv: &[String], schema: &SchemaView) -> Vec<clap::Command> {
    let mut by_entity: std::collections::BTreeMap<&str, Vec<&Alias>> = std::collections::BTreeMap::new();
    for alias in &config.aliases {
        by_entity.entry(&alias.entity).or_default().push(alias);
    }

    by_entity
        .into_iter()
        .map(|(entity_name, mut aliases)| {
            aliases.sort_by(|a, b| a.r#use.cmp(&b.r#use));
            let mut cmd = clap::Command::new(entity_name.to_string()).subcommand_required(true);
            if let Some(entity) = config.entities.get(entity_name) {
                for short in &entity.aliases {
                    cmd = cmd.visible_alias(short.clone());
                }
                cmd = cmd.about(format!("manage {} resources", entity.plural));
            }
            for alias in aliases {
                cmd = cmd.subcommand(build_alias_command(alias, argv, schema));
            }
            cmd
        })
        .collect()
}
