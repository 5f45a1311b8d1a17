//! Carries a parsed command the rest of the way: extracts common flags,
//! builds the request, runs the call through the output pipeline, and
//! handles the one-shot alias-to-operation re-entry (§4.6-§4.9, §5).

use crate::args;
use crate::context::ExecutionContext;
use anyhow::{Context, Result};
use octl_engine::alias::{confirm_delete, missing_positional, rewrite_argv};
use octl_engine::filter::{desugar_field_filter, run_chain, Program};
use octl_engine::format::{render, OutputFormat, Rendered};
use octl_engine::page::PageReader;
use octl_engine::request::template::{decode_base, substitute};
use octl_engine::request::{build_request, ChangedFlag};
use octl_engine::spinner::with_spinner;
use octl_types::alias::Alias;
use octl_types::entity::{Column, Entity};
use octl_types::field::ScalarKind;
use octl_types::page::ResultItem;
use octl_types::{Flag, Operation};
use is_terminal::IsTerminal;
use serde_json::Value;
use std::io::{Read, Write};

/// The global flags every leaf inherits (§6 "Common flags"), pulled once
/// out of whichever `ArgMatches` level actually owns them — `global(true)`
/// makes them readable from any descendant's matches.
pub struct CommonArgs {
    pub output: String,
    pub filters: Vec<(String, String)>,
    pub jq: Vec<String>,
    pub columns: Option<String>,
    pub template: Option<String>,
    pub yes: bool,
}

impl CommonArgs {
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        let output = matches
            .get_one::<String>(args::OUTPUT_FLAG)
            .cloned()
            .unwrap_or_else(|| args::DEFAULT_OUTPUT.to_string());
        let filters = matches
            .get_many::<String>(args::FILTER_FLAG)
            .map(|vals| vals.filter_map(|v| v.split_once(':')).map(|(f, v)| (f.to_string(), v.to_string())).collect())
            .unwrap_or_default();
        let jq = matches
            .get_many::<String>(args::JQ_FLAG)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        let columns = matches.get_one::<String>(args::COLUMNS_FLAG).cloned();
        let template = matches.get_one::<String>(args::TEMPLATE_FLAG).cloned();
        let yes = matches.get_flag(args::YES_FLAG);
        CommonArgs { output, filters, jq, columns, template, yes }
    }
}

/// Reads all of stdin if it isn't a tty, for chain-input/`--template -`
/// support (§4.8 "Chaining"). Returns `None` for an interactive terminal,
/// matching "chaining only kicks in when stdin is actually piped".
pub fn read_stdin_if_piped() -> Option<String> {
    if std::io::stdin().is_terminal() {
        return None;
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf).ok()?;
    if buf.trim().is_empty() {
        None
    } else {
        Some(buf)
    }
}

fn resolve_base(common: &CommonArgs, stdin_text: Option<&str>, chain_input: Option<&Value>) -> Result<Option<Value>> {
    match &common.template {
        Some(path) if path == "-" => {
            let text = stdin_text.context("--template - given but stdin was not piped")?;
            Ok(Some(decode_base(text, chain_input)?))
        }
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            Ok(Some(decode_base(&text, chain_input)?))
        }
        None => Ok(chain_input.cloned()),
    }
}

fn coerce_flag_value(flag: &Flag, raw: &str, chain_input: Option<&Value>) -> Result<Value> {
    let substituted = substitute(raw, chain_input)?;
    if flag.is_json() {
        return Ok(serde_json::from_str(&substituted).with_context(|| format!("parsing --{} as JSON", flag.name))?);
    }
    if flag.is_time() {
        let parsed = octl_flags::parse_time_value(&substituted, octl_flags::system_now)
            .map_err(|e| anyhow::anyhow!("parsing --{}: {e}", flag.name))?;
        return Ok(Value::String(parsed.to_rfc3339()));
    }
    Ok(coerce_scalar(flag.kind, &substituted))
}

fn coerce_scalar(kind: ScalarKind, text: &str) -> Value {
    match kind {
        ScalarKind::Bool => Value::Bool(text.eq_ignore_ascii_case("true") || text == "1"),
        ScalarKind::Int => text.parse::<i64>().map(Value::from).unwrap_or(Value::Null),
        ScalarKind::String => Value::String(text.to_string()),
    }
}

/// Extracts every flag the caller actually set on the command line into
/// [`ChangedFlag`]s, coercing by the flag's declared kind/custom parser
/// (§4.6 step 2).
fn gather_changed_flags(flags: &[Flag], matches: &clap::ArgMatches, chain_input: Option<&Value>) -> Result<Vec<ChangedFlag>> {
    let mut changed = Vec::new();
    for flag in flags {
        let id = flag.field_path.as_str();
        if matches.value_source(id) != Some(clap::parser::ValueSource::CommandLine) {
            continue;
        }
        let value = if flag.slice {
            let values: Vec<Value> = matches
                .get_many::<String>(id)
                .map(|vals| vals.map(|v| coerce_scalar(flag.kind, v)).collect())
                .unwrap_or_default();
            Value::Array(values)
        } else if matches!(flag.kind, ScalarKind::Bool) && flag.custom_parser.is_none() {
            Value::Bool(matches.get_flag(id))
        } else {
            let raw = matches.get_one::<String>(id).cloned().unwrap_or_default();
            coerce_flag_value(flag, &raw, chain_input)?
        };
        changed.push(ChangedFlag::new(flag.field_path.clone(), value));
    }
    Ok(changed)
}

/// Parses `--columns` into an override list. A leading `+` appends to the
/// entity's own columns instead of replacing them (§4.9 "`--columns`").
fn resolve_columns(spec: Option<&str>, entity: Option<&Entity>) -> Option<Vec<Column>> {
    let spec = spec?;
    if let Some(appended) = spec.strip_prefix('+') {
        let mut columns = entity.map(|e| e.columns.clone()).unwrap_or_default();
        columns.extend(Column::parse_list(appended));
        Some(columns)
    } else {
        Some(Column::parse_list(spec))
    }
}

fn compile_filter_stages(common: &CommonArgs) -> Result<Vec<Program>> {
    let mut stages = Vec::new();
    for (field, value) in &common.filters {
        stages.push(Program::compile(&desugar_field_filter(field, value))?);
    }
    for expr in &common.jq {
        stages.push(Program::compile(expr)?);
    }
    Ok(stages)
}

pub fn write_rendered(rendered: Rendered) -> Result<()> {
    match rendered {
        Rendered::Text(text) => {
            if !text.is_empty() {
                println!("{text}");
            }
            Ok(())
        }
        Rendered::Bytes(bytes) => {
            std::io::stdout().write_all(&bytes)?;
            Ok(())
        }
    }
}

/// Runs a single operation to completion: build request, call, paginate,
/// filter, render. Used by both direct `api <Operation>` invocations and
/// alias re-entry (which funnels back through exactly this path).
pub fn dispatch_operation(
    ctx: &ExecutionContext,
    operation: &Operation,
    flags: &[Flag],
    matches: &clap::ArgMatches,
    common: &CommonArgs,
    entity: Option<&Entity>,
) -> Result<()> {
    tracing::info!(operation = %operation.name, "dispatching operation");
    let stdin_text = read_stdin_if_piped();
    let chain_input: Option<Value> = stdin_text.as_deref().and_then(|t| serde_json::from_str(t).ok());

    let base = resolve_base(common, stdin_text.as_deref(), chain_input.as_ref())?;
    let changed = gather_changed_flags(flags, matches, chain_input.as_ref())?;
    let request = build_request(base, &changed, flags)?;

    let format = OutputFormat::parse(&common.output)?;
    let reader = PageReader::new(&ctx.cloud, operation);
    let items: Vec<ResultItem> = with_spinner(ctx.verbose, &operation.name, || -> Result<Vec<ResultItem>> {
        if format.raw {
            Ok(vec![reader.read_raw(&request)])
        } else {
            reader.collect_all(request)
        }
    })?;

    let stages = compile_filter_stages(common)?;
    let filtered = run_chain(items, &stages);

    let columns_override = resolve_columns(common.columns.as_deref(), entity);
    let rendered = render(&format, &filtered, entity, columns_override.as_deref(), ctx.colorize)?;
    write_rendered(rendered)
}

fn confirm_interactively(display: Option<&str>) -> bool {
    if let Some(display) = display {
        eprintln!("about to run the equivalent of: {display}");
    }
    eprint!("proceed? [y/N] ");
    let _ = std::io::stderr().flush();
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reconstructs `--{long}={value}`/`--{long}` tokens for every arg the
/// caller explicitly set on this alias's own flags, so they can ride along
/// on re-entry unchanged (the alias's command already pins the target
/// operation flag name for anything positional).
fn reconstruct_target_flags(cmd: &clap::Command, matches: &clap::ArgMatches) -> Vec<String> {
    let mut out = Vec::new();
    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_str();
        if arg.is_positional() {
            continue;
        }
        if matches.value_source(id) != Some(clap::parser::ValueSource::CommandLine) {
            continue;
        }
        let Some(long) = arg.get_long() else { continue };
        match arg.get_action() {
            clap::ArgAction::SetTrue => out.push(format!("--{long}")),
            clap::ArgAction::Set => {
                if let Some(values) = matches.get_many::<String>(id) {
                    let joined = values.cloned().collect::<Vec<_>>().join(",");
                    out.push(format!("--{long}={joined}"));
                }
            }
            _ => {}
        }
    }
    out
}

fn reconstruct_common(common: &CommonArgs) -> Vec<String> {
    let mut out = Vec::new();
    if common.output != args::DEFAULT_OUTPUT {
        out.push(format!("--output={}", common.output));
    }
    for (field, value) in &common.filters {
        out.push(format!("--filter={field}:{value}"));
    }
    for expr in &common.jq {
        out.push(format!("--jq={expr}"));
    }
    if let Some(columns) = &common.columns {
        out.push(format!("--columns={columns}"));
    }
    if let Some(template) = &common.template {
        out.push(format!("--template={template}"));
    }
    if common.yes {
        out.push("-y".to_string());
    }
    out
}

/// Re-enters the root parse with the alias's command tokens rewritten into
/// the equivalent `api <Operation>` argv (§5). Positional substitution
/// embeds the already-pinned flag's value as a normal `--flag value` pair,
/// so the re-parsed `api` leaf sees nothing different from a direct call —
/// no separate "locked value" channel is needed here.
pub fn dispatch_alias(
    ctx: &ExecutionContext,
    alias: &Alias,
    cmd: &clap::Command,
    matches: &clap::ArgMatches,
) -> Result<()> {
    let positionals: Vec<String> = (1..=alias.max_positional().unwrap_or(0))
        .map(|n| matches.get_one::<String>(&format!("pos{n}")).cloned().unwrap_or_default())
        .collect();

    if let Some(missing) = missing_positional(alias, positionals.len()) {
        anyhow::bail!("{} requires positional argument {missing}", alias.r#use);
    }

    let common = CommonArgs::from_matches(matches);
    if !confirm_delete(alias, common.yes, |display| confirm_interactively(display)) {
        crate::diagnostics::info(ctx.colorize, "aborted; no changes made");
        return Ok(());
    }

    let mut trailing = reconstruct_target_flags(cmd, matches);
    trailing.extend(reconstruct_common(&common));

    let rewritten = rewrite_argv(alias, &positionals, &trailing);
    let mut full_argv = vec!["octl".to_string(), "iaas".to_string()];
    full_argv.extend(rewritten);

    let root = crate::build_root_command(ctx, &full_argv[2..]);
    let reentered = root.clone().try_get_matches_from(full_argv.clone())?;
    crate::dispatch_root(ctx, &root, &reentered)
}
