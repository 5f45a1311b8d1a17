//! Top-level entry point: assembles the dynamic command tree and threads
//! a parsed invocation to its dispatch handler (§4 "Data flow of one
//! invocation", §5 "one optional re-entry pass").
//!
//! The command tree can't be described with `clap`'s derive macros: its
//! shape depends on the operation descriptor table and the merged config,
//! both only known at runtime. This crate uses the builder API throughout
//! for that reason, recorded in DESIGN.md.

pub mod args;
pub mod builder;
pub mod completions;
pub mod context;
pub mod diagnostics;
pub mod dispatch;
pub mod profile;
pub mod schema_enrich;
pub mod service;

use anyhow::Result;
use context::ExecutionContext;
use dispatch::CommonArgs;
use is_terminal::IsTerminal;

const PROVIDER: &str = "iaas";

/// Scans raw argv for `--data-dir`/`--log-level` before an `ExecutionContext`
/// exists to load them from, the same bootstrapping problem every CLI with
/// a config-dependent command tree runs into.
fn prescan_globals(argv: &[String]) -> (String, String) {
    let mut data_dir = "~/.octl".to_string();
    let mut log_level = "info".to_string();
    let mut iter = argv.iter().peekable();
    while let Some(arg) = iter.next() {
        if let Some(value) = arg.strip_prefix("--data-dir=") {
            data_dir = value.to_string();
        } else if arg == "--data-dir" {
            if let Some(value) = iter.next() {
                data_dir = value.clone();
            }
        } else if let Some(value) = arg.strip_prefix("--log-level=") {
            log_level = value.to_string();
        } else if arg == "--log-level" {
            if let Some(value) = iter.next() {
                log_level = value.clone();
            }
        }
    }
    (data_dir, log_level)
}

fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!(level, "logging initialized");
}

/// Builds the whole command tree: `octl iaas { api <Operation>, profile,
/// <entity> }` (§4.3 "CLI surface"). `argv` is the already-stripped `iaas`
/// subcommand's own arguments, used to prescan slice visibility so a
/// second `--block-device-mappings.1.*` flag shows up on `--help` once the
/// caller has actually supplied one.
pub fn build_root_command(ctx: &ExecutionContext, argv: &[String]) -> clap::Command {
    let api = builder::build_api_command(argv, &ctx.schema);
    let profile = profile::build_profile_command();
    let entities = service::build_entity_commands(&ctx.config, argv, &ctx.schema);

    let mut iaas = clap::Command::new(PROVIDER)
        .about("IaaS provider commands")
        .subcommand_required(true)
        .args(args::global_args())
        .subcommand(api)
        .subcommand(profile);
    for entity_cmd in entities {
        iaas = iaas.subcommand(entity_cmd);
    }

    clap::Command::new("octl")
        .about("CLI client for a cloud IaaS API")
        .subcommand_required(true)
        .subcommand(iaas)
        .subcommand(completions::build_completions_command())
}

/// Routes a parsed invocation to its handler (§4 "Data flow of one
/// invocation"). Direct `api <Operation>` calls resolve their entity (if
/// any) from `ctx.config.contents`, so table rendering works even outside
/// the alias path; entity-verb calls hand off to the Alias Engine.
pub fn dispatch_root(ctx: &ExecutionContext, root: &clap::Command, matches: &clap::ArgMatches) -> Result<()> {
    if let Some(("completions", completions_matches)) = matches.subcommand() {
        completions::dispatch_completions(&mut root.clone(), completions_matches);
        return Ok(());
    }
    let Some(("iaas", iaas_matches)) = matches.subcommand() else {
        anyhow::bail!("expected the `iaas` provider subcommand or `completions`");
    };
    let common = CommonArgs::from_matches(iaas_matches);

    match iaas_matches.subcommand() {
        Some(("api", api_matches)) => {
            let Some((op_name, op_matches)) = api_matches.subcommand() else {
                anyhow::bail!("expected an operation name under `api`");
            };
            let operation = octl_client::descriptor::by_name(op_name)
                .ok_or_else(|| anyhow::anyhow!("unknown operation {op_name}"))?;
            let flags = builder::flags_for_operation(&operation, &[], &ctx.schema);
            let entity = ctx
                .config
                .contents
                .get(op_name)
                .and_then(|entry| entry.entity.as_deref())
                .and_then(|name| ctx.config.entities.get(name));
            dispatch::dispatch_operation(ctx, &operation, &flags, op_matches, &common, entity)
        }
        Some(("profile", profile_matches)) => profile::dispatch_profile(ctx, profile_matches),
        Some((entity_name, entity_matches)) => {
            let verb = entity_matches
                .subcommand_name()
                .ok_or_else(|| anyhow::anyhow!("expected a verb under {entity_name}"))?;
            let alias = ctx
                .config
                .aliases
                .iter()
                .find(|a| a.entity == entity_name && a.r#use == verb)
                .ok_or_else(|| anyhow::anyhow!("no such command: {entity_name} {verb}"))?;
            let (_, leaf_matches) = entity_matches.subcommand().expect("checked above");
            let entity_cmd = root
                .find_subcommand("iaas")
                .and_then(|iaas| iaas.find_subcommand(entity_name))
                .and_then(|e| e.find_subcommand(verb))
                .ok_or_else(|| anyhow::anyhow!("internal: lost track of {entity_name} {verb}"))?;
            dispatch::dispatch_alias(ctx, alias, entity_cmd, leaf_matches)
        }
        None => anyhow::bail!("expected a subcommand under `iaas`"),
    }
}

pub fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (data_dir, log_level) = prescan_globals(&argv);
    init_logging(&log_level);

    let colorize = std::io::stdout().is_terminal();
    let verbose = argv.iter().any(|a| a == "-v" || a == "--verbose");
    let ctx = ExecutionContext::new(&data_dir, colorize, verbose)?;

    let mut full_argv = vec!["octl".to_string()];
    full_argv.extend(argv.clone());
    let iaas_argv = if argv.first().map(String::as_str) == Some(PROVIDER) {
        &argv[1..]
    } else {
        &argv[..]
    };
    let root = build_root_command(&ctx, iaas_argv);
    let matches = root.clone().try_get_matches_from(full_argv)?;
    let outcome = dispatch_root(&ctx, &root, &matches);
    ctx.persist_cloud()?;
    outcome
}
