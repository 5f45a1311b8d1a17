//! Offline config generator binary: scans the operation descriptor table
//! and writes the YAML config consumed at runtime by `octl-cli` (§4.5,
//! §6 "Config file format").
//!
//! Usage: `octl-configgen [output-path]` (defaults to stdout).

use anyhow::Context;
use std::io::Write;

fn main() -> anyhow::Result<()> {
    let operations = octl_client::descriptor::all();
    let (config, guesses) = octl_configgen::generate(&operations);

    for guess in &guesses {
        eprintln!("warning: {guess}");
    }

    let yaml = serde_yaml::to_string(&config).context("serializing generated config to YAML")?;

    match std::env::args().nth(1) {
        Some(path) => {
            std::fs::write(&path, yaml).with_context(|| format!("writing {path}"))?;
        }
        None => {
            std::io::stdout()
                .write_all(yaml.as_bytes())
                .context("writing generated config to stdout")?;
        }
    }

    Ok(())
}
