//! Named credential profiles (§6 "Profiles"), stored as a plain JSON map
//! under the data directory rather than reaching for a database for what
//! is, at most, a handful of entries.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub region: String,
}

pub fn profiles_path(data_dir: &Path) -> PathBuf {
    data_dir.join("profiles.json")
}

fn selected_marker_path(data_dir: &Path) -> PathBuf {
    data_dir.join("selected_profile")
}

/// `LoadConfigFile(path) -> (profiles, err)` (§6). Absent file is not an
/// error: a fresh install has no profiles until one is saved.
pub fn load_config_file(path: &Path) -> Result<BTreeMap<String, Profile>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// `Save(path, profiles) -> err` (§6). Writes pretty JSON so a user who
/// edits the file by hand gets something readable.
pub fn save(path: &Path, profiles: &BTreeMap<String, Profile>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(profiles)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

pub fn selected_profile(data_dir: &Path) -> Result<Option<String>> {
    let path = selected_marker_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

pub fn select_profile(data_dir: &Path, name: &str) -> Result<()> {
    let path = selected_marker_path(data_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut file = std::fs::File::create(&path).with_context(|| format!("writing {}", path.display()))?;
    file.write_all(name.as_bytes())?;
    Ok(())
}

pub fn build_profile_command() -> clap::Command {
    clap::Command::new("profile")
        .about("manage named credential profiles")
        .subcommand_required(true)
        .subcommand(clap::Command::new("list").about("list known profiles"))
        .subcommand(
            clap::Command::new("select")
                .about("select the active profile")
                .arg(clap::Arg::new("name").required(true)),
        )
}

pub fn dispatch_profile(ctx: &crate::context::ExecutionContext, matches: &clap::ArgMatches) -> Result<()> {
    let path = profiles_path(ctx.data_dir());
    let profiles = load_config_file(&path)?;

    match matches.subcommand() {
        Some(("list", _)) => {
            let selected = selected_profile(ctx.data_dir())?;
            for name in profiles.keys() {
                if selected.as_deref() == Some(name.as_str()) {
                    println!("* {name}");
                } else {
                    println!("  {name}");
                }
            }
            Ok(())
        }
        Some(("select", select_matches)) => {
            let name: &String = select_matches.get_one("name").expect("required");
            if !profiles.contains_key(name) {
                anyhow::bail!("no such profile: {name}");
            }
            select_profile(ctx.data_dir(), name)?;
            crate::diagnostics::info(ctx.colorize, format!("selected profile {name}"));
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_profiles_through_json() {
        let dir = tempdir().unwrap();
        let path = profiles_path(dir.path());
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".to_string(),
            Profile {
                access_key: "ak".to_string(),
                secret_key: "sk".to_string(),
                region: "eu-west-2".to_string(),
            },
        );
        save(&path, &profiles).unwrap();
        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded, profiles);
    }

    #[test]
    fn missing_config_file_is_an_empty_map_not_an_error() {
        let dir = tempdir().unwrap();
        let loaded = load_config_file(&profiles_path(dir.path())).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn selecting_a_profile_persists_across_reads() {
        let dir = tempdir().unwrap();
        assert_eq!(selected_profile(dir.path()).unwrap(), None);
        select_profile(dir.path(), "default").unwrap();
        assert_eq!(selected_profile(dir.path()).unwrap(), Some("default".to_string()));
    }
}
