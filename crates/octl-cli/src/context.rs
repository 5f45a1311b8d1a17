//! Ambient, read-only collaborators assembled once at startup and shared
//! across every dispatch: the Schema View, the generated Config and the
//! fake cloud backend every leaf command needs to do its work.

use crate::args::expand_tilde;
use anyhow::{Context, Result};
use octl_client::FakeCloud;
use octl_schema::SchemaView;
use octl_types::Config;
use std::path::{Path, PathBuf};

const EMBEDDED_OPENAPI: &str = include_str!("../assets/openapi.json");

/// Manual short name added on top of the generated `volume` entity
/// (§4.5's generator never emits one itself — only `list`/`describe` get
/// `ls`/`desc`, `delete` gets `del`/`rm`). Recorded as an Open Question
/// decision in DESIGN.md rather than widening the generator's naming rule
/// for a single entity.
const VOLUME_SHORT_ALIAS: &str = "vol";

/// Everything a leaf command needs to read a request, make a call and
/// render a response: the schema view, the merged config, and the fake
/// cloud backend standing in for the out-of-scope transport layer.
pub struct ExecutionContext {
    data_dir: PathBuf,
    pub schema: SchemaView,
    pub config: Config,
    pub cloud: FakeCloud,
    pub colorize: bool,
    pub verbose: bool,
}

impl ExecutionContext {
    pub fn new(data_dir: &str, colorize: bool, verbose: bool) -> Result<Self> {
        let data_dir = expand_tilde(data_dir);
        let schema = SchemaView::load(EMBEDDED_OPENAPI).context("loading the embedded OpenAPI document")?;

        let generated = octl_configgen::generate(&octl_client::descriptor::all()).0;
        let base = load_base_config(&data_dir).context("loading config.yaml")?;
        let mut config = base.merge_base(generated);
        if let Some(volume) = config.entities.get_mut("volume") {
            if !volume.aliases.iter().any(|a| a == VOLUME_SHORT_ALIAS) {
                volume.aliases.push(VOLUME_SHORT_ALIAS.to_string());
            }
        }

        let cloud = FakeCloud::load(&cloud_state_path(&data_dir));

        Ok(ExecutionContext {
            data_dir,
            schema,
            config,
            cloud,
            colorize,
            verbose,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Writes the fake cloud's current resources back to disk so the next
    /// invocation in this data directory — e.g. the second half of a
    /// piped chain (§8 scenario 5) — sees what this one created.
    pub fn persist_cloud(&self) -> Result<()> {
        self.cloud.save(&cloud_state_path(&self.data_dir)).context("saving cloud state")
    }
}

fn cloud_state_path(data_dir: &Path) -> PathBuf {
    data_dir.join("cloud_state.json")
}

/// Loads a hand-authored base config, if any, from `<data-dir>/config.yaml`
/// (§6 "Config file format"). Absent is not an error: every installation
/// works from the generated config alone until the user opts into one.
fn load_base_config(data_dir: &Path) -> Result<Config> {
    let path = data_dir.join("config.yaml");
    if !path.exists() {
        return Ok(Config::new());
    }
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
