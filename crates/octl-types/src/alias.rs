use serde::{Deserialize, Serialize};

/// One token in an alias's target command, either emitted verbatim or
/// substituted from the caller's N-th positional argument (§4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandToken {
    Literal(String),
    Positional(usize),
}

impl CommandToken {
    /// Parses a single token from config/flag text: `%1` becomes
    /// `Positional(1)`, anything else is literal.
    pub fn parse(token: &str) -> Self {
        if let Some(rest) = token.strip_prefix('%') {
            if let Ok(n) = rest.parse::<usize>() {
                return CommandToken::Positional(n);
            }
        }
        CommandToken::Literal(token.to_string())
    }
}

/// A flag rename grafted onto an alias command (§4.4 "Flag grafting"): the
/// alias exposes `name`, but its value is assigned to the underlying
/// low-level flag at `alias_to` (a field path into the target operation's
/// request record).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasFlag {
    pub name: String,
    pub alias_to: String,
    #[serde(default)]
    pub required: Option<bool>,
}

/// A confirmation-prompt action an alias may require before re-entering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptAction {
    Delete,
}

/// A prompt attached to an alias: before rewriting argv and re-entering,
/// run `display` (another alias's `use` name) to show the target record,
/// then require confirmation unless `-y` is set (§4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub action: PromptAction,
    #[serde(default)]
    pub display: Option<String>,
}

/// A mapping from a high-level command path to a low-level invocation
/// (§3 Data Model, "Alias").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alias {
    /// Entity this alias is grouped under (e.g. `volume`).
    pub entity: String,
    /// Command-tree group id (§4.3/§4.4, the `service` group).
    pub group: String,
    /// The verb used on the command line (e.g. `list`, `describe`, `create`).
    pub r#use: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Short usage summary shown in `--help`.
    #[serde(default)]
    pub short: String,
    pub command: Vec<CommandToken>,
    #[serde(default)]
    pub flags: Vec<AliasFlag>,
    #[serde(default)]
    pub prompt: Option<Prompt>,
}

impl Alias {
    /// Every `%N` in `command` must be satisfiable from `positional_count`
    /// caller-supplied positional args (§3 invariant).
    pub fn max_positional(&self) -> Option<usize> {
        self.command
            .iter()
            .filter_map(|t| match t {
                CommandToken::Positional(n) => Some(*n),
                CommandToken::Literal(_) => None,
            })
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positional_tokens() {
        assert_eq!(CommandToken::parse("%1"), CommandToken::Positional(1));
        assert_eq!(
            CommandToken::parse("describe"),
            CommandToken::Literal("describe".to_string())
        );
    }

    #[test]
    fn max_positional_reports_highest_index() {
        let alias = Alias {
            entity: "volume".into(),
            group: "service".into(),
            r#use: "describe".into(),
            aliases: vec!["desc".into()],
            short: "Describe a volume".into(),
            command: vec![
                CommandToken::parse("api"),
                CommandToken::parse("ReadVolumes"),
                CommandToken::parse("%1"),
            ],
            flags: Vec::new(),
            prompt: None,
        };
        assert_eq!(alias.max_positional(), Some(1));
    }
}
