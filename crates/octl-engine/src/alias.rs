//! The Alias Engine: rewrites argv for a high-level entity command (`vol
//! create`, `vm describe <id>`, ...) into the equivalent `api <Operation>`
//! invocation and hands it back to the caller to re-parse and re-dispatch
//! (§5: "one optional re-entry pass ... runs to completion before the
//! outer stack returns").

use octl_types::alias::{Alias, AliasFlag, CommandToken, PromptAction};

/// Sentinel argument injected on re-entry so the re-invoked parse never
/// recurses into another alias expansion (§6 "Common flags").
pub const NO_UPGRADE_SENTINEL: &str = "--no-upgrade";

/// Builds the re-entry argv for `alias`: its command tokens with `%N`
/// substituted from `positionals`, followed by `trailing`'s flags renamed
/// per the alias's flag grafts, followed by the sentinel.
pub fn rewrite_argv(alias: &Alias, positionals: &[String], trailing: &[String]) -> Vec<String> {
    tracing::debug!(entity = %alias.entity, r#use = %alias.r#use, "rewriting alias into an api invocation");
    let mut argv: Vec<String> = alias
        .command
        .iter()
        .map(|token| match token {
            CommandToken::Literal(lit) => lit.clone(),
            CommandToken::Positional(n) => positionals.get(n - 1).cloned().unwrap_or_default(),
        })
        .collect();
    argv.extend(rename_flags(&alias.flags, trailing));
    argv.push(NO_UPGRADE_SENTINEL.to_string());
    argv
}

/// Rewrites `--name value` / `--name=value` occurrences in `args` from an
/// alias's exposed flag name to the underlying operation flag's field path
/// (§4.4 "Flag grafting"). Arguments that don't match any graft pass
/// through unchanged.
fn rename_flags(flags: &[AliasFlag], args: &[String]) -> Vec<String> {
    args.iter().map(|arg| rename_one(flags, arg).unwrap_or_else(|| arg.clone())).collect()
}

fn rename_one(flags: &[AliasFlag], arg: &str) -> Option<String> {
    let body = arg.strip_prefix("--")?;
    let (name, value) = match body.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (body, None),
    };
    let flag = flags.iter().find(|f| f.name == name)?;
    Some(match value {
        Some(v) => format!("--{}={v}", flag.alias_to),
        None => format!("--{}", flag.alias_to),
    })
}

/// Every `%N` in the alias's command must be satisfiable from the caller's
/// positional count (§3 invariant); reports the first unmet index, if any.
pub fn missing_positional(alias: &Alias, positional_count: usize) -> Option<usize> {
    match alias.max_positional() {
        Some(max) if max > positional_count => Some(max),
        _ => None,
    }
}

/// Required confirmation gate before a destructive alias runs (§6: "`-y`
/// — suppress delete confirmation", §4.4 "Delete confirmation"). `ask`
/// presents `prompt.display`'s pre-rendered alternate command string (the
/// describe-as-table equivalent) and returns whether the user confirmed.
/// Returns `true` unconditionally when the alias carries no prompt, or the
/// prompt isn't a delete, or confirmation was explicitly skipped.
pub fn confirm_delete(alias: &Alias, skip_confirmation: bool, mut ask: impl FnMut(Option<&str>) -> bool) -> bool {
    let Some(prompt) = &alias.prompt else {
        return true;
    };
    if prompt.action != PromptAction::Delete || skip_confirmation {
        return true;
    }
    ask(prompt.display.as_deref())
}

/// Snapshots a piece of shared mutable state before alias re-entry and
/// restores it on drop — "the flag-save/restore routine is the only
/// mutator of shared state during alias re-entry and is scoped to the
/// current call" (§5).
pub struct StateGuard<'a, T: Clone> {
    target: &'a mut T,
    saved: T,
}

impl<'a, T: Clone> StateGuard<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        let saved = target.clone();
        StateGuard { target, saved }
    }
}

impl<T: Clone> Drop for StateGuard<'_, T> {
    fn drop(&mut self) {
        *self.target = self.saved.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_alias() -> Alias {
        Alias {
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
            flags: vec![AliasFlag {
                name: "size".into(),
                alias_to: "Size".into(),
                required: Some(true),
            }],
            prompt: None,
        }
    }

    #[test]
    fn rewrites_positional_token_and_appends_sentinel() {
        let alias = sample_alias();
        let argv = rewrite_argv(&alias, &["vol-1".to_string()], &[]);
        assert_eq!(argv, vec!["api", "ReadVolumes", "vol-1", NO_UPGRADE_SENTINEL]);
    }

    #[test]
    fn renames_grafted_flag_in_trailing_args() {
        let alias = sample_alias();
        let argv = rewrite_argv(&alias, &["vol-1".to_string()], &["--size=4".to_string()]);
        assert!(argv.contains(&"--Size=4".to_string()));
    }

    #[test]
    fn unmet_positional_is_reported() {
        let alias = sample_alias();
        assert_eq!(missing_positional(&alias, 0), Some(1));
        assert_eq!(missing_positional(&alias, 1), None);
    }

    #[test]
    fn delete_confirmation_skipped_with_y_flag() {
        let mut alias = sample_alias();
        alias.prompt = Some(octl_types::alias::Prompt {
            action: PromptAction::Delete,
            display: Some("vol describe vol-1 -o yaml,single".to_string()),
        });
        assert!(confirm_delete(&alias, true, |_| panic!("should not ask")));
    }

    #[test]
    fn delete_confirmation_surfaces_display_command() {
        let mut alias = sample_alias();
        alias.prompt = Some(octl_types::alias::Prompt {
            action: PromptAction::Delete,
            display: Some("vol describe vol-1 -o yaml,single".to_string()),
        });
        let mut seen = None;
        let confirmed = confirm_delete(&alias, false, |display| {
            seen = display.map(str::to_string);
            true
        });
        assert!(confirmed);
        assert_eq!(seen.as_deref(), Some("vol describe vol-1 -o yaml,single"));
    }

    #[test]
    fn state_guard_restores_on_drop() {
        let mut value = vec![1, 2, 3];
        {
            let guard = StateGuard::new(&mut value);
            guard.target.push(4);
            assert_eq!(*guard.target, vec![1, 2, 3, 4]);
        }
        assert_eq!(value, vec![1, 2, 3]);
    }
}
