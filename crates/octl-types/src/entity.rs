use serde::{Deserialize, Serialize};

/// A (title, expression) pair the table formatter evaluates against a
/// single response record (§3 Data Model, "Column"). The expression is in
/// the same query language `octl-engine::filter` compiles for `--jq`;
/// compilation is memoized on first use by whoever owns the column list at
/// runtime, not by this plain data type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    pub expression: String,
}

impl Column {
    pub fn new(title: impl Into<String>, expression: impl Into<String>) -> Self {
        Column {
            title: title.into(),
            expression: expression.into(),
        }
    }

    /// Parses the `Title:Expression|Title:Expression` serialization used by
    /// the config file's `columns` key and the `--columns` flag.
    pub fn parse_list(spec: &str) -> Vec<Column> {
        spec.split('|')
            .filter(|s| !s.is_empty())
            .filter_map(|pair| {
                let (title, expr) = pair.split_once(':')?;
                Some(Column::new(title, expr))
            })
            .collect()
    }

    pub fn render_list(columns: &[Column]) -> String {
        columns
            .iter()
            .map(|c| format!("{}:{}", c.title, c.expression))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// A high-level noun derived from a Read operation's response field name
/// (§3 Data Model, "Entity"). Produced by the Config Generator, loaded at
/// startup, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub singular: String,
    pub plural: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub explode: bool,
    #[serde(default)]
    pub sort: Option<String>,
}

impl Entity {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Entity {
            singular: singular.into(),
            plural: plural.into(),
            aliases: Vec::new(),
            columns: Vec::new(),
            explode: false,
            sort: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_column_list() {
        let columns = Column::parse_list("Id:.VolumeId|State:.State");
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].title, "Id");
        assert_eq!(columns[1].expression, ".State");
    }

    #[test]
    fn round_trips_column_list() {
        let columns = vec![Column::new("Id", ".VolumeId"), Column::new("State", ".State")];
        assert_eq!(Column::render_list(&columns), "Id:.VolumeId|State:.State");
    }
}
