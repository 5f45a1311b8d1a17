//! The Formatter (§4.9): renders a filtered stream as JSON, YAML, table,
//! base64 or nothing, honoring the `,single` and `,raw` suffix modifiers.

use crate::error::{Error, Result};
use crate::filter::Program;
use chrono::DateTime;
use octl_types::entity::{Column, Entity};
use octl_types::page::ResultItem;
use owo_colors::OwoColorize;
use base64::Engine as _;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Json,
    Yaml,
    Table,
    Base64,
    None,
}

/// The `-o FORMAT[,PARAM]` parse result (§6 "Common flags").
#[derive(Debug, Clone)]
pub struct OutputFormat {
    pub kind: OutputKind,
    /// `,single`: unwrap a one-element sequence to its sole element.
    pub single: bool,
    /// `,raw`: select the raw (non-paginated) reader.
    pub raw: bool,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat {
            kind: OutputKind::Json,
            single: false,
            raw: true,
        }
    }
}

impl OutputFormat {
    pub fn parse(spec: &str) -> Result<Self> {
        let mut parts = spec.split(',');
        let name = parts.next().unwrap_or("").trim();
        let kind = match name.to_ascii_lowercase().as_str() {
            "json" => OutputKind::Json,
            "yaml" => OutputKind::Yaml,
            "table" => OutputKind::Table,
            "base64" => OutputKind::Base64,
            "none" => OutputKind::None,
            other => return Err(Error::Format(format!("unknown output format {other:?}"))),
        };
        let mut single = false;
        let mut raw = false;
        for suffix in parts {
            match suffix.trim().to_ascii_lowercase().as_str() {
                "single" => single = true,
                "raw" => raw = true,
                other => return Err(Error::Format(format!("unknown output suffix {other:?}"))),
            }
        }
        Ok(OutputFormat { kind, single, raw })
    }
}

/// What a rendering pass produced: most strategies emit text, `base64`
/// emits raw decoded bytes (§4.9, "writes raw bytes").
pub enum Rendered {
    Text(String),
    Bytes(Vec<u8>),
}

/// Renders `items` per `format`. The first terminal error in the stream
/// short-circuits rendering and is returned as the render error (§7
/// propagation: "the outputter returns the first such error").
pub fn render(
    format: &OutputFormat,
    items: &[ResultItem],
    entity: Option<&Entity>,
    columns_override: Option<&[Column]>,
    colorize: bool,
) -> Result<Rendered> {
    for item in items {
        if let ResultItem::Error(msg) = item {
            return Err(Error::Remote(msg.clone()));
        }
    }

    let single_entry_seen = items.iter().any(|i| matches!(i, ResultItem::Value { single_entry: true, .. }));
    let values: Vec<Value> = items
        .iter()
        .filter_map(|i| match i {
            ResultItem::Value { payload, .. } => Some(payload.clone()),
            ResultItem::Error(_) => None,
        })
        .collect();
    let single = format.single || single_entry_seen;

    match format.kind {
        OutputKind::None => Ok(Rendered::Text(String::new())),
        OutputKind::Json => Ok(Rendered::Text(render_json(&values, single, colorize))),
        OutputKind::Yaml => Ok(Rendered::Text(render_yaml(&values, single)?)),
        OutputKind::Base64 => render_base64(&values, single),
        OutputKind::Table => {
            let columns = columns_override.map(|c| c.to_vec()).or_else(|| entity.map(|e| e.columns.clone()));
            match columns {
                Some(columns) if !columns.is_empty() => {
                    let explode = entity.map(|e| e.explode).unwrap_or(false);
                    let sort = entity.and_then(|e| e.sort.clone());
                    Ok(Rendered::Text(render_table(&values, &columns, explode, sort.as_deref(), colorize)?))
                }
                // No columns to drive a table: falls back to YAML, mirroring
                // base64's fallback for non-string payloads (§4.9).
                _ => Ok(Rendered::Text(render_yaml(&values, single)?)),
            }
        }
    }
}

fn as_single_or_array(values: &[Value], single: bool) -> Value {
    if single && values.len() == 1 {
        values[0].clone()
    } else {
        Value::Array(values.to_vec())
    }
}

fn render_json(values: &[Value], single: bool, colorize: bool) -> String {
    let target = as_single_or_array(values, single);
    let text = serde_json::to_string_pretty(&target).unwrap_or_default();
    if colorize {
        colorize_json(&text)
    } else {
        text
    }
}

fn json_token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""(?:[^"\\]|\\.)*"(\s*:)?|\btrue\b|\bfalse\b|\bnull\b|-?\d+(\.\d+)?"#).expect("valid regex")
    })
}

/// Line-free token colorizer over pretty-printed JSON text (§4.9: "ANSI-
/// colored iff stdout is a TTY"). No general JSON-coloring crate fit, so
/// this walks tokens with a regex and wraps each in `owo-colors` rather
/// than re-parsing the tree.
fn colorize_json(text: &str) -> String {
    json_token_pattern()
        .replace_all(text, |caps: &regex::Captures| {
            let whole = &caps[0];
            if whole.starts_with('"') {
                if caps.get(1).is_some() {
                    whole.blue().to_string()
                } else {
                    whole.green().to_string()
                }
            } else if whole == "true" || whole == "false" {
                format!("{}", whole.magenta())
            } else if whole == "null" {
                format!("{}", whole.bright_black())
            } else {
                format!("{}", whole.yellow())
            }
        })
        .into_owned()
}

fn render_yaml(values: &[Value], single: bool) -> Result<String> {
    let target = as_single_or_array(values, single);
    serde_yaml::to_string(&target).map_err(|e| Error::Format(e.to_string()))
}

fn render_base64(values: &[Value], single: bool) -> Result<Rendered> {
    let target = as_single_or_array(values, single);
    let strings: Option<Vec<&str>> = match &target {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    };
    match strings {
        Some(strings) if !strings.is_empty() => {
            let mut bytes = Vec::new();
            for s in strings {
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(s)
                    .map_err(|e| Error::Format(format!("invalid base64 payload: {e}")))?;
                bytes.extend(decoded);
            }
            Ok(Rendered::Bytes(bytes))
        }
        // Non-string payload: falls back to YAML (§4.9).
        _ => Ok(Rendered::Text(render_yaml(values, single)?)),
    }
}

fn compile_columns(columns: &[Column]) -> Result<Vec<(String, Program)>> {
    columns
        .iter()
        .map(|c| Program::compile(&c.expression).map(|p| (c.title.clone(), p)))
        .collect::<std::result::Result<Vec<_>, _>>()
}

fn render_table(values: &[Value], columns: &[Column], explode: bool, sort: Option<&str>, colorize: bool) -> Result<String> {
    let compiled = compile_columns(columns)?;
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in values {
        let cells: Vec<Value> = compiled.iter().map(|(_, p)| p.evaluate(record)).collect();
        rows.extend(expand_row(cells, explode));
    }

    if let Some(prefix) = sort {
        if let Some(idx) = compiled.iter().position(|(title, _)| title.starts_with(prefix)) {
            rows.sort_by(|a, b| sort_key(&a[idx]).cmp(&sort_key(&b[idx])));
        }
    }

    let headers: Vec<&str> = compiled.iter().map(|(title, _)| title.as_str()).collect();
    let rendered_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(headers.iter())
                .map(|(cell, header)| render_cell(cell, header, colorize))
                .collect()
        })
        .collect();

    Ok(layout_table(&headers, &rendered_rows))
}

/// If `explode` is set and any cell is an array of length > 1, emits one
/// row per index of the longest such array, replicating every other cell
/// (§4.9, §8 "Table explode").
fn expand_row(cells: Vec<Value>, explode: bool) -> Vec<Vec<Value>> {
    if !explode {
        return vec![cells];
    }
    let max_len = cells.iter().filter_map(|c| c.as_array().map(Vec::len)).max().unwrap_or(0);
    if max_len <= 1 {
        return vec![cells];
    }
    (0..max_len)
        .map(|i| {
            cells
                .iter()
                .map(|c| match c.as_array() {
                    Some(arr) if i < arr.len() => arr[i].clone(),
                    Some(_) => Value::Null,
                    None => c.clone(),
                })
                .collect()
        })
        .collect()
}

fn sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => format!("{n:020}"),
        other => other.to_string(),
    }
}

const STATE_COLUMN_TITLES: &[&str] = &["State", "Status"];

fn render_cell(value: &Value, header: &str, colorize: bool) -> String {
    let text = render_scalar(value);
    if colorize && STATE_COLUMN_TITLES.contains(&header) {
        colorize_state(&text)
    } else {
        text
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                dt.to_rfc3339()
            } else {
                s.clone()
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() != 0.0 => format!("{f:.2}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(render_scalar).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn colorize_state(text: &str) -> String {
    match text {
        "running" | "available" | "active" | "in-use" => format!("{}", text.green()),
        "failed" | "error" | "terminated" => format!("{}", text.red()),
        "creating" | "pending" | "deleting" | "stopping" => format!("{}", text.yellow()),
        "stopped" => format!("{}", text.bright_black()),
        _ => text.to_string(),
    }
}

/// Column-aligned layout, auto-fit to the terminal width when computable
/// (§4.9). Each column is capped to an even share of the available width;
/// overflowing cells are truncated with an ellipsis.
fn layout_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(visible_len(cell));
        }
    }

    if let Some((term_width, _)) = terminal_size::terminal_size() {
        let available = term_width.0 as usize;
        let total: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1) * 2;
        if total > available && !widths.is_empty() {
            let budget = (available / widths.len()).max(4);
            for w in widths.iter_mut() {
                *w = (*w).min(budget);
            }
        }
    }

    let mut out = String::new();
    write_row(&mut out, headers.iter().map(|h| h.to_string()).collect::<Vec<_>>().as_slice(), &widths);
    for row in rows {
        write_row(&mut out, row, &widths);
    }
    out
}

fn write_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let rendered: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| pad_or_truncate(cell, *width))
        .collect();
    out.push_str(&rendered.join("  "));
    out.push('\n');
}

fn visible_len(text: &str) -> usize {
    // ANSI escapes don't count toward column width.
    static ANSI: OnceLock<Regex> = OnceLock::new();
    let re = ANSI.get_or_init(|| Regex::new("\u{1b}\\[[0-9;]*m").expect("valid regex"));
    re.replace_all(text, "").chars().count()
}

fn pad_or_truncate(text: &str, width: usize) -> String {
    let len = visible_len(text);
    if len <= width {
        format!("{text}{}", " ".repeat(width - len))
    } else if width > 1 {
        let truncated: String = text.chars().take(width - 1).collect();
        format!("{truncated}…")
    } else {
        text.chars().take(width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_format_with_suffixes() {
        let f = OutputFormat::parse("yaml,single").unwrap();
        assert_eq!(f.kind, OutputKind::Yaml);
        assert!(f.single);
        assert!(!f.raw);
    }

    #[test]
    fn single_suffix_unwraps_one_element_array() {
        let items = vec![ResultItem::value(json!({"VolumeId": "vol-1"}))];
        let format = OutputFormat {
            kind: OutputKind::Json,
            single: true,
            raw: false,
        };
        let Rendered::Text(text) = render(&format, &items, None, None, false).unwrap() else {
            panic!("expected text");
        };
        assert!(!text.trim_start().starts_with('['));
    }

    #[test]
    fn first_terminal_error_short_circuits_render() {
        let items = vec![ResultItem::value(json!({"a": 1})), ResultItem::Error("boom".to_string())];
        let format = OutputFormat::default();
        let err = render(&format, &items, None, None, false).unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
    }

    #[test]
    fn table_explodes_slice_column_replicating_scalars() {
        let entity = Entity {
            singular: "vm".to_string(),
            plural: "vms".to_string(),
            aliases: vec![],
            columns: vec![Column::new("Id", ".VmId"), Column::new("Devices", ".BlockDeviceMappings")],
            explode: true,
            sort: None,
        };
        let items = vec![ResultItem::value(json!({
            "VmId": "vm-1",
            "BlockDeviceMappings": [{"DeviceName": "/dev/sda"}, {"DeviceName": "/dev/sdb"}]
        }))];
        let format = OutputFormat {
            kind: OutputKind::Table,
            single: false,
            raw: false,
        };
        let Rendered::Text(text) = render(&format, &items, Some(&entity), None, false).unwrap() else {
            panic!("expected text");
        };
        let lines: Vec<&str> = text.lines().collect();
        // header + 2 exploded rows
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("vm-1"));
        assert!(lines[2].contains("vm-1"));
    }

    #[test]
    fn table_without_columns_falls_back_to_yaml() {
        let items = vec![ResultItem::value(json!({"a": 1}))];
        let format = OutputFormat {
            kind: OutputKind::Table,
            single: false,
            raw: false,
        };
        let Rendered::Text(text) = render(&format, &items, None, None, false).unwrap() else {
            panic!("expected text");
        };
        assert!(text.contains('a'));
    }
}
