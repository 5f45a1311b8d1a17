//! The Filter Chain (§4.8): a small hand-written query language standing
//! in for a `gojq`-style dependency (no jq-family crate turned up in the
//! retrieved corpus, so this is pure application code rather than a
//! fabricated dependency).
//!
//! Covers dot-path navigation, `select(pred)`, `test("regex")`, `==`
//! comparison, `|` piping, and `find(array, #?.Key == "literal")` for the
//! config generator's tag-derived `Name` column. Values flow through
//! `serde_json::Value` (§4.8: "an intermediate JSON round-trip").

use crate::error::{Error, Result};
use octl_types::page::ResultItem;
use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identity,
    It,
    StringLit(String),
    Field { base: Box<Expr>, name: String },
    Optional(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    Pipe(Box<Expr>, Box<Expr>),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Dot,
    Pipe,
    Eq,
    Question,
    Hash,
    LParen,
    RParen,
    Comma,
    Ident(String),
    Str(String),
}

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' => i += 1,
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '?' => {
                tokens.push(Token::Question);
                i += 1;
            }
            '#' => {
                tokens.push(Token::Hash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Token::Pipe);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Eq);
                i += 2;
            }
            '"' => {
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        s.push(chars[i + 1]);
                        i += 2;
                    } else {
                        s.push(chars[i]);
                        i += 1;
                    }
                }
                if i >= chars.len() {
                    return Err(Error::Filter(format!("unterminated string literal in {src:?}")));
                }
                i += 1;
                tokens.push(Token::Str(s));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(Error::Filter(format!("unexpected character {other:?} in {src:?}"))),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        match self.bump() {
            Some(ref t) if t == expected => Ok(()),
            other => Err(Error::Filter(format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn parse_pipeline(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while matches!(self.peek(), Some(Token::Pipe)) {
            self.bump();
            let right = self.parse_comparison()?;
            left = Expr::Pipe(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_postfix()?;
        if matches!(self.peek(), Some(Token::Eq)) {
            self.bump();
            let right = self.parse_postfix()?;
            return Ok(Expr::Eq(Box::new(left), Box::new(right)));
        }
        Ok(left)
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Question) => {
                    self.bump();
                    expr = Expr::Optional(Box::new(expr));
                }
                Some(Token::Dot) => {
                    self.bump();
                    let name = match self.bump() {
                        Some(Token::Ident(name)) => name,
                        other => return Err(Error::Filter(format!("expected field name, found {other:?}"))),
                    };
                    expr = Expr::Field {
                        base: Box::new(expr),
                        name,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.bump() {
            Some(Token::Dot) => Ok(Expr::Identity),
            Some(Token::Hash) => Ok(Expr::It),
            Some(Token::Str(s)) => Ok(Expr::StringLit(s)),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.bump();
                    let mut args = Vec::new();
                    if !matches!(self.peek(), Some(Token::RParen)) {
                        args.push(self.parse_pipeline()?);
                        while matches!(self.peek(), Some(Token::Comma)) {
                            self.bump();
                            args.push(self.parse_pipeline()?);
                        }
                    }
                    self.expect(&Token::RParen)?;
                    Ok(Expr::Call { name, args })
                } else {
                    Err(Error::Filter(format!("bareword {name:?} is not a valid expression")))
                }
            }
            other => Err(Error::Filter(format!("unexpected token {other:?}"))),
        }
    }
}

/// A compiled query-language program (§3 Data Model, "Column": "the
/// compiled program is memoized on first use per process" — the memoizing
/// cache lives with whoever owns repeated evaluation, e.g. the table
/// formatter's column list; this type is just the compiled form).
#[derive(Debug, Clone)]
pub struct Program(Expr);

impl Program {
    pub fn compile(src: &str) -> Result<Self> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_pipeline()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::Filter(format!("trailing input after expression {src:?}")));
        }
        Ok(Program(expr))
    }

    /// Evaluates the program as a filter-chain stage: `select(...)` keeps
    /// or drops the item unchanged; any other expression is a transform
    /// whose result becomes the new item.
    pub fn apply_stage(&self, item: &Value) -> Option<Value> {
        if let Expr::Call { name, args } = &self.0 {
            if name == "select" {
                let ctx = EvalCtx::new(item.clone());
                let keep = args.first().map(|a| eval(a, &ctx)).map(truthy).unwrap_or(false);
                return if keep { Some(item.clone()) } else { None };
            }
        }
        let ctx = EvalCtx::new(item.clone());
        Some(eval(&self.0, &ctx))
    }

    /// Evaluates the program as a column expression against a single
    /// record (§3 Data Model, "Column").
    pub fn evaluate(&self, record: &Value) -> Value {
        eval(&self.0, &EvalCtx::new(record.clone()))
    }
}

struct EvalCtx {
    current: Value,
    it: Value,
}

impl EvalCtx {
    fn new(current: Value) -> Self {
        EvalCtx {
            current,
            it: Value::Null,
        }
    }

    fn with_current(&self, current: Value) -> Self {
        EvalCtx {
            current,
            it: self.it.clone(),
        }
    }

    fn with_it(&self, it: Value) -> Self {
        EvalCtx {
            current: self.current.clone(),
            it,
        }
    }
}

fn truthy(value: Value) -> bool {
    match value {
        Value::Bool(b) => b,
        Value::Null => false,
        _ => true,
    }
}

fn eval(expr: &Expr, ctx: &EvalCtx) -> Value {
    match expr {
        Expr::Identity => ctx.current.clone(),
        Expr::It => ctx.it.clone(),
        Expr::StringLit(s) => Value::String(s.clone()),
        Expr::Field { base, name } => {
            let base_value = eval(base, ctx);
            if base_value.is_null() {
                return Value::Null;
            }
            base_value.get(name).cloned().unwrap_or(Value::Null)
        }
        // `?` is a no-op at evaluation time: every lookup already fails
        // soft to `Value::Null` rather than erroring, matching the rest of
        // this codebase's "fail soft on absent schema info" convention.
        Expr::Optional(inner) => eval(inner, ctx),
        Expr::Eq(a, b) => Value::Bool(eval(a, ctx) == eval(b, ctx)),
        Expr::Pipe(a, b) => {
            let value = eval(a, ctx);
            eval(b, &ctx.with_current(value))
        }
        Expr::Call { name, args } => eval_call(name, args, ctx),
    }
}

fn eval_call(name: &str, args: &[Expr], ctx: &EvalCtx) -> Value {
    match name {
        "select" => {
            let keep = args.first().map(|a| eval(a, ctx)).map(truthy).unwrap_or(false);
            if keep {
                ctx.current.clone()
            } else {
                Value::Null
            }
        }
        "test" => {
            let Some(pattern) = args.first().map(|a| eval(a, ctx)) else {
                return Value::Bool(false);
            };
            let Some(pattern) = pattern.as_str() else {
                return Value::Bool(false);
            };
            let haystack = match &ctx.current {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Regex::new(pattern)
                .map(|re| Value::Bool(re.is_match(&haystack)))
                .unwrap_or(Value::Bool(false))
        }
        "find" => {
            let Some(array_expr) = args.first() else {
                return Value::Null;
            };
            let Some(predicate) = args.get(1) else {
                return Value::Null;
            };
            let array = eval(array_expr, ctx);
            let Some(items) = array.as_array() else {
                return Value::Null;
            };
            for item in items {
                let sub_ctx = ctx.with_it(item.clone());
                if truthy(eval(predicate, &sub_ctx)) {
                    return item.clone();
                }
            }
            Value::Null
        }
        _ => Value::Null,
    }
}

/// Desugars `--filter FIELD:VALUE` into `select(.FIELD | test("VALUE"))`
/// (§4.8).
pub fn desugar_field_filter(field: &str, value: &str) -> String {
    format!("select(.{field} | test(\"{}\"))", value.replace('"', "\\\""))
}

/// Runs a whole `--filter`/`--jq` chain over a stream of result items.
/// Every stage sees a terminal error and yields it unchanged before
/// halting for that item (§4.8: "each stage sees terminal errors and
/// yields them unchanged before halting"); a `select` stage dropping an
/// item removes it from the stream entirely rather than producing an
/// error.
pub fn run_chain(items: Vec<ResultItem>, stages: &[Program]) -> Vec<ResultItem> {
    items
        .into_iter()
        .filter_map(|item| run_chain_one(item, stages))
        .collect()
}

fn run_chain_one(item: ResultItem, stages: &[Program]) -> Option<ResultItem> {
    let ResultItem::Value { payload, single_entry } = item else {
        return Some(item);
    };
    let mut current = payload;
    for stage in stages {
        match stage.apply_stage(&current) {
            Some(next) => current = next,
            None => return None,
        }
    }
    Some(ResultItem::Value {
        payload: current,
        single_entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_filter_shortcut_keeps_matching_items() {
        let src = desugar_field_filter("VolumeType", "standard");
        let program = Program::compile(&src).unwrap();
        assert!(program.apply_stage(&json!({"VolumeType": "standard"})).is_some());
        assert!(program.apply_stage(&json!({"VolumeType": "io1"})).is_none());
    }

    #[test]
    fn jq_field_projection_maps_each_item() {
        let program = Program::compile(".VolumeType").unwrap();
        let mapped = program.apply_stage(&json!({"VolumeType": "standard", "Size": 4}));
        assert_eq!(mapped, Some(json!("standard")));
    }

    #[test]
    fn find_resolves_tag_value_by_key() {
        let program = Program::compile(r#"find(Tags, #?.Key == "Name")?.Value"#).unwrap();
        let record = json!({"Tags": [{"Key": "Env", "Value": "prod"}, {"Key": "Name", "Value": "web-1"}]});
        assert_eq!(program.evaluate(&record), json!("web-1"));
    }

    #[test]
    fn find_with_no_match_is_null() {
        let program = Program::compile(r#"find(Tags, #?.Key == "Name")?.Value"#).unwrap();
        let record = json!({"Tags": []});
        assert_eq!(program.evaluate(&record), Value::Null);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(Program::compile(".Foo bareword").is_err());
    }

    #[test]
    fn chain_drops_items_a_select_stage_rejects() {
        let stages = vec![Program::compile(&desugar_field_filter("VolumeType", "standard")).unwrap()];
        let items = vec![
            ResultItem::value(json!({"VolumeType": "standard"})),
            ResultItem::value(json!({"VolumeType": "io1"})),
        ];
        let result = run_chain(items, &stages);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn chain_passes_terminal_errors_through_unchanged() {
        let stages = vec![Program::compile(".VolumeType").unwrap()];
        let items = vec![ResultItem::Error("boom".to_string())];
        let result = run_chain(items, &stages);
        assert_eq!(result, vec![ResultItem::Error("boom".to_string())]);
    }

    #[test]
    fn chain_applies_stages_in_sequence() {
        let stages = vec![
            Program::compile(&desugar_field_filter("VolumeType", "standard")).unwrap(),
            Program::compile(".VolumeType").unwrap(),
        ];
        let items = vec![ResultItem::value(json!({"VolumeType": "standard", "Size": 4}))];
        let result = run_chain(items, &stages);
        assert_eq!(result, vec![ResultItem::value(json!("standard"))]);
    }
}
