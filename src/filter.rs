use crate::document::Document;
use crate::schema::SearchIndex;
use crate::value::Value;
use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Filter strings longer than this skip parsing entirely and pass every
/// candidate through. DoS guard, not a correctness feature.
pub const MAX_FILTER_LEN: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextFn {
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
}

/// Parsed filter expression. `and`/`or` fold left to right with equal
/// binding strength; parentheses group explicitly.
#[derive(Debug, Clone)]
pub(crate) enum Expr {
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    Text {
        func: TextFn,
        field: String,
        needle: String,
    },
    Binary {
        op: BoolOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Parse failure. Never escapes this module: recovery is the constrained
/// fallback parser or an unfiltered pass-through.
#[derive(Debug, thiserror::Error)]
#[error("filter parse error: {0}")]
struct FilterParseError(String);

// ========== Lexer ==========

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(String),
    LParen,
    RParen,
    Comma,
}

fn lex(input: &str) -> Result<Vec<Token>, FilterParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '\'' => {
                chars.next();
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => s.push(c),
                        None => {
                            return Err(FilterParseError("unterminated string literal".to_string()))
                        }
                    }
                }
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut n = String::new();
                n.push(c);
                chars.next();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || c == '.' {
                        n.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Num(n));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            other => {
                return Err(FilterParseError(format!("unexpected character '{}'", other)));
            }
        }
    }

    Ok(tokens)
}

// ========== Parser ==========

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn keyword(&self) -> Option<String> {
        match self.peek() {
            Some(Token::Ident(s)) => Some(s.to_lowercase()),
            _ => None,
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), FilterParseError> {
        match self.advance() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(FilterParseError(format!(
                "expected {:?}, found {:?}",
                expected, other
            ))),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, FilterParseError> {
        let mut expr = self.parse_term()?;
        loop {
            match self.keyword().as_deref() {
                Some("and") => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    expr = Expr::Binary {
                        op: BoolOp::And,
                        lhs: Box::new(expr),
                        rhs: Box::new(rhs),
                    };
                }
                Some("or") => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    expr = Expr::Binary {
                        op: BoolOp::Or,
                        lhs: Box::new(expr),
                        rhs: Box::new(rhs),
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, FilterParseError> {
        if self.peek() == Some(&Token::LParen) {
            self.advance();
            let expr = self.parse_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }

        let func = match self.keyword().as_deref() {
            Some("contains") => Some(TextFn::Contains),
            Some("startswith") => Some(TextFn::StartsWith),
            Some("endswith") => Some(TextFn::EndsWith),
            _ => None,
        };
        if let Some(func) = func {
            if self.tokens.get(self.pos + 1) == Some(&Token::LParen) {
                return self.parse_func_call(func);
            }
        }

        self.parse_comparison()
    }

    fn parse_func_call(&mut self, func: TextFn) -> Result<Expr, FilterParseError> {
        self.advance(); // function name
        self.expect(&Token::LParen)?;
        let field = match self.advance() {
            Some(Token::Ident(name)) => name,
            other => {
                return Err(FilterParseError(format!(
                    "expected field name, found {:?}",
                    other
                )))
            }
        };
        self.expect(&Token::Comma)?;
        let needle = match self.advance() {
            Some(Token::Str(s)) => s,
            other => {
                return Err(FilterParseError(format!(
                    "expected string literal, found {:?}",
                    other
                )))
            }
        };
        self.expect(&Token::RParen)?;
        Ok(Expr::Text { func, field, needle })
    }

    fn parse_comparison(&mut self) -> Result<Expr, FilterParseError> {
        let field = match self.advance() {
            Some(Token::Ident(name)) => name,
            other => {
                return Err(FilterParseError(format!(
                    "expected field name, found {:?}",
                    other
                )))
            }
        };

        let op = match self.keyword().as_deref() {
            Some("eq") => CompareOp::Eq,
            Some("ne") => CompareOp::Ne,
            Some("gt") => CompareOp::Gt,
            Some("lt") => CompareOp::Lt,
            Some("ge") => CompareOp::Ge,
            Some("le") => CompareOp::Le,
            _ => {
                return Err(FilterParseError(format!(
                    "expected comparison operator, found {:?}",
                    self.peek()
                )))
            }
        };
        self.advance();

        let value = match self.advance() {
            Some(Token::Str(s)) => Value::String(s),
            Some(Token::Num(n)) => parse_number(&n)?,
            Some(Token::Ident(ident)) => match ident.to_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                // Bare identifiers are unquoted string operands
                _ => Value::String(ident),
            },
            other => {
                return Err(FilterParseError(format!(
                    "expected value operand, found {:?}",
                    other
                )))
            }
        };

        Ok(Expr::Compare { field, op, value })
    }

    fn finish(&self) -> Result<(), FilterParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(FilterParseError(format!(
                "unexpected trailing token {:?}",
                token
            ))),
        }
    }
}

fn parse_number(raw: &str) -> Result<Value, FilterParseError> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Value::Integer(n));
    }
    raw.parse::<f64>()
        .map(Value::Double)
        .map_err(|_| FilterParseError(format!("invalid number '{}'", raw)))
}

fn parse_full(filter: &str) -> Result<Expr, FilterParseError> {
    let tokens = lex(filter)?;
    if tokens.is_empty() {
        return Err(FilterParseError("empty filter".to_string()));
    }
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.finish()?;
    Ok(expr)
}

// ========== Constrained fallback parser ==========

lazy_static! {
    static ref BASIC_CLAUSE: Regex =
        Regex::new(r"(?i)^\s*([A-Za-z_][A-Za-z0-9_.]*)\s+eq\s+'([^']*)'\s*$").unwrap();
    static ref AND_SPLIT: Regex = Regex::new(r"(?i)\s+and\s+").unwrap();
}

/// Recognizes only a chain of `field eq 'value'` clauses joined by `and`.
/// Clauses outside that shape are dropped; `None` when nothing matches.
fn parse_basic(filter: &str) -> Option<Expr> {
    let mut expr: Option<Expr> = None;
    for clause in AND_SPLIT.split(filter) {
        let captures = match BASIC_CLAUSE.captures(clause) {
            Some(captures) => captures,
            None => continue,
        };
        let term = Expr::Compare {
            field: captures[1].to_string(),
            op: CompareOp::Eq,
            value: Value::String(captures[2].to_string()),
        };
        expr = Some(match expr {
            None => term,
            Some(lhs) => Expr::Binary {
                op: BoolOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(term),
            },
        });
    }
    expr
}

// ========== Evaluation ==========

impl Expr {
    fn matches(&self, doc: &Document, schema: &SearchIndex) -> bool {
        match self {
            Expr::Binary { op, lhs, rhs } => match op {
                BoolOp::And => lhs.matches(doc, schema) && rhs.matches(doc, schema),
                BoolOp::Or => lhs.matches(doc, schema) || rhs.matches(doc, schema),
            },
            Expr::Compare { field, op, value } => {
                if !field_filterable(schema, field) {
                    debug!(field = %field, "filter term on non-filterable field");
                    return false;
                }
                let actual = match doc.get_path(field) {
                    Some(v) if !v.is_null() => v,
                    _ => return false,
                };
                match op {
                    CompareOp::Eq => actual.loose_eq(value),
                    CompareOp::Ne => !actual.loose_eq(value),
                    CompareOp::Gt => cmp_is(actual, value, |o| o == Ordering::Greater),
                    CompareOp::Lt => cmp_is(actual, value, |o| o == Ordering::Less),
                    CompareOp::Ge => cmp_is(actual, value, |o| o != Ordering::Less),
                    CompareOp::Le => cmp_is(actual, value, |o| o != Ordering::Greater),
                }
            }
            Expr::Text { func, field, needle } => {
                if !field_filterable(schema, field) {
                    debug!(field = %field, "filter function on non-filterable field");
                    return false;
                }
                let haystacks: Vec<String> = match doc.get_path(field) {
                    Some(Value::Strings(items)) => items.clone(),
                    Some(v) => match v.render() {
                        Some(s) => vec![s],
                        None => return false,
                    },
                    None => return false,
                };
                haystacks.iter().any(|hay| match func {
                    TextFn::Contains => hay.contains(needle.as_str()),
                    TextFn::StartsWith => hay.starts_with(needle.as_str()),
                    TextFn::EndsWith => hay.ends_with(needle.as_str()),
                })
            }
        }
    }
}

fn cmp_is(actual: &Value, expected: &Value, check: impl Fn(Ordering) -> bool) -> bool {
    actual
        .partial_cmp_coerced(expected)
        .map_or(false, check)
}

/// Dot-path fields are filterable when either the full path or its root
/// segment is declared filterable.
fn field_filterable(schema: &SearchIndex, field: &str) -> bool {
    if schema.is_filterable(field) {
        return true;
    }
    match field.split('.').next() {
        Some(root) if root != field => schema.is_filterable(root),
        _ => false,
    }
}

// ========== Public surface ==========

/// Compiled filter. `Pass` means every candidate goes through (oversized or
/// unrecoverable input).
#[derive(Debug)]
pub(crate) enum CompiledFilter {
    Pass,
    Expr(Expr),
}

impl CompiledFilter {
    pub(crate) fn matches(&self, doc: &Document, schema: &SearchIndex) -> bool {
        match self {
            CompiledFilter::Pass => true,
            CompiledFilter::Expr(expr) => expr.matches(doc, schema),
        }
    }
}

/// Compile a filter string. Never fails: the full parser runs first, a parse
/// failure falls back to the constrained `field eq 'value'` chain parser, and
/// anything still unrecognized becomes a logged pass-through.
pub(crate) fn compile(filter: &str) -> CompiledFilter {
    if filter.trim().is_empty() {
        return CompiledFilter::Pass;
    }
    if filter.len() > MAX_FILTER_LEN {
        warn!(len = filter.len(), "filter exceeds length bound, skipping");
        return CompiledFilter::Pass;
    }

    match parse_full(filter) {
        Ok(expr) => CompiledFilter::Expr(expr),
        Err(err) => {
            warn!(filter = %filter, error = %err, "filter parse failed, trying basic fallback");
            match parse_basic(filter) {
                Some(expr) => CompiledFilter::Expr(expr),
                None => {
                    warn!(filter = %filter, "filter unusable, passing candidates through");
                    CompiledFilter::Pass
                }
            }
        }
    }
}

/// Cheap syntactic pre-check: does this filter stand a chance of being
/// honored? Callers use it to warn users about unsupported queries. Never
/// raises.
pub fn is_filter_supported(filter: &str) -> bool {
    if filter.trim().is_empty() || filter.len() > MAX_FILTER_LEN {
        return false;
    }
    let lowered = filter.to_lowercase();
    let has_recognized_token = ["eq", "ne", "gt", "lt", "ge", "le"]
        .iter()
        .any(|op| lowered.split_whitespace().any(|word| word == *op))
        || ["contains(", "startswith(", "endswith("]
            .iter()
            .any(|f| lowered.replace(' ', "").contains(*f));
    has_recognized_token && parse_full(filter).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SearchField};

    fn schema() -> SearchIndex {
        SearchIndex::new(
            "listings",
            vec![
                SearchField::key("id"),
                SearchField::new("title", FieldType::String).searchable(),
                SearchField::new("category", FieldType::String).filterable(),
                SearchField::new("price", FieldType::Double).filterable(),
                SearchField::new("active", FieldType::Boolean).filterable(),
                SearchField::new("tags", FieldType::StringCollection).filterable(),
                SearchField::new("listedAt", FieldType::DateTime).filterable(),
                SearchField::new("seller", FieldType::NestedCollection).filterable(),
            ],
        )
    }

    fn doc() -> Document {
        Document::from_json(serde_json::json!({
            "id": "1",
            "title": "Mountain bike",
            "category": "Sports",
            "price": 500,
            "active": true,
            "tags": ["outdoor", "bike"],
            "listedAt": "2024-05-01T10:00:00Z",
            "seller": {"rating": 5, "city": "Porto"},
        }))
    }

    fn matches(filter: &str) -> bool {
        compile(filter).matches(&doc(), &schema())
    }

    #[test]
    fn test_eq_is_exact_not_substring() {
        assert!(matches("category eq 'Sports'"));
        assert!(!matches("category eq 'Sport'"));
        assert!(!matches("category eq 'sports'"));
    }

    #[test]
    fn test_ne_and_numeric_ops() {
        assert!(matches("category ne 'Safety'"));
        assert!(matches("price gt 100"));
        assert!(matches("price ge 500"));
        assert!(!matches("price lt 500"));
        assert!(matches("price le 500.0"));
    }

    #[test]
    fn test_bool_and_bare_identifier_operands() {
        assert!(matches("active eq true"));
        assert!(!matches("active eq false"));
        assert!(matches("category eq Sports"));
    }

    #[test]
    fn test_and_or_fold_left_to_right() {
        assert!(matches("price gt 100 and category eq 'Sports'"));
        assert!(!matches("price gt 1000 and category eq 'Sports'"));
        assert!(matches("price gt 1000 or category eq 'Sports'"));
        // left fold: (false and true) or true
        assert!(matches(
            "price gt 1000 and category eq 'Sports' or active eq true"
        ));
    }

    #[test]
    fn test_parentheses_group() {
        assert!(!matches(
            "price gt 1000 and (category eq 'Sports' or active eq true)"
        ));
        assert!(matches(
            "price gt 100 and (category eq 'Safety' or active eq true)"
        ));
    }

    #[test]
    fn test_text_functions() {
        assert!(matches("contains(category, 'port')"));
        assert!(matches("startswith(category, 'Sp')"));
        assert!(matches("endswith(category, 'rts')"));
        assert!(!matches("startswith(category, 'ports')"));
        // any element of a string collection passes
        assert!(matches("contains(tags, 'bike')"));
        assert!(!matches("contains(tags, 'indoor ')"));
    }

    #[test]
    fn test_datetime_comparisons() {
        assert!(matches("listedAt gt '2024-01-01T00:00:00Z'"));
        assert!(!matches("listedAt lt '2024-01-01T00:00:00Z'"));
        assert!(matches("listedAt eq '2024-05-01T10:00:00Z'"));
    }

    #[test]
    fn test_dot_path_and_absent_fields() {
        assert!(matches("seller.rating ge 5"));
        assert!(!matches("seller.rating gt 5"));
        assert!(!matches("seller.missing eq 'x'"));
        assert!(!matches("ghost eq 'x'"));
    }

    #[test]
    fn test_non_filterable_field_is_false() {
        // title is searchable but not filterable
        assert!(!matches("title eq 'Mountain bike'"));
    }

    #[test]
    fn test_fallback_recovers_eq_chain() {
        // `not` is not in the grammar, so the full parse fails; the fallback
        // still honors the eq clauses
        assert!(matches("category eq 'Sports' and not (x) and id eq '1'"));
        assert!(!matches("category eq 'Safety' and not (x)"));
    }

    #[test]
    fn test_unusable_filter_passes_through() {
        assert!(matches("{{{{"));
        assert!(matches("%%% ???"));
    }

    #[test]
    fn test_oversized_filter_passes_through() {
        let big = format!("category eq '{}'", "x".repeat(MAX_FILTER_LEN));
        assert!(matches(&big));
    }

    #[test]
    fn test_is_filter_supported() {
        assert!(is_filter_supported("price gt 100"));
        assert!(is_filter_supported("contains(title, 'bike')"));
        assert!(is_filter_supported("a eq 'b' and (c ne 'd' or e lt 3)"));
        assert!(!is_filter_supported("{{{{"));
        assert!(!is_filter_supported("price greater 100"));
        assert!(!is_filter_supported(""));
        assert!(!is_filter_supported(&"x ".repeat(MAX_FILTER_LEN)));
    }

    #[test]
    fn test_case_insensitive_keywords() {
        assert!(matches("category EQ 'Sports' AND price GT 100"));
        assert!(matches("CONTAINS(category, 'Sport')"));
    }
}
