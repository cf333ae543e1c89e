//! Filter grammar parser.
//!
//! Implements a recursive descent parser for textual filter expressions:
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ('or' and_expr)*
//! and_expr   := not_expr ('and' not_expr)*
//! not_expr   := '!' primary | primary
//! primary    := '(' expr ')' | 'true' | 'false' | field 'pr' | field op value
//! value      := '"' string '"' | number | 'true' | 'false'
//! ```
//!
//! Numbers are `i64` unless written with `.` (`f64`); wider integers become
//! big integers. Other attribute types have typed literal forms so that
//! every filter's text form reads back as the same filter:
//!
//! | Type | Literal |
//! |------|---------|
//! | `i32` | `21i32` |
//! | `f32` | `1.5f32`, `NaNf32` |
//! | `f64` specials | `NaN`, `Infinity`, `-Infinity` |
//! | big integer | `123n` |
//! | big decimal | `1.50m` |
//! | character | `U+0041` |
//! | bytes | `base64:AQI=` |
//!
//! Keywords are case-insensitive. Core operators are `eq`, `co`, `sw`, `lt`,
//! `le`, `gt` and `ge`; any other operator matching `[a-zA-Z_0-9.]+` is an
//! extended operator. Nesting is bounded by [`MAX_FILTER_DEPTH`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::{engine::general_purpose::STANDARD, Engine};
use num_bigint::BigInt;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

use super::{ComparisonOperator, QueryFilter, BYTES_PREFIX, CHARACTER_PREFIX};
use crate::objects::AttributeValue;

/// Maximum nesting of parenthesized and negated expressions.
pub const MAX_FILTER_DEPTH: usize = 256;

static EXTENDED_OPERATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_0-9.]+$").expect("EXTENDED_OPERATOR is a valid regex pattern")
});

/// Errors raised while parsing a filter expression.
///
/// Every variant carries the offending token or the remaining input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("unexpected end of filter, expected {expected}")]
    UnexpectedEnd { expected: String },

    #[error("unexpected token '{token}' at: {remaining}")]
    UnexpectedToken { token: String, remaining: String },

    #[error("unterminated string literal at: {remaining}")]
    UnterminatedString { remaining: String },

    #[error("unexpected trailing input: {remaining}")]
    TrailingInput { remaining: String },

    #[error("invalid operator '{operator}'")]
    InvalidOperator { operator: String },

    #[error("invalid value '{value}'")]
    InvalidValue { value: String },

    #[error("invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("filter too deeply nested (max depth {max_depth}) at: {remaining}")]
    TooDeeplyNested { max_depth: usize, remaining: String },
}

/// Parse a filter expression into a field-based filter.
pub fn parse_query_filter<F>(input: &str) -> Result<QueryFilter<F>, FilterParseError>
where
    F: FromStr,
    F::Err: fmt::Display,
{
    FilterParser::new(input).parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LeftParen,
    RightParen,
    Bang,
    Word(String),
    Quoted(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::Bang => f.write_str("!"),
            Token::Word(w) => f.write_str(w),
            Token::Quoted(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenizerState {
    /// Between tokens or inside a bare word.
    NeedToken,
    /// Inside a quoted string, looking for the closing quote.
    NeedEndString,
    /// Right after a backslash inside a quoted string.
    NeedEscaped,
}

/// Splits the input into grammar tokens, one at a time.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    peeked: Option<(Token, usize, usize)>,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            peeked: None,
        }
    }

    /// Input not yet consumed, starting at the next token.
    fn remaining(&self) -> &'a str {
        let start = self.peeked.as_ref().map_or(self.pos, |(_, start, _)| *start);
        self.input[start..].trim_start()
    }

    fn peek(&mut self) -> Result<Option<&Token>, FilterParseError> {
        if self.peeked.is_none() {
            let start = self.pos;
            if let Some(token) = self.scan()? {
                self.peeked = Some((token, start, self.pos));
            }
            self.pos = start;
        }
        Ok(self.peeked.as_ref().map(|(token, _, _)| token))
    }

    fn next_token(&mut self) -> Result<Option<Token>, FilterParseError> {
        self.peek()?;
        Ok(self.peeked.take().map(|(token, _, end)| {
            self.pos = end;
            token
        }))
    }

    fn scan(&mut self) -> Result<Option<Token>, FilterParseError> {
        let rest = &self.input[self.pos..];
        let mut state = TokenizerState::NeedToken;
        let mut word = String::new();
        let mut token_start = None;

        for (offset, c) in rest.char_indices() {
            let at = self.pos + offset;
            match state {
                TokenizerState::NeedToken => {
                    let delimiter = c.is_whitespace() || matches!(c, '(' | ')' | '!' | '"');
                    if !delimiter {
                        token_start.get_or_insert(at);
                        word.push(c);
                        continue;
                    }
                    if !word.is_empty() {
                        self.pos = at;
                        return Ok(Some(Token::Word(word)));
                    }
                    let single = match c {
                        '(' => Some(Token::LeftParen),
                        ')' => Some(Token::RightParen),
                        '!' => Some(Token::Bang),
                        _ => None,
                    };
                    if let Some(token) = single {
                        self.pos = at + c.len_utf8();
                        return Ok(Some(token));
                    }
                    if c == '"' {
                        token_start = Some(at);
                        state = TokenizerState::NeedEndString;
                    }
                }
                TokenizerState::NeedEndString => match c {
                    '\\' => state = TokenizerState::NeedEscaped,
                    '"' => {
                        self.pos = at + 1;
                        return Ok(Some(Token::Quoted(word)));
                    }
                    _ => word.push(c),
                },
                TokenizerState::NeedEscaped => {
                    word.push(c);
                    state = TokenizerState::NeedEndString;
                }
            }
        }

        self.pos = self.input.len();
        match state {
            TokenizerState::NeedToken if word.is_empty() => Ok(None),
            TokenizerState::NeedToken => Ok(Some(Token::Word(word))),
            TokenizerState::NeedEndString | TokenizerState::NeedEscaped => {
                let start = token_start.unwrap_or(0);
                Err(FilterParseError::UnterminatedString {
                    remaining: self.input[start..].to_string(),
                })
            }
        }
    }
}

/// Recursive descent filter parser.
///
/// Each parse call owns its tokenizer and depth counter; parsers are never
/// shared.
pub struct FilterParser<'a> {
    tokens: Tokenizer<'a>,
    depth: usize,
}

impl<'a> FilterParser<'a> {
    /// Create a new parser.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(input),
            depth: 0,
        }
    }

    /// Parse the whole input as one filter expression.
    pub fn parse<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        let filter = self.parse_expr()?;
        if self.tokens.peek()?.is_some() {
            return Err(FilterParseError::TrailingInput {
                remaining: self.tokens.remaining().to_string(),
            });
        }
        Ok(filter)
    }

    fn enter(&mut self) -> Result<(), FilterParseError> {
        self.depth += 1;
        if self.depth > MAX_FILTER_DEPTH {
            return Err(FilterParseError::TooDeeplyNested {
                max_depth: MAX_FILTER_DEPTH,
                remaining: self.tokens.remaining().to_string(),
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        self.enter()?;
        let filter = self.parse_or()?;
        self.leave();
        Ok(filter)
    }

    fn parse_or<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        let mut children = vec![self.parse_and()?];
        while self.try_consume_keyword("or")? {
            children.push(self.parse_and()?);
        }
        Ok(QueryFilter::or(children))
    }

    fn parse_and<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        let mut children = vec![self.parse_not()?];
        while self.try_consume_keyword("and")? {
            children.push(self.parse_not()?);
        }
        Ok(QueryFilter::and(children))
    }

    fn parse_not<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        if self.tokens.peek()? == Some(&Token::Bang) {
            self.tokens.next_token()?;
            self.enter()?;
            let child = self.parse_primary()?;
            self.leave();
            return Ok(QueryFilter::not(child));
        }
        self.parse_primary()
    }

    fn parse_primary<F>(&mut self) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        let remaining = self.tokens.remaining();
        match self.tokens.next_token()? {
            None => Err(FilterParseError::UnexpectedEnd {
                expected: "expression".to_string(),
            }),
            Some(Token::LeftParen) => {
                let filter = self.parse_expr()?;
                self.expect_right_paren()?;
                Ok(filter)
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("true") => {
                Ok(QueryFilter::always_true())
            }
            Some(Token::Word(word)) if word.eq_ignore_ascii_case("false") => {
                Ok(QueryFilter::always_false())
            }
            Some(Token::Word(word)) => self.parse_comparison(word),
            Some(token) => Err(FilterParseError::UnexpectedToken {
                token: token.to_string(),
                remaining: remaining.to_string(),
            }),
        }
    }

    fn parse_comparison<F>(&mut self, field_name: String) -> Result<QueryFilter<F>, FilterParseError>
    where
        F: FromStr,
        F::Err: fmt::Display,
    {
        let field = F::from_str(&field_name).map_err(|e| FilterParseError::InvalidField {
            field: field_name.clone(),
            message: e.to_string(),
        })?;

        let remaining = self.tokens.remaining();
        let operator = match self.tokens.next_token()? {
            Some(Token::Word(op)) => op,
            Some(token) => {
                return Err(FilterParseError::UnexpectedToken {
                    token: token.to_string(),
                    remaining: remaining.to_string(),
                })
            }
            None => {
                return Err(FilterParseError::UnexpectedEnd {
                    expected: format!("operator after '{field_name}'"),
                })
            }
        };

        if operator.eq_ignore_ascii_case("pr") {
            return Ok(QueryFilter::present(field));
        }

        let operator = ComparisonOperator::from_name(&operator);
        if let ComparisonOperator::Extended(name) = &operator {
            if !EXTENDED_OPERATOR.is_match(name) {
                return Err(FilterParseError::InvalidOperator {
                    operator: name.clone(),
                });
            }
        }

        let value = self.parse_value()?;
        Ok(QueryFilter::comparison(field, operator, value))
    }

    fn parse_value(&mut self) -> Result<AttributeValue, FilterParseError> {
        let remaining = self.tokens.remaining();
        match self.tokens.next_token()? {
            Some(Token::Quoted(s)) => Ok(AttributeValue::String(s)),
            Some(Token::Word(word)) => parse_literal(&word),
            Some(token) => Err(FilterParseError::UnexpectedToken {
                token: token.to_string(),
                remaining: remaining.to_string(),
            }),
            None => Err(FilterParseError::UnexpectedEnd {
                expected: "value".to_string(),
            }),
        }
    }

    fn expect_right_paren(&mut self) -> Result<(), FilterParseError> {
        let remaining = self.tokens.remaining();
        match self.tokens.next_token()? {
            Some(Token::RightParen) => Ok(()),
            Some(token) => Err(FilterParseError::UnexpectedToken {
                token: token.to_string(),
                remaining: remaining.to_string(),
            }),
            None => Err(FilterParseError::UnexpectedEnd {
                expected: "')'".to_string(),
            }),
        }
    }

    fn try_consume_keyword(&mut self, keyword: &str) -> Result<bool, FilterParseError> {
        let matched = matches!(
            self.tokens.peek()?,
            Some(Token::Word(word)) if word.eq_ignore_ascii_case(keyword)
        );
        if matched {
            self.tokens.next_token()?;
        }
        Ok(matched)
    }
}

/// Type an unquoted literal: booleans, then floating point when it contains
/// a `.`, otherwise a 64-bit integer.
fn parse_literal(word: &str) -> Result<AttributeValue, FilterParseError> {
    let invalid = || FilterParseError::InvalidValue {
        value: word.to_string(),
    };
    if word.eq_ignore_ascii_case("true") {
        return Ok(AttributeValue::Boolean(true));
    }
    if word.eq_ignore_ascii_case("false") {
        return Ok(AttributeValue::Boolean(false));
    }
    if let Some(encoded) = word.strip_prefix(BYTES_PREFIX) {
        return STANDARD
            .decode(encoded)
            .map(AttributeValue::Bytes)
            .map_err(|_| invalid());
    }
    if let Some(hex) = word.strip_prefix(CHARACTER_PREFIX) {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(AttributeValue::Character)
            .ok_or_else(invalid);
    }
    if let Some(body) = word.strip_suffix("f32") {
        return parse_floating::<f32>(body)
            .map(AttributeValue::Float)
            .ok_or_else(invalid);
    }
    if let Some(body) = word.strip_suffix("i32") {
        return body
            .parse::<i32>()
            .map(AttributeValue::Integer)
            .map_err(|_| invalid());
    }
    if let Some(body) = word.strip_suffix('n') {
        return BigInt::from_str(body)
            .map(AttributeValue::BigInteger)
            .map_err(|_| invalid());
    }
    if let Some(body) = word.strip_suffix('m') {
        return Decimal::from_str_exact(body)
            .map(AttributeValue::BigDecimal)
            .map_err(|_| invalid());
    }
    if word.contains('.') || matches!(word, "NaN" | "Infinity" | "-Infinity") {
        return parse_floating::<f64>(word)
            .map(AttributeValue::Double)
            .ok_or_else(invalid);
    }
    match word.parse::<i64>() {
        Ok(l) => Ok(AttributeValue::Long(l)),
        // Integers beyond i64 widen instead of failing.
        Err(_) => BigInt::from_str(word)
            .map(AttributeValue::BigInteger)
            .map_err(|_| invalid()),
    }
}

/// Parse a floating-point literal: digits with a `.`, or one of the named
/// special values.
fn parse_floating<T: FromStr>(body: &str) -> Option<T> {
    let plain = body.contains('.')
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || b == b'.' || b == b'-');
    let canonical = match body {
        "NaN" => "NaN",
        "Infinity" => "inf",
        "-Infinity" => "-inf",
        _ if plain => body,
        _ => return None,
    };
    canonical.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::JsonPointer;

    fn parse(input: &str) -> Result<QueryFilter<JsonPointer>, FilterParseError> {
        parse_query_filter(input)
    }

    fn field(name: &str) -> JsonPointer {
        JsonPointer::field(name)
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            parse(r#"name eq "bob""#).unwrap(),
            QueryFilter::equal_to(field("name"), "bob")
        );
    }

    #[test]
    fn test_literal_typing() {
        assert_eq!(
            parse("age ge 21").unwrap(),
            QueryFilter::greater_than_or_equal_to(field("age"), 21i64)
        );
        assert_eq!(
            parse("score lt -1.5").unwrap(),
            QueryFilter::less_than(field("score"), -1.5f64)
        );
        assert_eq!(
            parse("active eq TRUE").unwrap(),
            QueryFilter::equal_to(field("active"), true)
        );
        assert_eq!(
            parse(r#"age eq "21""#).unwrap(),
            QueryFilter::equal_to(field("age"), "21")
        );
    }

    #[test]
    fn test_typed_literals() {
        let cases: Vec<(&str, AttributeValue)> = vec![
            ("21i32", AttributeValue::Integer(21)),
            ("-1.5f32", AttributeValue::Float(-1.5)),
            ("NaNf32", AttributeValue::Float(f32::NAN)),
            ("Infinity", AttributeValue::Double(f64::INFINITY)),
            ("-Infinity", AttributeValue::Double(f64::NEG_INFINITY)),
            ("NaN", AttributeValue::Double(f64::NAN)),
            ("12n", AttributeValue::BigInteger(BigInt::from(12))),
            ("1.50m", AttributeValue::BigDecimal(Decimal::new(150, 2))),
            ("U+0041", AttributeValue::Character('A')),
            ("base64:AQI=", AttributeValue::Bytes(vec![1, 2])),
            ("base64:", AttributeValue::Bytes(Vec::new())),
        ];
        for (literal, expected) in cases {
            assert_eq!(
                parse(&format!("v eq {literal}")).unwrap(),
                QueryFilter::equal_to(field("v"), expected),
                "{literal}"
            );
        }
    }

    #[test]
    fn test_malformed_typed_literals() {
        for literal in [
            "99999999999i32",
            "1e5",
            "inf",
            "1.5.5",
            "xf32",
            "U+D800",
            "U+zz",
            "base64:!!",
            "1.2.3m",
            "abcn",
        ] {
            assert!(
                matches!(
                    parse(&format!("v eq {literal}")),
                    Err(FilterParseError::InvalidValue { .. })
                ),
                "{literal}"
            );
        }
    }

    #[test]
    fn test_precedence() {
        let a = QueryFilter::present(field("a"));
        let b = QueryFilter::present(field("b"));
        let c = QueryFilter::present(field("c"));
        assert_eq!(
            parse("a pr or b pr and c pr").unwrap(),
            QueryFilter::or(vec![a.clone(), QueryFilter::and(vec![b.clone(), c.clone()])])
        );
        assert_eq!(
            parse("(a pr or b pr) and ! c pr").unwrap(),
            QueryFilter::and(vec![
                QueryFilter::or(vec![a, b]),
                QueryFilter::not(c)
            ])
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(
            parse("a pr AND b PR Or True").unwrap(),
            QueryFilter::or(vec![
                QueryFilter::and(vec![
                    QueryFilter::present(field("a")),
                    QueryFilter::present(field("b"))
                ]),
                QueryFilter::always_true()
            ])
        );
    }

    #[test]
    fn test_boolean_literal_primary() {
        assert_eq!(parse("true").unwrap(), QueryFilter::always_true());
        assert_eq!(parse(" ( false ) ").unwrap(), QueryFilter::always_false());
    }

    #[test]
    fn test_quoted_strings_keep_grammar_characters() {
        assert_eq!(
            parse(r#"cn eq "a (b) and !c \"d\" \\""#).unwrap(),
            QueryFilter::equal_to(field("cn"), r#"a (b) and !c "d" \"#)
        );
        assert_eq!(
            parse(r#"cn eq "ü ß""#).unwrap(),
            QueryFilter::equal_to(field("cn"), "ü ß")
        );
    }

    #[test]
    fn test_extended_operator() {
        assert_eq!(
            parse(r#"mail ew "@example.com""#).unwrap(),
            QueryFilter::extended(field("mail"), "ew", "@example.com")
        );
        assert_eq!(
            parse("x my.op_2 5").unwrap(),
            QueryFilter::extended(field("x"), "my.op_2", 5i64)
        );
        assert!(matches!(
            parse("x <= 5"),
            Err(FilterParseError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn test_grammar_violations() {
        assert!(matches!(
            parse(r#"name eq "bob"#),
            Err(FilterParseError::UnterminatedString { .. })
        ));
        assert!(matches!(
            parse("name eq"),
            Err(FilterParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("(a pr"),
            Err(FilterParseError::UnexpectedEnd { .. })
        ));
        assert!(matches!(
            parse("age eq 12abc"),
            Err(FilterParseError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse(""),
            Err(FilterParseError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_trailing_input_reports_remaining_text() {
        match parse("a pr ) b pr") {
            Err(FilterParseError::TrailingInput { remaining }) => assert_eq!(remaining, ") b pr"),
            other => panic!("expected trailing input error, got {other:?}"),
        }
    }

    #[test]
    fn test_unexpected_token_reports_offending_text() {
        match parse("a pr and )") {
            Err(FilterParseError::UnexpectedToken { token, remaining }) => {
                assert_eq!(token, ")");
                assert_eq!(remaining, ")");
            }
            other => panic!("expected unexpected token error, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_guard() {
        let ok = format!("{}a pr{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&ok).is_ok());

        let deep = format!("{}a pr{}", "(! ".repeat(300), ")".repeat(300));
        assert!(matches!(
            parse(&deep),
            Err(FilterParseError::TooDeeplyNested { max_depth: 256, .. })
        ));

        let parens = format!("{}a pr{}", "(".repeat(300), ")".repeat(300));
        assert!(matches!(
            parse(&parens),
            Err(FilterParseError::TooDeeplyNested { .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let input = r#"(givenName co "jo" and ! (age ge 21))"#;
        let parsed = parse(input).unwrap();
        let reparsed = parse(&parsed.to_string()).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
