//! DEPS reader
//!
//! Evaluates the literal subset of Python used by DEPS files: statements of
//! the form `name = expression`, `#` comments, string literals (single,
//! double or triple quoted, `r` prefix, adjacent literals concatenated),
//! integers, `True`/`False`/`None`, lists, tuples (read as lists), dicts,
//! `Var('name')` and `+`.
//!
//! `Var('name')` resolves against the `vars` assigned earlier in the file.
//! Assignments to names other than the known sections are ignored.

use super::{DepsFile, DepsMap, Value, VariableSet};
use crate::core::DepsError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Str(String),
    Int(i64),
    Symbol(char),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("name '{name}'"),
            Self::Str(_) => "string literal".to_string(),
            Self::Int(value) => format!("integer {value}"),
            Self::Symbol(c) => format!("'{c}'"),
            Self::Eof => "end of file".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

/// Parses DEPS `content`; `source` names the file in error messages.
///
/// # Errors
///
/// Returns [`DepsError::ManifestParse`] with the line and column of the first
/// syntax or type error.
pub fn parse_deps(content: &str, source: &str) -> Result<DepsFile, DepsError> {
    let tokens = Lexer::new(content, source).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
        vars: VariableSet::new(),
    };
    parser.parse_file()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    fn new(content: &str, source: &'a str) -> Self {
        Self {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            source,
        }
    }

    fn error(&self, line: usize, column: usize, reason: impl Into<String>) -> DepsError {
        DepsError::ManifestParse {
            file: self.source.to_string(),
            line,
            column,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, DepsError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Spanned {
                    token: Token::Eof,
                    line,
                    column,
                });
                return Ok(tokens);
            };

            let token = if c == '\'' || c == '"' {
                Token::Str(self.string(false)?)
            } else if c.is_ascii_alphabetic() || c == '_' {
                let name = self.name();
                let prefix = name.to_ascii_lowercase();
                if matches!(prefix.as_str(), "r" | "u") && matches!(self.peek(), Some('\'' | '"')) {
                    Token::Str(self.string(prefix == "r")?)
                } else {
                    Token::Name(name)
                }
            } else if c.is_ascii_digit() {
                self.integer(line, column)?
            } else if "()[]{},:+=-".contains(c) {
                self.bump();
                Token::Symbol(c)
            } else {
                return Err(self.error(line, column, format!("unexpected character '{c}'")));
            };

            tokens.push(Spanned {
                token,
                line,
                column,
            });
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' | '\n' | '\x0c' => {
                    self.bump();
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn name(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn integer(&mut self, line: usize, column: usize) -> Result<Token, DepsError> {
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                if c != '_' {
                    digits.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }
        digits
            .parse::<i64>()
            .map(Token::Int)
            .map_err(|e| self.error(line, column, format!("invalid integer '{digits}': {e}")))
    }

    fn string(&mut self, raw: bool) -> Result<String, DepsError> {
        let (line, column) = (self.line, self.column);
        let Some(quote) = self.bump() else {
            return Err(self.error(line, column, "expected string literal"));
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(line, column, "unterminated string literal"));
            };
            if c == quote {
                if !triple {
                    return Ok(value);
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.bump();
                    self.bump();
                    return Ok(value);
                }
                value.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(self.error(line, column, "unterminated string literal"));
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some(escaped) = self.bump() else {
                return Err(self.error(line, column, "unterminated string literal"));
            };
            if raw {
                value.push('\\');
                value.push(escaped);
                continue;
            }
            match escaped {
                '\n' => {}
                '\\' => value.push('\\'),
                '\'' => value.push('\''),
                '"' => value.push('"'),
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    source: &'a str,
    vars: VariableSet,
}

impl Parser<'_> {
    fn current(&self) -> &Spanned {
        // The lexer always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Spanned {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn error_at(&self, at: &Spanned, reason: impl Into<String>) -> DepsError {
        DepsError::ManifestParse {
            file: self.source.to_string(),
            line: at.line,
            column: at.column,
            reason: reason.into(),
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), DepsError> {
        let token = self.advance();
        if token.token == Token::Symbol(symbol) {
            Ok(())
        } else {
            Err(self.error_at(&token, format!("expected '{symbol}', found {}", token.token.describe())))
        }
    }

    fn at_symbol(&self, symbol: char) -> bool {
        self.current().token == Token::Symbol(symbol)
    }

    fn parse_file(&mut self) -> Result<DepsFile, DepsError> {
        let mut deps = DepsFile::default();
        loop {
            let start = self.advance();
            let name = match &start.token {
                Token::Eof => break,
                Token::Name(name) => name.clone(),
                other => {
                    return Err(self.error_at(&start, format!("expected an assignment, found {}", other.describe())));
                }
            };
            self.expect_symbol('=')?;
            let value = self.expression()?;
            self.assign(&mut deps, &name, value, &start)?;
        }
        deps.vars = std::mem::take(&mut self.vars);
        Ok(deps)
    }

    fn assign(&mut self, deps: &mut DepsFile, name: &str, value: Value, at: &Spanned) -> Result<(), DepsError> {
        match name {
            "vars" => {
                let found = value.type_name();
                let Value::Dict(entries) = value else {
                    return Err(self.error_at(at, format!("'vars' must be a dict, found {found}")));
                };
                for (key, value) in entries {
                    let text = match value {
                        Value::Str(s) => s,
                        Value::Int(i) => i.to_string(),
                        Value::Bool(b) => String::from(if b { "True" } else { "False" }),
                        other => {
                            return Err(self.error_at(
                                at,
                                format!("variable '{key}' must be a string, found {}", other.type_name()),
                            ));
                        }
                    };
                    self.vars.set(key, text);
                }
            }
            "deps" => deps.deps = self.deps_map("deps", value, at)?,
            "deps_os" => {
                let found = value.type_name();
                let Value::Dict(entries) = value else {
                    return Err(self.error_at(at, format!("'deps_os' must be a dict, found {found}")));
                };
                for (os, partition) in entries {
                    let map = self.deps_map(&format!("deps_os['{os}']"), partition, at)?;
                    deps.deps_os.insert(os, map);
                }
            }
            "include_rules" => deps.include_rules = self.list(name, value, at)?,
            "skip_child_includes" => deps.skip_child_includes = self.list(name, value, at)?,
            "hooks" => deps.hooks = self.list(name, value, at)?,
            other => {
                tracing::debug!(target: "deps2git::manifest", "Ignoring unknown DEPS assignment '{}'", other);
            }
        }
        Ok(())
    }

    fn deps_map(&self, section: &str, value: Value, at: &Spanned) -> Result<DepsMap, DepsError> {
        let found = value.type_name();
        let Value::Dict(entries) = value else {
            return Err(self.error_at(at, format!("'{section}' must be a dict, found {found}")));
        };
        let mut map = DepsMap::new();
        for (path, location) in entries {
            let location = match location {
                Value::Str(s) => Some(s),
                Value::None => None,
                other => {
                    return Err(self.error_at(
                        at,
                        format!("{section} entry '{path}' must be a string or None, found {}", other.type_name()),
                    ));
                }
            };
            map.insert(path, location);
        }
        Ok(map)
    }

    fn list(&self, section: &str, value: Value, at: &Spanned) -> Result<Vec<Value>, DepsError> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(self.error_at(at, format!("'{section}' must be a list, found {}", other.type_name()))),
        }
    }

    fn expression(&mut self) -> Result<Value, DepsError> {
        let mut value = self.unary()?;
        while self.at_symbol('+') {
            let plus = self.advance();
            let rhs = self.unary()?;
            value = match (value, rhs) {
                (Value::Str(mut lhs), Value::Str(rhs)) => {
                    lhs.push_str(&rhs);
                    Value::Str(lhs)
                }
                (Value::List(mut lhs), Value::List(rhs)) => {
                    lhs.extend(rhs);
                    Value::List(lhs)
                }
                (lhs, rhs) => {
                    return Err(self.error_at(
                        &plus,
                        format!("cannot add {} and {}", lhs.type_name(), rhs.type_name()),
                    ));
                }
            };
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<Value, DepsError> {
        if self.at_symbol('-') {
            let minus = self.advance();
            return match self.advance().token {
                Token::Int(value) => Ok(Value::Int(-value)),
                other => Err(self.error_at(&minus, format!("cannot negate {}", other.describe()))),
            };
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value, DepsError> {
        let start = self.advance();
        match start.token {
            Token::Str(mut text) => {
                while let Token::Str(next) = &self.current().token {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Value::Str(text))
            }
            Token::Int(value) => Ok(Value::Int(value)),
            Token::Name(ref name) => match name.as_str() {
                "True" => Ok(Value::Bool(true)),
                "False" => Ok(Value::Bool(false)),
                "None" => Ok(Value::None),
                "Var" => self.var_call(&start),
                other => Err(self.error_at(&start, format!("unsupported name '{other}'"))),
            },
            Token::Symbol('[') => Ok(Value::List(self.sequence(']')?)),
            Token::Symbol('(') => self.parenthesized(),
            Token::Symbol('{') => self.dict(),
            ref other => Err(self.error_at(&start, format!("expected a value, found {}", other.describe()))),
        }
    }

    fn var_call(&mut self, at: &Spanned) -> Result<Value, DepsError> {
        self.expect_symbol('(')?;
        let name = self.expression()?;
        self.expect_symbol(')')?;
        let found = name.type_name();
        let Value::Str(name) = name else {
            return Err(self.error_at(at, format!("Var() expects a string, found {found}")));
        };
        match self.vars.get(&name) {
            Some(value) => Ok(Value::Str(value.to_string())),
            None => Err(self.error_at(at, format!("Var is not defined: {name}"))),
        }
    }

    /// Comma separated values up to `close`; a trailing comma is allowed.
    fn sequence(&mut self, close: char) -> Result<Vec<Value>, DepsError> {
        let mut items = Vec::new();
        loop {
            if self.at_symbol(close) {
                self.advance();
                return Ok(items);
            }
            items.push(self.expression()?);
            if self.at_symbol(',') {
                self.advance();
            } else {
                self.expect_symbol(close)?;
                return Ok(items);
            }
        }
    }

    fn parenthesized(&mut self) -> Result<Value, DepsError> {
        if self.at_symbol(')') {
            self.advance();
            return Ok(Value::List(Vec::new()));
        }
        let first = self.expression()?;
        if self.at_symbol(')') {
            self.advance();
            return Ok(first);
        }
        self.expect_symbol(',')?;
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Value::List(items))
    }

    fn dict(&mut self) -> Result<Value, DepsError> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        loop {
            if self.at_symbol('}') {
                self.advance();
                return Ok(Value::Dict(entries));
            }
            let key_start = self.current().clone();
            let key = match self.expression()? {
                Value::Str(key) => key,
                other => {
                    return Err(self.error_at(&key_start, format!("dict keys must be strings, found {}", other.type_name())));
                }
            };
            self.expect_symbol(':')?;
            let value = self.expression()?;
            // Python keeps the last value for a repeated key
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = value,
                None => entries.push((key, value)),
            }
            if self.at_symbol(',') {
                self.advance();
            } else {
                self.expect_symbol('}')?;
                return Ok(Value::Dict(entries));
            }
        }
    }
}
