//! Evaluation of vector-set filter expressions
//!
//! Parses the textual filter language (`.field`, literals, `== != > >= < <=`,
//! `in`, `not (in [..])`, `not`/`!`, `and`/`&&`, `or`/`||`, parentheses) and
//! evaluates it against the JSON object stored as an element's attributes.
//! Selectors that are absent from the attributes never satisfy a comparison.

use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Selector(String),
    Str(String),
    Num(f64),
    Word(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Literal(Val),
    Selector(String),
    List(Vec<Node>),
    Compare(CmpOp, Box<Node>, Box<Node>),
    In(Box<Node>, Box<Node>),
    NotIn(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
}

/// A parsed filter expression
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    root: Node,
}

impl Predicate {
    /// Parse a filter expression
    pub fn parse(input: &str) -> Result<Self, String> {
        let tokens = tokenize(input)?;
        let mut parser = Parser { tokens, pos: 0 };
        let root = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(format!("unexpected token {token:?} at position {}", parser.pos));
        }
        Ok(Self { root })
    }

    /// Whether an element with these attributes passes the filter.
    ///
    /// Attributes that are not a JSON object behave as an empty object.
    pub fn matches(&self, attributes: Option<&str>) -> bool {
        let attributes = attributes
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .filter(Value::is_object)
            .unwrap_or(Value::Null);
        eval(&self.root, &attributes).is_some_and(|v| truthy(&v))
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '"' | '\'' => {
                let len = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == c)
                    .ok_or_else(|| format!("unterminated string at position {i}"))?;
                tokens.push(Token::Str(chars[i + 1..i + 1 + len].iter().collect()));
                i += len + 2;
            }
            '.' if next.is_some_and(|n| n.is_ascii_alphabetic() || n == '_') => {
                let start = i + 1;
                i = start;
                while i < chars.len() && is_word(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Selector(chars[start..i].iter().collect()));
            }
            c if c.is_ascii_digit()
                || (c == '-' || c == '.') && next.is_some_and(|n| n.is_ascii_digit() || n == '.') =>
            {
                let start = i;
                i += 1;
                while i < chars.len() {
                    let ch = chars[i];
                    let signed_exponent =
                        (ch == '+' || ch == '-') && matches!(chars[i - 1], 'e' | 'E');
                    if ch.is_ascii_digit() || ch == '.' || ch == 'e' || ch == 'E' || signed_exponent
                    {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let num = text
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number {text:?}"))?;
                tokens.push(Token::Num(num));
            }
            '=' | '!' | '<' | '>' | '&' | '|' => {
                let op = match (c, next) {
                    ('=', Some('=')) => "==",
                    ('!', Some('=')) => "!=",
                    ('<', Some('=')) => "<=",
                    ('>', Some('=')) => ">=",
                    ('&', Some('&')) => "&&",
                    ('|', Some('|')) => "||",
                    ('<', _) => "<",
                    ('>', _) => ">",
                    ('!', _) => "!",
                    _ => return Err(format!("unexpected character {c:?} at position {i}")),
                };
                tokens.push(Token::Op(op));
                i += op.len();
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && is_word(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Word(chars[start..i].iter().collect()));
            }
            _ => return Err(format!("unexpected character {c:?} at position {i}")),
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

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), String> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            other => Err(format!("expected {expected:?}, found {other:?}")),
        }
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    fn parse_or(&mut self) -> Result<Node, String> {
        let mut left = self.parse_and()?;
        while self.at_word("or") || self.peek() == Some(&Token::Op("||")) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = Node::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Node, String> {
        let mut left = self.parse_unary()?;
        while self.at_word("and") || self.peek() == Some(&Token::Op("&&")) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Node::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node, String> {
        if self.at_word("not") || self.peek() == Some(&Token::Op("!")) {
            self.pos += 1;
            let inner = self.parse_unary()?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, String> {
        let left = self.parse_primary()?;

        let op = match self.peek() {
            Some(Token::Op("==")) => Some(CmpOp::Eq),
            Some(Token::Op("!=")) => Some(CmpOp::Ne),
            Some(Token::Op(">")) => Some(CmpOp::Gt),
            Some(Token::Op(">=")) => Some(CmpOp::Ge),
            Some(Token::Op("<")) => Some(CmpOp::Lt),
            Some(Token::Op("<=")) => Some(CmpOp::Le),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let right = self.parse_primary()?;
            return Ok(Node::Compare(op, Box::new(left), Box::new(right)));
        }

        if self.at_word("in") {
            self.pos += 1;
            let right = self.parse_primary()?;
            return Ok(Node::In(Box::new(left), Box::new(right)));
        }

        // `.field not (in [..])` and `.field not in [..]`
        if self.at_word("not") {
            let parenthesized = self.peek_at(1) == Some(&Token::LParen)
                && matches!(self.peek_at(2), Some(Token::Word(w)) if w == "in");
            let bare = matches!(self.peek_at(1), Some(Token::Word(w)) if w == "in");
            if parenthesized {
                self.pos += 3;
                let right = self.parse_primary()?;
                self.expect(&Token::RParen)?;
                return Ok(Node::NotIn(Box::new(left), Box::new(right)));
            }
            if bare {
                self.pos += 2;
                let right = self.parse_primary()?;
                return Ok(Node::NotIn(Box::new(left), Box::new(right)));
            }
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Node, String> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::LBracket) => {
                let mut items = Vec::new();
                if self.peek() == Some(&Token::RBracket) {
                    self.pos += 1;
                    return Ok(Node::List(items));
                }
                loop {
                    items.push(self.parse_primary()?);
                    match self.next() {
                        Some(Token::Comma) => continue,
                        Some(Token::RBracket) => break,
                        other => return Err(format!("expected ',' or ']', found {other:?}")),
                    }
                }
                Ok(Node::List(items))
            }
            Some(Token::Selector(name)) => Ok(Node::Selector(name)),
            Some(Token::Str(s)) => Ok(Node::Literal(Val::Str(s))),
            Some(Token::Num(n)) => Ok(Node::Literal(Val::Num(n))),
            Some(Token::Word(w)) => match w.as_str() {
                "true" => Ok(Node::Literal(Val::Bool(true))),
                "false" => Ok(Node::Literal(Val::Bool(false))),
                "null" => Ok(Node::Literal(Val::Null)),
                _ => Err(format!("unexpected word {w:?}")),
            },
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

fn from_json(value: &Value) -> Val {
    match value {
        Value::Null | Value::Object(_) => Val::Null,
        Value::Bool(b) => Val::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(Val::Null, Val::Num),
        Value::String(s) => Val::Str(s.clone()),
        Value::Array(items) => Val::List(items.iter().map(from_json).collect()),
    }
}

fn truthy(value: &Val) -> bool {
    match value {
        Val::Null => false,
        Val::Bool(b) => *b,
        Val::Num(n) => *n != 0.0,
        Val::Str(s) => !s.is_empty(),
        Val::List(items) => !items.is_empty(),
    }
}

fn ordering(left: &Val, right: &Val) -> Option<Ordering> {
    match (left, right) {
        (Val::Num(a), Val::Num(b)) => a.partial_cmp(b),
        (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
        (Val::Bool(a), Val::Bool(b)) => Some(a.cmp(b)),
        (Val::Null, Val::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn compare(op: CmpOp, left: &Val, right: &Val) -> bool {
    let Some(order) = ordering(left, right) else {
        return op == CmpOp::Ne;
    };
    match op {
        CmpOp::Eq => order == Ordering::Equal,
        CmpOp::Ne => order != Ordering::Equal,
        CmpOp::Gt => order == Ordering::Greater,
        CmpOp::Ge => order != Ordering::Less,
        CmpOp::Lt => order == Ordering::Less,
        CmpOp::Le => order != Ordering::Greater,
    }
}

fn contains(haystack: &Val, needle: &Val) -> bool {
    match haystack {
        Val::List(items) => items.iter().any(|item| compare(CmpOp::Eq, needle, item)),
        Val::Str(s) => matches!(needle, Val::Str(n) if s.contains(n.as_str())),
        _ => false,
    }
}

fn eval(node: &Node, attributes: &Value) -> Option<Val> {
    match node {
        Node::Literal(value) => Some(value.clone()),
        Node::Selector(name) => attributes.get(name).map(from_json),
        Node::List(items) => Some(Val::List(
            items.iter().filter_map(|item| eval(item, attributes)).collect(),
        )),
        Node::Compare(op, left, right) => {
            let result = match (eval(left, attributes), eval(right, attributes)) {
                (Some(l), Some(r)) => compare(*op, &l, &r),
                _ => false,
            };
            Some(Val::Bool(result))
        }
        Node::In(left, right) | Node::NotIn(left, right) => {
            let result = match (eval(left, attributes), eval(right, attributes)) {
                (Some(l), Some(r)) => contains(&r, &l) == matches!(node, Node::In(..)),
                _ => false,
            };
            Some(Val::Bool(result))
        }
        Node::And(left, right) => Some(Val::Bool(
            eval(left, attributes).is_some_and(|v| truthy(&v))
                && eval(right, attributes).is_some_and(|v| truthy(&v)),
        )),
        Node::Or(left, right) => Some(Val::Bool(
            eval(left, attributes).is_some_and(|v| truthy(&v))
                || eval(right, attributes).is_some_and(|v| truthy(&v)),
        )),
        Node::Not(inner) => Some(Val::Bool(!eval(inner, attributes).is_some_and(|v| truthy(&v)))),
    }
}
