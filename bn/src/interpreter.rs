//! A small postfix host for the bn primitives.
//!
//! Programs are whitespace separated words evaluated left to right against
//! a value stack:
//!
//! ```text
//! 99999999999999999999 2 * .      \ 199999999999999999998
//! 4 13 497 modpow tostring .      \ 445
//! "0xff" number :x  $x $x + .     \ 510
//! ```
//!
//! Integer literals that do not fit the host integer become bn.number
//! values right away. Operator words (`+ - * / % ^ = < <=`) go through the
//! `__` primitives when a bn.number is involved and use host arithmetic
//! otherwise, falling back to the bn functions when the host result would
//! not fit. Any primitive name is a word of its own.
use std::{collections::HashMap, fmt};

use log::trace;

use crate::{Error, Session, SessionCreateInfo, Value, find_primitive};

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Bn(Error),
    StackUnderflow {
        word: String,
        needed: usize,
        available: usize,
    },
    UnknownWord(String),
    UnboundVariable(String),
    UnterminatedString,
    /// operand kinds the host itself cannot combine
    HostType {
        word: String,
        left: &'static str,
        right: &'static str,
    },
}

impl From<Error> for EvalError {
    fn from(err: Error) -> Self {
        EvalError::Bn(err)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Bn(err) => write!(f, "{err}"),
            EvalError::StackUnderflow {
                word,
                needed,
                available,
            } => write!(
                f,
                "stack underflow in '{word}': needs {needed}, has {available}"
            ),
            EvalError::UnknownWord(word) => write!(f, "unknown word '{word}'"),
            EvalError::UnboundVariable(name) => {
                write!(f, "unbound variable '{name}'")
            }
            EvalError::UnterminatedString => write!(f, "unterminated string"),
            EvalError::HostType { word, left, right } => write!(
                f,
                "attempt to apply '{word}' to {left} and {right}"
            ),
        }
    }
}

impl std::error::Error for EvalError {}

#[derive(Debug, Copy, Clone, PartialEq)]
enum ParsedToken<'a> {
    Word(&'a str),
    String(&'a str),
    Integer(i64),
    /// integer literal too wide for the host
    Wide(&'a str),
    Float(f64),
}

struct Parser<'a> {
    code: &'a str,
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(code: &'a str) -> Self {
        Self { code, offset: 0 }
    }

    fn is_done(&self) -> bool {
        self.offset >= self.code.len()
    }

    fn peek(&self) -> u8 {
        self.code.as_bytes()[self.offset]
    }

    fn skip_whitespace(&mut self) {
        while !self.is_done() && self.peek().is_ascii_whitespace() {
            self.offset += 1;
        }
    }

    // `\` starts a comment running to the end of the line
    fn skip_comment(&mut self) {
        while !self.is_done() && self.peek() != b'\n' {
            self.offset += 1;
        }
    }

    fn next_token(&mut self) -> Result<Option<ParsedToken<'a>>, EvalError> {
        loop {
            self.skip_whitespace();
            if self.is_done() {
                return Ok(None);
            }
            if self.peek() == b'\\' {
                self.skip_comment();
                continue;
            }
            break;
        }

        let start = self.offset;
        if self.peek() == b'"' {
            self.offset += 1;
            while !self.is_done() && self.peek() != b'"' {
                self.offset += 1;
            }
            if self.is_done() {
                return Err(EvalError::UnterminatedString);
            }
            self.offset += 1;
            let text = &self.code[start + 1..self.offset - 1];
            return Ok(Some(ParsedToken::String(text)));
        }

        while !self.is_done() && !self.peek().is_ascii_whitespace() {
            self.offset += 1;
        }
        Ok(Some(classify_token(&self.code[start..self.offset])))
    }
}

fn classify_token(token: &str) -> ParsedToken<'_> {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let numeric = digits.starts_with(|c: char| c.is_ascii_digit());
    if !numeric {
        return ParsedToken::Word(token);
    }
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        return match token.parse::<i64>() {
            Ok(value) => ParsedToken::Integer(value),
            Err(_) => ParsedToken::Wide(token),
        };
    }
    match token.parse::<f64>() {
        Ok(value) => ParsedToken::Float(value),
        Err(_) => ParsedToken::Word(token),
    }
}

#[derive(Debug, Copy, Clone)]
enum HostOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl HostOp {
    fn from_word(word: &str) -> Option<Self> {
        let op = match word {
            "+" => HostOp::Add,
            "-" => HostOp::Sub,
            "*" => HostOp::Mul,
            "/" => HostOp::Div,
            "%" => HostOp::Mod,
            "^" => HostOp::Pow,
            _ => return None,
        };
        Some(op)
    }

    fn operator(self) -> &'static str {
        match self {
            HostOp::Add => "__add",
            HostOp::Sub => "__sub",
            HostOp::Mul => "__mul",
            HostOp::Div => "__div",
            HostOp::Mod => "__mod",
            HostOp::Pow => "__pow",
        }
    }

    fn function(self) -> &'static str {
        match self {
            HostOp::Add => "add",
            HostOp::Sub => "sub",
            HostOp::Mul => "mul",
            HostOp::Div => "div",
            HostOp::Mod => "mod",
            HostOp::Pow => "pow",
        }
    }

    fn checked(self, a: i64, b: i64) -> Option<i64> {
        match self {
            HostOp::Add => a.checked_add(b),
            HostOp::Sub => a.checked_sub(b),
            HostOp::Mul => a.checked_mul(b),
            HostOp::Div => a.checked_div(b),
            HostOp::Mod => a.checked_rem(b),
            HostOp::Pow => a.checked_pow(u32::try_from(b).ok()?),
        }
    }
}

pub struct Interpreter {
    session: Session,
    stack: Vec<Value>,
    variables: HashMap<String, Value>,
    output: Vec<String>,
}

impl Interpreter {
    pub fn new(info: SessionCreateInfo) -> Result<Self, Error> {
        Ok(Self {
            session: Session::new(info)?,
            stack: Vec::new(),
            variables: HashMap::new(),
            output: Vec::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Lines printed by `.` and `.s` since the last call.
    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.variables.clear();
    }

    pub fn eval(&mut self, source: &str) -> Result<(), EvalError> {
        let mut parser = Parser::new(source);
        while let Some(token) = parser.next_token()? {
            trace!("eval {token:?}");
            match token {
                ParsedToken::Integer(value) => self.stack.push(Value::Int(value)),
                ParsedToken::Float(value) => self.stack.push(Value::Float(value)),
                ParsedToken::String(text) => self.stack.push(Value::string(text)),
                ParsedToken::Wide(text) => {
                    let mut args = [Value::string(text)];
                    let mut res = self.session.call("number", &mut args)?;
                    self.stack.append(&mut res);
                }
                ParsedToken::Word(word) => self.word(word)?,
            }
        }
        Ok(())
    }

    fn pop_n(&mut self, word: &str, n: usize) -> Result<Vec<Value>, EvalError> {
        if self.stack.len() < n {
            return Err(EvalError::StackUnderflow {
                word: word.to_string(),
                needed: n,
                available: self.stack.len(),
            });
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn pop(&mut self, word: &str) -> Result<Value, EvalError> {
        let mut values = self.pop_n(word, 1)?;
        Ok(values.remove(0))
    }

    fn call(&mut self, name: &str, mut args: Vec<Value>) -> Result<(), EvalError> {
        let mut res = self.session.call(name, &mut args)?;
        self.stack.append(&mut res);
        Ok(())
    }

    fn word(&mut self, word: &str) -> Result<(), EvalError> {
        match word {
            "true" => self.stack.push(Value::Bool(true)),
            "false" => self.stack.push(Value::Bool(false)),
            "nil" => self.stack.push(Value::Nil),
            "dup" => {
                let value = self.pop(word)?;
                self.stack.push(value.clone());
                self.stack.push(value);
            }
            "drop" => {
                self.pop(word)?;
            }
            "over" => {
                let values = self.pop_n(word, 2)?;
                let under = values[0].clone();
                self.stack.extend(values);
                self.stack.push(under);
            }
            "." => {
                let value = self.pop(word)?;
                let line = self.display(value)?;
                self.output.push(line);
            }
            ".s" => {
                let values = self.stack.clone();
                let mut parts = Vec::with_capacity(values.len());
                for value in values {
                    parts.push(self.display(value)?);
                }
                self.output.push(parts.join(" "));
            }
            "=" => {
                let args = self.pop_n(word, 2)?;
                self.equal(args)?;
            }
            "<" | "<=" => {
                let args = self.pop_n(word, 2)?;
                self.order(word, args)?;
            }
            _ => {
                if let Some(op) = HostOp::from_word(word) {
                    let args = self.pop_n(word, 2)?;
                    return self.arith(op, args);
                }
                if let Some(name) = word.strip_prefix(':').filter(|n| !n.is_empty()) {
                    let value = self.pop(word)?;
                    self.variables.insert(name.to_string(), value);
                    return Ok(());
                }
                if let Some(name) = word.strip_prefix('$').filter(|n| !n.is_empty()) {
                    let value = self
                        .variables
                        .get(name)
                        .cloned()
                        .ok_or_else(|| EvalError::UnboundVariable(name.to_string()))?;
                    self.stack.push(value);
                    return Ok(());
                }
                let Some(primitive) = find_primitive(word) else {
                    return Err(EvalError::UnknownWord(word.to_string()));
                };
                let args = self.pop_n(word, primitive.inputs)?;
                self.call(primitive.name, args)?;
            }
        }
        Ok(())
    }

    fn display(&mut self, value: Value) -> Result<String, EvalError> {
        if !value.is_handle() {
            return Ok(value.to_string());
        }
        let res = self.session.call("__tostring", &mut [value])?;
        Ok(res.iter().map(Value::to_string).collect())
    }

    fn arith(&mut self, op: HostOp, args: Vec<Value>) -> Result<(), EvalError> {
        if args.iter().any(Value::is_handle) {
            return self.call(op.operator(), args);
        }
        if let [Value::Int(a), Value::Int(b)] = args[..] {
            if let Some(value) = op.checked(a, b) {
                self.stack.push(Value::Int(value));
                return Ok(());
            }
        }
        self.call(op.function(), args)
    }

    // the host only consults __eq when both sides are bn.number values
    fn equal(&mut self, args: Vec<Value>) -> Result<(), EvalError> {
        if matches!(&args[..], [Value::BigNum(_), Value::BigNum(_)]) {
            return self.call("__eq", args);
        }
        let res = match &args[..] {
            [Value::BigNum(_), _] | [_, Value::BigNum(_)] => false,
            [Value::Nil, Value::Nil] => true,
            [Value::Bool(a), Value::Bool(b)] => a == b,
            [Value::Int(a), Value::Int(b)] => a == b,
            [Value::Float(a), Value::Float(b)] => a == b,
            [Value::Int(a), Value::Float(b)] | [Value::Float(b), Value::Int(a)] => {
                *a as f64 == *b
            }
            [Value::Str(a), Value::Str(b)] => a == b,
            [Value::Bytes(a), Value::Bytes(b)] => a == b,
            _ => false,
        };
        self.stack.push(Value::Bool(res));
        Ok(())
    }

    fn order(&mut self, word: &str, args: Vec<Value>) -> Result<(), EvalError> {
        let less = word == "<";
        if args.iter().any(Value::is_handle) {
            return self.call(if less { "__lt" } else { "__le" }, args);
        }
        let res = match &args[..] {
            [Value::Int(a), Value::Int(b)] => {
                if less { a < b } else { a <= b }
            }
            [Value::Str(a), Value::Str(b)] => {
                if less { a < b } else { a <= b }
            }
            [a, b] => {
                return Err(EvalError::HostType {
                    word: word.to_string(),
                    left: a.type_name(),
                    right: b.type_name(),
                });
            }
            _ => {
                return Err(EvalError::StackUnderflow {
                    word: word.to_string(),
                    needed: 2,
                    available: args.len(),
                });
            }
        };
        self.stack.push(Value::Bool(res));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> Vec<String> {
        let mut interp = Interpreter::new(SessionCreateInfo::default()).unwrap();
        interp.eval(source).unwrap();
        interp.take_output()
    }

    #[test]
    fn tokens() {
        let mut parser = Parser::new(r#"  12 -3 1.5 "a b" foo \ comment
            99999999999999999999 - "#);
        let mut tokens = Vec::new();
        while let Some(token) = parser.next_token().unwrap() {
            tokens.push(token);
        }
        assert_eq!(
            tokens,
            vec![
                ParsedToken::Integer(12),
                ParsedToken::Integer(-3),
                ParsedToken::Float(1.5),
                ParsedToken::String("a b"),
                ParsedToken::Word("foo"),
                ParsedToken::Wide("99999999999999999999"),
                ParsedToken::Word("-"),
            ]
        );
    }

    #[test]
    fn unterminated_string() {
        let mut interp = Interpreter::new(SessionCreateInfo::default()).unwrap();
        assert_eq!(interp.eval("\"abc"), Err(EvalError::UnterminatedString));
    }

    #[test]
    fn host_arithmetic_stays_host() {
        assert_eq!(run("2 3 + ."), ["5"]);
        assert_eq!(run("7 -2 / ."), ["-3"]);
    }

    #[test]
    fn host_overflow_promotes() {
        assert_eq!(run("9223372036854775807 1 + ."), ["9223372036854775808"]);
        assert_eq!(run("2 100 ^ ."), ["1267650600228229401496703205376"]);
    }

    #[test]
    fn variables_and_stack_words() {
        assert_eq!(run("\"0xff\" number :x $x $x + ."), ["510"]);
        assert_eq!(run("1 2 over .s"), ["1 2 1"]);
        assert_eq!(run("5 dup * ."), ["25"]);
    }

    #[test]
    fn equality_follows_host_rules() {
        assert_eq!(run("5 number 5 number = ."), ["true"]);
        assert_eq!(run("5 number 5 = ."), ["false"]);
        assert_eq!(run("5 number 5 eq ."), ["true"]);
    }

    #[test]
    fn errors_surface() {
        let mut interp = Interpreter::new(SessionCreateInfo::default()).unwrap();
        let err = interp.eval("1 number 0 /").unwrap_err();
        assert_eq!(err.to_string(), "bn.number.__div: division by zero");
        assert!(matches!(
            interp.eval("frobnicate"),
            Err(EvalError::UnknownWord(_))
        ));
        assert!(matches!(
            interp.eval("$missing"),
            Err(EvalError::UnboundVariable(_))
        ));
        interp.clear();
        assert!(matches!(
            interp.eval("add"),
            Err(EvalError::StackUnderflow { needed: 2, .. })
        ));
    }
}
