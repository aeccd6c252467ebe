//! Calculator module: a recursive-descent evaluator for math expressions.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! expr    = term (('+' | '-') term)*
//! term    = power (('*' | '/' | '%') power)*
//! power   = unary ('^' power)?
//! unary   = ('+' | '-') unary | primary
//! primary = number | '(' expr ')' | ident | ident '(' args ')'
//! ```
//!
//! Whitespace is stripped before lexing, so every position reported in an
//! [`EvalError`] is a character offset into the stripped expression.

use thiserror::Error;

/// Functions taking exactly one argument.
const UNARY_FUNCTIONS: &[&str] = &[
    "abs", "sign", "floor", "ceil", "round", "sqrt", "ln", "log10", "sin", "cos", "tan", "asin",
    "acos", "atan", "rad", "deg",
];

/// Functions with a variable argument count.
const VARIADIC_FUNCTIONS: &[&str] = &["log", "min", "max"];

/// Deepest allowed nesting of parentheses, unary signs and powers.
const MAX_DEPTH: usize = 256;

/// Errors produced while parsing an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("expression is empty")]
    Empty,

    #[error("unknown identifier '{name}' at position {position}")]
    UnknownIdentifier { name: String, position: usize },

    #[error("{name}() expects {expected} argument(s), got {found} at position {position}")]
    ArgumentCount {
        name: String,
        expected: &'static str,
        found: usize,
        position: usize,
    },

    #[error("missing closing ')' at position {position}")]
    MissingClosingParen { position: usize },

    #[error("malformed number '{text}' at position {position}")]
    MalformedNumber { text: String, position: usize },

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("unexpected end of expression at position {position}")]
    UnexpectedEnd { position: usize },

    #[error("unexpected trailing input '{rest}' at position {position}")]
    TrailingInput { rest: String, position: usize },

    #[error("expression nested too deeply at position {position}")]
    TooDeep { position: usize },
}

impl EvalError {
    /// Character offset the error points at, if any.
    pub fn position(&self) -> Option<usize> {
        match self {
            EvalError::Empty => None,
            EvalError::UnknownIdentifier { position, .. }
            | EvalError::ArgumentCount { position, .. }
            | EvalError::MissingClosingParen { position }
            | EvalError::MalformedNumber { position, .. }
            | EvalError::UnexpectedToken { position, .. }
            | EvalError::UnexpectedEnd { position }
            | EvalError::TrailingInput { position, .. }
            | EvalError::TooDeep { position } => Some(*position),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    position: usize,
}

fn is_function(name: &str) -> bool {
    UNARY_FUNCTIONS.contains(&name) || VARIADIC_FUNCTIONS.contains(&name)
}

fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

fn strip_whitespace(expr: &str) -> Vec<char> {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}

fn tokenize(chars: &[char]) -> Result<Vec<Spanned>, EvalError> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        let token = if c.is_ascii_digit() || c == '.' {
            let (value, next) = lex_number(chars, i)?;
            i = next;
            Token::Number(value)
        } else if c.is_alphabetic() || c == '_' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let name: String = chars[start..i].iter().collect();
            Token::Ident(name.to_lowercase())
        } else {
            i += 1;
            match c {
                '+' | '-' | '*' | '/' | '%' | '^' => Token::Op(c),
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                other => {
                    return Err(EvalError::UnexpectedToken {
                        found: other.to_string(),
                        position: start,
                    })
                }
            }
        };

        tokens.push(Spanned {
            token,
            position: start,
        });
    }

    Ok(tokens)
}

/// Lex a decimal or scientific literal starting at `start`.
fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), EvalError> {
    let mut i = start;
    let mut digits = 0;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }

    // Exponent only when digits follow, so "2e" stays "2" then identifier "e"
    if digits > 0 && i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    // A second decimal point ("1.2.3") poisons the whole run
    if digits == 0 || (i < chars.len() && chars[i] == '.') {
        let mut end = i;
        while end < chars.len() && (chars[end].is_ascii_digit() || chars[end] == '.') {
            end += 1;
        }
        return Err(EvalError::MalformedNumber {
            text: chars[start..end.max(start + 1)].iter().collect(),
            position: start,
        });
    }

    let text: String = chars[start..i].iter().collect();
    text.parse::<f64>()
        .map(|value| (value, i))
        .map_err(|_| EvalError::MalformedNumber {
            text,
            position: start,
        })
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.position)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep {
                position: self.position(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_expr(&mut self) -> Result<f64, EvalError> {
        self.nested(Self::parse_sum)
    }

    fn parse_sum(&mut self) -> Result<f64, EvalError> {
        let mut left = self.parse_term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let right = self.parse_term()?;
            if *op == '+' {
                left += right;
            } else {
                left -= right;
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<f64, EvalError> {
        let mut left = self.parse_power()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let right = self.parse_power()?;
            left = match *op {
                '*' => left * right,
                '/' => left / right,
                _ => left % right,
            };
        }
        Ok(left)
    }

    fn parse_power(&mut self) -> Result<f64, EvalError> {
        let base = self.parse_unary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.nested(Self::parse_power)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.nested(Self::parse_unary)
            }
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.nested(Self::parse_unary)?)
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<f64, EvalError> {
        let position = self.position();
        let Some(spanned) = self.advance() else {
            return Err(EvalError::UnexpectedEnd { position });
        };

        match &spanned.token {
            Token::Number(value) => Ok(*value),
            Token::LParen => {
                let value = self.parse_expr()?;
                self.expect_closing()?;
                Ok(value)
            }
            Token::Ident(name) => {
                if let Some(Token::LParen) = self.peek() {
                    self.pos += 1;
                    let args = self.parse_args()?;
                    return apply_function(name, &args, position);
                }
                if let Some(value) = constant(name) {
                    return Ok(value);
                }
                if is_function(name) {
                    return Err(EvalError::ArgumentCount {
                        name: name.clone(),
                        expected: expected_arity(name),
                        found: 0,
                        position,
                    });
                }
                Err(EvalError::UnknownIdentifier {
                    name: name.clone(),
                    position,
                })
            }
            Token::Op(c) => Err(EvalError::UnexpectedToken {
                found: c.to_string(),
                position,
            }),
            Token::RParen => Err(EvalError::UnexpectedToken {
                found: ")".to_string(),
                position,
            }),
            Token::Comma => Err(EvalError::UnexpectedToken {
                found: ",".to_string(),
                position,
            }),
        }
    }

    /// Parse a comma-separated argument list; the opening '(' is consumed.
    fn parse_args(&mut self) -> Result<Vec<f64>, EvalError> {
        let mut args = Vec::new();
        if let Some(Token::RParen) = self.peek() {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.peek() {
                Some(Token::Comma) => self.pos += 1,
                _ => break,
            }
        }
        self.expect_closing()?;
        Ok(args)
    }

    fn expect_closing(&mut self) -> Result<(), EvalError> {
        match self.peek() {
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(EvalError::MissingClosingParen {
                position: self.position(),
            }),
        }
    }
}

fn expected_arity(name: &str) -> &'static str {
    match name {
        "log" => "1 or 2",
        "min" | "max" => "at least 2",
        _ => "1",
    }
}

fn apply_function(name: &str, args: &[f64], position: usize) -> Result<f64, EvalError> {
    let arity_error = || EvalError::ArgumentCount {
        name: name.to_string(),
        expected: expected_arity(name),
        found: args.len(),
        position,
    };

    match name {
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => Err(arity_error()),
        },
        "min" | "max" => {
            if args.len() < 2 {
                return Err(arity_error());
            }
            let fold = if name == "min" { f64::min } else { f64::max };
            Ok(args[1..].iter().copied().fold(args[0], fold))
        }
        _ if UNARY_FUNCTIONS.contains(&name) => {
            let [x] = args else {
                return Err(arity_error());
            };
            let x = *x;
            Ok(match name {
                "abs" => x.abs(),
                "sign" => {
                    if x > 0.0 {
                        1.0
                    } else if x < 0.0 {
                        -1.0
                    } else {
                        0.0
                    }
                }
                "floor" => x.floor(),
                "ceil" => x.ceil(),
                // f64::round rounds half away from zero
                "round" => x.round(),
                "sqrt" => x.sqrt(),
                "ln" => x.ln(),
                "log10" => x.log10(),
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                "atan" => x.atan(),
                "rad" => x.to_radians(),
                _ => x.to_degrees(),
            })
        }
        _ => Err(EvalError::UnknownIdentifier {
            name: name.to_string(),
            position,
        }),
    }
}

/// Evaluate a math expression.
///
/// Division by zero follows IEEE semantics and yields an infinity or NaN
/// rather than an error.
pub fn evaluate(expr: &str) -> Result<f64, EvalError> {
    let chars = strip_whitespace(expr);
    if chars.is_empty() {
        return Err(EvalError::Empty);
    }

    let tokens = tokenize(&chars)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: chars.len(),
        depth: 0,
    };
    let value = parser.parse_expr()?;

    if parser.pos < tokens.len() {
        let position = parser.position();
        return Err(EvalError::TrailingInput {
            rest: chars[position..].iter().collect(),
            position,
        });
    }

    Ok(value)
}

/// Decide whether bare input (no `calc` prefix) should be treated as math.
///
/// The input must lex cleanly into numbers, operators, parentheses, commas,
/// known functions and constants. It needs at least one value, and either an
/// operator, a function call, or to be a lone number or constant.
pub fn looks_like_math(input: &str) -> bool {
    let chars = strip_whitespace(input);
    if chars.is_empty() {
        return false;
    }
    let Ok(tokens) = tokenize(&chars) else {
        return false;
    };

    let mut has_value = false;
    let mut has_operator = false;
    let mut has_call = false;

    for (i, spanned) in tokens.iter().enumerate() {
        match &spanned.token {
            Token::Number(_) => has_value = true,
            Token::Op(_) => has_operator = true,
            Token::Ident(name) => {
                let is_call = matches!(tokens.get(i + 1).map(|s| &s.token), Some(Token::LParen));
                if is_call && is_function(name) {
                    has_call = true;
                } else if !is_call && constant(name).is_some() {
                    has_value = true;
                } else {
                    return false;
                }
            }
            Token::LParen | Token::RParen | Token::Comma => {}
        }
    }

    has_value && (has_operator || has_call || tokens.len() == 1)
}

/// Format a result for display; infinities and NaN get symbolic forms.
pub fn format_result(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "∞".to_string()
    } else if value == f64::NEG_INFINITY {
        "-∞".to_string()
    } else {
        super::format::format_number(value)
    }
}
