//! Visibility and calculation expressions.
//!
//! Field definitions carry small expressions such as `{country} = 'Canada'`,
//! `{panel.asset_count} > 0` or `{product_price} * {quantity}`. They are
//! parsed into an [`Expr`] tree and evaluated against the current answers.
//!
//! Variables in braces are answer paths. `{panel.x}` refers to field `x` of
//! the dynamic panel instance the expression is evaluated in. Missing answers
//! evaluate to `null`; arithmetic treats `null` as `0`.

use serde_json::{Number, Value};
use survey_builder_types::{AnswerPath, Answers, is_empty_value};

/// Error returned when an expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExpressionError {
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("unterminated string starting at {0}")]
    UnterminatedString(usize),

    #[error("unterminated variable starting at {0}")]
    UnterminatedVariable(usize),

    #[error("unexpected '{found}'")]
    UnexpectedToken { found: String },

    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Gt,
    Lt,
    Ge,
    Le,
    Contains,
    NotContains,
    Add,
    Sub,
    Mul,
    Div,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// The raw text between braces, e.g. `panel.asset_count`.
    Variable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Postfix `empty` / `notempty`.
    Empty {
        operand: Box<Expr>,
        negated: bool,
    },
}

/// Answers an expression is evaluated against, plus the enclosing dynamic
/// panel instance (if any).
#[derive(Debug, Clone)]
pub struct EvalContext<'a> {
    answers: &'a Answers,
    panel: Option<AnswerPath>,
    item: Option<Value>,
}

impl<'a> EvalContext<'a> {
    pub fn new(answers: &'a Answers) -> Self {
        Self {
            answers,
            panel: None,
            item: None,
        }
    }

    /// Context for an expression inside the panel instance at `instance`
    /// (e.g. `household_members[0]`).
    pub fn in_panel(answers: &'a Answers, instance: AnswerPath) -> Self {
        Self {
            answers,
            panel: Some(instance),
            item: None,
        }
    }

    /// Bind `{item}` to a choice value, as used by `choicesVisibleIf`.
    pub fn with_item(&self, item: Value) -> Self {
        Self {
            answers: self.answers,
            panel: self.panel.clone(),
            item: Some(item),
        }
    }

    fn lookup(&self, name: &str) -> Value {
        if name == "item"
            && let Some(item) = &self.item
        {
            return item.clone();
        }
        let path = match (name.strip_prefix("panel."), &self.panel) {
            (Some(rest), Some(instance)) => AnswerPath::parse(&format!("{instance}.{rest}")),
            _ => AnswerPath::parse(name),
        };
        path.ok()
            .and_then(|p| self.answers.get(&p).cloned())
            .unwrap_or(Value::Null)
    }
}

/// Parse an expression.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ExpressionError::UnexpectedToken {
            found: token.to_string(),
        }),
    }
}

/// Evaluate an optional visibility expression.
///
/// A missing expression means "always visible". Expressions that fail to
/// parse are treated as visible so a broken rule never hides a question.
pub fn is_visible(expression: Option<&str>, ctx: &EvalContext<'_>) -> bool {
    let Some(source) = expression else {
        return true;
    };
    match parse(source) {
        Ok(expr) => expr.is_true(ctx),
        Err(err) => {
            tracing::warn!(expression = source, error = %err, "ignoring unparsable visibility rule");
            true
        }
    }
}

impl Expr {
    /// Evaluate to a JSON value.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Variable(name) => ctx.lookup(name),
            Self::Unary { op, operand } => {
                let value = operand.evaluate(ctx);
                match op {
                    UnaryOp::Not => Value::Bool(!truthy(&value)),
                    UnaryOp::Neg => as_number(&value)
                        .map(|n| number_value(-n))
                        .unwrap_or(Value::Null),
                }
            }
            Self::Empty { operand, negated } => {
                let value = operand.evaluate(ctx);
                Value::Bool(is_empty_value(Some(&value)) != *negated)
            }
            Self::Binary { op, left, right } => match op {
                BinaryOp::And => Value::Bool(left.is_true(ctx) && right.is_true(ctx)),
                BinaryOp::Or => Value::Bool(left.is_true(ctx) || right.is_true(ctx)),
                _ => binary(*op, &left.evaluate(ctx), &right.evaluate(ctx)),
            },
        }
    }

    /// Evaluate and interpret the result as a condition.
    pub fn is_true(&self, ctx: &EvalContext<'_>) -> bool {
        truthy(&self.evaluate(ctx))
    }

    /// Variable names referenced by this expression.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'e>(&'e self, out: &mut Vec<&'e str>) {
        match self {
            Self::Literal(_) => {}
            Self::Variable(name) => out.push(name),
            Self::Unary { operand, .. } | Self::Empty { operand, .. } => {
                operand.collect_variables(out)
            }
            Self::Binary { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Eq => Value::Bool(loose_eq(left, right)),
        BinaryOp::NotEq => Value::Bool(!loose_eq(left, right)),
        BinaryOp::Gt => Value::Bool(compare(left, right).is_some_and(|o| o.is_gt())),
        BinaryOp::Lt => Value::Bool(compare(left, right).is_some_and(|o| o.is_lt())),
        BinaryOp::Ge => Value::Bool(compare(left, right).is_some_and(|o| o.is_ge())),
        BinaryOp::Le => Value::Bool(compare(left, right).is_some_and(|o| o.is_le())),
        BinaryOp::Contains => Value::Bool(contains(left, right)),
        BinaryOp::NotContains => Value::Bool(!contains(left, right)),
        BinaryOp::Add => match (left, right) {
            (Value::String(a), b) if as_number(left).is_none() => {
                Value::String(format!("{a}{}", display(b)))
            }
            (a, Value::String(b)) if as_number(right).is_none() => {
                Value::String(format!("{}{b}", display(a)))
            }
            _ => arithmetic(left, right, |a, b| Some(a + b)),
        },
        BinaryOp::Sub => arithmetic(left, right, |a, b| Some(a - b)),
        BinaryOp::Mul => arithmetic(left, right, |a, b| Some(a * b)),
        BinaryOp::Div => arithmetic(left, right, |a, b| (b != 0.0).then(|| a / b)),
        BinaryOp::And => Value::Bool(truthy(left) && truthy(right)),
        BinaryOp::Or => Value::Bool(truthy(left) || truthy(right)),
    }
}

fn arithmetic(left: &Value, right: &Value, f: impl Fn(f64, f64) -> Option<f64>) -> Value {
    let a = if left.is_null() { Some(0.0) } else { as_number(left) };
    let b = if right.is_null() { Some(0.0) } else { as_number(right) };
    match (a, b) {
        (Some(a), Some(b)) => f(a, b).map(number_value).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Interpret a value as a number (numbers and numeric strings).
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Convert an `f64` result back to JSON, keeping integral values integral.
pub fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    let left_empty = is_empty_value(Some(left));
    let right_empty = is_empty_value(Some(right));
    if left_empty || right_empty {
        return left_empty && right_empty;
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            s.eq_ignore_ascii_case(if *b { "true" } else { "false" })
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_eq(x, y))
        }
        _ => match (as_number(left), as_number(right)) {
            (Some(a), Some(b)) => a == b,
            _ => left == right,
        },
    }
}

fn compare(left: &Value, right: &Value) -> Option<std::cmp::Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    match (as_number(left), as_number(right)) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => match (left, right) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        },
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, needle)),
        Value::String(s) => match needle {
            Value::String(n) => s.to_lowercase().contains(&n.to_lowercase()),
            other => s.contains(&display(other)),
        },
        _ => false,
    }
}

/// Render a value the way it appears in summaries and string concatenation.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// === Tokenizer ===

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Var(String),
    Keyword(Keyword),
    Op(&'static str),
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    And,
    Or,
    Not,
    Empty,
    NotEmpty,
    Contains,
    NotContains,
    True,
    False,
    Null,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Var(v) => write!(f, "{{{v}}}"),
            Self::Keyword(k) => write!(f, "{k:?}"),
            Self::Op(op) => write!(f, "{op}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
        }
    }
}

const OPERATORS: &[&str] = &[
    "==", "!=", "<>", ">=", "<=", "&&", "||", "=", ">", "<", "+", "-", "*", "/", "!",
];

fn tokenize(source: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        match ch {
            c if c.is_whitespace() => pos += 1,
            '(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            '{' => {
                let start = pos;
                let end = chars[pos..]
                    .iter()
                    .position(|c| *c == '}')
                    .ok_or(ExpressionError::UnterminatedVariable(start))?;
                let name: String = chars[pos + 1..pos + end].iter().collect();
                tokens.push(Token::Var(name.trim().to_string()));
                pos += end + 1;
            }
            '\'' | '"' => {
                let start = pos;
                let end = chars[pos + 1..]
                    .iter()
                    .position(|c| *c == ch)
                    .ok_or(ExpressionError::UnterminatedString(start))?;
                tokens.push(Token::Str(chars[pos + 1..pos + 1 + end].iter().collect()));
                pos += end + 2;
            }
            c if c.is_ascii_digit() || (c == '.' && chars.get(pos + 1).is_some_and(char::is_ascii_digit)) => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                    pos += 1;
                }
                let text: String = chars[start..pos].iter().collect();
                let number = text
                    .parse()
                    .map_err(|_| ExpressionError::UnexpectedToken { found: text })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                let word: String = chars[start..pos].iter().collect();
                let keyword = match word.to_ascii_lowercase().as_str() {
                    "and" => Keyword::And,
                    "or" => Keyword::Or,
                    "not" => Keyword::Not,
                    "empty" => Keyword::Empty,
                    "notempty" => Keyword::NotEmpty,
                    "contains" => Keyword::Contains,
                    "notcontains" => Keyword::NotContains,
                    "true" => Keyword::True,
                    "false" => Keyword::False,
                    "null" | "undefined" => Keyword::Null,
                    _ => return Err(ExpressionError::UnexpectedToken { found: word }),
                };
                tokens.push(Token::Keyword(keyword));
            }
            _ => {
                let rest: String = chars[pos..chars.len().min(pos + 2)].iter().collect();
                let op = OPERATORS
                    .iter()
                    .find(|op| rest.starts_with(**op))
                    .ok_or(ExpressionError::UnexpectedChar { pos, ch })?;
                tokens.push(Token::Op(op));
                pos += op.len();
            }
        }
    }

    Ok(tokens)
}

// === Parser ===

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<Token, ExpressionError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ExpressionError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.peek() == Some(&Token::Keyword(keyword)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, ops: &[&str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) || self.eat_op(&["||"]).is_some() {
            let right = self.parse_and()?;
            left = binary_expr(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword(Keyword::And) || self.eat_op(&["&&"]).is_some() {
            let right = self.parse_not()?;
            left = binary_expr(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_keyword(Keyword::Not) || self.eat_op(&["!"]).is_some() {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExpressionError> {
        let left = self.parse_additive()?;

        if self.eat_keyword(Keyword::Empty) {
            return Ok(Expr::Empty {
                operand: Box::new(left),
                negated: false,
            });
        }
        if self.eat_keyword(Keyword::NotEmpty) {
            return Ok(Expr::Empty {
                operand: Box::new(left),
                negated: true,
            });
        }
        if self.eat_keyword(Keyword::Contains) {
            let right = self.parse_additive()?;
            return Ok(binary_expr(BinaryOp::Contains, left, right));
        }
        if self.eat_keyword(Keyword::NotContains) {
            let right = self.parse_additive()?;
            return Ok(binary_expr(BinaryOp::NotContains, left, right));
        }

        let op = match self.eat_op(&["=", "==", "!=", "<>", ">", "<", ">=", "<="]) {
            Some("=") | Some("==") => BinaryOp::Eq,
            Some("!=") | Some("<>") => BinaryOp::NotEq,
            Some(">") => BinaryOp::Gt,
            Some("<") => BinaryOp::Lt,
            Some(">=") => BinaryOp::Ge,
            Some("<=") => BinaryOp::Le,
            _ => return Ok(left),
        };
        let right = self.parse_additive()?;
        Ok(binary_expr(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let right = self.parse_multiplicative()?;
            let op = if op == "+" { BinaryOp::Add } else { BinaryOp::Sub };
            left = binary_expr(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = self.eat_op(&["*", "/"]) {
            let right = self.parse_unary()?;
            let op = if op == "*" { BinaryOp::Mul } else { BinaryOp::Div };
            left = binary_expr(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExpressionError> {
        if self.eat_op(&["-"]).is_some() {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExpressionError> {
        match self.next()? {
            Token::Number(n) => Ok(Expr::Literal(number_value(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Var(name) => Ok(Expr::Variable(name)),
            Token::Keyword(Keyword::True) => Ok(Expr::Literal(Value::Bool(true))),
            Token::Keyword(Keyword::False) => Ok(Expr::Literal(Value::Bool(false))),
            Token::Keyword(Keyword::Null) => Ok(Expr::Literal(Value::Null)),
            Token::LParen => {
                let inner = self.parse_or()?;
                match self.next()? {
                    Token::RParen => Ok(inner),
                    other => Err(ExpressionError::UnexpectedToken {
                        found: other.to_string(),
                    }),
                }
            }
            other => Err(ExpressionError::UnexpectedToken {
                found: other.to_string(),
            }),
        }
    }
}

fn binary_expr(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers(value: Value) -> Answers {
        serde_json::from_value(value).unwrap()
    }

    fn eval(source: &str, answers: &Answers) -> Value {
        parse(source).unwrap().evaluate(&EvalContext::new(answers))
    }

    #[test]
    fn equality_against_choice() {
        let a = answers(json!({ "country": "Canada" }));
        assert_eq!(eval("{country} = 'Canada'", &a), json!(true));
        assert_eq!(eval("{country} = 'USA'", &a), json!(false));
        assert_eq!(eval("{country} notempty", &a), json!(true));
        assert_eq!(eval("{city} notempty", &a), json!(false));
        assert_eq!(eval("{city} empty", &a), json!(true));
    }

    #[test]
    fn numeric_comparison_with_strings_and_missing() {
        let a = answers(json!({ "children_count": "2" }));
        assert_eq!(eval("{children_count} > 0", &a), json!(true));
        assert_eq!(eval("{household_size} > 0", &a), json!(false));
    }

    #[test]
    fn contains_on_checkbox_answers() {
        let a = answers(json!({ "preferred_features": ["Quality", "Fast Delivery"] }));
        assert_eq!(
            eval("{preferred_features} contains 'Fast Delivery'", &a),
            json!(true)
        );
        assert_eq!(
            eval("{preferred_features} contains 'Customer Support'", &a),
            json!(false)
        );
        assert_eq!(
            eval("{preferred_features} notcontains 'Low Price'", &a),
            json!(true)
        );
    }

    #[test]
    fn arithmetic_chain() {
        let a = answers(json!({ "product_price": 20, "quantity": 3, "subtotal": 60 }));
        assert_eq!(eval("{product_price} * {quantity}", &a), json!(60));
        assert_eq!(eval("{subtotal} * 0.08", &a), json!(4.8));
        assert_eq!(eval("{subtotal} + 4.8", &a), json!(64.8));
        assert_eq!(eval("{missing} * 2", &a), json!(0));
        assert_eq!(eval("1 / 0", &a), Value::Null);
    }

    #[test]
    fn panel_scoped_variables() {
        let a = answers(json!({
            "household_members": [{ "asset_count": 0 }, { "asset_count": 2 }]
        }));
        let expr = parse("{panel.asset_count} > 0").unwrap();

        let first = AnswerPath::new("household_members").index(0);
        let second = AnswerPath::new("household_members").index(1);
        assert!(!expr.is_true(&EvalContext::in_panel(&a, first)));
        assert!(expr.is_true(&EvalContext::in_panel(&a, second)));
    }

    #[test]
    fn boolean_connectives_and_precedence() {
        let a = answers(json!({ "x": 5, "y": "b" }));
        assert_eq!(eval("{x} > 1 and {y} = 'b' or false", &a), json!(true));
        assert_eq!(eval("not ({x} > 1)", &a), json!(false));
        assert_eq!(eval("2 + 3 * 4", &a), json!(14));
        assert_eq!(eval("(2 + 3) * 4", &a), json!(20));
        assert_eq!(eval("-{x} < 0", &a), json!(true));
    }

    #[test]
    fn literal_true_is_visible() {
        let a = Answers::new();
        assert!(is_visible(Some("true"), &EvalContext::new(&a)));
        assert!(is_visible(None, &EvalContext::new(&a)));
        assert!(is_visible(Some("{x} =="), &EvalContext::new(&a)));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            parse("{country"),
            Err(ExpressionError::UnterminatedVariable(0))
        );
        assert_eq!(parse("'abc"), Err(ExpressionError::UnterminatedString(0)));
        assert_eq!(parse("{a} ="), Err(ExpressionError::UnexpectedEnd));
        assert!(matches!(
            parse("{a} # 1"),
            Err(ExpressionError::UnexpectedChar { ch: '#', .. })
        ));
    }

    #[test]
    fn collects_variables() {
        let expr = parse("{subtotal} + {tax}").unwrap();
        assert_eq!(expr.variables(), vec!["subtotal", "tax"]);
    }
}
