use crate::error::{EvalError, EvalResult};
use crate::traits::{AngleUnit, Scalar};

/// Name of the single free variable an expression may reference.
pub const VARIABLE: &str = "x";

/// Deepest nesting of parentheses, calls, signs and exponents accepted.
pub const MAX_DEPTH: usize = 256;

/// Longest token stream accepted. Operator chains such as `x+x+...` build
/// trees as deep as they are long, so length is capped as well as nesting.
pub const MAX_TOKENS: usize = 1024;

/// Functions an expression may call. Each takes exactly one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Ln,
    Log,
    Sqrt,
    Abs,
}

impl Function {
    /// Resolves a (lower-case) function name, including the `arc*` spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" | "arcsin" => Function::Asin,
            "acos" | "arccos" => Function::Acos,
            "atan" | "arctan" => Function::Atan,
            "exp" => Function::Exp,
            "ln" => Function::Ln,
            "log" => Function::Log,
            "sqrt" => Function::Sqrt,
            "abs" => Function::Abs,
            _ => return None,
        };
        Some(function)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
        }
    }

    /// Name of the function written as `name^(-1)`, for the forward trig functions.
    fn inverse_name(name: &str) -> Option<&'static str> {
        match name {
            "sin" => Some("asin"),
            "cos" => Some("acos"),
            "tan" => Some("atan"),
            _ => None,
        }
    }

    /// Applies the function, returning a domain error instead of NaN.
    pub fn apply<T: Scalar>(self, arg: T, unit: AngleUnit) -> EvalResult<T> {
        let one = T::one();
        let out_of_domain = || EvalError::Domain {
            function: self.name(),
            argument: arg.to_f64().unwrap_or(f64::NAN),
        };
        let value = match self {
            Function::Sin => unit.to_radians(arg).sin(),
            Function::Cos => unit.to_radians(arg).cos(),
            Function::Tan => {
                if unit == AngleUnit::Degrees && is_odd_right_angle(arg) {
                    return Err(out_of_domain());
                }
                unit.to_radians(arg).tan()
            }
            Function::Asin | Function::Acos => {
                if arg < -one || arg > one {
                    return Err(out_of_domain());
                }
                let radians = if self == Function::Asin { arg.asin() } else { arg.acos() };
                unit.from_radians(radians)
            }
            Function::Atan => unit.from_radians(arg.atan()),
            Function::Exp => arg.exp(),
            Function::Ln | Function::Log => {
                if arg <= T::zero() {
                    return Err(out_of_domain());
                }
                if self == Function::Ln {
                    arg.ln()
                } else {
                    arg.log10()
                }
            }
            Function::Sqrt => {
                if arg < T::zero() {
                    return Err(out_of_domain());
                }
                arg.sqrt()
            }
            Function::Abs => arg.abs(),
        };
        Ok(value)
    }
}

/// True when `degrees` is an odd multiple of 90, where tan has its poles.
fn is_odd_right_angle<T: Scalar>(degrees: T) -> bool {
    let (Some(right), Some(half_turn)) = (T::from_f64(90.0), T::from_f64(180.0)) else {
        return false;
    };
    (degrees - right) % half_turn == T::zero()
}

/// OpCodes for the stack-based virtual machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant `f64` value onto the stack.
    LoadConst(f64),
    /// Pushes the value of `x` onto the stack.
    LoadVar,
    /// Pops top two values (b, a), pushes (a + b).
    Add,
    /// Pops top two values (b, a), pushes (a - b).
    Sub,
    /// Pops top two values (b, a), pushes (a * b).
    Mul,
    /// Pops top two values (b, a), pushes (a / b). Fails when b is zero.
    Div,
    /// Pops top two values (b, a), pushes (a ^ b).
    Pow,
    /// Pops top value (a), pushes -a.
    Neg,
    /// Pops top value (a), pushes f(a).
    Call(Function),
}

/// Represents a compiled sequence of operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    pub ops: Vec<OpCode>,
}

/// Stack-based virtual machine for evaluating expressions.
///
/// The VM is stateless; `execute` takes all necessary context:
/// - `bytecode`: Instructions to run.
/// - `x`: Value of the free variable.
/// - `unit`: Angle unit for trig functions.
/// - `stack`: A mutable buffer for intermediate computations.
///
/// Any non-finite intermediate value aborts the run.
pub struct VM;

impl VM {
    pub fn execute<T: Scalar>(
        bytecode: &Bytecode,
        x: T,
        unit: AngleUnit,
        stack: &mut Vec<T>,
    ) -> EvalResult<T> {
        stack.clear();

        for op in &bytecode.ops {
            let value = match op {
                OpCode::LoadConst(val) => T::from_f64(*val).ok_or(EvalError::NonFinite)?,
                OpCode::LoadVar => x,
                OpCode::Add => {
                    let (a, b) = pop_pair(stack)?;
                    a + b
                }
                OpCode::Sub => {
                    let (a, b) = pop_pair(stack)?;
                    a - b
                }
                OpCode::Mul => {
                    let (a, b) = pop_pair(stack)?;
                    a * b
                }
                OpCode::Div => {
                    let (a, b) = pop_pair(stack)?;
                    if b == T::zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    a / b
                }
                OpCode::Pow => {
                    let (a, b) = pop_pair(stack)?;
                    a.powf(b)
                }
                OpCode::Neg => -pop(stack)?,
                OpCode::Call(function) => {
                    let a = pop(stack)?;
                    function.apply(a, unit)?
                }
            };
            if !value.is_finite() {
                return Err(EvalError::NonFinite);
            }
            stack.push(value);
        }

        let result = pop(stack)?;
        if !stack.is_empty() {
            return Err(EvalError::MalformedBytecode);
        }
        Ok(result)
    }
}

fn pop<T>(stack: &mut Vec<T>) -> EvalResult<T> {
    stack.pop().ok_or(EvalError::MalformedBytecode)
}

fn pop_pair<T>(stack: &mut Vec<T>) -> EvalResult<(T, T)> {
    let b = pop(stack)?;
    let a = pop(stack)?;
    Ok((a, b))
}

// --- AST & Compiler ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// Any bare identifier: the variable or a named constant.
    Variable(String),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Neg(Box<Expr>),
    Call(String, Box<Expr>),
}

/// Compiles an AST (`Expr`) into `Bytecode`, resolving names.
pub struct Compiler {
    pub variable: String,
}

impl Compiler {
    pub fn new(variable: &str) -> Self {
        Self {
            variable: variable.to_string(),
        }
    }

    pub fn compile(&self, expr: &Expr) -> EvalResult<Bytecode> {
        let mut ops = Vec::new();
        self.compile_recursive(expr, &mut ops)?;
        Ok(Bytecode { ops })
    }

    fn compile_recursive(&self, expr: &Expr, ops: &mut Vec<OpCode>) -> EvalResult<()> {
        match expr {
            Expr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            Expr::Variable(name) => {
                let op = if *name == self.variable {
                    OpCode::LoadVar
                } else {
                    match name.as_str() {
                        "pi" => OpCode::LoadConst(std::f64::consts::PI),
                        "e" => OpCode::LoadConst(std::f64::consts::E),
                        _ => return Err(EvalError::UnknownVariable(name.clone())),
                    }
                };
                ops.push(op);
            }
            Expr::Binary(left, op, right) => {
                self.compile_recursive(left, ops)?;
                self.compile_recursive(right, ops)?;
                ops.push(match op {
                    BinaryOp::Add => OpCode::Add,
                    BinaryOp::Sub => OpCode::Sub,
                    BinaryOp::Mul => OpCode::Mul,
                    BinaryOp::Div => OpCode::Div,
                    BinaryOp::Pow => OpCode::Pow,
                });
            }
            Expr::Neg(operand) => {
                self.compile_recursive(operand, ops)?;
                ops.push(OpCode::Neg);
            }
            Expr::Call(name, arg) => {
                let function = Function::from_name(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                self.compile_recursive(arg, ops)?;
                ops.push(OpCode::Call(function));
            }
        }
        Ok(())
    }
}

// --- Parser ---

/// Parses a string expression into an AST.
///
/// Identifiers are case-insensitive; `sin^(-1)`, `cos^(-1)` and `tan^(-1)`
/// (with or without the parentheses around `-1`) read as the inverse functions.
pub fn parse(input: &str) -> EvalResult<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(EvalError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(EvalError::UnexpectedToken {
            expected: "end of input",
            found: token.describe(),
        }),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Identifier(name) => format!("'{name}'"),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Caret => "'^'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
        }
    }
}

fn tokenize(input: &str) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut num_str = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    num_str.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let value = num_str
                .parse()
                .map_err(|_| EvalError::MalformedNumber(num_str.clone()))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() {
            let mut ident = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.extend(d.to_lowercase());
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            let token = match c {
                '+' => Token::Plus,
                '-' | '\u{2212}' => Token::Minus,
                '*' | '\u{00d7}' => Token::Star,
                '/' | '\u{00f7}' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LParen,
                ')' => Token::RParen,
                other => return Err(EvalError::UnexpectedChar(other)),
            };
            tokens.push(token);
            chars.next();
        }
        if tokens.len() > MAX_TOKENS {
            return Err(EvalError::TooLong(MAX_TOKENS));
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Operands currently being parsed; bounds the recursion.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token, label: &'static str) -> EvalResult<()> {
        match self.consume() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(EvalError::UnexpectedToken {
                expected: label,
                found: token.describe(),
            }),
            None => Err(EvalError::UnexpectedToken {
                expected: label,
                found: "end of input".into(),
            }),
        }
    }

    fn parse_expression(&mut self) -> EvalResult<Expr> {
        self.parse_term()
    }

    fn parse_term(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_factor()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_factor()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> EvalResult<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.peek() {
            let op = match token {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    // Every nested operand (parentheses, call arguments, signs, exponents)
    // passes through here, so this is where nesting is capped.
    fn parse_unary(&mut self) -> EvalResult<Expr> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let expr = self.parse_signed();
        self.depth -= 1;
        expr
    }

    fn parse_signed(&mut self) -> EvalResult<Expr> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                let expr = self.parse_unary()?;
                Ok(Expr::Neg(Box::new(expr)))
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    // Right-associative; the exponent may carry its own sign (`2^-1`).
    fn parse_power(&mut self) -> EvalResult<Expr> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Binary(Box::new(base), BinaryOp::Pow, Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                let name = match Function::inverse_name(&name) {
                    Some(inverse) if self.eat_inverse_marker() => inverse.to_string(),
                    _ => name,
                };
                if let Some(Token::LParen) = self.peek() {
                    self.consume();
                    let arg = self.parse_expression()?;
                    self.expect(Token::RParen, "')'")?;
                    Ok(Expr::Call(name, Box::new(arg)))
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Some(token) => Err(EvalError::UnexpectedToken {
                expected: "a number, name or '('",
                found: token.describe(),
            }),
            None => Err(EvalError::UnexpectedToken {
                expected: "a number, name or '('",
                found: "end of input".into(),
            }),
        }
    }

    /// Consumes `^(-1)` or `^-1` if it follows, leaving the position untouched otherwise.
    fn eat_inverse_marker(&mut self) -> bool {
        let minus_one_at = |parser: &Self, offset: usize| {
            matches!(parser.peek_at(offset), Some(Token::Minus))
                && matches!(parser.peek_at(offset + 1), Some(Token::Number(n)) if *n == 1.0)
        };
        if !matches!(self.peek(), Some(Token::Caret)) {
            return false;
        }
        let len = if matches!(self.peek_at(1), Some(Token::LParen))
            && minus_one_at(self, 2)
            && matches!(self.peek_at(4), Some(Token::RParen))
        {
            5
        } else if minus_one_at(self, 1) {
            3
        } else {
            return false;
        };
        self.pos += len;
        true
    }
}

// --- CompiledExpression ---

/// An expression parsed and compiled once, ready to be evaluated at many `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    bytecode: Bytecode,
    angle_unit: AngleUnit,
}

impl CompiledExpression {
    pub fn compile(source: &str, angle_unit: AngleUnit) -> EvalResult<Self> {
        let parsed = parse(source)?;
        let bytecode = Compiler::new(VARIABLE).compile(&parsed)?;
        Ok(Self {
            source: source.to_string(),
            bytecode,
            angle_unit,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, x: f64) -> EvalResult<f64> {
        let mut stack = Vec::with_capacity(16);
        self.evaluate_with(x, &mut stack)
    }

    /// Evaluates at `x`, reusing `stack` to avoid an allocation per sample.
    pub fn evaluate_with<T: Scalar>(&self, x: T, stack: &mut Vec<T>) -> EvalResult<T> {
        if !x.is_finite() {
            return Err(EvalError::NonFinite);
        }
        VM::execute(&self.bytecode, x, self.angle_unit, stack)
    }
}

/// Evaluates `expression` at `x` with trig in degrees, reporting why it failed.
pub fn try_evaluate(expression: &str, x: f64) -> EvalResult<f64> {
    CompiledExpression::compile(expression, AngleUnit::Degrees)?.evaluate(x)
}

/// Evaluates `expression` at `x` with trig in degrees.
/// Every failure (syntax, domain, arithmetic) collapses to `None`.
pub fn evaluate(expression: &str, x: f64) -> Option<f64> {
    try_evaluate(expression, x).ok()
}
