use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::callable::Callable;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId};
use crate::function::LoxFunction;
use crate::native;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Token, TokenType};
use crate::value::{concat_number, Value};

/// How a statement finished.  `Return` unwinds to the enclosing call and
/// `Break` to the enclosing loop; nothing else consumes them.
#[derive(Debug)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    output: Box<dyn Write>,
    echo: bool,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with the native functions
    /// defined in its global scope.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let mut globals = Environment::new();
        native::define_globals(&mut globals);
        let globals = globals.shared();

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
            echo: false,
        }
    }

    /// When set, bare expression statements print their value (prompt mode).
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Called by the resolver: `id` refers to a binding `depth` scopes out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Called by the resolver for references it could not place in any
    /// local scope; they are looked up by name in the globals.
    pub fn note_global(&mut self, id: ExprId) {
        self.locals.remove(&id);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error aborts the run; the environment is left at the global scope
    /// either way.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.execute_top_level(statements);
        self.output.flush()?;

        if result.is_ok() {
            info!("Interpretation completed successfully");
        }
        result
    }

    fn execute_top_level(&mut self, statements: &[Stmt]) -> IResult<()> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                Flow::Return(_) => return Err(escaped("return", stmt)),
                Flow::Break => return Err(escaped("break", stmt)),
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                let value = self.evaluate(expr)?;
                if self.echo {
                    writeln!(self.output, "{}", value)?;
                }
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        let value = self.evaluate(expr)?;
                        debug!("Defining variable '{}' = {}", name.lexeme, value);
                        self.environment.borrow_mut().define(&name.lexeme, value);
                    }
                    None => {
                        debug!("Declaring uninitialized variable '{}'", name.lexeme);
                        self.environment.borrow_mut().declare(&name.lexeme);
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(self.environment.clone()).shared();
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => {
                            debug!("Loop exited via break");
                            break;
                        }
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Function(declaration) => {
                // The closure is the scope the declaration executes in, not
                // the globals: nested functions keep their lexical scope.
                let function = LoxFunction::new(declaration.clone(), self.environment.clone(), false);
                self.environment.borrow_mut().define(
                    &declaration.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                info!(
                    "Function '{}' defined with {} parameters",
                    declaration.name.lexeme,
                    declaration.params.len()
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Class { name, methods } => {
                self.declare_class(name, methods)?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `environment` as the active scope, restoring
    /// the previous scope afterwards on every path (normal completion,
    /// return, break, or error).
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous = mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn declare_class(&mut self, name: &Token, methods: &[Rc<FunctionDecl>]) -> IResult<()> {
        // Bound first so method bodies may refer to the class by name.
        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        let methods: HashMap<String, LoxFunction> = methods
            .iter()
            .map(|method| {
                let is_initializer = method.name.lexeme == "init";
                let function =
                    LoxFunction::new(method.clone(), self.environment.clone(), is_initializer);
                (method.name.lexeme.clone(), function)
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), methods);

        info!("Class '{}' declared", name.lexeme);

        self.environment.borrow_mut().assign(
            &name.lexeme,
            Value::Callable(Callable::Class(Rc::new(class))),
            name.line,
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                self.evaluate_unary(operator, right)
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.evaluate_binary(left, operator, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }

            Expr::Comma(exprs) => {
                let mut last = Value::Nil;
                for expr in exprs {
                    last = self.evaluate(expr)?;
                }
                Ok(last)
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone(), name.line)?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                match callee {
                    Value::Callable(callable) => callable.call(self, values, paren.line),
                    _ => Err(RuntimeError::NotCallable { line: paren.line }),
                }
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(RuntimeError::NoProperties { line: name.line }),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::NotAnInstance { line: name.line });
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(&name.lexeme, value.clone());
                Ok(value)
            }
        }
    }

    /// Resolved references go straight to their scope; unresolved ones are
    /// globals looked up by name.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                debug!("Reading '{}' at distance {}", name.lexeme, distance);
                self.environment
                    .borrow()
                    .get_at(distance, &name.lexeme, name.line)
            }
            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }

    fn evaluate_unary(&self, operator: &Token, right: Value) -> IResult<Value> {
        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::operands(
                    operator.line,
                    "Operand must be a number.",
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(RuntimeError::operands(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )),
        }
    }

    fn evaluate_binary(&self, left: Value, operator: &Token, right: Value) -> IResult<Value> {
        let line = operator.line;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(a), Value::Number(b)) => Ok(Value::String(a + &concat_number(b))),
                (Value::Number(a), Value::String(b)) => Ok(Value::String(concat_number(a) + &b)),
                (left, right) => {
                    debug!(
                        "'+' rejected {} and {}",
                        left.type_name(),
                        right.type_name()
                    );
                    Err(RuntimeError::operands(
                        line,
                        "Operands must be two numbers or two strings.",
                    ))
                }
            },

            TokenType::MINUS => numeric(&left, &right, line).map(|(a, b)| Value::Number(a - b)),

            TokenType::STAR => numeric(&left, &right, line).map(|(a, b)| Value::Number(a * b)),

            TokenType::SLASH => {
                let (a, b) = numeric(&left, &right, line)?;
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero { line });
                }
                Ok(Value::Number(a / b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::GREATER => Ok(relational(&left, &right, Ordering::is_gt)),

            TokenType::GREATER_EQUAL => Ok(relational(&left, &right, Ordering::is_ge)),

            TokenType::LESS => Ok(relational(&left, &right, Ordering::is_lt)),

            TokenType::LESS_EQUAL => Ok(relational(&left, &right, Ordering::is_le)),

            _ => Err(RuntimeError::operands(
                line,
                format!("Invalid binary operator '{}'.", operator.lexeme),
            )),
        }
    }
}

fn numeric(left: &Value, right: &Value, line: usize) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::operands(line, "Operands must be numbers.")),
    }
}

/// Numbers compare numerically; any other pair compares by printed form.
/// `None` only for NaN, which fails every relational test.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
        _ => Some(left.to_string().cmp(&right.to_string())),
    }
}

fn relational(left: &Value, right: &Value, accept: fn(Ordering) -> bool) -> Value {
    Value::Bool(compare(left, right).is_some_and(accept))
}

fn escaped(signal: &str, stmt: &Stmt) -> RuntimeError {
    let line = match stmt {
        Stmt::Return { keyword, .. } | Stmt::Break { keyword } => keyword.line,
        _ => 0,
    };

    RuntimeError::Internal {
        message: format!("'{}' escaped to the top level", signal),
        line,
    }
}
