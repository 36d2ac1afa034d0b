//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! Static failures (scanner, parser, resolver) and runtime failures are kept
//! apart: the former are collected and reported before anything executes, the
//! latter abort one top-level run. Every subsystem converts its failure modes
//! into one of the variants defined here.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'` or ` at end`.
        location: String,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**; the location is taken from the
    /// offending token.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }
}

fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Failure raised while executing a resolved program.  Every variant carries
/// the source line of the token that triggered it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("Variable '{name}' must be initialized before use.")]
    UninitializedVariable { name: String, line: usize },

    #[error("{message}")]
    OperandTypeError { message: String, line: usize },

    #[error("Division by zero.")]
    DivisionByZero { line: usize },

    #[error("Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Can only call functions and classes.")]
    NotCallable { line: usize },

    /// Property write on something that is not an instance.
    #[error("Only instances have fields.")]
    NotAnInstance { line: usize },

    /// Property read on something that is not an instance.
    #[error("Only instances have properties.")]
    NoProperties { line: usize },

    #[error("Undefined property '{name}'.")]
    UndefinedProperty { name: String, line: usize },

    /// A native function reported a failure.
    #[error("{message}")]
    Native { message: String, line: usize },

    /// A `return`/`break` signal escaped the boundary that should consume it.
    #[error("Internal error: {message}")]
    Internal { message: String, line: usize },

    /// Writing program output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl RuntimeError {
    /// Source line the error is attributed to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UninitializedVariable { line, .. }
            | RuntimeError::OperandTypeError { line, .. }
            | RuntimeError::DivisionByZero { line }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::NotAnInstance { line }
            | RuntimeError::NoProperties { line }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::Native { line, .. }
            | RuntimeError::Internal { line, .. } => Some(*line),
            RuntimeError::Io(_) => None,
        }
    }

    pub(crate) fn operands<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::OperandTypeError {
            message: msg.into(),
            line,
        }
    }

    /// Renders the two-line diagnostic (`message` then `[line N]`).
    pub fn report(&self) -> String {
        match self.line() {
            Some(line) => format!("{}\n[line {}]", self, line),
            None => self.to_string(),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
