//! Drives one or more runs of source text through the pipeline
//! (scan → parse → resolve → interpret) against a long-lived interpreter.
//!
//! Nothing here is global: each run hands back a [`RunOutcome`] that says
//! whether it completed, was rejected statically, or failed at runtime, and
//! the caller decides what to print and which exit code to use.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;

/// Exit code for programs rejected before execution.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit code for programs that failed while executing.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Whole-file execution; only `print` produces output.
    Script,
    /// Interactive: bare expression statements echo their value.
    Prompt,
}

#[derive(Debug)]
pub enum RunOutcome {
    Completed,
    /// Lex, parse or resolve errors; nothing was executed.
    StaticErrors(Vec<LoxError>),
    /// Execution started and was aborted by this error.
    RuntimeFailure(LoxError),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::StaticErrors(_) => EXIT_STATIC_ERROR,
            RunOutcome::RuntimeFailure(_) => EXIT_RUNTIME_ERROR,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }

    /// Every error carried by the outcome, in report order.
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            RunOutcome::Completed => Vec::new(),
            RunOutcome::StaticErrors(errors) => errors.iter().collect(),
            RunOutcome::RuntimeFailure(error) => vec![error],
        }
    }

    /// Write one diagnostic per error to `out`.
    pub fn report(&self, out: &mut dyn Write) -> io::Result<()> {
        for error in self.errors() {
            match error {
                LoxError::Runtime(runtime) => writeln!(out, "{}", runtime.report())?,
                other => writeln!(out, "{}", other)?,
            }
        }
        Ok(())
    }
}

/// Scan and parse `source`, collecting every lex and syntax error.
pub fn parse_source(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, mut errors) = Scanner::new(source).scan_all();

    debug!("Scanned {} token(s), {} lex error(s)", tokens.len(), errors.len());

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => Ok(statements),
        Ok(_) => Err(errors),
        Err(parse_errors) => {
            errors.extend(parse_errors);
            Err(errors)
        }
    }
}

/// One interpreter plus the mode it runs in.  Globals persist between runs.
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self::from_interpreter(Interpreter::new(), mode)
    }

    /// Like [`Session::new`] but program output goes to `output`.
    pub fn with_output(mode: Mode, output: Box<dyn Write>) -> Self {
        Self::from_interpreter(Interpreter::with_output(output), mode)
    }

    fn from_interpreter(mut interpreter: Interpreter, mode: Mode) -> Self {
        interpreter.set_echo(mode == Mode::Prompt);
        info!("Session started in {:?} mode", mode);
        Self { interpreter }
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scan, parse, resolve and run `source`.
    pub fn run(&mut self, source: &str) -> RunOutcome {
        match parse_source(source) {
            Ok(statements) => self.execute(&statements),
            Err(errors) => RunOutcome::StaticErrors(errors),
        }
    }

    /// Resolve then run already-parsed statements.  The same statements may
    /// be executed again; resolution is recomputed each time.
    pub fn execute(&mut self, statements: &[Stmt]) -> RunOutcome {
        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(statements) {
            return RunOutcome::StaticErrors(errors);
        }

        match self.interpreter.interpret(statements) {
            Ok(()) => RunOutcome::Completed,
            Err(e) => {
                debug!("Runtime debug: {}", e);
                RunOutcome::RuntimeFailure(LoxError::Runtime(e))
            }
        }
    }
}
