use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{self, Mode, RunOutcome, Session};

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print one JSON object per token
        #[arg(long)]
        json: bool,
    },

    /// Parses a program from a file and prints its AST
    Parse { filename: PathBuf },

    /// Evaluates input from a file as a single expression and prints the result
    Evaluate { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default)
    Repl,
}

/// Maps `path` read-only and hands its contents to `f` as text.
fn with_source<T>(path: &Path, f: impl FnOnce(&str) -> Result<T>) -> Result<T> {
    info!("Reading file: {:?}", path);
    let file = File::open(path).with_context(|| format!("Failed to open file {:?}", path))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", path))?
        .len();

    // Zero-length files cannot be mapped on every platform.
    if len == 0 {
        return f("");
    }

    // SAFETY: the map is read-only and dropped before this function returns;
    // concurrent truncation of the script by another process is not supported.
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", path))?;

    let source = std::str::from_utf8(&mmap)
        .map_err(rox::error::LoxError::from)
        .with_context(|| format!("File {:?} is not valid UTF-8", path))?;

    info!("Read {} bytes from {:?}", len, path);

    f(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rox::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(source: &str, json: bool) -> Result<i32> {
    let mut tokenized = true;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for token in Scanner::new(source) {
        match token {
            Ok(token) if json => writeln!(out, "{}", serde_json::to_string(&token)?)?,
            Ok(token) => writeln!(out, "{}", token)?,
            Err(e) => {
                tokenized = false;
                eprintln!("{}", e);
            }
        }
    }

    Ok(if tokenized { 0 } else { session::EXIT_STATIC_ERROR })
}

fn parse(source: &str) -> Result<i32> {
    match session::parse_source(source) {
        Ok(statements) => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
            Ok(0)
        }
        Err(errors) => {
            RunOutcome::StaticErrors(errors).report(&mut io::stderr())?;
            Ok(session::EXIT_STATIC_ERROR)
        }
    }
}

fn evaluate(source: &str) -> Result<i32> {
    let (tokens, errors) = Scanner::new(source).scan_all();
    if !errors.is_empty() {
        RunOutcome::StaticErrors(errors).report(&mut io::stderr())?;
        return Ok(session::EXIT_STATIC_ERROR);
    }

    let expr = match Parser::new(&tokens).parse_expression() {
        Ok(expr) => expr,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(session::EXIT_STATIC_ERROR);
        }
    };

    let mut session = Session::new(Mode::Script);
    match session.interpreter().evaluate(&expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(0)
        }
        Err(e) => {
            eprintln!("{}", e.report());
            Ok(session::EXIT_RUNTIME_ERROR)
        }
    }
}

fn run(source: &str) -> Result<i32> {
    let mut session = Session::new(Mode::Script);
    let outcome = session.run(source);

    outcome.report(&mut io::stderr())?;
    info!("Run finished with exit code {}", outcome.exit_code());

    Ok(outcome.exit_code())
}

fn repl() -> Result<i32> {
    let mut session = Session::new(Mode::Prompt);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        let outcome = session.run(&line);
        debug!("REPL line finished: {:?}", outcome.exit_code());
        outcome.report(&mut io::stderr())?;
    }

    println!();
    Ok(0)
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    let code = match args.commands.unwrap_or(Commands::Repl) {
        Commands::Tokenize { filename, json } => with_source(&filename, |s| tokenize(s, json))?,
        Commands::Parse { filename } => with_source(&filename, parse)?,
        Commands::Evaluate { filename } => with_source(&filename, evaluate)?,
        Commands::Run { filename } => with_source(&filename, run)?,
        Commands::Repl => repl()?,
    };

    if code != 0 {
        debug!("Exiting with code {}", code);
        std::process::exit(code);
    }

    Ok(())
}
