use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use quill::ast_printer::AstPrinter;
use quill::config::{Config, DEFAULT_MAX_CALL_DEPTH};
use quill::error::QuillError;
use quill::interpreter::Interpreter;
use quill::parser::Parser;
use quill::scanner::Scanner;
use quill::token::Token;

const EXIT_STATIC_ERROR: i32 = 65;
const EXIT_RUNTIME_ERROR: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Quill language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,

    /// Maximum call depth before a run aborts with "Stack overflow."
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints the AST of each statement
    Parse { filename: PathBuf },

    /// Runs a file as a Quill program
    Run { filename: PathBuf },
}

/// Maps the file and validates it as UTF-8.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    // Mapping a zero-length file fails on some platforms.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is read once, copied into an owned buffer, and dropped
    // before the interpreter starts.
    let map = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    let source = String::from_utf8(map.to_vec())
        .map_err(QuillError::from)
        .context(format!("File {:?} is not valid UTF-8", filename))?;

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            // Strip 'quill::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("quill::")
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
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn report(errors: &[QuillError]) {
    for e in errors {
        debug!("Reporting: {:?}", e);
        eprintln!("{}", e);
    }
}

fn exit_code(errors: &[QuillError]) -> i32 {
    if errors
        .iter()
        .any(|e| matches!(e, QuillError::Runtime { .. }))
    {
        EXIT_RUNTIME_ERROR
    } else {
        EXIT_STATIC_ERROR
    }
}

fn tokenize(source: &str, json: bool) -> Result<()> {
    info!("Running Tokenize subcommand");

    let mut tokens: Vec<Token> = Vec::new();
    let mut failure: Option<QuillError> = None;

    for token in Scanner::new(source) {
        match token {
            Ok(token) => tokens.push(token),
            Err(e) => failure = Some(e),
        }
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&tokens).context("Failed to serialise tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token.describe(source));
        }
    }

    if let Some(e) = failure {
        report(&[e]);
        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Tokenization completed successfully");
    Ok(())
}

fn parse(source: &str) -> Result<()> {
    info!("Running Parse subcommand");

    let tokens = match quill::scanner::scan(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            report(&[e]);
            std::process::exit(EXIT_STATIC_ERROR);
        }
    };

    let mut parser = Parser::new(source, &tokens);
    let statements = parser.parse();

    if !statements.is_empty() {
        println!("{}", AstPrinter::new(source).print_program(&statements));
    }

    let errors = parser.take_errors();
    if !errors.is_empty() {
        report(&errors);
        std::process::exit(EXIT_STATIC_ERROR);
    }

    info!("Parse subcommand completed");
    Ok(())
}

fn run(source: &str, config: Config) -> Result<()> {
    info!("Running Run subcommand");

    let mut interpreter = Interpreter::new().with_config(config);

    if let Err(errors) = quill::run(source, &mut interpreter) {
        report(&errors);
        std::process::exit(exit_code(&errors));
    }

    info!("Program executed successfully");
    Ok(())
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

    let config = Config::default().with_max_call_depth(args.max_depth);

    match args.commands {
        Commands::Tokenize { filename, json } => tokenize(&read_source(&filename)?, json),
        Commands::Parse { filename } => parse(&read_source(&filename)?),
        Commands::Run { filename } => run(&read_source(&filename)?, config),
    }
}
