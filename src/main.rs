use basil_lang::cli::{self, CliError, RunOptions, RunOutcome};
use basil_lang::{keep_alive, Value};
use clap::{Parser as ClapParser, Subcommand};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "basil")]
#[command(about = "Basil - a small dynamically-typed scripting language for backend automation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file
    Run {
        /// Path to a .basil script
        file: String,
    },

    /// Check a script's syntax without executing it
    Check {
        /// Path to a .basil script
        file: String,
    },

    /// Evaluate source from an argument or piped stdin and echo the result
    Eval {
        /// Basil source (reads from stdin if not provided)
        code: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { file } => run_file(&file),
        Commands::Check { file } => check_file(&file),
        Commands::Eval { code, json } => eval_source(code, json),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_file(path: &str) -> Result<(), CliError> {
    let source = std::fs::read_to_string(path).map_err(CliError::Io)?;

    cli::register_file_imports();
    cli::execute_run(&RunOptions {
        source,
        syntax_only: false,
    })?;

    wait_while_keep_alive();
    Ok(())
}

fn check_file(path: &str) -> Result<(), CliError> {
    let source = std::fs::read_to_string(path).map_err(CliError::Io)?;

    cli::execute_run(&RunOptions {
        source,
        syntax_only: true,
    })?;

    println!("{} - no syntax errors found", path);
    Ok(())
}

fn eval_source(code: Option<String>, json: bool) -> Result<(), CliError> {
    let code = match code {
        Some(code) => code,
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            buffer
        }
        None => return Err(CliError::NoInput),
    };

    cli::register_file_imports();
    let outcome = cli::execute_run(&RunOptions {
        source: code,
        syntax_only: false,
    })?;

    if let RunOutcome::Finished(value) = outcome {
        if json {
            println!("{}", serde_json::to_string(&cli::value_to_json(value))?);
        } else if value != Value::Null {
            println!("{}", value.inspect());
        }
    }

    wait_while_keep_alive();
    Ok(())
}

// Server and scheduler builtins set the keep-alive flag; the process then
// stays up until killed so their background work keeps running.
fn wait_while_keep_alive() {
    if keep_alive() {
        loop {
            std::thread::park();
        }
    }
}
