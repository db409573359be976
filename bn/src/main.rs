use clap::{Parser as ClapParser, ValueEnum};
use std::{
    fs,
    io::{self, Write},
    process,
};

use bn::{EvalError, Interpreter, SessionCreateInfo};

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
enum WordBits {
    #[value(name = "32")]
    W32,
    #[value(name = "64")]
    W64,
}

impl WordBits {
    fn bits(self) -> u32 {
        match self {
            WordBits::W32 => 32,
            WordBits::W64 => 64,
        }
    }
}

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source files to execute in order
    #[arg(required = false, help = "Postfix programs to evaluate")]
    files: Vec<String>,

    /// Expressions evaluated after the files
    #[arg(short = 'e', long = "eval", help = "Evaluate an expression")]
    expressions: Vec<String>,

    /// Start REPL after executing inputs (default if there are none)
    #[arg(long, help = "Force REPL mode after evaluating inputs")]
    repl: bool,

    #[arg(
        long,
        value_enum,
        default_value = "64",
        help = "Width of the fast path word"
    )]
    word_bits: WordBits,

    #[arg(long, help = "Longest string the host accepts")]
    max_string_len: Option<usize>,

    #[arg(long, help = "Limit on live bn.number values")]
    max_handles: Option<usize>,

    #[arg(long, help = "Report library error codes without reason strings")]
    no_error_strings: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let defaults = SessionCreateInfo::default();
    let info = SessionCreateInfo {
        word_bits: cli.word_bits.bits(),
        max_string_len: cli.max_string_len.unwrap_or(defaults.max_string_len),
        max_handles: cli.max_handles,
        error_strings: !cli.no_error_strings,
    };

    let mut interp = match Interpreter::new(info) {
        Ok(interp) => interp,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    for filename in &cli.files {
        let source_code = match fs::read_to_string(filename) {
            Ok(content) => content,
            Err(err) => {
                eprintln!("Error reading file '{}': {}", filename, err);
                process::exit(1);
            }
        };
        if let Err(err) = run(&mut interp, &source_code) {
            eprintln!("Error executing {}: {}", filename, err);
            process::exit(1);
        }
    }

    for expression in &cli.expressions {
        if let Err(err) = run(&mut interp, expression) {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }

    if cli.repl || (cli.files.is_empty() && cli.expressions.is_empty()) {
        run_repl(&mut interp);
    }
}

fn run(interp: &mut Interpreter, source: &str) -> Result<(), EvalError> {
    let res = interp.eval(source);
    for line in interp.take_output() {
        println!("{line}");
    }
    res
}

fn run_repl(interp: &mut Interpreter) {
    println!("bn REPL");
    println!("Type 'exit' to quit.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input_buffer = String::new();

    loop {
        print!("> ");
        if let Err(err) = stdout.flush() {
            eprintln!("Error flushing stdout: {}", err);
            break;
        }

        input_buffer.clear();
        match stdin.read_line(&mut input_buffer) {
            Ok(0) => break,
            Ok(_) => {
                let input = input_buffer.trim();
                if input == "exit" {
                    break;
                }
                if input.is_empty() {
                    continue;
                }
                if let Err(err) = run(interp, input) {
                    eprintln!("Error: {}", err);
                }
                log::debug!(
                    "{} values on the stack, {} live bn.number",
                    interp.stack().len(),
                    interp.session().live_handles()
                );
            }
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_bits_accepts_only_supported_widths() {
        let cli = Cli::try_parse_from(["bn", "--word-bits", "32"]).unwrap();
        assert_eq!(cli.word_bits.bits(), 32);
        let cli = Cli::try_parse_from(["bn"]).unwrap();
        assert_eq!(cli.word_bits, WordBits::W64);

        let err = Cli::try_parse_from(["bn", "--word-bits", "48"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
