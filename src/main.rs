use std::{f64::consts, time::Instant};

use colored::Colorize;
use itertools::Itertools;
use miette::{IntoDiagnostic, Report, Result};
use rustyline::{error::ReadlineError, Editor};
use tracing_subscriber::EnvFilter;

use mp_rs::{
    tokenize,
    vm_interpreter::{Compiler, Variable, VariableBank},
    Arena, Environment, Error, Interpreter, Parser, TreeDisplay,
};

const DEFAULT_BENCH_COUNT: usize = 1000 * 1000;
const BENCH_EXPRESSION: &str = "(12+45)*(78-34)/(9^3)+((56*(23+67)-(89/7))^2)-(15*(3+5)/(2^4))+((8-4)*(6+2)/(10-3))+(100/(25-5)*(3^2)-(7+2)*(5-1)+(4*(9+1)/(2^3)))-((11+22)*(33-44)/(55+66)+(77^2)-(88/(4+4))*(3+5)+(2*(6-1)^3))";

/// Constants that win over user variables of the same name.
const PRESETS: [(char, f64); 2] = [('p', consts::PI), ('e', consts::E)];
const SIGNIFICANT_DIGITS: usize = 10;

const USAGE: &str = "Usage: mp-rs [--tree-walk] [--debug] [--bench[=N]] [expression]";
const HELP: &str = "\
Usage:
  Type an expression or a command to use the application.
  Supported operations: (+) (-) (*) (/) (^)
  Example: 2 * (4.3 / 3.1) - 8

Commands:
  exit:     Quit the application
  help:     Show this text
  set:      Set a variable to a specific value (a - z)
  vars:     List the variables that are not zero
  debug:    Toggle dumping tokens, tree and bytecode";

#[derive(Debug, Default, Clone, Copy)]
struct ReplOpts {
    tree_walk: bool,
    debug: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<_> = std::env::args().skip(1).collect();
    let opts = ReplOpts {
        tree_walk: consume_arg(&mut args, |arg| (arg == "--tree-walk").then(|| true))
            .unwrap_or(false),
        debug: consume_arg(&mut args, |arg| (arg == "--debug").then(|| true)).unwrap_or(false),
    };
    let bench = consume_arg(&mut args, |arg| match arg {
        "--bench" => Some(Some(DEFAULT_BENCH_COUNT)),
        _ => arg
            .strip_prefix("--bench=")
            .map(|count| count.parse::<usize>().ok()),
    });
    let expression = consume_arg(&mut args, |arg| {
        if arg.starts_with("--") {
            None
        } else {
            Some(arg.to_string())
        }
    });
    if !args.is_empty() {
        eprintln!("Unrecognized arguments: {:?}", args);
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    match (bench, expression) {
        (Some(None), _) => {
            eprintln!("--bench expects a number of runs");
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
        (Some(Some(count)), _) => run_bench(count),
        (None, Some(expression)) => {
            let repl = Repl::new(opts);
            if !repl.run_line(&expression) {
                std::process::exit(65);
            }
            Ok(())
        }
        (None, None) => Repl::new(opts).run_prompt(),
    }
}

fn consume_arg<T, F: Fn(&str) -> Option<T>>(args: &mut Vec<String>, predicate: F) -> Option<T> {
    let found = args
        .iter()
        .enumerate()
        .filter_map(|(idx, arg)| predicate(arg).map(|val| (idx, val)))
        .next();

    if let Some((idx, val)) = found {
        args.remove(idx);
        Some(val)
    } else {
        None
    }
}

fn report_error(error: Error, source: &str) {
    println!("{:?}", Report::new(error).with_source_code(source.to_string()));
}

struct Repl {
    opts: ReplOpts,
    variables: VariableBank,
}

impl Repl {
    fn new(opts: ReplOpts) -> Self {
        Self {
            opts,
            variables: VariableBank::new(),
        }
    }

    fn evaluate(&self, source: &str) -> Result<f64, Error> {
        if self.opts.tree_walk {
            return mp_rs::interpret(source);
        }
        let mut env = Environment::new(source)?;
        for (variable, value) in self.variables.iter() {
            env.set_variable(variable.letter(), value)?;
        }
        for (letter, value) in PRESETS {
            env.set_variable(letter, value)?;
        }
        env.evaluate()
    }

    /// Prints every stage of the pipeline, as far as it gets.
    fn dump(&self, source: &str) {
        let tokens = match tokenize(source) {
            Ok(tokens) => tokens,
            Err(_) => return,
        };
        println!("{}", "== tokens ==".dimmed());
        print!("{}", tokens);

        let mut arena = Arena::new();
        let root = match Parser::parse(&mut arena, &tokens) {
            Ok(root) => root,
            Err(_) => return,
        };
        println!("{}", "== tree ==".dimmed());
        println!("{}", TreeDisplay::new(&arena, root));

        if let Ok(chunk) = Compiler::compile(&arena, root) {
            chunk.disassemble("bytecode");
        }
    }

    /// Returns whether the line evaluated successfully.
    fn run_line(&self, source: &str) -> bool {
        if self.opts.debug {
            self.dump(source);
        }
        match self.evaluate(source) {
            Ok(value) => {
                println!("{}", format_general(value));
                true
            }
            Err(error) => {
                report_error(error, source);
                false
            }
        }
    }

    fn run_prompt(mut self) -> Result<()> {
        let mut rl = Editor::<()>::new();
        println!("Type `help` for more information");
        loop {
            let line = match rl.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => return Ok(()),
                Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err).into_diagnostic(),
            };
            rl.add_history_entry(line.as_str());

            match line.trim() {
                "" => {}
                "exit" => return Ok(()),
                "help" => println!("{}", HELP),
                "debug" => {
                    self.opts.debug = !self.opts.debug;
                    println!("debug output {}", if self.opts.debug { "on" } else { "off" });
                }
                "vars" => println!(
                    "{}",
                    self.variables
                        .iter()
                        .filter(|(_, value)| *value != 0.0)
                        .map(|(variable, value)| format!("{} = {}", variable, format_general(value)))
                        .join("\n")
                ),
                "set" => {
                    if !self.prompt_set(&mut rl)? {
                        return Ok(());
                    }
                }
                source => {
                    self.run_line(source);
                }
            }
        }
    }

    /// Asks for a variable and its new value. Returns `false` if input ended.
    fn prompt_set(&mut self, rl: &mut Editor<()>) -> Result<bool> {
        let name = match read_prompt(rl, "var: ")? {
            Some(name) => name,
            None => return Ok(false),
        };
        let variable = match name.chars().exactly_one().map(Variable::from_letter) {
            Ok(Ok(variable)) => variable,
            _ => {
                println!("{}", "ERROR: Invalid variable name (a - z)".red());
                return Ok(true);
            }
        };

        let value = match read_prompt(rl, "value: ")? {
            Some(value) => value,
            None => return Ok(false),
        };
        match value.parse::<f64>() {
            Ok(value) => {
                self.variables.set(variable, value);
                println!("{} = {}", variable, format_general(value));
            }
            Err(_) => println!("{}", "ERROR: Expected a number".red()),
        }
        Ok(true)
    }
}

fn read_prompt(rl: &mut Editor<()>, prompt: &str) -> Result<Option<String>> {
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(err).into_diagnostic(),
    }
}

/// Formats like C's `%.10g`: ten significant digits, trailing zeros dropped,
/// scientific notation for exponents below -4 or from ten up.
fn format_general(value: f64) -> String {
    if !value.is_finite() {
        return match value {
            v if v.is_nan() => "nan".to_string(),
            v if v > 0.0 => "inf".to_string(),
            _ => "-inf".to_string(),
        };
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", SIGNIFICANT_DIGITS - 1, value);
    let (mantissa, exponent) = match scientific
        .split_once('e')
        .and_then(|(mantissa, exponent)| Some((mantissa, exponent.parse::<i32>().ok()?)))
    {
        Some(parts) => parts,
        None => return scientific,
    };

    if exponent < -4 || exponent >= SIGNIFICANT_DIGITS as i32 {
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            if exponent < 0 { '-' } else { '+' },
            exponent.abs()
        )
    } else {
        let decimals = (SIGNIFICANT_DIGITS as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn run_bench(count: usize) -> Result<()> {
    let mut env = Environment::new(BENCH_EXPRESSION)?;
    let start = Instant::now();
    for _ in 0..count {
        env.evaluate()?;
    }
    println!("vm({}): {} ms", count, start.elapsed().as_millis());

    let tokens = tokenize(BENCH_EXPRESSION)?;
    let mut arena = Arena::new();
    let root = Parser::parse(&mut arena, &tokens)?;
    let interpreter = Interpreter::new(&arena);
    let start = Instant::now();
    for _ in 0..count {
        interpreter.interpret(root)?;
    }
    println!("in({}): {} ms", count, start.elapsed().as_millis());

    Ok(())
}
