use std::{
    fs::{self},
    path::{Path, PathBuf},
};

use colored::Colorize;
use itertools::Itertools;
use lazy_static::lazy_static;
use libtest_mimic::{self, run_tests, Arguments, Outcome, Test};
use miette::{miette, IntoDiagnostic, Result};
use mp_rs::{
    tokenize,
    vm_interpreter::{self, Compiler, Variable, Vm},
    Arena, Interpreter, Parser, ParserError, RuntimeError, ScannerError,
};
use regex::Regex;

lazy_static! {
    // the tree interpreter has no variables
    static ref TREEWALK_IGNORE_PATTERN: Regex = Regex::new("test_fixtures/variables/").unwrap();
}

fn main() {
    let tests = read_all_files("test_fixtures".to_string().into())
        .unwrap()
        .into_iter()
        .filter(|path| path.extension().map_or(false, |ext| ext == "mp"))
        .sorted()
        .flat_map(|path| {
            [
                Test {
                    name: path.to_string_lossy().into(),
                    kind: "treewalk".into(),
                    is_bench: false,
                    is_ignored: TREEWALK_IGNORE_PATTERN.is_match(&path.to_string_lossy()),
                    data: path.clone(),
                },
                Test {
                    name: path.to_string_lossy().into(),
                    kind: "bytecode".into(),
                    is_bench: false,
                    is_ignored: false,
                    data: path,
                },
            ]
        })
        .filter(|test| !test.is_ignored)
        .collect::<Vec<_>>();

    run_tests(&Arguments::from_args(), tests, |test| {
        match run_test(&test.data, &test.kind == "treewalk") {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed {
                msg: Some(format!("{:?}", err)),
            },
        }
    })
    .exit();
}

lazy_static! {
    static ref SET_RE: Regex = Regex::new(r"(?m)^# set: ([a-z]) = (\S+)\s*$").unwrap();
    static ref EXPECT_RE: Regex = Regex::new(r"(?m)^# expect: (.*?)\s*$").unwrap();
    static ref EXPECT_TREEWALK_RE: Regex =
        Regex::new(r"(?m)^# expect-treewalk: (.*?)\s*$").unwrap();
    static ref EXPECT_BYTECODE_RE: Regex =
        Regex::new(r"(?m)^# expect-bytecode: (.*?)\s*$").unwrap();
    static ref FRONT_END_ERROR_RE: Regex = Regex::new(r"(?m)^# error: (.*?)\s*$").unwrap();
    static ref RUNTIME_ERROR_RE: Regex = Regex::new(r"(?m)^# runtime-error: (.*?)\s*$").unwrap();
    static ref VM_ERROR_RE: Regex = Regex::new(r"(?m)^# vm-error\s*$").unwrap();
}

/// A fixture file: `#` lines are directives, everything else is the
/// expression.
struct Fixture {
    expression: String,
    variables: Vec<(char, f64)>,
    expected_value: Option<String>,
    expected_front_end_error: Option<String>,
    expected_runtime_error: Option<String>,
}

impl Fixture {
    fn read(path: &Path, is_treewalk: bool) -> Result<Self> {
        let source = fs::read_to_string(path).into_diagnostic()?;
        let expression = source
            .lines()
            .filter(|line| !line.starts_with('#'))
            .join("\n");

        let variables = SET_RE
            .captures_iter(&source)
            .map(|captures| {
                let letter = captures[1].chars().next().unwrap();
                captures[2]
                    .parse::<f64>()
                    .map(|value| (letter, value))
                    .map_err(|_| miette!("bad value in {:?}", &captures[0]))
            })
            .collect::<Result<Vec<_>>>()?;

        let single = |re: &Regex, what: &str| {
            re.captures_iter(&source)
                .map(|captures| captures[1].to_string())
                .at_most_one()
                .map_err(|_| miette!("should have at most one {}", what))
        };

        let path_specific = if is_treewalk {
            single(&EXPECT_TREEWALK_RE, "treewalk expectation")?
        } else {
            single(&EXPECT_BYTECODE_RE, "bytecode expectation")?
        };
        let expected_value = path_specific.or(single(&EXPECT_RE, "expectation")?);

        let expected_runtime_error = if is_treewalk {
            single(&RUNTIME_ERROR_RE, "expected runtime error")?
        } else {
            VM_ERROR_RE
                .is_match(&source)
                .then(|| "vm-error".to_string())
        };

        Ok(Self {
            expression,
            variables,
            expected_value,
            expected_front_end_error: single(&FRONT_END_ERROR_RE, "expected error")?,
            expected_runtime_error,
        })
    }
}

fn run_test(path: &Path, is_treewalk: bool) -> Result<Outcome> {
    let fixture = Fixture::read(path, is_treewalk)?;

    let tokens = match tokenize(&fixture.expression) {
        Ok(tokens) => tokens,
        Err(error) => return Ok(expect_error(error, &fixture.expected_front_end_error)),
    };
    let mut arena = Arena::new();
    let root = match Parser::parse(&mut arena, &tokens) {
        Ok(root) => root,
        Err(error) => return Ok(expect_error(error, &fixture.expected_front_end_error)),
    };
    if let Some(expected) = &fixture.expected_front_end_error {
        return Ok(Outcome::Failed {
            msg: Some(format!("Expected error:\n{}", expected)),
        });
    }

    let result = if is_treewalk {
        Interpreter::new(&arena).interpret(root).map_err(|e| e.fmt_error())
    } else {
        run_bytecode(&arena, root, &fixture.variables)
    };

    let actual_value = match result {
        Ok(value) => format_value(value),
        Err(actual_error) => {
            return Ok(match_errors(actual_error, &fixture.expected_runtime_error)
                .map_or_else(|msg| Outcome::Failed { msg: Some(msg) }, |_| Outcome::Passed))
        }
    };
    if let Some(expected_err) = &fixture.expected_runtime_error {
        return Ok(Outcome::Failed {
            msg: Some(format!("Expected runtime error:\n{}", expected_err)),
        });
    }

    let expected_value = fixture
        .expected_value
        .ok_or_else(|| miette!("fixture has no expectation"))?;
    Ok(compare_outputs(vec![expected_value], vec![actual_value]))
}

fn run_bytecode(
    arena: &Arena,
    root: mp_rs::NodeId,
    variables: &[(char, f64)],
) -> Result<f64, String> {
    let chunk = Compiler::compile(arena, root).map_err(|e| e.fmt_error())?;
    let mut vm = Vm::new(chunk);
    for (letter, value) in variables {
        let variable = Variable::from_letter(*letter).map_err(|e| e.to_string())?;
        vm.set_variable(variable, *value);
    }
    vm.run().map_err(|e| e.fmt_error())?;
    vm.result()
        .ok_or_else(|| vm_interpreter::InterpreterError::StackUnderflow.fmt_error())
}

/// Whole numbers print without a fraction, like `12`; otherwise the shortest
/// round-tripping form.
fn format_value(value: f64) -> String {
    format!("{}", value)
}

fn expect_error<E: FmtError>(actual_error: E, expected_error: &Option<String>) -> Outcome {
    match match_errors(actual_error.fmt_error(), expected_error) {
        Ok(_) => Outcome::Passed,
        Err(msg) => Outcome::Failed { msg: Some(msg) },
    }
}

fn match_errors(actual_str: String, expected_error: &Option<String>) -> Result<(), String> {
    match expected_error {
        Some(expected_str) if expected_str.trim() == actual_str.trim() => Ok(()),
        Some(expected_str) => Err(format!(
            "Errors do not match.\nExpected: {}\n  Actual: {}",
            expected_str, actual_str
        )),
        None => Err(format!("Unexpected error:\n{}", actual_str)),
    }
}

fn compare_outputs(expected_lines: Vec<String>, actual_lines: Vec<String>) -> Outcome {
    const EXPECTED: &str = "expected";
    const ACTUAL: &str = "actual";
    const NONE: &str = "<None>";

    fn max_len(lines: &[String], label: &str) -> usize {
        lines
            .iter()
            .map(|line| line.len())
            .max()
            .unwrap_or(0)
            .max(label.len())
    }

    let max_expected_len = max_len(&expected_lines, EXPECTED);
    let max_actual_len = max_len(&actual_lines, ACTUAL);

    let mut output_str = format!(
        "   | {:max_expected_len$} | {:max_actual_len$} \n",
        EXPECTED.bold(),
        ACTUAL.bold()
    );
    let line_count = expected_lines.len().max(actual_lines.len());
    let mut unmatched_count = 0usize;
    for i in 0..line_count {
        let expected_line = expected_lines.get(i);
        let actual_line = actual_lines.get(i);

        let is_match = expected_line == actual_line;
        if !is_match {
            unmatched_count += 1;
        }

        let colorify = |string: &str| {
            if is_match {
                string.green()
            } else {
                string.red()
            }
        };

        let result_char = if is_match { "✓" } else { "✗" };
        let result_str = &format!(
            " {} | {:max_expected_len$} | {:max_actual_len$}",
            colorify(result_char),
            expected_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
            actual_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
        );
        output_str.push_str(result_str);
        output_str.push('\n');
    }

    if unmatched_count > 0 {
        Outcome::Failed {
            msg: Some(output_str),
        }
    } else {
        Outcome::Passed
    }
}

fn read_all_files(prefix: PathBuf) -> Result<Vec<PathBuf>> {
    let mut results = Vec::<PathBuf>::new();
    read_children(prefix, &mut results)?;
    return Ok(results);

    fn read_children(prefix: PathBuf, results: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(prefix).into_diagnostic()? {
            let entry = entry.into_diagnostic()?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().into_diagnostic()?.is_dir() {
                read_children(entry.path(), results)?;
            } else {
                results.push(entry.path())
            }
        }
        Ok(())
    }
}

/// Renders an error the way fixtures spell it out.
trait FmtError {
    fn fmt_error(&self) -> String;
}
impl FmtError for ScannerError {
    fn fmt_error(&self) -> String {
        format!("{:?} at {}", self.kind(), self.offset())
    }
}
impl FmtError for ParserError {
    fn fmt_error(&self) -> String {
        format!("{:?} at {}", self.kind(), self.offset())
    }
}
impl FmtError for RuntimeError {
    fn fmt_error(&self) -> String {
        format!("{:?}", self.kind())
    }
}
impl FmtError for vm_interpreter::CompilerError {
    fn fmt_error(&self) -> String {
        "vm-error".to_string()
    }
}
impl FmtError for vm_interpreter::InterpreterError {
    fn fmt_error(&self) -> String {
        "vm-error".to_string()
    }
}
