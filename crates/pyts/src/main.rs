use pyts::{
    compile_with, discover_config, format_diagnostics, parse, read_config, set_trace_override,
    tokenize, CompileOptions, Diagnostic, PytsError,
};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(PytsError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), PytsError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "compile" => cmd_compile(&rest, true),
        "check" => cmd_compile(&rest, false),
        "tokens" => {
            let flags = parse_flags(&rest, "tokens")?;
            let source = read_source(&flags.input)?;
            let (tokens, diagnostics) = tokenize(&source);
            print_json(&tokens)?;
            report(&diagnostics)
        }
        "ast" => {
            let flags = parse_flags(&rest, "ast")?;
            let source = read_source(&flags.input)?;
            let (program, diagnostics) = parse(&source);
            print_json(&program)?;
            report(&diagnostics)
        }
        _ => Err(PytsError::InvalidCommand(command)),
    }
}

fn print_help() {
    println!(
        "pyts\n\nUSAGE:\n  pyts <COMMAND>\n\nCOMMANDS:\n  compile <file|-> [--out <file>] [--json] [--config <path>] [--trace]\n  check <file|-> [--json] [--config <path>] [--trace]\n  tokens <file|->\n  ast <file|->\n\n  -h, --help"
    );
}

struct Flags {
    input: String,
    out: Option<PathBuf>,
    json: bool,
    config: Option<PathBuf>,
}

fn parse_flags(args: &[String], command: &str) -> Result<Flags, PytsError> {
    let mut input = None;
    let mut out = None;
    let mut json = false;
    let mut config = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--trace" => set_trace_override(Some(true)),
            "--out" | "--config" => {
                let Some(value) = iter.next() else {
                    return Err(PytsError::InvalidCommand(format!(
                        "{command}: {arg} expects a path"
                    )));
                };
                if arg == "--out" {
                    out = Some(PathBuf::from(value));
                } else {
                    config = Some(PathBuf::from(value));
                }
            }
            value if (value == "-" || !value.starts_with('-')) && input.is_none() => {
                input = Some(value.to_string());
            }
            other => {
                return Err(PytsError::InvalidCommand(format!(
                    "unexpected {command} argument {other}"
                )));
            }
        }
    }
    let Some(input) = input else {
        return Err(PytsError::InvalidCommand(format!(
            "{command}: missing input file (use - for stdin)"
        )));
    };
    Ok(Flags {
        input,
        out,
        json,
        config,
    })
}

fn read_source(input: &str) -> Result<String, PytsError> {
    if input == "-" {
        let mut source = String::new();
        io::stdin().read_to_string(&mut source)?;
        return Ok(source);
    }
    Ok(fs::read_to_string(input)?)
}

fn load_options(config: Option<&Path>) -> Result<CompileOptions, PytsError> {
    match config {
        Some(path) => read_config(path),
        None => discover_config(&env::current_dir()?),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), PytsError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|err| PytsError::Io(io::Error::other(err)))?;
    println!("{output}");
    Ok(())
}

/// Prints diagnostics to stderr; any error turns into a failing exit status.
fn report(diagnostics: &[Diagnostic]) -> Result<(), PytsError> {
    if !diagnostics.is_empty() {
        eprintln!("{}", format_diagnostics(diagnostics));
    }
    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(PytsError::Diagnostics);
    }
    Ok(())
}

fn cmd_compile(args: &[String], emit: bool) -> Result<(), PytsError> {
    let command = if emit { "compile" } else { "check" };
    let flags = parse_flags(args, command)?;
    if flags.out.is_some() && !emit {
        return Err(PytsError::InvalidCommand(
            "check: --out is only valid for compile".to_string(),
        ));
    }
    let options = load_options(flags.config.as_deref())?;
    let source = read_source(&flags.input)?;
    let mut result = compile_with(&source, &options)?;
    if !emit {
        result.generated_code = None;
    }

    if flags.json {
        print_json(&result)?;
    } else if !result.diagnostics.is_empty() {
        eprintln!("{}", result.render_diagnostics());
    }

    if let Some(code) = &result.generated_code {
        match &flags.out {
            Some(path) => fs::write(path, code)?,
            None if !flags.json => print!("{code}"),
            None => {}
        }
    }

    if result.success {
        Ok(())
    } else {
        Err(PytsError::Diagnostics)
    }
}
