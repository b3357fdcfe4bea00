//! CLI entry point for the assembler binary.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use slate_asm::assemble;
use slate_core as _;
#[cfg(test)]
use tempfile as _;

const HELP_TEXT: &str =
    "Usage: slate-asm <input.s> [-o <output.bin>] [--origin <addr>] [--listing] [--symbols]";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    origin: u32,
    listing: bool,
    symbols: bool,
}

#[derive(Debug)]
enum ParseResult {
    Args(CliArgs),
    Help,
}

fn parse_origin(value: &str) -> Result<u32, String> {
    let parsed = value.strip_prefix("0x").map_or_else(
        || value.parse::<u32>().ok(),
        |hex| u32::from_str_radix(hex, 16).ok(),
    );
    parsed.ok_or_else(|| format!("invalid origin address: {value}"))
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut origin = 0;
    let mut listing = false;
    let mut symbols = false;

    while let Some(arg) = args.next() {
        if arg == "--help" {
            return Ok(ParseResult::Help);
        }
        if arg == "--listing" {
            listing = true;
            continue;
        }
        if arg == "--symbols" {
            symbols = true;
            continue;
        }
        if arg == "-o" {
            let value = args
                .next()
                .ok_or_else(|| String::from("missing value for -o"))?;
            output = Some(PathBuf::from(value));
            continue;
        }
        if arg == "--origin" {
            let value = args
                .next()
                .ok_or_else(|| String::from("missing value for --origin"))?;
            origin = parse_origin(&value.to_string_lossy())?;
            continue;
        }
        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }
        if input.is_some() {
            return Err(String::from("multiple input paths provided"));
        }
        input = Some(PathBuf::from(arg));
    }

    let input = input.ok_or_else(|| String::from("missing input path"))?;
    Ok(ParseResult::Args(CliArgs {
        input,
        output,
        origin,
        listing,
        symbols,
    }))
}

fn run(args: &CliArgs) -> Result<(), String> {
    let source = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("{}: {e}", args.input.display()))?;

    let assembly = assemble(&source, args.origin).map_err(|diagnostics| {
        let mut report = String::new();
        for diagnostic in &diagnostics {
            report.push_str(&format!(
                "{}:{}: error: {}\n",
                args.input.display(),
                diagnostic.line,
                diagnostic.message
            ));
        }
        report.push_str(&format!("{} error(s)", diagnostics.len()));
        report
    })?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("bin"));
    std::fs::write(&output, &assembly.image)
        .map_err(|e| format!("{}: {e}", output.display()))?;

    if args.listing {
        print!("{}", assembly.dump);
    }
    if args.symbols {
        for (name, addr) in &assembly.symbols {
            println!("{addr:08x} {name}");
        }
    }

    eprintln!(
        "assembled {} bytes at {:#x} -> {}",
        assembly.image.len(),
        args.origin,
        output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{HELP_TEXT}");
            ExitCode::SUCCESS
        }
        Ok(ParseResult::Args(args)) => match run(&args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{error}");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{HELP_TEXT}");
            ExitCode::FAILURE
        }
    }
}
