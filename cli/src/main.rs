use std::path::{Component, Path, PathBuf};
use std::sync::Once;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use symbind_core::{
    code::{Function, disassemble},
    inline::{CaptureScope, Frame, Substitutions, bind_with_report, capture},
    val::Val,
};
use tracing::info;

mod bench_gen;
mod fixture;

use fixture::Fixture;

static TRACE_INIT: Once = Once::new();
const DEFAULT_TRACE_FILTER: &str = "symbind_core=debug,symbind_cli=info";

#[derive(Debug, Parser)]
#[command(
    name = "symbind",
    author,
    version,
    about = "Bind names of a compiled function to constants",
    long_about = None
)]
struct CliArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum EmitKind {
    /// Human-readable listing
    #[default]
    Disasm,
    /// Fixture JSON of the patched function
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inline names of a fixture's function and print the result
    Inline {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
        /// Substitution `NAME=VALUE`; repeatable. Without any, names are
        /// captured from the fixture's `locals`.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, Val)>,
        /// Also capture the fixture's globals (locals take precedence)
        #[arg(long)]
        capture_module: bool,
        #[arg(long, value_enum, default_value_t = EmitKind::Disasm)]
        emit: EmitKind,
        /// Print the rebuilt symbol tables before the output
        #[arg(long)]
        report: bool,
    },
    /// Print the disassembly of a fixture's function
    Disasm {
        #[arg(value_name = "FILE", value_parser = parse_sanitized_path)]
        file: PathBuf,
    },
    /// Print a generated fixture summing N variables
    GenBench {
        #[arg(long, value_name = "N")]
        vars: usize,
        /// Hold the variables in closure cells instead of globals
        #[arg(long)]
        closure: bool,
    },
}

fn sanitize_path(raw: &str) -> anyhow::Result<PathBuf> {
    let p = Path::new(raw);

    for comp in p.components() {
        if matches!(comp, Component::ParentDir) {
            return Err(anyhow::anyhow!(
                "Parent directory components ('..') are not allowed in file paths."
            ));
        }
    }

    Ok(p.to_path_buf())
}

fn parse_sanitized_path(raw: &str) -> Result<PathBuf, String> {
    sanitize_path(raw).map_err(|e| e.to_string())
}

/// Parse a literal: `nil`, `true`, `false`, an integer, a float, a quoted
/// string, or a tagged JSON value such as `{"type":"range","value":[0,3]}`.
fn parse_value(raw: &str) -> anyhow::Result<Val> {
    let trimmed = raw.trim();
    match trimmed {
        "nil" => return Ok(Val::Nil),
        "true" => return Ok(Val::Bool(true)),
        "false" => return Ok(Val::Bool(false)),
        _ => {}
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Val::Int(i));
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return Ok(Val::Float(f));
    }
    if trimmed.starts_with('"') {
        let s: String = serde_json::from_str(trimmed).with_context(|| format!("invalid string literal {}", trimmed))?;
        return Ok(Val::str(s));
    }
    serde_json::from_str(trimmed).with_context(|| format!("unrecognized value `{}`", trimmed))
}

fn parse_assignment(raw: &str) -> Result<(String, Val), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{}`", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in `{}`", raw));
    }
    let value = parse_value(value).map_err(|e| format!("{:#}", e))?;
    Ok((name.to_string(), value))
}

fn env_toggle_enabled(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    !(trimmed.eq_ignore_ascii_case("0") || trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("off"))
}

/// `SYMBIND_TRACE=1` enables the default filter; any other value that is not
/// a plain toggle is used as the filter expression itself.
fn filter_expr_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let is_toggle = ["1", "true", "on", "yes"]
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t));
    if is_toggle { None } else { Some(trimmed.to_string()) }
}

fn maybe_init_tracing() {
    let raw = match std::env::var("SYMBIND_TRACE") {
        Ok(value) => value,
        Err(_) => return,
    };

    if !env_toggle_enabled(&raw) {
        return;
    }

    TRACE_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        use tracing_subscriber::fmt;

        let filter_expr = filter_expr_from(&raw).or_else(|| std::env::var("RUST_LOG").ok());

        let builder = fmt().with_writer(std::io::stderr);

        let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
            Some(filter) => builder.with_env_filter(filter),
            None => builder.with_env_filter(DEFAULT_TRACE_FILTER),
        };

        let _ = builder.try_init();
    });
}

fn emit(fixture: &Fixture, func: &Function, kind: EmitKind) -> anyhow::Result<String> {
    match kind {
        EmitKind::Disasm => disassemble(&func.code),
        EmitKind::Json => Fixture::from_function(func, fixture.locals.clone()).to_json(),
    }
}

/// Substitutions for `inline`: the explicit `--set` pairs, or the bindings
/// captured from the fixture's call-site snapshot.
fn substitutions_for(
    fixture: &Fixture,
    func: &Function,
    set: Vec<(String, Val)>,
    capture_module: bool,
) -> Substitutions {
    if !set.is_empty() {
        return set.into_iter().collect();
    }
    let frame = fixture
        .locals
        .iter()
        .fold(Frame::new().with_module(func.globals.clone()), |frame, (name, value)| {
            frame.with_local(name.clone(), value.clone())
        });
    let scope = if capture_module { CaptureScope::LocalsAndModule } else { CaptureScope::Locals };
    capture(&frame, scope)
}

fn run_inline(
    file: &Path,
    set: Vec<(String, Val)>,
    capture_module: bool,
    kind: EmitKind,
    report: bool,
) -> anyhow::Result<String> {
    let fixture = Fixture::load(file)?;
    let func = fixture.to_function()?;
    let subs = substitutions_for(&fixture, &func, set, capture_module);
    info!(file = %file.display(), names = subs.len(), "inlining");

    let result = bind_with_report(&func, &subs).with_context(|| format!("cannot inline {}", file.display()))?;
    let mut out = String::new();
    if report {
        out.push_str(&result.scope.to_string());
    }
    out.push_str(&emit(&fixture, &result.function, kind)?);
    Ok(out)
}

fn run_disasm(file: &Path) -> anyhow::Result<String> {
    let fixture = Fixture::load(file)?;
    disassemble(&fixture.to_function()?.code)
}

fn run(command: Commands) -> anyhow::Result<String> {
    match command {
        Commands::Inline {
            file,
            set,
            capture_module,
            emit,
            report,
        } => run_inline(&file, set, capture_module, emit, report),
        Commands::Disasm { file } => run_disasm(&file),
        Commands::GenBench { vars, closure } => bench_gen::sum_fixture(vars, closure)?.to_json(),
    }
}

fn main() -> anyhow::Result<()> {
    maybe_init_tracing();

    let CliArgs { command } = CliArgs::parse();
    let out = run(command)?;
    println!("{}", out.trim_end());
    Ok(())
}
