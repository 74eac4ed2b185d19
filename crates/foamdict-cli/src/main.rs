//! `foamdict`: format, expand and query OpenFOAM/Caelus dictionary files.
//!
//! Examples:
//!   foamdict fmt system/controlDict           - print the formatted file
//!   foamdict fmt -i system/fvSchemes          - format in place
//!   foamdict expand --json system/fvSolution  - includes and macros resolved, as JSON
//!   foamdict get system/controlDict endTime   - print one entry
//!   foamdict check system/* constant/*        - parse every file, report failures

mod json;

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use foamdict_case::{CaseError, DictFile, LoadOptions, LoadStatus, MacroPolicy};
use foamdict_format::{Banner, FormatOptions, inline, render, render_file};
use foamdict_parse::{EtcDirs, IncludeError, OsFileSystem, ParseError, parse};
use foamdict_tree::Value;
use tracing::debug;

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "foamdict", version, about = "OpenFOAM/Caelus dictionary tool", long_about = None)]
struct Cli {
    /// More logging; repeat for more detail
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Extra etc directory for #includeEtc, searched before FOAM_ETC
    #[arg(long = "etc", value_name = "DIR", global = true)]
    etc_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file in the canonical layout
    Fmt {
        /// Input file, or "-" for stdin
        file: String,

        /// Rewrite the file in place
        #[arg(short, long, conflicts_with = "output")]
        in_place: bool,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only the entries, without banner and separator lines
        #[arg(long)]
        bare: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Resolve includes and macros, then print the result
    Expand {
        file: PathBuf,

        /// Fail on unresolved macro references instead of warning
        #[arg(long)]
        strict: bool,

        /// Print JSON instead of dictionary syntax
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        load: LoadArgs,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print the entry at a path such as `solvers/p/tolerance`
    Get {
        file: PathBuf,
        path: String,

        /// Resolve includes and macros first
        #[arg(long)]
        expand: bool,

        /// Print JSON instead of dictionary syntax
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        load: LoadArgs,
    },

    /// Set a top-level entry and write the file back
    Set {
        file: PathBuf,
        key: String,
        /// The value in dictionary syntax, e.g. `runTime` or `(0 0 1)`
        value: String,

        /// Skip the option check for known fields
        #[arg(long)]
        force: bool,
    },

    /// Parse every file and report the ones that fail
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also resolve includes and macros
        #[arg(long)]
        expand: bool,
    },
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// Spaces per indentation level
    #[arg(long, default_value_t = 4)]
    tab_width: usize,

    /// Preferred line width
    #[arg(long, default_value_t = 80)]
    max_width: usize,
}

impl LayoutArgs {
    fn options(&self) -> FormatOptions {
        FormatOptions::default()
            .tab_width(self.tab_width)
            .max_width(self.max_width)
    }
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Files over this many bytes only have their header read
    #[arg(long, value_name = "BYTES")]
    size_limit: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli);
    match result {
        Ok(code) => code,
        Err(e) => {
            report(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let etc = etc_dirs(&cli.etc_dirs);
    match &cli.command {
        Command::Fmt {
            file,
            in_place,
            output,
            bare,
            layout,
        } => run_fmt(file, *in_place, output.as_deref(), *bare, &layout.options()),
        Command::Expand {
            file,
            strict,
            json,
            load,
            layout,
        } => {
            let policy = if *strict {
                MacroPolicy::Fail
            } else {
                MacroPolicy::Warn
            };
            let options = load_options(load, LoadOptions::expanded(policy));
            let file = load_file(file, &options, &etc)?;
            if *json {
                print_json(&json::dict_to_json(file.data()))?;
            } else {
                print!("{}", file.render(&Banner::now(), &layout.options()));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Get {
            file,
            path,
            expand,
            json,
            load,
        } => {
            let base = if *expand {
                LoadOptions::expanded(MacroPolicy::Warn)
            } else {
                LoadOptions::default()
            };
            let file = load_file(file, &load_options(load, base), &etc)?;
            let value = lookup(&file, path)?;
            if *json {
                print_json(&json::value_to_json(value))?;
            } else {
                print!("{}", show(value));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Set {
            file,
            key,
            value,
            force,
        } => {
            run_set(file, key, value, *force, &etc)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { files, expand } => {
            let failed = run_check(files, *expand, &etc);
            if failed > 0 {
                eprintln!("{failed} of {} files failed", files.len());
                Ok(ExitCode::from(EXIT_FAILURE))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

fn etc_dirs(extra: &[PathBuf]) -> EtcDirs {
    let mut dirs = extra.to_vec();
    dirs.extend(EtcDirs::from_env().dirs().iter().cloned());
    EtcDirs::new(dirs)
}

fn load_options(args: &LoadArgs, base: LoadOptions) -> LoadOptions {
    match args.size_limit {
        Some(limit) => base.size_limit(limit),
        None => base,
    }
}

fn load_file(path: &Path, options: &LoadOptions, etc: &EtcDirs) -> Result<DictFile, CliError> {
    let file = DictFile::load_with(path, options, &OsFileSystem, etc)?;
    if file.status() == LoadStatus::HeaderOnly {
        return Err(CliError::Usage(format!(
            "{} is larger than the size limit; only its header was read\n\
             hint: raise it with --size-limit",
            path.display()
        )));
    }
    Ok(file)
}

fn run_fmt(
    file: &str,
    in_place: bool,
    output: Option<&Path>,
    bare: bool,
    options: &FormatOptions,
) -> Result<ExitCode, CliError> {
    if in_place && file == "-" {
        return Err(CliError::Usage("--in-place cannot be used with stdin".into()));
    }
    let source = read_input(file)?;
    let name = if file == "-" { "<stdin>" } else { file };
    let doc = parse(&source, name).map_err(|error| CliError::Syntax {
        error,
        source: source.clone(),
    })?;

    let text = if bare {
        render(&doc, options)
    } else {
        render_file(&doc, None, &Banner::now(), options)
    };
    if in_place {
        debug!("rewriting {file}");
        std::fs::write(file, text)?;
    } else if let Some(out) = output {
        std::fs::write(out, text)?;
    } else {
        print!("{text}");
    }
    Ok(ExitCode::SUCCESS)
}

fn run_set(
    path: &Path,
    key: &str,
    value: &str,
    force: bool,
    etc: &EtcDirs,
) -> Result<(), CliError> {
    let mut file = load_file(path, &LoadOptions::default(), etc)?;
    let value = parse_value(value)?;
    let known = file.schema().is_some_and(|s| s.spec(key).is_ok());
    if force || !known {
        file.insert(key, value);
    } else {
        file.set_field(key, value)
            .map_err(|e| CliError::Usage(e.to_string()))?;
    }
    file.write()?;
    Ok(())
}

/// Parse a value given on the command line.
fn parse_value(text: &str) -> Result<Value, CliError> {
    let source = format!("value {text};");
    let mut doc = parse(&source, "<value>").map_err(|error| CliError::Syntax { error, source })?;
    doc.pop("value")
        .ok_or_else(|| CliError::Usage(format!("not a single value: {text}")))
}

fn lookup<'a>(file: &'a DictFile, path: &str) -> Result<&'a Value, CliError> {
    if let Some(rest) = path.strip_prefix("FoamFile")
        && (rest.is_empty() || rest.starts_with(['/', '.']))
        && let Some(header) = file.header()
    {
        let rest = rest.trim_start_matches(['/', '.']);
        if rest.is_empty() {
            return Err(CliError::Usage(
                "FoamFile is not a value; ask for one of its entries".into(),
            ));
        }
        return header
            .get_path(rest)
            .ok_or_else(|| CliError::NotFound(path.to_string()));
    }
    file.data()
        .get_path(path)
        .ok_or_else(|| CliError::NotFound(path.to_string()))
}

/// A value as `foamdict get` prints it: dictionaries in block layout,
/// anything else on one line.
fn show(value: &Value) -> String {
    match value {
        Value::Dict(dict) => render(dict, &FormatOptions::default()),
        other => format!("{}\n", inline(other)),
    }
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    println!("{text}");
    Ok(())
}

/// Batch check: every file is tried, failures are reported one per line.
/// Returns the number of failed files.
fn run_check(files: &[PathBuf], expand: bool, etc: &EtcDirs) -> usize {
    let options = if expand {
        LoadOptions::expanded(MacroPolicy::Fail)
    } else {
        LoadOptions::default()
    }
    .size_limit(u64::MAX);

    let mut failed = 0usize;
    for path in files {
        match DictFile::load_with(path, &options, &OsFileSystem, etc) {
            Ok(_) => debug!("{}: ok", path.display()),
            Err(e) => {
                failed += 1;
                match parse_error(&e) {
                    Some(pe) => eprintln!("{pe}"),
                    None => eprintln!("{}: {e}", path.display()),
                }
            }
        }
    }
    failed
}

/// The parse error behind a load failure, if that is what it was.
fn parse_error(e: &CaseError) -> Option<&ParseError> {
    match e {
        CaseError::Parse(pe) | CaseError::Include(IncludeError::Parse(pe)) => Some(pe),
        _ => None,
    }
}

fn read_input(file: &str) -> io::Result<String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(file)
    }
}

/// Print an error, with a source excerpt for syntax errors.
fn report(e: &CliError) {
    let syntax = match e {
        CliError::Syntax { error, source } => Some((error, source.clone())),
        CliError::Case(case) => parse_error(case)
            .and_then(|pe| Some((pe, std::fs::read_to_string(&pe.source_name).ok()?))),
        _ => None,
    };
    match syntax {
        Some((error, source)) => error.write_report(&source, io::stderr()),
        None => eprintln!("error: {e}"),
    }
}

#[derive(Debug)]
enum CliError {
    Io(io::Error),
    Syntax { error: ParseError, source: String },
    Case(CaseError),
    NotFound(String),
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "{e}"),
            CliError::Syntax { error, .. } => write!(f, "{error}"),
            CliError::Case(e) => write!(f, "{e}"),
            CliError::NotFound(path) => write!(f, "no entry at {path}"),
            CliError::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<CaseError> for CliError {
    fn from(e: CaseError) -> Self {
        CliError::Case(e)
    }
}
