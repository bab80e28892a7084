mod fixture_runner;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use blocks::sink::Sinks;
use blocks::{BlockScanner, BlocksError, PROGRAM_NAME, ScanConfig, ScanSummary, TRACE_TARGET};

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

/// Flags accepted before the subcommand.
const GLOBAL_FLAGS: &[&str] = &["--no-color"];

/// Arguments that must not get an implicit `run` in front of them.
const TOP_LEVEL_FLAGS: &[&str] = &["-h", "--help", "-v", "--version"];

/// Name shown for standard input in headers and diagnostics.
const STDIN_LABEL: &str = "-";

#[derive(Parser)]
#[command(
    name = "blocks",
    version,
    disable_version_flag = true,
    about = "grep for nested data"
)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: (),

    /// Disable colored fixture results
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the blocks found in files (or standard input)
    Run(RunArgs),

    /// Run .blocks-test fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
#[command(after_help = "\
When the name is matched, the input isn't advanced and the search for the \
block start begins at the start of the name. This allows matching all blocks \
in a file when the name is the same as the opening symbol, and LISP-like \
syntax where the block start comes before the name, e.g.:
    blocks -n '\\(define' -s '\\(' -e '\\)'
Input is advanced when either block start or block end are matched and \
searching resumes one character after the start of the match.")]
struct RunArgs {
    /// Files to scan; standard input when none are given
    files: Vec<String>,

    /// Regex for the name of the block
    #[arg(short = 'n', long, default_value = blocks::config::DEFAULT_BLOCK_NAME)]
    block_name: String,

    /// Regex for the opening symbol
    #[arg(short = 's', long, default_value = blocks::config::DEFAULT_BLOCK_START)]
    block_start: String,

    /// Regex for the closing symbol
    #[arg(short = 'e', long, default_value = blocks::config::DEFAULT_BLOCK_END)]
    block_end: String,

    /// Regex for a comment; nothing after it on a line is looked at
    #[arg(short = 'C', long)]
    comment: Option<String>,

    /// Print only blocks with a line matching this regex
    #[arg(short = 'm', long)]
    regex_match: Option<String>,

    /// Don't print blocks with a line matching this regex
    #[arg(short = 'M', long)]
    regex_no_match: Option<String>,

    /// Print this string before each block
    #[arg(short = 'S', long)]
    mark_start: Option<String>,

    /// Print this string after each block
    #[arg(short = 'E', long)]
    mark_end: Option<String>,

    /// Print only the first <N> blocks
    #[arg(short = 'c', long, value_name = "N")]
    block_count: Option<usize>,

    /// Don't print the first <N> blocks
    #[arg(short = 'k', long, value_name = "N", default_value_t = 0)]
    skip: usize,

    /// Quit after the first nesting error
    #[arg(short = 'F', long)]
    fatal_error: bool,

    /// Prepend line numbers
    #[arg(short = 'l', long)]
    line_numbers: bool,

    /// Print the name of each file before its first block
    #[arg(short = 'p', long)]
    print_file_names: bool,

    /// Match name, start, end and comment regardless of case
    #[arg(short = 'i', long)]
    case_insensitive: bool,

    /// Print only the body of each block, without the lines up to the block
    /// start and the line of the block end
    #[arg(short = 'I', long)]
    ignore_top: bool,

    /// Suppress normal output
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Trace the scanner's phases on standard error
    #[arg(short = 'D', long)]
    debug_trace: bool,
}

impl RunArgs {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            block_name: self.block_name.clone(),
            block_start: self.block_start.clone(),
            block_end: self.block_end.clone(),
            comment: self.comment.clone(),
            regex_match: self.regex_match.clone(),
            regex_no_match: self.regex_no_match.clone(),
            mark_start: self.mark_start.clone(),
            mark_end: self.mark_end.clone(),
            block_count: self.block_count,
            skip: self.skip,
            fatal_error: self.fatal_error,
            line_numbers: self.line_numbers,
            print_file_names: self.print_file_names,
            case_insensitive: self.case_insensitive,
            ignore_top: self.ignore_top,
            quiet: self.quiet,
        }
    }
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .blocks-test file or a directory containing them
    path: String,

    /// Run only fixtures in these groups (subfolder names). Repeatable.
    #[arg(short, long)]
    group: Vec<String>,

    /// List available groups and exit
    #[arg(long)]
    list_groups: bool,
}

/// `blocks -n main file.c` means `blocks run -n main file.c`. Global flags
/// in front of the subcommand are skipped over.
fn with_implicit_run(mut args: Vec<String>) -> Vec<String> {
    let first = args
        .iter()
        .skip(1)
        .position(|a| !GLOBAL_FLAGS.contains(&a.as_str()))
        .map(|i| i + 1);
    match first {
        Some(pos) => {
            let arg = args[pos].as_str();
            if !SUBCOMMANDS.contains(&arg) && !TOP_LEVEL_FLAGS.contains(&arg) {
                args.insert(pos, "run".to_string());
            }
        }
        None => args.push("run".to_string()),
    }
    args
}

fn main() {
    let args = with_implicit_run(std::env::args().collect());
    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Run(run_args) => process::exit(do_run(run_args)),
        Command::Test(test_args) => {
            init_logging(false);
            let path = Path::new(&test_args.path);
            if test_args.list_groups {
                fixture_runner::list_groups(path);
                return;
            }
            let code = fixture_runner::run_fixtures(path, cli.no_color, &test_args.group);
            process::exit(code);
        }
    }
}

fn init_logging(debug_trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug_trace {
        builder.filter_module(TRACE_TARGET, LevelFilter::Trace);
    }
    builder
        .format(|buf, record| writeln!(buf, "{} {}", PROGRAM_NAME, record.args()))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Exit code: 1 after a fatal nesting error, else 0 if any block matched.
fn exit_code(summary: ScanSummary) -> i32 {
    if summary.fatal {
        1
    } else {
        i32::from(!summary.matched)
    }
}

fn do_run(args: RunArgs) -> i32 {
    init_logging(args.debug_trace);

    let (patterns, options) = match args.scan_config().compile() {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("{}: error: {}", PROGRAM_NAME, e);
            return 1;
        }
    };

    let input: Box<dyn BufRead> = if args.files.is_empty() {
        Box::new(io::stdin().lock())
    } else {
        Box::new(io::empty())
    };
    let sinks = Sinks::new(io::stdout().lock(), io::stderr().lock());
    let mut scanner = BlockScanner::new(input, sinks, &patterns, options);

    let result = if args.files.is_empty() {
        log::debug!("scanning standard input");
        scanner.scan(Some(STDIN_LABEL))
    } else {
        scan_files(&mut scanner, &args.files)
    };

    match result {
        Ok(summary) => exit_code(summary),
        Err(e) => {
            eprintln!("{}: error: {}", PROGRAM_NAME, e);
            1
        }
    }
}

/// Scan each file in turn. Unreadable files are reported on the scanner's
/// error output and skipped; a fatal nesting error ends the run.
fn scan_files<W: Write, E: Write>(
    scanner: &mut BlockScanner<'_, Box<dyn BufRead>, W, E>,
    files: &[String],
) -> Result<ScanSummary, BlocksError> {
    let mut total = ScanSummary::default();
    for path in files {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                let sinks = scanner.sinks_mut();
                sinks.print_error(&format!("{} error: file {}: {}", PROGRAM_NAME, path, e))?;
                sinks.flush()?;
                continue;
            }
        };

        log::debug!("scanning {}", path);
        scanner.reset(Box::new(BufReader::new(file)));
        let summary = scanner.scan(Some(path))?;
        total.matched |= summary.matched;
        if summary.fatal {
            total.fatal = true;
            break;
        }
    }
    Ok(total)
}
