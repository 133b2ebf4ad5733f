use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use pyscramble::config::{load_for_project, ScanSettings};
use pyscramble::driver::{FileState, ObfuscateOptions, Obfuscator, RunReport};
use pyscramble::extract::{extract_bindings, LineIndex};
use pyscramble::names::NameAllocator;
use pyscramble::rename::{LexicalRenamer, Project};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "pyscramble")]
#[command(
    about = "Deterministic identifier obfuscation for Python source trees",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Log every step, including unsupported syntax
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Obfuscate every Python file under a directory, in place
    Run(RunArgs),

    /// Show the bindings extracted from one file
    Symbols {
        /// Python source file
        file: PathBuf,
    },

    /// Print the generated name sequence
    Names {
        /// How many names to print
        #[arg(short = 'n', long, default_value_t = 30)]
        count: usize,

        /// Do not skip Python keywords and builtins
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Project root
    root: PathBuf,

    /// Config file (defaults to <ROOT>/pyscramble.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Work on a temporary copy and leave the project untouched
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long)]
    diff: bool,

    /// Write the run report as JSON
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Keep docstrings
    #[arg(long)]
    no_docstrings: bool,

    /// Keep module file names
    #[arg(long)]
    no_modules: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Symbols { file } => cmd_symbols(&file),
        Commands::Names { count, raw } => cmd_names(count, raw),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr);
    if std::env::var_os("RUST_LOG").is_some() {
        builder
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    } else {
        builder.with_max_level(level).init();
    }
}

fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("project root {} not found", args.root.display()))?;
    let config = load_for_project(&root, args.config.as_deref())?;

    let mut options = ObfuscateOptions::from(&config.rename);
    if args.no_docstrings {
        options.docstrings = false;
    }
    if args.no_modules {
        options.modules = false;
    }

    // Dry runs obfuscate a scratch copy; it lives until the diff is shown.
    let scratch = if args.dry_run {
        let dir = tempfile::tempdir()?;
        copy_tree(&root, dir.path(), &config.scan)?;
        Some(dir)
    } else {
        None
    };
    let target = scratch.as_ref().map_or(root.as_path(), |dir| dir.path());

    let mut project = Project::open(target, &config.scan)?;
    let mut before = Vec::new();
    if args.diff {
        for file in project.files() {
            before.push((file.clone(), project.read(file)?));
        }
    }

    println!("Project: {}", root.display());
    if args.dry_run {
        println!("{}", "[DRY RUN - working on a temporary copy]".cyan());
    }
    println!();

    let mut names = NameAllocator::for_python();
    names.reserve(config.rename.preserve.iter().cloned());
    let renamer = LexicalRenamer::new(config.rename.preserve.iter().cloned());
    let report = Obfuscator::new(&mut project, &mut names, &renamer, options).run()?;

    for file in &report.files {
        print_file(file);
    }

    if args.diff {
        for (file, original) in &before {
            let current = report
                .files
                .iter()
                .find(|f| &f.path == file)
                .and_then(|f| f.renamed_to.clone())
                .unwrap_or_else(|| file.clone());
            let modified = fs::read_to_string(project.resource(&current)).unwrap_or_default();
            if original != &modified {
                display_diff(file, &current, original, &modified);
            }
        }
    }

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    print_summary(&report);
    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_symbols(file: &Path) -> Result<ExitCode> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let extraction = extract_bindings(&source)
        .with_context(|| format!("failed to extract bindings from {}", file.display()))?;

    let index = LineIndex::new(&source);
    println!("{}", format!("Bindings in {}:", file.display()).bold());
    for binding in &extraction.bindings {
        let (line, column) = index.position(binding.offset);
        println!(
            "  {:>6}  {:>5}:{:<3}  {}",
            binding.offset,
            line,
            column,
            binding.name.green()
        );
    }

    if !extraction.unsupported.is_empty() {
        println!();
        println!("{}", "Not inspected:".bold());
        for node in &extraction.unsupported {
            println!("  {} line {}", node.kind.yellow(), node.line);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_names(count: usize, raw: bool) -> Result<ExitCode> {
    let mut names = if raw {
        NameAllocator::new()
    } else {
        NameAllocator::for_python()
    };
    for _ in 0..count {
        println!("{}", names.next());
    }
    Ok(ExitCode::SUCCESS)
}

/// Copy `from` into `to`, skipping excluded directories.
fn copy_tree(from: &Path, to: &Path, scan: &ScanSettings) -> Result<()> {
    let walker = WalkDir::new(from).into_iter().filter_entry(|e| {
        e.depth() == 0
            || !e.file_type().is_dir()
            || !scan.exclude.iter().any(|d| e.file_name() == d.as_str())
    });

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from)?;
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

fn print_file(file: &pyscramble::driver::FileReport) {
    match file.state {
        FileState::Aborted => {
            eprintln!(
                "{} {}: {}",
                "✗".red(),
                file.path.display(),
                file.error.as_deref().unwrap_or("aborted")
            );
        }
        _ => {
            let target = match &file.renamed_to {
                Some(to) => format!(" -> {}", to.display()),
                None => String::new(),
            };
            println!(
                "{} {}{}: {} renamed, {} skipped, {} docstrings removed",
                "✓".green(),
                file.path.display(),
                target,
                file.renames.len(),
                file.skips.len(),
                file.docstrings_removed
            );
        }
    }
}

/// Show unified diff between original and modified content
fn display_diff(original_path: &Path, current_path: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", original_path.display()).dimmed()
    );
    println!(
        "{}",
        format!("+++ {} (obfuscated)", current_path.display()).dimmed()
    );

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} files",
        format!("{}", report.files.len() - report.aborted()).green()
    );
    println!("  {} renamed", format!("{}", report.renames()).green());
    println!("  {} skipped", format!("{}", report.skips()).yellow());
    println!("  {} aborted", format!("{}", report.aborted()).red());
}
