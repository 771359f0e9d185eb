use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;

use wayfinder::diagnose::Severity;
use wayfinder::report::Format;
use wayfinder::{Defaults, Registry};

#[derive(Parser)]
#[command(
    name = "wayfinder",
    about = "Self-healing path registry for the ProjectSuite tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the suite directory tree and persist a first snapshot
    Init,
    /// List every registered key with its resolved location
    Paths,
    /// Resolve a single key
    Get { key: String },
    /// Register a path and persist the snapshot
    Set { key: String, path: PathBuf },
    /// Check every registered path and report problems
    Doctor,
    /// Apply the safe fixes from the diagnosis
    Repair,
    /// Write the registry snapshot for the other suite tools
    Export {
        /// Target file (defaults to the user data dir)
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Load a snapshot produced by another suite tool
    Import { file: PathBuf },
    /// Pull path settings out of pre-rename config files
    Migrate,
    /// Render the diagnosis as text, html or json
    Report {
        #[arg(long, default_value = "text")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let (registry, notes) = Registry::bootstrap_with_notes(Defaults::detect());

    let result = match cli.command {
        Some(Commands::Init) => run_init(&registry, &notes),
        Some(Commands::Paths) => run_paths(&registry),
        Some(Commands::Get { key }) => run_get(&registry, &key),
        Some(Commands::Set { key, path }) => run_set(&registry, &key, &path),
        Some(Commands::Doctor) | None => run_doctor(&registry, &notes),
        Some(Commands::Repair) => run_repair(&registry),
        Some(Commands::Export { to }) => run_export(&registry, to.as_deref()),
        Some(Commands::Import { file }) => run_import(&registry, &file),
        Some(Commands::Migrate) => run_migrate(&registry),
        Some(Commands::Report { format, out }) => run_report(&registry, &format, out.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("\x1b[31m✗\x1b[0m {e}");
        std::process::exit(1);
    }
}

enum Status {
    Done,
    Kept,
    Error,
}

fn color_enabled() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

fn print_status(status: Status, msg: &str) {
    if color_enabled() {
        match status {
            Status::Done => println!("  {} {msg}", "✓".green()),
            Status::Kept => println!("  {} {msg}", "~".yellow()),
            Status::Error => println!("  {} {msg}", "✗".red()),
        }
    } else {
        match status {
            Status::Done => println!("  ✓ {msg}"),
            Status::Kept => println!("  ~ {msg}"),
            Status::Error => println!("  ✗ {msg}"),
        }
    }
}

fn print_notes(notes: &[String]) {
    for note in notes {
        print_status(Status::Kept, note);
    }
    if !notes.is_empty() {
        println!();
    }
}

const TREE_KEYS: &[&str] = &[
    "USER_DATA_DIR",
    "DATA_DIR",
    "LOGS_DIR",
    "EXPORTS_DIR",
    "TEMPLATES_DIR",
    "PROJECTS_DIR",
    "MASTER_DIR",
    "TEMP_DIR",
    "BACKUP_DIR",
    "DB_PATH",
];

fn run_init(registry: &Registry, notes: &[String]) -> Result<(), String> {
    println!(
        "\n{} — preparing the suite directory tree\n",
        "wayfinder".bold()
    );
    print_notes(notes);

    for key in TREE_KEYS {
        if registry.ensure_directory(key) {
            print_status(Status::Done, &format!("{key} ready"));
        } else {
            print_status(Status::Error, &format!("could not prepare {key}"));
        }
    }

    let marker = registry.defaults().init_marker();
    if marker.exists() {
        print_status(Status::Kept, "first-run marker already present");
    } else {
        match fs::write(&marker, format!("{}\n", wayfinder::clock::now_iso())) {
            Ok(()) => print_status(Status::Done, "first-run marker written"),
            Err(e) => print_status(Status::Error, &format!("could not write marker: {e}")),
        }
    }

    let written = registry.export_config(None)?;
    print_status(
        Status::Done,
        &format!("snapshot written to {}", written.display()),
    );

    println!(
        "\n{} The suite tools share this registry through the snapshot\n\
         \x20 and the PROJSUITE_* environment variables.\n",
        "Setup complete.".bold()
    );
    Ok(())
}

fn run_paths(registry: &Registry) -> Result<(), String> {
    println!("\n{} — registered paths\n", "wayfinder".bold());
    for entry in registry.entries() {
        let exists = entry.path.exists();
        let marker = if color_enabled() {
            if exists {
                "✓".green().to_string()
            } else {
                "✗".red().to_string()
            }
        } else if exists {
            "✓".to_string()
        } else {
            "✗".to_string()
        };
        println!(
            "  {marker} {:<20} {}  [{}]",
            entry.key,
            entry.path.display(),
            entry.origin
        );
    }
    println!();
    Ok(())
}

fn run_get(registry: &Registry, key: &str) -> Result<(), String> {
    match registry.get_path(key) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err(format!("No path registered for {}", key.to_uppercase())),
    }
}

fn run_set(registry: &Registry, key: &str, path: &Path) -> Result<(), String> {
    registry.register_path(key, path);
    let written = registry.export_config(None)?;
    print_status(
        Status::Done,
        &format!("{} -> {}", key.to_uppercase(), path.display()),
    );
    print_status(
        Status::Done,
        &format!("snapshot updated at {}", written.display()),
    );
    Ok(())
}

fn run_doctor(registry: &Registry, notes: &[String]) -> Result<(), String> {
    let report = registry.diagnose();

    println!("\n{} — path health\n", "wayfinder".bold());
    print_notes(notes);
    println!("  {} paths registered", report.stats.total);

    if report.is_healthy() {
        println!();
        print_status(Status::Done, "all paths are healthy");
        println!();
        return Ok(());
    }

    println!();
    for issue in &report.issues {
        let status = match issue.severity {
            Severity::High => Status::Error,
            Severity::Medium => Status::Kept,
        };
        print_status(
            status,
            &format!("{:<18} {} ({})", issue.key, issue.kind, issue.path),
        );
        println!("      fix: {}", issue.suggested_fix);
    }

    println!(
        "\n  {} high, {} medium — run `wayfinder repair` for the fixable ones\n",
        report.count_by_severity(Severity::High),
        report.count_by_severity(Severity::Medium)
    );
    Ok(())
}

fn run_repair(registry: &Registry) -> Result<(), String> {
    let outcome = registry.auto_repair(None);

    println!("\n{} — auto repair\n", "wayfinder".bold());
    if outcome.repaired.is_empty() && outcome.failed.is_empty() {
        print_status(Status::Done, "nothing to repair");
        println!();
        return Ok(());
    }
    for repaired in &outcome.repaired {
        print_status(
            Status::Done,
            &format!("{}: {}", repaired.key, repaired.action),
        );
    }
    for failed in &outcome.failed {
        print_status(Status::Error, &format!("{}: {}", failed.key, failed.reason));
    }
    println!(
        "\n  {} repaired, {} need a manual fix\n",
        outcome.repaired.len(),
        outcome.failed.len()
    );
    Ok(())
}

fn run_export(registry: &Registry, to: Option<&Path>) -> Result<(), String> {
    let written = registry.export_config(to)?;
    print_status(
        Status::Done,
        &format!("snapshot written to {}", written.display()),
    );
    Ok(())
}

fn run_import(registry: &Registry, file: &Path) -> Result<(), String> {
    let applied = registry.import_config(file)?;
    print_status(
        Status::Done,
        &format!("{applied} paths imported from {}", file.display()),
    );
    let written = registry.export_config(None)?;
    print_status(
        Status::Done,
        &format!("snapshot updated at {}", written.display()),
    );
    Ok(())
}

fn run_migrate(registry: &Registry) -> Result<(), String> {
    let outcome = registry.migrate_legacy();

    println!("\n{} — legacy migration\n", "wayfinder".bold());
    if outcome.is_noop() {
        print_status(Status::Kept, "no legacy config files found");
        println!();
        return Ok(());
    }
    for migrated in &outcome.migrated {
        print_status(
            Status::Done,
            &format!("{} = {}", migrated.key, migrated.value),
        );
    }
    for key in &outcome.unmapped {
        print_status(Status::Error, &format!("unmapped key: {key}"));
    }
    for line in &outcome.skipped {
        print_status(Status::Kept, &format!("skipped {line}"));
    }
    for backup in &outcome.renamed {
        print_status(
            Status::Done,
            &format!("legacy file preserved as {}", backup.display()),
        );
    }
    if !outcome.migrated.is_empty() {
        let written = registry.export_config(None)?;
        print_status(
            Status::Done,
            &format!("snapshot updated at {}", written.display()),
        );
    }
    println!();
    Ok(())
}

fn run_report(registry: &Registry, format: &str, out: Option<&Path>) -> Result<(), String> {
    let format = Format::parse(format)?;
    let rendered = registry.create_report(format);
    match out {
        Some(path) => {
            fs::write(path, &rendered)
                .map_err(|e| format!("Failed to write report {}: {e}", path.display()))?;
            print_status(
                Status::Done,
                &format!("report written to {}", path.display()),
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
