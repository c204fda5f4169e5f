use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use yui_installer::process::SystemRunner;
use yui_installer::prompt::Prompter;
use yui_installer::recipe::{self, Database, Flags, StatusEntry, StepStatus};
use yui_installer::registry::{self, installer_supports};

#[derive(Parser)]
#[command(name = "yui")]
#[command(about = "Opinionated Laravel project installer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and configure a new Laravel project
    New(NewArgs),

    /// Report which patches a project already carries
    Status {
        /// Project root to inspect
        #[arg(short, long)]
        project: PathBuf,
    },

    /// List the UI providers this build can install
    Providers {
        /// Registry file (otherwise env var, user config, then built-in)
        #[arg(long)]
        providers: Option<PathBuf>,
    },
}

#[derive(Args)]
struct NewArgs {
    /// Project directory name (prompted for when omitted)
    name: Option<String>,

    /// Database kind
    #[arg(long, value_parser = ["sqlite", "mysql"])]
    database: Option<String>,

    /// UI provider name from the registry
    #[arg(long)]
    ui: Option<String>,

    /// Install Laravel Breeze (react stack, pest tests)
    #[arg(long)]
    breeze: bool,

    /// Install Orion and its api scaffolding
    #[arg(long)]
    orion: bool,

    /// Install Spatie Permission and register its middleware
    #[arg(long)]
    permission: bool,

    /// Install the extra npm packages (state, icons, query)
    #[arg(long)]
    extras: bool,

    /// Directory with prepared resources/, routes/ and images/ to copy in
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Registry file (otherwise env var, user config, then built-in)
    #[arg(long)]
    providers: Option<PathBuf>,

    /// Take the default answer for every question not covered by a flag
    #[arg(long)]
    no_interaction: bool,

    /// Dry run - print the step plan without executing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Show unified diff of every applied patch
    #[arg(long)]
    diff: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::New(args) => cmd_new(args),

        Commands::Status { project } => cmd_status(project),

        Commands::Providers { providers } => cmd_providers(providers),
    }
}

fn cmd_new(args: NewArgs) -> Result<()> {
    // 1. Load the provider registry
    let (registry, source) = registry::load(args.providers.as_deref())
        .context("could not load the provider registry")?;

    println!("Registry: {}", source);

    // 2. Collect every option up front; flags pre-answer their questions
    let flags = Flags {
        name: args.name,
        database: args.database.as_deref().and_then(Database::parse),
        ui: args.ui,
        breeze: args.breeze,
        orion: args.orion,
        permission: args.permission,
        extras: args.extras,
        assets: args.assets,
        no_interaction: args.no_interaction,
    };
    let mut prompter = Prompter::stdio();
    let options = recipe::gather(flags, &registry, &mut prompter)?;

    // 3. Build the plan rooted in the invoking directory
    let base_dir = env::current_dir().context("could not determine the working directory")?;
    let plan = recipe::plan(&options, &base_dir);

    if args.dry_run {
        recipe::render_plan(&plan);
        return Ok(());
    }

    // 4. Run it; individual failures warn and the run continues
    let mut runner = SystemRunner;
    let summary = recipe::execute(&plan, &mut runner, args.diff);
    summary.print();

    Ok(())
}

fn cmd_status(project: PathBuf) -> Result<()> {
    let report = recipe::status_report(&project);

    let mut applied: Vec<StatusEntry> = Vec::new();
    let mut pending: Vec<StatusEntry> = Vec::new();
    let mut unknown: Vec<StatusEntry> = Vec::new();
    for entry in report {
        match entry.status {
            StepStatus::Applied => applied.push(entry),
            StepStatus::Pending => pending.push(entry),
            StepStatus::Unknown(_) => unknown.push(entry),
        }
    }

    println!("Project: {}", project.display());
    println!();

    // Grouped by status
    if !applied.is_empty() {
        println!(
            "{} {} ({} rules)",
            "✓".green(),
            "APPLIED".green().bold(),
            applied.len()
        );
        for entry in &applied {
            println!("  - {} ({})", entry.label, entry.target.dimmed());
        }
        println!();
    }

    if !pending.is_empty() {
        println!(
            "{} {} ({} rules)",
            "⊙".yellow(),
            "PENDING".yellow().bold(),
            pending.len()
        );
        for entry in &pending {
            println!("  - {} ({})", entry.label, entry.target.dimmed());
        }
        println!();
    }

    if !unknown.is_empty() {
        println!(
            "{} {} ({} rules)",
            "⚠".yellow(),
            "UNKNOWN".yellow().bold(),
            unknown.len()
        );
        for entry in &unknown {
            if let StepStatus::Unknown(detail) = &entry.status {
                println!("  - {} ({})", entry.label, detail.dimmed());
            }
        }
    }

    Ok(())
}

fn cmd_providers(explicit: Option<PathBuf>) -> Result<()> {
    let (registry, source) =
        registry::load(explicit.as_deref()).context("could not load the provider registry")?;

    println!("Registry: {}", source);
    println!();

    for provider in &registry.providers {
        let usable = match installer_supports(provider.requires.as_deref()) {
            Ok(true) => "usable".green(),
            Ok(false) => format!(
                "needs installer {}",
                provider.requires.as_deref().unwrap_or_default()
            )
            .yellow(),
            Err(e) => e.to_string().red(),
        };

        let default_marker = if provider.default { " (default)" } else { "" };
        println!("{}{}", provider.name.bold(), default_marker);
        println!("  package: {}", provider.package);
        if !provider.npm.is_empty() {
            println!("  npm: {}", provider.npm.join(", "));
        }
        if let Some(preset) = &provider.tailwind {
            println!("  tailwind: {}", preset);
        }
        println!("  status: {}", usable);
        println!();
    }

    Ok(())
}
