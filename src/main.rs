mod backup;
mod check;
mod cli;
mod config;
mod deploy;
mod error;
mod install;
mod paths;
mod platform;
mod rollback;
mod types;
mod verify;


use anyhow::Result;
use check::SystemChecker;
use clap::Parser;
use cli::Cli;
use config::load_settings;
use console::style;
use error::InstallFailure;
use install::{InstallReport, Installer};
use paths::PathResolver;
use platform::HostSystem;
use types::ComponentDescriptor;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli) {
        eprintln!("Could not set up logging: {}", e);
    }

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", style("Installation failed:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let mut settings = load_settings()?;
    if let Some(policy) = cli.on_verify_failure {
        settings.verify_policy = policy;
    }
    tracing::debug!("Installer settings: {:?}", settings);

    let target = PathResolver::from_env().resolve_token(&cli.install_type)?;

    if !cli.quiet {
        println!("Starting Ryton installation ({})...", target.kind);
    }

    let probe = HostSystem::new();
    let checker = SystemChecker::new(&probe, settings.required_libraries, settings.min_free_space);
    let mut installer = Installer::new(
        checker,
        ComponentDescriptor::standard_set(&cli.source),
        settings.verify_policy,
    );
    if !cli.quiet {
        installer = installer.with_progress();
    }

    match installer.run(&target) {
        Ok(report) => {
            print_success(&report, cli.quiet);
            Ok(true)
        }
        Err(failure) => {
            print_failure(&failure);
            Ok(false)
        }
    }
}

fn setup_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.quiet {
        "error"
    } else if cli.verbose == 0 {
        "warn"
    } else if cli.verbose == 1 {
        "info"
    } else {
        "debug"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

fn print_success(report: &InstallReport, quiet: bool) {
    if quiet {
        return;
    }
    println!(
        "{} Ryton installed to {}",
        style("✓").green().bold(),
        report.target.library_dir.display()
    );
    for link in &report.symlinks {
        println!("  {} -> {}", link.link_path.display(), link.target_path.display());
    }
    if let Some(backup) = &report.backup {
        println!("  Previous install kept at {}", backup.backup_path.display());
    }
}

fn print_failure(failure: &InstallFailure) {
    eprintln!("{} {}", style("✗").red().bold(), failure);

    let Some(rollback) = &failure.rollback else {
        return;
    };
    if let Some(restored) = &rollback.restored_from {
        eprintln!("  Previous install restored from {}", restored.display());
    } else if rollback.removed_partial {
        eprintln!("  Partial install removed");
    }
    for link in &rollback.removed_links {
        eprintln!("  Removed link {}", link.display());
    }
    for link in &rollback.restored_links {
        eprintln!("  Restored link {}", link.display());
    }
    if !rollback.is_clean() {
        for problem in &rollback.failures {
            eprintln!("  {} {}", style("Rollback incomplete:").yellow(), problem);
        }
    }
}
