use crate::types::VerifyPolicy;
use clap::Parser;
use std::path::PathBuf;

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    if let Some(tag) = option_env!("RYTON_INSTALLER_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("RYTON_INSTALLER_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("RYTON_INSTALLER_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "ryton-installer")]
#[command(about = "Ryton Installer")]
#[command(version = get_version())]
pub struct Cli {
    /// Installation type: system or user
    #[arg(long = "type", default_value = "user", value_name = "TYPE")]
    pub install_type: String,

    /// Directory holding the ryton, rytonpm and rytonbuilder source trees
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub source: PathBuf,

    /// What to do if the installed files fail verification: rollback or report
    #[arg(long, value_name = "POLICY")]
    pub on_verify_failure: Option<VerifyPolicy>,

    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long)]
    pub quiet: bool,
}
