use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use unhacs::commands::{self, AddOptions, Config, Settings};
use unhacs::package::PackageKind;

/// unhacs - a command line alternative to the Home Assistant Community Store
///
/// Installs integrations, frontend plugins, themes and forked core components
/// straight from their GitHub repositories into a Home Assistant configuration
/// directory, and keeps a lock file of what was installed.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for avoiding rate limits.
///
/// Examples:
///   unhacs add https://github.com/simbaja/ha_gehome
///   unhacs add --plugin https://github.com/kalkih/mini-media-player --version v1.16.8
///   unhacs upgrade
#[derive(Parser, Debug)]
#[command(author, version = env!("UNHACS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Home Assistant configuration directory (defaults to the current directory)
    #[arg(
        long = "config",
        short = 'c',
        env = "UNHACS_CONFIG",
        value_name = "PATH",
        global = true
    )]
    pub config_root: Option<PathBuf>,

    /// Lock file listing installed packages (defaults to <config>/unhacs.yaml)
    #[arg(
        long = "package-file",
        short = 'p',
        env = "UNHACS_PACKAGE_FILE",
        value_name = "PATH",
        global = true
    )]
    pub package_file: Option<PathBuf>,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Raw content URL (defaults to https://raw.githubusercontent.com)
    #[arg(long = "raw-url", value_name = "URL", global = true)]
    pub raw_url: Option<String>,

    /// GitHub web URL used for archives and release assets (defaults to https://github.com)
    #[arg(long = "web-url", value_name = "URL", global = true)]
    pub web_url: Option<String>,

    /// Show debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Add a package, or every package of a lock file
    Add(AddArgs),

    /// List installed packages
    List(ListArgs),

    /// Remove installed packages
    Remove(RemoveArgs),

    /// Upgrade installed packages to their latest release
    Upgrade(UpgradeArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Repository URL, e.g. https://github.com/owner/name
    #[arg(value_name = "URL", required_unless_present = "file", conflicts_with = "file")]
    pub url: Option<String>,

    /// Release tag to install (commit SHA for forks); latest when omitted
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Replace an installed version
    #[arg(long)]
    pub update: bool,

    /// Never pick this tag as the latest release (repeatable)
    #[arg(long = "ignore-version", value_name = "VERSION", conflicts_with = "file")]
    pub ignored_versions: Vec<String>,

    /// The repository is a frontend plugin
    #[arg(long, conflicts_with_all = ["theme", "fork_component"])]
    pub plugin: bool,

    /// The repository is a theme
    #[arg(long, conflicts_with = "fork_component")]
    pub theme: bool,

    /// Install this component from a fork of Home Assistant core
    #[arg(long, value_name = "COMPONENT", requires = "fork_branch")]
    pub fork_component: Option<String>,

    /// Branch of the fork to install from
    #[arg(long, value_name = "BRANCH", requires = "fork_component")]
    pub fork_branch: Option<String>,

    /// Install every package listed in this lock file
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl AddArgs {
    fn kind(&self) -> PackageKind {
        match (&self.fork_component, &self.fork_branch) {
            (Some(component), Some(branch)) => PackageKind::Fork {
                fork_component: component.clone(),
                branch_name: branch.clone(),
            },
            _ if self.plugin => PackageKind::Plugin,
            _ if self.theme => PackageKind::Theme,
            _ => PackageKind::Integration,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include the package type and url
    #[arg(long)]
    pub verbose: bool,

    /// Write the installed packages to the lock file
    #[arg(long)]
    pub freeze: bool,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Repository names or URLs
    #[arg(value_name = "NAME|URL", required = true)]
    pub packages: Vec<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct UpgradeArgs {
    /// Repository names or URLs (all installed packages when omitted)
    #[arg(value_name = "NAME|URL")]
    pub packages: Vec<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            config_root: self.config_root.clone(),
            package_file: self.package_file.clone(),
            api_url: self.api_url.clone(),
            raw_url: self.raw_url.clone(),
            web_url: self.web_url.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = unhacs::runtime::RealRuntime;
    let config = Config::new(&runtime, cli.settings())?;

    match cli.command {
        Commands::Add(args) => {
            let options = AddOptions {
                kind: args.kind(),
                url: args.url,
                version: args.version,
                update: args.update,
                ignored_versions: args.ignored_versions,
                file: args.file,
            };
            commands::add(runtime, config, options).await?
        }
        Commands::List(args) => commands::list(runtime, config, args.verbose, args.freeze)?,
        Commands::Remove(args) => commands::remove(runtime, config, &args.packages, args.yes)?,
        Commands::Upgrade(args) => {
            commands::upgrade(runtime, config, &args.packages, args.yes).await?
        }
    }
    Ok(())
}
