use anyhow::Result;
use clap::Parser;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use ybm_tap::{
    cleanup::{self, SharedCleanupContext},
    config,
    formula::{self, Formula},
    platform::{DefaultPlatformDetector, Platform, PlatformDetector},
    release,
    runtime::RealRuntime,
};

/// ybm-tap - installer for the YugabyteDB Managed CLI (ybm-cli)
///
/// Picks the prebuilt ybm-cli archive for this platform, verifies its
/// SHA-256 digest and installs the executable.
///
/// If the GITHUB_TOKEN environment variable is set, release assets are
/// fetched through the GitHub API with it, which also works for private
/// repositories.
#[derive(Parser, Debug)]
#[command(author, version = env!("YBM_TAP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show package metadata and every available artifact
    Info,

    /// Print the artifact selected for a platform
    Resolve(PlatformArgs),

    /// Download, verify and install ybm-cli
    Install(InstallArgs),

    /// Report whether a newer ybm-cli release exists
    CheckUpdate,
}

/// Overrides for the detected platform
#[derive(clap::Args, Debug, Default)]
pub struct PlatformArgs {
    /// Operating system (macos, darwin, linux)
    #[arg(long, value_name = "OS")]
    pub os: Option<String>,

    /// CPU architecture (x86_64, amd64, arm64, aarch64, arm, armv7l)
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Word size (32 or 64)
    #[arg(long, value_name = "BITS")]
    pub bits: Option<u8>,
}

impl PlatformArgs {
    fn platform(&self, detector: &dyn PlatformDetector) -> Platform {
        detector
            .detect()
            .with_overrides(self.os.clone(), self.arch.clone(), self.bits)
    }
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub platform: PlatformArgs,

    /// Directory to place the executable in (also via YBM_TAP_BIN_DIR)
    #[arg(long = "bin-dir", env = "YBM_TAP_BIN_DIR", value_name = "PATH")]
    pub bin_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let cleanup_ctx = cleanup::new_shared();
    let interrupted = Arc::clone(&cleanup_ctx);

    tokio::select! {
        result = run(cli, cleanup_ctx) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, cleaning up...");
            cleanup::lock(&interrupted).cleanup();
            std::process::exit(130);
        }
    }
}

async fn run(cli: Cli, cleanup_ctx: SharedCleanupContext) -> Result<()> {
    let formula = formula::ybm_cli()?;
    let detector = DefaultPlatformDetector;

    match cli.command {
        Commands::Info => print_info(&formula),
        Commands::Resolve(args) => {
            let platform = args.platform(&detector);
            let entry = formula.resolve_platform(&platform)?;
            println!("platform: {}", entry.platform);
            println!("url:      {}", entry.url);
            println!("sha256:   {}", entry.sha256);
            println!("archive:  {}", entry.archive);
            println!("binary:   {}", entry.binary);
        }
        Commands::Install(args) => {
            let platform = args.platform.platform(&detector);
            // Unsupported platforms fail here, before any network I/O
            let entry = formula.resolve_platform(&platform)?;
            let installed = ybm_tap::install::install(
                RealRuntime,
                entry,
                args.bin_dir,
                cli.api_url,
                cleanup_ctx,
            )
            .await?;
            println!(
                "Installed {} {} to {}",
                formula.metadata.name,
                formula.metadata.version,
                installed.display()
            );
        }
        Commands::CheckUpdate => {
            let runtime = RealRuntime;
            let current = &formula.metadata.version;
            let newer = match config::github_client(&runtime, cli.api_url) {
                Ok(github) => {
                    release::check_for_update(&runtime, &github, current, unix_now()).await
                }
                Err(e) => {
                    debug!("Could not set up a GitHub client: {:#}", e);
                    None
                }
            };
            match newer {
                Some(latest) => println!(
                    "A newer version is available. Please upgrade to the latest version {}",
                    latest
                ),
                None => println!("{} {} is up to date.", formula.metadata.name, current),
            }
        }
    }
    Ok(())
}

fn print_info(formula: &Formula) {
    let meta = &formula.metadata;
    println!("{} {}", meta.name, meta.version);
    println!("{}", meta.description);
    println!("Homepage: {}", meta.homepage);
    println!("License:  {}", meta.license);
    println!();
    println!("Artifacts:");
    for entry in &formula.entries {
        println!("  {:<22} {}", entry.platform.to_string(), entry.url);
        println!("  {:<22} sha256:{}", "", entry.sha256);
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
