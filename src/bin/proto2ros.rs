//! Generate ROS 2 `.msg` and `.srv` files from a proto3 source.
//!
//! Usage:
//!   proto2ros -f robot.proto -m msg -s srv
//!   proto2ros -m msg -s srv --clean-folders
//!
//! Imports are resolved against `--import-root` (default: current directory).

use anyhow::{bail, Context};
use clap::Parser;
use proto2ros::{output, DuplicatePolicy, Options};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "proto2ros",
    version,
    about = "This program generates ROS2 msg and srv files from a .proto source file"
)]
struct Cli {
    /// The relative file path to your .proto file
    #[arg(short = 'f', long = "file", value_name = "PROTO")]
    file: Option<PathBuf>,

    /// Folder in which generated .msg files are created
    #[arg(short = 'm', long = "msg-dest", default_value = ".")]
    msg_dest: PathBuf,

    /// Folder in which generated .srv files are created
    #[arg(short = 's', long = "srv-dest", default_value = ".")]
    srv_dest: PathBuf,

    /// Remove pre-existing .msg and .srv files in the destination folders
    /// (including files not generated by this tool)
    #[arg(short = 'c', long = "clean")]
    clean: bool,

    /// Remove the .msg and .srv files and then the destination folders, and exit
    #[arg(short = 'C', long = "clean-folders")]
    clean_folders: bool,

    /// Directory import paths are relative to
    #[arg(long = "import-root", value_name = "DIR", default_value = ".")]
    import_root: PathBuf,

    /// Legacy type prefix that adds one array dimension per occurrence (e.g. Rpt)
    #[arg(long = "repeat-prefix", value_name = "PREFIX")]
    repeat_prefix: Option<String>,

    /// What to do with duplicate message/service titles: allow, warn, reject
    #[arg(long = "duplicates", default_value = "warn")]
    duplicates: DuplicatePolicy,

    /// Debug logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = Options {
        import_root: Some(cli.import_root.clone()),
        duplicates: cli.duplicates,
        repeat_prefix: cli.repeat_prefix.clone(),
        ..Options::default()
    };

    for dir in [&cli.msg_dest, &cli.srv_dest] {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    if cli.clean || cli.clean_folders {
        let msgs = output::clean_dir(&cli.msg_dest, &options.message_extension)
            .context("cleaning message folder")?;
        let srvs = output::clean_dir(&cli.srv_dest, &options.service_extension)
            .context("cleaning service folder")?;
        if cli.clean_folders {
            output::remove_dir(&cli.msg_dest).context("removing message folder")?;
            if cli.srv_dest != cli.msg_dest {
                output::remove_dir(&cli.srv_dest).context("removing service folder")?;
            }
            tracing::info!("cleaned msg and srv folders");
            return Ok(());
        }
        tracing::info!(messages = msgs.len(), services = srvs.len(), "cleaned msg and srv files");
    }

    let Some(source) = &cli.file else {
        return Ok(());
    };
    if !source.is_file() {
        bail!("input error: .proto file not found at {}", source.display());
    }

    let report = proto2ros::run_with_options(&options, source, &cli.msg_dest, &cli.srv_dest)
        .with_context(|| format!("translating {}", source.display()))?;
    println!(
        "{}: {} message file(s), {} service file(s), {} warning(s)",
        source.display(),
        report.messages.len(),
        report.services.len(),
        report.warnings.len()
    );
    Ok(())
}
