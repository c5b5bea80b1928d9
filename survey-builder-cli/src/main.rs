use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use survey_builder::Store;
use survey_builder_cli::config;
use survey_builder_cli::{App, export_bundles, list_bundles, show_bundle};
use survey_catalog::{catalog, sync_rules};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "survey-builder",
    version,
    about = "Build surveys from predefined question bundles."
)]
struct Cli {
    /// Config file (default: ./survey-builder.toml if present).
    #[arg(long, global = true, env = "SURVEY_BUILDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build and fill in a survey interactively (default).
    Interactive(InteractiveArgs),
    /// List the available question bundles.
    ListBundles,
    /// Print one bundle as JSON.
    ShowBundle(ShowBundleArgs),
    /// Build a survey from bundles and write the export file.
    Export(ExportArgs),
}

#[derive(Debug, Default, Parser)]
struct InteractiveArgs {
    /// Directory for exported surveys.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Disable colors in prompts.
    #[arg(long, default_value_t = false)]
    plain: bool,
}

#[derive(Debug, Parser)]
struct ShowBundleArgs {
    /// Bundle id (see `list-bundles`).
    id: String,
}

#[derive(Debug, Parser)]
struct ExportArgs {
    /// Bundle ids to add, in order.
    #[arg(long = "bundle", required = true)]
    bundles: Vec<String>,

    /// Directory for the export file.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("read current directory")?;
    let file_config = config::load_or_default(cli.config.as_deref(), &cwd)
        .context("load survey-builder.toml config")?;
    debug!(?file_config, "config loaded");

    match cli.cmd.unwrap_or(Command::Interactive(InteractiveArgs::default())) {
        Command::Interactive(args) => {
            let settings = file_config.merge(args.out_dir, args.plain);
            App::new(Store::new(sync_rules()), catalog(), settings).run()
        }
        Command::ListBundles => {
            print!("{}", list_bundles(&catalog()));
            Ok(())
        }
        Command::ShowBundle(args) => {
            println!("{}", show_bundle(&catalog(), &args.id)?);
            Ok(())
        }
        Command::Export(args) => {
            let settings = file_config.merge(args.out_dir, false);
            let path = export_bundles(&catalog(), &args.bundles, &settings.export_dir)?;
            println!("Survey exported to {}", path.display());
            Ok(())
        }
    }
}
