use clap::builder::{styling::AnsiColor, Styles};
use clap::ColorChoice;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use commands::{
    auto_detect_sqpack_path, inspect_index, patch_archive, reset_config, set_sqpack_path,
    show_config, InspectIndexArgs, PatchArchiveArgs,
};
use miette::Result;

mod commands;
mod errors;
mod utils;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Append a mod package to a new data segment and rewrite the index
    Patch {
        /// The original index file (defaults to <sqpack_path>/ffxiv/<archive>.win32.index)
        #[arg(long)]
        index: Option<String>,

        /// The original data segment (defaults to <sqpack_path>/ffxiv/<archive>.win32.dat0)
        #[arg(long)]
        dat: Option<String>,

        /// The archive name used to derive default paths
        #[arg(short, long, default_value = "000000")]
        archive: String,

        /// The mod descriptor file
        #[arg(long, default_value = "TTMPL.mpl")]
        mod_list: String,

        /// The mod payload blob
        #[arg(long, default_value = "TTMPD.mpd")]
        mod_data: String,

        /// The directory to write the patched index and new segment to
        #[arg(short, long, default_value = "distrib")]
        output_dir: String,

        /// The index of the appended data segment (1-7)
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=7))]
        segment: u8,

        /// Skip copying the original index into <output_dir>/orig
        #[arg(long)]
        no_backup: bool,
    },
    /// Show information about an index file
    Inspect {
        /// The index file (defaults to <sqpack_path>/ffxiv/<archive>.win32.index)
        #[arg(long)]
        index: Option<String>,

        /// The archive name used to derive the default path
        #[arg(short, long, default_value = "000000")]
        archive: String,

        /// Game paths to resolve against the index
        #[arg(short, long)]
        path: Vec<String>,
    },
    /// Manage the tool configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set the path to the game's sqpack directory
    SetSqpackPath { path: String },
    /// Look for the sqpack directory in default install locations
    AutoDetect,
    /// Reset the configuration to defaults
    Reset,
}

fn parse_args() -> Args {
    // Configure colored/styled help output
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Blue.on_default());

    let matches = Args::command()
        .styles(styles)
        .color(ColorChoice::Auto)
        .get_matches();

    Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

fn init_logging(verbose: bool) {
    // `RUST_LOG` takes precedence, e.g. `RUST_LOG=sqpack_patch=trace`
    let default_filter = if verbose {
        "sqpack_inject=debug,sqpack_patch=debug"
    } else {
        "sqpack_inject=info,sqpack_patch=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = parse_args();
    init_logging(args.verbose);

    match args.command {
        Commands::Patch {
            index,
            dat,
            archive,
            mod_list,
            mod_data,
            output_dir,
            segment,
            no_backup,
        } => patch_archive(PatchArchiveArgs {
            index,
            dat,
            archive,
            mod_list,
            mod_data,
            output_dir,
            segment,
            backup: !no_backup,
        }),
        Commands::Inspect {
            index,
            archive,
            path,
        } => inspect_index(InspectIndexArgs {
            index,
            archive,
            paths: path,
        }),
        Commands::Config { command } => match command {
            ConfigCommands::Show => show_config(),
            ConfigCommands::SetSqpackPath { path } => set_sqpack_path(path),
            ConfigCommands::AutoDetect => auto_detect_sqpack_path(),
            ConfigCommands::Reset => reset_config(),
        },
    }
}
