mod cmd_commit;
mod cmd_compile;
mod cmd_config;
mod cmd_edit;
mod cmd_init;
mod cmd_lock;
mod cmd_login;
mod cmd_normalize;
mod cmd_patch;
mod cmd_status;
mod cmd_update;
mod context;
mod prompt;

use clap::{Parser, Subcommand};
use context::Context;
use specpatch_core::Format;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SPECPATCH_LOG";

#[derive(Parser)]
#[command(
    name = "specpatch",
    version,
    about = "Keep SDK patches on top of a generated OpenAPI spec"
)]
struct Cli {
    /// Verbose logging (same as SPECPATCH_LOG=debug)
    #[arg(long, global = true)]
    debug: bool,
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a project from an upstream spec URL or file
    Init {
        /// URL or path of the upstream spec
        spec_url: String,
        /// Storage format of the baseline (json or yaml)
        #[arg(long, default_value = "json")]
        format: Format,
    },
    /// Start editing a patch: writes the compiled spec to a work file
    Edit {
        /// Patch to edit (0 = next new patch, or the last patch if not yet folded)
        #[arg(short, long, default_value_t = 0)]
        patch: u32,
        /// Work file to write
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Abort the current edit session
        #[arg(long)]
        abort: bool,
    },
    /// Save the work file as a patch and end the edit session
    Commit {
        /// Description stored with the patch
        #[arg(short, long)]
        message: Option<String>,
    },
    /// List, show, describe or remove stored patches
    Patch {
        /// List patches with their descriptions (default)
        #[arg(short, long)]
        list: bool,
        /// Print the diff of a patch
        #[arg(short, long)]
        get: Option<u32>,
        /// Remove a patch
        #[arg(long)]
        rm: Option<u32>,
        /// Set the description of a patch
        #[arg(short, long)]
        message: Option<String>,
        /// Patch whose description `--message` sets (default: the last one)
        #[arg(short = 'n', long)]
        number: Option<u32>,
    },
    /// Check the upstream spec for changes and fold them into the baseline
    Update {
        /// File receiving the upstream diff
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Only report; exit with status 2 when updates exist
        #[arg(long)]
        check: bool,
    },
    /// Acquire the edit lock
    Lock,
    /// Release the edit lock
    Unlock,
    /// Show session state and patch levels
    Status {
        /// Force the session back to IDLE
        #[arg(long)]
        reset: bool,
    },
    /// Write the spec compiled up to a patch level
    Compile {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Patch level to compile to (default: all patches)
        #[arg(short, long)]
        level: Option<u32>,
    },
    /// Print the combined diff of all patches against the baseline
    Changes,
    /// Print a spec the way the store renders it
    Normalize {
        /// URL or path of the spec
        file: String,
        /// Indentation width
        #[arg(long)]
        indent: Option<usize>,
        /// Output format (json or yaml)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Diff two specs after normalizing both
    Diff {
        /// URL or path of the old spec
        from: String,
        /// URL or path of the new spec
        to: String,
        /// Format both sides are rendered in (json or yaml)
        #[arg(long)]
        format: Option<Format>,
    },
    /// Log in to the auth service and cache the token
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Manage user settings
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let ctx = Context::load(cli.yes)?;

    match cli.cmd {
        Command::Init { spec_url, format } => cmd_init::execute(&ctx, &spec_url, format)?,
        Command::Edit {
            patch,
            output,
            abort,
        } => cmd_edit::execute(&ctx, patch, output, abort)?,
        Command::Commit { message } => cmd_commit::execute(&ctx, message.as_deref())?,
        Command::Patch {
            list,
            get,
            rm,
            message,
            number,
        } => cmd_patch::execute(
            &ctx,
            cmd_patch::PatchArgs {
                list,
                get,
                rm,
                message,
                number,
            },
        )?,
        Command::Update { output, check } => return cmd_update::execute(&ctx, output, check),
        Command::Lock => cmd_lock::lock(&ctx)?,
        Command::Unlock => cmd_lock::unlock(&ctx)?,
        Command::Status { reset } => cmd_status::execute(&ctx, reset)?,
        Command::Compile { output, level } => cmd_compile::execute(&ctx, output, level)?,
        Command::Changes => cmd_compile::changes(&ctx)?,
        Command::Normalize {
            file,
            indent,
            format,
        } => cmd_normalize::normalize(&ctx, &file, indent, format)?,
        Command::Diff { from, to, format } => cmd_normalize::diff(&ctx, &from, &to, format)?,
        Command::Login { username, password } => cmd_login::execute(&ctx, username, password)?,
        Command::Config { cmd } => cmd_config::run(cmd, &ctx.settings_path)?,
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            if let Some(hint) = err
                .downcast_ref::<specpatch_core::Error>()
                .and_then(specpatch_core::Error::remediation)
            {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}
