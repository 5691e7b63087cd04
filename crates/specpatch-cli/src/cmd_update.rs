use crate::context::Context;
use specpatch_engine::UpdateOutcome;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit status of `update --check` when upstream changed.
pub const EXIT_CODE_ON_UPDATES: u8 = 2;

pub fn execute(ctx: &Context, output: Option<PathBuf>, check: bool) -> anyhow::Result<ExitCode> {
    let (_guard, mut wf) = ctx.workflow()?;
    let output = ctx.resolve(&output.unwrap_or_else(|| PathBuf::from("upstream-update.patch")));

    match wf.update(&output, check)? {
        UpdateOutcome::UpToDate => {
            println!("No upstream updates found");
            Ok(ExitCode::SUCCESS)
        }
        UpdateOutcome::Available { file } => {
            println!("Upstream updates found; review {}", file.display());
            Ok(ExitCode::from(EXIT_CODE_ON_UPDATES))
        }
        UpdateOutcome::Declined { file } => {
            println!("Baseline left unchanged; the update is in {}", file.display());
            Ok(ExitCode::SUCCESS)
        }
        UpdateOutcome::Applied { file, level } => {
            println!("Baseline updated to patch level {level} (changes in {})", file.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
