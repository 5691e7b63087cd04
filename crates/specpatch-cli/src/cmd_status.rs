use crate::context::Context;
use specpatch_core::SessionState;

pub fn execute(ctx: &Context, reset: bool) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;

    if reset {
        if wf.reset()? {
            println!("Session state reset to IDLE");
        }
        return Ok(());
    }

    let chain = wf.chain();
    match wf.state() {
        SessionState::Idle => println!("Mode: IDLE"),
        SessionState::Edit {
            patch,
            file,
            status,
        } => {
            println!("Mode: EDIT ({status})");
            println!("Patch: {patch}");
            println!("Work file: {}", file.display());
        }
    }
    println!("Baseline patch level: {}", chain.version_patch_level());
    println!("Stored patches: {}", chain.patches().len());
    println!("Maximum patch level: {}", chain.max_patch_level());
    Ok(())
}
