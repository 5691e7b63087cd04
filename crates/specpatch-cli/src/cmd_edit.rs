use crate::context::Context;
use std::path::PathBuf;

pub fn execute(
    ctx: &Context,
    patch: u32,
    output: Option<PathBuf>,
    abort: bool,
) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;

    if abort {
        if wf.abort()? {
            println!("Edit session aborted");
        }
        return Ok(());
    }

    let output = output.map(|p| ctx.resolve(&p));
    let session = wf.edit(patch, output)?;
    println!(
        "Compiled spec saved as {}; run `specpatch commit` when you're done",
        session.file.display()
    );
    println!("Changes will be saved in patch {}", session.patch);
    Ok(())
}
