use crate::context::Context;
use std::path::PathBuf;

pub fn execute(ctx: &Context, output: Option<PathBuf>, level: Option<u32>) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;
    let output = output.map(|p| ctx.resolve(&p));
    let file = wf.compile_to(output, level)?;
    println!("Compiled spec saved as {}", file.display());
    Ok(())
}

/// Print what the stored patches change relative to the baseline.
pub fn changes(ctx: &Context) -> anyhow::Result<()> {
    print!("{}", ctx.chain()?.changes()?);
    Ok(())
}
