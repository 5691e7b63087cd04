use crate::context::Context;

pub fn execute(ctx: &Context, message: Option<&str>) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;
    let patch = wf.commit(message)?;
    println!("Saved patch {patch}");
    Ok(())
}
