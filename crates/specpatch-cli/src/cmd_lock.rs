use crate::context::Context;

pub fn lock(ctx: &Context) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;
    wf.lock()?;
    println!("Lock acquired");
    Ok(())
}

/// Release the lock. Unlike the implicit release after commit or abort, a
/// failure here is reported.
pub fn unlock(ctx: &Context) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;
    wf.unlock()?;
    println!("Lock released");
    Ok(())
}
