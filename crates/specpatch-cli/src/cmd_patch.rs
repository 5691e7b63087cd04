use crate::context::Context;

pub struct PatchArgs {
    pub list: bool,
    pub get: Option<u32>,
    pub rm: Option<u32>,
    pub message: Option<String>,
    pub number: Option<u32>,
}

pub fn execute(ctx: &Context, args: PatchArgs) -> anyhow::Result<()> {
    let (_guard, mut wf) = ctx.workflow()?;

    if let Some(text) = &args.message {
        if wf.list_patches().is_empty() {
            anyhow::bail!("there are no patches to describe");
        }
        let patch = wf.describe_patch(args.number, text)?;
        println!("Saved description of patch {patch}");
    }

    if let Some(patch) = args.rm {
        if wf.remove_patch(patch)? {
            println!("Removed patch {patch}; check that the remaining chain still compiles");
        }
    }

    if let Some(patch) = args.get {
        print!("{}", wf.get_patch(patch)?);
    }

    let nothing_else = args.message.is_none() && args.rm.is_none() && args.get.is_none();
    if args.list || nothing_else {
        let patches = wf.list_patches();
        if patches.is_empty() {
            println!("There are no patches");
        }
        for (number, description) in patches {
            println!("[ {number} ] - {description}");
        }
    }
    Ok(())
}
