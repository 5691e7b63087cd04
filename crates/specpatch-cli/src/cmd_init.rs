use crate::context::Context;
use specpatch_core::Format;
use specpatch_engine::PatchChain;
use specpatch_remote::HttpUpstream;
use specpatch_store::{SessionFile, WorkspaceGuard};
use std::path::Path;

pub fn execute(ctx: &Context, spec_url: &str, format: Format) -> anyhow::Result<()> {
    let _guard = WorkspaceGuard::acquire(&ctx.paths)?;

    // Local specs are recorded by absolute path so any checkout can reach them.
    let spec_url = if spec_url.starts_with("http://") || spec_url.starts_with("https://") {
        spec_url.to_string()
    } else {
        ctx.resolve(Path::new(spec_url)).display().to_string()
    };

    let chain = PatchChain::init(
        ctx.store(),
        &HttpUpstream::new(),
        &spec_url,
        format,
        ctx.settings.indent,
    )?;
    SessionFile::create(&ctx.paths.state_json)?;

    println!(
        "Initialized specpatch project at {} ({} baseline at patch level {})",
        ctx.paths.root.display(),
        chain.format(),
        chain.version_patch_level()
    );
    println!("  store: {}", ctx.store_dir().display());
    Ok(())
}
