use crate::context::Context;
use specpatch_core::{Format, Upstream};
use specpatch_engine::unified_diff;
use specpatch_remote::HttpUpstream;

/// Project format when inside a project, JSON otherwise.
fn format_for(ctx: &Context, format: Option<Format>) -> Format {
    format.unwrap_or_else(|| {
        ctx.chain()
            .map(|chain| chain.format())
            .unwrap_or_default()
    })
}

fn render(
    ctx: &Context,
    location: &str,
    format: Format,
    indent: usize,
) -> anyhow::Result<String> {
    let location = if location.starts_with("http://") || location.starts_with("https://") {
        location.to_string()
    } else {
        ctx.resolve(location.as_ref()).display().to_string()
    };
    let doc = HttpUpstream::new().fetch(&location)?;
    Ok(format.marshal(&doc, indent)?)
}

/// Re-render a file or URL the way the store keeps documents.
pub fn normalize(
    ctx: &Context,
    location: &str,
    indent: Option<usize>,
    format: Option<Format>,
) -> anyhow::Result<()> {
    let format = format_for(ctx, format);
    let indent = indent.unwrap_or(ctx.settings.indent);
    print!("{}", render(ctx, location, format, indent)?);
    Ok(())
}

/// Textual diff of two documents after normalization.
pub fn diff(ctx: &Context, left: &str, right: &str, format: Option<Format>) -> anyhow::Result<()> {
    let format = format_for(ctx, format);
    let indent = ctx.settings.indent;
    let left = render(ctx, left, format, indent)?;
    let right = render(ctx, right, format, indent)?;
    print!("{}", unified_diff(&left, &right));
    Ok(())
}
