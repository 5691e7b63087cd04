use crate::context::Context;
use specpatch_core::AuthGate;
use specpatch_remote::{CredentialSource, EnvOrPrompt, HttpAuth, StaticCredentials};

pub fn execute(
    ctx: &Context,
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let Some(url) = &ctx.settings.auth_url else {
        anyhow::bail!("no auth service configured; run `specpatch config set authUrl <url>` first");
    };

    let source: Box<dyn CredentialSource> = match (&username, password) {
        (Some(username), Some(password)) => Box::new(StaticCredentials {
            username: username.clone(),
            password,
        }),
        _ => Box::new(EnvOrPrompt),
    };
    let hint = username.unwrap_or_else(|| ctx.settings.auth.username.clone());
    let (username, password) = source.credentials(&hint)?;

    let mut auth =
        HttpAuth::new(url.clone(), ctx.settings.clone(), source).persist_to(&ctx.settings_path);
    auth.login(&username, &password)?;
    println!("Logged in as {username}");
    Ok(())
}
