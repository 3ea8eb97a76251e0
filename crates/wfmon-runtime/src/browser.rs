//! Launch the platform browser at the gateway root.

use std::process::{Command, Stdio};

fn opener(url: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(url);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", url]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(url);
        cmd
    }
}

/// Fire-and-forget; the browser process is not awaited.
pub fn open_url(url: &str) -> anyhow::Result<()> {
    opener(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("cannot launch browser for {url}: {e}"))?;
    tracing::info!(url, "opened dashboard");
    Ok(())
}
