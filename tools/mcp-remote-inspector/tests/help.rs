use assert_cmd::Command;
use tempfile::{TempDir, tempdir};

fn inspector(config: &TempDir) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("mcp-remote-inspector")?;
    cmd.arg("--config-dir").arg(config.path());
    for var in [
        "APP_CONFIG_PROFILE",
        "MCP_SSE_URL",
        "MCP_STREAMABLE_HTTP_URL",
        "MCP_TRANSPORT",
    ] {
        cmd.env_remove(var);
    }
    Ok(cmd)
}

#[test]
fn console_prints_status_and_help() -> anyhow::Result<()> {
    let config = tempdir()?;
    let output = inspector(&config)?
        .write_stdin("help\nstatus\ntransport http\nresult\nquit\n")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("[SSE] https://mcp.deepwiki.com/sse | Not connected"));
    assert!(stdout.contains("connect                connect with the edited url"));
    assert!(stdout.contains("[Streamable HTTP] https://mcp.context7.com/mcp | Not connected"));
    assert!(stdout.contains("[Tool call result will appear here]"));
    Ok(())
}

#[test]
fn unknown_command_keeps_the_console_alive() -> anyhow::Result<()> {
    let config = tempdir()?;
    let output = inspector(&config)?
        .write_stdin("dance\ncall\n")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("error: unknown command 'dance'"));
    assert!(stdout.contains("No tool selected"));
    Ok(())
}
