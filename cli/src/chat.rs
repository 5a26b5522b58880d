use anyhow::{Context, Result};
use fridge_core::{Assistant, Reply};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const EXIT_COMMANDS: &[&str] = &["quit", "exit", ":q"];

fn render(reply: &Reply, json: bool) -> Result<String> {
    if json {
        let mut line = serde_json::to_string(reply).context("Failed to serialize reply")?;
        line.push('\n');
        Ok(line)
    } else {
        Ok(reply.to_string())
    }
}

/// Read messages from stdin until EOF or an exit command, printing each reply.
pub async fn run(assistant: &Assistant, user: &str, json: bool) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    stdout
        .write_all(render(&assistant.welcome(), json)?.as_bytes())
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if EXIT_COMMANDS.contains(&line.to_lowercase().as_str()) {
            break;
        }

        let reply = assistant.handle(user, line).await;
        stdout.write_all(render(&reply, json)?.as_bytes()).await?;
    }

    stdout.flush().await?;
    Ok(())
}
