//! Stdio transport: one JSON-RPC message per line.
//!
//! Requests are handled concurrently; responses are written in completion
//! order, each on its own line.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::info;

use super::McpServer;

/// Serve on the process's stdin and stdout until stdin closes.
pub async fn serve_stdio(server: Arc<McpServer>) -> std::io::Result<()> {
    info!("Serving on stdio");
    serve_lines(server, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
}

/// Serve newline-delimited messages from `reader`, replying on `writer`.
pub async fn serve_lines<R, W>(server: Arc<McpServer>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut lines = reader.lines();
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !line.trim().is_empty() {
                        let server = server.clone();
                        let tx = tx.clone();
                        tasks.spawn(async move {
                            if let Some(reply) = server.handle_message(&line).await {
                                let _ = tx.send(reply);
                            }
                        });
                    }
                }
                None => break,
            },
            Some(reply) = rx.recv() => write_line(&mut writer, &reply).await?,
        }
    }

    // input closed: finish in-flight requests before returning
    drop(tx);
    while tasks.join_next().await.is_some() {}
    while let Some(reply) = rx.recv().await {
        write_line(&mut writer, &reply).await?;
    }
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
