//! Client handle: owns one language server process for one short query.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use crate::codec::{FrameReader, FrameWriter};
use crate::languages::Language;
use crate::protocol::{self, CodeAction, IncomingFrame, Notification, Request, SymbolResponse};
use crate::types::{DocumentSymbol, TextEdit};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

struct Connection<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

/// A minimal LSP client.
///
/// Requests are strictly sequential: one lock covers the write and the wait
/// for the matching response, so there is never more than one request in
/// flight. A client is meant for a single file query and is then closed.
pub struct LspClient<R = ChildStdout, W = ChildStdin> {
    child: Option<Child>,
    conn: Mutex<Connection<R, W>>,
    next_id: AtomicU64,
}

impl LspClient {
    /// Spawn `language`'s server with piped stdio.
    ///
    /// The child is killed if the client is dropped without [`close`](Self::close).
    pub fn spawn(language: &Language) -> Result<Self> {
        let resolved_cmd = which::which(&language.command)
            .with_context(|| format!("{} not found in PATH", language.command))?;
        let mut child = Command::new(&resolved_cmd)
            .args(&language.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning {}", language.command))?;

        let stdout = child.stdout.take().context("no stdout from child")?;
        let stdin = child.stdin.take().context("no stdin from child")?;

        let mut client = Self::from_streams(stdout, stdin);
        client.child = Some(child);
        Ok(client)
    }
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> LspClient<R, W> {
    /// Client over arbitrary streams, with no process attached.
    pub fn from_streams(reader: R, writer: W) -> Self {
        Self {
            child: None,
            conn: Mutex::new(Connection {
                reader: FrameReader::new(reader),
                writer: FrameWriter::new(writer),
            }),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run the `initialize` / `initialized` handshake rooted at `root`.
    pub async fn initialize(&self, root: &Path) -> Result<()> {
        let root = std::path::absolute(root)
            .with_context(|| format!("resolving workspace root {}", root.display()))?;
        let root_uri = protocol::path_to_file_uri(&root)?;

        self.call("initialize", Some(protocol::initialize_params(root_uri.as_str())))
            .await
            .context("LSP initialize failed")?;

        self.notify("initialized", Some(serde_json::json!({})))
            .await
    }

    pub async fn open_document(&self, uri: &str, language_id: &str, text: &str) -> Result<()> {
        self.notify(
            "textDocument/didOpen",
            Some(protocol::did_open_params(uri, language_id, text)),
        )
        .await
    }

    pub async fn close_document(&self, uri: &str) -> Result<()> {
        self.notify(
            "textDocument/didClose",
            Some(protocol::text_document_params(uri)),
        )
        .await
    }

    /// Whole-document formatting edits, in server order.
    pub async fn format(&self, uri: &str) -> Result<Vec<TextEdit>> {
        let result = self
            .call("textDocument/formatting", Some(protocol::formatting_params(uri)))
            .await?;
        let edits: Option<Vec<TextEdit>> =
            serde_json::from_value(result).context("parsing formatting result")?;
        Ok(edits.unwrap_or_default())
    }

    /// Edits from the first `source.organizeImports` code action.
    ///
    /// Every failure mode, including a missing action, yields no edits.
    pub async fn organize_imports(&self, uri: &str, content: &str) -> Vec<TextEdit> {
        let result = match self
            .call(
                "textDocument/codeAction",
                Some(protocol::organize_imports_params(uri, content)),
            )
            .await
        {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(uri, "organize imports request failed: {e:#}");
                return Vec::new();
            }
        };

        let actions = match result {
            serde_json::Value::Array(actions) => actions,
            serde_json::Value::Null => return Vec::new(),
            other => {
                tracing::debug!(uri, "unexpected codeAction result: {other}");
                return Vec::new();
            }
        };

        // Commands and unknown shapes are skipped rather than failing the batch.
        actions
            .into_iter()
            .filter_map(|action| serde_json::from_value::<CodeAction>(action).ok())
            .find_map(|action| action.organize_imports_edits(uri))
            .unwrap_or_default()
    }

    /// Flattened symbol outline of `uri`.
    pub async fn document_symbols(&self, uri: &str) -> Result<Vec<DocumentSymbol>> {
        let result = self
            .call(
                "textDocument/documentSymbol",
                Some(protocol::text_document_params(uri)),
            )
            .await?;
        Ok(SymbolResponse::decode(result)?.into_symbols())
    }

    /// Best-effort `shutdown` + `exit`, then close stdin and reap the child.
    pub async fn close(self) {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.call("shutdown", None)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("LSP shutdown failed: {e:#}"),
            Err(_) => tracing::debug!("LSP shutdown timed out"),
        }
        if let Err(e) = self.notify("exit", None).await {
            tracing::trace!("LSP exit notification failed: {e:#}");
        }

        let Self { child, conn, .. } = self;
        drop(conn.into_inner().writer.into_inner());

        let Some(mut child) = child else { return };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, child.wait())
            .await
            .is_err()
        {
            tracing::debug!("LSP server didn't exit in time, killing");
            let _ = child.kill().await;
        }
    }

    async fn call(
        &self,
        method: &'static str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut conn = self.conn.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        conn.writer
            .write_frame(&Request::new(id, method, params))
            .await
            .with_context(|| format!("sending {method}"))?;

        loop {
            let frame = conn
                .reader
                .read_frame()
                .await
                .with_context(|| format!("reading response to {method}"))?
                .ok_or_else(|| anyhow!("language server closed stdout before answering {method}"))?;

            match protocol::parse_incoming(&frame) {
                Some(IncomingFrame::Response { id: got, body }) if got == id => {
                    return Ok(protocol::into_result(body)?);
                }
                Some(IncomingFrame::Response { id: got, .. }) => {
                    tracing::trace!("Discarding response for id {got} while waiting for {id}");
                }
                Some(IncomingFrame::ServerRequest { id: req_id, method: req }) => {
                    // Servers may block until workspace/configuration and
                    // similar requests are answered.
                    tracing::debug!("LSP sent request: {req}, replying method not found");
                    conn.writer
                        .write_frame(&protocol::method_not_found(&req_id, &req))
                        .await
                        .with_context(|| format!("replying to {req}"))?;
                }
                Some(IncomingFrame::Notification { method: note }) => {
                    tracing::trace!("Ignoring notification: {note}");
                }
                None => tracing::trace!("Ignoring malformed JSON-RPC frame"),
            }
        }
    }

    async fn notify(&self, method: &'static str, params: Option<serde_json::Value>) -> Result<()> {
        self.conn
            .lock()
            .await
            .writer
            .write_frame(&Notification::new(method, params))
            .await
            .with_context(|| format!("sending {method}"))
    }
}
