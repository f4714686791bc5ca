//! Where symbol outlines come from.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use hunkrank_lsp::{DocumentSymbol, LanguageRegistry, LspClient};

use crate::types::FileDiff;

/// Supplies the symbol outline for a file in the diff.
///
/// Lookups are best-effort: an implementation returns an empty outline
/// rather than an error, and the prioritizer bounds each call by the
/// batch deadline.
pub trait SymbolSource {
    fn symbols(
        &self,
        file: &FileDiff,
        work_dir: Option<&Path>,
    ) -> impl Future<Output = Vec<DocumentSymbol>>;
}

/// Never reports symbols; every hunk gets the default weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSymbols;

impl SymbolSource for NoSymbols {
    async fn symbols(&self, _file: &FileDiff, _work_dir: Option<&Path>) -> Vec<DocumentSymbol> {
        Vec::new()
    }
}

/// Asks a freshly spawned language server per file.
#[derive(Debug, Clone, Default)]
pub struct LspSymbols {
    registry: LanguageRegistry,
}

impl LspSymbols {
    #[must_use]
    pub fn new(registry: LanguageRegistry) -> Self {
        Self { registry }
    }

    async fn fetch(&self, file: &FileDiff, work_dir: Option<&Path>) -> Result<Vec<DocumentSymbol>> {
        let path = resolve(&file.new_path, work_dir)?;

        let language = self
            .registry
            .detect(&path)
            .context("no language server registered for this extension")?;
        if !language.available() {
            bail!("{} not found in PATH", language.command);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let uri = hunkrank_lsp::file_uri(&path)?;
        let root = path.parent().unwrap_or(&path);

        let client = LspClient::spawn(language)?;
        let result = query(&client, root, &uri, &language.name, &content).await;
        client.close().await;
        result
    }
}

impl SymbolSource for LspSymbols {
    async fn symbols(&self, file: &FileDiff, work_dir: Option<&Path>) -> Vec<DocumentSymbol> {
        if file.is_binary || file.is_delete {
            return Vec::new();
        }
        match self.fetch(file, work_dir).await {
            Ok(symbols) => {
                tracing::debug!(path = %file.new_path, count = symbols.len(), "Fetched symbols");
                symbols
            }
            Err(e) => {
                tracing::debug!(path = %file.new_path, "No symbols: {e:#}");
                Vec::new()
            }
        }
    }
}

fn resolve(new_path: &str, work_dir: Option<&Path>) -> Result<PathBuf> {
    let path = match work_dir {
        Some(dir) => dir.join(new_path),
        None => PathBuf::from(new_path),
    };
    std::path::absolute(&path).with_context(|| format!("resolving {}", path.display()))
}

async fn query(
    client: &LspClient,
    root: &Path,
    uri: &str,
    language_id: &str,
    text: &str,
) -> Result<Vec<DocumentSymbol>> {
    client.initialize(root).await?;
    client.open_document(uri, language_id, text).await?;
    let symbols = client.document_symbols(uri).await;
    if let Err(e) = client.close_document(uri).await {
        tracing::trace!("didClose failed: {e:#}");
    }
    symbols
}
