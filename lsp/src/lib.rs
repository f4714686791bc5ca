//! Minimal LSP client for symbol outlines, formatting, and import organization.
//!
//! One [`LspClient`] drives one language server subprocess through
//! `initialize`, document open/close, a handful of requests, and shutdown.
//! [`LanguageRegistry`] decides which server handles a file.

pub mod codec;
pub mod types;

pub(crate) mod protocol;

mod client;
mod languages;

pub use client::LspClient;
pub use languages::{Language, LanguageRegistry};
pub use protocol::{PathToUriError, RpcError, SymbolParseError};
pub use types::{DocumentSymbol, Position, Range, SymbolKind, TextEdit};

/// Convert an absolute path to a `file://` URI string.
pub fn file_uri(path: &std::path::Path) -> Result<String, PathToUriError> {
    protocol::path_to_file_uri(path).map(String::from)
}
