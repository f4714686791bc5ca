//! Internal JSON-RPC message shapes and LSP request parameters.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::types::{DocumentSymbol, Position, Range, SymbolKind, TextEdit};

pub(crate) const ORGANIZE_IMPORTS_KIND: &str = "source.organizeImports";

/// JSON-RPC `MethodNotFound`.
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

/// An `error` object returned in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Deserialize)]
#[error("LSP error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// Neither symbol response shape matched.
#[derive(Debug, thiserror::Error)]
#[error("unparseable document symbols (as DocumentSymbol[]: {hierarchical}; as SymbolInformation[]: {flat})")]
pub struct SymbolParseError {
    hierarchical: serde_json::Error,
    flat: serde_json::Error,
}

#[derive(Debug, Serialize)]
pub(crate) struct Request {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Request {
    pub fn new(id: u64, method: &'static str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(method: &'static str, params: Option<serde_json::Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// Reply to a server-initiated request we don't implement.
pub(crate) fn method_not_found(id: &serde_json::Value, method: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": METHOD_NOT_FOUND,
            "message": format!("Method not found: {method}")
        }
    })
}

pub(crate) enum IncomingFrame {
    Response {
        id: u64,
        body: serde_json::Value,
    },
    ServerRequest {
        id: serde_json::Value,
        method: String,
    },
    Notification {
        method: String,
    },
}

pub(crate) fn parse_incoming(frame: &serde_json::Value) -> Option<IncomingFrame> {
    let id = frame.get("id");
    let method = frame
        .get("method")
        .and_then(|m| m.as_str())
        .map(String::from);
    let has_result_or_error = frame.get("result").is_some() || frame.get("error").is_some();

    match (id, method, has_result_or_error) {
        (Some(id_val), None, true) => Some(IncomingFrame::Response {
            id: id_val.as_u64()?,
            body: frame.clone(),
        }),
        (Some(id_val), Some(method), _) => Some(IncomingFrame::ServerRequest {
            id: id_val.clone(),
            method,
        }),
        (None, Some(method), _) => Some(IncomingFrame::Notification { method }),
        _ => None,
    }
}

/// Split a response body into its result or its error object.
pub(crate) fn into_result(mut body: serde_json::Value) -> Result<serde_json::Value, RpcError> {
    if let Some(error) = body.get("error").filter(|e| !e.is_null()) {
        return Err(
            serde_json::from_value(error.clone()).unwrap_or_else(|_| RpcError {
                code: 0,
                message: error.to_string(),
            }),
        );
    }
    Ok(body
        .get_mut("result")
        .map(serde_json::Value::take)
        .unwrap_or_default())
}

pub(crate) fn initialize_params(root_uri: &str) -> serde_json::Value {
    serde_json::json!({
        "processId": std::process::id(),
        "rootUri": root_uri,
        "capabilities": {
            "textDocument": {
                "formatting": {
                    "dynamicRegistration": false
                },
                "codeAction": {
                    "dynamicRegistration": false,
                    "codeActionLiteralSupport": {
                        "codeActionKind": {
                            "valueSet": [ORGANIZE_IMPORTS_KIND]
                        }
                    }
                },
                "documentSymbol": {
                    "dynamicRegistration": false,
                    "hierarchicalDocumentSymbolSupport": true
                }
            }
        },
        "workspaceFolders": [{
            "uri": root_uri,
            "name": "workspace"
        }]
    })
}

pub(crate) fn did_open_params(uri: &str, language_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": {
            "uri": uri,
            "languageId": language_id,
            "version": 1,
            "text": text
        }
    })
}

pub(crate) fn text_document_params(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": { "uri": uri }
    })
}

pub(crate) fn formatting_params(uri: &str) -> serde_json::Value {
    serde_json::json!({
        "textDocument": { "uri": uri },
        "options": {
            "tabSize": 4,
            "insertSpaces": false
        }
    })
}

pub(crate) fn organize_imports_params(uri: &str, content: &str) -> serde_json::Value {
    let range = full_document_range(content);
    serde_json::json!({
        "textDocument": { "uri": uri },
        "range": range,
        "context": {
            "diagnostics": [],
            "only": [ORGANIZE_IMPORTS_KIND]
        }
    })
}

/// Range from the origin to the end of the last line, in UTF-16 code units.
pub(crate) fn full_document_range(content: &str) -> Range {
    let last_line = content.rsplit('\n').next().unwrap_or_default();
    Range {
        start: Position::default(),
        end: Position {
            line: content.matches('\n').count() as u32,
            character: last_line.encode_utf16().count() as u32,
        },
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CodeAction {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub edit: Option<WorkspaceEdit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WorkspaceEdit {
    #[serde(default)]
    pub changes: Option<BTreeMap<String, Vec<TextEdit>>>,
    #[serde(default)]
    pub document_changes: Option<Vec<TextDocumentEdit>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentEdit {
    pub edits: Vec<TextEdit>,
}

impl CodeAction {
    /// Edits of an organize-imports action, preferring the entry for `uri`.
    pub fn organize_imports_edits(self, uri: &str) -> Option<Vec<TextEdit>> {
        if self.kind.as_deref() != Some(ORGANIZE_IMPORTS_KIND) {
            return None;
        }
        let edit = self.edit?;
        if let Some(mut changes) = edit.changes {
            if let Some(edits) = changes.remove(uri) {
                return Some(edits);
            }
            if let Some((_, edits)) = changes.into_iter().next() {
                return Some(edits);
            }
        }
        edit.document_changes
            .and_then(|docs| docs.into_iter().next())
            .map(|doc| doc.edits)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDocumentSymbol {
    name: String,
    kind: u64,
    range: Range,
    #[serde(default)]
    children: Option<Vec<RawDocumentSymbol>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSymbolInformation {
    name: String,
    kind: u64,
    location: RawLocation,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    range: Range,
}

/// The two shapes a `textDocument/documentSymbol` result may take.
#[derive(Debug)]
pub(crate) enum SymbolResponse {
    Hierarchical(Vec<RawDocumentSymbol>),
    Flat(Vec<RawSymbolInformation>),
}

impl SymbolResponse {
    /// Try `DocumentSymbol[]` first, then `SymbolInformation[]`.
    pub fn decode(result: serde_json::Value) -> Result<Self, SymbolParseError> {
        if result.is_null() {
            return Ok(Self::Flat(Vec::new()));
        }
        let hierarchical = match serde_json::from_value(result.clone()) {
            Ok(symbols) => return Ok(Self::Hierarchical(symbols)),
            Err(e) => e,
        };
        match serde_json::from_value(result) {
            Ok(symbols) => Ok(Self::Flat(symbols)),
            Err(flat) => Err(SymbolParseError { hierarchical, flat }),
        }
    }

    pub fn into_symbols(self) -> Vec<DocumentSymbol> {
        match self {
            Self::Hierarchical(roots) => {
                let mut out = Vec::new();
                flatten(roots, &mut out);
                out
            }
            Self::Flat(infos) => infos
                .into_iter()
                .map(|s| {
                    DocumentSymbol::new(
                        s.name,
                        SymbolKind::from_lsp(s.kind),
                        s.location.range.start.line,
                        s.location.range.end.line,
                    )
                })
                .collect(),
        }
    }
}

fn flatten(symbols: Vec<RawDocumentSymbol>, out: &mut Vec<DocumentSymbol>) {
    for sym in symbols {
        out.push(DocumentSymbol::new(
            sym.name,
            SymbolKind::from_lsp(sym.kind),
            sym.range.start.line,
            sym.range.end.line,
        ));
        if let Some(children) = sym.children {
            flatten(children, out);
        }
    }
}

pub(crate) fn path_to_file_uri(path: &Path) -> Result<url::Url, PathToUriError> {
    url::Url::from_file_path(path).map_err(|()| PathToUriError {
        path: path.to_path_buf(),
    })
}
