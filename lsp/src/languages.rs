//! Extension → language server table.

use std::path::Path;

use serde::Deserialize;

/// A language server launch recipe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Language {
    /// LSP language identifier sent in `didOpen` (e.g. "go", "python").
    pub name: String,
    /// Dotted, lowercase extensions (e.g. `[".ts", ".tsx"]`).
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Executable command (e.g. "gopls").
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Language {
    fn builtin(name: &str, extensions: &[&str], command: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| (*e).to_string()).collect(),
            command: command.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// Whether the server command resolves on PATH. Not cached.
    #[must_use]
    pub fn available(&self) -> bool {
        which::which(&self.command).is_ok()
    }

    fn handles(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }

    fn normalized(mut self) -> Self {
        self.extensions = self
            .extensions
            .iter()
            .map(|e| {
                let lower = e.trim().to_ascii_lowercase();
                if lower.starts_with('.') {
                    lower
                } else {
                    format!(".{lower}")
                }
            })
            .collect();
        self
    }
}

/// Ordered language table; the first language claiming an extension wins.
#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl LanguageRegistry {
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            languages: vec![
                Language::builtin("go", &[".go"], "gopls", &[]),
                Language::builtin("python", &[".py"], "pyright-langserver", &["--stdio"]),
                Language::builtin("rust", &[".rs"], "rust-analyzer", &[]),
                Language::builtin("csharp", &[".cs"], "OmniSharp", &["--languageserver"]),
                Language::builtin(
                    "typescript",
                    &[".ts", ".tsx", ".js", ".jsx"],
                    "typescript-language-server",
                    &["--stdio"],
                ),
                Language::builtin(
                    "html",
                    &[".html", ".htm"],
                    "vscode-html-language-server",
                    &["--stdio"],
                ),
                Language::builtin(
                    "json",
                    &[".json"],
                    "vscode-json-language-server",
                    &["--stdio"],
                ),
                Language::builtin(
                    "yaml",
                    &[".yaml", ".yml"],
                    "yaml-language-server",
                    &["--stdio"],
                ),
                Language::builtin("nix", &[".nix"], "nil", &[]),
                Language::builtin("lua", &[".lua"], "lua-language-server", &[]),
            ],
        }
    }

    /// A registry that supports nothing; every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            languages: Vec::new(),
        }
    }

    /// Builtin table with `overrides` consulted first.
    #[must_use]
    pub fn with_overrides(overrides: impl IntoIterator<Item = Language>) -> Self {
        let mut languages: Vec<Language> =
            overrides.into_iter().map(Language::normalized).collect();
        languages.extend(Self::builtin().languages);
        Self { languages }
    }

    /// Find the language for `path` by its final, case-folded extension.
    #[must_use]
    pub fn detect(&self, path: &Path) -> Option<&Language> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let dotted = format!(".{ext}");
        self.languages.iter().find(|lang| lang.handles(&dotted))
    }

    #[must_use]
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }
}
