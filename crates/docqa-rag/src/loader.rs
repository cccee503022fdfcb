//! Document loading and text extraction

use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use docqa_core::{Document, Error, Result};

/// File extensions the loader knows how to extract text from
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "markdown", "html", "htm"];

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));

/// What to do when a single file cannot be read or parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreadablePolicy {
    /// Fail the whole load
    #[default]
    Abort,
    /// Log, record the failure and keep going
    Skip,
}

/// Documents extracted from a directory plus any skipped failures
#[derive(Debug, Clone, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub failures: Vec<String>,
}

/// Extracts plain text from every supported file in a directory
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader {
    policy: UnreadablePolicy,
}

impl DocumentLoader {
    pub fn new(policy: UnreadablePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnreadablePolicy {
        self.policy
    }

    /// List supported files in `dir`, sorted by file name
    pub async fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| Error::loader(dir, format!("cannot read directory: {}", e)))?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_supported(&path) {
                files.push(path);
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Extract text from every supported file, in file-name order
    pub async fn load_directory(&self, dir: &Path) -> Result<LoadedDocuments> {
        let files = self.discover(dir).await?;
        let mut loaded = LoadedDocuments::default();

        for path in files {
            match self.load_file(&path).await {
                Ok(document) => {
                    tracing::info!(
                        file = %document.title,
                        text_length = document.content.chars().count(),
                        "Processed document"
                    );
                    loaded.documents.push(document);
                }
                Err(e) if self.policy == UnreadablePolicy::Skip => {
                    tracing::warn!("⚠️ Skipping unreadable document: {}", e);
                    loaded.failures.push(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(loaded)
    }

    /// Extract text from a single file
    pub async fn load_file(&self, path: &Path) -> Result<Document> {
        let extension = extension_of(path)
            .ok_or_else(|| Error::loader(path, "unsupported file type"))?;

        let (raw, pages) = match extension.as_str() {
            "pdf" => {
                let pages = extract_pdf_pages(path).await?;
                let count = pages.len();
                (pages.join("\n"), Some(count))
            }
            "md" | "markdown" => (markdown_to_text(&read_utf8(path).await?), None),
            "html" | "htm" => (html_to_text(&read_utf8(path).await?), None),
            "txt" => (read_utf8(path).await?, None),
            _ => return Err(Error::loader(path, "unsupported file type")),
        };

        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source = path.to_string_lossy().into_owned();

        Ok(Document {
            id: format!("{:x}", md5::compute(source.as_bytes())),
            title,
            content: normalize_whitespace(&raw),
            source,
            metadata: json!({
                "format": extension,
                "pages": pages,
            }),
        })
    }
}

/// Join document texts in order, separated by a blank line
pub fn concatenate(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .filter(|content| !content.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn is_supported(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

async fn read_utf8(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::loader(path, e))?;
    String::from_utf8(bytes).map_err(|_| Error::loader(path, "file is not valid UTF-8"))
}

/// PDF parsing is CPU-bound and may panic on malformed input, so it runs on
/// the blocking pool where a panic surfaces as a join error.
async fn extract_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let owned = path.to_path_buf();
    let outcome = tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned)).await;

    match outcome {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(Error::loader(path, e)),
        Err(e) if e.is_panic() => Err(Error::loader(path, "PDF parser panicked on malformed input")),
        Err(e) => Err(Error::loader(path, e)),
    }
}

fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push('\n'),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::Item) => {
                text.push_str("\n\n");
            }
            _ => {}
        }
    }

    text
}

fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
