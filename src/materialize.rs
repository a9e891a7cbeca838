use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::registry::FileRegistry;

/// One extracted (path, content) pair from a model response.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub path: Option<String>,
    pub language: Option<String>,
    pub code: String,
}

/// Outcome of materializing one response. A round with warnings is not a
/// failed round; files that did write stay on disk.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    pub written: Vec<String>,
    pub unchanged: Vec<String>,
    pub dirs_created: Vec<String>,
    pub warnings: Vec<String>,
}

impl MaterializeReport {
    pub fn files_touched(&self) -> usize {
        self.written.len() + self.unchanged.len()
    }
}

/// Extensions accepted when deciding whether a bare line is a file path.
const SOURCE_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "rs", "go", "java", "c", "h", "cpp", "hpp", "cs", "rb",
    "php", "html", "css", "scss", "json", "yaml", "yml", "toml", "md", "txt", "sh", "sql",
];

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn fence_language(line: &str) -> Option<String> {
    let tag = line.trim_start().trim_start_matches('`').trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

fn default_file_name(language: &str) -> String {
    let lower = language.to_ascii_lowercase();
    let ext = match lower.as_str() {
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        "rust" => "rs",
        "shell" | "bash" => "sh",
        other => other,
    };
    format!("default.{ext}")
}

fn looks_like_relative_path(candidate: &str) -> bool {
    if candidate.is_empty() {
        return false;
    }
    if let Some((_, last)) = candidate.rsplit_once('/') {
        return last.contains('.');
    }
    // No slash: only accept names with a known source extension, so single
    // prose words never match.
    candidate
        .rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

/// `// file: path` or `# file: path` at the start of a line. These markers may
/// introduce bare (unfenced) file content.
fn detect_comment_marker(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix('#'))?
        .trim_start();
    for pat in ["file:", "File:", "FILE:"] {
        if let Some(path) = rest.strip_prefix(pat) {
            let path = path.trim().trim_matches('`').trim();
            if !path.is_empty() {
                return Some(path.to_string());
            }
        }
    }
    None
}

/// Best-effort detection of a file-path marker in a prose line. This is a
/// heuristic over free-form model output; `File:`-style prefixes and bare
/// relative paths are recognized, ordinary sentences are not.
fn detect_path_marker(line: &str) -> Option<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.contains("```") {
        return None;
    }
    for pat in ["File:", "file:", "FILE:"] {
        if let Some(pos) = trimmed.find(pat) {
            // Word boundary guard so keys like `profile:` do not match.
            let boundary = pos == 0 || !trimmed.as_bytes()[pos - 1].is_ascii_alphanumeric();
            if boundary {
                let rest = trimmed[pos + pat.len()..]
                    .trim()
                    .trim_matches('*')
                    .trim()
                    .trim_matches('`')
                    .trim();
                if !rest.is_empty() && !rest.chars().any(char::is_whitespace) {
                    return Some(rest.to_string());
                }
            }
        }
    }
    let candidate = trimmed.trim_matches('`').trim_end_matches(':');
    if !candidate.chars().any(char::is_whitespace) && looks_like_relative_path(candidate) {
        return Some(candidate.to_string());
    }
    None
}

/// Scan response text for file content.
///
/// Two shapes are recognized: a fenced code block with a path marker on a
/// nearby preceding line (or a language tag that falls back to a
/// `default.<ext>` name), and a `// file:` / `# file:` comment marker followed
/// by bare lines up to the next marker or fence. Unterminated fences are
/// dropped.
pub fn parse_code_blocks(text: &str) -> Vec<CodeBlock> {
    let lines: Vec<&str> = text.lines().collect();
    let mut blocks = Vec::new();
    let mut pending_path: Option<String> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_fence(line) {
            let language = fence_language(line);
            let path = pending_path
                .take()
                .or_else(|| language.as_deref().map(default_file_name));
            let mut code = String::new();
            let mut closed = false;
            i += 1;
            while i < lines.len() {
                if is_fence(lines[i]) {
                    closed = true;
                    i += 1;
                    break;
                }
                code.push_str(lines[i]);
                code.push('\n');
                i += 1;
            }
            if closed && !code.trim().is_empty() {
                blocks.push(CodeBlock { path, language, code });
            }
            continue;
        }

        if let Some(path) = detect_comment_marker(line) {
            // Peek past blank lines; a fence next means the marker names the
            // fenced block instead of bare content.
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            if j < lines.len() && is_fence(lines[j]) {
                pending_path = Some(path);
                i += 1;
                continue;
            }
            let mut code = String::new();
            i += 1;
            while i < lines.len()
                && !is_fence(lines[i])
                && detect_comment_marker(lines[i]).is_none()
                && detect_path_marker(lines[i]).is_none()
            {
                code.push_str(lines[i]);
                code.push('\n');
                i += 1;
            }
            if !code.trim().is_empty() {
                blocks.push(CodeBlock {
                    path: Some(path),
                    language: None,
                    code,
                });
            }
            continue;
        }

        if let Some(path) = detect_path_marker(line) {
            pending_path = Some(path);
        }
        i += 1;
    }

    blocks
}

/// Recover directory paths from a "directory structure" section, stripping
/// tree-drawing glyphs. Entries that look like files are ignored.
pub fn extract_structure_dirs(text: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut in_section = false;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if ["directory structure", "file structure", "project structure"]
            .iter()
            .any(|marker| lower.contains(marker))
        {
            in_section = true;
            continue;
        }
        if in_section && (line.trim().is_empty() || line.contains("##")) {
            in_section = false;
        }
        if !in_section {
            continue;
        }

        let cleaned = line
            .replace("└── ", "")
            .replace("├── ", "")
            .replace("│   ", "")
            .replace('│', "");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() || cleaned.starts_with('-') {
            continue;
        }
        if cleaned.contains('/') || cleaned.contains('\\') {
            dirs.push(cleaned.trim_end_matches(['/', '\\']).to_string());
        } else if !cleaned.contains('.') {
            dirs.push(cleaned.to_string());
        }
    }

    dirs
}

/// Normalize a raw extracted path into a safe path relative to the output
/// directory. Absolute and drive-letter paths are reduced to their file name;
/// `..` components are rejected outright.
pub fn sanitize_path(raw: &str) -> Option<String> {
    let cleaned = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim();
    if cleaned.is_empty() {
        return None;
    }
    let mut cleaned = cleaned.replace('\\', "/");

    let drive_letter = cleaned.len() > 1 && cleaned.as_bytes()[1] == b':';
    if cleaned.starts_with('/') || drive_letter {
        cleaned = cleaned.rsplit('/').next().unwrap_or_default().to_string();
        if let Some((_, rest)) = cleaned.rsplit_once(':') {
            cleaned = rest.to_string();
        }
    }

    let parts: Vec<&str> = cleaned
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    if parts.is_empty() || parts.iter().any(|part| *part == "..") {
        return None;
    }
    Some(parts.join("/"))
}

enum WriteOutcome {
    Written,
    Unchanged,
}

/// Turns extracted (path, content) pairs into files under the output
/// directory and records them in the registry.
pub struct Materializer {
    output_dir: PathBuf,
}

impl Materializer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn ensure_output_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.output_dir)
    }

    /// Materialize one response. Per-file failures become warnings and the
    /// rest of the round continues; there is no transactional guarantee.
    pub fn materialize(
        &self,
        text: &str,
        registry: &mut FileRegistry,
        round: u32,
    ) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        for dir in extract_structure_dirs(text) {
            let Some(rel) = sanitize_path(&dir) else {
                continue;
            };
            // A dotted final segment is a file, not a directory to create.
            if rel.rsplit('/').next().is_some_and(|last| last.contains('.')) {
                continue;
            }
            match fs::create_dir_all(self.output_dir.join(&rel)) {
                Ok(()) => report.dirs_created.push(rel),
                Err(err) => report
                    .warnings
                    .push(format!("could not create directory {rel}: {err}")),
            }
        }

        for block in parse_code_blocks(text) {
            let Some(raw) = block.path.as_deref() else {
                report
                    .warnings
                    .push("code block without a file path skipped".to_string());
                continue;
            };
            let Some(rel) = sanitize_path(raw) else {
                report
                    .warnings
                    .push(format!("unusable file path skipped: {raw:?}"));
                continue;
            };
            match self.write_file(&rel, &block.code) {
                Ok(WriteOutcome::Written) => {
                    registry.record(&rel, block.code.len(), round);
                    report.written.push(rel);
                }
                Ok(WriteOutcome::Unchanged) => {
                    registry.record(&rel, block.code.len(), round);
                    report.unchanged.push(rel);
                }
                Err(err) => report.warnings.push(format!("could not write {rel}: {err}")),
            }
        }

        report
    }

    fn write_file(&self, rel: &str, code: &str) -> io::Result<WriteOutcome> {
        let full = self.output_dir.join(rel);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        if full.exists() {
            if let Ok(existing) = fs::read_to_string(&full) {
                if existing == code {
                    return Ok(WriteOutcome::Unchanged);
                }
            }
        }
        fs::write(&full, code)?;
        Ok(WriteOutcome::Written)
    }
}
