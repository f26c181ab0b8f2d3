pub mod types;

pub use types::{RepoUrl, RepositorySnapshot, SourceInput};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

use crate::config::LimitsConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read repository: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk repository: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),
}

/// Directories that never hold first-party source.
const SKIPPED_DIRS: &[&str] = &[
    "target", "node_modules", "vendor", "dist", "build", "__pycache__", "venv",
];

/// Parse a GitHub repository URL.
/// Expected format: https://github.com/{owner}/{repo}, optionally ending in `.git`.
pub fn parse_repo_url(url: &str) -> Result<RepoUrl, SourceError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| SourceError::InvalidUrl(url.to_string()))?;

    if parsed.host_str() != Some("github.com") {
        return Err(SourceError::InvalidUrl(url.to_string()));
    }

    let segments: Vec<_> = parsed
        .path_segments()
        .ok_or_else(|| SourceError::InvalidUrl(url.to_string()))?
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments.len() != 2 {
        return Err(SourceError::InvalidUrl(url.to_string()));
    }

    Ok(RepoUrl {
        owner: segments[0].to_string(),
        repo: segments[1].trim_end_matches(".git").to_string(),
    })
}

/// Language tag for a file path, or None for files that are not source.
pub fn language_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "scala" => "scala",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "dart" => "dart",
        "rb" => "ruby",
        "sh" | "bash" | "zsh" => "shell",
        _ => return None,
    };
    Some(language)
}

fn is_readme(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("readme"))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a file, replacing invalid UTF-8 instead of failing.
fn read_lossy(path: &Path) -> Result<String, SourceError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Build a snapshot from a local checkout.
///
/// Walks `root` in path order, picks up the top-level README and every file
/// with a known source extension. Files above `limits.max_file_bytes` are
/// skipped. Non-UTF-8 content is decoded lossily so the engine still sees it.
#[instrument(skip(limits), fields(root = %root.display()))]
pub fn load_directory(
    root: &Path,
    url: Option<&str>,
    limits: &LimitsConfig,
) -> Result<RepositorySnapshot, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::NotADirectory(root.to_path_buf()));
    }

    let name = match url {
        Some(url) => parse_repo_url(url)?.full_name(),
        None => root
            .canonicalize()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_string()),
    };

    let mut readme = None;
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        if readme.is_none() && entry.depth() == 1 && is_readme(path) {
            readme = Some(read_lossy(path)?);
            continue;
        }

        let Some(language) = language_for_path(path) else {
            continue;
        };
        let size = entry.metadata()?.len();
        if size > limits.max_file_bytes {
            debug!(path = %path.display(), size, "skipping oversized file");
            continue;
        }

        files.push(SourceInput {
            path: relative_path(root, path),
            language: language.to_string(),
            text: read_lossy(path)?,
        });
    }

    debug!(files = files.len(), has_readme = readme.is_some(), "loaded repository");
    Ok(RepositorySnapshot {
        name,
        url: url.map(str::to_string),
        readme,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_valid_repo_url() {
        let url = parse_repo_url("https://github.com/org/repo").unwrap();
        assert_eq!(url.owner, "org");
        assert_eq!(url.repo, "repo");

        let url = parse_repo_url("https://github.com/org/repo.git/").unwrap();
        assert_eq!(url.repo, "repo");
    }

    #[test]
    fn test_parse_invalid_repo_url() {
        assert!(parse_repo_url("https://example.com/org/repo").is_err());
        assert!(parse_repo_url("not-a-url").is_err());
        assert!(parse_repo_url("https://github.com/org").is_err());
        assert!(parse_repo_url("https://github.com/org/repo/pull/42").is_err());
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("src/main.rs")), Some("rust"));
        assert_eq!(language_for_path(Path::new("app/View.TSX")), Some("typescript"));
        assert_eq!(language_for_path(Path::new("README.md")), None);
        assert_eq!(language_for_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("README.md"), "# Demo").unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/util.py"), "def f():\n    pass\n").unwrap();
        fs::write(root.join("notes.txt"), "not source").unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::write(root.join("target/debug/gen.rs"), "fn gen() {}\n").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/hook.sh"), "echo hi\n").unwrap();

        let snapshot = load_directory(root, None, &LimitsConfig::default()).unwrap();
        assert_eq!(snapshot.readme.as_deref(), Some("# Demo"));
        let paths: Vec<&str> = snapshot.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/main.rs", "src/util.py"]);
        assert_eq!(snapshot.files[1].language, "python");
        assert!(snapshot.url.is_none());
    }

    #[test]
    fn test_load_directory_uses_url_name_and_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("big.rs"), "x".repeat(64)).unwrap();
        fs::write(dir.path().join("small.rs"), "fn a() {}").unwrap();
        let limits = LimitsConfig {
            max_file_bytes: 32,
            ..LimitsConfig::default()
        };

        let snapshot =
            load_directory(dir.path(), Some("https://github.com/org/demo"), &limits).unwrap();
        assert_eq!(snapshot.name, "org/demo");
        assert!(snapshot.readme.is_none());
        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].path, "small.rs");
    }

    #[test]
    fn test_load_directory_decodes_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), b"# Caf\xe9\n").unwrap();
        fs::write(dir.path().join("lib.rs"), b"// \xff\nfn a() {}\n").unwrap();

        let snapshot = load_directory(dir.path(), None, &LimitsConfig::default()).unwrap();
        assert_eq!(snapshot.readme.as_deref(), Some("# Caf\u{FFFD}\n"));
        assert_eq!(snapshot.files.len(), 1);
        assert!(snapshot.files[0].text.contains("fn a()"));
    }

    #[test]
    fn test_load_directory_rejects_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.rs");
        fs::write(&file, "").unwrap();
        assert!(matches!(
            load_directory(&file, None, &LimitsConfig::default()),
            Err(SourceError::NotADirectory(_))
        ));
    }
}
