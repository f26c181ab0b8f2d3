/// One file handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Language tag (e.g. "rust", "python")
    pub language: String,
    /// Raw file contents
    pub text: String,
}

/// Immutable input for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// Display name, `owner/repo` when a URL was given
    pub name: String,
    /// Repository URL, if known
    pub url: Option<String>,
    /// README contents, if the repository has one
    pub readme: Option<String>,
    /// Source files in path order
    pub files: Vec<SourceInput>,
}

/// Parsed components of a GitHub repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub owner: String,
    pub repo: String,
}

impl RepoUrl {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
