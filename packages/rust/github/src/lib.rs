//! Source-of-truth version control for glossary documents.
//!
//! [`SourceControl`] is the capability set the workflow consumes: file reads
//! with a version token, branch refs, conditional writes, and pull requests.
//! [`GitHubClient`] implements it over the GitHub REST API.

mod client;

use async_trait::async_trait;

use takeaways_shared::{ChangeRequest, Result};

pub use client::{GitHubClient, GitHubOptions};

/// A file read from a branch, with the token needed to overwrite it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded UTF-8 content.
    pub content: String,
    /// Opaque version token (the blob SHA on GitHub).
    pub version: String,
}

/// A conditional file write.
#[derive(Debug, Clone, Copy)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub branch: &'a str,
    /// The write must fail with `Conflict` if the file's version differs.
    pub expected_version: &'a str,
    pub message: &'a str,
}

/// A pull request to open.
#[derive(Debug, Clone, Copy)]
pub struct NewChangeRequest<'a> {
    pub branch: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

/// Version-control operations used by the patch and publish steps.
///
/// Missing files are reported as `NotFound`; version mismatches on write as
/// `Conflict`; other HTTP statuses as `Http`; transport failures as `Network`.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Read `path` at `git_ref` (branch name or SHA).
    async fn get_file(&self, path: &str, git_ref: &str) -> Result<RemoteFile>;

    /// Resolve the tip SHA of `branch`.
    async fn get_ref(&self, branch: &str) -> Result<String>;

    /// Create `branch` pointing at `from_sha`.
    async fn create_ref(&self, branch: &str, from_sha: &str) -> Result<()>;

    /// Write a file on a branch, conditioned on its current version.
    async fn put_file(&self, write: &FileWrite<'_>) -> Result<()>;

    /// Open a pull request.
    async fn open_change_request(&self, request: &NewChangeRequest<'_>) -> Result<ChangeRequest>;

    /// Close a pull request without merging.
    async fn close_change_request(&self, number: u64) -> Result<()>;

    /// Delete `branch`.
    async fn delete_ref(&self, branch: &str) -> Result<()>;
}
