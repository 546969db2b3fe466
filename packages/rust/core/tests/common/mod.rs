//! Shared test infrastructure for the workflow integration tests.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use takeaways_core::DocumentLocation;
use takeaways_frontmatter::content_digest;
use takeaways_github::{FileWrite, NewChangeRequest, RemoteFile, SourceControl};
use takeaways_provider::{Generation, GenerationRequest, TextGenerator, TokenUsage};
use takeaways_shared::{
    ChangeRequest, GlossaryConfig, ProgressSink, Result, TakeawaysError, TaskStatus,
};

pub const MAIN: &str = "main";
pub const DOC_PATH: &str = "apps/www/content/glossary/mime-types.mdx";

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

/// The glossary document fixture.
pub fn glossary_document() -> String {
    std::fs::read_to_string(fixtures_dir().join("glossary/mime-types.mdx"))
        .expect("read glossary fixture")
}

/// A complete generated takeaways value.
pub fn full_takeaways() -> Value {
    let raw = std::fs::read_to_string(fixtures_dir().join("takeaways/mime-types.json"))
        .expect("read takeaways fixture");
    serde_json::from_str(&raw).expect("parse takeaways fixture")
}

pub fn location() -> DocumentLocation {
    DocumentLocation {
        glossary: GlossaryConfig::default(),
        base_branch: MAIN.to_string(),
    }
}

/// Keep only the parts of `value` that `schema` (a JSON Schema) describes.
pub fn project(value: &Value, schema: &Value) -> Value {
    match (value, schema.get("type").and_then(Value::as_str)) {
        (Value::Object(map), Some("object")) => {
            let properties = schema.get("properties").and_then(Value::as_object);
            let kept = map
                .iter()
                .filter_map(|(k, v)| {
                    let sub = properties?.get(k)?;
                    Some((k.clone(), project(v, sub)))
                })
                .collect();
            Value::Object(kept)
        }
        (Value::Array(items), Some("array")) => {
            let item_schema = schema.get("items").cloned().unwrap_or(Value::Null);
            Value::Array(items.iter().map(|v| project(v, &item_schema)).collect())
        }
        _ => value.clone(),
    }
}

// ---------------------------------------------------------------------------
// Text generator
// ---------------------------------------------------------------------------

enum Script {
    /// Answer with the fixture projected onto the requested schema.
    Fixture,
    /// Always answer with this value.
    Fixed(Value),
    /// Always fail with a network error.
    Fail(String),
}

/// A generator that answers like a well-behaved structured-output model.
pub struct ScriptedGenerator {
    script: Script,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn from_fixture() -> Self {
        Self::with(Script::Fixture)
    }

    pub fn fixed(value: Value) -> Self {
        Self::with(Script::Fixed(value))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Script::Fail(message.to_string()))
    }

    fn with(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        self.requests.lock().unwrap().push(request.clone());
        let value = match &self.script {
            Script::Fixture => project(&full_takeaways(), &request.schema),
            Script::Fixed(value) => value.clone(),
            Script::Fail(message) => return Err(TakeawaysError::Network(message.clone())),
        };
        Ok(Generation {
            value,
            usage: Some(TokenUsage {
                prompt_tokens: 200,
                completion_tokens: 100,
                total_tokens: 300,
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Source control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub branch: String,
    pub base: String,
    pub title: String,
    pub body: String,
    pub open: bool,
}

#[derive(Default)]
struct RepoState {
    /// Branch name → tip commit id.
    branches: HashMap<String, String>,
    /// (branch, path) → content.
    files: HashMap<(String, String), String>,
    pulls: BTreeMap<u64, PullRequest>,
    commits: u64,
    failing: HashSet<&'static str>,
    /// Applied to `main` right after the next `get_file` answers.
    after_read: Option<(String, String)>,
    log: Vec<&'static str>,
}

impl RepoState {
    fn commit(&mut self, branch: &str) {
        self.commits += 1;
        self.branches
            .insert(branch.to_string(), format!("commit-{}", self.commits));
    }

    fn enter(&mut self, op: &'static str) -> Result<()> {
        self.log.push(op);
        if self.failing.contains(op) {
            return Err(TakeawaysError::Network(format!("injected failure: {op}")));
        }
        Ok(())
    }
}

/// An in-memory repository with GitHub-like semantics.
///
/// File versions are the SHA-256 digest of their content.
pub struct MemoryRepository {
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    /// A repository whose `main` branch holds `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let mut state = RepoState::default();
        state.commit(MAIN);
        for (path, content) in files {
            state
                .files
                .insert((MAIN.to_string(), path.to_string()), content.to_string());
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// A repository holding the glossary document fixture.
    pub fn with_glossary() -> Self {
        Self::with_files(&[(DOC_PATH, glossary_document().as_str())])
    }

    /// Make the named operation fail with a network error.
    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    /// Simulate a concurrent commit to `main` landing right after the next read.
    pub fn modify_after_next_read(&self, path: &str, content: &str) {
        self.state.lock().unwrap().after_read = Some((path.to_string(), content.to_string()));
    }

    /// Commit `content` to `path` on `branch` directly.
    pub fn commit_file(&self, branch: &str, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .insert((branch.to_string(), path.to_string()), content.to_string());
        state.commit(branch);
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(&(branch.to_string(), path.to_string()))
            .cloned()
    }

    pub fn branches(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state.branches.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn pull(&self, number: u64) -> Option<PullRequest> {
        self.state.lock().unwrap().pulls.get(&number).cloned()
    }

    pub fn pull_count(&self) -> usize {
        self.state.lock().unwrap().pulls.len()
    }

    /// Every operation invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().log.clone()
    }
}

#[async_trait]
impl SourceControl for MemoryRepository {
    async fn get_file(&self, path: &str, git_ref: &str) -> Result<RemoteFile> {
        let mut state = self.state.lock().unwrap();
        state.enter("get_file")?;
        let content = state
            .files
            .get(&(git_ref.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| TakeawaysError::not_found(path))?;

        if let Some((changed_path, changed)) = state.after_read.take() {
            state.files.insert((MAIN.to_string(), changed_path), changed);
            state.commit(MAIN);
        }

        Ok(RemoteFile {
            version: content_digest(&content),
            content,
        })
    }

    async fn get_ref(&self, branch: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.enter("get_ref")?;
        state
            .branches
            .get(branch)
            .cloned()
            .ok_or_else(|| TakeawaysError::http(404, format!("no branch {branch}")))
    }

    async fn create_ref(&self, branch: &str, from_sha: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("create_ref")?;
        if state.branches.contains_key(branch) {
            return Err(TakeawaysError::http(
                422,
                format!("Reference already exists: {branch}"),
            ));
        }
        let source = state
            .branches
            .iter()
            .find(|(_, sha)| sha.as_str() == from_sha)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| TakeawaysError::http(422, format!("unknown sha {from_sha}")))?;

        let copied: Vec<((String, String), String)> = state
            .files
            .iter()
            .filter(|((b, _), _)| *b == source)
            .map(|((_, p), c)| ((branch.to_string(), p.clone()), c.clone()))
            .collect();
        state.files.extend(copied);
        state
            .branches
            .insert(branch.to_string(), from_sha.to_string());
        Ok(())
    }

    async fn put_file(&self, write: &FileWrite<'_>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("put_file")?;
        if !state.branches.contains_key(write.branch) {
            return Err(TakeawaysError::http(
                404,
                format!("no branch {}", write.branch),
            ));
        }
        let key = (write.branch.to_string(), write.path.to_string());
        let current = state.files.get(&key).map(|c| content_digest(c));
        if current.as_deref() != Some(write.expected_version) {
            return Err(TakeawaysError::conflict(write.path));
        }
        state.files.insert(key, write.content.to_string());
        state.commit(write.branch);
        Ok(())
    }

    async fn open_change_request(&self, request: &NewChangeRequest<'_>) -> Result<ChangeRequest> {
        let mut state = self.state.lock().unwrap();
        state.enter("open_change_request")?;
        if !state.branches.contains_key(request.branch) {
            return Err(TakeawaysError::http(
                422,
                format!("no branch {}", request.branch),
            ));
        }
        let number = state.pulls.len() as u64 + 1;
        state.pulls.insert(
            number,
            PullRequest {
                branch: request.branch.to_string(),
                base: request.base.to_string(),
                title: request.title.to_string(),
                body: request.body.to_string(),
                open: true,
            },
        );
        Ok(ChangeRequest {
            number,
            url: format!("https://github.test/unkeyed/unkey/pull/{number}"),
        })
    }

    async fn close_change_request(&self, number: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("close_change_request")?;
        match state.pulls.get_mut(&number) {
            Some(pull) => {
                pull.open = false;
                Ok(())
            }
            None => Err(TakeawaysError::http(404, format!("no pull request {number}"))),
        }
    }

    async fn delete_ref(&self, branch: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.enter("delete_ref")?;
        if state.branches.remove(branch).is_none() {
            return Err(TakeawaysError::http(
                422,
                format!("Reference does not exist: {branch}"),
            ));
        }
        state.files.retain(|(b, _), _| b != branch);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Progress(f64),
    Status(TaskStatus),
    Error(String),
    Metric(String, f64),
}

/// Records every progress event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<Event>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Progress(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<TaskStatus> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn set_progress(&self, fraction: f64) {
        self.events.lock().unwrap().push(Event::Progress(fraction));
    }

    fn set_status(&self, status: TaskStatus) {
        self.events.lock().unwrap().push(Event::Status(status));
    }

    fn record_error(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Error(message.to_string()));
    }

    fn record_metric(&self, name: &str, value: f64) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Metric(name.to_string(), value));
    }
}
