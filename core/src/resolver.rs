//! Upload resolution: on submit, every tag still holding a local file is
//! uploaded and rewritten in place with its server-issued id.
//!
//! One submission is in flight per session at a time. Uploads run
//! sequentially in segment order — ordering does not affect correctness,
//! deterministic order aids debugging and test reproducibility. A failed
//! upload aborts the run immediately and earlier rewrites stay in place;
//! callers retry the whole editor state, partially-resolved tags cannot be
//! told apart from user edits after the fact.

use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use composer_protocol::EditorContent;
use composer_protocol::FileHandle;
use composer_protocol::SessionId;
use composer_protocol::Tag;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::registry::TagLookup;
use crate::submission::SubmitValidationError;
use crate::submission::validate_for_submission;

/// Server-issued identity of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedResource {
    pub resource_id: String,
    pub name: String,
    pub size: u64,
}

/// External upload collaborator. Failures are propagated unmodified.
#[async_trait]
pub trait UploadOperation: Send + Sync {
    async fn upload(
        &self,
        session: SessionId,
        file: &FileHandle,
        tag_ids: &[String],
    ) -> anyhow::Result<UploadedResource>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("a submission for session {session} is already resolving")]
    SubmissionInFlight { session: SessionId },
    #[error(transparent)]
    Invalid(#[from] SubmitValidationError),
    #[error("submission cancelled")]
    Cancelled,
    #[error("upload failed: {0}")]
    Upload(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Actual upload calls made; shared files upload once, re-running on
    /// fully resolved content uploads zero times.
    pub uploads_performed: usize,
}

pub struct UploadResolver {
    uploads: Arc<dyn UploadOperation>,
    in_flight: Mutex<HashSet<SessionId>>,
}

impl UploadResolver {
    pub fn new(uploads: Arc<dyn UploadOperation>) -> Self {
        Self {
            uploads,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve every pending tag in `content`, rewriting ids in place and
    /// re-keying the registry. Temp ids become unreachable once rewritten
    /// and must not be re-queried.
    pub async fn resolve(
        &self,
        session: SessionId,
        content: &mut EditorContent,
        registry: &dyn TagLookup,
        cancel: CancellationToken,
    ) -> Result<ResolveOutcome, ResolveError> {
        let _guard = FlightGuard::acquire(&self.in_flight, session)?;
        validate_for_submission(content)?;

        let mut resolved_by_path: HashMap<PathBuf, UploadedResource> = HashMap::new();
        let mut uploads_performed = 0usize;

        for tag in content.tags_mut() {
            match tag {
                Tag::Resource(resource) if resource.is_pending => {
                    // Invariant: pending implies the file handle is present.
                    let Some(file) = resource.pending_file.clone() else {
                        continue;
                    };
                    let uploaded = self
                        .upload_or_reuse(
                            session,
                            &file,
                            &[resource.id.clone()],
                            &mut resolved_by_path,
                            &mut uploads_performed,
                            &cancel,
                        )
                        .await?;
                    let old_id = std::mem::replace(&mut resource.id, uploaded.resource_id);
                    resource.name = uploaded.name;
                    resource.pending_file = None;
                    resource.is_pending = false;
                    registry.remove(&old_id);
                    registry.put(Tag::Resource(resource.clone()));
                    tracing::debug!("resource tag {old_id} resolved to {}", resource.id);
                }
                Tag::Command(command) if command.pending_files.source_image.is_some() => {
                    let Some(file) = command.pending_files.source_image.clone() else {
                        continue;
                    };
                    let uploaded = self
                        .upload_or_reuse(
                            session,
                            &file,
                            &[command.id.clone()],
                            &mut resolved_by_path,
                            &mut uploads_performed,
                            &cancel,
                        )
                        .await?;
                    command.config.source_image = Some(uploaded.resource_id);
                    command.pending_files.source_image = None;
                    if command.pending_files.is_empty() {
                        command.is_pending = false;
                    }
                    registry.put(Tag::Command(command.clone()));
                    tracing::debug!("command tag {} source image resolved", command.id);
                }
                _ => {}
            }
        }

        Ok(ResolveOutcome { uploads_performed })
    }

    async fn upload_or_reuse(
        &self,
        session: SessionId,
        file: &FileHandle,
        tag_ids: &[String],
        resolved_by_path: &mut HashMap<PathBuf, UploadedResource>,
        uploads_performed: &mut usize,
        cancel: &CancellationToken,
    ) -> Result<UploadedResource, ResolveError> {
        // One upload per distinct file identity; later tags bound to the
        // same path reuse the id.
        if let Some(existing) = resolved_by_path.get(&file.path) {
            tracing::debug!(
                "reusing uploaded id {} for {}",
                existing.resource_id,
                file.path.display()
            );
            return Ok(existing.clone());
        }
        if cancel.is_cancelled() {
            return Err(ResolveError::Cancelled);
        }
        let uploaded = self
            .uploads
            .upload(session, file, tag_ids)
            .await
            .map_err(ResolveError::Upload)?;
        *uploads_performed += 1;
        resolved_by_path.insert(file.path.clone(), uploaded.clone());
        Ok(uploaded)
    }
}

/// Single-flight guard: released on drop, including the error paths.
struct FlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<SessionId>>,
    session: SessionId,
}

impl<'a> FlightGuard<'a> {
    fn acquire(
        in_flight: &'a Mutex<HashSet<SessionId>>,
        session: SessionId,
    ) -> Result<Self, ResolveError> {
        let mut sessions = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !sessions.insert(session) {
            return Err(ResolveError::SubmissionInFlight { session });
        }
        Ok(Self { in_flight, session })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        let mut sessions = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sessions.remove(&self.session);
    }
}
