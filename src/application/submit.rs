//! Feedback submission use case

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::domain::audio::AudioMimeType;
use crate::domain::comment::{Comment, CommentBody, NewComment, TimestampRef};

use super::ports::{
    CaptureDevice, CommentError, CommentGateway, Identity, IdentityError, ObjectStore, StoreError,
};
use super::recorder::RecorderService;

/// Errors from the submission use case
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("No finished recording to submit")]
    NothingToSubmit,

    #[error("A submission is already in flight")]
    AlreadyInFlight,

    #[error("Comment text is empty")]
    EmptyComment,

    #[error("Upload failed: {0}")]
    Store(#[from] StoreError),

    #[error("Posting the comment failed: {0}")]
    Comment(#[from] CommentError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// What the comment is attached to
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    /// The post the feedback belongs to
    pub post_id: String,
    /// Optional moment in the performance video the feedback points at
    pub timestamp_reference: Option<TimestampRef>,
}

/// Bridges a finished recording to the object store and comment gateway.
///
/// Submission is single-flight: while one upload is outstanding a second
/// call is rejected instead of issuing a duplicate. On failure the
/// recorder keeps its artifact so the user can retry; only a fully posted
/// comment clears the take.
pub struct SubmitFeedbackUseCase<S, G, I>
where
    S: ObjectStore,
    G: CommentGateway,
    I: Identity,
{
    store: S,
    gateway: G,
    identity: I,
    in_flight: AtomicBool,
}

impl<S, G, I> SubmitFeedbackUseCase<S, G, I>
where
    S: ObjectStore,
    G: CommentGateway,
    I: Identity,
{
    /// Create a new submission use case
    pub fn new(store: S, gateway: G, identity: I) -> Self {
        Self {
            store,
            gateway,
            identity,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Upload the recorder's finalized artifact and post it as an audio
    /// comment. Clears the recorder on success.
    pub async fn submit_recording<D: CaptureDevice>(
        &self,
        recorder: &RecorderService<D>,
        request: &SubmitRequest,
    ) -> Result<Comment, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SubmitError::AlreadyInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let artifact = recorder.artifact().ok_or(SubmitError::NothingToSubmit)?;
        let user = self.identity.current_user().await?;

        let key = artifact_key(&user.id, artifact.content_type());
        let url = self
            .store
            .store(&key, artifact.data().to_vec(), artifact.content_type())
            .await?;

        let comment = self
            .gateway
            .post(&NewComment {
                post_id: request.post_id.clone(),
                author: user.handle(),
                body: CommentBody::Audio { url },
                timestamp_reference: request.timestamp_reference,
            })
            .await?;

        recorder.clear().await;
        Ok(comment)
    }

    /// Post a written comment
    pub async fn post_text(
        &self,
        post_id: &str,
        text: &str,
        timestamp_reference: Option<TimestampRef>,
    ) -> Result<Comment, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyComment);
        }

        let user = self.identity.current_user().await?;
        self.gateway
            .post(&NewComment {
                post_id: post_id.to_string(),
                author: user.handle(),
                body: CommentBody::Text(text.to_string()),
                timestamp_reference,
            })
            .await
            .map_err(Into::into)
    }
}

/// Builds the storage key an uploaded take is filed under, namespaced by
/// the submitting user.
fn artifact_key(user_id: &str, content_type: AudioMimeType) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!(
        "{}/audio-comment-{}.{}",
        user_id,
        millis,
        content_type.extension()
    )
}

/// Releases the single-flight guard on every exit path, so a failed
/// submission never leaves the use case stuck in flight.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CaptureError, CaptureHandle, OpenCapture, UserProfile,
    };
    use crate::domain::recording::TakePhase;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc;

    struct OneTakeDevice {
        chunks: Vec<Vec<u8>>,
    }

    struct OneTakeHandle {
        sender: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    }

    #[async_trait]
    impl CaptureHandle for OneTakeHandle {
        async fn close(&self) -> Result<(), CaptureError> {
            self.sender.lock().unwrap().take();
            Ok(())
        }
    }

    #[async_trait]
    impl CaptureDevice for OneTakeDevice {
        async fn open(&self) -> Result<OpenCapture, CaptureError> {
            let (tx, rx) = mpsc::unbounded_channel();
            for chunk in &self.chunks {
                let _ = tx.send(chunk.clone());
            }
            Ok(OpenCapture {
                content_type: AudioMimeType::Flac,
                chunks: rx,
                handle: Box::new(OneTakeHandle {
                    sender: StdMutex::new(Some(tx)),
                }),
            })
        }
    }

    /// Store that counts invocations and resolves after a configurable delay
    struct CountingStore {
        calls: Arc<AtomicUsize>,
        delay: StdDuration,
        fail: bool,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn store(
            &self,
            key: &str,
            _bytes: Vec<u8>,
            content_type: AudioMimeType,
        ) -> Result<String, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(StoreError::RequestFailed("connection reset".into()));
            }
            Ok(format!(
                "https://cdn.example.com/{}?type={}",
                key, content_type
            ))
        }
    }

    struct EchoGateway;

    #[async_trait]
    impl CommentGateway for EchoGateway {
        async fn post(&self, comment: &NewComment) -> Result<Comment, CommentError> {
            Ok(Comment {
                id: "c1".into(),
                post_id: comment.post_id.clone(),
                author: comment.author.clone(),
                body: comment.body.clone(),
                timestamp_reference: comment.timestamp_reference,
                likes: 0,
                created_at: None,
            })
        }

        async fn list(&self, _post_id: &str) -> Result<Vec<Comment>, CommentError> {
            Ok(Vec::new())
        }
    }

    struct FixedIdentity;

    #[async_trait]
    impl Identity for FixedIdentity {
        async fn current_user(&self) -> Result<UserProfile, IdentityError> {
            Ok(UserProfile {
                id: "user-1".into(),
                email: Some("sarah@example.com".into()),
            })
        }
    }

    async fn stopped_recorder(sizes: &[usize]) -> RecorderService<OneTakeDevice> {
        let recorder = RecorderService::new(
            OneTakeDevice {
                chunks: sizes.iter().map(|&n| vec![0u8; n]).collect(),
            },
            300,
        );
        recorder.start().await.unwrap();
        recorder.stop().await.unwrap();
        recorder
    }

    fn request() -> SubmitRequest {
        SubmitRequest {
            post_id: "post-1".into(),
            timestamp_reference: Some(TimestampRef::from_secs(84)),
        }
    }

    #[tokio::test]
    async fn successful_submission_posts_and_clears() {
        let calls = Arc::new(AtomicUsize::new(0));
        let use_case = SubmitFeedbackUseCase::new(
            CountingStore {
                calls: Arc::clone(&calls),
                delay: StdDuration::ZERO,
                fail: false,
            },
            EchoGateway,
            FixedIdentity,
        );
        let recorder = stopped_recorder(&[10, 20, 15]).await;
        assert_eq!(recorder.artifact().unwrap().size_bytes(), 45);

        let comment = use_case
            .submit_recording(&recorder, &request())
            .await
            .unwrap();

        assert_eq!(comment.author, "sarah");
        assert!(matches!(comment.body, CommentBody::Audio { ref url } if url.contains("user-1/audio-comment-")));
        assert_eq!(comment.timestamp_reference, Some(TimestampRef::from_secs(84)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // The recorder resets only after the comment is fully posted
        assert_eq!(recorder.phase(), TakePhase::Idle);
        assert_eq!(recorder.elapsed_secs(), 0);
    }

    #[tokio::test]
    async fn failed_upload_preserves_the_artifact_for_retry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let use_case = SubmitFeedbackUseCase::new(
            CountingStore {
                calls: Arc::clone(&calls),
                delay: StdDuration::ZERO,
                fail: true,
            },
            EchoGateway,
            FixedIdentity,
        );
        let recorder = stopped_recorder(&[5, 5]).await;

        let err = use_case
            .submit_recording(&recorder, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));

        assert_eq!(recorder.phase(), TakePhase::Stopped);
        assert_eq!(recorder.artifact().unwrap().size_bytes(), 10);

        // The guard is released, so a retry reaches the store again
        let err = use_case
            .submit_recording(&recorder, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_submission_while_pending_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let use_case = Arc::new(SubmitFeedbackUseCase::new(
            CountingStore {
                calls: Arc::clone(&calls),
                delay: StdDuration::from_millis(100),
                fail: false,
            },
            EchoGateway,
            FixedIdentity,
        ));
        let recorder = Arc::new(stopped_recorder(&[8]).await);

        let first = {
            let use_case = Arc::clone(&use_case);
            let recorder = Arc::clone(&recorder);
            tokio::spawn(async move { use_case.submit_recording(&recorder, &request()).await })
        };

        tokio::time::sleep(StdDuration::from_millis(10)).await;
        let second = use_case.submit_recording(&recorder, &request()).await;
        assert!(matches!(second, Err(SubmitError::AlreadyInFlight)));

        first.await.unwrap().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn submission_without_artifact_is_rejected() {
        let use_case = SubmitFeedbackUseCase::new(
            CountingStore {
                calls: Arc::new(AtomicUsize::new(0)),
                delay: StdDuration::ZERO,
                fail: false,
            },
            EchoGateway,
            FixedIdentity,
        );
        let recorder = RecorderService::new(OneTakeDevice { chunks: vec![] }, 300);

        let err = use_case
            .submit_recording(&recorder, &request())
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::NothingToSubmit));
    }

    #[tokio::test]
    async fn empty_text_comment_is_rejected_before_the_network() {
        let use_case = SubmitFeedbackUseCase::new(
            CountingStore {
                calls: Arc::new(AtomicUsize::new(0)),
                delay: StdDuration::ZERO,
                fail: false,
            },
            EchoGateway,
            FixedIdentity,
        );

        let err = use_case.post_text("post-1", "   ", None).await.unwrap_err();
        assert!(matches!(err, SubmitError::EmptyComment));

        let comment = use_case
            .post_text("post-1", "lovely phrasing", None)
            .await
            .unwrap();
        assert_eq!(comment.body, CommentBody::Text("lovely phrasing".into()));
    }

    #[test]
    fn artifact_keys_are_namespaced_by_user() {
        let key = artifact_key("user-9", AudioMimeType::Flac);
        assert!(key.starts_with("user-9/audio-comment-"));
        assert!(key.ends_with(".flac"));
    }
}
