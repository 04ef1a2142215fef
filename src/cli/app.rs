//! Main app runners for the comment, listing, and playback flows

use std::process::ExitCode;
use std::time::Duration as StdDuration;

use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::application::ports::{CaptureDevice, CommentGateway, ConfigStore, PlaybackSource};
use crate::application::{
    PlayerService, RecorderService, SubmitFeedbackUseCase, SubmitRequest,
};
use crate::domain::audio::format_clock;
use crate::domain::comment::{CommentBody, TimestampRef};
use crate::domain::config::AppConfig;
use crate::infrastructure::{
    CpalCaptureDevice, RodioPlaybackSink, SupabaseComments, SupabaseIdentity, SupabaseStorage,
    XdgConfigStore,
};

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Resolved backend connection settings
#[derive(Debug, Clone)]
pub struct BackendOptions {
    pub base_url: String,
    pub api_key: String,
    pub access_token: Option<String>,
    pub bucket: String,
    pub max_take_secs: u64,
}

/// Resolve the backend settings a networked command needs.
/// Unsigned requests fall back to the publishable key as the bearer.
pub fn resolve_backend(config: &AppConfig) -> Result<BackendOptions, String> {
    let base_url = config.backend_url.clone().ok_or_else(|| {
        "Missing backend URL. Set ENCORE_BACKEND_URL or run 'encore config set backend_url <url>'"
            .to_string()
    })?;
    let api_key = config.api_key.clone().ok_or_else(|| {
        "Missing API key. Set ENCORE_API_KEY or run 'encore config set api_key <key>'".to_string()
    })?;

    Ok(BackendOptions {
        base_url,
        api_key,
        access_token: config.access_token.clone(),
        bucket: config.bucket_or_default().to_string(),
        max_take_secs: config.max_take_secs_or_default(),
    })
}

/// Load and merge configuration: defaults < file < env/CLI overrides
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    AppConfig::defaults().merge(file_config).merge(cli_config)
}

impl BackendOptions {
    fn bearer(&self) -> String {
        self.access_token
            .clone()
            .unwrap_or_else(|| self.api_key.clone())
    }

    fn publisher(
        &self,
    ) -> SubmitFeedbackUseCase<SupabaseStorage, SupabaseComments, SupabaseIdentity> {
        SubmitFeedbackUseCase::new(
            SupabaseStorage::new(
                self.base_url.as_str(),
                self.bucket.as_str(),
                self.api_key.as_str(),
                self.bearer(),
            ),
            SupabaseComments::new(self.base_url.as_str(), self.api_key.as_str(), self.bearer()),
            SupabaseIdentity::new(
                self.base_url.as_str(),
                self.api_key.as_str(),
                self.access_token.clone(),
            ),
        )
    }
}

/// How a recording session came to an end
enum RecordingEnd {
    /// The user pressed Enter
    Stopped,
    /// The take hit the configured ceiling and stopped itself
    CeilingReached,
    /// Ctrl-C: discard everything
    Interrupted,
}

/// Run the comment flow: either post written feedback directly, or record,
/// preview, and post an audio comment.
pub async fn run_comment(
    backend: BackendOptions,
    post_id: String,
    at: Option<String>,
    text: Option<String>,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let timestamp = match at.as_deref().map(str::parse::<TimestampRef>).transpose() {
        Ok(ts) => ts,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let publisher = backend.publisher();

    if let Some(text) = text {
        return match publisher.post_text(&post_id, &text, timestamp).await {
            Ok(comment) => {
                presenter.success(&format!("Comment posted as {}", comment.author));
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                presenter.error(&e.to_string());
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let recorder = RecorderService::new(CpalCaptureDevice::new(), backend.max_take_secs);
    let player = PlayerService::new(RodioPlaybackSink::new());

    presenter.info("Speak your feedback clearly into the microphone.");
    if let Err(e) = recorder.start().await {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    presenter.start_spinner(&Presenter::recording_status(0, backend.max_take_secs));
    let end = wait_for_recording_end(&recorder, &presenter, backend.max_take_secs).await;

    if matches!(end, RecordingEnd::Interrupted) {
        presenter.stop_spinner();
        recorder.clear().await;
        let _ = player.detach().await;
        presenter.warn("Recording discarded.");
        return ExitCode::from(EXIT_SUCCESS);
    }

    if let Err(e) = recorder.stop().await {
        presenter.spinner_fail("Recording failed");
        presenter.error(&e.to_string());
        recorder.clear().await;
        return ExitCode::from(EXIT_ERROR);
    }

    let Some(artifact) = recorder.artifact() else {
        presenter.spinner_fail("Recording produced no audio");
        recorder.clear().await;
        return ExitCode::from(EXIT_ERROR);
    };

    presenter.spinner_success(&format!(
        "Recorded {} ({})",
        format_clock(recorder.elapsed_secs() as f64),
        artifact.human_readable_size()
    ));
    if matches!(end, RecordingEnd::CeilingReached) {
        presenter.warn(&format!(
            "Recording stopped at the {} ceiling.",
            format_clock(backend.max_take_secs as f64)
        ));
    }

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        presenter.info("[p]lay preview, [s]ubmit, [d]iscard?");
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            _ => {
                // stdin closed; keep nothing around
                recorder.clear().await;
                let _ = player.detach().await;
                return ExitCode::from(EXIT_ERROR);
            }
        };

        match line.trim() {
            "p" | "P" => {
                if let Err(e) = player
                    .attach(PlaybackSource::Artifact(artifact.clone()))
                    .await
                {
                    presenter.error(&e.to_string());
                    continue;
                }
                if let Err(e) = player.toggle_play_pause().await {
                    presenter.error(&e.to_string());
                }
            }
            "s" | "S" => {
                presenter.start_spinner("Uploading audio comment...");
                let request = SubmitRequest {
                    post_id: post_id.clone(),
                    timestamp_reference: timestamp,
                };
                match publisher.submit_recording(&recorder, &request).await {
                    Ok(comment) => {
                        let _ = player.detach().await;
                        presenter.spinner_success("Audio comment posted!");
                        if let CommentBody::Audio { url } = &comment.body {
                            presenter.output(url);
                        }
                        return ExitCode::from(EXIT_SUCCESS);
                    }
                    Err(e) => {
                        presenter.spinner_fail("Upload failed");
                        presenter.error(&format!("{}. The recording is kept for retry.", e));
                    }
                }
            }
            "d" | "D" => {
                recorder.clear().await;
                let _ = player.detach().await;
                presenter.warn("Recording discarded.");
                return ExitCode::from(EXIT_SUCCESS);
            }
            other => presenter.warn(&format!("Unrecognized choice: {}", other)),
        }
    }
}

/// Watch the live recording until Enter, Ctrl-C, or the take ceiling
async fn wait_for_recording_end<D: CaptureDevice>(
    recorder: &RecorderService<D>,
    presenter: &Presenter,
    ceiling_secs: u64,
) -> RecordingEnd {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut clock = tokio::time::interval(StdDuration::from_millis(250));

    loop {
        tokio::select! {
            _ = lines.next_line() => return RecordingEnd::Stopped,
            _ = tokio::signal::ctrl_c() => return RecordingEnd::Interrupted,
            _ = clock.tick() => {
                if !recorder.is_recording() {
                    return RecordingEnd::CeilingReached;
                }
                presenter.update_spinner(&Presenter::recording_status(
                    recorder.elapsed_secs(),
                    ceiling_secs,
                ));
            }
        }
    }
}

/// Run the comment listing flow
pub async fn run_comments(backend: BackendOptions, post_id: String) -> ExitCode {
    let mut presenter = Presenter::new();
    let gateway = SupabaseComments::new(
        backend.base_url.as_str(),
        backend.api_key.as_str(),
        backend.bearer(),
    );

    presenter.start_spinner("Loading feedback...");
    match gateway.list(&post_id).await {
        Ok(comments) if comments.is_empty() => {
            presenter.spinner_success("No feedback yet.");
            ExitCode::from(EXIT_SUCCESS)
        }
        Ok(comments) => {
            presenter.spinner_success(&format!("{} comments", comments.len()));
            for comment in &comments {
                presenter.output(&Presenter::comment_line(comment));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.spinner_fail("Failed to load feedback");
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the playback flow for a posted audio comment
pub async fn run_play(url: String) -> ExitCode {
    let mut presenter = Presenter::new();
    let player = PlayerService::new(RodioPlaybackSink::new());

    presenter.start_spinner("Loading audio...");
    if let Err(e) = player.attach(PlaybackSource::Url(url)).await {
        presenter.spinner_fail("Could not load audio");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    if let Err(e) = player.toggle_play_pause().await {
        presenter.spinner_fail("Could not start playback");
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    let mut clock = tokio::time::interval(StdDuration::from_millis(250));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = clock.tick() => {
                let snapshot = player.snapshot();
                presenter.update_spinner(&Presenter::playback_status(&snapshot));
                if !snapshot.is_playing() && snapshot.position() > 0.0 {
                    break;
                }
            }
        }
    }

    let _ = player.detach().await;
    presenter.spinner_success("Done.");
    ExitCode::from(EXIT_SUCCESS)
}
