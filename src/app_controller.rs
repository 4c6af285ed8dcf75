use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::providers::{DeepLx, DirectEgress, EgressSource, ProxyPool, Translator};
use crate::session::CheckpointStore;
use crate::translation::client::TranslationClient;
use crate::translation::pipeline::{
    event_channel, CancellationFlag, EventSink, PipelineEvent, RunOutcome, TranslationPipeline,
};

// @module: Application controller for string table translation

/// How the Ctrl-C watcher ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopRequest {
    /// A second signal arrived before the batch in flight finished
    Forced,
    /// Signals cannot be received
    Unavailable,
}

/// Set `flag` on the first signal; report a second one as a forced stop
async fn watch_stop_requests<S, Fut>(mut next_signal: S, flag: CancellationFlag) -> StopRequest
where
    S: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(e) = next_signal().await {
        warn!("Cannot listen for Ctrl-C: {}", e);
        return StopRequest::Unavailable;
    }
    warn!("Stop requested, finishing the current batch… (press Ctrl-C again to quit now)");
    flag.cancel();

    match next_signal().await {
        Ok(()) => StopRequest::Forced,
        Err(e) => {
            warn!("Cannot listen for Ctrl-C: {}", e);
            StopRequest::Unavailable
        }
    }
}

/// What happened to the files of one invocation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Outputs written completely
    pub completed: Vec<PathBuf>,
    /// Inputs whose translation failed
    pub failed: Vec<PathBuf>,
    /// Input that was interrupted by a stop request
    pub stopped: Option<PathBuf>,
}

/// Main application controller for string table translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Translation service
    translator: Arc<dyn Translator>,
    // @field: Egress identities for rotation
    egress: Arc<dyn EgressSource>,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let translator: Arc<dyn Translator> = Arc::new(DeepLx::new(
            config.translation.endpoint.clone(),
            config.translation.timeout_secs,
        ));
        let egress: Arc<dyn EgressSource> = if config.translation.proxies.is_empty() {
            Arc::new(DirectEgress)
        } else {
            Arc::new(ProxyPool::new(config.translation.proxies.clone()))
        };
        Self::with_services(config, translator, egress)
    }

    // @method: Create a controller around explicit services
    pub fn with_services(
        config: Config,
        translator: Arc<dyn Translator>,
        egress: Arc<dyn EgressSource>,
    ) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self {
            config,
            translator,
            egress,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one file, or every string table in a directory
    ///
    /// Ctrl-C stops the run after the batch in flight; running the same
    /// command again resumes it. A second Ctrl-C exits at once with status 130.
    pub async fn run(&self, input: PathBuf, output: Option<PathBuf>, restart: bool) -> Result<RunSummary> {
        let cancellation = CancellationFlag::new();
        let signal_watcher = tokio::spawn({
            let flag = cancellation.clone();
            async move {
                if watch_stop_requests(tokio::signal::ctrl_c, flag).await == StopRequest::Forced {
                    error!("Stopped immediately; the unfinished batch is translated again on the next run");
                    std::process::exit(130);
                }
            }
        });

        let result = self.run_with_cancellation(input, output, restart, cancellation).await;
        signal_watcher.abort();
        result
    }

    /// Like [`Controller::run`], stopping when `cancellation` is set
    pub async fn run_with_cancellation(
        &self,
        input: PathBuf,
        output: Option<PathBuf>,
        restart: bool,
        cancellation: CancellationFlag,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();
        let single_file = input.is_file();
        let jobs = self.plan_jobs(&input, output.as_deref())?;

        let (sink, events) = event_channel();
        let reporter = tokio::spawn(report_progress(events));
        let client = Arc::new(
            TranslationClient::new(
                self.translator.clone(),
                self.egress.clone(),
                self.config.client_options(),
            )
            .with_events(sink.clone()),
        );

        let mut summary = RunSummary::default();
        let mut first_error = None;

        for (input_file, output_file) in jobs {
            if restart {
                CheckpointStore::new(&input_file, &output_file)
                    .clear()
                    .with_context(|| format!("Failed to clear checkpoint for {}", output_file.display()))?;
            }

            match self
                .translate_file(&input_file, &output_file, client.clone(), sink.clone(), cancellation.clone())
                .await
            {
                Ok(RunOutcome::Completed { .. }) => {
                    info!("Success: {}", output_file.display());
                    summary.completed.push(output_file);
                }
                Ok(RunOutcome::Stopped { next_batch, total_batches }) => {
                    warn!(
                        "Stopped {} at batch {}/{}; run again to resume",
                        input_file.display(),
                        next_batch + 1,
                        total_batches
                    );
                    summary.stopped = Some(input_file);
                    break;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", input_file.display(), e);
                    summary.failed.push(input_file);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        // The reporter ends once every sender is gone
        drop(client);
        drop(sink);
        let _ = reporter.await;

        info!(
            "Processing finished in {}: {} completed, {} failed{}",
            Self::format_duration(start_time.elapsed()),
            summary.completed.len(),
            summary.failed.len(),
            if summary.stopped.is_some() { ", stopped" } else { "" }
        );

        match first_error {
            Some(e) if single_file => Err(e),
            _ => Ok(summary),
        }
    }

    /// Pair every input with its output path
    fn plan_jobs(&self, input: &Path, output: Option<&Path>) -> Result<Vec<(PathBuf, PathBuf)>> {
        let target = &self.config.target_language;

        if input.is_file() {
            let output = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| FileManager::generate_output_path(input, target));
            if output == input {
                return Err(anyhow!("Output path is the same as the input: {}", input.display()));
            }
            if let Some(parent) = output.parent() {
                FileManager::ensure_dir(parent)?;
            }
            return Ok(vec![(input.to_path_buf(), output)]);
        }

        if input.is_dir() {
            if output.is_some() {
                return Err(anyhow!("--output can only be used with a single input file"));
            }
            let jobs: Vec<_> = FileManager::find_files(input, "xml")?
                .into_iter()
                .filter(|file| !FileManager::is_translated_output(file, target))
                .map(|file| {
                    let output = FileManager::generate_output_path(&file, target);
                    (file, output)
                })
                .collect();
            if jobs.is_empty() {
                return Err(anyhow!("No XML files found in directory: {}", input.display()));
            }
            info!("Found {} file(s) in {}", jobs.len(), input.display());
            return Ok(jobs);
        }

        Err(anyhow!("Input path does not exist: {}", input.display()))
    }

    /// Run the pipeline for one file on its own task
    async fn translate_file(
        &self,
        input: &Path,
        output: &Path,
        client: Arc<TranslationClient>,
        sink: EventSink,
        cancellation: CancellationFlag,
    ) -> Result<RunOutcome> {
        let mut pipeline = TranslationPipeline::new(self.config.pipeline_config(), client)?
            .with_events(sink)
            .with_cancellation(cancellation);

        let input = input.to_path_buf();
        let output = output.to_path_buf();
        let handle = tokio::spawn(async move { pipeline.run(&input, &output).await });

        let outcome = handle.await.context("Translation task panicked")??;
        Ok(outcome)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches {msg}")
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

/// Drive a progress bar from pipeline events
async fn report_progress(mut events: UnboundedReceiver<PipelineEvent>) {
    let mut bar: Option<ProgressBar> = None;

    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::Started {
                input,
                total_batches,
                start_batch,
                ..
            } => {
                let pb = ProgressBar::new(total_batches as u64);
                pb.set_style(progress_style());
                pb.set_position(start_batch as u64);
                let name = input
                    .file_name()
                    .map(|f| f.to_string_lossy().to_string())
                    .unwrap_or_default();
                pb.set_message(name);
                bar = Some(pb);
            }
            PipelineEvent::Resumed { next_batch } => {
                info!("Resuming at batch {}", next_batch + 1);
            }
            PipelineEvent::Restarted { reason } => {
                info!("Starting over: {}", reason);
            }
            PipelineEvent::BatchCompleted(progress) => {
                if let Some(pb) = &bar {
                    pb.set_position(progress.batch_index as u64 + 1);
                    pb.set_message(format!(
                        "{:.1}% ({} chars left)",
                        progress.percent(),
                        progress.remaining_chars()
                    ));
                }
            }
            PipelineEvent::RetryScheduled { attempt, delay, .. } => {
                if let Some(pb) = &bar {
                    pb.set_message(format!("retry {} in {:?}", attempt, delay));
                }
            }
            PipelineEvent::Stalled { consecutive_failures } => {
                if let Some(pb) = &bar {
                    pb.set_message(format!("stalled after {} failures", consecutive_failures));
                }
            }
            PipelineEvent::Finished(outcome) => {
                if let Some(pb) = bar.take() {
                    match outcome {
                        RunOutcome::Completed { .. } => pb.finish_and_clear(),
                        RunOutcome::Stopped { .. } => pb.abandon_with_message("stopped"),
                    }
                }
            }
            PipelineEvent::StateChanged(_) | PipelineEvent::EgressRotated { .. } => {}
        }
    }

    if let Some(pb) = bar {
        pb.abandon();
    }
}
