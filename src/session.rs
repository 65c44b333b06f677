//! The conversion session: one file, one target, one state machine.
//!
//! ```text
//!            select_file / remove_file / select_format
//!        ┌─────────────────────────────────────────────┐
//!        ▼                                             │
//!      Idle ──convert()──▶ Converting ──▶ Completed ───┤
//!                              │                       │
//!                              └────────▶ Error ───────┘
//! ```
//!
//! [`ConversionSession`] owns the only [`ConversionState`] and publishes it
//! through a `tokio::sync::watch` channel. The state changes only through
//! four private transitions (`start`, `succeed`, `fail`, `reset`), each run
//! while holding the session lock.
//!
//! While a conversion runs, a ticker task raises progress by
//! [`ConversionConfig::progress_step`] every
//! [`ConversionConfig::tick_interval_ms`], stopping at
//! [`ConversionConfig::progress_ceiling`]. Only `Completed` reports 100.
//!
//! Every conversion gets an attempt number. `reset` (remove or replace the
//! file, reselect the format) bumps it, so a ticker or converter that
//! finishes for an older attempt finds a mismatch and writes nothing. The
//! ticker is also aborted on every terminal transition.
//!
//! The session handle is cheap to clone; clones share the same state, so one
//! task can remove the file while another awaits [`ConversionSession::convert`].

use crate::config::ConversionConfig;
use crate::convert::{convert_with, ConversionRequest};
use crate::error::ConvertError;
use crate::formats::{Category, FormatTable};
use crate::notify::{NoopNotifier, Notification, SharedNotifier};
use crate::output::{ConversionResult, Download};
use crate::pipeline::input::SourceFile;
use crate::pipeline::Converters;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The session's single state value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConversionState {
    /// Nothing running; a file and format may or may not be selected.
    Idle,
    /// A converter is running. `progress` is in `0..100`.
    Converting { progress: u8 },
    /// The last conversion produced a result.
    Completed(ConversionResult),
    /// The last conversion failed.
    Error { message: String },
}

impl ConversionState {
    /// Progress in percent: the ticker value while converting, 100 once
    /// completed, `None` otherwise.
    pub fn progress(&self) -> Option<u8> {
        match self {
            ConversionState::Converting { progress } => Some(*progress),
            ConversionState::Completed(_) => Some(100),
            ConversionState::Idle | ConversionState::Error { .. } => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversionState::Idle)
    }

    pub fn is_converting(&self) -> bool {
        matches!(self, ConversionState::Converting { .. })
    }

    /// True for `Completed` and `Error`.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ConversionState::Completed(_) | ConversionState::Error { .. }
        )
    }

    /// Status line for display.
    pub fn status_text(&self) -> &str {
        match self {
            ConversionState::Idle => "",
            ConversionState::Converting { .. } => "Converting your file...",
            ConversionState::Completed(_) => "Conversion completed successfully!",
            ConversionState::Error { message } => message,
        }
    }
}

struct Inner {
    file: Option<Arc<SourceFile>>,
    format: Option<String>,
    attempt: u64,
    ticker: Option<JoinHandle<()>>,
    object_url: Option<String>,
}

/// Orchestrates one file's conversion: selection, routing, progress,
/// notifications and download.
///
/// # Example
/// ```rust,no_run
/// use file_converter::{ConversionConfig, ConversionSession, SourceFile};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = ConversionSession::new(ConversionConfig::default());
/// session.select_file(SourceFile::new("t.csv", b"a,b\n1,2".to_vec(), "text/csv"));
/// assert_eq!(session.legal_targets(), &["txt", "json", "xml"]);
///
/// session.select_format("json")?;
/// session.convert().await?;
/// let download = session.download()?;
/// assert_eq!(download.file_name, "t.json");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConversionSession {
    id: u64,
    inner: Arc<Mutex<Inner>>,
    state: Arc<watch::Sender<ConversionState>>,
    config: ConversionConfig,
    converters: Converters,
    notifier: SharedNotifier,
}

impl std::fmt::Debug for ConversionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionSession")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionSession {
    pub fn new(config: ConversionConfig) -> Self {
        let (state, _) = watch::channel(ConversionState::Idle);
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            inner: Arc::new(Mutex::new(Inner {
                file: None,
                format: None,
                attempt: 0,
                ticker: None,
                object_url: None,
            })),
            state: Arc::new(state),
            config,
            converters: Converters::default(),
            notifier: Arc::new(NoopNotifier),
        }
    }

    /// Send notifications to `notifier` instead of discarding them.
    pub fn with_notifier(mut self, notifier: SharedNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the category converters.
    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = converters;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// Snapshot of the current state.
    pub fn state(&self) -> ConversionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state.subscribe()
    }

    /// Stream of states, starting with the current one.
    pub fn progress_stream(&self) -> WatchStream<ConversionState> {
        WatchStream::new(self.subscribe())
    }

    pub fn selected_file(&self) -> Option<Arc<SourceFile>> {
        self.lock().file.clone()
    }

    pub fn selected_format(&self) -> Option<String> {
        self.lock().format.clone()
    }

    /// Legal targets for the selected file; empty with no file.
    pub fn legal_targets(&self) -> &'static [&'static str] {
        match &self.lock().file {
            Some(file) => FormatTable::standard().legal_targets(file.declared_media_type()),
            None => &[],
        }
    }

    // ── Selection ────────────────────────────────────────────────────────

    /// Select a new file. Clears the format and returns to `Idle`,
    /// abandoning any running conversion.
    pub fn select_file(&self, file: SourceFile) {
        let mut inner = self.lock();
        self.reset(&mut inner);
        info!(
            "Selected {} ({}, {} bytes)",
            file.name(),
            file.declared_media_type(),
            file.size_bytes()
        );
        inner.file = Some(Arc::new(file));
        inner.format = None;
    }

    /// Remove the file. Clears the format and returns to `Idle`, abandoning
    /// any running conversion.
    pub fn remove_file(&self) {
        let mut inner = self.lock();
        self.reset(&mut inner);
        inner.file = None;
        inner.format = None;
    }

    /// Select the target format.
    ///
    /// A finished result is discarded and the session returns to `Idle`.
    /// Files of unsupported categories accept any format here;
    /// [`convert`](Self::convert) then reports the category.
    ///
    /// # Errors
    /// * [`ConvertError::Busy`] while converting.
    /// * [`ConvertError::NoFileSelected`] with no file.
    /// * [`ConvertError::IncompatibleTarget`] when the table does not list
    ///   the format for the file's media type.
    pub fn select_format(&self, format: impl AsRef<str>) -> Result<(), ConvertError> {
        let mut inner = self.lock();
        if self.state.borrow().is_converting() {
            return Err(ConvertError::Busy);
        }
        let file = inner.file.as_ref().ok_or(ConvertError::NoFileSelected)?;

        let table = FormatTable::standard();
        let media_type = file.declared_media_type();
        let format = format.as_ref().trim().to_ascii_lowercase();
        let unsupported = matches!(table.route(media_type), Category::Unsupported(_));
        if !unsupported && !table.is_legal(media_type, &format) {
            return Err(ConvertError::IncompatibleTarget {
                media_type: media_type.to_string(),
                target: format,
            });
        }

        self.reset(&mut inner);
        debug!("Selected target format {}", format);
        inner.format = Some(format);
        Ok(())
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Convert the selected file to the selected format.
    ///
    /// Only valid from `Idle` with both selections made. Emits a success or
    /// failure notification when the attempt resolves.
    ///
    /// # Errors
    /// * [`ConvertError::Busy`], [`ConvertError::NotIdle`],
    ///   [`ConvertError::NoFileSelected`], [`ConvertError::NoFormatSelected`]
    ///   when the call is refused; the state is unchanged.
    /// * [`ConvertError::Aborted`] when the file was removed or replaced while
    ///   converting; the result is dropped and nothing is notified.
    /// * Any routing or stage error; the state becomes `Error`.
    pub async fn convert(&self) -> Result<ConversionResult, ConvertError> {
        let (attempt, file, format) = {
            let mut inner = self.lock();
            let (converting, idle) = {
                let state = self.state.borrow();
                (state.is_converting(), state.is_idle())
            };
            if converting {
                return Err(ConvertError::Busy);
            }
            if !idle {
                return Err(ConvertError::NotIdle);
            }
            let file = inner.file.clone().ok_or(ConvertError::NoFileSelected)?;
            let format = inner.format.clone().ok_or(ConvertError::NoFormatSelected)?;
            let attempt = self.start(&mut inner);
            (attempt, file, format)
        };

        let mut guard = AttemptGuard {
            session: self,
            attempt,
            armed: true,
        };

        let outcome = match ConversionRequest::new(file, &format) {
            Ok(request) => convert_with(&request, &self.converters).await,
            Err(e) => Err(e),
        };
        guard.armed = false;

        let mut inner = self.lock();
        if inner.attempt != attempt {
            warn!("Discarding result of abandoned conversion attempt {}", attempt);
            return Err(ConvertError::Aborted);
        }

        match outcome {
            Ok(result) => {
                self.succeed(&mut inner, result.clone());
                drop(inner);
                self.notifier.notify(Notification::conversion_completed());
                Ok(result)
            }
            Err(e) => {
                let message = self.fail(&mut inner, &e);
                drop(inner);
                self.notifier.notify(Notification::conversion_failed(message));
                Err(e)
            }
        }
    }

    // ── Download ─────────────────────────────────────────────────────────

    /// The completed artifact with its suggested file name.
    ///
    /// Repeatable: the result stays in place until a new file or format is
    /// selected.
    pub fn download(&self) -> Result<Download, ConvertError> {
        let download = match &*self.state.borrow() {
            ConversionState::Completed(result) => result.to_download(),
            _ => return Err(ConvertError::NoResult),
        };
        self.notifier.notify(Notification::download_started());
        Ok(download)
    }

    /// A session-scoped URL for the completed artifact.
    ///
    /// Calling it again for the same result returns the same URL. The URL
    /// stops resolving once the result is discarded.
    pub fn object_url(&self) -> Result<String, ConvertError> {
        let mut inner = self.lock();
        if !matches!(*self.state.borrow(), ConversionState::Completed(_)) {
            return Err(ConvertError::NoResult);
        }
        let (id, attempt) = (self.id, inner.attempt);
        let url = inner
            .object_url
            .get_or_insert_with(|| format!("blob:fconv/{id}/{attempt}"))
            .clone();
        Ok(url)
    }

    /// Resolve a URL from [`object_url`](Self::object_url); `None` once revoked.
    pub fn open_object_url(&self, url: &str) -> Option<Download> {
        let inner = self.lock();
        if inner.object_url.as_deref() != Some(url) {
            return None;
        }
        match &*self.state.borrow() {
            ConversionState::Completed(result) => Some(result.to_download()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────

    /// `Idle → Converting { progress: 0 }` and start the ticker.
    fn start(&self, inner: &mut Inner) -> u64 {
        inner.attempt += 1;
        inner.object_url = None;
        self.state
            .send_replace(ConversionState::Converting { progress: 0 });
        inner.ticker = Some(self.spawn_ticker(inner.attempt));
        info!("Conversion attempt {} started", inner.attempt);
        inner.attempt
    }

    /// `Converting → Completed`.
    fn succeed(&self, inner: &mut Inner, result: ConversionResult) {
        stop_ticker(inner);
        info!(
            "Conversion attempt {} completed: {} ({} bytes)",
            inner.attempt,
            result.suggested_file_name,
            result.size_bytes()
        );
        self.state.send_replace(ConversionState::Completed(result));
    }

    /// `Converting → Error`. Returns the stored message.
    fn fail(&self, inner: &mut Inner, error: &ConvertError) -> String {
        stop_ticker(inner);
        warn!("Conversion attempt {} failed: {}", inner.attempt, error);
        let message = error.user_message();
        self.state.send_replace(ConversionState::Error {
            message: message.clone(),
        });
        message
    }

    /// Any state → `Idle`. Invalidates the running attempt, if any, and
    /// revokes the object URL.
    fn reset(&self, inner: &mut Inner) {
        stop_ticker(inner);
        inner.attempt += 1;
        inner.object_url = None;
        self.state.send_if_modified(|state| {
            if state.is_idle() {
                false
            } else {
                debug!("Session reset to idle");
                *state = ConversionState::Idle;
                true
            }
        });
    }

    fn spawn_ticker(&self, attempt: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let state = Arc::clone(&self.state);
        let config = self.config.clone();

        tokio::spawn(async move {
            let period = config.tick_interval().max(Duration::from_millis(1));
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let keep_ticking = {
                    let guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.attempt != attempt {
                        false
                    } else {
                        let mut keep = false;
                        state.send_if_modified(|s| match s {
                            ConversionState::Converting { progress } => {
                                let next = config.next_progress(*progress);
                                keep = next < config.progress_ceiling;
                                if next == *progress {
                                    return false;
                                }
                                debug!("Progress {}% (attempt {})", next, attempt);
                                *progress = next;
                                true
                            }
                            _ => false,
                        });
                        keep
                    }
                };
                if !keep_ticking {
                    break;
                }
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stop_ticker(inner: &mut Inner) {
    if let Some(ticker) = inner.ticker.take() {
        ticker.abort();
    }
}

/// Resets the session if a `convert()` future is dropped mid-attempt.
struct AttemptGuard<'a> {
    session: &'a ConversionSession,
    attempt: u64,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.session.lock();
        if inner.attempt == self.attempt {
            warn!("Conversion attempt {} dropped before completion", self.attempt);
            self.session.reset(&mut inner);
        }
    }
}
