use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use crate::paths::has_extension;

/// A single pending-timer slot.
///
/// Every trigger re-arms the slot, so a burst of triggers produces one
/// firing, `delay` after the last of them. The debouncer never reads a clock
/// or sleeps: callers pass `now` in and decide how to wait.
#[derive(Debug, Clone)]
pub struct Debouncer {
	delay: Duration,
	deadline: Option<Instant>,
}

impl Debouncer {
	pub fn new(delay: Duration) -> Self {
		Self {
			delay,
			deadline: None,
		}
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Arm the slot, replacing any pending deadline.
	pub fn trigger(&mut self, now: Instant) {
		self.deadline = Some(now + self.delay);
	}

	/// Clear the slot without firing.
	pub fn cancel(&mut self) {
		self.deadline = None;
	}

	pub fn is_pending(&self) -> bool {
		self.deadline.is_some()
	}

	/// Time left until the pending deadline, or `None` when idle.
	pub fn remaining(&self, now: Instant) -> Option<Duration> {
		self.deadline
			.map(|deadline| deadline.saturating_duration_since(now))
	}

	/// Fire if the deadline has passed. Returns `true` at most once per
	/// armed deadline.
	pub fn take_due(&mut self, now: Instant) -> bool {
		match self.deadline {
			Some(deadline) if deadline <= now => {
				self.deadline = None;
				true
			}
			_ => false,
		}
	}
}

/// Events that may cause a re-scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
	/// The text of a document changed, saved or not.
	TextChanged(PathBuf),
	/// The user switched to another document.
	ActiveDocumentChanged(PathBuf),
	/// The user asked to open (or reveal) the gallery.
	OpenRequested,
}

/// What the host should do in response to a [`Trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
	/// Nothing to do.
	Ignore,
	/// Scan immediately.
	ScanNow,
	/// A debounced scan was (re-)armed; wait for [`GallerySession::take_due`].
	Debounced,
}

/// Process-wide gallery state: whether a gallery is open, which document is
/// active, and the pending re-scan slot.
///
/// Like [`Debouncer`], the session takes `now` from its caller, so it serves
/// both a blocking watch loop and an async language server.
#[derive(Debug, Clone)]
pub struct GallerySession {
	open: bool,
	active: Option<PathBuf>,
	extension: String,
	debouncer: Debouncer,
}

impl GallerySession {
	pub fn new(extension: &str, delay: Duration) -> Self {
		Self {
			open: false,
			active: None,
			extension: extension.trim_start_matches('.').to_string(),
			debouncer: Debouncer::new(delay),
		}
	}

	pub fn is_open(&self) -> bool {
		self.open
	}

	/// Open the gallery. Opening an already open gallery only reveals it.
	pub fn open(&mut self) {
		self.open = true;
	}

	/// Close the gallery and drop any pending re-scan.
	pub fn close(&mut self) {
		self.open = false;
		self.debouncer.cancel();
	}

	pub fn active_document(&self) -> Option<&Path> {
		self.active.as_deref()
	}

	/// Record `path` as the active document if it is a markup document.
	/// Returns whether the active document was updated.
	pub fn set_active(&mut self, path: &Path) -> bool {
		if !has_extension(path, &self.extension) {
			return false;
		}
		self.active = Some(path.to_path_buf());
		true
	}

	/// Forget the active document, for instance when it was closed.
	pub fn clear_active(&mut self, path: &Path) {
		if self.active.as_deref() == Some(path) {
			self.active = None;
		}
	}

	/// Apply a trigger received at `now`.
	pub fn handle(&mut self, trigger: Trigger, now: Instant) -> TriggerAction {
		match trigger {
			Trigger::OpenRequested => {
				self.open();
				self.debouncer.cancel();
				TriggerAction::ScanNow
			}
			Trigger::ActiveDocumentChanged(path) => {
				if !self.set_active(&path) || !self.open {
					return TriggerAction::Ignore;
				}
				self.debouncer.trigger(now);
				TriggerAction::Debounced
			}
			Trigger::TextChanged(path) => {
				if !self.open || !has_extension(&path, &self.extension) {
					return TriggerAction::Ignore;
				}
				self.debouncer.trigger(now);
				TriggerAction::Debounced
			}
		}
	}

	/// Whether the pending re-scan is due. Never fires while closed.
	pub fn take_due(&mut self, now: Instant) -> bool {
		self.open && self.debouncer.take_due(now)
	}

	/// Time left until the pending re-scan, or `None` when idle.
	pub fn remaining(&self, now: Instant) -> Option<Duration> {
		self.debouncer.remaining(now)
	}

	pub fn debounce_delay(&self) -> Duration {
		self.debouncer.delay()
	}
}
