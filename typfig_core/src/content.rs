use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use crate::TypfigError;
use crate::TypfigResult;

/// Reads the current text of markup documents.
///
/// Implementors only decide which documents have a live, possibly unsaved
/// buffer. Everything else falls through to persistent storage.
pub trait ContentSource {
	/// The live text of an open editable buffer for exactly `path`, if any.
	fn open_buffer(&self, path: &Path) -> Option<Cow<'_, str>>;

	/// Read the current text of `path`.
	///
	/// An open buffer wins over the file on disk. A path that is neither open
	/// nor present on disk reads as an empty string; a file that exists but
	/// cannot be read is an [`TypfigError::UnreadableDocument`].
	fn read(&self, path: &Path) -> TypfigResult<String> {
		if let Some(buffer) = self.open_buffer(path) {
			return Ok(normalize_line_endings(&buffer));
		}

		if !path.is_file() {
			return Ok(String::new());
		}

		let content = std::fs::read_to_string(path).map_err(|e| {
			TypfigError::UnreadableDocument {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(normalize_line_endings(&content))
	}

	/// Whether `path` can be read at all, either from a buffer or from disk.
	fn is_reachable(&self, path: &Path) -> bool {
		self.open_buffer(path).is_some() || path.is_file()
	}
}

/// Reads every document from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl ContentSource for DiskSource {
	fn open_buffer(&self, _path: &Path) -> Option<Cow<'_, str>> {
		None
	}
}

/// Open editable buffers layered over the file system.
#[derive(Debug, Clone, Default)]
pub struct BufferOverlay {
	buffers: BTreeMap<PathBuf, String>,
}

impl BufferOverlay {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record the latest text of an open buffer, replacing any previous text.
	pub fn set(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
		self.buffers.insert(path.into(), text.into());
	}

	/// Forget a buffer once it has been closed.
	pub fn remove(&mut self, path: &Path) -> Option<String> {
		self.buffers.remove(path)
	}

	pub fn get(&self, path: &Path) -> Option<&str> {
		self.buffers.get(path).map(String::as_str)
	}

	pub fn get_mut(&mut self, path: &Path) -> Option<&mut String> {
		self.buffers.get_mut(path)
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.buffers.contains_key(path)
	}
}

impl ContentSource for BufferOverlay {
	fn open_buffer(&self, path: &Path) -> Option<Cow<'_, str>> {
		self.get(path).map(Cow::Borrowed)
	}
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}
