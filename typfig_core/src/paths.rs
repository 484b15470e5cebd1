use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Resolve a path written inside a document against that document.
///
/// Relative references resolve against `document_dir`. References starting
/// with `/` are Typst root-relative and resolve against `project_root` when
/// one is known; otherwise they are taken as absolute paths. The result is
/// normalized lexically, so `a/../b.typ` and `b.typ` name the same document
/// without touching the file system.
pub fn resolve_reference(document_dir: &Path, reference: &str, project_root: Option<&Path>) -> PathBuf {
	let joined = match (reference.strip_prefix('/'), project_root) {
		(Some(rooted), Some(root)) => root.join(rooted),
		_ => document_dir.join(reference),
	};

	normalize_path(&joined)
}

/// Fold `.` and `..` components without consulting the file system.
///
/// A `..` that would climb above the start of a relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				let can_pop = matches!(
					normalized.components().next_back(),
					Some(Component::Normal(_))
				);
				if can_pop {
					normalized.pop();
				} else if !normalized.has_root() {
					normalized.push("..");
				}
			}
			other => normalized.push(other.as_os_str()),
		}
	}

	normalized
}

/// Whether `path` carries the markup `extension` (given without a dot).
pub fn has_extension(path: &Path, extension: &str) -> bool {
	path.extension()
		.and_then(|ext| ext.to_str())
		.is_some_and(|ext| ext == extension.trim_start_matches('.'))
}

/// The file name of `path` for display, falling back to the whole path.
pub fn short_name(path: &Path) -> String {
	path.file_name().map_or_else(
		|| path.display().to_string(),
		|name| name.to_string_lossy().into_owned(),
	)
}

/// Pre-computed table of line-start byte offsets for efficient
/// offset-to-line conversion.
///
/// Building the table is O(n) once; every lookup is a binary search instead
/// of a rescan of the text before the offset.
pub(crate) struct LineTable {
	/// Byte offsets of the start of each line. `line_starts[0]` is always 0.
	line_starts: Vec<usize>,
}

impl LineTable {
	pub(crate) fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	/// The 1-indexed line containing `offset`: the number of newlines before
	/// it, plus one.
	pub(crate) fn line_of(&self, offset: usize) -> usize {
		match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact + 1,
			Err(insert) => insert,
		}
	}
}
