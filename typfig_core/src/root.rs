use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::content::ContentSource;
use crate::filter::PathFilter;
use crate::graph::has_include_directive;
use crate::paths::has_extension;
use crate::paths::normalize_path;

/// How the root document of a scan was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RootKind {
	/// An ancestor-directory document containing an include or import
	/// directive.
	Ancestor,
	/// No qualifying document was found; the active document stands alone.
	ActiveDocument,
}

/// The document anchoring the include graph for an active document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootResolution {
	pub document: PathBuf,
	pub kind: RootKind,
}

impl RootResolution {
	pub fn is_fallback(&self) -> bool {
		self.kind == RootKind::ActiveDocument
	}
}

/// Options controlling the root document search.
#[derive(Debug, Clone)]
pub struct RootOptions {
	/// Extension of candidate documents.
	pub extension: String,
	/// File names tried before the rest of a directory's documents.
	pub prefer: Vec<String>,
}

impl Default for RootOptions {
	fn default() -> Self {
		Self {
			extension: crate::config::DEFAULT_EXTENSION.to_string(),
			prefer: Vec::new(),
		}
	}
}

/// Find the document most plausibly acting as the root of `active`'s include
/// graph.
///
/// Starting at the directory containing `active`, each directory up to and
/// including `project_root` is checked in turn. Within a directory,
/// preferred names come first and the remaining markup documents follow in
/// file name order; the first one whose current text contains an include or
/// import directive wins. When no directory yields one, `active` itself is
/// the root.
pub fn resolve_root_document(
	active: &Path,
	project_root: &Path,
	source: &dyn ContentSource,
	filter: &PathFilter,
	options: &RootOptions,
) -> RootResolution {
	let active = normalize_path(active);
	let project_root = normalize_path(project_root);
	let mut current = active.parent().map(Path::to_path_buf);

	while let Some(dir) = current {
		if let Some(document) = find_root_in_dir(&dir, source, filter, options) {
			tracing::debug!(root = %document.display(), "resolved root document");
			return RootResolution {
				document,
				kind: RootKind::Ancestor,
			};
		}

		if dir == project_root {
			break;
		}

		current = dir.parent().filter(|parent| *parent != dir).map(Path::to_path_buf);
	}

	tracing::debug!(active = %active.display(), "no root document found, using active document");
	RootResolution {
		document: active,
		kind: RootKind::ActiveDocument,
	}
}

fn find_root_in_dir(
	dir: &Path,
	source: &dyn ContentSource,
	filter: &PathFilter,
	options: &RootOptions,
) -> Option<PathBuf> {
	let entries = match std::fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(e) => {
			tracing::debug!(dir = %dir.display(), error = %e, "cannot list directory");
			return None;
		}
	};

	let mut candidates: Vec<PathBuf> = entries
		.filter_map(Result::ok)
		.map(|entry| entry.path())
		.filter(|path| has_extension(path, &options.extension) && path.is_file())
		.filter(|path| !filter.is_excluded(path))
		.collect();
	candidates.sort_by_key(|path| {
		let name = path.file_name().map(|name| name.to_string_lossy().into_owned());
		let rank = name
			.as_deref()
			.and_then(|name| options.prefer.iter().position(|preferred| preferred == name))
			.unwrap_or(usize::MAX);
		(rank, name)
	});

	candidates.into_iter().find(|candidate| {
		source
			.read(candidate)
			.is_ok_and(|text| has_include_directive(&text))
	})
}
