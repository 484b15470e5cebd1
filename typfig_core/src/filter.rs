use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::TypfigError;
use crate::TypfigResult;

/// Decides which project paths are excluded from root resolution and watch
/// re-scans.
///
/// Combines the project `.gitignore` (unless disabled) with the
/// `[exclude]` patterns from `typfig.toml`. Paths outside the project root
/// are never excluded.
#[derive(Debug, Clone)]
pub struct PathFilter {
	root: PathBuf,
	gitignore: Gitignore,
	custom_exclude: Gitignore,
}

impl PathFilter {
	pub fn new(root: &Path, exclude_patterns: &[String], disable_gitignore: bool) -> TypfigResult<Self> {
		let gitignore = if disable_gitignore {
			Gitignore::empty()
		} else {
			build_gitignore(root)
		};

		Ok(Self {
			root: root.to_path_buf(),
			gitignore,
			custom_exclude: build_exclude_matcher(root, exclude_patterns)?,
		})
	}

	/// A filter that excludes nothing.
	pub fn empty(root: &Path) -> Self {
		Self {
			root: root.to_path_buf(),
			gitignore: Gitignore::empty(),
			custom_exclude: Gitignore::empty(),
		}
	}

	/// Check whether `path` (or any of its parent directories below the
	/// project root) is excluded.
	pub fn is_excluded(&self, path: &Path) -> bool {
		if !path.starts_with(&self.root) {
			return false;
		}

		let is_dir = path.is_dir();
		self.gitignore
			.matched_path_or_any_parents(path, is_dir)
			.is_ignore()
			|| self
				.custom_exclude
				.matched_path_or_any_parents(path, is_dir)
				.is_ignore()
	}
}

/// Build a `Gitignore` matcher from `[exclude]` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> TypfigResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			TypfigError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| TypfigError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}
