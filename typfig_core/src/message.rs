use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::TypfigError;
use crate::TypfigResult;
use crate::extract::FigureRecord;

/// Messages crossing the boundary between the scanner and a presentation
/// surface. Transport and rendering are up to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GalleryMessage {
	/// A fresh, numbered figure set replacing whatever was shown before.
	FigureSetUpdated { figures: Vec<FigureRecord> },
	/// The surface asks the host to open `path` at 1-based `line`.
	NavigateRequested { path: PathBuf, line: usize },
}

/// A validated navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
	pub path: PathBuf,
	/// 1-based line number.
	pub line: usize,
}

impl NavigationTarget {
	/// Check that `path` is an existing file and `line` is 1-based.
	pub fn new(path: &Path, line: usize) -> TypfigResult<Self> {
		if line == 0 || !path.is_file() {
			return Err(TypfigError::NavigationFailure {
				path: path.display().to_string(),
				line,
			});
		}

		Ok(Self {
			path: path.to_path_buf(),
			line,
		})
	}

	/// The 0-based line editors and the language server protocol expect.
	pub fn zero_based_line(&self) -> usize {
		self.line - 1
	}
}

impl TryFrom<&GalleryMessage> for NavigationTarget {
	type Error = TypfigError;

	fn try_from(message: &GalleryMessage) -> TypfigResult<Self> {
		match message {
			GalleryMessage::NavigateRequested { path, line } => Self::new(path, *line),
			GalleryMessage::FigureSetUpdated { .. } => Err(TypfigError::NavigationFailure {
				path: String::new(),
				line: 0,
			}),
		}
	}
}
