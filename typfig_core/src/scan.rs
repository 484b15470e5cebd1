use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::TypfigResult;
use crate::config::DEFAULT_DEBOUNCE_MS;
use crate::config::DEFAULT_EXTENSION;
use crate::config::DEFAULT_LABEL_LOOKAHEAD;
use crate::config::TypfigConfig;
use crate::content::ContentSource;
use crate::extract::ExtractOptions;
use crate::extract::FigureRecord;
use crate::extract::ScanDiagnostic;
use crate::extract::number_figures;
use crate::filter::PathFilter;
use crate::graph::GraphOptions;
use crate::graph::walk_include_graph;
use crate::message::GalleryMessage;
use crate::paths::has_extension;
use crate::paths::normalize_path;
use crate::root::RootOptions;
use crate::root::RootResolution;
use crate::root::resolve_root_document;

/// Options for controlling how a project is scanned.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from a [`TypfigConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Extension of markup documents, without the dot.
	pub extension: String,
	/// Characters after a figure's closing `)` searched for its label.
	pub label_lookahead: usize,
	/// Delay between the last trigger of a burst and the re-scan.
	pub debounce: Duration,
	/// File names preferred when resolving the root document.
	pub prefer_roots: Vec<String>,
	/// Gitignore-style patterns excluded from root resolution and watching.
	pub exclude_patterns: Vec<String>,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			extension: DEFAULT_EXTENSION.to_string(),
			label_lookahead: DEFAULT_LABEL_LOOKAHEAD,
			debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
			prefer_roots: Vec::new(),
			exclude_patterns: Vec::new(),
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from a [`TypfigConfig`].
	pub fn from_config(config: Option<&TypfigConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			extension: config.extension.trim_start_matches('.').to_string(),
			label_lookahead: config.label_lookahead,
			debounce: Duration::from_millis(config.debounce_ms),
			prefer_roots: config.root.prefer.clone(),
			exclude_patterns: config.exclude.patterns.clone(),
			disable_gitignore: config.disable_gitignore,
		}
	}
}

/// The outcome of one full scan: root resolution, traversal and numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureScan {
	/// The document the include graph was walked from.
	pub root: RootResolution,
	/// Every document visited, in traversal order.
	pub documents: Vec<PathBuf>,
	/// Numbered figures in discovery order.
	pub figures: Vec<FigureRecord>,
	/// Constructs and documents skipped along the way.
	pub diagnostics: Vec<ScanDiagnostic>,
}

impl FigureScan {
	/// The message handed to the presentation surface for this scan.
	pub fn to_message(&self) -> GalleryMessage {
		GalleryMessage::FigureSetUpdated {
			figures: self.figures.clone(),
		}
	}
}

/// Scans a single project. Holds nothing between scans except settings.
#[derive(Debug, Clone)]
pub struct Scanner {
	project_root: PathBuf,
	options: ScanOptions,
	filter: PathFilter,
}

impl Scanner {
	pub fn new(project_root: &Path, options: ScanOptions) -> TypfigResult<Self> {
		let project_root = absolute(project_root);
		let filter = PathFilter::new(
			&project_root,
			&options.exclude_patterns,
			options.disable_gitignore,
		)?;

		Ok(Self {
			project_root,
			options,
			filter,
		})
	}

	/// Load discovered project config and build a scanner from it.
	pub fn from_config(project_root: &Path) -> TypfigResult<Self> {
		let config = TypfigConfig::load(project_root)?;
		Self::new(project_root, ScanOptions::from_config(config.as_ref()))
	}

	pub fn project_root(&self) -> &Path {
		&self.project_root
	}

	pub fn options(&self) -> &ScanOptions {
		&self.options
	}

	/// Whether `path` is a markup document this scanner reads.
	pub fn is_markup_document(&self, path: &Path) -> bool {
		has_extension(path, &self.options.extension)
	}

	/// Whether a change to `path` can affect the figure set: any file in
	/// the project that is not excluded, since images count as much as
	/// documents.
	pub fn is_relevant_change(&self, path: &Path) -> bool {
		let path = absolute(path);
		path.starts_with(&self.project_root) && !self.filter.is_excluded(&path)
	}

	/// Resolve the root document for `active` without scanning.
	pub fn resolve_root(&self, active: &Path, source: &dyn ContentSource) -> RootResolution {
		resolve_root_document(
			&absolute(active),
			&self.project_root,
			source,
			&self.filter,
			&RootOptions {
				extension: self.options.extension.clone(),
				prefer: self.options.prefer_roots.clone(),
			},
		)
	}

	/// Run a full scan for the currently active document.
	pub fn scan(&self, active: &Path, source: &dyn ContentSource) -> FigureScan {
		let root = self.resolve_root(active, source);
		let graph_options = GraphOptions {
			extension: self.options.extension.clone(),
			extract: ExtractOptions {
				label_lookahead: self.options.label_lookahead,
				project_root: Some(self.project_root.clone()),
			},
		};

		let graph = walk_include_graph(&root.document, source, &graph_options);
		let mut figures = graph.extraction.figures;
		number_figures(&mut figures);

		tracing::debug!(
			root = %root.document.display(),
			documents = graph.documents.len(),
			figures = figures.len(),
			"scan complete"
		);

		FigureScan {
			root,
			documents: graph.documents,
			figures,
			diagnostics: graph.extraction.diagnostics,
		}
	}
}

fn absolute(path: &Path) -> PathBuf {
	normalize_path(&std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()))
}
