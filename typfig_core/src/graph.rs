use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::content::ContentSource;
use crate::extract::DiagnosticKind;
use crate::extract::ExtractOptions;
use crate::extract::Extraction;
use crate::extract::ScanDiagnostic;
use crate::extract::extract_figures_with_diagnostics;
use crate::paths::has_extension;
use crate::paths::normalize_path;
use crate::paths::resolve_reference;

static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"#(?:include|import)\s+"([^"]+)""#)
		.unwrap_or_else(|e| panic!("invalid include pattern: {e}"))
});

static DIRECTIVE_START: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"#(?:include|import)\s+""#)
		.unwrap_or_else(|e| panic!("invalid directive pattern: {e}"))
});

/// Whether `text` contains at least one include or import directive.
pub fn has_include_directive(text: &str) -> bool {
	DIRECTIVE_START.is_match(text)
}

/// The quoted paths of every include and import directive in `text`, in
/// document order.
pub fn include_targets(text: &str) -> Vec<&str> {
	INCLUDE_DIRECTIVE
		.captures_iter(text)
		.filter_map(|captures| captures.get(1))
		.map(|capture| capture.as_str())
		.collect()
}

/// Options controlling include graph traversal.
#[derive(Debug, Clone)]
pub struct GraphOptions {
	/// Extension appended to include paths that lack it.
	pub extension: String,
	/// Options passed to figure extraction for every document.
	pub extract: ExtractOptions,
}

impl Default for GraphOptions {
	fn default() -> Self {
		Self {
			extension: crate::config::DEFAULT_EXTENSION.to_string(),
			extract: ExtractOptions::default(),
		}
	}
}

/// The result of walking an include graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphScan {
	/// Figures of every reachable document, in pre-order traversal order.
	/// Not yet numbered.
	pub extraction: Extraction,
	/// Every document processed, in the order it was visited.
	pub documents: Vec<PathBuf>,
}

/// Walk the include graph rooted at `root`, extracting figures from every
/// reachable document exactly once.
///
/// A document's own figures come before the figures of the documents it
/// includes, and included documents are visited in directive order. A
/// document that is neither open in a buffer nor present on disk is skipped
/// silently; one that fails to read is logged and skipped, and traversal
/// continues with its siblings.
pub fn walk_include_graph(root: &Path, source: &dyn ContentSource, options: &GraphOptions) -> GraphScan {
	let mut walker = GraphWalker {
		source,
		options,
		visited: HashSet::new(),
		scan: GraphScan::default(),
	};
	walker.visit(&normalize_path(root));
	walker.scan
}

struct GraphWalker<'a> {
	source: &'a dyn ContentSource,
	options: &'a GraphOptions,
	/// Documents already processed during this scan.
	visited: HashSet<PathBuf>,
	scan: GraphScan,
}

impl GraphWalker<'_> {
	fn visit(&mut self, document: &Path) {
		if self.visited.contains(document) {
			return;
		}

		if !self.source.is_reachable(document) {
			tracing::debug!(file = %document.display(), "skipping unreachable document");
			return;
		}

		self.visited.insert(document.to_path_buf());
		self.scan.documents.push(document.to_path_buf());

		let text = match self.source.read(document) {
			Ok(text) => text,
			Err(e) => {
				tracing::warn!(file = %document.display(), error = %e, "failed to read document");
				self.scan.extraction.diagnostics.push(ScanDiagnostic {
					file: document.to_path_buf(),
					kind: DiagnosticKind::UnreadableDocument {
						reason: e.to_string(),
					},
					line: 0,
				});
				return;
			}
		};

		let Extraction {
			figures,
			diagnostics,
		} = extract_figures_with_diagnostics(&text, document, &self.options.extract);
		self.scan.extraction.figures.extend(figures);
		self.scan.extraction.diagnostics.extend(diagnostics);

		let document_dir = document.parent().unwrap_or_else(|| Path::new(""));
		for target in include_targets(&text) {
			let Some(path) = self.resolve_include(document_dir, target) else {
				tracing::debug!(file = %document.display(), target, "skipping package import");
				continue;
			};
			self.visit(&path);
		}
	}

	fn resolve_include(&self, document_dir: &Path, target: &str) -> Option<PathBuf> {
		if target.starts_with('@') {
			return None;
		}

		let extension = self.options.extension.trim_start_matches('.');
		let mut path = resolve_reference(
			document_dir,
			target,
			self.options.extract.project_root.as_deref(),
		);
		if !has_extension(&path, extension) {
			let mut file_name = path.file_name().unwrap_or_default().to_os_string();
			file_name.push(".");
			file_name.push(extension);
			path.set_file_name(file_name);
		}

		Some(path)
	}
}
