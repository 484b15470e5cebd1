use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

use crate::comment::CommentKind;
use crate::comment::comment_at;
use crate::config::DEFAULT_LABEL_LOOKAHEAD;
use crate::delimiter::scan_parentheses;
use crate::paths::LineTable;
use crate::paths::resolve_reference;
use crate::paths::short_name;

/// Caption reported for figures without a `caption:` field.
pub const NO_CAPTION: &str = "No Caption";

static FIGURE_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"figure\s*\("));
static IMAGE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| compile(r#"image\s*\(\s*"([^"]+)""#));
static CAPTION_BRACKET: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)caption:\s*\[(.*?)\]"));
static CAPTION_STRING: LazyLock<Regex> = LazyLock::new(|| compile(r#"caption:\s*"([^"]+)""#));
static LABEL: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*#?\s*<([^>]+)>"));

fn compile(pattern: &str) -> Regex {
	Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern `{pattern}`: {e}"))
}

/// One figure construct found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureRecord {
	/// The image path exactly as written in the source.
	pub image_path: String,
	/// The image path resolved against the containing document.
	pub resolved_image: PathBuf,
	/// Trimmed caption text, or [`NO_CAPTION`].
	pub caption: String,
	/// 1-indexed line of the `figure` keyword.
	pub line: usize,
	/// Short display name of the containing document.
	pub source_file: String,
	/// Path of the containing document, used for navigation.
	pub source_path: PathBuf,
	/// The attached label including its angle brackets, or empty.
	pub label: String,
	/// 1-based position across the whole scan. Zero until numbered.
	pub ordinal: usize,
}

impl FigureRecord {
	pub fn has_label(&self) -> bool {
		!self.label.is_empty()
	}
}

/// Why a figure-shaped construct was not recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
#[non_exhaustive]
pub enum DiagnosticKind {
	/// The construct sits inside a line or block comment.
	CommentedOut { comment: CommentKind },
	/// The opening `(` never finds its matching `)`.
	UnbalancedBlock,
	/// The figure body has no `image("...")` reference.
	MissingImage,
	/// The referenced image does not exist on disk.
	ImageNotFound { path: PathBuf },
	/// A document in the include graph could not be read.
	UnreadableDocument { reason: String },
}

/// A construct or document skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostic {
	/// The document the diagnostic belongs to.
	pub file: PathBuf,
	/// The kind of diagnostic.
	pub kind: DiagnosticKind,
	/// 1-indexed line, or 0 for whole-document diagnostics.
	pub line: usize,
}

impl ScanDiagnostic {
	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match &self.kind {
			DiagnosticKind::CommentedOut {
				comment: CommentKind::Line,
			} => "figure is inside a line comment".to_string(),
			DiagnosticKind::CommentedOut {
				comment: CommentKind::Block,
			} => "figure is inside a block comment".to_string(),
			DiagnosticKind::UnbalancedBlock => {
				"figure is missing its closing `)`".to_string()
			}
			DiagnosticKind::MissingImage => "figure has no `image(\"...\")` reference".to_string(),
			DiagnosticKind::ImageNotFound { path } => {
				format!("image `{}` does not exist", path.display())
			}
			DiagnosticKind::UnreadableDocument { reason } => {
				format!("document could not be read: {reason}")
			}
		}
	}
}

/// Options controlling figure extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
	/// Characters after a figure's closing `)` searched for its label.
	pub label_lookahead: usize,
	/// Directory that `/`-prefixed image paths are relative to.
	pub project_root: Option<PathBuf>,
}

impl Default for ExtractOptions {
	fn default() -> Self {
		Self {
			label_lookahead: DEFAULT_LABEL_LOOKAHEAD,
			project_root: None,
		}
	}
}

/// Figures and diagnostics extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
	pub figures: Vec<FigureRecord>,
	pub diagnostics: Vec<ScanDiagnostic>,
}

/// Extract every displayable figure from `text`, the content of `document`.
pub fn extract_figures(text: &str, document: &Path, options: &ExtractOptions) -> Vec<FigureRecord> {
	extract_figures_with_diagnostics(text, document, options).figures
}

/// Extract figures from `text` and report every construct that was skipped.
///
/// Records come out in document order of their `figure(` keyword. A figure
/// is recorded only when it is not commented out, its parentheses balance,
/// its body holds an `image("...")` reference and that image exists on disk.
pub fn extract_figures_with_diagnostics(
	text: &str,
	document: &Path,
	options: &ExtractOptions,
) -> Extraction {
	let mut extraction = Extraction::default();
	let document_dir = document.parent().unwrap_or_else(|| Path::new(""));
	let source_file = short_name(document);
	let line_table = LineTable::new(text);

	for open in FIGURE_OPEN.find_iter(text) {
		let line = line_table.line_of(open.start());
		let mut skip = |kind: DiagnosticKind| {
			tracing::debug!(file = %document.display(), line, ?kind, "skipping figure");
			extraction.diagnostics.push(ScanDiagnostic {
				file: document.to_path_buf(),
				kind,
				line,
			});
		};

		if let Some(comment) = comment_at(text, open.start()) {
			skip(DiagnosticKind::CommentedOut { comment });
			continue;
		}

		let Ok(block) = scan_parentheses(text, open.end()) else {
			skip(DiagnosticKind::UnbalancedBlock);
			continue;
		};

		let Some(image_path) = IMAGE_REFERENCE
			.captures(block.body)
			.and_then(|captures| captures.get(1))
			.map(|capture| capture.as_str().to_string())
		else {
			skip(DiagnosticKind::MissingImage);
			continue;
		};

		let resolved_image =
			resolve_reference(document_dir, &image_path, options.project_root.as_deref());
		if !resolved_image.is_file() {
			skip(DiagnosticKind::ImageNotFound {
				path: resolved_image,
			});
			continue;
		}

		let label = find_label(text, block.close + 1, options.label_lookahead);

		extraction.figures.push(FigureRecord {
			image_path,
			resolved_image,
			caption: find_caption(block.body),
			line,
			source_file: source_file.clone(),
			source_path: document.to_path_buf(),
			label,
			ordinal: 0,
		});
	}

	extraction
}

/// Prefer a bracketed `caption: [..]` over a quoted `caption: ".."`.
fn find_caption(body: &str) -> String {
	CAPTION_BRACKET
		.captures(body)
		.or_else(|| CAPTION_STRING.captures(body))
		.and_then(|captures| captures.get(1))
		.map_or_else(
			|| NO_CAPTION.to_string(),
			|capture| capture.as_str().trim().to_string(),
		)
}

/// Look for `<label>` within `lookahead` characters after `from`.
fn find_label(text: &str, from: usize, lookahead: usize) -> String {
	let window = lookahead_window(text, from, lookahead);
	LABEL
		.captures(window)
		.and_then(|captures| captures.get(1))
		.map(|capture| format!("<{}>", capture.as_str()))
		.unwrap_or_default()
}

fn lookahead_window(text: &str, from: usize, chars: usize) -> &str {
	let Some(rest) = text.get(from..) else {
		return "";
	};
	let end = rest
		.char_indices()
		.nth(chars)
		.map_or(rest.len(), |(index, _)| index);
	&rest[..end]
}

/// Assign 1-based ordinals in the order the figures were discovered.
pub fn number_figures(figures: &mut [FigureRecord]) {
	for (index, figure) in figures.iter_mut().enumerate() {
		figure.ordinal = index + 1;
	}
}
