use serde::Deserialize;
use serde::Serialize;

const LINE_COMMENT: &str = "//";
const BLOCK_COMMENT_OPEN: &str = "/*";
const BLOCK_COMMENT_CLOSE: &str = "*/";

/// The kind of comment an offset was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentKind {
	/// A `//` marker precedes the offset on the same line.
	Line,
	/// A `/*` before the offset has no `*/` closing it before the offset.
	Block,
}

/// Determine whether `offset` falls inside a comment.
///
/// The line rule is checked first: a `//` between the start of the line and
/// `offset` comments the offset out. Otherwise every `/*` from the start of
/// the text must be closed by a `*/` that also ends before `offset`.
///
/// This is a heuristic, not a tokenizer: a `//` or `/*` inside a string
/// literal counts as a comment marker all the same.
pub fn comment_at(text: &str, offset: usize) -> Option<CommentKind> {
	let offset = floor_char_boundary(text, offset);
	let before = &text[..offset];

	let line_start = before.rfind('\n').map_or(0, |index| index + 1);
	if before[line_start..].contains(LINE_COMMENT) {
		return Some(CommentKind::Line);
	}

	let mut search_from = 0;
	while let Some(relative_open) = before[search_from..].find(BLOCK_COMMENT_OPEN) {
		let after_open = search_from + relative_open + BLOCK_COMMENT_OPEN.len();
		let Some(relative_close) = before[after_open..].find(BLOCK_COMMENT_CLOSE) else {
			return Some(CommentKind::Block);
		};
		search_from = after_open + relative_close + BLOCK_COMMENT_CLOSE.len();
	}

	None
}

/// Convenience wrapper over [`comment_at`].
pub fn is_commented_out(text: &str, offset: usize) -> bool {
	comment_at(text, offset).is_some()
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
	if offset >= text.len() {
		return text.len();
	}

	(0..=offset)
		.rev()
		.find(|index| text.is_char_boundary(*index))
		.unwrap_or(0)
}
