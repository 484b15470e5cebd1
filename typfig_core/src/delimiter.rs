use crate::TypfigError;
use crate::TypfigResult;

/// A region closed by a balanced delimiter scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancedSpan<'a> {
	/// Byte offset where the scan started, just after the opening delimiter.
	pub start: usize,
	/// Byte offset of the delimiter that brought the depth back to zero.
	pub close: usize,
	/// The text between `start` and `close`.
	pub body: &'a str,
}

/// Find the delimiter closing an already opened block.
///
/// `start` must point just past the opening delimiter. The scan keeps a depth
/// counter starting at 1, incremented on every further `open` and decremented
/// on every `close`. It is purely textual: delimiters inside string literals
/// are counted like any others.
///
/// Both delimiters must be ASCII, which keeps every returned offset on a
/// `char` boundary. Reaching the end of `text` while the depth is positive is
/// reported as [`TypfigError::UnbalancedBlock`].
pub fn scan_balanced(text: &str, start: usize, open: u8, close: u8) -> TypfigResult<BalancedSpan<'_>> {
	debug_assert!(open.is_ascii() && close.is_ascii());

	let bytes = text.as_bytes();
	if start > bytes.len() {
		return Err(TypfigError::UnbalancedBlock { offset: start });
	}

	let mut depth = 1usize;
	for (index, &byte) in bytes.iter().enumerate().skip(start) {
		if byte == open {
			depth += 1;
		} else if byte == close {
			depth -= 1;
			if depth == 0 {
				return Ok(BalancedSpan {
					start,
					close: index,
					body: &text[start..index],
				});
			}
		}
	}

	Err(TypfigError::UnbalancedBlock { offset: start })
}

/// [`scan_balanced`] for parentheses, the delimiters of every Typst call.
pub fn scan_parentheses(text: &str, start: usize) -> TypfigResult<BalancedSpan<'_>> {
	scan_balanced(text, start, b'(', b')')
}
