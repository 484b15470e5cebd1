use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TypfigError {
	#[error(transparent)]
	#[diagnostic(code(typfig::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(typfig::config_parse),
		help("check that typfig.toml is valid TOML with optional [root] and [exclude] sections")
	)]
	ConfigParse(String),

	#[error("unbalanced figure block starting at byte {offset}")]
	#[diagnostic(
		code(typfig::unbalanced_block),
		help("every `(` opened by a figure needs a matching `)`")
	)]
	UnbalancedBlock { offset: usize },

	#[error("failed to read document `{path}`: {reason}")]
	#[diagnostic(code(typfig::unreadable_document))]
	UnreadableDocument { path: String, reason: String },

	#[error("cannot open file: `{path}` at line {line}")]
	#[diagnostic(
		code(typfig::navigation_failure),
		help("the figure's source document may have been moved or deleted; re-scan the project")
	)]
	NavigationFailure { path: String, line: usize },

	#[error("gallery rendering failed: {0}")]
	#[diagnostic(code(typfig::template_render))]
	TemplateRender(String),
}

pub type TypfigResult<T> = Result<T, TypfigError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
