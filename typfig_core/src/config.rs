use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::TypfigError;
use crate::TypfigResult;

/// Extension of Typst markup documents.
pub const DEFAULT_EXTENSION: &str = "typ";

/// Number of characters after a figure's closing `)` searched for a label.
pub const DEFAULT_LABEL_LOOKAHEAD: usize = 200;

/// Delay in milliseconds between the last trigger of a burst and the re-scan.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["typfig.toml", ".typfig.toml", ".config/typfig.toml"];

/// Configuration loaded from a `typfig.toml` file.
///
/// ```toml
/// extension = "typ"
/// label_lookahead = 200
/// debounce_ms = 300
///
/// [root]
/// prefer = ["main.typ", "thesis.typ"]
///
/// [exclude]
/// patterns = ["templates/", "*.draft.typ"]
///
/// disable_gitignore = false
/// ```
#[derive(Debug, Deserialize)]
pub struct TypfigConfig {
	/// Extension (without the dot) of markup documents. Include paths without
	/// this extension get it appended.
	#[serde(default = "default_extension")]
	pub extension: String,
	/// How many characters after a figure's closing `)` may hold its label.
	#[serde(default = "default_label_lookahead")]
	pub label_lookahead: usize,
	/// Debounce delay for re-scans triggered by edits, in milliseconds.
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
	/// Root document resolution settings.
	#[serde(default)]
	pub root: RootConfig,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// When true, the project's `.gitignore` is not used to filter watched
	/// files and root candidates.
	#[serde(default)]
	pub disable_gitignore: bool,
}

/// Settings for the root document search.
#[derive(Debug, Default, Deserialize)]
pub struct RootConfig {
	/// File names checked before any other document at each ancestor level.
	/// A preferred file still has to contain an include or import directive
	/// to qualify.
	#[serde(default)]
	pub prefer: Vec<String>,
}

/// Configuration for excluding files and directories.
///
/// Patterns follow gitignore syntax, are relative to the project root and
/// are applied on top of any `.gitignore` rules.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Examples: `"build/"`, `"*.draft.typ"`, `"!keep.typ"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_extension() -> String {
	DEFAULT_EXTENSION.to_string()
}

fn default_label_lookahead() -> usize {
	DEFAULT_LABEL_LOOKAHEAD
}

fn default_debounce_ms() -> u64 {
	DEFAULT_DEBOUNCE_MS
}

impl TypfigConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> TypfigResult<Option<TypfigConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: TypfigConfig =
			toml::from_str(&content).map_err(|e| TypfigError::ConfigParse(e.to_string()))?;

		if config.extension.trim_start_matches('.').is_empty() {
			return Err(TypfigError::ConfigParse(
				"`extension` must not be empty".to_string(),
			));
		}

		Ok(Some(config))
	}
}
