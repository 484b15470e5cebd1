use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Browse every figure in a Typst project without compiling it.",
	long_about = "typfig finds every `#figure(...)` reachable from a Typst document, following \
	              `#include` and `#import` directives from the project's root document, and \
	              lists them with their captions, labels and source lines.\n\nQuick start:\n  \
	              typfig scan chapters/intro.typ     List figures\n  typfig gallery main.typ \
	              -o out.html  Write an HTML gallery\n  typfig lsp                         Run \
	              the live gallery language server"
)]
pub struct TypfigCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Create a sample `typfig.toml` in the project root.
	///
	/// If a config file already exists, this command is a no-op and exits
	/// successfully.
	Init,
	/// List every figure reachable from a document.
	///
	/// The document is treated as the active document: typfig first looks
	/// for the root document that includes it, then walks the include graph
	/// from that root. Figures are numbered in traversal order.
	Scan {
		/// The active document, relative to the current directory.
		document: PathBuf,

		/// Output format. `json` prints one `FigureSetUpdated` message per
		/// scan.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Re-scan whenever a project file changes.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Render the figures reachable from a document as a static HTML
	/// gallery.
	Gallery {
		/// The active document, relative to the current directory.
		document: PathBuf,

		/// Write the gallery to this file instead of stdout.
		#[arg(long, short)]
		output: Option<PathBuf>,
	},
	/// Print the root document resolved for a document.
	Root {
		/// The active document, relative to the current directory.
		document: PathBuf,

		/// Output format.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Open a figure's source document at a line.
	///
	/// Launches `$VISUAL` or `$EDITOR` with `+LINE PATH`. Without an editor
	/// configured, prints `PATH:LINE`.
	Open {
		/// The document to open.
		file: PathBuf,

		/// 1-based line number.
		line: usize,
	},
	/// Start the typfig language server (LSP).
	///
	/// Communicates over stdin/stdout using the Language Server Protocol.
	/// Besides document sync it provides the `typfig/openGallery`,
	/// `typfig/closeGallery`, `typfig/activeDocumentChanged` and
	/// `typfig/navigate` methods and pushes `typfig/figureSetUpdated`
	/// notifications while a gallery is open.
	Lsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
