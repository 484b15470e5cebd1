use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Instant;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use typfig_cli::Commands;
use typfig_cli::OutputFormat;
use typfig_cli::TypfigCli;
use typfig_core::CONFIG_FILE_CANDIDATES;
use typfig_core::Debouncer;
use typfig_core::DiagnosticKind;
use typfig_core::DiskSource;
use typfig_core::FigureScan;
use typfig_core::NavigationTarget;
use typfig_core::ScanDiagnostic;
use typfig_core::Scanner;
use typfig_core::TypfigConfig;
use typfig_core::render_gallery_html;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

const LOG_ENV: &str = "TYPFIG_LOG";

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TypfigCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminal support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Scan {
			document,
			format,
			watch,
		}) => run_scan(&args, document, *format, *watch),
		Some(Commands::Gallery { document, output }) => {
			run_gallery(&args, document, output.as_deref())
		}
		Some(Commands::Root { document, format }) => run_root(&args, document, *format),
		Some(Commands::Open { file, line }) => run_open(file, *line),
		Some(Commands::Lsp) => run_lsp(),
		None => {
			eprintln!("No subcommand specified. Run `typfig --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<typfig_core::TypfigError>() {
			Ok(typfig_err) => {
				let report: miette::Report = (*typfig_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

/// Logs go to stderr so stdout stays clean for JSON output and the language
/// server transport.
fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.try_init()
		.ok();
}

fn resolve_root(args: &TypfigCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Find the active document: as given when it exists relative to the
/// working directory, otherwise relative to the project root.
fn resolve_document(root: &Path, document: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
	let candidates = if document.is_absolute() {
		vec![document.to_path_buf()]
	} else {
		vec![document.to_path_buf(), root.join(document)]
	};

	candidates
		.into_iter()
		.find(|candidate| candidate.is_file())
		.ok_or_else(|| format!("document `{}` does not exist", document.display()).into())
}

fn run_init(args: &TypfigCli) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);

	if let Some(existing) = TypfigConfig::resolve_path(&root) {
		println!("Config file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	let sample_config = "# typfig configuration\n\n# Extension of Typst documents. Include \
	                     paths without it get it appended.\n# extension = \"typ\"\n\n# Characters \
	                     after a figure's closing `)` searched for its `<label>`.\n# \
	                     label_lookahead = 200\n\n# Delay before re-scanning after an edit, in \
	                     milliseconds.\n# debounce_ms = 300\n\n# File names tried first when \
	                     looking for the root document.\n# [root]\n# prefer = [\"main.typ\"]\n\n# \
	                     Gitignore-style patterns never used as root documents or watched.\n# \
	                     [exclude]\n# patterns = [\"templates/\"]\n";

	std::fs::write(&config_path, sample_config)?;
	println!("Created {}", config_path.display());
	println!();
	println!("Next steps:");
	println!("  1. Uncomment the settings you want to change");
	println!("  2. Run `typfig scan <document>` to list your figures");

	Ok(())
}

fn run_scan(
	args: &TypfigCli,
	document: &Path,
	format: OutputFormat,
	watch: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let scanner = Scanner::from_config(&root)?;
	let document = resolve_document(&root, document)?;

	let scan = scanner.scan(&document, &DiskSource);
	print_scan(&scan, scanner.project_root(), format, args.verbose)?;

	if !watch {
		return Ok(());
	}

	if format == OutputFormat::Text {
		println!("\nWatching for file changes... (press Ctrl+C to stop)");
	}

	let (tx, rx) = mpsc::channel::<Vec<PathBuf>>();
	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_)
						| notify::EventKind::Create(_)
						| notify::EventKind::Remove(_)
				) {
					let _ = tx.send(event.paths);
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(scanner.project_root(), notify::RecursiveMode::Recursive)?;

	let mut debouncer = Debouncer::new(scanner.options().debounce);
	loop {
		let received = match debouncer.remaining(Instant::now()) {
			Some(wait) => {
				match rx.recv_timeout(wait) {
					Ok(paths) => Some(paths),
					Err(mpsc::RecvTimeoutError::Timeout) => None,
					Err(e @ mpsc::RecvTimeoutError::Disconnected) => return Err(e.into()),
				}
			}
			None => Some(rx.recv()?),
		};

		if let Some(paths) = received {
			if paths.iter().any(|path| scanner.is_relevant_change(path)) {
				tracing::debug!(?paths, "relevant change");
				debouncer.trigger(Instant::now());
			}
		}

		if debouncer.take_due(Instant::now()) {
			if format == OutputFormat::Text {
				println!("\nFile change detected, scanning...");
			}
			let scan = scanner.scan(&document, &DiskSource);
			if let Err(e) = print_scan(&scan, scanner.project_root(), format, args.verbose) {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
	}
}

fn print_scan(
	scan: &FigureScan,
	root: &Path,
	format: OutputFormat,
	verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	if verbose {
		for diagnostic in &scan.diagnostics {
			let report = diagnostic_to_report(diagnostic, &make_relative(&diagnostic.file, root));
			eprintln!("{report:?}");
		}
	}

	if format == OutputFormat::Json {
		let mut stdout = std::io::stdout().lock();
		writeln!(stdout, "{}", serde_json::to_string(&scan.to_message())?)?;
		stdout.flush()?;
		return Ok(());
	}

	let root_label = make_relative(&scan.root.document, root);
	if scan.root.is_fallback() {
		println!("{} {root_label} (no root document found)", colored!("Root:", bold));
	} else {
		println!("{} {root_label}", colored!("Root:", bold));
	}

	if verbose {
		for document in &scan.documents {
			println!("  visited {}", make_relative(document, root));
		}
	}

	if scan.figures.is_empty() {
		println!("No figures found.");
		return Ok(());
	}

	println!();
	for figure in &scan.figures {
		let heading = format!("Figure {}", figure.ordinal);
		let label = if figure.has_label() {
			format!(" {}", colored!(figure.label, green))
		} else {
			String::new()
		};
		println!("  {}{label}: {}", colored!(heading, bold), figure.caption);
		println!(
			"    {}:{} {}",
			make_relative(&figure.source_path, root),
			figure.line,
			figure.image_path
		);
	}

	println!(
		"\n{} figure(s) in {} document(s)",
		scan.figures.len(),
		scan.documents.len()
	);

	Ok(())
}

fn run_gallery(
	args: &TypfigCli,
	document: &Path,
	output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let scanner = Scanner::from_config(&root)?;
	let document = resolve_document(&root, document)?;

	let scan = scanner.scan(&document, &DiskSource);
	let html = render_gallery_html(&scan.figures)?;

	match output {
		Some(path) => {
			std::fs::write(path, html)?;
			println!(
				"Wrote gallery with {} figure(s) to {}",
				scan.figures.len(),
				path.display()
			);
		}
		None => print!("{html}"),
	}

	Ok(())
}

fn run_root(args: &TypfigCli, document: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let scanner = Scanner::from_config(&root)?;
	let document = resolve_document(&root, document)?;

	let resolution = scanner.resolve_root(&document, &DiskSource);

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(&resolution)?),
		OutputFormat::Text => {
			let rel = make_relative(&resolution.document, scanner.project_root());
			if resolution.is_fallback() {
				println!("{rel} (no root document found, using the document itself)");
			} else {
				println!("{rel}");
			}
		}
	}

	Ok(())
}

fn run_open(file: &Path, line: usize) -> Result<(), Box<dyn std::error::Error>> {
	let target = match NavigationTarget::new(file, line) {
		Ok(target) => target,
		Err(e) => {
			eprintln!("{} {e}", colored!("warning:", yellow));
			process::exit(1);
		}
	};

	let editor = ["VISUAL", "EDITOR"]
		.into_iter()
		.filter_map(std::env::var_os)
		.find(|value| !value.is_empty());

	let Some(editor) = editor else {
		println!("{}:{}", target.path.display(), target.line);
		return Ok(());
	};

	// Editors are commonly configured with arguments, e.g. `code --wait`.
	let editor = editor.to_string_lossy().into_owned();
	let mut parts = editor.split_whitespace();
	let Some(program) = parts.next() else {
		println!("{}:{}", target.path.display(), target.line);
		return Ok(());
	};

	tracing::debug!(program, path = %target.path.display(), line = target.line, "launching editor");
	let status = process::Command::new(program)
		.args(parts)
		.arg(format!("+{}", target.line))
		.arg(&target.path)
		.status();

	match status {
		Ok(status) if status.success() => Ok(()),
		Ok(status) => {
			eprintln!(
				"{} Cannot open file: {} ({program} exited with {status})",
				colored!("warning:", yellow),
				target.path.display()
			);
			process::exit(1);
		}
		Err(e) => {
			eprintln!(
				"{} Cannot open file: {} ({program}: {e})",
				colored!("warning:", yellow),
				target.path.display()
			);
			process::exit(1);
		}
	}
}

fn run_lsp() -> Result<(), Box<dyn std::error::Error>> {
	let rt = tokio::runtime::Runtime::new()?;
	rt.block_on(typfig_lsp::run_server());
	Ok(())
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Convert a `ScanDiagnostic` into a warning `miette::Report` with an error
/// code and help text for rich terminal display.
fn diagnostic_to_report(diag: &ScanDiagnostic, rel_path: &str) -> miette::Report {
	let location = if diag.line == 0 {
		rel_path.to_string()
	} else {
		format!("{rel_path}:{}", diag.line)
	};

	let message = format!("[{location}] {}", diag.message());
	let (code, help) = match &diag.kind {
		DiagnosticKind::CommentedOut { .. } => {
			("typfig::commented_out", "remove the comment markers to show this figure")
		}
		DiagnosticKind::UnbalancedBlock => {
			("typfig::unbalanced_block", "every `(` opened by a figure needs a matching `)`")
		}
		DiagnosticKind::MissingImage => (
			"typfig::missing_image",
			"only figures wrapping an `image(\"...\")` call are shown",
		),
		DiagnosticKind::ImageNotFound { .. } => (
			"typfig::image_not_found",
			"image paths are resolved relative to the document that contains the figure",
		),
		DiagnosticKind::UnreadableDocument { .. } => {
			("typfig::unreadable_document", "check that the file is valid UTF-8 and readable")
		}
		_ => ("typfig::diagnostic", "this figure was skipped"),
	};

	let diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_help(help)
		.with_severity(miette::Severity::Warning);
	miette::Report::new(diag_value)
}
