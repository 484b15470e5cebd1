use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tower_lsp_server::Client;
use tower_lsp_server::LanguageServer;
use tower_lsp_server::jsonrpc::Result as LspResult;
use tower_lsp_server::ls_types::notification::Notification;
use tower_lsp_server::ls_types::*;
use typfig_core::BufferOverlay;
use typfig_core::DEFAULT_DEBOUNCE_MS;
use typfig_core::DEFAULT_EXTENSION;
use typfig_core::FigureRecord;
use typfig_core::FigureScan;
use typfig_core::GalleryMessage;
use typfig_core::GallerySession;
use typfig_core::NavigationTarget;
use typfig_core::ScanOptions;
use typfig_core::Scanner;
use typfig_core::Trigger;
use typfig_core::TriggerAction;
use typfig_core::paths::normalize_path;

/// Pushed to the client after every scan while the gallery is open.
#[derive(Debug)]
pub enum FigureSetUpdated {}

impl Notification for FigureSetUpdated {
	type Params = GalleryMessage;

	const METHOD: &'static str = "typfig/figureSetUpdated";
}

/// Params of the `typfig/openGallery` request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenGalleryParams {
	/// The document to treat as active. Defaults to the last one the server
	/// saw.
	#[serde(default)]
	pub uri: Option<Uri>,
}

/// Params of the `typfig/activeDocumentChanged` notification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDocumentParams {
	pub uri: Uri,
}

/// Params of the `typfig/navigate` request. `line` is 1-based, as in
/// every figure record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
	pub path: PathBuf,
	pub line: usize,
}

/// Workspace-level state shared across all LSP requests.
#[derive(Debug)]
struct WorkspaceState {
	/// The workspace root path.
	root: Option<PathBuf>,
	/// Scanner for the workspace root, rebuilt when the config changes.
	scanner: Option<Scanner>,
	/// Live text of every open document.
	buffers: BufferOverlay,
	/// Gallery open state, active document and pending re-scan.
	session: GallerySession,
}

impl Default for WorkspaceState {
	fn default() -> Self {
		Self {
			root: None,
			scanner: None,
			buffers: BufferOverlay::new(),
			session: GallerySession::new(
				DEFAULT_EXTENSION,
				Duration::from_millis(DEFAULT_DEBOUNCE_MS),
			),
		}
	}
}

impl WorkspaceState {
	/// Point the state at a workspace root and (re)load its config. Called on
	/// initialize and whenever a config file is saved.
	fn configure(&mut self, root: Option<PathBuf>) {
		self.scanner = root.as_deref().and_then(load_scanner);
		self.root = root;

		let (extension, debounce) = self.scanner.as_ref().map_or_else(
			|| {
				(
					DEFAULT_EXTENSION.to_string(),
					Duration::from_millis(DEFAULT_DEBOUNCE_MS),
				)
			},
			|scanner| (scanner.options().extension.clone(), scanner.options().debounce),
		);

		let was_open = self.session.is_open();
		let active = self.session.active_document().map(Path::to_path_buf);
		self.session = GallerySession::new(&extension, debounce);
		if was_open {
			self.session.open();
		}
		if let Some(active) = active {
			self.session.set_active(&active);
		}
	}

	/// Track a newly opened document and make it the active one.
	fn open_document(&mut self, path: &Path, text: String, now: Instant) -> TriggerAction {
		self.buffers.set(path, text);
		self.session
			.handle(Trigger::ActiveDocumentChanged(path.to_path_buf()), now)
	}

	/// Apply content changes to an open buffer. With incremental sync each
	/// change carries the range it replaces; a change without a range
	/// replaces the whole text.
	fn apply_changes(&mut self, path: &Path, changes: Vec<TextDocumentContentChangeEvent>) {
		let Some(content) = self.buffers.get_mut(path) else {
			// Document not tracked yet: use the last change as full content.
			if let Some(change) = changes.into_iter().next_back() {
				self.buffers.set(path, change.text);
			}
			return;
		};

		for change in changes {
			if let Some(range) = change.range {
				let start = lsp_position_to_offset(content, range.start);
				let end = lsp_position_to_offset(content, range.end);
				if let (Some(start), Some(end)) = (start, end) {
					content.replace_range(start..end, &change.text);
				}
			} else {
				*content = change.text;
			}
		}
	}

	/// An edited document becomes the active one.
	fn record_edit(&mut self, path: &Path, now: Instant) -> TriggerAction {
		self.session.set_active(path);
		self.session
			.handle(Trigger::TextChanged(path.to_path_buf()), now)
	}

	/// Forget a closed document's buffer. The figure set now comes from disk,
	/// so an open gallery is refreshed.
	fn close_document(&mut self, path: &Path, now: Instant) -> TriggerAction {
		self.buffers.remove(path);
		if !path.is_file() {
			self.session.clear_active(path);
		}
		self.session
			.handle(Trigger::TextChanged(path.to_path_buf()), now)
	}

	/// Scan from the active document with open buffers taking precedence
	/// over disk. Returns `None` when no markup document has been active yet.
	fn scan(&self) -> Option<FigureScan> {
		let active = self.session.active_document()?;

		let scan = if let Some(scanner) = &self.scanner {
			scanner.scan(active, &self.buffers)
		} else {
			// No workspace folder: treat the document's own directory as the
			// project.
			let scanner = Scanner::new(active.parent()?, ScanOptions::default()).ok()?;
			scanner.scan(active, &self.buffers)
		};

		Some(scan)
	}
}

fn load_scanner(root: &Path) -> Option<Scanner> {
	match Scanner::from_config(root) {
		Ok(scanner) => Some(scanner),
		Err(e) => {
			tracing::warn!(root = %root.display(), error = %e, "failed to load config, using defaults");
			Scanner::new(root, ScanOptions::default()).ok()
		}
	}
}

fn is_config_file(path: &Path) -> bool {
	path.file_name()
		.and_then(|name| name.to_str())
		.is_some_and(|name| matches!(name, "typfig.toml" | ".typfig.toml"))
}

fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
	uri.to_file_path()
		.map(|path| normalize_path(&path))
}

/// Convert an LSP `Position` (0-indexed line, character in UTF-16 code units)
/// to a byte offset within `content`. Returns `None` if the position is out of
/// bounds.
fn lsp_position_to_offset(content: &str, position: Position) -> Option<usize> {
	let mut offset = 0;
	for (i, line) in content.split('\n').enumerate() {
		if i == position.line as usize {
			let mut utf16_offset = 0u32;
			for (byte_idx, c) in line.char_indices() {
				if utf16_offset == position.character {
					return Some(offset + byte_idx);
				}
				utf16_offset += c.len_utf16() as u32;
			}
			// Position at end of line (past last character).
			if utf16_offset == position.character {
				return Some(offset + line.len());
			}
			return None;
		}
		offset += line.len() + 1;
	}
	None
}

/// The typfig language server: the live host of a figure gallery.
#[derive(Debug)]
pub struct TypfigLanguageServer {
	client: Client,
	state: Arc<RwLock<WorkspaceState>>,
	/// The single pending debounced re-scan, if any.
	pending: Mutex<Option<JoinHandle<()>>>,
}

impl TypfigLanguageServer {
	pub fn new(client: Client) -> Self {
		Self {
			client,
			state: Arc::new(RwLock::new(WorkspaceState::default())),
			pending: Mutex::new(None),
		}
	}

	async fn dispatch(&self, action: TriggerAction) {
		match action {
			TriggerAction::Ignore => {}
			TriggerAction::ScanNow => {
				self.rescan_now().await;
			}
			TriggerAction::Debounced => self.schedule_rescan().await,
		}
	}

	/// Scan immediately and publish the result, dropping any pending timer.
	async fn rescan_now(&self) -> Vec<FigureRecord> {
		self.cancel_pending().await;

		let scan = { self.state.read().await.scan() };
		let Some(scan) = scan else {
			return Vec::new();
		};

		let figures = scan.figures.clone();
		publish(&self.client, &scan).await;
		figures
	}

	/// Abort the pending timer task and spawn a fresh one, so only the last
	/// trigger of a burst produces a scan.
	async fn schedule_rescan(&self) {
		let delay = { self.state.read().await.session.debounce_delay() };
		let state = Arc::clone(&self.state);
		let client = self.client.clone();

		let task = tokio::spawn(async move {
			tokio::time::sleep(delay).await;

			let scan = {
				let mut state = state.write().await;
				if !state.session.take_due(Instant::now()) {
					return;
				}
				state.scan()
			};

			if let Some(scan) = scan {
				publish(&client, &scan).await;
			}
		});

		if let Some(previous) = self.pending.lock().await.replace(task) {
			previous.abort();
		}
	}

	async fn cancel_pending(&self) {
		if let Some(previous) = self.pending.lock().await.take() {
			previous.abort();
		}
	}

	/// `typfig/openGallery`: open (or reveal) the gallery and return the
	/// current figure set.
	async fn open_gallery(&self, params: OpenGalleryParams) -> LspResult<Vec<FigureRecord>> {
		{
			let mut state = self.state.write().await;
			if let Some(path) = params.uri.as_ref().and_then(uri_to_path) {
				state.session.set_active(&path);
			}
			state.session.handle(Trigger::OpenRequested, Instant::now());
		}

		Ok(self.rescan_now().await)
	}

	/// `typfig/closeGallery`: stop publishing figure sets.
	async fn close_gallery(&self) {
		self.cancel_pending().await;
		self.state.write().await.session.close();
	}

	/// `typfig/activeDocumentChanged`: the user focused another document.
	async fn active_document_changed(&self, params: ActiveDocumentParams) {
		let Some(path) = uri_to_path(&params.uri) else {
			return;
		};

		let action = {
			self.state
				.write()
				.await
				.session
				.handle(Trigger::ActiveDocumentChanged(path), Instant::now())
		};
		self.dispatch(action).await;
	}

	/// `typfig/navigate`: show a figure's source document with the cursor on
	/// its line. Failures are reported to the user and answered with `false`.
	async fn navigate(&self, params: NavigateParams) -> LspResult<bool> {
		let target = match NavigationTarget::new(&params.path, params.line) {
			Ok(target) => target,
			Err(e) => {
				self.client.show_message(MessageType::ERROR, e.to_string()).await;
				return Ok(false);
			}
		};

		let failure = format!("Cannot open file: {}", target.path.display());
		let Some(uri) = Uri::from_file_path(&target.path) else {
			self.client.show_message(MessageType::ERROR, failure).await;
			return Ok(false);
		};

		let line = target.zero_based_line() as u32;
		let cursor = Position::new(line, 0);
		let shown = self
			.client
			.show_document(ShowDocumentParams {
				uri,
				external: Some(false),
				take_focus: Some(true),
				selection: Some(Range::new(cursor, cursor)),
			})
			.await;

		match shown {
			Ok(true) => Ok(true),
			Ok(false) | Err(_) => {
				tracing::warn!(path = %target.path.display(), line = target.line, "navigation failed");
				self.client.show_message(MessageType::ERROR, failure).await;
				Ok(false)
			}
		}
	}
}

async fn publish(client: &Client, scan: &FigureScan) {
	tracing::debug!(figures = scan.figures.len(), "publishing figure set");
	client
		.send_notification::<FigureSetUpdated>(scan.to_message())
		.await;
}

impl LanguageServer for TypfigLanguageServer {
	async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
		// Determine workspace root: prefer `workspace_folders` (modern LSP),
		// fall back to the deprecated `root_uri` for older clients.
		let root = params
			.workspace_folders
			.as_ref()
			.and_then(|folders| folders.first())
			.and_then(|folder| uri_to_path(&folder.uri))
			.or_else(|| {
				#[allow(deprecated)]
				params.root_uri.as_ref().and_then(uri_to_path)
			});

		{
			let mut state = self.state.write().await;
			state.configure(root);
		}

		Ok(InitializeResult {
			capabilities: ServerCapabilities {
				text_document_sync: Some(TextDocumentSyncCapability::Options(
					TextDocumentSyncOptions {
						open_close: Some(true),
						change: Some(TextDocumentSyncKind::INCREMENTAL),
						save: Some(TextDocumentSyncSaveOptions::Supported(true)),
						..Default::default()
					},
				)),
				..Default::default()
			},
			server_info: Some(ServerInfo {
				name: "typfig-lsp".to_string(),
				version: Some(env!("CARGO_PKG_VERSION").to_string()),
			}),
			offset_encoding: None,
		})
	}

	async fn initialized(&self, _: InitializedParams) {
		self.client
			.log_message(MessageType::INFO, "typfig language server initialized")
			.await;
	}

	async fn shutdown(&self) -> LspResult<()> {
		self.cancel_pending().await;
		Ok(())
	}

	async fn did_open(&self, params: DidOpenTextDocumentParams) {
		let Some(path) = uri_to_path(&params.text_document.uri) else {
			return;
		};

		let action = {
			let mut state = self.state.write().await;
			state.open_document(&path, params.text_document.text, Instant::now())
		};
		self.dispatch(action).await;
	}

	async fn did_change(&self, params: DidChangeTextDocumentParams) {
		let Some(path) = uri_to_path(&params.text_document.uri) else {
			return;
		};

		let action = {
			let mut state = self.state.write().await;
			state.apply_changes(&path, params.content_changes);
			state.record_edit(&path, Instant::now())
		};
		self.dispatch(action).await;
	}

	async fn did_save(&self, params: DidSaveTextDocumentParams) {
		let Some(path) = uri_to_path(&params.text_document.uri) else {
			return;
		};

		let action = {
			let mut state = self.state.write().await;
			if is_config_file(&path) {
				// Config changed: rebuild the scanner for new options and
				// exclude rules.
				let root = state.root.clone();
				state.configure(root);
			}
			state.record_edit(&path, Instant::now())
		};
		self.dispatch(action).await;
	}

	async fn did_close(&self, params: DidCloseTextDocumentParams) {
		let Some(path) = uri_to_path(&params.text_document.uri) else {
			return;
		};

		let action = {
			let mut state = self.state.write().await;
			state.close_document(&path, Instant::now())
		};
		self.dispatch(action).await;
	}
}

/// Start the LSP server on stdin/stdout. Used by the `typfig lsp` CLI
/// subcommand.
pub async fn run_server() {
	let stdin = tokio::io::stdin();
	let stdout = tokio::io::stdout();

	let (service, socket) = tower_lsp_server::LspService::build(TypfigLanguageServer::new)
		.custom_method("typfig/openGallery", TypfigLanguageServer::open_gallery)
		.custom_method("typfig/closeGallery", TypfigLanguageServer::close_gallery)
		.custom_method(
			"typfig/activeDocumentChanged",
			TypfigLanguageServer::active_document_changed,
		)
		.custom_method("typfig/navigate", TypfigLanguageServer::navigate)
		.finish();
	tower_lsp_server::Server::new(stdin, stdout, socket)
		.serve(service)
		.await;
}
