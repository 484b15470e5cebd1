//! `typfig_core` is the core library for typfig, a live figure gallery for
//! [Typst](https://typst.app) projects. It finds every `#figure(...)` in a
//! project's include graph without compiling the document, and hands the
//! numbered results to whatever presentation surface is attached.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Active document
//!   → Root resolver (walks ancestor directories for a document with #include/#import)
//!   → Include graph walker (depth-first, each document once, buffers before disk)
//!   → Figure extractor (keyword match, comment check, balanced-paren scan, fields)
//!   → Numbering → GalleryMessage::FigureSetUpdated
//! ```
//!
//! ## Modules
//!
//! - [`delimiter`]: balanced delimiter scanning.
//! - [`comment`]: line and block comment detection.
//! - [`extract`]: figure extraction from a single document.
//! - [`graph`]: include graph traversal.
//! - [`root`]: root document resolution.
//! - [`content`]: reading documents from open buffers or disk.
//! - [`session`]: gallery lifecycle and re-scan debouncing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use typfig_core::DiskSource;
//! use typfig_core::Scanner;
//!
//! let scanner = Scanner::from_config(Path::new(".")).unwrap();
//! let scan = scanner.scan(Path::new("chapters/intro.typ"), &DiskSource);
//! for figure in &scan.figures {
//! 	println!("Figure {}: {} ({}:{})", figure.ordinal, figure.caption, figure.source_file, figure.line);
//! }
//! ```

pub use config::*;
pub use content::*;
pub use error::*;
pub use extract::*;
pub use filter::*;
pub use html::*;
pub use message::*;
pub use root::*;
pub use scan::*;
pub use session::*;

pub mod comment;
pub mod config;
pub mod content;
pub mod delimiter;
#[allow(unused_assignments)]
mod error;
pub mod extract;
mod filter;
pub mod graph;
mod html;
mod message;
pub mod paths;
pub mod root;
mod scan;
pub mod session;
