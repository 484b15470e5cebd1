use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn typfig_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("typfig"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("TYPFIG_LOG");
	cmd
}

#[allow(dead_code)]
pub fn write(root: &Path, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	path
}

/// A small book: `main.typ` includes one chapter, both with a figure.
#[allow(dead_code)]
pub fn book_project() -> tempfile::TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	write(tmp.path(), "figs/cover.png", b"png");
	write(tmp.path(), "figs/plot.png", b"png");
	write(
		tmp.path(),
		"main.typ",
		"#include \"chapters/intro.typ\"\n#figure(image(\"figs/cover.png\"), caption: [Cover]) <fig:cover>\n",
	);
	write(
		tmp.path(),
		"chapters/intro.typ",
		"= Intro\n// #figure(image(\"../figs/old.png\"))\n#figure(image(\"../figs/plot.png\"), caption: \"Plot\")\n",
	);
	tmp
}
