mod common;

use typfig_core::AnyEmptyResult;

#[test]
fn gallery_writes_html_file() -> AnyEmptyResult {
	let tmp = common::book_project();
	let output = tmp.path().join("gallery.html");

	common::typfig_cmd()
		.arg("gallery")
		.arg("main.typ")
		.arg("--output")
		.arg(&output)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Wrote gallery with 2 figure(s)"));

	let html = std::fs::read_to_string(&output)?;
	assert!(html.contains("Figure Gallery (2)"));
	assert!(html.contains("&lt;fig:cover&gt;"));
	assert!(html.contains("intro.typ:3"));

	Ok(())
}

#[test]
fn gallery_prints_to_stdout_without_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "empty.typ", "= Nothing here\n");

	common::typfig_cmd()
		.arg("gallery")
		.arg("empty.typ")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::starts_with("<!DOCTYPE html>"))
		.stdout(predicates::str::contains("No figures found"));

	Ok(())
}
