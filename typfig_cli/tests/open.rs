mod common;

use typfig_core::AnyEmptyResult;

#[test]
fn open_prints_location_without_editor() -> AnyEmptyResult {
	let tmp = common::book_project();
	let document = tmp.path().join("main.typ");

	common::typfig_cmd()
		.env_remove("VISUAL")
		.env_remove("EDITOR")
		.arg("open")
		.arg(&document)
		.arg("2")
		.assert()
		.success()
		.stdout(format!("{}:2\n", document.display()));

	Ok(())
}

#[test]
fn open_missing_file_warns_and_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::typfig_cmd()
		.env_remove("VISUAL")
		.env_remove("EDITOR")
		.arg("open")
		.arg(tmp.path().join("gone.typ"))
		.arg("4")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("warning:"))
		.stderr(predicates::str::contains("cannot open file"));

	Ok(())
}

#[test]
fn open_rejects_line_zero() -> AnyEmptyResult {
	let tmp = common::book_project();

	common::typfig_cmd()
		.env_remove("VISUAL")
		.env_remove("EDITOR")
		.arg("open")
		.arg(tmp.path().join("main.typ"))
		.arg("0")
		.assert()
		.code(1);

	Ok(())
}

#[cfg(unix)]
#[test]
fn open_launches_the_configured_editor() -> AnyEmptyResult {
	let tmp = common::book_project();

	common::typfig_cmd()
		.env_remove("VISUAL")
		.env("EDITOR", "true")
		.arg("open")
		.arg(tmp.path().join("main.typ"))
		.arg("2")
		.assert()
		.success();

	Ok(())
}

#[cfg(unix)]
#[test]
fn open_reports_a_failing_editor() -> AnyEmptyResult {
	let tmp = common::book_project();

	common::typfig_cmd()
		.env("VISUAL", "false")
		.arg("open")
		.arg(tmp.path().join("main.typ"))
		.arg("2")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Cannot open file"));

	Ok(())
}
