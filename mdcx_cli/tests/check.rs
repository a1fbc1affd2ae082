mod common;

use mdcx_core::AnyEmptyResult;

#[test]
fn check_passes_when_all_components_resolve() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(
		tmp.path().join("mdcx.toml"),
		"[components]\nCallout = { source = \"<aside>{{ children }}</aside>\" }\n",
	)?;
	std::fs::write(
		tmp.path().join("datagen.md"),
		"# Datagen\n\n<Callout kind=\"tip\">\n\nUse the datagen.\n\n</Callout>\n",
	)?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"));

	Ok(())
}

#[test]
fn check_fails_on_unresolved_components() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(
		tmp.path().join("page.md"),
		"# Page\n\n<MissingComponent />\n",
	)?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.stderr(predicates::str::contains("MissingComponent"));

	Ok(())
}

#[test]
fn check_reports_unclosed_components_as_diagnostics() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(
		tmp.path().join("mdcx.toml"),
		"[components]\nCallout = { element = \"aside\" }\n",
	)?;
	std::fs::write(tmp.path().join("page.md"), "# Page\n\n<Callout>\n\ntext\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.failure()
		.stderr(predicates::str::contains("missing its closing tag"));

	Ok(())
}

#[test]
fn check_json_output_reports_status() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(tmp.path().join("page.md"), "# Page\n\njust text\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--format")
		.arg("json")
		.assert()
		.success()
		.stdout(predicates::str::contains("\"ok\":true"));

	Ok(())
}

#[test]
fn check_json_output_lists_problems() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(tmp.path().join("page.md"), "<Missing />\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--format")
		.arg("json")
		.assert()
		.failure()
		.stdout(predicates::str::contains("\"ok\":false"))
		.stdout(predicates::str::contains("Missing"));

	Ok(())
}

#[test]
fn check_github_format_emits_annotations() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(tmp.path().join("page.md"), "<Missing />\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.arg("--format")
		.arg("github")
		.assert()
		.failure()
		.stdout(predicates::str::contains("::error file=page.md"));

	Ok(())
}

#[test]
fn check_passes_on_an_empty_site() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}
