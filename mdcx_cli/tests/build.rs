mod common;

use mdcx_core::AnyEmptyResult;

#[test]
fn build_writes_html_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(
		tmp.path().join("mdcx.toml"),
		"[site]\ntitle = \"Theurgy\"\n\n[components]\nCallout = { element = \"aside\" }\n",
	)?;
	std::fs::write(
		tmp.path().join("datagen.md"),
		"---\ntitle: Datagen\nsidebar_position: 5\n---\n\n# Datagen\n\n<Callout>\n\nUse the \
		 datagen.\n\n</Callout>\n",
	)?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.arg("--out")
		.arg("dist")
		.assert()
		.success()
		.stdout(predicates::str::contains("Built 1 page(s)"));

	let output = std::fs::read_to_string(tmp.path().join("dist").join("datagen.html"))?;
	assert!(output.contains("<title>Datagen | Theurgy</title>"));
	assert!(output.contains("<h1>Datagen</h1>"));
	assert!(output.contains("<aside>"));

	Ok(())
}

#[test]
fn build_dry_run_writes_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(tmp.path().join("page.md"), "# Page\n\ntext\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.arg("--out")
		.arg("dist")
		.arg("--dry-run")
		.assert()
		.success()
		.stdout(predicates::str::contains("would create"));

	assert!(!tmp.path().join("dist").exists());

	Ok(())
}

#[test]
fn build_skips_draft_pages() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	std::fs::write(
		tmp.path().join("published.md"),
		"---\ntitle: Published\n---\n\ntext\n",
	)?;
	std::fs::write(
		tmp.path().join("hidden.md"),
		"---\ntitle: Hidden\ndraft: true\n---\n\ntext\n",
	)?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.arg("--out")
		.arg("dist")
		.assert()
		.success();

	assert!(tmp.path().join("dist").join("published.html").is_file());
	assert!(!tmp.path().join("dist").join("hidden.html").exists());

	Ok(())
}

#[test]
fn build_nests_output_by_page_id() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let nested = tmp.path().join("recipe_types");
	std::fs::create_dir_all(&nested)?;
	std::fs::write(nested.join("datagen.md"), "# Datagen\n")?;

	let mut cmd = common::mdcx_cmd();
	let _ = cmd
		.arg("build")
		.arg("--path")
		.arg(tmp.path())
		.arg("--out")
		.arg("dist")
		.assert()
		.success();

	assert!(
		tmp.path()
			.join("dist")
			.join("recipe_types")
			.join("datagen.html")
			.is_file()
	);

	Ok(())
}
