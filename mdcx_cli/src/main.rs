use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use mdcx_cli::Commands;
use mdcx_cli::MdcxCli;
use mdcx_cli::OutputFormat;
use mdcx_core::AnyError;
use mdcx_core::RenderProblem;
use mdcx_core::render_document;
use mdcx_core::render_page;
use mdcx_core::site::scan_site_with_config;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

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
	let args = MdcxCli::parse();

	// Respect the NO_COLOR env var, the --no-color flag, and terminal
	// support.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	if args.verbose {
		let filter = tracing_subscriber::EnvFilter::try_from_default_env()
			.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mdcx_core=debug,mdcx=debug"));
		tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_writer(std::io::stderr)
			.init();
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

	let result = match args.command {
		Some(Commands::Init) => run_init(&args),
		Some(Commands::Check { format, watch }) => run_check(&args, format, watch),
		Some(Commands::Build {
			ref out,
			dry_run,
			watch,
		}) => run_build(&args, out, dry_run, watch),
		Some(Commands::List) => run_list(&args),
		None => {
			eprintln!("No subcommand specified. Run `mdcx --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<mdcx_core::MdcxError>() {
			Ok(mdcx_err) => {
				let report: miette::Report = (*mdcx_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn resolve_root(args: &MdcxCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn run_init(args: &MdcxCli) -> Result<(), AnyError> {
	let root = resolve_root(args);
	let docs_dir = root.join("docs");
	let page_path = docs_dir.join("intro.md");
	let config_path = root.join("mdcx.toml");

	let page_exists = page_path.exists();
	let config_exists = config_path.exists();

	if page_exists {
		println!("Sample page already exists: {}", page_path.display());
	} else {
		let sample_page = "---\ntitle: Introduction\nsidebar_position: 1\n---\n\n# \
		                   Introduction\n\nWelcome! Components are capitalized tags inside \
		                   markdown:\n\n<Callout kind=\"tip\">\n\nDefine components under \
		                   `[components]` in `mdcx.toml`.\n\n</Callout>\n";

		std::fs::create_dir_all(&docs_dir)?;
		std::fs::write(&page_path, sample_page)?;
		println!("Created sample page: {}", page_path.display());
	}

	if config_exists {
		// Skip silently if config already exists.
	} else {
		let sample_config = "# mdcx configuration\n\n[site]\n# title = \"My Docs\"\n# base_path \
		                     = \"/docs\"\n\n# Components referenced from markdown resolve \
		                     through this table.\n[components]\nCallout = { source = \"<aside \
		                     class=\\\"callout callout-{{ props.kind }}\\\">{{ children \
		                     }}</aside>\" }\n";

		std::fs::write(&config_path, sample_config)?;
		println!("Created mdcx.toml");
	}

	if !page_exists {
		println!();
		println!("Next steps:");
		println!("  1. Edit {} to write your docs", page_path.display());
		println!("  2. Register components in mdcx.toml:");
		println!("     Badge = {{ element = \"span\" }}");
		println!("  3. Run `mdcx check` to verify every reference resolves");
		println!("  4. Run `mdcx build` to render HTML");
	}

	Ok(())
}

fn run_check(args: &MdcxCli, format: OutputFormat, watch: bool) -> Result<(), AnyError> {
	// Run the initial check.
	let has_problems = run_check_once(args, format)?;

	if !watch {
		if has_problems {
			process::exit(1);
		}
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		// Debounce: drain additional events within 200ms.
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, checking...");
		if let Err(e) = run_check_once(args, format) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

/// Run a single check and return whether any problems were found.
fn run_check_once(args: &MdcxCli, format: OutputFormat) -> Result<bool, AnyError> {
	let root = resolve_root(args);
	let ctx = scan_site_with_config(&root)?;

	if args.verbose {
		println!(
			"Scanned site: {} page(s), {} registered component(s)",
			ctx.site.pages.len(),
			ctx.base_mapping.len()
		);
	}

	let mut problems: Vec<RenderProblem> = Vec::new();

	for page in &ctx.site.pages {
		let rendered = render_page(page, &ctx.base_mapping)?;
		problems.extend(rendered.problems);
	}

	problems.sort_by(|a, b| {
		make_relative(&a.file, &root)
			.cmp(&make_relative(&b.file, &root))
			.then_with(|| a.line.cmp(&b.line))
			.then_with(|| a.column.cmp(&b.column))
			.then_with(|| a.component.cmp(&b.component))
	});

	let diagnostics = &ctx.site.diagnostics;
	let ok = problems.is_empty() && diagnostics.is_empty();

	match format {
		OutputFormat::Json => {
			let problem_entries: Vec<serde_json::Value> = problems
				.iter()
				.map(|problem| {
					serde_json::json!({
						"file": make_relative(&problem.file, &root),
						"component": problem.component,
						"line": problem.line,
						"column": problem.column,
						"message": problem.message,
					})
				})
				.collect();
			let diagnostic_entries: Vec<serde_json::Value> = diagnostics
				.iter()
				.map(|diagnostic| {
					serde_json::json!({
						"file": make_relative(&diagnostic.file, &root),
						"line": diagnostic.line,
						"column": diagnostic.column,
						"message": diagnostic.message(),
					})
				})
				.collect();
			let output = serde_json::json!({
				"ok": ok,
				"problems": problem_entries,
				"diagnostics": diagnostic_entries,
			});
			println!("{output}");
		}
		OutputFormat::Github => {
			for problem in &problems {
				let rel = make_relative(&problem.file, &root);
				println!(
					"::error file={rel},line={},col={}::Component `{}` failed: {}",
					problem.line, problem.column, problem.component, problem.message
				);
			}
			for diagnostic in diagnostics {
				let rel = make_relative(&diagnostic.file, &root);
				println!(
					"::warning file={rel},line={}::{}",
					diagnostic.line,
					diagnostic.message()
				);
			}
			if ok {
				println!("All component references resolve.");
			}
		}
		OutputFormat::Text => {
			if ok {
				println!(
					"Check passed: all components resolved across {} page(s).",
					ctx.site.pages.len()
				);
			} else {
				eprintln!("Check failed.");
				eprintln!("  component problems: {}", problems.len());
				eprintln!("  scan diagnostics: {}", diagnostics.len());

				if !problems.is_empty() {
					eprintln!();
					eprintln!("Problems:");
					for problem in &problems {
						let rel = make_relative(&problem.file, &root);
						eprintln!(
							"  component `{}` at {rel}:{}:{}: {}",
							problem.component, problem.line, problem.column, problem.message
						);
					}
				}

				if !diagnostics.is_empty() {
					eprintln!();
					eprintln!("Diagnostics:");
					for diagnostic in diagnostics {
						let rel = make_relative(&diagnostic.file, &root);
						eprintln!("  {rel}:{}: {}", diagnostic.line, diagnostic.message());
					}
				}
			}
		}
	}

	Ok(!ok)
}

fn run_build(args: &MdcxCli, out: &Path, dry_run: bool, watch: bool) -> Result<(), AnyError> {
	// Run the initial build.
	run_build_once(args, out, dry_run)?;

	if !watch || dry_run {
		return Ok(());
	}

	// Watch mode
	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let root = resolve_root(args);
	let (tx, rx) = mpsc::channel();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					let _ = tx.send(());
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	loop {
		rx.recv()?;
		while rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

		println!("\nFile change detected, building...");
		if let Err(e) = run_build_once(args, out, dry_run) {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn run_build_once(args: &MdcxCli, out: &Path, dry_run: bool) -> Result<(), AnyError> {
	let root = resolve_root(args);
	let out_dir = if out.is_absolute() {
		out.to_path_buf()
	} else {
		root.join(out)
	};
	let ctx = scan_site_with_config(&root)?;
	let site_title = ctx.config.as_ref().and_then(|config| config.site.title.clone());

	let pages = ctx.site.navigation_pages();
	let mut written = 0;
	let mut problem_count = 0;

	for page in &pages {
		let rendered = render_document(page, &ctx.base_mapping, site_title.as_deref())?;

		for problem in &rendered.problems {
			let rel = make_relative(&problem.file, &root);
			eprintln!(
				"{} component `{}` at {rel}:{}:{}: {}",
				colored!("warning:", yellow),
				problem.component,
				problem.line,
				problem.column,
				problem.message
			);
			problem_count += 1;
		}

		let out_path = out_dir.join(format!("{}.html", page.id));

		if dry_run {
			match std::fs::read_to_string(&out_path) {
				Ok(existing) if existing == rendered.html => {
					println!("unchanged: {}", make_relative(&out_path, &root));
				}
				Ok(existing) => {
					println!("would update: {}", make_relative(&out_path, &root));
					print_diff(&existing, &rendered.html);
				}
				Err(_) => {
					println!("would create: {}", make_relative(&out_path, &root));
				}
			}
			continue;
		}

		if let Some(parent) = out_path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&out_path, &rendered.html)?;
		written += 1;
	}

	if dry_run {
		println!("Dry run complete: {} page(s) considered.", pages.len());
	} else {
		println!("Built {written} page(s) into {}", out_dir.display());
	}

	if problem_count > 0 {
		eprintln!(
			"{} {problem_count} component problem(s); run `mdcx check` for details",
			colored!("warning:", yellow)
		);
	}

	Ok(())
}

fn run_list(args: &MdcxCli) -> Result<(), AnyError> {
	let root = resolve_root(args);
	let ctx = scan_site_with_config(&root)?;

	println!("{}", colored!("Pages:", bold));
	if ctx.site.pages.is_empty() {
		println!("  (none found)");
	}
	for page in &ctx.site.pages {
		let draft = if page.front_matter.draft {
			" (draft)"
		} else {
			""
		};
		println!("  {} -> {}{draft}", page.id, page.permalink);
	}

	println!();
	println!("{}", colored!("Components:", bold));
	let mut names: Vec<String> = ctx.base_mapping.keys().cloned().collect();
	names.sort();
	if names.is_empty() {
		println!("  (none registered)");
	}
	for name in names {
		println!("  {name}");
	}

	for diagnostic in &ctx.site.diagnostics {
		let rel = make_relative(&diagnostic.file, &root);
		eprintln!(
			"{} {rel}:{}: {}",
			colored!("warning:", yellow),
			diagnostic.line,
			diagnostic.message()
		);
	}

	Ok(())
}

fn print_diff(old: &str, new: &str) {
	let diff = TextDiff::from_lines(old, new);

	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => print!("{}", colored!(format!("-{change}"), red)),
			ChangeTag::Insert => print!("{}", colored!(format!("+{change}"), green)),
			ChangeTag::Equal => print!(" {change}"),
		}
	}
}
