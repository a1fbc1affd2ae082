use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Render markdown documentation with scoped, overridable components.",
	long_about = "mdcx (markdown components) renders a directory of markdown pages to HTML, \
	              resolving capitalized component tags like `<Callout kind=\"tip\">` through a \
	              chain of scoped component registries.\n\nQuick start:\n  mdcx init   Create a \
	              sample page and config\n  mdcx check  Verify every component reference \
	              resolves\n  mdcx build  Render pages to HTML documents\n  mdcx list   List \
	              pages and registered components"
)]
pub struct MdcxCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the site root directory.
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
	/// Initialize mdcx in a project by creating a sample page and config.
	///
	/// Creates a `docs/intro.md` page and an `mdcx.toml` registering an
	/// example component. Existing files are left untouched and the command
	/// exits successfully.
	Init,
	/// Check that every component reference on every page resolves.
	///
	/// Scans all markdown files under the root, renders each page in memory,
	/// and reports unresolved components, template failures, and scan
	/// diagnostics such as unclosed tags. Exits with a non-zero status code
	/// when problems are found.
	///
	/// Ideal for CI pipelines. Use `--format` to control the output style.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Watch for file changes and re-run checks automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Render every non-draft page to a full HTML document.
	///
	/// Pages are written under the output directory using their ids (e.g.
	/// `recipe_types/datagen.html`), with previous/next navigation links
	/// from the sidebar ordering.
	Build {
		/// Output directory, resolved relative to the site root.
		#[arg(long, default_value = "build")]
		out: PathBuf,

		/// Preview changes without writing files. Shows a unified diff
		/// against existing output.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Watch for file changes and re-run the build automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// List pages and registered components.
	///
	/// Displays every scanned page with its permalink and draft status,
	/// followed by the component names registered in `mdcx.toml`.
	List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each problem includes the
	/// file path, component name, position, and message.
	Json,
	/// GitHub Actions annotation format. Emits `::warning` or `::error`
	/// annotations that appear inline on pull request diffs.
	Github,
}
