use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::MdcxError;
use crate::MdcxResult;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::MdcxConfig;
use crate::frontmatter::FrontMatter;
use crate::frontmatter::front_matter_line_offset;
use crate::frontmatter::parse_front_matter;
use crate::parser::ComponentBlock;
use crate::parser::ParseDiagnostic;
use crate::parser::parse_with_diagnostics;
use crate::registry::ComponentMapping;

/// Options for controlling how a site is scanned.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from an [`MdcxConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Glob patterns restricting which files to include.
	pub include_set: GlobSet,
	/// Prefix applied to every permalink.
	pub base_path: String,
	/// Maximum file size to scan in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			include_set: GlobSet::empty(),
			base_path: String::new(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from an [`MdcxConfig`].
	pub fn from_config(config: Option<&MdcxConfig>) -> Self {
		let exclude_patterns = config
			.map(|c| c.exclude.patterns.clone())
			.unwrap_or_default();
		let include_patterns = config.map(|c| &c.include.patterns[..]).unwrap_or_default();
		let base_path = config.map(|c| c.site.base_path.clone()).unwrap_or_default();
		let max_file_size = config.map_or(DEFAULT_MAX_FILE_SIZE, |c| c.max_file_size);
		let disable_gitignore = config.is_some_and(|c| c.disable_gitignore);
		let include_set = build_glob_set(include_patterns);

		Self {
			exclude_patterns,
			include_set,
			base_path,
			max_file_size,
			disable_gitignore,
		}
	}
}

/// A navigation link to an adjacent page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
	pub title: String,
	pub permalink: String,
}

/// A scanned markdown page together with its routing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
	/// Path to the source file.
	pub file: PathBuf,
	/// Root-relative identifier without the extension, e.g.
	/// `recipe_types/datagen`.
	pub id: String,
	/// The page title, from front matter or the first heading.
	pub title: String,
	/// The site-relative slug, e.g. `/recipe_types/datagen`.
	pub slug: String,
	/// The full permalink: configured base path plus slug.
	pub permalink: String,
	/// Ordering key for navigation.
	pub sidebar_position: Option<i64>,
	/// The parsed front matter.
	pub front_matter: FrontMatter,
	/// The page body with front matter stripped.
	pub body: String,
	/// Lines consumed by the front matter fence, for translating
	/// body-relative positions back to file positions.
	pub line_offset: usize,
	/// Component invocations found in the body.
	pub components: Vec<ComponentBlock>,
	/// The previous page in navigation order, if any.
	pub previous: Option<PageLink>,
	/// The next page in navigation order, if any.
	pub next: Option<PageLink>,
}

impl Page {
	fn link(&self) -> PageLink {
		PageLink {
			title: self.title.clone(),
			permalink: self.permalink.clone(),
		}
	}
}

/// The kind of problem found while scanning a site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DiagnosticKind {
	/// A component was opened but never closed.
	UnclosedComponent { name: String },
	/// The page's front matter could not be parsed.
	FrontMatter { message: String },
	/// The page's markdown could not be parsed.
	Markdown { message: String },
	/// The file exceeds the configured size limit and was skipped.
	FileTooLarge { size: u64, limit: u64 },
}

/// A problem found while scanning, attached to the file it occurred in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDiagnostic {
	pub file: PathBuf,
	pub kind: DiagnosticKind,
	/// 1-indexed line, or 0 when the diagnostic covers the whole file.
	pub line: usize,
	/// 1-indexed column, or 0 when the diagnostic covers the whole file.
	pub column: usize,
}

impl SiteDiagnostic {
	/// A human-readable description of the problem.
	pub fn message(&self) -> String {
		match &self.kind {
			DiagnosticKind::UnclosedComponent { name } => {
				format!("component `{name}` is missing its closing tag")
			}
			DiagnosticKind::FrontMatter { message } => {
				format!("invalid front matter: {message}")
			}
			DiagnosticKind::Markdown { message } => {
				format!("invalid markdown: {message}")
			}
			DiagnosticKind::FileTooLarge { size, limit } => {
				format!("file is {size} bytes which exceeds the {limit} byte limit")
			}
		}
	}
}

/// A scanned site: every page found under the root, in navigation order,
/// plus any scan diagnostics.
#[derive(Debug, Default)]
pub struct Site {
	pub pages: Vec<Page>,
	pub diagnostics: Vec<SiteDiagnostic>,
}

impl Site {
	/// Find a page by its id.
	pub fn page(&self, id: &str) -> Option<&Page> {
		self.pages.iter().find(|page| page.id == id)
	}

	/// The pages that participate in navigation and build output, in order.
	pub fn navigation_pages(&self) -> Vec<&Page> {
		self.pages
			.iter()
			.filter(|page| !page.front_matter.draft)
			.collect()
	}
}

/// A scanned site together with its loaded configuration and the root
/// component mapping built from it.
#[derive(Debug)]
pub struct SiteContext {
	pub root: PathBuf,
	pub site: Site,
	pub config: Option<MdcxConfig>,
	pub base_mapping: ComponentMapping,
}

/// Scan a site using configuration discovered under `root`.
pub fn scan_site_with_config(root: &Path) -> MdcxResult<SiteContext> {
	let config = MdcxConfig::load(root)?;
	let options = ScanOptions::from_config(config.as_ref());
	let site = scan_site_with_options(root, &options)?;
	let base_mapping = match config.as_ref() {
		Some(config) => config.base_mapping(root)?,
		None => ComponentMapping::new(),
	};

	Ok(SiteContext {
		root: root.to_path_buf(),
		site,
		config,
		base_mapping,
	})
}

/// Scan a site with default options.
pub fn scan_site(root: &Path) -> MdcxResult<Site> {
	scan_site_with_options(root, &ScanOptions::default())
}

/// Walk the directory tree under `root`, collecting every markdown page and
/// its routing metadata.
#[tracing::instrument(level = "debug", skip_all, fields(root = %root.display()))]
pub fn scan_site_with_options(root: &Path, options: &ScanOptions) -> MdcxResult<Site> {
	let exclude_matcher = build_exclude_matcher(root, &options.exclude_patterns)?;
	let mut pages: Vec<Page> = Vec::new();
	let mut diagnostics: Vec<SiteDiagnostic> = Vec::new();

	let mut walker = WalkBuilder::new(root);
	walker
		.git_ignore(!options.disable_gitignore)
		.git_global(false)
		.git_exclude(false);

	for entry in walker.build() {
		let Ok(entry) = entry else {
			continue;
		};

		if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
			continue;
		}

		let path = entry.path();

		if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
			continue;
		}

		let relative_path = path.strip_prefix(root).unwrap_or(path);
		let relative = relative_file_key(root, path);

		if exclude_matcher
			.matched_path_or_any_parents(relative_path, false)
			.is_ignore()
		{
			continue;
		}

		if !options.include_set.is_empty() && !options.include_set.is_match(&relative) {
			continue;
		}

		if let Ok(metadata) = entry.metadata() {
			if metadata.len() > options.max_file_size {
				diagnostics.push(SiteDiagnostic {
					file: path.to_path_buf(),
					kind: DiagnosticKind::FileTooLarge {
						size: metadata.len(),
						limit: options.max_file_size,
					},
					line: 0,
					column: 0,
				});
				continue;
			}
		}

		let content = std::fs::read_to_string(path)?;

		let (front_matter, body) = match parse_front_matter(&content) {
			Ok(result) => result,
			Err(error) => {
				diagnostics.push(SiteDiagnostic {
					file: path.to_path_buf(),
					kind: DiagnosticKind::FrontMatter {
						message: error.to_string(),
					},
					line: 1,
					column: 1,
				});
				continue;
			}
		};

		let line_offset = front_matter_line_offset(&content, body);

		let (mut components, parse_diagnostics) = match parse_with_diagnostics(body) {
			Ok(result) => result,
			Err(error) => {
				diagnostics.push(SiteDiagnostic {
					file: path.to_path_buf(),
					kind: DiagnosticKind::Markdown {
						message: error.to_string(),
					},
					line: 0,
					column: 0,
				});
				continue;
			}
		};

		// Translate body-relative positions to file positions.
		for component in &mut components {
			component.opening.start.line += line_offset;
			component.opening.end.line += line_offset;
			component.closing.start.line += line_offset;
			component.closing.end.line += line_offset;
		}

		for diagnostic in parse_diagnostics {
			match diagnostic {
				ParseDiagnostic::UnclosedComponent { name, line, column } => {
					diagnostics.push(SiteDiagnostic {
						file: path.to_path_buf(),
						kind: DiagnosticKind::UnclosedComponent { name },
						line: line + line_offset,
						column,
					});
				}
			}
		}

		let id = relative.strip_suffix(".md").unwrap_or(&relative).to_string();
		let title = front_matter
			.title
			.clone()
			.or_else(|| derive_title(body))
			.unwrap_or_else(|| {
				path.file_stem()
					.map_or_else(|| id.clone(), |stem| stem.to_string_lossy().into_owned())
			});
		let slug = match &front_matter.slug {
			Some(slug) if slug.starts_with('/') => slug.clone(),
			Some(slug) => format!("/{slug}"),
			None => format!("/{id}"),
		};
		let permalink = format!("{}{slug}", options.base_path);

		pages.push(Page {
			file: path.to_path_buf(),
			id,
			title,
			slug,
			permalink,
			sidebar_position: front_matter.sidebar_position,
			front_matter,
			body: body.to_string(),
			line_offset,
			components,
			previous: None,
			next: None,
		});
	}

	pages.sort_by(|a, b| {
		a.sidebar_position
			.unwrap_or(i64::MAX)
			.cmp(&b.sidebar_position.unwrap_or(i64::MAX))
			.then_with(|| a.title.cmp(&b.title))
			.then_with(|| a.id.cmp(&b.id))
	});

	link_navigation(&mut pages);

	diagnostics.sort_by(|a, b| {
		a.file
			.cmp(&b.file)
			.then_with(|| a.line.cmp(&b.line))
			.then_with(|| a.column.cmp(&b.column))
	});

	info!(
		pages = pages.len(),
		diagnostics = diagnostics.len(),
		"scanned site"
	);

	Ok(Site { pages, diagnostics })
}

/// Connect each non-draft page to its neighbours in navigation order.
fn link_navigation(pages: &mut [Page]) {
	let indices: Vec<usize> = pages
		.iter()
		.enumerate()
		.filter(|(_, page)| !page.front_matter.draft)
		.map(|(index, _)| index)
		.collect();

	for pair in indices.windows(2) {
		let (first, second) = (pair[0], pair[1]);
		let first_link = pages[first].link();
		let second_link = pages[second].link();
		pages[first].next = Some(second_link);
		pages[second].previous = Some(first_link);
	}
}

/// The first `# ` heading in the body, used when front matter supplies no
/// title.
fn derive_title(body: &str) -> Option<String> {
	body.lines()
		.find_map(|line| line.strip_prefix("# ").map(|title| title.trim().to_string()))
}

fn relative_file_key(root: &Path, file: &Path) -> String {
	file.strip_prefix(root)
		.unwrap_or(file)
		.to_string_lossy()
		.replace('\\', "/")
}

fn build_glob_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();

	for pattern in patterns {
		match Glob::new(pattern) {
			Ok(glob) => {
				builder.add(glob);
			}
			Err(error) => warn!(%pattern, %error, "skipping invalid include pattern"),
		}
	}

	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MdcxResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);

	for pattern in patterns {
		builder
			.add_line(None, pattern)
			.map_err(|e| MdcxError::InvalidPattern(e.to_string()))?;
	}

	builder
		.build()
		.map_err(|e| MdcxError::InvalidPattern(e.to_string()))
}
