use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;

use crate::MdcxError;
use crate::MdcxResult;
use crate::component::ComponentRef;
use crate::component::HtmlElement;
use crate::component::Template;
use crate::registry::ComponentMapping;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdcx.toml", ".mdcx.toml", ".config/mdcx.toml"];

/// A component definition in the `[components]` table.
///
/// Element entries map a name onto a plain HTML element:
///
/// ```toml
/// [components]
/// Callout = { element = "aside" }
/// ```
///
/// Template entries load a minijinja template from a file, or define one
/// inline:
///
/// ```toml
/// [components]
/// Recipe = { template = "partials/recipe.html" }
/// Badge = { source = "<span class=\"badge\">{{ children }}</span>" }
/// ```
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
#[non_exhaustive]
pub enum ComponentSource {
	Element(ElementSource),
	File(TemplateFileSource),
	Inline(InlineSource),
}

/// An HTML element component definition.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct ElementSource {
	pub element: String,
}

/// A template component loaded from a file relative to the project root.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct TemplateFileSource {
	pub template: PathBuf,
}

/// A template component defined inline.
#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
pub struct InlineSource {
	pub source: String,
}

/// Configuration loaded from an `mdcx.toml` file.
///
/// ```toml
/// [site]
/// title = "Theurgy"
/// base_path = "/theurgy"
///
/// [components]
/// Callout = { element = "aside" }
/// Recipe = { template = "partials/recipe.html" }
///
/// [exclude]
/// patterns = ["drafts/", "*.generated.md"]
///
/// [include]
/// patterns = ["docs/**/*.md"]
///
/// max_file_size = 10485760
/// disable_gitignore = false
/// ```
#[derive(Debug, Deserialize)]
pub struct MdcxConfig {
	/// Site-wide settings.
	#[serde(default)]
	pub site: SiteConfig,
	/// Map of component name to definition. This is the root component
	/// mapping every page renders against.
	#[serde(default)]
	pub components: BTreeMap<String, ComponentSource>,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Inclusion configuration — glob patterns restricting which files to
	/// scan.
	#[serde(default)]
	pub include: IncludeConfig,
	/// Maximum file size in bytes to scan. Files larger than this are
	/// skipped. Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` files are not used for filtering. By default
	/// (`false`), mdcx respects `.gitignore` patterns and skips files that
	/// would be ignored by git.
	#[serde(default)]
	pub disable_gitignore: bool,
}

/// Site-wide settings from the `[site]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
	/// The site title, appended to page titles in built documents.
	#[serde(default)]
	pub title: Option<String>,
	/// Prefix for every permalink, e.g. `/theurgy`.
	#[serde(default)]
	pub base_path: String,
}

/// Exclusion configuration from the `[exclude]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns for paths to skip while scanning.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Inclusion configuration from the `[include]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeConfig {
	/// Glob patterns restricting which files are scanned. When empty, every
	/// markdown file under the root is scanned.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl MdcxConfig {
	/// Load configuration from the first config file candidate found under
	/// `root`. Returns `None` when no config file exists.
	pub fn load(root: &Path) -> MdcxResult<Option<Self>> {
		for candidate in CONFIG_FILE_CANDIDATES {
			let path = root.join(candidate);

			if !path.is_file() {
				continue;
			}

			let raw = std::fs::read_to_string(&path)?;
			let config =
				toml::from_str(&raw).map_err(|e| MdcxError::ConfigParse(e.to_string()))?;

			return Ok(Some(config));
		}

		Ok(None)
	}

	/// Build the root component mapping from the `[components]` table.
	/// Template paths are resolved relative to `root`.
	pub fn base_mapping(&self, root: &Path) -> MdcxResult<ComponentMapping> {
		let mut mapping = ComponentMapping::new();

		for (name, source) in &self.components {
			let component: ComponentRef = match source {
				ComponentSource::Element(element) => {
					Arc::new(HtmlElement::new(&element.element))
				}
				ComponentSource::File(file) => {
					Arc::new(Template::from_file(name, &root.join(&file.template))?)
				}
				ComponentSource::Inline(inline) => Arc::new(Template::new(name, &inline.source)),
			};

			mapping.insert(name.clone(), component);
		}

		Ok(mapping)
	}
}
