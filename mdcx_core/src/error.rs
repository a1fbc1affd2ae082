use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdcxError {
	#[error(transparent)]
	#[diagnostic(code(mdcx::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to parse markdown: {0}")]
	#[diagnostic(code(mdcx::markdown))]
	Markdown(String),

	#[error("no component registered for `{name}`")]
	#[diagnostic(
		code(mdcx::unresolved_component),
		help(
			"register `{name}` under [components] in mdcx.toml, or supply it through a scope \
			 override"
		)
	)]
	UnresolvedComponent { name: String },

	#[error("missing closing tag for component: `{0}`")]
	#[diagnostic(
		code(mdcx::missing_closing_tag),
		help("add `</{0}>` to close this component")
	)]
	MissingClosingTag(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdcx::config_parse),
		help("check that mdcx.toml is valid TOML with [site] and/or [components] sections")
	)]
	ConfigParse(String),

	#[error("failed to parse front matter: {0}")]
	#[diagnostic(
		code(mdcx::front_matter),
		help("front matter must be valid YAML between `---` delimiter lines")
	)]
	FrontMatter(String),

	#[error("template rendering failed for component `{name}`: {reason}")]
	#[diagnostic(code(mdcx::template_render))]
	TemplateRender { name: String, reason: String },

	#[error("failed to load template `{path}`: {reason}")]
	#[diagnostic(code(mdcx::template_load))]
	TemplateLoad { path: String, reason: String },

	#[error("invalid exclude pattern: {0}")]
	#[diagnostic(
		code(mdcx::invalid_pattern),
		help("exclude patterns use gitignore syntax, e.g. `drafts/` or `*.generated.md`")
	)]
	InvalidPattern(String),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(mdcx::file_too_large),
		help("increase the file size limit in mdcx.toml or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },
}

pub type MdcxResult<T> = Result<T, MdcxError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
