use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

use crate::MdcxError;
use crate::MdcxResult;
use crate::registry::ScopeOverride;

/// A shared handle to a renderable component.
pub type ComponentRef = Arc<dyn Component>;

/// A renderable component: something invokable with a set of named
/// properties and child content, producing markup.
pub trait Component: std::fmt::Debug + Send + Sync {
	/// Render this component with the given props and already-rendered child
	/// content.
	fn render(&self, props: &Props, children: &str) -> MdcxResult<String>;

	/// Component mappings contributed to the subtree rendered beneath this
	/// component. Most components contribute nothing.
	fn overrides(&self) -> Option<ScopeOverride> {
		None
	}
}

/// The named properties passed to a component invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Deref, DerefMut)]
pub struct Props(
	#[deref]
	#[deref_mut]
	BTreeMap<String, PropValue>,
);

impl Props {
	pub fn new() -> Self {
		Self::default()
	}
}

impl FromIterator<(String, PropValue)> for Props {
	fn from_iter<I: IntoIterator<Item = (String, PropValue)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// A prop value passed to a component.
///
/// Three types are supported:
///
/// - **String** — Quoted text, e.g. `kind="tip"`
/// - **Number** — Integer or floating-point, e.g. `level=3`
/// - **Boolean** — `open=true`, or a bare prop name which means `true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum PropValue {
	/// A quoted string value, e.g. `"tip"`.
	String(String),
	/// A numeric value (integer or float), e.g. `42` or `3.14`.
	Number(OrderedFloat),
	/// A boolean value: `true` or `false`.
	Boolean(bool),
}

impl PropValue {
	/// Returns the string content for string values.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(value) => Some(value.as_str()),
			_ => None,
		}
	}
}

impl std::fmt::Display for PropValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::String(value) => write!(f, "{value}"),
			Self::Number(value) => write!(f, "{value}"),
			Self::Boolean(value) => write!(f, "{value}"),
		}
	}
}

/// A float wrapper that implements `Eq` via approximate comparison,
/// allowing `PropValue` to derive `PartialEq` cleanly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
	fn eq(&self, other: &Self) -> bool {
		float_cmp::approx_eq!(f64, self.0, other.0)
	}
}

impl std::fmt::Display for OrderedFloat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// The children pass-through component. This is the default `wrapper` used
/// when no mapping overrides it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fragment;

impl Component for Fragment {
	fn render(&self, _props: &Props, children: &str) -> MdcxResult<String> {
		Ok(children.to_string())
	}
}

/// Void elements which never take children and render self-closing.
const VOID_ELEMENTS: [&str; 13] = [
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
	"wbr",
];

/// A component that renders a plain HTML element, forwarding props as
/// attributes.
#[derive(Debug, Clone)]
pub struct HtmlElement {
	tag: String,
}

impl HtmlElement {
	pub fn new(tag: impl Into<String>) -> Self {
		Self { tag: tag.into() }
	}

	/// The element tag name.
	pub fn tag(&self) -> &str {
		&self.tag
	}
}

impl Component for HtmlElement {
	fn render(&self, props: &Props, children: &str) -> MdcxResult<String> {
		let tag = &self.tag;
		let mut attributes = String::new();

		for (name, value) in props.iter() {
			// Props use the `className` spelling; the attribute is `class`.
			let attribute = if name == "className" {
				"class"
			} else {
				name.as_str()
			};

			match value {
				// Bare boolean attributes render without a value; false means
				// the attribute is omitted entirely.
				PropValue::Boolean(true) => {
					attributes.push(' ');
					attributes.push_str(attribute);
				}
				PropValue::Boolean(false) => {}
				other => {
					attributes.push(' ');
					attributes.push_str(attribute);
					attributes.push_str("=\"");
					attributes.push_str(&escape_attribute(&other.to_string()));
					attributes.push('"');
				}
			}
		}

		if VOID_ELEMENTS.contains(&tag.as_str()) {
			return Ok(format!("<{tag}{attributes} />"));
		}

		Ok(format!("<{tag}{attributes}>{children}</{tag}>"))
	}
}

/// A component rendered through a minijinja template. The template sees the
/// invocation's props under `props` and the rendered child content under
/// `children`.
#[derive(Debug, Clone)]
pub struct Template {
	name: String,
	source: String,
}

impl Template {
	pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			source: source.into(),
		}
	}

	/// Load a template component from a file.
	pub fn from_file(name: impl Into<String>, path: &Path) -> MdcxResult<Self> {
		let source = std::fs::read_to_string(path).map_err(|e| {
			MdcxError::TemplateLoad {
				path: path.display().to_string(),
				reason: e.to_string(),
			}
		})?;

		Ok(Self::new(name, source))
	}
}

impl Component for Template {
	fn render(&self, props: &Props, children: &str) -> MdcxResult<String> {
		let render_error = |reason: String| {
			MdcxError::TemplateRender {
				name: self.name.clone(),
				reason,
			}
		};

		let mut env = minijinja::Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_undefined_behavior(minijinja::UndefinedBehavior::Chainable);
		env.add_template(&self.name, &self.source)
			.map_err(|e| render_error(e.to_string()))?;

		let template = env
			.get_template(&self.name)
			.map_err(|e| render_error(e.to_string()))?;

		let mut data: HashMap<&str, serde_json::Value> = HashMap::new();
		data.insert(
			"props",
			serde_json::to_value(props).map_err(|e| render_error(e.to_string()))?,
		);
		data.insert("children", serde_json::Value::String(children.to_string()));

		let ctx = minijinja::Value::from_serialize(&data);
		template.render(ctx).map_err(|e| render_error(e.to_string()))
	}
}

/// Escape text content for safe embedding in HTML.
pub fn escape_html(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for ch in text.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			_ => escaped.push(ch),
		}
	}

	escaped
}

/// Escape a value for safe embedding in a double-quoted HTML attribute.
pub fn escape_attribute(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for ch in value.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			_ => escaped.push(ch),
		}
	}

	escaped
}
