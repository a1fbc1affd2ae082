use std::collections::BTreeMap;
use std::path::PathBuf;

use markdown::ParseOptions;
use markdown::mdast::AlignKind;
use markdown::mdast::Html;
use markdown::mdast::Node;
use markdown::to_mdast;

use crate::MdcxError;
use crate::MdcxResult;
use crate::Position;
use crate::component::Component;
use crate::component::HtmlElement;
use crate::component::PropValue;
use crate::component::Props;
use crate::component::escape_attribute;
use crate::component::escape_html;
use crate::parser::ClassifiedTag;
use crate::parser::TagKind;
use crate::parser::node_tags;
use crate::registry::ComponentMapping;
use crate::registry::Scope;
use crate::registry::ScopeOverride;
use crate::registry::resolve_component;
use crate::site::Page;

/// A problem encountered while rendering a page.
///
/// Problems never abort rendering: a placeholder comment is emitted in place
/// of the failing component and rendering continues, so a single unresolved
/// component cannot take down a whole page.
#[derive(Debug, Clone)]
pub struct RenderProblem {
	/// Path to the file containing the failing invocation.
	pub file: PathBuf,
	/// The symbolic name the component was referenced by.
	pub component: String,
	/// The error message.
	pub message: String,
	/// 1-indexed line of the invocation, or 0 when unknown.
	pub line: usize,
	/// 1-indexed column of the invocation, or 0 when unknown.
	pub column: usize,
}

/// A rendered page body together with the problems encountered on the way.
#[derive(Debug)]
pub struct RenderedPage {
	pub html: String,
	pub problems: Vec<RenderProblem>,
}

/// Render a page body to HTML against the given root component mapping.
///
/// Every markdown construct resolves through the registry, so mappings can
/// override any intrinsic element as well as supply custom components. The
/// finished body is passed through the `wrapper` component.
#[tracing::instrument(level = "debug", skip_all, fields(page = %page.id))]
pub fn render_page(page: &Page, mapping: &ComponentMapping) -> MdcxResult<RenderedPage> {
	let mdast = to_mdast(&page.body, &ParseOptions::gfm())
		.map_err(|e| MdcxError::Markdown(e.to_string()))?;

	let mut renderer = Renderer::new(page);
	renderer.collect_definitions(&mdast);

	let scope = Scope::root(Some(ScopeOverride::Fixed(mapping.clone())));
	let children = mdast.children().map(Vec::as_slice).unwrap_or_default();
	let body = renderer.render_scope(children, &scope);

	let effective = scope.effective();
	let mut props = Props::new();
	props.insert("title".to_string(), PropValue::String(page.title.clone()));
	props.insert(
		"permalink".to_string(),
		PropValue::String(page.permalink.clone()),
	);

	let html = match resolve_component(&effective, "wrapper", Some("fragment")) {
		Ok(wrapper) => {
			match wrapper.render(&props, &body) {
				Ok(html) => html,
				Err(error) => {
					renderer.problem("wrapper", error.to_string(), None);
					body
				}
			}
		}
		Err(error) => {
			renderer.problem("wrapper", error.to_string(), None);
			body
		}
	};

	Ok(RenderedPage {
		html,
		problems: renderer.problems,
	})
}

/// Render a page as a complete HTML document with head metadata and
/// previous/next navigation links.
pub fn render_document(
	page: &Page,
	mapping: &ComponentMapping,
	site_title: Option<&str>,
) -> MdcxResult<RenderedPage> {
	let rendered = render_page(page, mapping)?;

	let title = match site_title {
		Some(site_title) => format!("{} | {site_title}", page.title),
		None => page.title.clone(),
	};

	let mut html = String::with_capacity(rendered.html.len() + 512);
	html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\" />\n");
	html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));

	if let Some(description) = &page.front_matter.description {
		html.push_str(&format!(
			"<meta name=\"description\" content=\"{}\" />\n",
			escape_attribute(description)
		));
	}

	html.push_str("</head>\n<body>\n<main>\n");
	html.push_str(&rendered.html);
	html.push_str("</main>\n");

	if page.previous.is_some() || page.next.is_some() {
		html.push_str("<nav>\n");

		if let Some(previous) = &page.previous {
			html.push_str(&format!(
				"<a rel=\"prev\" href=\"{}\">{}</a>\n",
				escape_attribute(&previous.permalink),
				escape_html(&previous.title)
			));
		}

		if let Some(next) = &page.next {
			html.push_str(&format!(
				"<a rel=\"next\" href=\"{}\">{}</a>\n",
				escape_attribute(&next.permalink),
				escape_html(&next.title)
			));
		}

		html.push_str("</nav>\n");
	}

	html.push_str("</body>\n</html>\n");

	Ok(RenderedPage {
		html,
		problems: rendered.problems,
	})
}

fn placeholder(name: &str) -> String {
	format!("<!-- component `{name}` could not be rendered -->")
}

struct Renderer<'a> {
	page: &'a Page,
	/// Link/image reference definitions, identifier → (url, title).
	definitions: BTreeMap<String, (String, Option<String>)>,
	problems: Vec<RenderProblem>,
}

impl<'a> Renderer<'a> {
	fn new(page: &'a Page) -> Self {
		Self {
			page,
			definitions: BTreeMap::new(),
			problems: Vec::new(),
		}
	}

	fn problem(&mut self, component: &str, message: String, position: Option<Position>) {
		let (line, column) = position.map_or((0, 0), |position| {
			(
				position.start.line + self.page.line_offset,
				position.start.column,
			)
		});

		self.problems.push(RenderProblem {
			file: self.page.file.clone(),
			component: component.to_string(),
			message,
			line,
			column,
		});
	}

	fn collect_definitions(&mut self, node: &Node) {
		if let Node::Definition(definition) = node {
			self.definitions.insert(
				definition.identifier.clone(),
				(definition.url.clone(), definition.title.clone()),
			);
		}

		if let Some(children) = node.children() {
			for child in children {
				self.collect_definitions(child);
			}
		}
	}

	/// Render a node list at a scope boundary, computing the effective
	/// mapping for the scope chain once.
	fn render_scope(&mut self, nodes: &[Node], scope: &Scope<'_>) -> String {
		let mapping = scope.effective();
		self.render_nodes(nodes, scope, &mapping)
	}

	fn render_nodes(
		&mut self,
		nodes: &[Node],
		scope: &Scope<'_>,
		mapping: &ComponentMapping,
	) -> String {
		let mut output = String::new();
		let mut index = 0;

		while index < nodes.len() {
			if let Node::Html(html) = &nodes[index] {
				index = self.render_html_node(nodes, index, html, scope, mapping, &mut output);
				continue;
			}

			let rendered = self.render_node(&nodes[index], scope, mapping);
			output.push_str(&rendered);
			index += 1;
		}

		output
	}

	/// Render a raw HTML node: a component invocation, a close tag, or inert
	/// HTML. Returns the index of the next sibling to render.
	fn render_html_node(
		&mut self,
		siblings: &[Node],
		index: usize,
		html: &Html,
		scope: &Scope<'_>,
		mapping: &ComponentMapping,
		output: &mut String,
	) -> usize {
		let tags = node_tags(html);

		match tags.as_slice() {
			// A childless invocation, e.g. `<RecipeList />`.
			[
				ClassifiedTag {
					kind:
						TagKind::SelfClosing {
							name,
							props,
							fallback,
						},
					position,
				},
			] => {
				let rendered = self.invoke(
					mapping,
					scope,
					name,
					props,
					fallback.as_deref(),
					&[],
					*position,
				);
				output.push_str(&rendered);
				index + 1
			}
			// An open tag: the children are the sibling nodes up to the
			// matching close tag.
			[
				ClassifiedTag {
					kind:
						TagKind::Open {
							name,
							props,
							fallback,
						},
					position,
				},
			] => {
				match find_closing_sibling(siblings, index + 1, name) {
					Some(close_index) => {
						let rendered = self.invoke(
							mapping,
							scope,
							name,
							props,
							fallback.as_deref(),
							&siblings[index + 1..close_index],
							*position,
						);
						output.push_str(&rendered);
						close_index + 1
					}
					None => {
						self.problem(
							name,
							MdcxError::MissingClosingTag(name.clone()).to_string(),
							Some(*position),
						);
						output.push_str(&placeholder(name));
						index + 1
					}
				}
			}
			// Open and matching close within the same node: the raw text
			// between them is rendered as nested markdown.
			[
				ClassifiedTag {
					kind:
						TagKind::Open {
							name,
							props,
							fallback,
						},
					position,
				},
				ClassifiedTag {
					kind: TagKind::Close { name: close_name },
					position: close_position,
				},
			] if name == close_name => {
				let inner = inner_slice(html, position, close_position);
				let rendered = self.invoke_fragment(
					mapping,
					scope,
					name,
					props,
					fallback.as_deref(),
					inner,
					*position,
				);
				output.push_str(&rendered);
				index + 1
			}
			// Stray close tags are ignored, matching the lenient parser.
			[
				ClassifiedTag {
					kind: TagKind::Close { .. },
					..
				},
			] => index + 1,
			// Anything else is inert HTML passed through untouched.
			_ => {
				output.push_str(&html.value);
				index + 1
			}
		}
	}

	/// Resolve and invoke a component, rendering its child nodes in a child
	/// scope extended with the component's overrides.
	fn invoke(
		&mut self,
		mapping: &ComponentMapping,
		scope: &Scope<'_>,
		name: &str,
		props: &Props,
		fallback: Option<&str>,
		children_nodes: &[Node],
		position: Position,
	) -> String {
		match resolve_component(mapping, name, fallback) {
			Ok(component) => {
				let child_scope = scope.child(component.overrides());
				let children = self.render_scope(children_nodes, &child_scope);

				match component.render(props, &children) {
					Ok(html) => html,
					Err(error) => {
						self.problem(name, error.to_string(), Some(position));
						placeholder(name)
					}
				}
			}
			Err(error) => {
				self.problem(name, error.to_string(), Some(position));
				placeholder(name)
			}
		}
	}

	/// Like [`Renderer::invoke`], but the children are a raw markdown
	/// fragment that still needs parsing.
	fn invoke_fragment(
		&mut self,
		mapping: &ComponentMapping,
		scope: &Scope<'_>,
		name: &str,
		props: &Props,
		fallback: Option<&str>,
		fragment: &str,
		position: Position,
	) -> String {
		match resolve_component(mapping, name, fallback) {
			Ok(component) => {
				let child_scope = scope.child(component.overrides());
				let children = match to_mdast(fragment, &ParseOptions::gfm()) {
					Ok(mdast) => {
						let nodes = mdast.children().map(Vec::as_slice).unwrap_or_default();
						self.render_scope(nodes, &child_scope)
					}
					Err(_) => escape_html(fragment),
				};

				match component.render(props, &children) {
					Ok(html) => html,
					Err(error) => {
						self.problem(name, error.to_string(), Some(position));
						placeholder(name)
					}
				}
			}
			Err(error) => {
				self.problem(name, error.to_string(), Some(position));
				placeholder(name)
			}
		}
	}

	/// Render an intrinsic markup construct through the registry, so user
	/// mappings can override it. When nothing in the mapping or the built-in
	/// defaults matches, fall back to the plain element.
	fn render_element(
		&mut self,
		mapping: &ComponentMapping,
		requested: &str,
		tag: &str,
		props: Props,
		children: String,
	) -> String {
		match resolve_component(mapping, requested, Some(tag)) {
			Ok(component) => {
				match component.render(&props, &children) {
					Ok(html) => html,
					Err(error) => {
						self.problem(requested, error.to_string(), None);
						placeholder(requested)
					}
				}
			}
			Err(_) => {
				HtmlElement::new(tag)
					.render(&props, &children)
					.unwrap_or_default()
			}
		}
	}

	fn render_node(
		&mut self,
		node: &Node,
		scope: &Scope<'_>,
		mapping: &ComponentMapping,
	) -> String {
		match node {
			Node::Text(text) => escape_html(&text.value),
			Node::Paragraph(paragraph) => {
				let children = self.render_nodes(&paragraph.children, scope, mapping);
				let html = self.render_element(mapping, "p", "p", Props::new(), children);
				format!("{html}\n")
			}
			Node::Heading(heading) => {
				let tag = format!("h{}", heading.depth.clamp(1, 6));
				let children = self.render_nodes(&heading.children, scope, mapping);
				let html = self.render_element(mapping, &tag, &tag, Props::new(), children);
				format!("{html}\n")
			}
			Node::Emphasis(emphasis) => {
				let children = self.render_nodes(&emphasis.children, scope, mapping);
				self.render_element(mapping, "em", "em", Props::new(), children)
			}
			Node::Strong(strong) => {
				let children = self.render_nodes(&strong.children, scope, mapping);
				self.render_element(mapping, "strong", "strong", Props::new(), children)
			}
			Node::Delete(delete) => {
				let children = self.render_nodes(&delete.children, scope, mapping);
				self.render_element(mapping, "del", "del", Props::new(), children)
			}
			Node::InlineCode(inline_code) => {
				let children = escape_html(&inline_code.value);
				self.render_element(mapping, "inlineCode", "code", Props::new(), children)
			}
			Node::Code(code) => {
				let mut props = Props::new();

				if let Some(lang) = &code.lang {
					props.insert(
						"className".to_string(),
						PropValue::String(format!("language-{lang}")),
					);
				}

				let children = escape_html(&code.value);
				let inner = self.render_element(mapping, "code", "code", props, children);
				let html = self.render_element(mapping, "pre", "pre", Props::new(), inner);
				format!("{html}\n")
			}
			Node::Link(link) => {
				let mut props = Props::new();
				props.insert("href".to_string(), PropValue::String(link.url.clone()));

				if let Some(title) = &link.title {
					props.insert("title".to_string(), PropValue::String(title.clone()));
				}

				let children = self.render_nodes(&link.children, scope, mapping);
				self.render_element(mapping, "a", "a", props, children)
			}
			Node::Image(image) => {
				let mut props = Props::new();
				props.insert("src".to_string(), PropValue::String(image.url.clone()));
				props.insert("alt".to_string(), PropValue::String(image.alt.clone()));

				if let Some(title) = &image.title {
					props.insert("title".to_string(), PropValue::String(title.clone()));
				}

				self.render_element(mapping, "img", "img", props, String::new())
			}
			Node::LinkReference(link_reference) => {
				let children = self.render_nodes(&link_reference.children, scope, mapping);

				match self.definitions.get(&link_reference.identifier).cloned() {
					Some((url, title)) => {
						let mut props = Props::new();
						props.insert("href".to_string(), PropValue::String(url));

						if let Some(title) = title {
							props.insert("title".to_string(), PropValue::String(title));
						}

						self.render_element(mapping, "a", "a", props, children)
					}
					None => format!("[{children}]"),
				}
			}
			Node::ImageReference(image_reference) => {
				match self.definitions.get(&image_reference.identifier).cloned() {
					Some((url, title)) => {
						let mut props = Props::new();
						props.insert("src".to_string(), PropValue::String(url));
						props.insert(
							"alt".to_string(),
							PropValue::String(image_reference.alt.clone()),
						);

						if let Some(title) = title {
							props.insert("title".to_string(), PropValue::String(title));
						}

						self.render_element(mapping, "img", "img", props, String::new())
					}
					None => format!("![{}]", escape_html(&image_reference.alt)),
				}
			}
			Node::FootnoteReference(footnote) => {
				let children = escape_html(&footnote.identifier);
				self.render_element(mapping, "sup", "sup", Props::new(), children)
			}
			Node::Blockquote(blockquote) => {
				let children = self.render_nodes(&blockquote.children, scope, mapping);
				let html =
					self.render_element(mapping, "blockquote", "blockquote", Props::new(), children);
				format!("{html}\n")
			}
			Node::List(list) => {
				let tag = if list.ordered { "ol" } else { "ul" };
				let mut props = Props::new();

				if list.ordered {
					if let Some(start) = list.start {
						if start != 1 {
							props.insert(
								"start".to_string(),
								PropValue::String(start.to_string()),
							);
						}
					}
				}

				let children = self.render_nodes(&list.children, scope, mapping);
				let html = self.render_element(mapping, tag, tag, props, children);
				format!("{html}\n")
			}
			Node::ListItem(list_item) => {
				// Tight list items skip the paragraph wrapper.
				let mut children = match list_item.children.as_slice() {
					[Node::Paragraph(paragraph)] if !list_item.spread => {
						self.render_nodes(&paragraph.children, scope, mapping)
					}
					children => self.render_nodes(children, scope, mapping),
				};

				if let Some(checked) = list_item.checked {
					let checkbox = if checked {
						"<input type=\"checkbox\" disabled checked /> "
					} else {
						"<input type=\"checkbox\" disabled /> "
					};
					children = format!("{checkbox}{children}");
				}

				self.render_element(mapping, "li", "li", Props::new(), children)
			}
			Node::Table(table) => self.render_table(table, scope, mapping),
			Node::ThematicBreak(_) => {
				let html = self.render_element(mapping, "hr", "hr", Props::new(), String::new());
				format!("{html}\n")
			}
			Node::Break(_) => self.render_element(mapping, "br", "br", Props::new(), String::new()),
			// Definitions were collected in the prepass and footnote
			// definitions have no inline rendering.
			Node::Definition(_) | Node::FootnoteDefinition(_) => String::new(),
			Node::Html(html) => html.value.clone(),
			other => {
				match other.children() {
					Some(children) => self.render_nodes(children, scope, mapping),
					None => String::new(),
				}
			}
		}
	}

	fn render_table(
		&mut self,
		table: &markdown::mdast::Table,
		scope: &Scope<'_>,
		mapping: &ComponentMapping,
	) -> String {
		let mut head = String::new();
		let mut body = String::new();

		for (row_index, row_node) in table.children.iter().enumerate() {
			let Node::TableRow(row) = row_node else {
				continue;
			};

			let cell_tag = if row_index == 0 { "th" } else { "td" };
			let mut cells = String::new();

			for (cell_index, cell_node) in row.children.iter().enumerate() {
				let Node::TableCell(cell) = cell_node else {
					continue;
				};

				let mut props = Props::new();
				let alignment = match table.align.get(cell_index) {
					Some(AlignKind::Left) => Some("left"),
					Some(AlignKind::Right) => Some("right"),
					Some(AlignKind::Center) => Some("center"),
					_ => None,
				};

				if let Some(alignment) = alignment {
					props.insert(
						"align".to_string(),
						PropValue::String(alignment.to_string()),
					);
				}

				let children = self.render_nodes(&cell.children, scope, mapping);
				cells.push_str(&self.render_element(mapping, cell_tag, cell_tag, props, children));
			}

			let row_html = self.render_element(mapping, "tr", "tr", Props::new(), cells);

			if row_index == 0 {
				head.push_str(&row_html);
			} else {
				body.push_str(&row_html);
			}
		}

		let thead = self.render_element(mapping, "thead", "thead", Props::new(), head);
		let tbody = if body.is_empty() {
			String::new()
		} else {
			self.render_element(mapping, "tbody", "tbody", Props::new(), body)
		};

		let html =
			self.render_element(mapping, "table", "table", Props::new(), format!("{thead}{tbody}"));
		format!("{html}\n")
	}
}

/// Find the sibling node containing the close tag matching `name`, tracking
/// nesting depth for same-named components.
fn find_closing_sibling(siblings: &[Node], from: usize, name: &str) -> Option<usize> {
	let mut depth = 0_usize;

	for (index, node) in siblings.iter().enumerate().skip(from) {
		let Node::Html(html) = node else {
			continue;
		};

		for tag in node_tags(html) {
			match tag.kind {
				TagKind::Open { name: open_name, .. } if open_name == name => depth += 1,
				TagKind::Close { name: close_name } if close_name == name => {
					if depth == 0 {
						return Some(index);
					}

					depth -= 1;
				}
				_ => {}
			}
		}
	}

	None
}

/// The raw text between an open tag and its close tag within a single HTML
/// node.
fn inner_slice<'a>(html: &'a Html, open: &Position, close: &Position) -> &'a str {
	let node_offset = html
		.position
		.as_ref()
		.map_or(0, |position| position.start.offset);
	let start = open.end.offset.saturating_sub(node_offset);
	let end = close.start.offset.saturating_sub(node_offset);

	html.value.get(start..end).unwrap_or("")
}
