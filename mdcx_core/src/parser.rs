use markdown::ParseOptions;
use markdown::mdast::Html;
use markdown::mdast::Node;
use markdown::to_mdast;
use serde::Deserialize;
use serde::Serialize;

use super::MdcxError;
use super::MdcxResult;
use crate::Position;
use crate::component::OrderedFloat;
use crate::component::PropValue;
use crate::component::Props;
use crate::lexer::tokenize;
use crate::lexer::tokenize_node;
use crate::tokens::Token;
use crate::tokens::TokenGroup;

/// A diagnostic produced during parsing. These are issues that don't prevent
/// parsing from completing but indicate problems in the source content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ParseDiagnostic {
	/// A component was opened but never closed.
	UnclosedComponent {
		name: String,
		line: usize,
		column: usize,
	},
}

/// Parse markdown content and return all component invocations found within
/// it.
pub fn parse(content: impl AsRef<str>) -> MdcxResult<Vec<ComponentBlock>> {
	let content = content.as_ref();
	let html_nodes = get_html_nodes(content)?;
	let token_groups = tokenize(html_nodes)?;
	build_blocks_from_groups(&token_groups)
}

/// Parse markdown content and return component invocations together with
/// diagnostics. Unlike `parse()`, this does not error on unclosed components
/// — instead they are collected as diagnostics.
pub fn parse_with_diagnostics(
	content: impl AsRef<str>,
) -> MdcxResult<(Vec<ComponentBlock>, Vec<ParseDiagnostic>)> {
	let content = content.as_ref();
	let html_nodes = get_html_nodes(content)?;
	let token_groups = tokenize(html_nodes)?;
	build_blocks_from_groups_with_diagnostics(&token_groups)
}

/// Build component blocks from already-tokenized groups. Errors on the first
/// unclosed component.
pub fn build_blocks_from_groups(token_groups: &[TokenGroup]) -> MdcxResult<Vec<ComponentBlock>> {
	let mut pending: Vec<BlockCreator> = vec![];
	let mut blocks: Vec<ComponentBlock> = vec![];

	for group in token_groups {
		process_group(group, &mut pending, &mut blocks)?;
	}

	// Any remaining unclosed components are errors in strict mode.
	if let Some(creator) = pending.into_iter().next() {
		return Err(MdcxError::MissingClosingTag(creator.name));
	}

	Ok(blocks)
}

/// Build component blocks from token groups, collecting diagnostics instead
/// of hard-erroring on unclosed components.
pub fn build_blocks_from_groups_with_diagnostics(
	token_groups: &[TokenGroup],
) -> MdcxResult<(Vec<ComponentBlock>, Vec<ParseDiagnostic>)> {
	let mut pending: Vec<BlockCreator> = vec![];
	let mut blocks: Vec<ComponentBlock> = vec![];
	let mut diagnostics: Vec<ParseDiagnostic> = vec![];

	for group in token_groups {
		process_group(group, &mut pending, &mut blocks)?;
	}

	// Unclosed components become diagnostics instead of errors.
	for creator in pending {
		diagnostics.push(ParseDiagnostic::UnclosedComponent {
			name: creator.name,
			line: creator.opening.start.line,
			column: creator.opening.start.column,
		});
	}

	Ok((blocks, diagnostics))
}

fn process_group(
	group: &TokenGroup,
	pending: &mut Vec<BlockCreator>,
	blocks: &mut Vec<ComponentBlock>,
) -> MdcxResult<()> {
	match classify_group(group) {
		TagKind::Open {
			name,
			props,
			fallback,
		} => {
			pending.push(BlockCreator {
				name,
				props,
				fallback,
				opening: group.position,
				closing: None,
				self_closing: false,
			});
		}
		TagKind::SelfClosing {
			name,
			props,
			fallback,
		} => {
			blocks.push(ComponentBlock {
				name,
				props,
				fallback,
				opening: group.position,
				closing: group.position,
				self_closing: true,
			});
		}
		TagKind::Close { name } => {
			// Find the most recent matching open tag (search from the end).
			// Unmatched close tags are silently ignored to keep parsing
			// lenient.
			let index = pending.iter().rposition(|creator| creator.name == name);
			if let Some(index) = index {
				let mut creator = pending.remove(index);
				creator.closing = Some(group.position);
				blocks.push(creator.into_block()?);
			}
		}
		TagKind::Inert => {}
	}

	Ok(())
}

/// Extract the raw HTML nodes from markdown content.
pub fn get_html_nodes(content: impl AsRef<str>) -> MdcxResult<Vec<Html>> {
	let options = ParseOptions::gfm();
	let mdast =
		to_mdast(content.as_ref(), &options).map_err(|e| MdcxError::Markdown(e.to_string()))?;
	let mut html_nodes = vec![];
	collect_html(&mdast, &mut html_nodes);

	Ok(html_nodes)
}

fn collect_html(node: &Node, nodes: &mut Vec<Html>) {
	match node {
		Node::Html(html) => nodes.push(html.clone()),
		_ => {
			if let Some(children) = node.children() {
				for child in children {
					collect_html(child, nodes);
				}
			}
		}
	}
}

/// What a single `<…>` tag turned out to be.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TagKind {
	/// `<Name prop="value">` — opens a component subtree.
	Open {
		name: String,
		props: Props,
		fallback: Option<String>,
	},
	/// `<Name prop="value" />` — a childless component invocation.
	SelfClosing {
		name: String,
		props: Props,
		fallback: Option<String>,
	},
	/// `</Name>` — closes a component subtree.
	Close { name: String },
	/// Lowercase or malformed tags are inert HTML, passed through untouched.
	Inert,
}

/// A classified tag together with its position, used by the renderer to walk
/// raw HTML nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTag {
	pub kind: TagKind,
	pub position: Position,
}

/// Classify every tag found in a single raw HTML node.
pub(crate) fn node_tags(node: &Html) -> Vec<ClassifiedTag> {
	tokenize_node(node)
		.into_iter()
		.map(|group| {
			ClassifiedTag {
				kind: classify_group(&group),
				position: group.position,
			}
		})
		.collect()
}

/// Component names are capitalized, like `Callout`. Lowercase tags are plain
/// HTML and never resolve through the registry.
fn is_component_name(name: &str) -> bool {
	name.chars().next().is_some_and(|ch| ch.is_ascii_uppercase())
}

/// Classify a token group as a component open tag, self-closing invocation,
/// close tag, or inert HTML.
pub(crate) fn classify_group(group: &TokenGroup) -> TagKind {
	let mut iter = group.tokens.iter().peekable();

	let closing = match iter.next() {
		Some(Token::TagOpen) => false,
		Some(Token::ClosingTagOpen) => true,
		_ => return TagKind::Inert,
	};

	while let Some(Token::Whitespace(_) | Token::Newline) = iter.peek() {
		iter.next();
	}

	let Some(Token::Ident(name)) = iter.next() else {
		return TagKind::Inert;
	};

	if !is_component_name(name) {
		return TagKind::Inert;
	}

	if closing {
		return TagKind::Close { name: name.clone() };
	}

	let (props, fallback, self_closing) = extract_props(&mut iter);

	if self_closing {
		TagKind::SelfClosing {
			name: name.clone(),
			props,
			fallback,
		}
	} else {
		TagKind::Open {
			name: name.clone(),
			props,
			fallback,
		}
	}
}

/// Extract the props from the token stream of an open tag.
///
/// Props appear as `name=value` pairs or bare names (meaning `true`). The
/// special `as` prop names the fallback/original type used during resolution
/// and is not forwarded to the component.
fn extract_props(
	iter: &mut std::iter::Peekable<std::slice::Iter<'_, Token>>,
) -> (Props, Option<String>, bool) {
	let mut props = Props::new();
	let mut fallback = None;
	let mut self_closing = false;

	while let Some(token) = iter.next() {
		match token {
			Token::Whitespace(_) | Token::Newline => {}
			Token::SelfClose => {
				self_closing = true;
				break;
			}
			Token::TagClose => break,
			Token::Ident(prop_name) => {
				while let Some(Token::Whitespace(_) | Token::Newline) = iter.peek() {
					iter.next();
				}

				let value = if let Some(Token::Equals) = iter.peek() {
					iter.next();

					while let Some(Token::Whitespace(_) | Token::Newline) = iter.peek() {
						iter.next();
					}

					match iter.next() {
						Some(Token::String(value, _)) => PropValue::String(value.clone()),
						Some(Token::Int(value)) => {
							PropValue::Number(OrderedFloat(*value as f64))
						}
						Some(Token::Float(value)) => PropValue::Number(OrderedFloat(*value)),
						Some(Token::Ident(value)) if value == "true" => PropValue::Boolean(true),
						Some(Token::Ident(value)) if value == "false" => PropValue::Boolean(false),
						// Unquoted values are accepted leniently as strings.
						Some(Token::Ident(value)) => PropValue::String(value.clone()),
						_ => PropValue::Boolean(true),
					}
				} else {
					PropValue::Boolean(true)
				};

				if prop_name == "as" {
					if let PropValue::String(value) = value {
						fallback = Some(value);
						continue;
					}
				}

				props.insert(prop_name.clone(), value);
			}
			_ => {}
		}
	}

	(props, fallback, self_closing)
}

struct BlockCreator {
	name: String,
	props: Props,
	fallback: Option<String>,
	opening: Position,
	closing: Option<Position>,
	self_closing: bool,
}

impl BlockCreator {
	fn into_block(self) -> MdcxResult<ComponentBlock> {
		let Some(closing) = self.closing else {
			return Err(MdcxError::MissingClosingTag(self.name));
		};

		Ok(ComponentBlock {
			name: self.name,
			props: self.props,
			fallback: self.fallback,
			opening: self.opening,
			closing,
			self_closing: self.self_closing,
		})
	}
}

/// A parsed component invocation.
///
/// Components are written as capitalized tags in markdown — either paired,
/// `<Callout kind="tip">…</Callout>`, or self-closing, `<RecipeList />`.
/// Each block tracks the [`name`](ComponentBlock::name) resolved through the
/// component registry, its [`Props`], the optional fallback name from an
/// `as` prop, and the [`Position`] of its opening and closing tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentBlock {
	/// The symbolic name the component is referenced by.
	pub name: String,
	/// The props passed to the invocation.
	pub props: Props,
	/// The fallback/original-type name from the `as` prop, if any.
	pub fallback: Option<String>,
	/// Position of the opening tag.
	pub opening: Position,
	/// Position of the closing tag. Equal to `opening` for self-closing
	/// invocations.
	pub closing: Position,
	/// Whether this invocation was written self-closing.
	pub self_closing: bool,
}
