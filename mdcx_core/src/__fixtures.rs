use std::path::PathBuf;
use std::sync::Arc;

use crate::MdcxResult;
use crate::Position;
use crate::component::Component;
use crate::component::ComponentRef;
use crate::component::Props;
use crate::frontmatter::FrontMatter;
use crate::registry::ComponentMapping;
use crate::registry::ScopeOverride;
use crate::site::Page;
use crate::tokens::Token;
use crate::tokens::TokenGroup;

/// A test component that renders a fixed string, ignoring props and
/// children.
#[derive(Debug)]
pub(crate) struct StaticComponent(pub &'static str);

impl Component for StaticComponent {
	fn render(&self, _props: &Props, _children: &str) -> MdcxResult<String> {
		Ok(self.0.to_string())
	}
}

/// A test component that wraps its children in a named marker.
#[derive(Debug)]
pub(crate) struct MarkerComponent(pub &'static str);

impl Component for MarkerComponent {
	fn render(&self, _props: &Props, children: &str) -> MdcxResult<String> {
		Ok(format!("[{0}]{children}[/{0}]", self.0))
	}
}

/// A test component that passes its children through while contributing
/// fixed overrides to the subtree rendered beneath it.
#[derive(Debug)]
pub(crate) struct ProviderComponent(pub Vec<(&'static str, &'static str)>);

impl Component for ProviderComponent {
	fn render(&self, _props: &Props, children: &str) -> MdcxResult<String> {
		Ok(children.to_string())
	}

	fn overrides(&self) -> Option<ScopeOverride> {
		Some(ScopeOverride::Fixed(static_mapping(&self.0)))
	}
}

pub(crate) fn static_component(output: &'static str) -> ComponentRef {
	Arc::new(StaticComponent(output))
}

pub(crate) fn static_mapping(entries: &[(&'static str, &'static str)]) -> ComponentMapping {
	entries
		.iter()
		.map(|&(name, output)| (name.to_string(), static_component(output)))
		.collect()
}

/// A minimal page for exercising the renderer directly.
pub(crate) fn page_with_body(body: &str) -> Page {
	Page {
		file: PathBuf::from("docs/test.md"),
		id: "test".to_string(),
		title: "Test".to_string(),
		slug: "/test".to_string(),
		permalink: "/test".to_string(),
		sidebar_position: None,
		front_matter: FrontMatter::default(),
		body: body.to_string(),
		line_offset: 0,
		components: vec![],
		previous: None,
		next: None,
	}
}

/// `<Callout kind="tip">`
pub(crate) fn open_token_group() -> TokenGroup {
	TokenGroup {
		tokens: vec![
			Token::TagOpen,
			Token::Ident("Callout".to_string()),
			Token::Whitespace(b' '),
			Token::Ident("kind".to_string()),
			Token::Equals,
			Token::String("tip".to_string(), b'"'),
			Token::TagClose,
		],
		position: Position::new(1, 1, 0, 1, 21, 20),
	}
}

/// `</Callout>`
pub(crate) fn closing_token_group() -> TokenGroup {
	TokenGroup {
		tokens: vec![
			Token::ClosingTagOpen,
			Token::Ident("Callout".to_string()),
			Token::TagClose,
		],
		position: Position::new(1, 1, 0, 1, 11, 10),
	}
}

/// `<RecipeList type="calcination" />`
pub(crate) fn self_closing_token_group() -> TokenGroup {
	TokenGroup {
		tokens: vec![
			Token::TagOpen,
			Token::Ident("RecipeList".to_string()),
			Token::Whitespace(b' '),
			Token::Ident("type".to_string()),
			Token::Equals,
			Token::String("calcination".to_string(), b'"'),
			Token::Whitespace(b' '),
			Token::SelfClose,
		],
		position: Position::new(1, 1, 0, 1, 34, 33),
	}
}
