//! `mdcx_core` is the core library for the [mdcx](https://github.com/mdcx-rs/mdcx)
//! markdown component renderer. Markdown pages reference components through
//! capitalized tags, and a chain of scoped component registries decides what
//! each reference renders as.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown file
//!   → Front matter (YAML metadata: title, slug, sidebar position)
//!   → Lexer (tokenizes `<…>` tags inside raw HTML nodes into TokenGroups)
//!   → Parser (classifies tags, extracts props, matches open/close into ComponentBlocks)
//!   → Site scanner (walks directory tree, builds pages + navigation links)
//!   → Registry (merges the scope chain into one effective mapping)
//!   → Renderer (walks the markdown tree, resolving every construct through the registry)
//! ```
//!
//! ## Modules
//!
//! - [`registry`] — Scope chain merging and component resolution. The merge
//!   is copy-on-merge: parent mappings are never mutated, and deeper scopes
//!   win on key collisions.
//! - [`component`] — The [`Component`] trait and the built-in renderable
//!   components: [`Fragment`], [`HtmlElement`], and minijinja-backed
//!   [`Template`]s.
//! - [`site`] — Site scanning and routing metadata. Discovers pages,
//!   orders them by sidebar position, and links previous/next navigation.
//! - [`config`] — Configuration loading from `mdcx.toml`, including the
//!   `[components]` table that seeds the root mapping.
//!
//! ## Key Types
//!
//! - [`ComponentMapping`] — A name-to-component table.
//! - [`Scope`] — A node in the rendering hierarchy that may contribute
//!   component overrides.
//! - [`ComponentBlock`] — A parsed component invocation with its name,
//!   props, and position.
//! - [`Page`] — A scanned markdown page together with its routing metadata.
//! - [`RenderedPage`] — Rendered HTML plus the problems encountered on the
//!   way; a failing component never aborts a page.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mdcx_core::render_page;
//! use mdcx_core::site::scan_site_with_config;
//!
//! let ctx = scan_site_with_config(Path::new(".")).unwrap();
//!
//! for page in ctx.site.navigation_pages() {
//! 	let rendered = render_page(page, &ctx.base_mapping).unwrap();
//!
//! 	for problem in &rendered.problems {
//! 		eprintln!("{}: {}", problem.component, problem.message);
//! 	}
//! }
//! ```

pub use component::*;
pub use config::*;
pub use error::*;
pub use frontmatter::*;
pub use parser::*;
pub use position::*;
pub use registry::*;
pub use renderer::*;
pub use site::*;

pub mod component;
pub mod config;
mod error;
mod frontmatter;
pub(crate) mod lexer;
mod parser;
mod position;
pub mod registry;
mod renderer;
pub mod site;
pub(crate) mod tokens;

#[cfg(test)]
mod __fixtures;
