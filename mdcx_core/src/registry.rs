use std::collections::HashMap;
use std::sync::Arc;

use crate::MdcxError;
use crate::MdcxResult;
use crate::component::ComponentRef;
use crate::component::Fragment;
use crate::component::HtmlElement;

/// A name-to-component table. Keys are the symbolic names components are
/// referenced by; insertion order is irrelevant.
pub type ComponentMapping = HashMap<String, ComponentRef>;

/// The component overrides a scope contributes.
///
/// A scope either supplies a fixed mapping merged over its parent's, or a
/// function deriving the full mapping from the parent's.
pub enum ScopeOverride {
	/// A fixed mapping. Its entries shadow parent entries with the same key.
	Fixed(ComponentMapping),
	/// A function from the parent mapping to the effective mapping. The
	/// returned mapping is used exactly as produced.
	Derived(Box<dyn Fn(&ComponentMapping) -> ComponentMapping + Send + Sync>),
}

impl std::fmt::Debug for ScopeOverride {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Fixed(mapping) => {
				let mut names: Vec<_> = mapping.keys().collect();
				names.sort();
				f.debug_tuple("Fixed").field(&names).finish()
			}
			Self::Derived(_) => f.debug_tuple("Derived").field(&"<fn>").finish(),
		}
	}
}

/// Merge a scope's own overrides over its parent's mapping.
///
/// The parent mapping is never mutated; the result is always a new mapping.
/// Absent overrides yield a copy of the parent, content-equal but distinct.
pub fn merge_scope(
	parent: &ComponentMapping,
	overrides: Option<&ScopeOverride>,
) -> ComponentMapping {
	match overrides {
		None => parent.clone(),
		Some(ScopeOverride::Derived(derive)) => derive(parent),
		Some(ScopeOverride::Fixed(own)) => {
			let mut merged = parent.clone();

			for (name, component) in own {
				merged.insert(name.clone(), Arc::clone(component));
			}

			merged
		}
	}
}

/// A node in the hierarchy of nested rendering contexts. Each scope
/// optionally supplies its own component overrides and holds a non-owning
/// reference to its parent, so a parent always outlives its children.
///
/// Scopes are constructed when a rendering context is entered and dropped
/// when it exits; nothing persists across renders.
#[derive(Debug)]
pub struct Scope<'a> {
	parent: Option<&'a Scope<'a>>,
	overrides: Option<ScopeOverride>,
}

impl<'a> Scope<'a> {
	/// Create a root scope with the given overrides as its base mapping.
	pub fn root(overrides: Option<ScopeOverride>) -> Self {
		Self {
			parent: None,
			overrides,
		}
	}

	/// Create a child scope contributing the given overrides on top of this
	/// scope's chain.
	pub fn child(&'a self, overrides: Option<ScopeOverride>) -> Scope<'a> {
		Scope {
			parent: Some(self),
			overrides,
		}
	}

	/// Merge the chain of scopes from the root down to this scope into one
	/// effective mapping. Deeper scopes win on key collisions.
	pub fn effective(&self) -> ComponentMapping {
		let parent = self
			.parent
			.map_or_else(ComponentMapping::new, Scope::effective);

		merge_scope(&parent, self.overrides.as_ref())
	}
}

/// The lookup key formed by combining a requested symbolic name with its
/// fallback/original-type name.
pub fn composed_key(requested: &str, fallback: &str) -> String {
	format!("{requested}.{fallback}")
}

/// Resolve a requested symbolic component name against an effective mapping.
///
/// Lookup order:
///
/// 1. the composed key `"{requested}.{fallback}"`, when a fallback is given;
/// 2. `requested` alone;
/// 3. the built-in default renderer for `fallback`, if one exists;
/// 4. otherwise [`MdcxError::UnresolvedComponent`] for `requested`.
///
/// This is a pure lookup with no side effects.
pub fn resolve_component(
	mapping: &ComponentMapping,
	requested: &str,
	fallback: Option<&str>,
) -> MdcxResult<ComponentRef> {
	if let Some(fallback) = fallback {
		if let Some(component) = mapping.get(&composed_key(requested, fallback)) {
			return Ok(Arc::clone(component));
		}
	}

	if let Some(component) = mapping.get(requested) {
		return Ok(Arc::clone(component));
	}

	if let Some(component) = fallback.and_then(builtin_default) {
		return Ok(component);
	}

	Err(MdcxError::UnresolvedComponent {
		name: requested.to_string(),
	})
}

/// The built-in default renderer for a fallback/original-type name, if one
/// exists.
///
/// Defaults exist only for the markup names markdown output itself produces,
/// plus `fragment` (children pass-through). Anything else — `span` included —
/// has no default and must be registered explicitly.
pub fn builtin_default(name: &str) -> Option<ComponentRef> {
	match name {
		"fragment" => Some(Arc::new(Fragment)),
		"p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "a" | "ul" | "ol" | "li" | "blockquote"
		| "pre" | "code" | "em" | "strong" | "del" | "hr" | "br" | "img" | "table" | "thead"
		| "tbody" | "tr" | "th" | "td" | "sup" => Some(Arc::new(HtmlElement::new(name))),
		_ => None,
	}
}
