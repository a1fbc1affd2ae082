use serde::Deserialize;
use serde::Serialize;

use crate::MdcxError;
use crate::MdcxResult;

/// Page metadata parsed from leading YAML front matter.
///
/// ```markdown
/// ---
/// title: Datagen
/// sidebar_position: 5
/// ---
/// ```
///
/// All fields are optional; a missing `title` falls back to the page's first
/// heading, and a missing `slug` is derived from the file path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
	/// The page title shown in navigation and the document head.
	#[serde(default)]
	pub title: Option<String>,
	/// A short description for the document head.
	#[serde(default)]
	pub description: Option<String>,
	/// Explicit slug overriding the path-derived one, e.g. `/datagen`.
	#[serde(default)]
	pub slug: Option<String>,
	/// Ordering key for navigation. Pages without a position sort last,
	/// alphabetically by title.
	#[serde(default)]
	pub sidebar_position: Option<i64>,
	/// Free-form tags.
	#[serde(default)]
	pub tags: Vec<String>,
	/// Draft pages are scanned and checked but excluded from navigation and
	/// build output.
	#[serde(default)]
	pub draft: bool,
}

/// Split and parse leading YAML front matter. Returns the parsed front
/// matter (default when absent) and the remaining body.
///
/// Front matter must start on the very first line with `---` and end with a
/// line containing only `---`. Content without a complete front matter fence
/// is returned unchanged with default metadata.
pub fn parse_front_matter(content: &str) -> MdcxResult<(FrontMatter, &str)> {
	let Some(rest) = content
		.strip_prefix("---\n")
		.or_else(|| content.strip_prefix("---\r\n"))
	else {
		return Ok((FrontMatter::default(), content));
	};

	let mut offset = 0;

	for line in rest.split_inclusive('\n') {
		let trimmed = line.trim_end_matches(['\n', '\r']);

		if trimmed == "---" {
			let yaml = &rest[..offset];
			let body = &rest[offset + line.len()..];

			if yaml.trim().is_empty() {
				return Ok((FrontMatter::default(), body));
			}

			let front_matter = serde_yaml_ng::from_str(yaml)
				.map_err(|e| MdcxError::FrontMatter(e.to_string()))?;

			return Ok((front_matter, body));
		}

		offset += line.len();
	}

	// No closing fence: the leading `---` was a thematic break, not front
	// matter.
	Ok((FrontMatter::default(), content))
}

/// The number of lines the front matter fence consumed, used to translate
/// body-relative positions back to file positions.
pub fn front_matter_line_offset(content: &str, body: &str) -> usize {
	let consumed = content.len() - body.len();
	content[..consumed].matches('\n').count()
}
