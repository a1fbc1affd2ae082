use serde::Deserialize;
use serde::Serialize;

use crate::tokens::Token;

/// A single location in a source file. Lines and columns are 1-indexed, the
/// byte offset is 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

impl Point {
	pub fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}

	/// Advance this point through a text slice, tracking newlines.
	pub fn advance_str(&mut self, text: &str) {
		for ch in text.chars() {
			if ch == '\n' {
				self.line += 1;
				self.column = 1;
			} else {
				self.column += 1;
			}

			self.offset += ch.len_utf8();
		}
	}
}

impl Default for Point {
	fn default() -> Self {
		Self::new(1, 1, 0)
	}
}

/// The span of a token group or component block in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
	pub start: Point,
	pub end: Point,
}

impl Position {
	pub fn new(
		start_line: usize,
		start_column: usize,
		start_offset: usize,
		end_line: usize,
		end_column: usize,
		end_offset: usize,
	) -> Self {
		Self {
			start: Point::new(start_line, start_column, start_offset),
			end: Point::new(end_line, end_column, end_offset),
		}
	}

	/// Create a position covering a whole markdown node, from the positions
	/// the markdown parser reports.
	pub fn from_unist(position: &markdown::unist::Position) -> Self {
		Self {
			start: Point::new(
				position.start.line,
				position.start.column,
				position.start.offset,
			),
			end: Point::new(position.end.line, position.end.column, position.end.offset),
		}
	}

	/// Advance the start point past the given token.
	pub fn advance_start(&mut self, token: &Token) {
		advance_point(&mut self.start, token);
	}

	/// Advance the end point past the given token.
	pub fn advance_end(&mut self, token: &Token) {
		advance_point(&mut self.end, token);
	}
}

fn advance_point(point: &mut Point, token: &Token) {
	match token {
		Token::Newline => {
			point.line += 1;
			point.column = 1;
			point.offset += 1;
		}
		other => {
			let length = other.increment();
			point.column += length;
			point.offset += length;
		}
	}
}
