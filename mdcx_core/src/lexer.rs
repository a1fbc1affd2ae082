use logos::Logos;
use markdown::mdast::Html;
use snailquote::unescape;

use crate::MdcxResult;
use crate::Position;
use crate::tokens::Token;
use crate::tokens::TokenGroup;

/// Raw tokens produced by logos for flat tokenization of HTML node content.
#[derive(Logos, Clone, Copy, Debug, PartialEq)]
enum RawToken {
	#[token("</")]
	ClosingTagOpen,
	#[token("<")]
	TagOpen,
	#[token("/>")]
	SelfClose,
	#[token(">")]
	TagClose,
	#[token("=")]
	Equals,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r]")]
	Whitespace,
	#[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
	Ident,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?")]
	Number,
}

/// Context states for the simplified state machine that drives
/// context-dependent token processing.
enum LexerContext {
	/// The lexer is currently outside of any tag.
	Outside,
	/// The lexer is currently inside a `<…>` tag.
	Tag,
}

/// Walks the logos token stream with context-dependent rules, building one
/// `TokenGroup` per complete tag.
struct TokenWalker<'a> {
	/// The source text of the current HTML node.
	source: &'a str,
	/// The collected raw tokens and their byte spans.
	raw_tokens: Vec<(Result<RawToken, ()>, std::ops::Range<usize>)>,
	/// Current index into `raw_tokens`.
	cursor: usize,
	/// The current position tracker (line/column/offset).
	position: Position,
	/// The current token group being built.
	token_group: TokenGroup,
	/// The current context for the state machine.
	context: LexerContext,
	/// Collected complete groups.
	groups: Vec<TokenGroup>,
}

impl<'a> TokenWalker<'a> {
	fn new(source: &'a str, start_position: Position) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			position: start_position,
			token_group: TokenGroup {
				tokens: vec![],
				position: start_position,
			},
			context: LexerContext::Outside,
			groups: vec![],
		}
	}

	/// Get the text slice for the current raw token.
	fn current_slice(&self) -> &'a str {
		let (_, span) = &self.raw_tokens[self.cursor];
		&self.source[span.clone()]
	}

	/// Advance the position tracker through the current raw token and move
	/// the cursor forward.
	fn advance_cursor(&mut self) {
		let slice = self.current_slice();
		self.position.start.advance_str(slice);
		self.cursor += 1;
	}

	/// Add a token to the current token group, then advance the cursor.
	fn push_token(&mut self, token: Token, update_start: bool) {
		if update_start {
			self.token_group.position.start = self.position.start;
			self.token_group.position.end = self.position.start;
		}

		self.token_group.position.advance_end(&token);
		self.token_group.tokens.push(token);
		self.advance_cursor();
	}

	/// Start a fresh group at the current position with the given opening
	/// token. Any partially built group is discarded.
	fn begin_group(&mut self, token: Token) {
		self.token_group = TokenGroup {
			tokens: vec![],
			position: Position {
				start: self.position.start,
				end: self.position.start,
			},
		};
		self.push_token(token, true);
		self.context = LexerContext::Tag;
	}

	/// Complete the current group and return to the outside context.
	fn finish_group(&mut self) {
		if self.token_group.tokens.len() > 1 {
			let group = std::mem::replace(&mut self.token_group, TokenGroup {
				tokens: vec![],
				position: self.position,
			});
			self.groups.push(group);
		}

		self.context = LexerContext::Outside;
	}

	/// Discard the current group without completing it.
	fn abandon_group(&mut self) {
		self.advance_cursor();
		self.token_group.tokens.clear();
		self.context = LexerContext::Outside;
	}

	fn walk(mut self) -> Vec<TokenGroup> {
		while self.cursor < self.raw_tokens.len() {
			let raw = self.raw_tokens[self.cursor].0;

			match self.context {
				LexerContext::Outside => {
					match raw {
						Ok(RawToken::TagOpen) => self.begin_group(Token::TagOpen),
						Ok(RawToken::ClosingTagOpen) => self.begin_group(Token::ClosingTagOpen),
						_ => self.advance_cursor(),
					}
				}
				LexerContext::Tag => {
					match raw {
						// A fresh `<` inside a tag means the current group was
						// never a real tag. Restart from here.
						Ok(RawToken::TagOpen) => self.begin_group(Token::TagOpen),
						Ok(RawToken::ClosingTagOpen) => self.begin_group(Token::ClosingTagOpen),
						Ok(RawToken::TagClose) => {
							self.push_token(Token::TagClose, false);
							self.finish_group();
						}
						Ok(RawToken::SelfClose) => {
							self.push_token(Token::SelfClose, false);
							self.finish_group();
						}
						Ok(RawToken::Equals) => self.push_token(Token::Equals, false),
						Ok(RawToken::Newline) => self.push_token(Token::Newline, false),
						Ok(RawToken::Whitespace) => {
							let byte = self.current_slice().as_bytes()[0];
							self.push_token(Token::Whitespace(byte), false);
						}
						Ok(RawToken::Ident) => {
							let ident = self.current_slice().to_string();
							self.push_token(Token::Ident(ident), false);
						}
						Ok(RawToken::DoubleQuotedString | RawToken::SingleQuotedString) => {
							let slice = self.current_slice();
							let delimiter = slice.as_bytes()[0];
							let value = unescape(slice)
								.unwrap_or_else(|_| slice[1..slice.len() - 1].to_string());
							self.push_token(Token::String(value, delimiter), false);
						}
						Ok(RawToken::Number) => {
							let slice = self.current_slice();
							if let Ok(int) = slice.parse::<i64>() {
								self.push_token(Token::Int(int), false);
							} else if let Ok(float) = slice.parse::<f64>() {
								self.push_token(Token::Float(float), false);
							} else {
								self.advance_cursor();
							}
						}
						// A byte no tag can contain (e.g. `!` in an HTML
						// comment): this is not a component tag.
						Err(()) => self.abandon_group(),
					}
				}
			}
		}

		self.groups
	}
}

/// Tokenize the `<…>` tags found in a single raw HTML node.
pub(crate) fn tokenize_node(node: &Html) -> Vec<TokenGroup> {
	let start_position = node
		.position
		.as_ref()
		.map(Position::from_unist)
		.unwrap_or_default();

	TokenWalker::new(&node.value, start_position).walk()
}

/// Tokenize the tags of every HTML node into token groups.
pub(crate) fn tokenize(nodes: Vec<Html>) -> MdcxResult<Vec<TokenGroup>> {
	let mut groups = vec![];

	for node in &nodes {
		groups.extend(tokenize_node(node));
	}

	Ok(groups)
}
