use std::fmt::Display;

use serde::Serialize;

/// The argument shape a token accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenArity {
	/// `$NAME$`
	NoArgs,
	/// `$NAME(123)$`
	IntArg,
	/// `$NAME("text")$`
	StringArg,
	/// `$NAME("text","other")$`, the second argument may be empty.
	TwoStringArgs,
}

/// A registered token name together with the arguments it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TokenSignature {
	pub name: String,
	pub arity: TokenArity,
}

impl Display for TokenSignature {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = &self.name;
		match self.arity {
			TokenArity::NoArgs => write!(f, "${name}$"),
			TokenArity::IntArg => write!(f, "${name}(n)$"),
			TokenArity::StringArg => write!(f, "${name}(\"text\")$"),
			TokenArity::TwoStringArgs => write!(f, "${name}(\"text\",\"text\")$"),
		}
	}
}

/// The arguments captured by a single token match, still as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchArguments<'a> {
	None,
	Int(&'a str),
	String(&'a str),
	TwoStrings(&'a str, &'a str),
}

/// A single occurrence of a token in some content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch<'a> {
	/// Byte offset of the opening `$`.
	pub start: usize,
	/// Byte offset just past the closing `$`.
	pub end: usize,
	pub arguments: MatchArguments<'a>,
}

/// Find every non-overlapping occurrence of the token `name` with the given
/// arity, scanning left to right.
///
/// String arguments are matched lazily and without escapes: the first
/// argument runs until the first `")$` (or `","` for two arguments) that
/// leaves it at least one character long, and no argument may span a line
/// break. Fragments that do not fit the shape are not matches.
pub fn find_matches<'a>(content: &'a str, name: &str, arity: TokenArity) -> Vec<TokenMatch<'a>> {
	let opening = format!("${name}");
	let mut matches = Vec::new();
	let mut cursor = 0;

	while let Some(found) = content[cursor..].find(&opening) {
		let start = cursor + found;
		let after_name = start + opening.len();

		match match_arguments(&content[after_name..], arity) {
			Some((arguments, consumed)) => {
				let end = after_name + consumed;
				matches.push(TokenMatch {
					start,
					end,
					arguments,
				});
				cursor = end;
			}
			// `$` is a single byte, so this stays on a char boundary.
			None => cursor = start + 1,
		}
	}

	matches
}

/// Match the argument list and closing `$` at the start of `rest`. Returns
/// the captured arguments and the number of bytes consumed.
fn match_arguments(rest: &str, arity: TokenArity) -> Option<(MatchArguments<'_>, usize)> {
	match arity {
		TokenArity::NoArgs => rest.starts_with('$').then_some((MatchArguments::None, 1)),
		TokenArity::IntArg => {
			let inner = rest.strip_prefix('(')?;
			let digits = inner.len() - inner.trim_start_matches(|c: char| c.is_ascii_digit()).len();
			if digits == 0 || !inner[digits..].starts_with(")$") {
				return None;
			}
			Some((MatchArguments::Int(&inner[..digits]), 1 + digits + 2))
		}
		TokenArity::StringArg => {
			let body = rest.strip_prefix("(\"")?;
			let length = lazy_until(body, "\")$", 1)?;
			Some((MatchArguments::String(&body[..length]), 2 + length + 3))
		}
		TokenArity::TwoStringArgs => {
			let body = rest.strip_prefix("(\"")?;
			let first = lazy_until(body, "\",\"", 1)?;
			let remainder = &body[first + 3..];
			let second = lazy_until(remainder, "\")$", 0)?;
			Some((
				MatchArguments::TwoStrings(&body[..first], &remainder[..second]),
				2 + first + 3 + second + 3,
			))
		}
	}
}

/// Length of the shortest prefix of `text`, at least `min_chars` characters
/// long and free of line breaks, that is directly followed by `terminator`.
fn lazy_until(text: &str, terminator: &str, min_chars: usize) -> Option<usize> {
	let from = text
		.char_indices()
		.nth(min_chars)
		.map_or(text.len(), |(index, _)| index);

	if text[..from].contains('\n') || text.chars().count() < min_chars {
		return None;
	}

	let found = from + text[from..].find(terminator)?;
	if text[from..found].contains('\n') {
		return None;
	}

	Some(found)
}
