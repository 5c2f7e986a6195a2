use logos::Logos;
use serde::Serialize;

use crate::TokenArity;
use crate::TokenSignature;
use crate::find_matches;

/// Raw token shapes recognized by logos. Anything that is not a `$` is
/// skipped in bulk, and a `$` that does not start a complete token is
/// reported as a lone [`RawToken::Dollar`].
#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[^$]+")]
enum RawToken {
	#[regex(r"\$[A-Za-z_][A-Za-z0-9_]*\$")]
	NoArgs,
	#[regex(r"\$[A-Za-z_][A-Za-z0-9_]*\([0-9]+\)\$")]
	IntArg,
	#[regex(r#"\$[A-Za-z_][A-Za-z0-9_]*\("[^"\n]+"\)\$"#)]
	StringArg,
	#[regex(r#"\$[A-Za-z_][A-Za-z0-9_]*\("[^"\n]+","[^"\n]*"\)\$"#)]
	TwoStringArgs,
	#[token("$")]
	Dollar,
}

/// How a token-shaped fragment relates to the registered tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStatus {
	/// A registered token with the expected arguments. It will be replaced.
	Known,
	/// No token with this name is registered.
	Unknown,
	/// A registered token written with the wrong arguments. It is left
	/// untouched.
	Mismatched,
}

/// A token-shaped fragment found in template content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenReference {
	pub name: String,
	pub arity: TokenArity,
	pub arguments: Vec<String>,
	/// The full fragment, including both `$` delimiters.
	pub text: String,
	/// Byte offset of the opening `$`.
	pub offset: usize,
	/// 1-based line number.
	pub line: usize,
	/// 1-based column, counted in characters.
	pub column: usize,
}

impl TokenReference {
	/// Classify the fragment against the registered tokens.
	///
	/// A fragment is `Known` when a registered token of the same name would
	/// replace the whole fragment. String arguments are matched lazily, so
	/// `$FILE("a","b")$` is replaced by `FILE` with the argument `a","b`.
	pub fn status(&self, signatures: &[TokenSignature]) -> TokenStatus {
		let mut named = signatures
			.iter()
			.filter(|signature| signature.name == self.name)
			.peekable();

		if named.peek().is_none() {
			TokenStatus::Unknown
		} else if named.any(|signature| self.is_replaced_by(signature.arity)) {
			TokenStatus::Known
		} else {
			TokenStatus::Mismatched
		}
	}

	fn is_replaced_by(&self, arity: TokenArity) -> bool {
		find_matches(&self.text, &self.name, arity)
			.first()
			.is_some_and(|found| found.start == 0 && found.end == self.text.len())
	}
}

/// Find every token-shaped fragment in `content`, in order of appearance.
///
/// This is a diagnostic inventory. Replacement itself matches each
/// registered token on its own.
pub fn scan_tokens(content: &str) -> Vec<TokenReference> {
	let mut references = Vec::new();
	let mut line = 1;
	let mut line_start = 0;
	let mut counted = 0;

	for (raw, span) in RawToken::lexer(content).spanned() {
		let arity = match raw {
			Ok(RawToken::NoArgs) => TokenArity::NoArgs,
			Ok(RawToken::IntArg) => TokenArity::IntArg,
			Ok(RawToken::StringArg) => TokenArity::StringArg,
			Ok(RawToken::TwoStringArgs) => TokenArity::TwoStringArgs,
			Ok(RawToken::Dollar) | Err(()) => continue,
		};

		for (index, _) in content[counted..span.start].match_indices('\n') {
			line += 1;
			line_start = counted + index + 1;
		}
		counted = span.start;

		let text = &content[span.clone()];
		let (name, arguments) = split_fragment(text, arity);
		references.push(TokenReference {
			name: name.to_string(),
			arity,
			arguments,
			text: text.to_string(),
			offset: span.start,
			line,
			column: content[line_start..span.start].chars().count() + 1,
		});
	}

	references
}

/// Split a complete fragment into its name and arguments.
fn split_fragment(text: &str, arity: TokenArity) -> (&str, Vec<String>) {
	let inner = &text[1..text.len() - 1];
	let Some((name, list)) = inner.split_once('(') else {
		return (inner, Vec::new());
	};

	let list = &list[..list.len() - 1];
	let arguments = match arity {
		TokenArity::NoArgs => Vec::new(),
		TokenArity::IntArg => vec![list.to_string()],
		TokenArity::StringArg => vec![unquote(list).to_string()],
		TokenArity::TwoStringArgs => {
			unquote(list)
				.split_once("\",\"")
				.map(|(first, second)| vec![first.to_string(), second.to_string()])
				.unwrap_or_default()
		}
	};

	(name, arguments)
}

fn unquote(text: &str) -> &str {
	text.strip_prefix('"')
		.and_then(|text| text.strip_suffix('"'))
		.unwrap_or(text)
}
