use crate::MatchArguments;
use crate::TokenArity;
use crate::TokenSignature;
use crate::VcstampError;
use crate::VcstampResult;
use crate::find_matches;

type NoArgsFn<S> = Box<dyn Fn(&mut S) -> VcstampResult<String>>;
type IntArgFn<S> = Box<dyn Fn(&mut S, i64) -> VcstampResult<String>>;
type StringArgFn<S> = Box<dyn Fn(&mut S, &str) -> VcstampResult<String>>;
type TwoStringArgsFn<S> = Box<dyn Fn(&mut S, &str, &str) -> VcstampResult<String>>;

/// The callback bound to a token name, tagged by the arguments it accepts.
///
/// Every handler receives the registry's source mutably so it can compute
/// and memoize facts on first use.
pub enum TokenHandler<S> {
	NoArgs(NoArgsFn<S>),
	IntArg(IntArgFn<S>),
	StringArg(StringArgFn<S>),
	TwoStringArgs(TwoStringArgsFn<S>),
}

impl<S> TokenHandler<S> {
	pub fn arity(&self) -> TokenArity {
		match self {
			Self::NoArgs(_) => TokenArity::NoArgs,
			Self::IntArg(_) => TokenArity::IntArg,
			Self::StringArg(_) => TokenArity::StringArg,
			Self::TwoStringArgs(_) => TokenArity::TwoStringArgs,
		}
	}
}

/// A named token and its handler.
pub struct Token<S> {
	name: String,
	handler: TokenHandler<S>,
}

impl<S> Token<S> {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn signature(&self) -> TokenSignature {
		TokenSignature {
			name: self.name.clone(),
			arity: self.handler.arity(),
		}
	}

	fn resolve(&self, source: &mut S, arguments: MatchArguments<'_>) -> VcstampResult<String> {
		match (&self.handler, arguments) {
			(TokenHandler::NoArgs(handler), MatchArguments::None) => handler(source),
			(TokenHandler::IntArg(handler), MatchArguments::Int(digits)) => {
				let value = digits.parse::<i64>().map_err(|error| {
					VcstampError::TokenArgument {
						token: self.name.clone(),
						argument: digits.to_string(),
						reason: error.to_string(),
					}
				})?;
				handler(source, value)
			}
			(TokenHandler::StringArg(handler), MatchArguments::String(value)) => {
				handler(source, value)
			}
			(TokenHandler::TwoStringArgs(handler), MatchArguments::TwoStrings(first, second)) => {
				handler(source, first, second)
			}
			(handler, arguments) => {
				Err(VcstampError::TokenArgument {
					token: self.name.clone(),
					argument: format!("{arguments:?}"),
					reason: format!("expected {:?} arguments", handler.arity()),
				})
			}
		}
	}
}

/// An ordered set of token handlers sharing one source of facts.
///
/// [`TokenRegistry::replace`] runs every handler, in registration order,
/// over the whole content. A later handler scans the output of the earlier
/// ones, so a value that itself looks like a later token is replaced too.
pub struct TokenRegistry<S> {
	source: S,
	tokens: Vec<Token<S>>,
}

impl<S> TokenRegistry<S> {
	pub fn new(source: S) -> Self {
		Self {
			source,
			tokens: Vec::new(),
		}
	}

	/// Register `$NAME$`.
	pub fn add_no_args(
		&mut self,
		name: impl Into<String>,
		handler: impl Fn(&mut S) -> VcstampResult<String> + 'static,
	) -> &mut Self {
		self.add(name, TokenHandler::NoArgs(Box::new(handler)))
	}

	/// Register `$NAME(123)$`.
	pub fn add_int_arg(
		&mut self,
		name: impl Into<String>,
		handler: impl Fn(&mut S, i64) -> VcstampResult<String> + 'static,
	) -> &mut Self {
		self.add(name, TokenHandler::IntArg(Box::new(handler)))
	}

	/// Register `$NAME("text")$`.
	pub fn add_string_arg(
		&mut self,
		name: impl Into<String>,
		handler: impl Fn(&mut S, &str) -> VcstampResult<String> + 'static,
	) -> &mut Self {
		self.add(name, TokenHandler::StringArg(Box::new(handler)))
	}

	/// Register `$NAME("text","text")$`.
	pub fn add_two_string_args(
		&mut self,
		name: impl Into<String>,
		handler: impl Fn(&mut S, &str, &str) -> VcstampResult<String> + 'static,
	) -> &mut Self {
		self.add(name, TokenHandler::TwoStringArgs(Box::new(handler)))
	}

	pub fn add(&mut self, name: impl Into<String>, handler: TokenHandler<S>) -> &mut Self {
		self.tokens.push(Token {
			name: name.into(),
			handler,
		});
		self
	}

	pub fn tokens(&self) -> &[Token<S>] {
		&self.tokens
	}

	/// Every registered token, in registration order.
	pub fn signatures(&self) -> Vec<TokenSignature> {
		self.tokens.iter().map(Token::signature).collect()
	}

	pub fn source(&self) -> &S {
		&self.source
	}

	pub fn source_mut(&mut self) -> &mut S {
		&mut self.source
	}

	pub fn into_source(self) -> S {
		self.source
	}

	/// Replace every token occurrence in `content`.
	///
	/// The handler is called once per occurrence. Fragments that do not fit a
	/// registered token's shape are left untouched. The first handler error
	/// aborts the replacement.
	pub fn replace(&mut self, content: &str) -> VcstampResult<String> {
		let mut content = content.to_string();

		for token in &self.tokens {
			let matches = find_matches(&content, &token.name, token.handler.arity());
			if matches.is_empty() {
				continue;
			}

			tracing::trace!(token = %token.name, count = matches.len(), "replacing token");
			let mut output = String::with_capacity(content.len());
			let mut cursor = 0;
			for found in matches {
				output.push_str(&content[cursor..found.start]);
				output.push_str(&token.resolve(&mut self.source, found.arguments)?);
				cursor = found.end;
			}
			output.push_str(&content[cursor..]);
			content = output;
		}

		Ok(content)
	}
}
