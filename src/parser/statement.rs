//! Statement-level views over a tokenized command line
//!
//! The completion driver needs three things from the parser: the span of
//! the innermost command substitution around the cursor, the token under
//! the cursor, and the *plain statement* (command word, decoration and
//! argument list) enclosing a position. All three are tolerant of
//! half-typed input.

use std::ops::Range;

use super::tokenizer::{Token, TokenKind, Tokenizer};

/// Syntactic marker constraining which lookup sources apply to a
/// command word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decoration {
    /// No decoration: search the path, functions and builtins
    #[default]
    None,
    /// `command` keyword: path lookup only
    Command,
    /// `exec` keyword: path lookup only
    Exec,
    /// `builtin` keyword: builtins only
    Builtin,
}

impl Decoration {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "command" => Some(Decoration::Command),
            "exec" => Some(Decoration::Exec),
            "builtin" => Some(Decoration::Builtin),
            _ => None,
        }
    }
}

/// A parsed command invocation: a command word, an optional decoration,
/// and a sequence of arguments (redirections already stripped)
#[derive(Debug, Clone)]
pub struct PlainStatement {
    /// The command word token
    pub command: Token,
    /// Decoration preceding the command word, if any
    pub decoration: Decoration,
    /// Argument word tokens, in order
    pub args: Vec<Token>,
}

/// Return the span of the innermost `$( ... )` substitution containing
/// `pos`, or the whole line when the position sits in none.
///
/// The returned range covers the substitution *contents*, excluding the
/// `$(` and `)` delimiters. An unterminated substitution extends to the
/// end of the line.
pub fn cmdsubst_extent(line: &str, pos: usize) -> Range<usize> {
    let mut best: Option<Range<usize>> = None;
    let mut stack: Vec<usize> = Vec::new();

    let mut quote: Option<char> = None;
    let mut escaped = false;
    let bytes = line.char_indices().collect::<Vec<_>>();
    let mut i = 0;
    while i < bytes.len() {
        let (at, c) = bytes[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\'' | '"' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            },
            '$' if quote != Some('\'') => {
                if let Some((_, '(')) = bytes.get(i + 1) {
                    let content_start = bytes
                        .get(i + 2)
                        .map(|&(b, _)| b)
                        .unwrap_or_else(|| line.len());
                    stack.push(content_start);
                    i += 2;
                    continue;
                }
            }
            ')' if quote.is_none() => {
                if let Some(start) = stack.pop() {
                    if start <= pos && pos <= at && best.is_none() {
                        best = Some(start..at);
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    // Open substitutions run to the end of the line. The innermost
    // candidate is the one whose contents start latest.
    while let Some(start) = stack.pop() {
        if start <= pos {
            if best.as_ref().map_or(true, |b| start > b.start) {
                best = Some(start..line.len());
            }
            break;
        }
    }

    best.unwrap_or(0..line.len())
}

/// Return the source range of the token under `pos`.
///
/// When the position touches a word (inside it or at its end), the range
/// runs from that word's start to the end of the line, which is where the
/// cursor-relative token of an in-progress command line ends. Otherwise
/// the token is empty at `pos`.
pub fn token_extent(line: &str, pos: usize) -> Range<usize> {
    let tokens = Tokenizer::tokenize(line);
    for token in &tokens {
        if token.is_word() && token.span.start <= pos && pos <= token.span.end {
            return token.span.start..line.len();
        }
    }
    pos..line.len()
}

/// Locate the plain statement enclosing `pos`, if any.
///
/// Statements are delimited by pipes, separators and newlines. A
/// position is enclosed when it falls inside the statement's source
/// range or exactly at its end.
pub fn plain_statement_at(line: &str, pos: usize) -> Option<PlainStatement> {
    let tokens = Tokenizer::tokenize(line);

    // Split into statement-sized token runs
    let mut statements: Vec<Vec<Token>> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    for token in tokens {
        match token.kind {
            TokenKind::Eof => break,
            _ if token.is_separator() => {
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(token),
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }

    let run = statements.into_iter().find(|run| {
        let start = run.first().map(|t| t.span.start).unwrap_or(0);
        let end = run.last().map(|t| t.span.end).unwrap_or(0);
        start <= pos && pos <= end
    })?;

    build_statement(run)
}

/// Assemble a [`PlainStatement`] from one statement's token run
fn build_statement(run: Vec<Token>) -> Option<PlainStatement> {
    // Strip redirections together with their targets
    let mut words: Vec<Token> = Vec::new();
    let mut iter = run.into_iter().peekable();
    while let Some(token) = iter.next() {
        match token.kind {
            TokenKind::Redirect(_) => {
                if matches!(iter.peek(), Some(t) if t.is_word()) {
                    iter.next();
                }
            }
            TokenKind::Word(_) => words.push(token),
            _ => {}
        }
    }

    if words.is_empty() {
        return None;
    }

    let mut decoration = Decoration::None;
    let mut idx = 0;
    if words.len() >= 2 {
        if let Some(d) = Decoration::from_word(words[0].word()) {
            decoration = d;
            idx = 1;
        }
    }

    let command = words[idx].clone();
    let args = words[idx + 1..].to_vec();

    Some(PlainStatement {
        command,
        decoration,
        args,
    })
}
