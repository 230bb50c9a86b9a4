//! A flat tokenizer over normalized notations.
//!
//! The die roller grammar only sees a notation once the pipeline has cut it
//! into pieces. Those cuts (comments, comparisons, `;` segments, `N#` counts)
//! are found on this token stream so that a `>` inside `2d6!>4` or a `;`
//! inside `[a;b]` are never mistaken for structure.

use std::ops::Range;

use winnow::Parser;

use crate::parse::{number, Operator};

use super::{compare::compare_sign, CompareSign};

/// Characters standing for the total of the first roll of a shared roll.
pub(crate) const PLACEHOLDERS: &[char] = &['&', 'µ', 'μ'];

/// Die roller modifiers whose compare point directly follows them.
const COMPARE_POINT_WORDS: &[&str] = &["p", "r", "ro", "u", "uo", "cs", "cf", "f"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TokenKind {
    Number,
    Word,
    Hash,
    Semicolon,
    Comma,
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Operator(Operator),
    /// A comparison applied to a total.
    Compare(CompareSign),
    /// A compare point that belongs to a die roller modifier.
    ComparePoint,
    /// `!` or `!!`
    Bang,
    Placeholder,
    Comment(CommentKind),
    Whitespace,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommentKind {
    /// `[...]`
    Bracket,
    /// `# ...` or `// ...` up to the next `;`
    Line,
    /// `/* ... */`
    Block,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Range<usize>,
}

impl Token {
    pub(crate) fn is_significant(&self) -> bool {
        !matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment(_))
    }
}

/// A notation along with its tokens.
pub(crate) struct Tokens<'a> {
    input: &'a str,
    tokens: Vec<Token>,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input,
            pos: 0,
            tokens: Vec::new(),
        };
        while let Some(c) = lexer.rest().chars().next() {
            lexer.next_token(c);
        }

        Self {
            input,
            tokens: lexer.tokens,
        }
    }

    pub(crate) fn text(&self, token: &Token) -> &'a str {
        &self.input[token.span.clone()]
    }

    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    pub(crate) fn significant(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|token| token.is_significant())
    }

    /// Tokens paired with how many `{}` or `()` enclose them.
    ///
    /// A bracket has the depth of what surrounds it.
    pub(crate) fn with_depth(&self) -> impl Iterator<Item = (usize, &Token)> {
        self.tokens.iter().scan(0usize, |depth, token| {
            let current = match token.kind {
                TokenKind::OpenBrace | TokenKind::OpenParen => {
                    *depth += 1;
                    *depth - 1
                }
                TokenKind::CloseBrace | TokenKind::CloseParen => {
                    *depth = depth.saturating_sub(1);
                    *depth
                }
                _ => *depth,
            };
            Some((current, token))
        })
    }

    /// Text between the braces when the whole notation is a single `{...}`.
    pub(crate) fn wrapped_in_braces(&self) -> Option<&'a str> {
        self.wrapped_in(TokenKind::OpenBrace, TokenKind::CloseBrace)
    }

    /// Text between the parentheses when the whole notation is a single `(...)`.
    pub(crate) fn wrapped_in_parens(&self) -> Option<&'a str> {
        self.wrapped_in(TokenKind::OpenParen, TokenKind::CloseParen)
    }

    fn wrapped_in(&self, open: TokenKind, close: TokenKind) -> Option<&'a str> {
        let significant: Vec<&Token> = self.significant().collect();
        let (first, last) = (significant.first()?, significant.last()?);
        if first.kind != open || last.kind != close {
            return None;
        }

        let mut depth = 0usize;
        for (i, token) in significant.iter().enumerate() {
            if token.kind == open {
                depth += 1;
            } else if token.kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (i == significant.len() - 1)
                        .then(|| &self.input[first.span.end..last.span.start]);
                }
            }
        }
        None
    }

    /// The notation with its comments cut out, and the text of those comments.
    pub(crate) fn without_comments(&self) -> (String, Vec<String>) {
        let mut body = String::with_capacity(self.input.len());
        let mut comments = Vec::new();

        for token in &self.tokens {
            let text = self.text(token);
            match token.kind {
                TokenKind::Comment(kind) => {
                    let comment = comment_text(kind, text);
                    if !comment.is_empty() {
                        comments.push(comment.to_owned());
                    }
                }
                _ => body.push_str(text),
            }
        }

        (body.trim().to_owned(), comments)
    }

    /// Whether a die appears outside of the comments: `d` followed by a
    /// number, `%`, `(` or the fudge `dF`.
    pub(crate) fn has_dice(&self) -> bool {
        self.tokens.iter().enumerate().any(|(i, token)| {
            if token.kind != TokenKind::Word {
                return false;
            }
            let text = self.text(token);
            if text.starts_with("df") {
                return true;
            }
            text == "d"
                && self.tokens.get(i + 1).is_some_and(|next| {
                    matches!(
                        next.kind,
                        TokenKind::Number
                            | TokenKind::OpenParen
                            | TokenKind::Operator(Operator::Rem)
                    )
                })
        })
    }

    /// Pieces of the notation between `;`. Brackets keep their `;`.
    pub(crate) fn segments(&self) -> Vec<&'a str> {
        let mut segments = Vec::new();
        let mut start = 0;
        for token in &self.tokens {
            if token.kind == TokenKind::Semicolon {
                segments.push(&self.input[start..token.span.start]);
                start = token.span.end;
            }
        }
        segments.push(&self.input[start..]);
        segments
    }
}

/// The text of a comment without its delimiters.
pub(crate) fn comment_text(kind: CommentKind, text: &str) -> &str {
    let text = match kind {
        CommentKind::Bracket => text.trim_start_matches('[').trim_end_matches(']'),
        CommentKind::Line => text
            .strip_prefix("//")
            .or_else(|| text.strip_prefix('#'))
            .unwrap_or(text),
        CommentKind::Block => {
            let text = text.strip_prefix("/*").unwrap_or(text);
            text.strip_suffix("*/").unwrap_or(text)
        }
    };
    text.trim()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, len: usize) {
        let start = self.pos;
        self.pos += len;
        self.tokens.push(Token {
            kind,
            span: start..self.pos,
        });
    }

    fn next_token(&mut self, c: char) {
        let rest = self.rest();
        match c {
            '[' => {
                let len = rest.find(']').map_or(rest.len(), |i| i + 1);
                self.push(TokenKind::Comment(CommentKind::Bracket), len);
            }
            c if c.is_whitespace() => {
                let len = rest
                    .find(|c: char| !c.is_whitespace())
                    .unwrap_or(rest.len());
                self.push(TokenKind::Whitespace, len);
                self.line_comment();
            }
            c if c.is_ascii_digit() => {
                let mut input = rest;
                let len = match number.parse_next(&mut input) {
                    Ok(_) => rest.len() - input.len(),
                    Err(_) => 1,
                };
                self.push(TokenKind::Number, len);
            }
            c if PLACEHOLDERS.contains(&c) => self.push(TokenKind::Placeholder, c.len_utf8()),
            c if c.is_alphabetic() => {
                let len = rest
                    .find(|c: char| !c.is_alphabetic() || PLACEHOLDERS.contains(&c))
                    .unwrap_or(rest.len());
                self.push(TokenKind::Word, len);
            }
            '#' => self.push(TokenKind::Hash, 1),
            ';' => self.push(TokenKind::Semicolon, 1),
            ',' => self.push(TokenKind::Comma, 1),
            '{' => self.push(TokenKind::OpenBrace, 1),
            '}' => self.push(TokenKind::CloseBrace, 1),
            '(' => self.push(TokenKind::OpenParen, 1),
            ')' => self.push(TokenKind::CloseParen, 1),
            '+' => self.push(TokenKind::Operator(Operator::Add), 1),
            '-' => self.push(TokenKind::Operator(Operator::Sub), 1),
            '/' => self.push(TokenKind::Operator(Operator::Div), 1),
            '%' => self.push(TokenKind::Operator(Operator::Rem), 1),
            '^' => self.push(TokenKind::Operator(Operator::Pow), 1),
            '*' if rest.starts_with("**") => self.push(TokenKind::Operator(Operator::Pow), 2),
            '*' => self.push(TokenKind::Operator(Operator::Mul), 1),
            '!' if rest.starts_with("!=") && !rest.starts_with("!==") => self.sign(),
            '!' => {
                let len = if rest.starts_with("!!") { 2 } else { 1 };
                self.push(TokenKind::Bang, len);
            }
            '<' | '>' | '=' => self.sign(),
            c => self.push(TokenKind::Other, c.len_utf8()),
        }
    }

    /// Comments only start after whitespace, `2d6#3` is not a comment.
    fn line_comment(&mut self) {
        let rest = self.rest();
        let len = if rest.starts_with('#') || rest.starts_with("//") {
            rest.find(';').unwrap_or(rest.len())
        } else if rest.starts_with("/*") {
            rest[2..]
                .find("*/")
                .map(|i| i + 4)
                .or_else(|| rest.find(';'))
                .unwrap_or(rest.len())
        } else {
            return;
        };

        let kind = if rest.starts_with("/*") {
            CommentKind::Block
        } else {
            CommentKind::Line
        };
        self.push(TokenKind::Comment(kind), len);
    }

    fn sign(&mut self) {
        let rest = self.rest();
        let mut input = rest;
        let Ok(sign) = compare_sign.parse_next(&mut input) else {
            self.push(TokenKind::Other, 1);
            return;
        };

        let mut len = rest.len() - input.len();
        if self.tokens.last().is_some_and(|token| token.kind == TokenKind::Bang) {
            // exploding successes double their sign, `!>>4`
            len += input.len() - input.trim_start_matches(&['<', '>', '='][..]).len();
        }
        let kind = if self.follows_modifier() || is_target_failure(input) {
            TokenKind::ComparePoint
        } else {
            TokenKind::Compare(sign)
        };
        self.push(kind, len);
    }

    fn follows_modifier(&self) -> bool {
        match self.tokens.last() {
            Some(Token {
                kind: TokenKind::Bang,
                ..
            }) => true,
            Some(token @ Token {
                kind: TokenKind::Word,
                ..
            }) => COMPARE_POINT_WORDS.contains(&&self.input[token.span.clone()]),
            _ => false,
        }
    }
}

/// `>4f<2` is a target success and failure of the die roller, not a comparison.
fn is_target_failure(after_sign: &str) -> bool {
    let rest = after_sign.trim_start().trim_start_matches('-');
    let after_number = rest.trim_start_matches(|c: char| c.is_ascii_digit() || c == '.');
    after_number.len() < rest.len()
        && after_number
            .strip_prefix('f')
            .is_some_and(|sign| sign.starts_with(&['<', '>', '=', '!'][..]))
}
