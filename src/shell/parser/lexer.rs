/// Characters that separate tokens outside a quoted span.
const DELIMITERS: &[char] = &[' ', '\t', '\r', '\n', '\x07'];
const QUOTE: char = '"';

/// One lexical token: a slice of the input line.
///
/// `quoted` tokens came from a `"..."` span. They are never treated as
/// operators and are never substituted.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Token<'a> {
    pub text: &'a str,
    pub quoted: bool,
}

impl<'a> Token<'a> {
    pub fn word(text: &'a str) -> Self {
        Token {
            text,
            quoted: false,
        }
    }

    pub fn quoted(text: &'a str) -> Self {
        Token { text, quoted: true }
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }

    pub fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();

        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }
        if rest.starts_with(QUOTE) {
            Some(self.read_quoted_string())
        } else {
            Some(self.read_word())
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(DELIMITERS);
        self.pos += rest.len() - trimmed.len();
    }

    fn read_word(&mut self) -> Token<'a> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| DELIMITERS.contains(&c) || c == QUOTE)
            .unwrap_or(rest.len());
        self.pos += end;
        Token::word(&rest[..end])
    }

    /// No escapes, no nesting. An unterminated span runs to the end of the line.
    fn read_quoted_string(&mut self) -> Token<'a> {
        let body = &self.rest()[QUOTE.len_utf8()..];
        match body.find(QUOTE) {
            Some(end) => {
                self.pos += QUOTE.len_utf8() * 2 + end;
                Token::quoted(&body[..end])
            }
            None => {
                self.pos = self.input.len();
                Token::quoted(body)
            }
        }
    }
}

pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    Lexer::new(line).tokenize()
}
