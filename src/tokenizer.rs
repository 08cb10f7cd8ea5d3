//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer never fails. Characters it does not recognise become
//! `Unknown` tokens and the parser rejects them with a proper diagnostic.
//! Keywords are only matched on an identifier boundary so that `integer` or
//! `returned` lex as identifiers.

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Int,
  Ident,
  Return,
  Num,
  Semicolon,
  LBrace,
  RBrace,
  LParen,
  RParen,
  Equals,
  Eof,
  Unknown,
}

impl TokenKind {
  /// Spelling used when a token kind shows up in a diagnostic.
  pub fn describe(self) -> &'static str {
    match self {
      TokenKind::Int => "`int`",
      TokenKind::Ident => "an identifier",
      TokenKind::Return => "`return`",
      TokenKind::Num => "a number",
      TokenKind::Semicolon => "`;`",
      TokenKind::LBrace => "`{`",
      TokenKind::RBrace => "`}`",
      TokenKind::LParen => "`(`",
      TokenKind::RParen => "`)`",
      TokenKind::Equals => "`=`",
      TokenKind::Eof => "end of input",
      TokenKind::Unknown => "an unknown character",
    }
  }
}

/// Lexical information needed by later stages.
///
/// `text` is only populated for identifiers and number literals; `loc` and
/// `len` locate the spelling in the source for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: Option<String>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  pub fn new(kind: TokenKind, loc: usize, len: usize, text: Option<String>) -> Self {
    Self {
      kind,
      text,
      loc,
      len,
    }
  }
}

const KEYWORDS: [(&str, TokenKind); 2] = [("int", TokenKind::Int), ("return", TokenKind::Return)];

/// Lex the input into a flat vector of tokens terminated by a single `Eof`.
pub fn tokenize(input: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if let Some((word, kind)) = KEYWORDS
      .into_iter()
      .find(|(word, _)| input[i..].starts_with(word) && !is_ident_continue(bytes, i + word.len()))
    {
      tokens.push(Token::new(kind, i, word.len(), None));
      i += word.len();
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      while is_ident_continue(bytes, i) {
        i += 1;
      }
      let text = input[start..i].to_string();
      tokens.push(Token::new(TokenKind::Ident, start, i - start, Some(text)));
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = input[start..i].to_string();
      tokens.push(Token::new(TokenKind::Num, start, i - start, Some(text)));
      continue;
    }

    let kind = match c {
      b';' => Some(TokenKind::Semicolon),
      b'{' => Some(TokenKind::LBrace),
      b'}' => Some(TokenKind::RBrace),
      b'(' => Some(TokenKind::LParen),
      b')' => Some(TokenKind::RParen),
      b'=' => Some(TokenKind::Equals),
      _ => None,
    };
    if let Some(kind) = kind {
      tokens.push(Token::new(kind, i, 1, None));
      i += 1;
      continue;
    }

    // Consume the whole character so multi-byte input stays on a boundary.
    let len = input[i..].chars().next().map_or(1, char::len_utf8);
    tokens.push(Token::new(TokenKind::Unknown, i, len, None));
    i += len;
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  tokens
}

fn is_ident_continue(bytes: &[u8], i: usize) -> bool {
  bytes.get(i).is_some_and(u8::is_ascii_alphanumeric)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "end of input".to_string(),
      _ => format!("`{}`", token_text(t, source)),
    },
    None => "end of input".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|t| t.kind).collect()
  }

  #[test]
  fn lexes_a_minimal_function() {
    use TokenKind::*;
    assert_eq!(
      kinds("int main() { return 42; }"),
      vec![Int, Ident, LParen, RParen, LBrace, Return, Num, Semicolon, RBrace, Eof]
    );
  }

  #[test]
  fn identifiers_and_numbers_keep_their_text() {
    let tokens = tokenize("int x = 007;");
    assert_eq!(tokens[1].text.as_deref(), Some("x"));
    assert_eq!(tokens[2].kind, TokenKind::Equals);
    assert_eq!(tokens[2].text, None);
    assert_eq!(tokens[3].kind, TokenKind::Num);
    assert_eq!(tokens[3].text.as_deref(), Some("007"));
    assert_eq!(tokens[3].loc, 8);
    assert_eq!(tokens[3].len, 3);
  }

  #[test]
  fn keywords_need_an_identifier_boundary() {
    let tokens = tokenize("integer returned int1 int return");
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
      kinds,
      vec![
        TokenKind::Ident,
        TokenKind::Ident,
        TokenKind::Ident,
        TokenKind::Int,
        TokenKind::Return,
        TokenKind::Eof
      ]
    );
    assert_eq!(tokens[0].text.as_deref(), Some("integer"));
    assert_eq!(tokens[1].text.as_deref(), Some("returned"));
    assert_eq!(tokens[2].text.as_deref(), Some("int1"));
  }

  #[test]
  fn keyword_directly_followed_by_punctuation() {
    use TokenKind::*;
    assert_eq!(kinds("return(int;"), vec![Return, LParen, Int, Semicolon, Eof]);
  }

  #[test]
  fn digits_then_letters_split_into_two_tokens() {
    let tokens = tokenize("12ab");
    assert_eq!(tokens[0].kind, TokenKind::Num);
    assert_eq!(tokens[0].text.as_deref(), Some("12"));
    assert_eq!(tokens[1].kind, TokenKind::Ident);
    assert_eq!(tokens[1].text.as_deref(), Some("ab"));
  }

  #[test]
  fn unknown_characters_do_not_stop_the_lexer() {
    let source = "a + é b";
    let tokens = tokenize(source);
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
      kinds,
      vec![
        TokenKind::Ident,
        TokenKind::Unknown,
        TokenKind::Unknown,
        TokenKind::Ident,
        TokenKind::Eof
      ]
    );
    assert_eq!(token_text(&tokens[2], source), "é");
    assert_eq!(describe_token(Some(&tokens[1]), source), "`+`");
  }

  #[test]
  fn empty_input_yields_only_eof() {
    let tokens = tokenize(" \n\t ");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
    assert_eq!(tokens[0].loc, 4);
    assert_eq!(describe_token(tokens.first(), ""), "end of input");
  }
}
