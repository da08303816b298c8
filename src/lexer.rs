use crate::options::{Dialect, LexerOptions};
use crate::syntax::TokenKind;
use crate::token::{RawToken, TokenFlags};

/// Which region of the grammar the lexer should scan the next token as. This
/// mirrors the parser's `inCodeSection` flag (spec.md §4.9 design notes);
/// the parser is the source of truth and passes it in on every call so the
/// two can never drift.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexMode {
    Raw,
    Code,
}

#[derive(Clone, Copy, Debug, Default)]
struct LexerState {
    last_was_newline: bool,
}

/// A hand-written, mode-sensitive tokenizer. The lexer has no notion of
/// statements or blocks; it only knows how to turn a byte range at the
/// current position into the next single token, given the mode and dialect
/// it's told to scan under.
pub struct Lexer<'src> {
    text: &'src str,
    options: LexerOptions,
    current_kind: TokenKind,
    position: usize,
    last_position: usize,
    current_flags: TokenFlags,
    state: LexerState,
}

#[derive(Clone, Copy, Debug)]
pub struct LexerCheckpoint {
    position: usize,
    last_position: usize,
    current_kind: TokenKind,
    current_flags: TokenFlags,
    state: LexerState,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str, options: LexerOptions) -> Self {
        Self {
            text,
            options,
            current_kind: TokenKind::TOMBSTONE,
            position: 0,
            last_position: 0,
            current_flags: TokenFlags::default(),
            state: LexerState {
                last_was_newline: true,
            },
        }
    }

    pub fn options(&self) -> &LexerOptions {
        &self.options
    }

    pub fn current_kind(&self) -> TokenKind {
        self.current_kind
    }

    pub fn current_flags(&self) -> TokenFlags {
        self.current_flags
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            position: self.position,
            last_position: self.last_position,
            current_kind: self.current_kind,
            current_flags: self.current_flags,
            state: self.state,
        }
    }

    pub fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.position = checkpoint.position;
        self.last_position = checkpoint.last_position;
        self.current_kind = checkpoint.current_kind;
        self.current_flags = checkpoint.current_flags;
        self.state = checkpoint.state;
    }

    /// Returns the raw token spanning from the end of the previously
    /// extracted token to the current position, and advances the extraction
    /// cursor. Call after `next_token` has set `current_kind`.
    pub fn extract_current_token(&mut self) -> RawToken {
        let token = RawToken::new(self.current_kind, self.last_position..self.position)
            .with_flags(self.current_flags);
        self.last_position = self.position;
        token
    }

    pub fn text_at(&self, range: std::ops::Range<usize>) -> &'src str {
        &self.text[range]
    }

    /// True if the lexer cursor sits at the start of the input or
    /// immediately after a line ending, i.e. a front-matter marker could
    /// legally start here.
    pub fn at_line_start(&self) -> bool {
        self.position == 0 || self.text.as_bytes()[self.position - 1] == b'\n'
    }

    /// Attempts to match the configured front-matter marker at the current
    /// position (only meaningful when `at_line_start()`). A marker line may
    /// carry trailing spaces/tabs before its line ending. On success,
    /// advances past the marker, that trailing whitespace, and the line
    /// ending itself (or to EOF if the marker is the last line), and sets
    /// `current_kind` to `FRONT_MATTER_MARKER`.
    pub fn try_lex_front_matter_marker(&mut self) -> bool {
        let marker = self.options.front_matter_marker.as_str();
        if !self.text[self.position..].starts_with(marker) {
            return false;
        }
        let bytes = self.text.as_bytes();
        let mut end = self.position + marker.len();
        while matches!(bytes.get(end), Some(b' ' | b'\t')) {
            end += 1;
        }
        let new_position = if bytes.get(end) == Some(&b'\r') && bytes.get(end + 1) == Some(&b'\n') {
            end + 2
        } else if bytes.get(end) == Some(&b'\n') {
            end + 1
        } else if end >= bytes.len() {
            end
        } else {
            return false;
        };
        self.position = new_position;
        self.current_kind = TokenKind::FRONT_MATTER_MARKER;
        self.current_flags = if self.state.last_was_newline {
            TokenFlags::PRECEDED_BY_NEWLINE
        } else {
            TokenFlags::empty()
        };
        self.state.last_was_newline = true;
        true
    }

    /// Advances the lexer by one token, scanned under the given mode, and
    /// returns its kind. The previous token must already have been consumed
    /// via `extract_current_token` if its text was needed.
    pub fn next_token(&mut self, mode: LexMode) -> TokenKind {
        let preceded_by_newline = self.state.last_was_newline;
        let kind = match mode {
            LexMode::Raw => self.scan_raw(),
            LexMode::Code => self.scan_code(),
        };
        self.current_kind = kind;
        self.current_flags = if preceded_by_newline {
            TokenFlags::PRECEDED_BY_NEWLINE
        } else {
            TokenFlags::empty()
        };
        self.state.last_was_newline = kind == TokenKind::NEW_LINE;
        kind
    }

    // ---- raw-mode scanning ----

    /// Returns `Some((byte_len, kind))` if a mode-switching sequence (code
    /// enter, Liquid tag enter, or an escape run) starts at `pos`.
    fn mode_switch_at(&self, pos: usize) -> Option<(usize, TokenKind)> {
        let bytes = self.text.as_bytes();
        if bytes.get(pos) != Some(&b'{') {
            return None;
        }
        if self.options.dialect == Dialect::Liquid && bytes.get(pos + 1) == Some(&b'%') {
            return Some((2, TokenKind::LIQUID_TAG_ENTER));
        }
        let mut end = pos;
        while bytes.get(end) == Some(&b'{') {
            end += 1;
        }
        let run_len = end - pos;
        if run_len < 2 {
            return None;
        }
        if run_len == 2 {
            return Some((2, TokenKind::CODE_ENTER));
        }
        let literal_count = (run_len - 2).min(9) as u8;
        Some((run_len, TokenKind::from_escape_count(literal_count)))
    }

    fn scan_raw(&mut self) -> TokenKind {
        if self.position >= self.text.len() {
            return TokenKind::EOF;
        }
        if let Some((len, kind)) = self.mode_switch_at(self.position) {
            self.position += len;
            return kind;
        }
        let bytes = self.text.as_bytes();
        while self.position < bytes.len() {
            if self.mode_switch_at(self.position).is_some() {
                break;
            }
            self.position += utf8_char_len(bytes[self.position]);
        }
        TokenKind::RAW
    }

    // ---- code-mode scanning ----

    fn scan_code(&mut self) -> TokenKind {
        let bytes = self.text.as_bytes();
        if self.position >= bytes.len() {
            return TokenKind::EOF;
        }
        let b = bytes[self.position];
        match b {
            b' ' | b'\t' | b'\r' => {
                while matches!(bytes.get(self.position), Some(b' ' | b'\t' | b'\r')) {
                    self.position += 1;
                }
                TokenKind::WHITESPACE
            }
            b'\n' => {
                self.position += 1;
                TokenKind::NEW_LINE
            }
            b'#' => self.scan_comment(),
            b'}' if bytes.get(self.position + 1) == Some(&b'}') => {
                self.position += 2;
                TokenKind::CODE_EXIT
            }
            b'%' if bytes.get(self.position + 1) == Some(&b'}') => {
                self.position += 2;
                TokenKind::LIQUID_TAG_EXIT
            }
            b'"' | b'\'' => self.scan_string(b),
            b'0'..=b'9' => self.scan_number(),
            b'.' => {
                self.position += 1;
                if bytes.get(self.position) == Some(&b'.') {
                    self.position += 1;
                    if bytes.get(self.position) == Some(&b'<') {
                        self.position += 1;
                        TokenKind::DOT_DOT_LT
                    } else {
                        TokenKind::DOT_DOT
                    }
                } else {
                    TokenKind::DOT
                }
            }
            b';' => self.single(TokenKind::SEMI_COLON),
            b':' => self.single(TokenKind::COLON),
            b',' => self.single(TokenKind::COMMA),
            b'|' => self.maybe_double(b'|', TokenKind::PIPE, TokenKind::OR),
            b'?' => self.maybe_double(b'?', TokenKind::QUESTION, TokenKind::QUESTION_QUESTION),
            b'(' => self.single(TokenKind::LPAREN),
            b')' => self.single(TokenKind::RPAREN),
            b'[' => self.single(TokenKind::LSQUARE),
            b']' => self.single(TokenKind::RSQUARE),
            b'{' => self.single(TokenKind::LCURLY),
            b'}' => self.single(TokenKind::RCURLY),
            b'@' => self.single(TokenKind::AT),
            b'=' => {
                self.position += 1;
                match bytes.get(self.position) {
                    Some(b'=') => {
                        self.position += 1;
                        TokenKind::EQUAL_EQUAL
                    }
                    Some(b'>') => {
                        self.position += 1;
                        TokenKind::FAT_ARROW
                    }
                    _ => TokenKind::EQUAL,
                }
            }
            b'!' => self.maybe_double(b'=', TokenKind::BANG, TokenKind::NOT_EQUAL),
            b'<' => self.maybe_double(b'=', TokenKind::LESS, TokenKind::LESS_EQUAL),
            b'>' => self.maybe_double(b'=', TokenKind::GREATER, TokenKind::GREATER_EQUAL),
            b'+' => self.single(TokenKind::PLUS),
            b'-' => self.single(TokenKind::MINUS),
            b'*' => self.maybe_double(b'*', TokenKind::STAR, TokenKind::STAR_STAR),
            b'/' => self.single(TokenKind::SLASH),
            b'%' => self.single(TokenKind::PERCENT),
            b'&' if bytes.get(self.position + 1) == Some(&b'&') => {
                self.position += 2;
                TokenKind::AMP_AMP
            }
            b'$' => self.scan_identifier_special(),
            _ => {
                if is_identifier_start(first_char(&self.text[self.position..])) {
                    self.scan_identifier_or_keyword()
                } else {
                    // Not a recognized code-section token; consumed one
                    // character so the dispatcher's error recovery can make
                    // progress. Reported as RAW so callers see a concrete,
                    // nameable kind rather than a silent no-op.
                    self.position += utf8_char_len(b);
                    TokenKind::RAW
                }
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.position += 1;
        kind
    }

    fn maybe_double(&mut self, second: u8, single_kind: TokenKind, double_kind: TokenKind) -> TokenKind {
        self.position += 1;
        if self.text.as_bytes().get(self.position) == Some(&second) {
            self.position += 1;
            double_kind
        } else {
            single_kind
        }
    }

    fn scan_comment(&mut self) -> TokenKind {
        let bytes = self.text.as_bytes();
        if bytes.get(self.position + 1) == Some(&b'#') && bytes.get(self.position + 2) == Some(&b'|') {
            self.position += 3;
            while self.position < bytes.len() {
                if bytes[self.position] == b'|'
                    && bytes.get(self.position + 1) == Some(&b'#')
                    && bytes.get(self.position + 2) == Some(&b'#')
                {
                    self.position += 3;
                    return TokenKind::COMMENT_MULTI;
                }
                self.position += utf8_char_len(bytes[self.position]);
            }
            return TokenKind::COMMENT_MULTI;
        }
        while self.position < bytes.len() && bytes[self.position] != b'\n' {
            self.position += utf8_char_len(bytes[self.position]);
        }
        TokenKind::COMMENT
    }

    fn scan_string(&mut self, quote: u8) -> TokenKind {
        let bytes = self.text.as_bytes();
        self.position += 1;
        while self.position < bytes.len() {
            let c = bytes[self.position];
            if c == b'\\' && self.position + 1 < bytes.len() {
                self.position += 2;
                continue;
            }
            self.position += 1;
            if c == quote {
                break;
            }
        }
        TokenKind::STRING
    }

    fn scan_number(&mut self) -> TokenKind {
        let bytes = self.text.as_bytes();
        while matches!(bytes.get(self.position), Some(b'0'..=b'9')) {
            self.position += 1;
        }
        let mut is_float = false;
        if bytes.get(self.position) == Some(&b'.') && matches!(bytes.get(self.position + 1), Some(b'0'..=b'9')) {
            is_float = true;
            self.position += 1;
            while matches!(bytes.get(self.position), Some(b'0'..=b'9')) {
                self.position += 1;
            }
        }
        if matches!(bytes.get(self.position), Some(b'e' | b'E')) {
            let mut lookahead = self.position + 1;
            if matches!(bytes.get(lookahead), Some(b'+' | b'-')) {
                lookahead += 1;
            }
            if matches!(bytes.get(lookahead), Some(b'0'..=b'9')) {
                is_float = true;
                self.position = lookahead;
                while matches!(bytes.get(self.position), Some(b'0'..=b'9')) {
                    self.position += 1;
                }
            }
        }
        if is_float {
            TokenKind::FLOAT
        } else {
            TokenKind::INTEGER
        }
    }

    fn scan_identifier_special(&mut self) -> TokenKind {
        let bytes = self.text.as_bytes();
        self.position += 1;
        if bytes.get(self.position) == Some(&b'$') {
            self.position += 1;
        } else {
            while matches!(bytes.get(self.position), Some(b'0'..=b'9')) {
                self.position += 1;
            }
        }
        TokenKind::IDENTIFIER_SPECIAL
    }

    fn scan_identifier_or_keyword(&mut self) -> TokenKind {
        let start = self.position;
        let bytes = self.text.as_bytes();
        loop {
            let rest = &self.text[self.position..];
            let Some(c) = rest.chars().next() else { break };
            if !is_identifier_continue(c) {
                break;
            }
            self.position += c.len_utf8();
        }
        let _ = bytes;
        let word = &self.text[start..self.position];
        if word == "this" {
            return TokenKind::IDENTIFIER_SPECIAL;
        }
        keyword_kind(word, self.options.dialect).unwrap_or(TokenKind::IDENTIFIER)
    }
}

fn first_char(s: &str) -> char {
    s.chars().next().unwrap_or('\0')
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || unicode_xid::UnicodeXID::is_xid_start(c)
}

fn is_identifier_continue(c: char) -> bool {
    c == '_' || unicode_xid::UnicodeXID::is_xid_continue(c)
}

#[inline]
fn utf8_char_len(first_byte: u8) -> usize {
    if first_byte < 0x80 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

/// Words reserved in both dialects' expression grammar, plus each dialect's
/// own statement-level keywords. A word not reserved for the active dialect
/// lexes as a plain `IDENTIFIER`, letting e.g. `assign` be used as a
/// variable name in the Default dialect.
fn keyword_kind(word: &str, dialect: Dialect) -> Option<TokenKind> {
    use TokenKind::*;
    // Shared across both dialects.
    let shared = match word {
        "if" => Some(KW_IF),
        "else" => Some(KW_ELSE),
        "for" => Some(KW_FOR),
        "case" => Some(KW_CASE),
        "when" => Some(KW_WHEN),
        "capture" => Some(KW_CAPTURE),
        "break" => Some(KW_BREAK),
        "continue" => Some(KW_CONTINUE),
        "in" => Some(KW_IN),
        "true" => Some(KW_TRUE),
        "false" => Some(KW_FALSE),
        "null" | "nil" => Some(KW_NULL),
        "and" => Some(KW_AND),
        "or" => Some(KW_OR),
        "not" => Some(KW_NOT),
        "empty" => Some(KW_EMPTY),
        _ => None,
    };
    if shared.is_some() {
        return shared;
    }
    match dialect {
        Dialect::Default => match word {
            "while" => Some(KW_WHILE),
            "with" => Some(KW_WITH),
            "wrap" => Some(KW_WRAP),
            "func" => Some(KW_FUNC),
            "import" => Some(KW_IMPORT),
            "readonly" => Some(KW_READONLY),
            "ret" => Some(KW_RET),
            "end" => Some(KW_END),
            _ => None,
        },
        Dialect::Liquid => match word {
            "unless" => Some(KW_UNLESS),
            "elsif" => Some(KW_ELSIF),
            "ifchanged" => Some(KW_IFCHANGED),
            "assign" => Some(KW_ASSIGN),
            "cycle" => Some(KW_CYCLE),
            "increment" => Some(KW_INCREMENT),
            "decrement" => Some(KW_DECREMENT),
            "endif" => Some(KW_ENDIF),
            "endunless" => Some(KW_ENDUNLESS),
            "endifchanged" => Some(KW_ENDIFCHANGED),
            "endfor" => Some(KW_ENDFOR),
            "endcase" => Some(KW_ENDCASE),
            "endcapture" => Some(KW_ENDCAPTURE),
            _ => None,
        },
    }
}
