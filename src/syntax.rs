/// The closed set of lexical token kinds produced by the lexer and consumed
/// by the parser. Kinds are grouped by category; the grouping is purely for
/// readability; dispatch always matches on the concrete variant.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TokenKind {
    TOMBSTONE = 0,
    EOF,

    // Trivia
    WHITESPACE,
    NEW_LINE,
    COMMENT,
    COMMENT_MULTI,

    // Raw / escape content
    RAW,
    ESCAPE_COUNT_1,
    ESCAPE_COUNT_2,
    ESCAPE_COUNT_3,
    ESCAPE_COUNT_4,
    ESCAPE_COUNT_5,
    ESCAPE_COUNT_6,
    ESCAPE_COUNT_7,
    ESCAPE_COUNT_8,
    ESCAPE_COUNT_9,

    // Mode transitions
    CODE_ENTER,         // {{
    CODE_EXIT,           // }}
    LIQUID_TAG_ENTER,    // {%
    LIQUID_TAG_EXIT,     // %}
    FRONT_MATTER_MARKER, // e.g. +++

    // Identifiers & literals
    IDENTIFIER,
    IDENTIFIER_SPECIAL, // `this`, `$0`..`$999`, `$`, `$$`
    INTEGER,
    FLOAT,
    STRING,

    // Default-dialect keywords
    KW_IF,
    KW_ELSE,
    KW_FOR,
    KW_WHILE,
    KW_CASE,
    KW_WHEN,
    KW_WITH,
    KW_WRAP,
    KW_CAPTURE,
    KW_FUNC,
    KW_IMPORT,
    KW_READONLY,
    KW_BREAK,
    KW_CONTINUE,
    KW_RET,
    KW_END,
    KW_IN,
    KW_TRUE,
    KW_FALSE,
    KW_NULL,
    KW_AND,
    KW_OR,
    KW_NOT,
    KW_EMPTY,

    // Liquid-dialect keywords
    KW_ASSIGN,
    KW_CYCLE,
    KW_INCREMENT,
    KW_DECREMENT,
    KW_IFCHANGED,
    KW_UNLESS,
    KW_ELSIF,
    KW_ENDIF,
    KW_ENDUNLESS,
    KW_ENDIFCHANGED,
    KW_ENDFOR,
    KW_ENDCASE,
    KW_ENDCAPTURE,

    // Punctuation / operators
    NEW_LINE_OR_SEMICOLON, // synthetic: never produced by the lexer, used by tests only
    SEMI_COLON,
    COLON,
    COMMA,
    DOT,
    DOT_DOT,
    DOT_DOT_LT,
    PIPE,
    QUESTION,
    QUESTION_QUESTION,
    LPAREN,
    RPAREN,
    LSQUARE,
    RSQUARE,
    LCURLY,
    RCURLY,
    AT,
    FAT_ARROW, // =>
    EQUAL,
    EQUAL_EQUAL,
    NOT_EQUAL,
    LESS,
    LESS_EQUAL,
    GREATER,
    GREATER_EQUAL,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    STAR_STAR,
    AMP_AMP,
    OR, // `||`
    BANG,

    // Nodes (not produced by the lexer; reserved for future CST work, kept
    // so `is_token` has a stable boundary).
    NODE_BOUNDARY,
}

impl TokenKind {
    #[inline]
    pub fn is_token(self) -> bool {
        (self as u16) < (TokenKind::NODE_BOUNDARY as u16)
    }

    /// Tokens that are never visible to the statement dispatcher unless
    /// trivia retention has been turned off for them specifically.
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::WHITESPACE
                | TokenKind::COMMENT
                | TokenKind::COMMENT_MULTI
                | TokenKind::NEW_LINE
        )
    }

    /// Trivia that is *always* hidden, independent of the `allowNewLine`
    /// counter. `NEW_LINE` is conditionally hidden and handled separately by
    /// the token stream adapter.
    #[inline]
    pub fn is_always_hidden_trivia(self) -> bool {
        matches!(self, TokenKind::WHITESPACE | TokenKind::COMMENT | TokenKind::COMMENT_MULTI)
    }

    pub fn is_escape(self) -> bool {
        matches!(
            self,
            TokenKind::ESCAPE_COUNT_1
                | TokenKind::ESCAPE_COUNT_2
                | TokenKind::ESCAPE_COUNT_3
                | TokenKind::ESCAPE_COUNT_4
                | TokenKind::ESCAPE_COUNT_5
                | TokenKind::ESCAPE_COUNT_6
                | TokenKind::ESCAPE_COUNT_7
                | TokenKind::ESCAPE_COUNT_8
                | TokenKind::ESCAPE_COUNT_9
        )
    }

    /// The number of literal brace characters an escape token represents.
    pub fn escape_count(self) -> Option<u8> {
        Some(match self {
            TokenKind::ESCAPE_COUNT_1 => 1,
            TokenKind::ESCAPE_COUNT_2 => 2,
            TokenKind::ESCAPE_COUNT_3 => 3,
            TokenKind::ESCAPE_COUNT_4 => 4,
            TokenKind::ESCAPE_COUNT_5 => 5,
            TokenKind::ESCAPE_COUNT_6 => 6,
            TokenKind::ESCAPE_COUNT_7 => 7,
            TokenKind::ESCAPE_COUNT_8 => 8,
            TokenKind::ESCAPE_COUNT_9 => 9,
            _ => return None,
        })
    }

    pub fn from_escape_count(count: u8) -> TokenKind {
        match count.clamp(1, 9) {
            1 => TokenKind::ESCAPE_COUNT_1,
            2 => TokenKind::ESCAPE_COUNT_2,
            3 => TokenKind::ESCAPE_COUNT_3,
            4 => TokenKind::ESCAPE_COUNT_4,
            5 => TokenKind::ESCAPE_COUNT_5,
            6 => TokenKind::ESCAPE_COUNT_6,
            7 => TokenKind::ESCAPE_COUNT_7,
            8 => TokenKind::ESCAPE_COUNT_8,
            _ => TokenKind::ESCAPE_COUNT_9,
        }
    }

    /// True for keywords that the Default dialect's dispatcher routes to a
    /// dedicated statement parser (as opposed to treating the identifier as
    /// an expression-start).
    pub fn is_default_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KW_IF
                | TokenKind::KW_ELSE
                | TokenKind::KW_FOR
                | TokenKind::KW_WHILE
                | TokenKind::KW_CASE
                | TokenKind::KW_WHEN
                | TokenKind::KW_WITH
                | TokenKind::KW_WRAP
                | TokenKind::KW_CAPTURE
                | TokenKind::KW_FUNC
                | TokenKind::KW_IMPORT
                | TokenKind::KW_READONLY
                | TokenKind::KW_BREAK
                | TokenKind::KW_CONTINUE
                | TokenKind::KW_RET
                | TokenKind::KW_END
        )
    }

    pub fn is_liquid_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KW_IF
                | TokenKind::KW_UNLESS
                | TokenKind::KW_IFCHANGED
                | TokenKind::KW_CASE
                | TokenKind::KW_WHEN
                | TokenKind::KW_FOR
                | TokenKind::KW_CAPTURE
                | TokenKind::KW_CYCLE
                | TokenKind::KW_ASSIGN
                | TokenKind::KW_INCREMENT
                | TokenKind::KW_DECREMENT
                | TokenKind::KW_BREAK
                | TokenKind::KW_CONTINUE
                | TokenKind::KW_ELSE
                | TokenKind::KW_ELSIF
                | TokenKind::KW_ENDIF
                | TokenKind::KW_ENDUNLESS
                | TokenKind::KW_ENDIFCHANGED
                | TokenKind::KW_ENDFOR
                | TokenKind::KW_ENDCASE
                | TokenKind::KW_ENDCAPTURE
        )
    }

    /// Liquid `end<tag>` keywords, mapped to the block kind they close.
    pub fn liquid_end_target(self) -> Option<TokenKind> {
        Some(match self {
            TokenKind::KW_ENDIF => TokenKind::KW_IF,
            TokenKind::KW_ENDUNLESS => TokenKind::KW_UNLESS,
            TokenKind::KW_ENDIFCHANGED => TokenKind::KW_IFCHANGED,
            TokenKind::KW_ENDFOR => TokenKind::KW_FOR,
            TokenKind::KW_ENDCASE => TokenKind::KW_CASE,
            TokenKind::KW_ENDCAPTURE => TokenKind::KW_CAPTURE,
            _ => return None,
        })
    }
}
