/// The surface dialect the parser interprets the code regions under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Default,
    Liquid,
}

/// The top-level front-matter mode, selecting how the document is expected
/// to begin and which regions are parsed as code versus raw text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParsingMode {
    #[default]
    Default,
    /// The entire input is code; no raw regions are recognized.
    ScriptOnly,
    /// The entire input is a single front-matter block; nothing follows it.
    FrontMatterOnly,
    /// A front-matter block, followed by `Default`-mode body content.
    FrontMatterAndContent,
}

/// Configuration consumed by the lexer.
#[derive(Clone, Debug)]
pub struct LexerOptions {
    pub dialect: Dialect,
    pub mode: ParsingMode,
    pub keep_trivia: bool,
    pub front_matter_marker: String,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            dialect: Dialect::Default,
            mode: ParsingMode::Default,
            keep_trivia: true,
            front_matter_marker: "+++".to_string(),
        }
    }
}

/// Configuration consumed by the parser itself.
#[derive(Clone, Debug)]
pub struct ParserOptions {
    /// Maximum nesting depth for expressions and blocks before a single
    /// depth-limit diagnostic is raised. `None` disables the check.
    pub expression_depth_limit: Option<u32>,
    /// When true, Liquid-dialect function-style calls (e.g. `cycle`) are
    /// additionally exposed under their Default-dialect call spelling. Purely
    /// an AST-shape decision consumed by downstream evaluators; opt-in
    /// because it changes the shape of emitted `FunctionCall` nodes.
    pub translate_liquid_calls: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            expression_depth_limit: Some(1000),
            translate_liquid_calls: false,
        }
    }
}
