//! Lexer for the StagScribe scene language using logos
//!
//! Tokens are produced line by line. Leading indentation is turned into
//! `Indent`/`Dedent` tokens and every logical line ends with a `Newline`,
//! which is what makes the grammar indentation-sensitive.

use logos::Logos;

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    // Element keywords
    #[token("canvas")]
    Canvas,
    #[token("rectangle")]
    #[token("rect")]
    Rectangle,
    #[token("circle")]
    Circle,
    #[token("ellipse")]
    Ellipse,
    #[token("line")]
    Line,
    #[token("polygon")]
    Polygon,
    #[token("path")]
    Path,
    #[token("text")]
    Text,
    #[token("group")]
    Group,
    #[token("image")]
    Image,

    // Statement keywords
    #[token("is")]
    Is,
    #[token("by")]
    By,
    #[token("colors")]
    Colors,
    #[token("define")]
    Define,
    #[token("place")]
    Place,
    #[token("scale")]
    Scale,
    #[token("for")]
    For,
    #[token("step")]
    Step,

    // Size keywords
    #[token("width")]
    Width,
    #[token("height")]
    Height,
    #[token("size")]
    Size,
    #[token("radius")]
    Radius,

    // Position keywords
    #[token("at")]
    At,
    #[token("below")]
    Below,
    #[token("above")]
    Above,
    #[token("left")]
    Left,
    #[token("right")]
    Right,
    #[token("of")]
    Of,
    #[token("inside")]
    Inside,
    #[token("with")]
    With,
    #[token("gap")]
    Gap,
    #[token("center")]
    Center,
    #[token("top")]
    Top,
    #[token("bottom")]
    Bottom,

    // Style keywords
    #[token("fill")]
    Fill,
    #[token("gradient")]
    Gradient,
    #[token("to")]
    To,
    #[token("stroke")]
    Stroke,
    #[token("background")]
    Background,
    #[token("opacity")]
    Opacity,
    #[token("rounded")]
    Rounded,
    #[token("rotate")]
    Rotate,
    #[token("font")]
    Font,
    #[token("color")]
    Color,
    #[token("align")]
    Align,
    #[token("from")]
    From,
    #[token("points")]
    Points,
    #[token("rgb")]
    Rgb,

    // Operators and delimiters
    #[token("%")]
    Percent,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("=")]
    Equals,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        s[1..s.len()-1].to_string()
    })]
    String(String),

    // Literals too long to fit an f64 are rejected rather than read as infinity
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok().filter(|n| n.is_finite()))]
    Number(f64),

    #[regex(r"#[0-9a-fA-F]{3,8}", |lex| lex.slice().to_string())]
    HexColor(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    // Layout tokens, synthesized by `lex`
    Newline,
    Indent,
    Dedent,
}

impl Token {
    /// Reserved words, which cannot be used as variable or palette names
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Token::Ident(_)
                | Token::String(_)
                | Token::Number(_)
                | Token::HexColor(_)
                | Token::Percent
                | Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::ParenOpen
                | Token::ParenClose
                | Token::Comma
                | Token::Colon
                | Token::Equals
                | Token::LineComment
                | Token::Newline
                | Token::Indent
                | Token::Dedent
        )
    }
}

/// Lex input into tokens with spans, including layout tokens.
///
/// Blank lines and comment-only lines produce no tokens. Indentation must
/// use spaces; each deeper level pushes a new indent width and returning to
/// a width that was never opened is an error.
pub fn lex(input: &str) -> Result<Vec<(Token, Span)>, Vec<ParseError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut offset = 0;

    for raw_line in input.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();

        let line = raw_line.trim_end_matches(['\n', '\r']);
        let content = line.trim_start_matches(' ');
        let indent = line.len() - content.len();
        let content_start = line_start + indent;

        if content.trim().is_empty() || content.starts_with("//") {
            continue;
        }
        if content.starts_with('\t') {
            errors.push(ParseError::syntax(
                content_start..content_start + 1,
                "tabs are not allowed in indentation",
            ));
            continue;
        }

        let current = indents.last().copied().unwrap_or(0);
        if indent > current {
            indents.push(indent);
            tokens.push((Token::Indent, content_start..content_start));
        } else {
            while indent < indents.last().copied().unwrap_or(0) {
                indents.pop();
                tokens.push((Token::Dedent, content_start..content_start));
            }
            if indent != indents.last().copied().unwrap_or(0) {
                errors.push(ParseError::syntax(
                    line_start..content_start,
                    "indentation does not match any enclosing block",
                ));
            }
        }

        for (tok, span) in Token::lexer(content).spanned() {
            let span = (span.start + content_start)..(span.end + content_start);
            match tok {
                Ok(t) => tokens.push((t, span)),
                Err(()) => {
                    let text = &input[span.clone()];
                    let message = if text.starts_with(|c: char| c.is_ascii_digit()) {
                        format!("number '{}' is too large", text)
                    } else {
                        format!("unexpected character '{}'", text)
                    };
                    errors.push(ParseError::syntax(span, message));
                }
            }
        }

        let line_end = line_start + line.len();
        tokens.push((Token::Newline, line_end..line_end));
    }

    let end = input.len();
    while indents.len() > 1 {
        indents.pop();
        tokens.push((Token::Dedent, end..end));
    }

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}
