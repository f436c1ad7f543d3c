//! A rule-driven tokenizer.
//!
//! A [`Lexer`] owns an ordered list of [`Rule`]s and turns source text into
//! a flat sequence of [`Token`]s. Rules are tried in declaration order and
//! the first rule whose pattern matches at the current scan offset wins,
//! regardless of match length. Precedence therefore lives entirely in the
//! rule order: more specific patterns must be declared before catch-alls.
use std::fmt;

use regex::Regex;

/// The semantic payload carried by a token.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Value {
    Str(String),
    Int(i64),
    None,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

/// A named unit of lexical output. Tokens are produced in source order and
/// never mutated after creation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub name: String,
    pub value: Value,
}

impl Token {
    pub fn new(name: &str, value: Value) -> Self {
        Token {
            name: name.to_owned(),
            value,
        }
    }
}

/// Scan position threaded through one `tokenize` call. Post-match hooks
/// receive it mutably; this is how a newline rule advances the line counter
/// even though the newline token itself is discarded.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ScanState {
    pub offset: usize,
    pub line: usize,
}

/// Maps matched text to a semantic value.
pub type Mutator = fn(&str) -> Value;

/// Side-effecting hook run after every successful match of a rule,
/// whether or not the rule emits a token.
pub type PostAction = fn(&str, &mut ScanState);

fn identity(text: &str) -> Value {
    Value::Str(text.to_owned())
}

/// A single lexical rule: a token category, a pattern anchored at the scan
/// offset, and the action taken when the pattern matches.
pub struct Rule {
    name: String,
    pattern: Regex,
    mutator: Mutator,
    ignore: bool,
    post_action: Option<PostAction>,
}

impl Rule {
    /// Compiles `pattern` anchored to the start of the remaining input.
    /// The pattern's own capture group numbering is preserved.
    pub fn new(name: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Rule {
            name: name.to_owned(),
            pattern: Regex::new(&format!("^(?:{})", pattern))?,
            mutator: identity,
            ignore: false,
            post_action: None,
        })
    }

    /// Replaces the default identity mutator.
    pub fn mutate(mut self, mutator: Mutator) -> Self {
        self.mutator = mutator;
        self
    }

    /// Marks the rule as non-emitting (whitespace, comments).
    pub fn ignore(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Attaches a hook run after every match of this rule.
    pub fn post(mut self, action: PostAction) -> Self {
        self.post_action = Some(action);
        self
    }

    /// Matches this rule against the head of `rest`. On success returns the
    /// whole matched text and the payload text: capture group 1 if the
    /// pattern has one that participated, otherwise the whole match.
    fn apply<'t>(&self, rest: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.pattern.captures(rest)?;
        let whole = caps.get(0)?.as_str();
        let payload = caps.get(1).map_or(whole, |group| group.as_str());
        Some((whole, payload))
    }
}

/// Raised when no rule matches at the current scan offset. Carries the
/// 1-based line number and the text of the offending line. Always fatal to
/// the tokenize call; no resynchronization is attempted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LexError {
    pub line: usize,
    pub text: String,
}

impl LexError {
    fn at(source: &str, line: usize) -> Self {
        LexError {
            line,
            text: source.split('\n').nth(line - 1).unwrap_or("").to_owned(),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "no lexical rule matches on line {}: `{}`",
            self.line, self.text
        )
    }
}

pub struct Lexer {
    rules: Vec<Rule>,
}

impl Lexer {
    pub fn new(rules: Vec<Rule>) -> Self {
        Lexer { rules }
    }

    /// Tokenizes `source` against the rule list. Empty input yields an
    /// empty token sequence without trying any rule.
    pub fn tokenize(&self, source: &str) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut state = ScanState { offset: 0, line: 1 };

        while state.offset < source.len() {
            let rest = &source[state.offset..];
            let hit = self
                .rules
                .iter()
                .find_map(|rule| rule.apply(rest).map(|m| (rule, m)));

            match hit {
                // A zero-width match would pin the scan offset forever, so
                // it is reported the same way as no match at all.
                Some((rule, (whole, payload))) if !whole.is_empty() => {
                    state.offset += whole.len();
                    if !rule.ignore {
                        tokens.push(Token {
                            name: rule.name.clone(),
                            value: (rule.mutator)(payload),
                        });
                    }
                    if let Some(action) = rule.post_action {
                        action(whole, &mut state);
                    }
                }
                _ => return Err(LexError::at(source, state.line)),
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_int(text: &str) -> Value {
        match text.parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::None,
        }
    }

    fn bump_line(text: &str, state: &mut ScanState) {
        state.line += text.matches('\n').count();
    }

    fn number_lexer() -> Lexer {
        Lexer::new(vec![
            Rule::new("WHITESPACE", "[ \t]+").unwrap().ignore(),
            Rule::new("NEWLINE", "\n").unwrap().ignore().post(bump_line),
            Rule::new("NUMBER", "[0-9]+").unwrap().mutate(to_int),
        ])
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Lexer::new(vec![]).tokenize(""), Ok(vec![]));
        assert_eq!(number_lexer().tokenize(""), Ok(vec![]));
    }

    #[test]
    fn test_simple_input() {
        assert_eq!(
            number_lexer().tokenize("2 5 10"),
            Ok(vec![
                Token::new("NUMBER", Value::Int(2)),
                Token::new("NUMBER", Value::Int(5)),
                Token::new("NUMBER", Value::Int(10)),
            ])
        );
    }

    #[test]
    fn test_declaration_order_wins() {
        // The earlier rule wins even though the later one matches more text.
        let lexer = Lexer::new(vec![
            Rule::new("KEYWORD", "for").unwrap(),
            Rule::new("IDENTIFIER", "[a-z]+").unwrap(),
        ]);
        assert_eq!(
            lexer.tokenize("forty"),
            Ok(vec![
                Token::new("KEYWORD", Value::from("for")),
                Token::new("IDENTIFIER", Value::from("ty")),
            ])
        );
    }

    #[test]
    fn test_ignored_rules_emit_nothing() {
        let lexer = Lexer::new(vec![Rule::new("BLANK", "[ \t\n]+").unwrap().ignore()]);
        assert_eq!(lexer.tokenize(" \t \n "), Ok(vec![]));
    }

    #[test]
    fn test_capture_group_payload() {
        let lexer = Lexer::new(vec![
            Rule::new("WHITESPACE", "[ \t]+").unwrap().ignore(),
            Rule::new("STRING", "'([^'\n]*)'").unwrap(),
        ]);
        assert_eq!(
            lexer.tokenize("'hi' ''"),
            Ok(vec![
                Token::new("STRING", Value::from("hi")),
                Token::new("STRING", Value::from("")),
            ])
        );
    }

    #[test]
    fn test_lex_error_reports_line() {
        let err = number_lexer().tokenize("1 2\n3 x 4\n5").unwrap_err();
        assert_eq!(
            err,
            LexError {
                line: 2,
                text: "3 x 4".to_owned()
            }
        );
    }

    #[test]
    fn test_post_action_counts_lines() {
        // The NEWLINE token is discarded but its hook still fires.
        let err = number_lexer().tokenize("1\n2\n\n!").unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.text, "!");
    }

    #[test]
    fn test_zero_width_match_is_an_error() {
        let lexer = Lexer::new(vec![Rule::new("EMPTY", "x*").unwrap()]);
        let err = lexer.tokenize("yyy").unwrap_err();
        assert_eq!(
            err,
            LexError {
                line: 1,
                text: "yyy".to_owned()
            }
        );
    }

    #[test]
    fn test_unanchored_text_never_matches() {
        // Rules match at the scan offset only, not anywhere in the input.
        let lexer = Lexer::new(vec![Rule::new("NUMBER", "[0-9]+").unwrap()]);
        assert!(lexer.tokenize("x12").is_err());
    }
}
