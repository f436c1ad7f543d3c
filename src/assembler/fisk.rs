//! The Fisk assembly dialect, defined on top of the generic tokenizer and
//! grammar combinators.
//!
//! Comments are prefixed with semicolons (;) and are single-line only.
//! Labels end with a colon. A statement is a directive or an operation,
//! optionally followed by a comma-separated operand list; a program may be
//! closed by a trailing `end` marker.
//!
//! Example source file:
//!
//! ```nasm
//! org 0x100
//! jmp main
//!
//! array: db 1, 1, 2, 3, 5, 8
//! msg:   db "Hello, Fisk!", 0
//!
//! main:
//!     mov r0, 0x03    ; operands may be registers,
//!     mov r1, msg     ; identifiers,
//!     int 0x10        ; hex, binary or decimal numbers,
//!     mov r0, [r1]    ; or a memory reference.
//!     int 0x11
//!
//!     jmp $
//! end
//! ```
//!
//! Rule order is load-bearing: ordered first-match lexing means the more
//! specific patterns (directives, operations, registers) must be declared
//! before the catch-all identifier pattern.

use super::lexer::{Lexer, Rule, ScanState, Value};
use super::parser::Production;

fn number(text: &str, radix: u32) -> Value {
    match i64::from_str_radix(text, radix) {
        Ok(n) => Value::Int(n),
        // Out-of-range literals surface as payloadless NUMBER tokens.
        Err(_) => Value::None,
    }
}

fn hex_value(text: &str) -> Value {
    number(text, 16)
}

fn bin_value(text: &str) -> Value {
    number(text, 2)
}

fn dec_value(text: &str) -> Value {
    number(text, 10)
}

fn advance_line(text: &str, state: &mut ScanState) {
    state.line += text.matches('\n').count();
}

/// The dialect's lexical rules. Declaration order is part of the dialect.
pub fn lexer() -> Result<Lexer, regex::Error> {
    Ok(Lexer::new(vec![
        Rule::new("WHITESPACE", "[ \t]+")?.ignore(),
        Rule::new("COMMENT", ";[^\n]*")?.ignore(),
        Rule::new("NEWLINE", "\n")?.ignore().post(advance_line),
        // `end` doubles as a symbol and a directive; the symbol rule is
        // declared first and therefore always wins.
        Rule::new("SYMBOL", r",|\[|\]|end")?,
        Rule::new("DIRECTIVE", "org|db|end")?,
        Rule::new("OPERATION", "mov|int|jmp")?,
        Rule::new("REGISTER", "r[lh][0-7]|r[0-9a-f]")?,
        Rule::new("NUMBER", "0x([0-9a-f]+)")?.mutate(hex_value),
        Rule::new("NUMBER", "0b([01]+)")?.mutate(bin_value),
        Rule::new("NUMBER", "[0-9]+")?.mutate(dec_value),
        Rule::new("LABEL", "([a-zA-Z_][a-zA-Z0-9_]+):")?,
        Rule::new("IDENTIFIER", "[a-zA-Z_][a-zA-Z0-9_]+")?,
        Rule::new("IDENTIFIER", r"\$")?,
        Rule::new("STRING", "'([^'\n]*)'")?,
        Rule::new("STRING", "\"([^\"\n]*)\"")?,
    ]))
}

fn symbol(text: &str) -> Production {
    Production::literal("SYMBOL", Value::from(text))
}

fn memory() -> Production {
    Production::sequence(
        "memory",
        vec![
            symbol("["),
            Production::terminal("REGISTER")
                | Production::terminal("NUMBER")
                | Production::terminal("IDENTIFIER"),
            symbol("]"),
        ],
    )
}

fn operands() -> Production {
    let operand = Production::choice(vec![
        memory(),
        Production::terminal("REGISTER"),
        Production::terminal("NUMBER"),
        Production::terminal("IDENTIFIER"),
        Production::terminal("STRING"),
    ]);
    Production::sequence(
        "operands",
        vec![
            operand.clone(),
            Production::repeating(vec![symbol(","), operand]),
        ],
    )
}

/// The dialect's grammar. Matching a whole program against it yields a
/// `program` tree whose normalized children are one node per statement.
pub fn grammar() -> Production {
    let statement = Production::choice(vec![
        Production::sequence("label", vec![Production::terminal("LABEL")]),
        Production::sequence(
            "directive",
            vec![
                Production::terminal("DIRECTIVE"),
                Production::optional(vec![operands()]),
            ],
        ),
        Production::sequence(
            "instruction",
            vec![
                Production::terminal("OPERATION"),
                Production::optional(vec![operands()]),
            ],
        ),
    ]);

    Production::sequence(
        "program",
        vec![
            Production::repeating(vec![statement]),
            Production::optional(vec![Production::sequence("end", vec![symbol("end")])]),
        ],
    )
}
