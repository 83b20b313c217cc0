//! Recursive descent parser for passage bodies.
//!
//! Lowers a passage's source text into the flat command list the VM
//! executes. The parser owns the tokenizer's mode flags: narrative mode for
//! body text, command mode for everything between `<<` and `>>`, switched
//! explicitly before each read so nested parses never see the wrong
//! sub-grammar.
//!
//! Two constructs need lookahead. `[img[NAME]]` is the only special; a `[`
//! that does not open that exact shape is narrative text (so `[sub]` prints
//! literally). A line-leading `*` starts a selection only when followed by
//! exactly one space and `[[`; otherwise it too is narrative text. Both are
//! resolved by checkpointing the tokenizer, looking ahead, and rewinding.
//!
//! `<<if>>` bodies are parsed recursively up to the matching `<<endif>>`
//! and compiled to a forward skip count, so nested conditionals fall out of
//! the recursion.

use spindle_core::expr::{BinaryOp, Expr, UnaryOp};
use spindle_core::story::{Command, Passage};

use crate::error::CompileError;
use crate::lexer::{Token, TokenKind, Tokenizer};

/// Binary operator table, one row per precedence level, lowest first.
/// `parse_binary` consults the row for its level and recurses upward.
const BINARY_LEVELS: &[&[(TokenKind, BinaryOp)]] = &[
    &[(TokenKind::Or, BinaryOp::Or), (TokenKind::And, BinaryOp::And)],
    &[
        (TokenKind::Equals, BinaryOp::Eq),
        (TokenKind::Is, BinaryOp::Eq),
        (TokenKind::NotEqual, BinaryOp::NotEq),
        (TokenKind::NotEqualWeird, BinaryOp::NotEq),
    ],
    &[
        (TokenKind::LesserThan, BinaryOp::Lt),
        (TokenKind::GreaterThan, BinaryOp::Gt),
        (TokenKind::LesserEqual, BinaryOp::Le),
        (TokenKind::GreaterEqual, BinaryOp::Ge),
    ],
    &[
        (TokenKind::Add, BinaryOp::Add),
        (TokenKind::Subtract, BinaryOp::Sub),
    ],
    &[
        (TokenKind::Multiply, BinaryOp::Mul),
        (TokenKind::Divide, BinaryOp::Div),
        (TokenKind::Remainder, BinaryOp::Rem),
    ],
];

/// Parse one passage body into a compiled passage.
pub fn parse_passage(name: &str, body: &str, start_line: usize) -> Result<Passage, CompileError> {
    let mut parser = Parser {
        tokens: Tokenizer::new(body, start_line),
        passage: name,
    };
    let commands = parser.parse_commands(None)?;
    Ok(Passage {
        name: name.to_string(),
        commands,
    })
}

/// Outcome of parsing one `<<...>>` command.
enum Item {
    /// A command was appended (or `if` appended its whole block).
    Done,
    /// `<<endif>>` was consumed; the enclosing `if` body ends here.
    EndIf { line: usize, column: usize },
}

struct Parser<'a> {
    tokens: Tokenizer<'a>,
    passage: &'a str,
}

impl<'a> Parser<'a> {
    /// Parse commands until end of input, or until `<<endif>>` when inside
    /// an `if` whose position is given.
    fn parse_commands(
        &mut self,
        enclosing_if: Option<(usize, usize)>,
    ) -> Result<Vec<Command>, CompileError> {
        let mut commands = Vec::new();
        loop {
            self.tokens.command_mode = false;
            self.tokens.ignore_whitespace = false;
            let token = self.tokens.next_token();
            let (line, column) = (token.line, token.column);
            match token.kind {
                TokenKind::Eof => {
                    if let Some((line, column)) = enclosing_if {
                        return Err(CompileError::UnclosedIf {
                            passage: self.passage.to_string(),
                            line,
                            column,
                        });
                    }
                    return Ok(commands);
                }
                TokenKind::Text(text) => commands.push(Command::PrintText { text }),
                TokenKind::CommandStart => match self.parse_command(&mut commands)? {
                    Item::Done => {}
                    Item::EndIf { line, column } => {
                        if enclosing_if.is_some() {
                            return Ok(commands);
                        }
                        return Err(CompileError::StrayEndif {
                            passage: self.passage.to_string(),
                            line,
                            column,
                        });
                    }
                },
                TokenKind::SpecialOpen => self.parse_special(&mut commands)?,
                TokenKind::Asterisk => self.parse_selection(&mut commands)?,
                // Stray markers that open nothing are narrative text.
                TokenKind::SpecialClose => commands.push(Command::PrintText { text: "]".into() }),
                TokenKind::SpecialSeparator => {
                    commands.push(Command::PrintText { text: "|".into() })
                }
                TokenKind::CommandEnd => commands.push(Command::PrintText { text: ">>".into() }),
                other => return Err(self.unexpected("narrative text", &other, line, column)),
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────────────

    fn parse_command(&mut self, commands: &mut Vec<Command>) -> Result<Item, CompileError> {
        self.tokens.command_mode = true;
        let token = self.tokens.next_token();
        let (line, column) = (token.line, token.column);
        let name = match token.kind {
            TokenKind::Identifier(name) => name,
            other => return Err(self.unexpected("a command name", &other, line, column)),
        };

        match name.as_str() {
            "pause" => {
                self.finish_command()?;
                commands.push(Command::Pause);
            }
            "jump" => {
                let target = self.parse_passage_target()?;
                self.finish_command()?;
                commands.push(Command::JumpToPassage { target });
            }
            "call" => {
                let target = self.parse_passage_target()?;
                self.finish_command()?;
                commands.push(Command::CallPassage { target });
            }
            "return" => {
                self.finish_command()?;
                commands.push(Command::ReturnPassage);
            }
            "music" => {
                let token = self.tokens.next_token();
                let music = match token.kind {
                    TokenKind::Str(raw) => strip_quotes(&raw),
                    TokenKind::Invalid => {
                        return Err(self.unterminated_string(token.line, token.column))
                    }
                    other => {
                        return Err(self.unexpected(
                            "a quoted music name",
                            &other,
                            token.line,
                            token.column,
                        ))
                    }
                };
                let track = if self.tokens.peek().kind == TokenKind::Comma {
                    self.tokens.next_token();
                    self.parse_expression()?
                } else {
                    Expr::Int(0)
                };
                self.finish_command()?;
                commands.push(Command::SetMusic { name: music, track });
            }
            "if" => {
                let condition = self.parse_expression()?;
                self.finish_command()?;
                let body = self.parse_commands(Some((line, column)))?;
                commands.push(Command::If {
                    condition,
                    skip_count: body.len() + 1,
                });
                commands.extend(body);
            }
            "endif" => {
                self.finish_command()?;
                return Ok(Item::EndIf { line, column });
            }
            "set" => {
                let token = self.tokens.next_token();
                let variable = match token.kind {
                    TokenKind::Identifier(name) => name,
                    other => {
                        return Err(self.unexpected(
                            "a variable name",
                            &other,
                            token.line,
                            token.column,
                        ))
                    }
                };
                self.expect(TokenKind::Assign)?;
                let value = self.parse_expression()?;
                self.finish_command()?;
                commands.push(Command::SetVariable {
                    name: variable,
                    value,
                });
            }
            "print" => {
                let value = self.parse_expression()?;
                self.finish_command()?;
                commands.push(Command::PrintResult { value });
            }
            _ => {
                return Err(CompileError::UnknownCommand {
                    name,
                    passage: self.passage.to_string(),
                    line,
                    column,
                })
            }
        }
        Ok(Item::Done)
    }

    /// Consume the closing `>>` and at most one trailing newline.
    fn finish_command(&mut self) -> Result<(), CompileError> {
        self.tokens.command_mode = true;
        self.expect(TokenKind::CommandEnd)?;
        self.tokens.eat_newline();
        Ok(())
    }

    /// Read a `jump`/`call` target: narrative text up to `>>`, whitespace
    /// skipped in front, trimmed.
    fn parse_passage_target(&mut self) -> Result<String, CompileError> {
        self.tokens.command_mode = false;
        self.tokens.ignore_whitespace = true;
        let token = self.tokens.next_token();
        self.tokens.ignore_whitespace = false;
        match token.kind {
            TokenKind::Text(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            other => Err(self.unexpected("a passage name", &other, token.line, token.column)),
        }
    }

    // ── Specials and selections ───────────────────────────────────────

    /// Called with the opening `[` already consumed. Only the exact shape
    /// `[IDENT[` is a special, and only `img` is known; any other `[` is
    /// literal text.
    fn parse_special(&mut self, commands: &mut Vec<Command>) -> Result<(), CompileError> {
        let checkpoint = self.tokens.checkpoint();

        self.tokens.command_mode = true;
        let name_token = self.tokens.next_token();
        if let TokenKind::Identifier(name) = name_token.kind {
            self.tokens.command_mode = false;
            if self.tokens.next_token().kind == TokenKind::SpecialOpen {
                if name != "img" {
                    return Err(CompileError::UnknownSpecial {
                        name,
                        passage: self.passage.to_string(),
                        line: name_token.line,
                        column: name_token.column,
                    });
                }
                let token = self.tokens.next_token();
                let image = match token.kind {
                    TokenKind::Text(text) => {
                        self.expect(TokenKind::SpecialClose)?;
                        text
                    }
                    // `[img[]]`: an empty name hides the image.
                    TokenKind::SpecialClose => String::new(),
                    other => {
                        return Err(self.unexpected(
                            "an image name",
                            &other,
                            token.line,
                            token.column,
                        ))
                    }
                };
                self.expect(TokenKind::SpecialClose)?;
                self.tokens.eat_newline();
                commands.push(Command::SetImage { name: image });
                return Ok(());
            }
        }

        self.tokens.rewind(checkpoint);
        commands.push(Command::PrintText { text: "[".into() });
        Ok(())
    }

    /// Called with the line-leading `*` already consumed. A selection needs
    /// exactly one space then `[[`; anything else keeps the `*` literal.
    fn parse_selection(&mut self, commands: &mut Vec<Command>) -> Result<(), CompileError> {
        let ahead = self.tokens.peek_n(3);
        let shape = matches!(&ahead[0].kind, TokenKind::Text(s) if s == " ")
            && ahead[1].kind == TokenKind::SpecialOpen
            && ahead[2].kind == TokenKind::SpecialOpen;
        if !shape {
            commands.push(Command::PrintText { text: "*".into() });
            return Ok(());
        }
        self.tokens.next_token(); // the mandatory space
        self.tokens.next_token(); // [
        self.tokens.next_token(); // [

        let token = self.tokens.next_token();
        let text = match token.kind {
            TokenKind::Text(text) => text,
            other => {
                return Err(self.unexpected("selection text", &other, token.line, token.column))
            }
        };
        self.expect(TokenKind::SpecialSeparator)?;
        let token = self.tokens.next_token();
        let target = match token.kind {
            TokenKind::Text(target) => target,
            other => {
                return Err(self.unexpected(
                    "a selection target",
                    &other,
                    token.line,
                    token.column,
                ))
            }
        };
        self.expect(TokenKind::SpecialClose)?;
        self.expect(TokenKind::SpecialClose)?;
        self.tokens.eat_newline();
        commands.push(Command::AddSelection { text, target });
        Ok(())
    }

    // ── Expressions ───────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.tokens.command_mode = true;
        self.parse_binary(0)
    }

    /// Parse the binary level `level` of the precedence ladder, left
    /// associative, consulting the operator table for that level.
    fn parse_binary(&mut self, level: usize) -> Result<Expr, CompileError> {
        if level == BINARY_LEVELS.len() {
            return self.parse_unary();
        }
        let mut left = self.parse_binary(level + 1)?;
        loop {
            self.tokens.command_mode = true;
            let ahead = self.tokens.peek();
            let Some(&(_, op)) = BINARY_LEVELS[level]
                .iter()
                .find(|(kind, _)| *kind == ahead.kind)
            else {
                return Ok(left);
            };
            self.tokens.next_token();
            let right = self.parse_binary(level + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        self.tokens.command_mode = true;
        let ahead = self.tokens.peek();
        let op = match ahead.kind {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Subtract => UnaryOp::Neg,
            _ => return self.parse_atom(),
        };
        self.tokens.next_token();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, CompileError> {
        self.tokens.command_mode = true;
        let token = self.tokens.next_token();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Int(n)),
            TokenKind::Str(raw) => Ok(Expr::Str(strip_quotes(&raw))),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::Identifier(name) => {
                if self.tokens.peek().kind == TokenKind::ParenOpen {
                    self.tokens.next_token();
                    let args = self.parse_call_args()?;
                    Ok(Expr::Call { name, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            TokenKind::ParenOpen => {
                let inner = self.parse_binary(0)?;
                self.expect(TokenKind::ParenClose)?;
                Ok(inner)
            }
            TokenKind::Invalid => Err(self.unterminated_string(token.line, token.column)),
            other => Err(self.unexpected("an expression", &other, token.line, token.column)),
        }
    }

    /// Comma-separated arguments after `(`, up to the closing `)`.
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = Vec::new();
        if self.tokens.peek().kind == TokenKind::ParenClose {
            self.tokens.next_token();
            return Ok(args);
        }
        loop {
            args.push(self.parse_binary(0)?);
            let token = self.tokens.next_token();
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::ParenClose => return Ok(args),
                other => {
                    return Err(self.unexpected(
                        "\",\" or \")\"",
                        &other,
                        token.line,
                        token.column,
                    ))
                }
            }
        }
    }

    // ── Error helpers ─────────────────────────────────────────────────

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        let token = self.tokens.next_token();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(self.unexpected(&kind.describe(), &token.kind, token.line, token.column))
        }
    }

    fn unexpected(
        &self,
        expected: &str,
        found: &TokenKind,
        line: usize,
        column: usize,
    ) -> CompileError {
        CompileError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.describe(),
            passage: self.passage.to_string(),
            line,
            column,
        }
    }

    fn unterminated_string(&self, line: usize, column: usize) -> CompileError {
        CompileError::UnterminatedString {
            passage: self.passage.to_string(),
            line,
            column,
        }
    }
}

/// Strip the surrounding quotes from a string lexeme. Escape backslashes
/// inside stay as written.
fn strip_quotes(raw: &str) -> String {
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
        .to_string()
}
