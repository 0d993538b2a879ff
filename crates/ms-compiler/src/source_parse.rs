use ms_core::{ArithOp, CompareOp, Expr, ScriptError, ScriptValue, Statement, StatementKind};
use regex::Regex;

/// Parse script source into statement records, one per non-blank line.
///
/// Surface syntax: `#` or `;` starts a comment, `:name` defines a label,
/// command keywords are case-insensitive, string literals are double-quoted,
/// variables carry a `$` sigil, and conditions are comparison expressions
/// (usually parenthesized). Label and variable names are normalized to
/// lowercase here so later stages compare them byte-wise.
pub fn parse_source(source: &str) -> Result<Vec<Statement>, ScriptError> {
    let parser = LineParser::new();
    let mut statements = Vec::new();
    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        if let Some(statement) = parser.parse_line(raw_line, line)? {
            statements.push(statement);
        }
    }
    Ok(statements)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Word(String),
    Op(CompareOp),
    LParen,
    RParen,
}

struct LineParser {
    number: Regex,
    var: Regex,
    label: Regex,
}

impl LineParser {
    fn new() -> Self {
        Self {
            number: Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("number regex must compile"),
            var: Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").expect("var regex must compile"),
            label: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("label regex must compile"),
        }
    }

    fn parse_line(&self, raw_line: &str, line: usize) -> Result<Option<Statement>, ScriptError> {
        let tokens = self.tokenize(raw_line, line)?;
        let Some((head, rest)) = tokens.split_first() else {
            return Ok(None);
        };

        let Token::Word(head_word) = head else {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                format!("Line must start with a command or label: {}", raw_line.trim()),
                line,
            ));
        };

        if let Some(label_name) = head_word.strip_prefix(':') {
            if !rest.is_empty() {
                return Err(ScriptError::with_line(
                    "COMPILE_STATEMENT",
                    "Label definition takes no arguments.",
                    line,
                ));
            }
            let name = self.label_name(label_name, line)?;
            return Ok(Some(Statement {
                line,
                kind: StatementKind::Label { name },
            }));
        }

        let kind = match head_word.to_ascii_lowercase().as_str() {
            "echo" => StatementKind::Echo {
                parts: self.parse_parts(rest, line)?,
            },
            "send" => StatementKind::Send {
                parts: self.parse_parts(rest, line)?,
            },
            "setvar" => {
                let (name, value_tokens) = self.split_var_head(rest, line)?;
                StatementKind::Assign {
                    name,
                    value: self.parse_value(value_tokens, line)?,
                }
            }
            "add" => self.parse_arith(ArithOp::Add, rest, line)?,
            "subtract" => self.parse_arith(ArithOp::Subtract, rest, line)?,
            "multiply" => self.parse_arith(ArithOp::Multiply, rest, line)?,
            "goto" => StatementKind::Goto {
                label: self.parse_label_ref(rest, line)?,
            },
            "gosub" => StatementKind::Gosub {
                label: self.parse_label_ref(rest, line)?,
            },
            "return" => {
                self.expect_no_args(rest, "return", line)?;
                StatementKind::Return
            }
            "branch" => {
                let Some((last, value_tokens)) = rest.split_last() else {
                    return Err(ScriptError::with_line(
                        "COMPILE_STATEMENT",
                        "branch expects a test value and a target label.",
                        line,
                    ));
                };
                StatementKind::Branch {
                    test: self.parse_value(value_tokens, line)?,
                    label: self.parse_label_ref(std::slice::from_ref(last), line)?,
                }
            }
            "if" => StatementKind::If {
                test: self.parse_value(rest, line)?,
            },
            "elseif" => StatementKind::ElseIf {
                test: self.parse_value(rest, line)?,
            },
            "else" => {
                self.expect_no_args(rest, "else", line)?;
                StatementKind::Else
            }
            "while" => StatementKind::While {
                test: self.parse_value(rest, line)?,
            },
            "end" => {
                self.expect_no_args(rest, "end", line)?;
                StatementKind::End
            }
            "savevar" => StatementKind::SaveVar {
                name: self.parse_lone_var(rest, "saveVar", line)?,
            },
            "loadvar" => StatementKind::LoadVar {
                name: self.parse_lone_var(rest, "loadVar", line)?,
            },
            "halt" => {
                self.expect_no_args(rest, "halt", line)?;
                StatementKind::Halt
            }
            other => {
                return Err(ScriptError::with_line(
                    "COMPILE_STATEMENT",
                    format!("Unknown command \"{}\".", other),
                    line,
                ));
            }
        };

        Ok(Some(Statement { line, kind }))
    }

    fn tokenize(&self, raw_line: &str, line: usize) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();
        let mut chars = raw_line.chars().peekable();

        while let Some(&ch) = chars.peek() {
            match ch {
                ' ' | '\t' => {
                    chars.next();
                }
                '#' | ';' => break,
                '"' => {
                    chars.next();
                    let mut text = String::new();
                    let mut closed = false;
                    for next in chars.by_ref() {
                        if next == '"' {
                            closed = true;
                            break;
                        }
                        text.push(next);
                    }
                    if !closed {
                        return Err(ScriptError::with_line(
                            "COMPILE_TOKEN",
                            "Unterminated string literal.",
                            line,
                        ));
                    }
                    tokens.push(Token::Str(text));
                }
                '(' => {
                    chars.next();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    chars.next();
                    tokens.push(Token::RParen);
                }
                '=' => {
                    chars.next();
                    tokens.push(Token::Op(CompareOp::Eq));
                }
                '<' => {
                    chars.next();
                    let op = match chars.peek() {
                        Some('>') => {
                            chars.next();
                            CompareOp::Ne
                        }
                        Some('=') => {
                            chars.next();
                            CompareOp::Le
                        }
                        _ => CompareOp::Lt,
                    };
                    tokens.push(Token::Op(op));
                }
                '>' => {
                    chars.next();
                    let op = match chars.peek() {
                        Some('=') => {
                            chars.next();
                            CompareOp::Ge
                        }
                        _ => CompareOp::Gt,
                    };
                    tokens.push(Token::Op(op));
                }
                _ => {
                    let mut word = String::new();
                    while let Some(&next) = chars.peek() {
                        if next.is_whitespace()
                            || matches!(next, '"' | '(' | ')' | '=' | '<' | '>' | '#' | ';')
                        {
                            break;
                        }
                        word.push(next);
                        chars.next();
                    }
                    tokens.push(Token::Word(word));
                }
            }
        }

        Ok(tokens)
    }

    fn parse_term(&self, token: &Token, line: usize) -> Result<Expr, ScriptError> {
        match token {
            Token::Str(text) => Ok(Expr::Literal {
                value: ScriptValue::String(text.clone()),
            }),
            Token::Word(word) if self.number.is_match(word) => {
                let number = word
                    .parse::<f64>()
                    .map_err(|_| {
                        ScriptError::with_line(
                            "COMPILE_TOKEN",
                            format!("Number literal \"{}\" is out of range.", word),
                            line,
                        )
                    })?;
                Ok(Expr::Literal {
                    value: ScriptValue::Number(number),
                })
            }
            Token::Word(word) if self.var.is_match(word) => Ok(Expr::Var {
                name: word.to_ascii_lowercase(),
            }),
            Token::Word(word) => Err(ScriptError::with_line(
                "COMPILE_TOKEN",
                format!("Unrecognized token \"{}\".", word),
                line,
            )),
            _ => Err(ScriptError::with_line(
                "COMPILE_TOKEN",
                "Expected a string, number, or variable.",
                line,
            )),
        }
    }

    /// One or more terms; a run of several terms concatenates on evaluation.
    fn parse_terms(&self, tokens: &[Token], line: usize) -> Result<Expr, ScriptError> {
        let mut parts = Vec::new();
        for token in tokens {
            parts.push(self.parse_term(token, line)?);
        }
        match parts.len() {
            0 => Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Expected a value.",
                line,
            )),
            1 => Ok(parts.remove(0)),
            _ => Ok(Expr::Concat { parts }),
        }
    }

    /// A value expression: either a (possibly parenthesized) comparison or a
    /// plain term sequence.
    fn parse_value(&self, tokens: &[Token], line: usize) -> Result<Expr, ScriptError> {
        let inner = match (tokens.first(), tokens.last()) {
            (Some(Token::LParen), Some(Token::RParen)) if tokens.len() >= 2 => {
                &tokens[1..tokens.len() - 1]
            }
            _ => tokens,
        };

        if inner.contains(&Token::LParen) || inner.contains(&Token::RParen) {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Unbalanced or nested parentheses in expression.",
                line,
            ));
        }

        let Some(op_index) = inner.iter().position(|token| matches!(token, Token::Op(_))) else {
            return self.parse_terms(inner, line);
        };

        let Token::Op(op) = &inner[op_index] else {
            unreachable!("position() only matches Op tokens");
        };
        let op = *op;
        if inner[op_index + 1..]
            .iter()
            .any(|token| matches!(token, Token::Op(_)))
        {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Expression may contain at most one comparison operator.",
                line,
            ));
        }

        let lhs = self.parse_terms(&inner[..op_index], line)?;
        let rhs = self.parse_terms(&inner[op_index + 1..], line)?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_parts(&self, tokens: &[Token], line: usize) -> Result<Vec<Expr>, ScriptError> {
        if tokens.is_empty() {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Expected at least one output part.",
                line,
            ));
        }
        tokens
            .iter()
            .map(|token| self.parse_term(token, line))
            .collect()
    }

    fn parse_arith(
        &self,
        op: ArithOp,
        tokens: &[Token],
        line: usize,
    ) -> Result<StatementKind, ScriptError> {
        let (name, operand_tokens) = self.split_var_head(tokens, line)?;
        Ok(StatementKind::Arith {
            op,
            name,
            operand: self.parse_value(operand_tokens, line)?,
        })
    }

    fn split_var_head<'t>(
        &self,
        tokens: &'t [Token],
        line: usize,
    ) -> Result<(String, &'t [Token]), ScriptError> {
        let Some((Token::Word(word), rest)) = tokens.split_first() else {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Expected a $-variable name.",
                line,
            ));
        };
        if !self.var.is_match(word) {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                format!("\"{}\" is not a valid $-variable name.", word),
                line,
            ));
        }
        Ok((word.to_ascii_lowercase(), rest))
    }

    fn parse_lone_var(
        &self,
        tokens: &[Token],
        command: &str,
        line: usize,
    ) -> Result<String, ScriptError> {
        let (name, rest) = self.split_var_head(tokens, line)?;
        if !rest.is_empty() {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                format!("{} takes exactly one variable.", command),
                line,
            ));
        }
        Ok(name)
    }

    fn parse_label_ref(&self, tokens: &[Token], line: usize) -> Result<String, ScriptError> {
        let [Token::Word(word)] = tokens else {
            return Err(ScriptError::with_line(
                "COMPILE_STATEMENT",
                "Expected exactly one label reference.",
                line,
            ));
        };
        self.label_name(word.strip_prefix(':').unwrap_or(word), line)
    }

    fn label_name(&self, raw: &str, line: usize) -> Result<String, ScriptError> {
        if !self.label.is_match(raw) {
            return Err(ScriptError::with_line(
                "COMPILE_TOKEN",
                format!("\"{}\" is not a valid label name.", raw),
                line,
            ));
        }
        Ok(raw.to_ascii_lowercase())
    }

    fn expect_no_args(&self, tokens: &[Token], command: &str, line: usize) -> Result<(), ScriptError> {
        if tokens.is_empty() {
            return Ok(());
        }
        Err(ScriptError::with_line(
            "COMPILE_STATEMENT",
            format!("{} takes no arguments.", command),
            line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(source: &str) -> StatementKind {
        let statements = parse_source(source).expect("source should parse");
        assert_eq!(statements.len(), 1);
        statements.into_iter().next().expect("one statement").kind
    }

    #[test]
    fn parses_labels_comments_and_blank_lines() {
        let statements = parse_source(
            r#"
# comment only
:Top
  ; trailing comment line
echo "hi"   # inline comment
"#,
        )
        .expect("source should parse");
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].kind,
            StatementKind::Label {
                name: "top".to_string()
            }
        );
        assert_eq!(statements[0].line, 3);
    }

    #[test]
    fn parses_assignment_with_concatenation() {
        let kind = single(r#"setVar $greeting "sector " $sector"#);
        let StatementKind::Assign { name, value } = kind else {
            panic!("expected assign");
        };
        assert_eq!(name, "$greeting");
        let Expr::Concat { parts } = value else {
            panic!("expected concat");
        };
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn parses_parenthesized_comparison() {
        let kind = single("while ($counter <= 3)");
        let StatementKind::While { test } = kind else {
            panic!("expected while");
        };
        assert_eq!(
            test,
            Expr::Compare {
                op: CompareOp::Le,
                lhs: Box::new(Expr::Var {
                    name: "$counter".to_string()
                }),
                rhs: Box::new(Expr::Literal {
                    value: ScriptValue::Number(3.0)
                }),
            }
        );
    }

    #[test]
    fn parses_branch_with_bare_test_and_label() {
        let kind = single("branch $v :miss");
        let StatementKind::Branch { test, label } = kind else {
            panic!("expected branch");
        };
        assert_eq!(
            test,
            Expr::Var {
                name: "$v".to_string()
            }
        );
        assert_eq!(label, "miss");
    }

    #[test]
    fn command_keywords_and_names_are_case_insensitive() {
        let kind = single("SETVAR $Counter 1");
        let StatementKind::Assign { name, .. } = kind else {
            panic!("expected assign");
        };
        assert_eq!(name, "$counter");

        let kind = single("GOTO :Top");
        assert_eq!(
            kind,
            StatementKind::Goto {
                label: "top".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_commands_and_bad_tokens() {
        let error = parse_source("frobnicate $x").expect_err("unknown command should fail");
        assert_eq!(error.code, "COMPILE_STATEMENT");
        assert_eq!(error.line, Some(1));

        let error = parse_source("echo \"unterminated").expect_err("open quote should fail");
        assert_eq!(error.code, "COMPILE_TOKEN");

        let error = parse_source("echo bareword").expect_err("bare word should fail");
        assert_eq!(error.code, "COMPILE_TOKEN");
    }

    #[test]
    fn rejects_double_comparison_and_misshapen_args() {
        let error = parse_source("if ($a = $b = $c)").expect_err("double operator should fail");
        assert_eq!(error.code, "COMPILE_STATEMENT");

        let error = parse_source("saveVar $a $b").expect_err("extra arg should fail");
        assert_eq!(error.code, "COMPILE_STATEMENT");

        let error = parse_source("return 1").expect_err("return arg should fail");
        assert_eq!(error.code, "COMPILE_STATEMENT");

        let error = parse_source("add $x").expect_err("missing operand should fail");
        assert_eq!(error.code, "COMPILE_STATEMENT");
    }

    #[test]
    fn negative_numbers_parse_as_literals() {
        let kind = single("setVar $x -5");
        let StatementKind::Assign { value, .. } = kind else {
            panic!("expected assign");
        };
        assert_eq!(
            value,
            Expr::Literal {
                value: ScriptValue::Number(-5.0)
            }
        );
    }
}
