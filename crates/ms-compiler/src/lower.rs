use std::collections::BTreeMap;

use ms_core::{Expr, Instruction, Op, Program, ScriptError, Statement, StatementKind};

/// Lower parsed statements into the executable program.
///
/// Structured `if/elseif/else/end` and `while/end` blocks are rewritten into
/// `BranchFalsy`/`Goto` over synthesized labels, so the engine only ever sees
/// the five control primitives. Synthesized labels carry an `@` prefix the
/// parser cannot produce, so they cannot collide with user labels.
pub fn lower_statements(statements: &[Statement]) -> Result<Program, ScriptError> {
    Lowering::default().run(statements)
}

#[derive(Debug)]
enum Block {
    If {
        id: usize,
        end_label: String,
        next_label: Option<String>,
        arm: usize,
        line: usize,
    },
    While {
        top_label: String,
        end_label: String,
        line: usize,
    },
}

#[derive(Default)]
struct Lowering {
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, usize>,
    blocks: Vec<Block>,
    synth_counter: usize,
}

impl Lowering {
    fn run(mut self, statements: &[Statement]) -> Result<Program, ScriptError> {
        for statement in statements {
            self.lower_statement(statement)?;
        }

        if let Some(open) = self.blocks.last() {
            let (keyword, line) = match open {
                Block::If { line, .. } => ("if", *line),
                Block::While { line, .. } => ("while", *line),
            };
            return Err(ScriptError::with_line(
                "COMPILE_BLOCK_UNCLOSED",
                format!("{} block is missing its end.", keyword),
                line,
            ));
        }

        Ok(Program {
            instructions: self.instructions,
            labels: self.labels,
        })
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), ScriptError> {
        let line = statement.line;
        match &statement.kind {
            StatementKind::Label { name } => {
                if self.labels.contains_key(name) {
                    return Err(ScriptError::with_line(
                        "COMPILE_LABEL_DUPLICATE",
                        format!("Label \"{}\" is already defined.", name),
                        line,
                    ));
                }
                self.bind_label(name.clone());
            }
            StatementKind::Echo { parts } => self.emit(line, Op::Echo { parts: parts.clone() }),
            StatementKind::Send { parts } => self.emit(line, Op::Send { parts: parts.clone() }),
            StatementKind::Assign { name, value } => self.emit(
                line,
                Op::Assign {
                    name: name.clone(),
                    value: value.clone(),
                },
            ),
            StatementKind::Arith { op, name, operand } => self.emit(
                line,
                Op::Arith {
                    op: *op,
                    name: name.clone(),
                    operand: operand.clone(),
                },
            ),
            StatementKind::Goto { label } => self.emit(line, Op::Goto { label: label.clone() }),
            StatementKind::Gosub { label } => self.emit(line, Op::Gosub { label: label.clone() }),
            StatementKind::Return => self.emit(line, Op::Return),
            StatementKind::Branch { test, label } => self.emit(
                line,
                Op::BranchFalsy {
                    test: test.clone(),
                    label: label.clone(),
                },
            ),
            StatementKind::SaveVar { name } => {
                self.emit(line, Op::SaveVar { name: name.clone() })
            }
            StatementKind::LoadVar { name } => {
                self.emit(line, Op::LoadVar { name: name.clone() })
            }
            StatementKind::Halt => self.emit(line, Op::Halt),
            StatementKind::If { test } => self.lower_if(test, line),
            StatementKind::ElseIf { test } => self.lower_elseif(test, line)?,
            StatementKind::Else => self.lower_else(line)?,
            StatementKind::While { test } => self.lower_while(test, line),
            StatementKind::End => self.lower_end(line)?,
        }
        Ok(())
    }

    fn lower_if(&mut self, test: &Expr, line: usize) {
        let id = self.next_synth_id();
        let end_label = format!("@if{}.end", id);
        let next_label = format!("@if{}.0", id);
        self.emit(
            line,
            Op::BranchFalsy {
                test: test.clone(),
                label: next_label.clone(),
            },
        );
        self.blocks.push(Block::If {
            id,
            end_label,
            next_label: Some(next_label),
            arm: 0,
            line,
        });
    }

    fn lower_elseif(&mut self, test: &Expr, line: usize) -> Result<(), ScriptError> {
        let Some(Block::If {
            id,
            end_label,
            next_label,
            arm,
            ..
        }) = self.blocks.last_mut()
        else {
            return Err(ScriptError::with_line(
                "COMPILE_ELSE_UNMATCHED",
                "elseif without an open if block.",
                line,
            ));
        };
        let Some(pending) = next_label.take() else {
            return Err(ScriptError::with_line(
                "COMPILE_ELSE_UNMATCHED",
                "elseif cannot follow else.",
                line,
            ));
        };

        *arm += 1;
        let fresh = format!("@if{}.{}", id, arm);
        let end_label = end_label.clone();
        *next_label = Some(fresh.clone());

        // Close the previous arm, then test the next condition.
        self.emit(line, Op::Goto { label: end_label });
        self.bind_label(pending);
        self.emit(
            line,
            Op::BranchFalsy {
                test: test.clone(),
                label: fresh,
            },
        );
        Ok(())
    }

    fn lower_else(&mut self, line: usize) -> Result<(), ScriptError> {
        let Some(Block::If {
            end_label,
            next_label,
            ..
        }) = self.blocks.last_mut()
        else {
            return Err(ScriptError::with_line(
                "COMPILE_ELSE_UNMATCHED",
                "else without an open if block.",
                line,
            ));
        };
        let Some(pending) = next_label.take() else {
            return Err(ScriptError::with_line(
                "COMPILE_ELSE_UNMATCHED",
                "if block already has an else.",
                line,
            ));
        };

        let end_label = end_label.clone();
        self.emit(line, Op::Goto { label: end_label });
        self.bind_label(pending);
        Ok(())
    }

    fn lower_while(&mut self, test: &Expr, line: usize) {
        let id = self.next_synth_id();
        let top_label = format!("@while{}.top", id);
        let end_label = format!("@while{}.end", id);
        self.bind_label(top_label.clone());
        self.emit(
            line,
            Op::BranchFalsy {
                test: test.clone(),
                label: end_label.clone(),
            },
        );
        self.blocks.push(Block::While {
            top_label,
            end_label,
            line,
        });
    }

    fn lower_end(&mut self, line: usize) -> Result<(), ScriptError> {
        let Some(block) = self.blocks.pop() else {
            return Err(ScriptError::with_line(
                "COMPILE_END_UNMATCHED",
                "end without an open if or while block.",
                line,
            ));
        };

        match block {
            Block::If {
                end_label,
                next_label,
                ..
            } => {
                if let Some(pending) = next_label {
                    self.bind_label(pending);
                }
                self.bind_label(end_label);
            }
            Block::While {
                top_label,
                end_label,
                ..
            } => {
                self.emit(line, Op::Goto { label: top_label });
                self.bind_label(end_label);
            }
        }
        Ok(())
    }

    fn emit(&mut self, line: usize, op: Op) {
        self.instructions.push(Instruction { line, op });
    }

    fn bind_label(&mut self, name: String) {
        self.labels.insert(name, self.instructions.len());
    }

    fn next_synth_id(&mut self) -> usize {
        self.synth_counter += 1;
        self.synth_counter
    }
}
