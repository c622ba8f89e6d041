//! Compile the template into a program that can be executed by the renderer.
//!
//! This process has three stages:
//! - The lexer chunks the template source into tokens.
//! - The parser constructs an AST from the token stream.
//! - The compiler takes the AST and constructs the program.

mod lex;
mod parse;
mod search;

pub use crate::compile::search::Searcher;
use crate::types::ast;
use crate::types::program::{Instr, Template, FIXME};
use crate::{Engine, Result};

/// Compile a template into a program.
pub fn template(engine: &Engine, source: String) -> Result<Template> {
    let ast = parse::Parser::new(engine, &source).parse_template()?;
    Ok(Compiler::new().compile_template(source, ast))
}

/// A compiler that constructs a program from an AST.
struct Compiler {
    instrs: Vec<Instr>,
}

impl Compiler {
    fn new() -> Self {
        Self { instrs: Vec::new() }
    }

    fn compile_template(mut self, source: String, template: ast::Template) -> Template {
        let ast::Template { scope } = template;
        self.compile_scope(scope);
        Template {
            source,
            instrs: self.instrs,
        }
    }

    fn compile_scope(&mut self, scope: ast::Scope) {
        for stmt in scope.stmts {
            self.compile_stmt(stmt);
        }
    }

    fn compile_stmt(&mut self, stmt: ast::Stmt) {
        match stmt {
            ast::Stmt::Raw(span) => {
                if !span.is_empty() {
                    self.push(Instr::EmitRaw(span));
                }
            }

            ast::Stmt::Emit(ast::Emit { var, escape }) => {
                let instr = match escape {
                    true => Instr::Emit(var),
                    false => Instr::EmitUnescaped(var),
                };
                self.push(instr);
            }

            ast::Stmt::Section(ast::Section {
                inverted: false,
                var,
                body,
            }) => {
                let j = self.push(Instr::SectionStart(var, FIXME));
                self.compile_scope(body);
                self.push(Instr::SectionNext(j + 1));
                self.update_jump(j);
            }

            ast::Stmt::Section(ast::Section {
                inverted: true,
                var,
                body,
            }) => {
                let j = self.push(Instr::JumpIfTruthy(var, FIXME));
                self.compile_scope(body);
                self.update_jump(j);
            }

            ast::Stmt::Partial(ast::Partial { name }) => {
                self.push(Instr::Partial(name));
            }
        }
    }

    fn update_jump(&mut self, i: usize) {
        let n = self.instrs.len();
        match &mut self.instrs[i] {
            Instr::SectionStart(_, j) | Instr::JumpIfTruthy(_, j) => *j = n,
            _ => unreachable!("not a jump instr"),
        }
    }

    fn push(&mut self, instr: Instr) -> usize {
        let i = self.instrs.len();
        self.instrs.push(instr);
        i
    }
}
