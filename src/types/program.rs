//! Defines a compiled [`Template`] which is a sequence of [`Instr`] that can be
//! executed by the renderer.

use crate::types::ast;
use crate::types::span::Span;

pub const FIXME: usize = !0;

#[cfg_attr(internal_debug, derive(Debug))]
pub struct Template {
    pub source: String,
    pub instrs: Vec<Instr>,
}

#[cfg_attr(internal_debug, derive(Debug))]
pub enum Instr {
    /// Emit raw template
    EmitRaw(Span),

    /// Lookup the variable and emit it using the escape formatter
    Emit(ast::Var),

    /// Lookup the variable and emit it using the raw formatter
    EmitUnescaped(ast::Var),

    /// Lookup the variable and jump to the instruction if it is falsy,
    /// otherwise push a section state
    SectionStart(ast::Var, usize),

    /// Advance the section on the stack and jump to the instruction if there
    /// is another item, otherwise pop the section state
    SectionNext(usize),

    /// Lookup the variable and jump to the instruction if it is truthy
    JumpIfTruthy(ast::Var, usize),

    /// Render another template with the current stack
    Partial(ast::Name),
}

#[cfg(not(internal_debug))]
impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("<compiled>")
    }
}
