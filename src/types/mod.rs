pub mod ast;
pub mod program;
pub mod span;
pub mod syntax;
