use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use crate::fmt::Formatter;
use crate::render::stack::Stack;
use crate::render::Partials;
use crate::types::ast;
use crate::types::program::{Instr, Template};
use crate::{Engine, Error, Result};

pub struct RendererImpl<'render> {
    pub(crate) engine: &'render Engine,
    pub(crate) partials: Option<&'render dyn Partials>,
    pub(crate) stack: Stack<'render>,
}

/// A template on the render stack.
enum Frame<'render> {
    Root(&'render Template),
    Partial(Arc<crate::Template>),
}

enum RenderState {
    Done,
    Partial { name: ast::Name },
}

impl<'render> RendererImpl<'render> {
    pub(crate) fn render(
        mut self,
        f: &mut Formatter<'_>,
        template: &'render Template,
        template_name: Option<&str>,
    ) -> Result<()> {
        let mut templates = vec![(
            Frame::Root(template),
            template_name.map(ToOwned::to_owned),
            0,
        )];

        let max_include_depth = self.engine.max_include_depth;

        // Each partial name is resolved once so the whole render sees a
        // single version of it.
        let mut resolved: HashMap<String, Arc<crate::Template>> = HashMap::new();

        while let Some((frame, tname, pc)) = templates.last_mut() {
            let t = frame.template();
            let state = self.render_one(f, t, pc).map_err(|e| match tname {
                Some(s) => e.with_template_name(s.as_str()),
                None => e,
            })?;
            match state {
                RenderState::Done => {
                    templates.pop();
                }
                RenderState::Partial { name } => {
                    let partial_name = t.source.as_str()[name.span].to_owned();
                    let partial = match resolved.get(&partial_name) {
                        Some(partial) => partial.clone(),
                        None => {
                            let partial =
                                self.get_partial(&t.source, &name).map_err(|e| match tname {
                                    Some(s) => e.with_template_name(s.as_str()),
                                    None => e,
                                })?;
                            resolved.insert(partial_name.clone(), partial.clone());
                            partial
                        }
                    };
                    templates.push((Frame::Partial(partial), Some(partial_name), 0));
                }
            }
            if templates.len() > max_include_depth {
                return Err(Error::max_include_depth(max_include_depth));
            }
        }

        Ok(())
    }

    fn render_one(
        &mut self,
        f: &mut Formatter<'_>,
        t: &Template,
        pc: &mut usize,
    ) -> Result<RenderState> {
        while let Some(instr) = t.instrs.get(*pc) {
            match instr {
                Instr::EmitRaw(span) => {
                    // This can only fail because of an IO error.
                    f.write_str(&t.source.as_str()[*span])?;
                }

                Instr::Emit(var) => {
                    let value = self.stack.lookup(&t.source, var)?;
                    (self.engine.escape)(f, value)
                        .map_err(|err| Error::format(err, &t.source, var.span))?;
                }

                Instr::EmitUnescaped(var) => {
                    let value = self.stack.lookup(&t.source, var)?;
                    (self.engine.raw)(f, value)
                        .map_err(|err| Error::format(err, &t.source, var.span))?;
                }

                Instr::SectionStart(var, j) => match self.stack.lookup_maybe(&t.source, var) {
                    Some(value) if value.is_truthy() => self.stack.push_section(value),
                    _ => {
                        *pc = *j;
                        continue;
                    }
                },

                Instr::SectionNext(j) => {
                    if self.stack.next_section() {
                        *pc = *j;
                        continue;
                    }
                }

                Instr::JumpIfTruthy(var, j) => {
                    if self
                        .stack
                        .lookup_maybe(&t.source, var)
                        .is_some_and(|v| v.is_truthy())
                    {
                        *pc = *j;
                        continue;
                    }
                }

                Instr::Partial(name) => {
                    *pc += 1;
                    return Ok(RenderState::Partial { name: *name });
                }
            }
            *pc += 1;
        }
        Ok(RenderState::Done)
    }

    fn get_partial(&self, source: &str, name: &ast::Name) -> Result<Arc<crate::Template>> {
        self.partials
            .and_then(|p| p.get_partial(&source[name.span]))
            .ok_or_else(|| Error::render("unknown partial", source, name.span))
    }
}

impl Frame<'_> {
    fn template(&self) -> &Template {
        match self {
            Frame::Root(t) => t,
            Frame::Partial(t) => &t.template,
        }
    }
}
