//! Rendering expressions back to formula text.

use tilecalc_common::{CellAddress, RefFormat, SheetId};

use super::{CellArea, CellRef, Expr, FunCall};
use crate::engine::Workbook;
use crate::value::{ArrayValue, Value, format_number};

/// Where and how an expression is rendered.
#[derive(Clone, Copy)]
pub struct ShowContext<'w> {
    pub workbook: &'w Workbook,
    /// Sheet holding the formula.
    pub sheet: SheetId,
    /// Cell holding the formula; relative references render against it.
    pub anchor: CellAddress,
    pub format: RefFormat,
}

const PREC_PREFIX: u8 = 6;

fn infix_precedence(name: &str) -> Option<u8> {
    Some(match name {
        "=" | "<>" | "<" | "<=" | ">" | ">=" => 1,
        "&" => 2,
        "+" | "-" => 3,
        "*" | "/" => 4,
        "^" => 5,
        _ => return None,
    })
}

impl Expr {
    /// Formula text without the leading `=`.
    pub fn show(&self, ctx: &ShowContext<'_>) -> String {
        let mut out = String::new();
        self.show_into(&mut out, ctx, 0);
        out
    }

    fn show_into(&self, out: &mut String, ctx: &ShowContext<'_>, outer: u8) {
        match self {
            Expr::Number(n) => out.push_str(&format_number(*n)),
            Expr::Text(s) => push_quoted(out, s),
            Expr::Value(v) => show_constant(out, v),
            Expr::Error(e) => out.push_str(e.tag()),
            Expr::CellRef(r) => r.show_into(out, ctx),
            Expr::CellArea(a) => a.show_into(out, ctx),
            Expr::Call(call) => call.show_into(out, ctx, outer),
        }
    }
}

impl FunCall {
    fn show_into(&self, out: &mut String, ctx: &ShowContext<'_>, outer: u8) {
        let args = &self.args;
        if let (Some(prec), 2) = (infix_precedence(&self.name), args.len()) {
            let parens = prec < outer;
            if parens {
                out.push('(');
            }
            args[0].show_into(out, ctx, prec);
            out.push_str(&self.name);
            // Left-associative: an equal-precedence right operand needs parentheses.
            args[1].show_into(out, ctx, prec + 1);
            if parens {
                out.push(')');
            }
        } else if &*self.name == "NEG" && args.len() == 1 {
            out.push('-');
            args[0].show_into(out, ctx, PREC_PREFIX);
        } else {
            out.push_str(&self.name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                arg.show_into(out, ctx, 0);
            }
            out.push(')');
        }
    }
}

fn push_sheet_prefix(out: &mut String, ctx: &ShowContext<'_>, sheet: Option<SheetId>) -> bool {
    let Some(id) = sheet else {
        return true;
    };
    match ctx.workbook.sheet(id) {
        Some(sheet) => {
            let name = sheet.name();
            if name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                out.push_str(name);
            } else {
                out.push('\'');
                out.push_str(&name.replace('\'', "''"));
                out.push('\'');
            }
            out.push('!');
            true
        }
        None => {
            out.push_str("#REF!");
            false
        }
    }
}

impl CellRef {
    fn show_into(&self, out: &mut String, ctx: &ShowContext<'_>) {
        if push_sheet_prefix(out, ctx, self.sheet) {
            out.push_str(&self.spec.show(ctx.anchor, ctx.format));
        }
    }
}

impl CellArea {
    fn show_into(&self, out: &mut String, ctx: &ShowContext<'_>) {
        if push_sheet_prefix(out, ctx, self.sheet) {
            out.push_str(&self.ul.show(ctx.anchor, ctx.format));
            out.push(':');
            out.push_str(&self.lr.show(ctx.anchor, ctx.format));
        }
    }
}

fn push_quoted(out: &mut String, s: &str) {
    out.push('"');
    out.push_str(&s.replace('"', "\"\""));
    out.push('"');
}

fn show_constant(out: &mut String, v: &Value) {
    match v {
        Value::Empty => {}
        Value::Number(n) => out.push_str(&format_number(*n)),
        Value::Text(s) => push_quoted(out, s),
        Value::Error(e) => out.push_str(e.tag()),
        Value::Array(ArrayValue::Explicit(a)) => {
            let cols = a.cols() as usize;
            out.push('{');
            for (i, item) in a.values().iter().enumerate() {
                if i > 0 {
                    out.push(if i % cols == 0 { ';' } else { ',' });
                }
                show_constant(out, item);
            }
            out.push('}');
        }
        // Views only arise from evaluating areas, never as literals.
        Value::Array(ArrayValue::View(_)) => out.push_str("#VALUE!"),
    }
}
