//! A small A1 formula parser for end-to-end tests.
//!
//! Covers literals, `{..}` arrays, cell and area references with optional
//! sheet prefixes, function calls and the usual operator precedence.

#![allow(dead_code)]

use std::rc::Rc;

use tilecalc_eval::engine::{Cell, Workbook};
use tilecalc_eval::parse::CellParser;
use tilecalc_eval::{ArrayValue, CellAddress, CellRefSpec, Expr, SheetId, Value};

pub struct MiniParser;

impl CellParser for MiniParser {
    fn parse_cell_content(&self, text: &str, workbook: &Workbook, col: u32, row: u32) -> Option<Cell> {
        match text.strip_prefix('=') {
            Some(src) => parse_formula(src, workbook, CellAddress::new(col, row)).map(Cell::formula),
            None if text.is_empty() => Some(Cell::blank()),
            None => match text.strip_prefix('\'') {
                Some(q) => Some(Cell::quoted_text(q)),
                None => Some(match text.parse::<f64>() {
                    Ok(n) => Cell::number(n),
                    Err(_) => Cell::text(text),
                }),
            },
        }
    }
}

pub fn parse_formula(src: &str, wb: &Workbook, anchor: CellAddress) -> Option<Rc<Expr>> {
    let mut p = Parser {
        chars: src.chars().collect(),
        pos: 0,
        wb,
        anchor,
    };
    let e = p.comparison()?;
    p.skip_ws();
    (p.pos == p.chars.len()).then_some(e)
}

/// Type `text` into `at` (A1 notation) of `sheet`.
pub fn put(wb: &mut Workbook, sheet: SheetId, at: &str, text: &str) {
    let a = CellAddress::parse_a1(at).unwrap();
    let cell = MiniParser
        .parse_cell_content(text, wb, a.col, a.row)
        .unwrap_or_else(|| panic!("cannot parse {text:?}"));
    wb.set_cell(sheet, a.col, a.row, Some(cell)).unwrap();
}

pub fn value(wb: &Workbook, sheet: SheetId, at: &str) -> Value {
    let a = CellAddress::parse_a1(at).unwrap();
    wb.eval_cell(sheet, a.col, a.row)
}

pub fn shown(wb: &Workbook, sheet: SheetId, at: &str) -> String {
    let a = CellAddress::parse_a1(at).unwrap();
    wb.show(sheet, a.col, a.row)
}

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    wb: &'a Workbook,
    anchor: CellAddress,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, s: &str) -> bool {
        self.skip_ws();
        let n = s.chars().count();
        if self.chars.len() >= self.pos + n && self.chars[self.pos..self.pos + n].iter().copied().eq(s.chars()) {
            self.pos += n;
            true
        } else {
            false
        }
    }

    fn comparison(&mut self) -> Option<Rc<Expr>> {
        let mut lhs = self.concat()?;
        loop {
            let op = ["<>", "<=", ">=", "=", "<", ">"].into_iter().find(|op| self.eat(op));
            match op {
                Some(op) => lhs = Expr::binary(op, lhs, self.concat()?),
                None => return Some(lhs),
            }
        }
    }

    fn concat(&mut self) -> Option<Rc<Expr>> {
        let mut lhs = self.additive()?;
        while self.eat("&") {
            lhs = Expr::binary("&", lhs, self.additive()?);
        }
        Some(lhs)
    }

    fn additive(&mut self) -> Option<Rc<Expr>> {
        let mut lhs = self.multiplicative()?;
        loop {
            if self.eat("+") {
                lhs = Expr::binary("+", lhs, self.multiplicative()?);
            } else if self.eat("-") {
                lhs = Expr::binary("-", lhs, self.multiplicative()?);
            } else {
                return Some(lhs);
            }
        }
    }

    fn multiplicative(&mut self) -> Option<Rc<Expr>> {
        let mut lhs = self.power()?;
        loop {
            if self.eat("*") {
                lhs = Expr::binary("*", lhs, self.power()?);
            } else if self.eat("/") {
                lhs = Expr::binary("/", lhs, self.power()?);
            } else {
                return Some(lhs);
            }
        }
    }

    fn power(&mut self) -> Option<Rc<Expr>> {
        let mut lhs = self.unary()?;
        while self.eat("^") {
            lhs = Expr::binary("^", lhs, self.unary()?);
        }
        Some(lhs)
    }

    fn unary(&mut self) -> Option<Rc<Expr>> {
        if self.eat("-") {
            return Some(Expr::call("NEG", vec![self.unary()?]));
        }
        self.primary()
    }

    fn primary(&mut self) -> Option<Rc<Expr>> {
        self.skip_ws();
        match self.peek()? {
            '(' => {
                self.pos += 1;
                let e = self.comparison()?;
                self.eat(")").then_some(e)
            }
            '"' => Some(Expr::text(&self.string()?)),
            '{' => self.array(),
            '\'' => {
                let sheet = self.quoted_sheet()?;
                self.reference(Some(sheet))
            }
            c if c.is_ascii_digit() || c == '.' => Some(Expr::number(self.number()?)),
            _ => {
                let word = self.word();
                if word.is_empty() {
                    return None;
                }
                if self.peek() == Some('(') {
                    self.pos += 1;
                    let args = self.args()?;
                    return Some(Expr::call(&word, args));
                }
                if self.peek() == Some('!') {
                    self.pos += 1;
                    let sheet = self.wb.sheet_by_name(&word)?;
                    return self.reference(Some(sheet));
                }
                self.finish_reference(None, &word)
            }
        }
    }

    fn args(&mut self) -> Option<Vec<Rc<Expr>>> {
        let mut args = Vec::new();
        if self.eat(")") {
            return Some(args);
        }
        loop {
            args.push(self.comparison()?);
            if self.eat(")") {
                return Some(args);
            }
            if !self.eat(",") {
                return None;
            }
        }
    }

    fn word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '$' || c == '.' || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().ok()
    }

    fn string(&mut self) -> Option<String> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.peek()? {
                '"' if self.chars.get(self.pos + 1) == Some(&'"') => {
                    out.push('"');
                    self.pos += 2;
                }
                '"' => {
                    self.pos += 1;
                    return Some(out);
                }
                c => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn quoted_sheet(&mut self) -> Option<SheetId> {
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek()? {
                '\'' if self.chars.get(self.pos + 1) == Some(&'\'') => {
                    name.push('\'');
                    self.pos += 2;
                }
                '\'' => {
                    self.pos += 1;
                    break;
                }
                c => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }
        if !self.eat("!") {
            return None;
        }
        self.wb.sheet_by_name(&name)
    }

    fn reference(&mut self, sheet: Option<SheetId>) -> Option<Rc<Expr>> {
        let word = self.word();
        self.finish_reference(sheet, &word)
    }

    fn finish_reference(&mut self, sheet: Option<SheetId>, first: &str) -> Option<Rc<Expr>> {
        let ul = CellRefSpec::parse_a1(first, self.anchor).ok()?;
        if self.peek() == Some(':') {
            self.pos += 1;
            let second = self.word();
            let lr = CellRefSpec::parse_a1(&second, self.anchor).ok()?;
            return Some(match sheet {
                Some(s) => Expr::sheet_area(s, ul, lr),
                None => Expr::area(ul, lr),
            });
        }
        Some(match sheet {
            Some(s) => Expr::sheet_cell(s, ul),
            None => Expr::cell(ul),
        })
    }

    fn array(&mut self) -> Option<Rc<Expr>> {
        self.pos += 1;
        let mut rows = vec![Vec::new()];
        loop {
            self.skip_ws();
            let negative = self.eat("-");
            self.skip_ws();
            let item = match self.peek()? {
                '"' => Value::text(&self.string()?),
                _ => {
                    let n = self.number()?;
                    Value::Number(if negative { -n } else { n })
                }
            };
            rows.last_mut()?.push(item);
            if self.eat(",") {
                continue;
            }
            if self.eat(";") {
                rows.push(Vec::new());
                continue;
            }
            if self.eat("}") {
                break;
            }
            return None;
        }
        if rows.iter().any(|r| r.len() != rows[0].len()) {
            return None;
        }
        Some(Expr::value(Value::Array(ArrayValue::from_rows(rows))))
    }
}
