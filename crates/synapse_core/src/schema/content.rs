//! Content expressions: which child sequences a node type accepts.
//!
//! Grammar: whitespace-separated terms; a term is a type/group name or a
//! parenthesized `a | b` choice, optionally followed by `*`, `+`, `?`,
//! `{n}`, `{n,}` or `{n,m}`.

use super::NodeTypeId;
use std::collections::HashSet;

/// Parsed but unresolved term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawTerm {
    pub(crate) names: Vec<String>,
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Term {
    types: Vec<NodeTypeId>,
    min: usize,
    max: Option<usize>,
}

/// Resolved content expression bound to one schema's type ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    source: String,
    terms: Vec<Term>,
}

impl ContentExpr {
    pub(crate) fn new(source: &str, resolved: Vec<(Vec<NodeTypeId>, usize, Option<usize>)>) -> Self {
        Self {
            source: source.to_string(),
            terms: resolved
                .into_iter()
                .map(|(types, min, max)| Term { types, min, max })
                .collect(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every type id any term accepts.
    pub fn allowed_types(&self) -> impl Iterator<Item = NodeTypeId> + '_ {
        self.terms.iter().flat_map(|term| term.types.iter().copied())
    }

    /// Whether an empty child list satisfies the expression.
    pub fn accepts_empty(&self) -> bool {
        self.terms.iter().all(|term| term.min == 0)
    }

    /// Tests a full child type sequence against the expression.
    pub fn matches(&self, children: &[NodeTypeId]) -> bool {
        let mut failed = HashSet::new();
        self.match_from(0, 0, children, &mut failed)
    }

    fn match_from(
        &self,
        term_index: usize,
        pos: usize,
        children: &[NodeTypeId],
        failed: &mut HashSet<(usize, usize)>,
    ) -> bool {
        let Some(term) = self.terms.get(term_index) else {
            return pos == children.len();
        };
        if failed.contains(&(term_index, pos)) {
            return false;
        }

        let mut taken = 0;
        loop {
            let within_max = term.max.map_or(true, |max| taken <= max);
            if !within_max {
                break;
            }
            if taken >= term.min && self.match_from(term_index + 1, pos + taken, children, failed)
            {
                return true;
            }
            match children.get(pos + taken) {
                Some(child) if term.types.contains(child) => taken += 1,
                _ => break,
            }
        }

        failed.insert((term_index, pos));
        false
    }
}

/// Parses expression text into raw terms, or a human-readable reason.
pub(crate) fn parse_expr(source: &str) -> Result<Vec<RawTerm>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut parser = ExprParser { chars, pos: 0 };
    let mut terms = Vec::new();

    parser.skip_ws();
    while !parser.at_end() {
        terms.push(parser.term()?);
        parser.skip_ws();
    }

    if terms.is_empty() {
        return Err("expression is empty".to_string());
    }
    Ok(terms)
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
}

impl ExprParser {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn term(&mut self) -> Result<RawTerm, String> {
        let names = if self.peek() == Some('(') {
            self.pos += 1;
            self.choice()?
        } else {
            vec![self.name()?]
        };
        let (min, max) = self.quantifier()?;
        Ok(RawTerm { names, min, max })
    }

    fn choice(&mut self) -> Result<Vec<String>, String> {
        let mut names = Vec::new();
        loop {
            self.skip_ws();
            names.push(self.name()?);
            self.skip_ws();
            match self.peek() {
                Some('|') => self.pos += 1,
                Some(')') => {
                    self.pos += 1;
                    return Ok(names);
                }
                Some(other) => return Err(format!("unexpected `{other}` inside choice")),
                None => return Err("unclosed `(`".to_string()),
            }
        }
    }

    fn name(&mut self) -> Result<String, String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return match self.peek() {
                Some(other) => Err(format!("expected a type name, found `{other}`")),
                None => Err("expected a type name, found end of expression".to_string()),
            };
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn quantifier(&mut self) -> Result<(usize, Option<usize>), String> {
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                Ok((0, None))
            }
            Some('+') => {
                self.pos += 1;
                Ok((1, None))
            }
            Some('?') => {
                self.pos += 1;
                Ok((0, Some(1)))
            }
            Some('{') => {
                self.pos += 1;
                self.range()
            }
            _ => Ok((1, Some(1))),
        }
    }

    fn range(&mut self) -> Result<(usize, Option<usize>), String> {
        let min = self.number()?;
        let max = match self.peek() {
            Some(',') => {
                self.pos += 1;
                if self.peek() == Some('}') {
                    None
                } else {
                    Some(self.number()?)
                }
            }
            _ => Some(min),
        };
        if self.peek() != Some('}') {
            return Err("unclosed `{` quantifier".to_string());
        }
        self.pos += 1;

        if let Some(max) = max {
            if max < min || max == 0 {
                return Err(format!("invalid repeat range {{{min},{max}}}"));
            }
        }
        Ok((min, max))
    }

    fn number(&mut self) -> Result<usize, String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<usize>()
            .map_err(|_| format!("expected a repeat count, found `{digits}`"))
    }
}
