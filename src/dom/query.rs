use crate::dom::dom_model::{Document, NodeId};
use crate::error::SelectorError;

// ============================================================================
// Selector model
// ============================================================================

/// A parsed, comma-separated selector list.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(Vec<ComplexSelector>);

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    simple: Vec<SimpleSelector>,
}

#[derive(Debug, Clone, PartialEq)]
enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
    NthOfType(usize),
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        if input.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        Parser::new(input).parse_list()
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node) && self.0.iter().any(|sel| match_from(doc, node, sel, sel.compounds.len() - 1))
    }
}

fn match_from(doc: &Document, node: NodeId, sel: &ComplexSelector, idx: usize) -> bool {
    if !matches_compound(doc, node, &sel.compounds[idx]) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match sel.combinators[idx - 1] {
        Combinator::Child => doc
            .parent(node)
            .filter(|p| doc.is_element(*p))
            .is_some_and(|p| match_from(doc, p, sel, idx - 1)),
        Combinator::Descendant => doc
            .ancestors(node)
            .into_iter()
            .any(|a| match_from(doc, a, sel, idx - 1)),
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &Compound) -> bool {
    let Some(tag) = doc.tag(node) else {
        return false;
    };
    if let Some(expected) = &compound.tag {
        if expected != tag {
            return false;
        }
    }
    compound.simple.iter().all(|s| match s {
        SimpleSelector::Id(id) => doc.attr(node, "id") == Some(id.as_str()),
        SimpleSelector::Class(class) => doc.classes(node).any(|c| c == class),
        SimpleSelector::Attribute { name, value } => match (doc.attr(node, name), value) {
            (Some(actual), Some(expected)) => actual == expected,
            (Some(_), None) => true,
            (None, _) => false,
        },
        SimpleSelector::NthOfType(n) => doc.nth_of_type(node) == *n,
    })
}

// ============================================================================
// Document queries
// ============================================================================

impl Document {
    /// All elements matching `selector`, in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .all_elements()
            .into_iter()
            .filter(|n| list.matches(self, *n))
            .collect())
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }

    /// Whether `selector` matches exactly one element. Invalid selectors
    /// are never unique.
    pub fn is_unique(&self, selector: &str) -> bool {
        matches!(self.query_selector_all(selector), Ok(found) if found.len() == 1)
    }

    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        Ok(SelectorList::parse(selector)?.matches(self, node))
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        if list.matches(self, node) {
            return Ok(Some(node));
        }
        Ok(self.ancestors(node).into_iter().find(|a| list.matches(self, *a)))
    }
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> SelectorError {
        SelectorError::Syntax {
            selector: self.source.to_string(),
            position: self.pos,
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), SelectorError> {
        if self.eat(ch) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", ch)))
        }
    }

    /// Returns whether any whitespace was skipped.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList(selectors))
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        self.skip_ws();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();

        if self.eat('*') {
            // universal: no tag constraint
        } else if self.at_ident_start() {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.simple.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.simple.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.simple.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.simple.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(self.error("expected a selector"));
        }
        Ok(compound)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector, SelectorError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.eat(']') {
            return Ok(SimpleSelector::Attribute { name, value: None });
        }
        if !self.eat('=') {
            return Err(self.error("unsupported attribute operator"));
        }
        self.skip_ws();
        let value = match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_string(q)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        self.expect(']')?;

        Ok(SimpleSelector::Attribute {
            name,
            value: Some(value),
        })
    }

    fn parse_pseudo(&mut self) -> Result<SimpleSelector, SelectorError> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        if name != "nth-of-type" {
            return Err(self.error(format!("unsupported pseudo-class ':{}'", name)));
        }
        self.expect('(')?;
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        let n: usize = digits
            .parse()
            .map_err(|_| self.error("expected a positive integer"))?;
        if n == 0 {
            return Err(self.error("nth-of-type index starts at 1"));
        }
        self.skip_ws();
        self.expect(')')?;
        Ok(SimpleSelector::NthOfType(n))
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some(c) if is_name_start(c) => true,
            Some('\\') => true,
            Some('-') => match self.peek_at(1) {
                Some(c) if is_name_start(c) || c == '-' || c == '\\' => true,
                _ => false,
            },
            _ => false,
        }
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        if !self.at_ident_start() {
            return Err(self.error("expected an identifier"));
        }
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                out.push(self.parse_escape()?);
            } else if is_name_char(c) {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(out)
    }

    fn parse_string(&mut self, quote: char) -> Result<String, SelectorError> {
        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('\\') if self.peek_at(1) == Some('\n') => self.pos += 2,
                Some('\\') => out.push(self.parse_escape()?),
                Some('\n') => return Err(self.error("newline in string")),
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    /// Consume a backslash escape; the cursor sits on the backslash.
    fn parse_escape(&mut self) -> Result<char, SelectorError> {
        self.pos += 1;
        let Some(next) = self.peek() else {
            return Err(self.error("dangling escape"));
        };
        if next == '\n' {
            return Err(self.error("escaped newline outside string"));
        }
        if !next.is_ascii_hexdigit() {
            self.pos += 1;
            return Ok(next);
        }

        let start = self.pos;
        while self.pos - start < 6 && self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let hex: String = self.chars[start..self.pos].iter().collect();
        // A single whitespace terminates a hex escape
        if self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).unwrap_or(0xFFFD);
        Ok(match char::from_u32(code) {
            Some('\0') | None => '\u{FFFD}',
            Some(c) => c,
        })
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start(c) || c.is_ascii_digit() || c == '-'
}
