//! CSS escaping and the selector subset understood by [`MemoryPage`].
//!
//! Supported grammar: type and universal selectors, `#id`, `.class`,
//! `[attr]`, `[attr=value]` with quoted or bare values, `:nth-child(n)`,
//! `:nth-of-type(n)`, descendant and `>` combinators, and `,` lists.
//! Identifiers and strings accept backslash escapes including hex escapes.
//!
//! [`MemoryPage`]: crate::MemoryPage

use std::fmt::Write as _;

/// Escape `value` for use as a CSS identifier (tag, class or id).
pub fn escape_ident(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (index, &c) in chars.iter().enumerate() {
        let leading_digit = c.is_ascii_digit()
            && (index == 0 || (index == 1 && chars[0] == '-'));
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if c.is_control() || leading_digit {
            let _ = write!(out, "\\{:x} ", c as u32);
        } else if index == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Escape `value` for use inside a double-quoted CSS string.
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push('\u{FFFD}'),
            c if c.is_control() => {
                let _ = write!(out, "\\{:x} ", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMatch {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    NthChild(usize),
    NthOfType(usize),
}

/// Conditions on a single element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Lower-case tag; `None` for `*` or an omitted type selector.
    pub tag: Option<String>,
    pub ids: Vec<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeMatch>,
    pub pseudos: Vec<Pseudo>,
}

/// Compounds from left to right; the combinator of each entry links it to
/// the previous one and is ignored for the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

pub fn parse(input: &str) -> Result<SelectorList, String> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    parser.selector_list()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, wanted: char) -> Result<(), String> {
        match self.bump() {
            Some(c) if c == wanted => Ok(()),
            Some(c) => Err(format!("expected '{}' but found '{}'", wanted, c)),
            None => Err(format!("expected '{}' at end of input", wanted)),
        }
    }

    fn selector_list(&mut self) -> Result<SelectorList, String> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.complex()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                None => break,
                Some(c) => return Err(format!("unexpected '{}'", c)),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn complex(&mut self) -> Result<ComplexSelector, String> {
        let mut parts = vec![(Combinator::Descendant, self.compound()?)];
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    parts.push((Combinator::Child, self.compound()?));
                }
                None | Some(',') => break,
                Some(_) if had_ws => parts.push((Combinator::Descendant, self.compound()?)),
                Some(c) => return Err(format!("unexpected '{}'", c)),
            }
        }
        Ok(ComplexSelector { parts })
    }

    fn compound(&mut self) -> Result<Compound, String> {
        let start = self.pos;
        let mut compound = Compound::default();

        if self.peek() == Some('*') {
            self.pos += 1;
        } else if self.at_ident_start() {
            compound.tag = Some(self.ident()?.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.ids.push(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    compound.pseudos.push(self.pseudo()?);
                }
                _ => break,
            }
        }

        if self.pos == start {
            return Err(match self.peek() {
                Some(c) => format!("expected a selector but found '{}'", c),
                None => "expected a selector".to_string(),
            });
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttributeMatch, String> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let value = match self.peek() {
            Some(']') => None,
            Some('=') => {
                self.pos += 1;
                self.skip_ws();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        self.string(quote)?
                    }
                    _ => self.ident()?,
                };
                self.skip_ws();
                Some(value)
            }
            Some(c) => return Err(format!("unsupported attribute operator '{}'", c)),
            None => return Err("unterminated attribute selector".to_string()),
        };
        self.expect(']')?;
        Ok(AttributeMatch { name, value })
    }

    fn pseudo(&mut self) -> Result<Pseudo, String> {
        let name = self.ident()?.to_ascii_lowercase();
        self.expect('(')?;
        self.skip_ws();
        let mut digits = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            digits.push(c);
            self.pos += 1;
        }
        self.skip_ws();
        self.expect(')')?;
        let n: usize = digits
            .parse()
            .map_err(|_| format!(":{} needs a positive index", name))?;
        if n == 0 {
            return Err(format!(":{} indices start at 1", name));
        }
        match name.as_str() {
            "nth-child" => Ok(Pseudo::NthChild(n)),
            "nth-of-type" => Ok(Pseudo::NthOfType(n)),
            other => Err(format!("unsupported pseudo-class ':{}'", other)),
        }
    }

    fn at_ident_start(&self) -> bool {
        match self.peek() {
            Some(c) => c.is_alphanumeric() || c == '-' || c == '_' || c == '\\' || !c.is_ascii(),
            None => false,
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                out.push(self.escape()?);
            } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        if out.is_empty() {
            return Err(match self.peek() {
                Some(c) => format!("expected an identifier but found '{}'", c),
                None => "expected an identifier".to_string(),
            });
        }
        Ok(out)
    }

    fn string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('\\') => out.push(self.escape()?),
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    /// Called just after a backslash.
    fn escape(&mut self) -> Result<char, String> {
        let mut hex = String::new();
        while hex.len() < 6 {
            match self.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    hex.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if hex.is_empty() {
            return self.bump().ok_or_else(|| "dangling escape".to_string());
        }
        if matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
        let code = u32::from_str_radix(&hex, 16).map_err(|e| e.to_string())?;
        Ok(char::from_u32(code)
            .filter(|c| *c != '\0')
            .unwrap_or('\u{FFFD}'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_and_combinators() {
        let list = parse("div#main > ul.menu li:nth-child(2), a[href]").unwrap();
        assert_eq!(list.selectors.len(), 2);

        let first = &list.selectors[0];
        assert_eq!(first.parts.len(), 3);
        assert_eq!(first.parts[0].1.tag.as_deref(), Some("div"));
        assert_eq!(first.parts[0].1.ids, vec!["main".to_string()]);
        assert_eq!(first.parts[1].0, Combinator::Child);
        assert_eq!(first.parts[1].1.classes, vec!["menu".to_string()]);
        assert_eq!(first.parts[2].0, Combinator::Descendant);
        assert_eq!(first.parts[2].1.pseudos, vec![Pseudo::NthChild(2)]);

        let second = &list.selectors[1];
        assert_eq!(
            second.parts[0].1.attributes,
            vec![AttributeMatch {
                name: "href".into(),
                value: None
            }]
        );
    }

    #[test]
    fn test_quoted_attribute_values() {
        let list = parse(r#"[data-label="say \"hi\""][title='a b']"#).unwrap();
        let attrs = &list.selectors[0].parts[0].1.attributes;
        assert_eq!(attrs[0].value.as_deref(), Some(r#"say "hi""#));
        assert_eq!(attrs[1].value.as_deref(), Some("a b"));
    }

    #[test]
    fn test_escaped_identifiers_round_trip() {
        for raw in ["1st", "a.b", "-2x", "with space", "naïve", "-"] {
            let selector = format!(".{}", escape_ident(raw));
            let list = parse(&selector).unwrap();
            assert_eq!(list.selectors[0].parts[0].1.classes, vec![raw.to_string()]);
        }
    }

    #[test]
    fn test_escaped_strings_round_trip() {
        let raw = "line\none \"two\" \\ three";
        let selector = format!("[title=\"{}\"]", escape_string(raw));
        let list = parse(&selector).unwrap();
        assert_eq!(
            list.selectors[0].parts[0].1.attributes[0].value.as_deref(),
            Some(raw)
        );
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "div[", "div >", ":hover", "a:nth-child(0)", "#", "div ~ p", "a,"] {
            assert!(parse(bad).is_err(), "{bad} should not parse");
        }
    }
}
