//! CSS Selectors
//!
//! Parses the selector subset used for CSS inlining and attribute overrides:
//! type, universal, `#id`, `.class` and attribute selectors joined by the
//! descendant, child, adjacent and general sibling combinators. Pseudo
//! classes and pseudo elements are rejected since they cannot be resolved
//! against a static document.

use crate::CssError;

/// Selector specificity (a, b, c)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl std::ops::Add for Specificity {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0, self.1 + rhs.1, self.2 + rhs.2)
    }
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Contains(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (Some(matcher), Some(value)) = (&self.matcher, value) else {
            return self.matcher.is_none() && value.is_some();
        };

        let fold = |s: &str| {
            if self.case_insensitive {
                s.to_lowercase()
            } else {
                s.to_string()
            }
        };
        let value = fold(value);

        match matcher {
            AttributeMatcher::Exact(expected) => value == fold(expected),
            AttributeMatcher::Contains(expected) => {
                let expected = fold(expected);
                value.split_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                value == expected || value.starts_with(&format!("{}-", expected))
            }
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && value.starts_with(&fold(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && value.ends_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && value.contains(&fold(expected)),
        }
    }
}

/// Simple selectors that all apply to one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundSelector {
    /// Tag name, `None` for `*` or when omitted
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeSelector>,
}

impl CompoundSelector {
    pub fn specificity(&self) -> Specificity {
        Specificity(
            self.id.is_some() as u32,
            (self.classes.len() + self.attributes.len()) as u32,
            self.tag.is_some() as u32,
        )
    }

    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    pub fn matches<E: MatchElement>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !element.local_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if element.attr("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.is_empty() {
            let class_attr = element.attr("class").unwrap_or_default();
            let present: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }

        self.attributes
            .iter()
            .all(|a| a.matches(element.attr(&a.name).as_deref()))
    }
}

/// Relationship between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
    /// `a + b`
    NextSibling,
    /// `a ~ b`
    SubsequentSibling,
}

/// Compound selectors joined by combinators, stored right to left
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexSelector {
    /// Subject compound (the rightmost one)
    pub subject: CompoundSelector,
    /// Remaining compounds, each with the combinator linking it to the one on its right
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
    pub text: String,
}

impl ComplexSelector {
    pub fn specificity(&self) -> Specificity {
        self.ancestors
            .iter()
            .fold(self.subject.specificity(), |acc, (_, c)| acc + c.specificity())
    }

    pub fn matches<E: MatchElement>(&self, element: &E) -> bool {
        self.subject.matches(element) && Self::match_from(&self.ancestors, element)
    }

    fn match_from<E: MatchElement>(rest: &[(Combinator, CompoundSelector)], element: &E) -> bool {
        let Some(((combinator, compound), rest)) = rest.split_first() else {
            return true;
        };

        match combinator {
            Combinator::Child => element
                .parent_element()
                .is_some_and(|p| compound.matches(&p) && Self::match_from(rest, &p)),
            Combinator::NextSibling => element
                .prev_sibling_element()
                .is_some_and(|s| compound.matches(&s) && Self::match_from(rest, &s)),
            Combinator::Descendant => {
                let mut current = element.parent_element();
                while let Some(ancestor) = current {
                    if compound.matches(&ancestor) && Self::match_from(rest, &ancestor) {
                        return true;
                    }
                    current = ancestor.parent_element();
                }
                false
            }
            Combinator::SubsequentSibling => {
                let mut current = element.prev_sibling_element();
                while let Some(sibling) = current {
                    if compound.matches(&sibling) && Self::match_from(rest, &sibling) {
                        return true;
                    }
                    current = sibling.prev_sibling_element();
                }
                false
            }
        }
    }
}

/// Comma separated selector group
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Parse a selector group
    pub fn parse(input: &str) -> Result<Self, CssError> {
        let selectors = split_top_level(input)
            .into_iter()
            .map(|part| parse_complex(part.trim(), input))
            .collect::<Result<Vec<_>, _>>()?;

        if selectors.is_empty() {
            return Err(invalid(input, "empty selector"));
        }

        Ok(Self(selectors))
    }

    /// Highest specificity among the selectors matching `element`
    pub fn match_specificity<E: MatchElement>(&self, element: &E) -> Option<Specificity> {
        self.0
            .iter()
            .filter(|s| s.matches(element))
            .map(ComplexSelector::specificity)
            .max()
    }

    pub fn matches<E: MatchElement>(&self, element: &E) -> bool {
        self.0.iter().any(|s| s.matches(element))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ComplexSelector> {
        self.0.iter()
    }
}

/// Element view needed for selector matching
pub trait MatchElement: Sized {
    fn local_name(&self) -> String;
    fn attr(&self, name: &str) -> Option<String>;
    fn parent_element(&self) -> Option<Self>;
    fn prev_sibling_element(&self) -> Option<Self>;
}

fn invalid(selector: &str, message: &str) -> CssError {
    CssError::InvalidSelector {
        selector: selector.to_string(),
        message: message.to_string(),
    }
}

/// Split on commas outside of brackets and quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '(') => depth += 1,
            (None, ']' | ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Cursor<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable() }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn ident(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.chars.next();
                if let Some(escaped) = self.chars.next() {
                    out.push(escaped);
                }
            } else if is_ident_char(c) {
                out.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        out
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }
}

fn parse_complex(text: &str, whole: &str) -> Result<ComplexSelector, CssError> {
    let mut cursor = Cursor::new(text);
    // Left to right: compound, then (combinator, compound) pairs
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();

    loop {
        let Some(compound) = parse_compound(&mut cursor, whole)? else {
            return Err(invalid(whole, "expected a selector"));
        };
        compounds.push(compound);

        let had_space = cursor.skip_whitespace();
        let combinator = match cursor.peek() {
            None => break,
            Some('>') => Combinator::Child,
            Some('+') => Combinator::NextSibling,
            Some('~') => Combinator::SubsequentSibling,
            Some(_) if had_space => {
                combinators.push(Combinator::Descendant);
                continue;
            }
            Some(c) => return Err(invalid(whole, &format!("unexpected '{}'", c))),
        };
        cursor.chars.next();
        cursor.skip_whitespace();
        combinators.push(combinator);
    }

    let subject = compounds.pop().unwrap_or_default();
    let ancestors = combinators.into_iter().rev().zip(compounds.into_iter().rev()).collect();

    Ok(ComplexSelector {
        subject,
        ancestors,
        text: text.to_string(),
    })
}

/// `None` when no simple selector is present at the cursor
fn parse_compound(cursor: &mut Cursor<'_>, whole: &str) -> Result<Option<CompoundSelector>, CssError> {
    let mut compound = CompoundSelector::default();
    let mut universal = false;

    match cursor.peek() {
        Some('*') => {
            cursor.chars.next();
            universal = true;
        }
        Some(c) if is_ident_char(c) => compound.tag = Some(cursor.ident().to_ascii_lowercase()),
        _ => {}
    }

    while let Some(c) = cursor.peek() {
        match c {
            '#' => {
                cursor.chars.next();
                let id = cursor.ident();
                if id.is_empty() {
                    return Err(invalid(whole, "empty id selector"));
                }
                compound.id = Some(id);
            }
            '.' => {
                cursor.chars.next();
                let class = cursor.ident();
                if class.is_empty() {
                    return Err(invalid(whole, "empty class selector"));
                }
                compound.classes.push(class);
            }
            '[' => {
                cursor.chars.next();
                compound.attributes.push(parse_attribute(cursor, whole)?);
            }
            ':' => return Err(invalid(whole, "pseudo selectors are not supported")),
            _ => break,
        }
    }

    if universal || !compound.is_empty() {
        Ok(Some(compound))
    } else {
        Ok(None)
    }
}

fn parse_attribute(cursor: &mut Cursor<'_>, whole: &str) -> Result<AttributeSelector, CssError> {
    cursor.skip_whitespace();
    let name = cursor.ident();
    if name.is_empty() {
        return Err(invalid(whole, "empty attribute name"));
    }
    cursor.skip_whitespace();

    let op = match cursor.peek() {
        Some(']') => {
            cursor.chars.next();
            return Ok(AttributeSelector { name, matcher: None, case_insensitive: false });
        }
        Some('=') => None,
        Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
            cursor.chars.next();
            Some(c)
        }
        _ => return Err(invalid(whole, "malformed attribute selector")),
    };

    if cursor.chars.next() != Some('=') {
        return Err(invalid(whole, "expected '=' in attribute selector"));
    }
    cursor.skip_whitespace();

    let value = match cursor.peek() {
        Some(q @ ('"' | '\'')) => {
            cursor.chars.next();
            let mut value = String::new();
            loop {
                match cursor.chars.next() {
                    Some(c) if c == q => break,
                    Some(c) => value.push(c),
                    None => return Err(invalid(whole, "unterminated string")),
                }
            }
            value
        }
        _ => cursor.ident(),
    };

    cursor.skip_whitespace();
    let mut case_insensitive = false;
    if matches!(cursor.peek(), Some('i' | 'I')) {
        cursor.chars.next();
        case_insensitive = true;
        cursor.skip_whitespace();
    }

    if cursor.chars.next() != Some(']') {
        return Err(invalid(whole, "expected ']'"));
    }

    let matcher = match op {
        None => AttributeMatcher::Exact(value),
        Some('~') => AttributeMatcher::Contains(value),
        Some('|') => AttributeMatcher::DashMatch(value),
        Some('^') => AttributeMatcher::Prefix(value),
        Some('$') => AttributeMatcher::Suffix(value),
        _ => AttributeMatcher::Substring(value),
    };

    Ok(AttributeSelector {
        name,
        matcher: Some(matcher),
        case_insensitive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal tree for matching tests: (tag, attrs, parent index)
    #[derive(Clone, Copy)]
    struct Node<'a> {
        tree: &'a [(&'a str, &'a [(&'a str, &'a str)], Option<usize>)],
        index: usize,
    }

    impl MatchElement for Node<'_> {
        fn local_name(&self) -> String {
            self.tree[self.index].0.to_string()
        }

        fn attr(&self, name: &str) -> Option<String> {
            self.tree[self.index]
                .1
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }

        fn parent_element(&self) -> Option<Self> {
            self.tree[self.index].2.map(|index| Node { tree: self.tree, index })
        }

        fn prev_sibling_element(&self) -> Option<Self> {
            let parent = self.tree[self.index].2;
            (0..self.index)
                .rev()
                .find(|i| self.tree[*i].2 == parent)
                .map(|index| Node { tree: self.tree, index })
        }
    }

    const TREE: &[(&str, &[(&str, &str)], Option<usize>)] = &[
        ("div", &[("class", "wrapper main")], None),
        ("p", &[("id", "first")], Some(0)),
        ("span", &[("class", "note"), ("data-kind", "warn-soft")], Some(1)),
        ("p", &[("class", "second")], Some(0)),
    ];

    fn node(index: usize) -> Node<'static> {
        Node { tree: TREE, index }
    }

    #[test]
    fn test_specificity() {
        let list = SelectorList::parse("div#a.b[c] span").unwrap();
        assert_eq!(list.0[0].specificity(), Specificity(1, 2, 2));

        let list = SelectorList::parse("*").unwrap();
        assert_eq!(list.0[0].specificity(), Specificity(0, 0, 0));
    }

    #[test]
    fn test_selector_group() {
        let list = SelectorList::parse("p, .note ,div > p").unwrap();
        assert_eq!(list.0.len(), 3);
        assert_eq!(list.0[1].text, ".note");
    }

    #[test]
    fn test_descendant_and_child() {
        let list = SelectorList::parse(".wrapper span").unwrap();
        assert!(list.matches(&node(2)));

        let list = SelectorList::parse(".wrapper > span").unwrap();
        assert!(!list.matches(&node(2)));

        let list = SelectorList::parse("div.main > p#first > span.note").unwrap();
        assert!(list.matches(&node(2)));
    }

    #[test]
    fn test_sibling_combinators() {
        assert!(SelectorList::parse("#first + p").unwrap().matches(&node(3)));
        assert!(SelectorList::parse("p ~ .second").unwrap().matches(&node(3)));
        assert!(!SelectorList::parse(".second + p").unwrap().matches(&node(1)));
    }

    #[test]
    fn test_attribute_operators() {
        assert!(SelectorList::parse("[data-kind|=warn]").unwrap().matches(&node(2)));
        assert!(SelectorList::parse("[data-kind^='warn']").unwrap().matches(&node(2)));
        assert!(SelectorList::parse("[data-kind$=soft]").unwrap().matches(&node(2)));
        assert!(SelectorList::parse("[data-kind*=\"n-s\"]").unwrap().matches(&node(2)));
        assert!(SelectorList::parse("[data-kind=WARN-SOFT i]").unwrap().matches(&node(2)));
        assert!(!SelectorList::parse("[data-kind=WARN-SOFT]").unwrap().matches(&node(2)));
        assert!(SelectorList::parse("[class~=main]").unwrap().matches(&node(0)));
    }

    #[test]
    fn test_match_specificity_picks_highest() {
        let list = SelectorList::parse("span, .wrapper .note").unwrap();
        assert_eq!(list.match_specificity(&node(2)), Some(Specificity(0, 2, 0)));
        assert_eq!(list.match_specificity(&node(1)), None);
    }

    #[test]
    fn test_rejects_unsupported() {
        assert!(SelectorList::parse("a:hover").is_err());
        assert!(SelectorList::parse("p::before").is_err());
        assert!(SelectorList::parse("").is_err());
        assert!(SelectorList::parse("div >").is_err());
        assert!(SelectorList::parse("[href").is_err());
    }

    #[test]
    fn test_attribute_selector_exact() {
        let sel = AttributeSelector {
            name: "type".to_string(),
            matcher: Some(AttributeMatcher::Exact("text".to_string())),
            case_insensitive: false,
        };

        assert!(sel.matches(Some("text")));
        assert!(!sel.matches(Some("TEXT")));
        assert!(!sel.matches(None));
    }
}
