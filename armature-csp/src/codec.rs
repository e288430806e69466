//! Header value codec
//!
//! Grammar: `section (';' section)*` where `section = name (' ' token)*`.
//! Rendering emits sections joined by `"; "`; parsing collapses whitespace
//! runs, skips unknown directive names and valueless sections.

use crate::directive::Directive;
use crate::policy::DirectiveState;
use crate::source::NONE;

/// Render directive states into a header value.
///
/// Unset directives are omitted; an empty policy renders to `""`.
pub fn render<'a, I>(directives: I) -> String
where
    I: IntoIterator<Item = (Directive, &'a DirectiveState)>,
{
    let mut sections = Vec::new();

    for (directive, state) in directives {
        match state {
            DirectiveState::Unset => {}
            DirectiveState::None => sections.push(format!("{} {}", directive, NONE)),
            DirectiveState::Allow(tokens) => {
                let mut section = String::from(directive.name());
                for token in tokens {
                    section.push(' ');
                    section.push_str(token);
                }
                sections.push(section);
            }
        }
    }

    sections.join("; ")
}

/// Sources listed for one directive in a parsed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedSources<'a> {
    /// The section contained `'none'`
    None,
    /// Tokens in header order
    Tokens(Vec<&'a str>),
}

/// One recognized `directive sources...` section of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSection<'a> {
    pub directive: Directive,
    pub sources: ParsedSources<'a>,
}

/// Split a header value into recognized sections, in header order.
///
/// Never fails: unknown directives and sections without sources are skipped.
/// The first `'none'` in a section wins over every other token of it.
pub fn parse(header_value: &str) -> Vec<ParsedSection<'_>> {
    header_value
        .split(';')
        .filter_map(|section| {
            let mut parts = section.split_whitespace();
            let directive = Directive::from_name(parts.next()?)?;

            let mut tokens = Vec::new();
            for token in parts {
                if token == NONE {
                    return Some(ParsedSection {
                        directive,
                        sources: ParsedSources::None,
                    });
                }
                tokens.push(token);
            }

            if tokens.is_empty() {
                return None;
            }
            Some(ParsedSection {
                directive,
                sources: ParsedSources::Tokens(tokens),
            })
        })
        .collect()
}
