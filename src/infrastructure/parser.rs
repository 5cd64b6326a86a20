//! Lightweight structure parser for Java-like sources.
//!
//! Not a real parser: it blanks out comments and literals, tracks brace
//! depth and recognizes top-level type declarations plus the methods declared
//! directly in their bodies. Nested types and anonymous classes are ignored.

use regex::Regex;
use tracing::{debug, trace};

use crate::domain::Entry;
use crate::infrastructure::traits::SourceParser;

const TYPE_KEYWORDS: [&str; 4] = ["class", "interface", "enum", "record"];

const NOT_METHOD_NAMES: [&str; 12] = [
    "if", "for", "while", "switch", "catch", "synchronized", "return", "new", "this", "super",
    "throw", "try",
];

/// Top-level type found in a file: name, kind keyword, shallow body text.
#[derive(Debug)]
struct TypeBody {
    name: String,
    keyword: String,
    body: String,
}

/// Counts top-level classes and their methods.
#[derive(Debug)]
pub struct JavaLikeParser {
    type_decl: Regex,
    call_like: Regex,
}

impl Default for JavaLikeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaLikeParser {
    pub fn new() -> Self {
        Self {
            type_decl: Regex::new(r"(^|[^\w$@])@?(class|interface|enum|record)\s+([A-Za-z_$][\w$]*)")
                .expect("type declaration pattern is valid"),
            call_like: Regex::new(r"([A-Za-z_$][\w$]*)\s*\(").expect("call pattern is valid"),
        }
    }

    /// Split sanitized source into top-level type bodies. Text nested deeper
    /// than the type body is collapsed to `{}`.
    fn top_level_types(&self, source: &str) -> Option<Vec<TypeBody>> {
        let mut types = Vec::new();
        let mut depth: usize = 0;
        let mut current: Option<TypeBody> = None;
        let mut header_start = 0;

        for (i, c) in source.char_indices() {
            match c {
                '{' => {
                    if depth == 0 {
                        current = self
                            .last_type_decl(&source[header_start..i])
                            .map(|(keyword, name)| TypeBody {
                                name,
                                keyword,
                                body: String::new(),
                            });
                    } else if depth == 1 {
                        if let Some(t) = current.as_mut() {
                            t.body.push_str("{}");
                        }
                    }
                    depth += 1;
                }
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        types.extend(current.take());
                        header_start = i + 1;
                    }
                }
                ';' if depth == 0 => header_start = i + 1,
                _ if depth == 1 => {
                    if let Some(t) = current.as_mut() {
                        t.body.push(c);
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            trace!("unbalanced braces, depth {} at end of input", depth);
            return None;
        }
        Some(types)
    }

    fn last_type_decl(&self, header: &str) -> Option<(String, String)> {
        self.type_decl
            .captures_iter(header)
            .last()
            .map(|caps| (caps[2].to_string(), caps[3].to_string()))
    }

    /// Names of the methods declared in a shallow type body.
    fn methods(&self, ty: &TypeBody) -> Vec<String> {
        let body = if ty.keyword == "enum" {
            // constants come first and look like calls
            ty.body.find(';').map_or("", |pos| &ty.body[pos + 1..])
        } else {
            ty.body.as_str()
        };

        let mut names = Vec::new();
        for caps in self.call_like.captures_iter(body) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if NOT_METHOD_NAMES.contains(&name.as_str()) || TYPE_KEYWORDS.contains(&name.as_str())
            {
                continue;
            }
            if !Self::preceded_by_declaration(&body[..name.start()]) {
                continue;
            }
            let Some(close) = Self::matching_paren(body, whole.end() - 1) else {
                continue;
            };
            let rest = body[close + 1..].trim_start();
            if rest.starts_with('{')
                || rest.starts_with(';')
                || rest.starts_with("throws")
                || rest.starts_with("default")
            {
                names.push(name.as_str().to_string());
            }
        }
        names
    }

    /// A declaration name follows a type, a modifier, an annotation, `>` or
    /// `]`, or starts a member; it never follows an operator, a dot or `new`.
    fn preceded_by_declaration(before: &str) -> bool {
        let trimmed = before.trim_end();
        match trimmed.chars().last() {
            None => true,
            Some(';' | '}' | '>' | ']') => true,
            Some(')') => trimmed
                .rfind('(')
                .and_then(|open| Self::trailing_word(&trimmed[..open]))
                .is_some_and(|(word_start, _)| trimmed[..word_start].ends_with('@')),
            Some(_) => match Self::trailing_word(trimmed) {
                Some((word_start, word)) => word != "new" && !trimmed[..word_start].ends_with('@'),
                None => false,
            },
        }
    }

    /// Identifier at the end of `text` (after trailing whitespace) and its start offset.
    fn trailing_word(text: &str) -> Option<(usize, &str)> {
        let trimmed = text.trim_end();
        let start = trimmed
            .rfind(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '$'))
            .map_or(0, |p| p + 1);
        let word = &trimmed[start..];
        (!word.is_empty()).then_some((start, word))
    }

    fn matching_paren(text: &str, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, c) in text[open..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + i);
                    }
                }
                _ => {}
            }
        }
        None
    }
}

impl SourceParser for JavaLikeParser {
    fn parse(&self, file_name: &str, contents: &str) -> Option<Entry> {
        let sanitized = strip_comments_and_literals(contents);
        let Some(types) = self.top_level_types(&sanitized) else {
            debug!("cannot parse {}: unbalanced braces", file_name);
            return None;
        };

        let classes = types
            .iter()
            .map(|ty| {
                let functions = self.methods(ty).into_iter().map(Entry::function).collect();
                Entry::class(ty.name.clone(), functions)
            })
            .collect();
        Some(Entry::source_file(file_name, classes))
    }
}

/// Replace comments, string, text block and char literals by a single space.
fn strip_comments_and_literals(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
                out.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            '"' => {
                let mut rest = chars.clone();
                if rest.next() == Some('"') && rest.next() == Some('"') {
                    chars.next();
                    chars.next();
                    skip_text_block(&mut chars);
                } else {
                    skip_quoted(&mut chars, '"');
                }
                out.push(' ');
            }
            '\'' => {
                skip_quoted(&mut chars, '\'');
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn skip_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) {
    while let Some(n) = chars.next() {
        match n {
            '\\' => {
                chars.next();
            }
            '\n' => break,
            _ if n == quote => break,
            _ => {}
        }
    }
}

fn skip_text_block(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    let mut quotes = 0;
    while let Some(n) = chars.next() {
        match n {
            '\\' => {
                chars.next();
                quotes = 0;
            }
            '"' => {
                quotes += 1;
                if quotes == 3 {
                    break;
                }
            }
            _ => quotes = 0,
        }
    }
}
