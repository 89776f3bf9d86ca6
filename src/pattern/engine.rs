use crate::pattern::cache;
use crate::pattern::errors::RegexError;
use crate::pattern::occurrence::{Occurrence, Selection};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// A pattern plus the flags that change how it compiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSpec {
    pub pattern: String,
    /// Match the pattern text literally (no regex metacharacters).
    pub literal: bool,
    pub ignore_case: bool,
}

impl PatternSpec {
    pub fn literal(pattern: impl Into<String>, ignore_case: bool) -> Self {
        Self {
            pattern: pattern.into(),
            literal: true,
            ignore_case,
        }
    }

    pub fn regex(pattern: impl Into<String>, ignore_case: bool) -> Self {
        Self {
            pattern: pattern.into(),
            literal: false,
            ignore_case,
        }
    }
}

/// A captured sub-span. Offsets are byte offsets into the searched input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// One match of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Byte range of the entire match
    pub start: usize,
    pub end: usize,
    pub text: String,
    /// Numbered captures; index 0 is the whole match
    pub groups: Vec<Option<Group>>,
    /// Named captures that participated in the match
    pub named: BTreeMap<String, Group>,
}

impl Match {
    /// Text of numbered capture `index`, if it participated.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups
            .get(index)
            .and_then(|g| g.as_ref())
            .map(|g| g.text.as_str())
    }
}

/// The regular-expression capability rules depend on.
///
/// Rules never talk to a regex library directly; the host injects an engine
/// through [`crate::rules::Services`].
pub trait RegexEngine: Send + Sync {
    /// Compile the pattern, reporting syntax errors.
    fn compile(&self, spec: &PatternSpec) -> Result<(), RegexError>;

    /// Find non-overlapping matches, left to right.
    fn find(
        &self,
        spec: &PatternSpec,
        input: &str,
        first_only: bool,
    ) -> Result<Vec<Match>, RegexError>;

    /// Replace the selected occurrence(s). Literal specs insert `template`
    /// verbatim; regex specs expand `$1` / `${name}` references.
    fn replace(
        &self,
        spec: &PatternSpec,
        input: &str,
        template: &str,
        occurrence: Occurrence,
    ) -> Result<String, RegexError>;
}

/// [`RegexEngine`] backed by the `regex` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdRegexEngine;

impl RegexEngine for StdRegexEngine {
    fn compile(&self, spec: &PatternSpec) -> Result<(), RegexError> {
        cache::get_or_compile(spec).map(|_| ())
    }

    fn find(
        &self,
        spec: &PatternSpec,
        input: &str,
        first_only: bool,
    ) -> Result<Vec<Match>, RegexError> {
        let re = cache::get_or_compile(spec)?;
        let iter = re.captures_iter(input).map(|caps| to_match(&re, &caps));
        Ok(if first_only {
            iter.take(1).collect()
        } else {
            iter.collect()
        })
    }

    fn replace(
        &self,
        spec: &PatternSpec,
        input: &str,
        template: &str,
        occurrence: Occurrence,
    ) -> Result<String, RegexError> {
        let re = cache::get_or_compile(spec)?;
        let all: Vec<Captures<'_>> = re.captures_iter(input).collect();
        let Some(selection) = occurrence.select(all.len()) else {
            return Ok(input.to_string());
        };

        let template = if spec.literal {
            Cow::Borrowed(template)
        } else {
            normalize_template(template)
        };

        let mut out = String::with_capacity(input.len() + template.len());
        let mut last = 0;
        for (idx, caps) in all.iter().enumerate() {
            if let Selection::Index(wanted) = selection {
                if wanted != idx {
                    continue;
                }
            }
            let whole = caps.get(0).expect("group 0 always participates");
            out.push_str(&input[last..whole.start()]);
            if spec.literal {
                out.push_str(&template);
            } else {
                caps.expand(&template, &mut out);
            }
            last = whole.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }
}

fn to_match(re: &Regex, caps: &Captures<'_>) -> Match {
    let groups: Vec<Option<Group>> = caps
        .iter()
        .map(|g| {
            g.map(|m| Group {
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
            })
        })
        .collect();

    let mut named = BTreeMap::new();
    for name in re.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            named.insert(
                name.to_string(),
                Group {
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                },
            );
        }
    }

    let whole = caps.get(0).expect("group 0 always participates");
    Match {
        start: whole.start(),
        end: whole.end(),
        text: whole.as_str().to_string(),
        groups,
        named,
    }
}

/// Rewrite `$1abc` style references to `${1}abc`.
///
/// The `regex` crate reads `$1abc` as a reference to a group named `1abc`;
/// replacement templates written for other engines expect group 1.
fn normalize_template(template: &str) -> Cow<'_, str> {
    if !template.contains('$') {
        return Cow::Borrowed(template);
    }

    let mut out = String::with_capacity(template.len() + 4);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                out.push_str("$$");
                chars.next();
            }
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                    out.push(d);
                    chars.next();
                }
                out.push('}');
            }
            _ => out.push('$'),
        }
    }
    Cow::Owned(out)
}
