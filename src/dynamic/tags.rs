use crate::dynamic::TagExpander;
use crate::error::BoxError;
use crate::pattern::{cache, PatternSpec};
use crate::span::Document;
use thiserror::Error;

/// Tag syntax: `<Name>`.
const TAG_PATTERN: &str = r"<([A-Za-z_][A-Za-z0-9_]*)>";

/// Built-in tag resolved from [`Document::source_name`].
pub const SOURCE_DOC_TAG: &str = "SourceDocName";

#[derive(Error, Debug)]
pub enum TagError {
    #[error("unknown document tag <{0}>")]
    UnknownTag(String),
}

/// [`TagExpander`] that substitutes `<SourceDocName>` and the document's own
/// tags. Unknown tags are an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentTagExpander;

impl TagExpander for DocumentTagExpander {
    fn expand(&self, text: &str, document: &Document) -> Result<String, BoxError> {
        if !text.contains('<') {
            return Ok(text.to_string());
        }

        let re = cache::get_or_compile(&PatternSpec::regex(TAG_PATTERN, false))?;
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).expect("group 0 always participates");
            let name = &caps[1];
            let value = if name == SOURCE_DOC_TAG {
                document.source_name.as_str()
            } else {
                document
                    .tags
                    .get(name)
                    .map(String::as_str)
                    .ok_or_else(|| TagError::UnknownTag(name.to_string()))?
            };
            out.push_str(&text[last..whole.start()]);
            out.push_str(value);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}
