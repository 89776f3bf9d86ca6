use crate::error::RuleError;
use crate::persist::{ensure_u32, ByteReader, ByteWriter};
use crate::rules::{ensure_configured, LengthPredicate, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::InsertCharacters;

/// Where inserted text goes. `At` is a 0-based character position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertPosition {
    At(usize),
    End,
}

impl Default for InsertPosition {
    fn default() -> Self {
        InsertPosition::At(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InsertCharactersConfig {
    #[serde(default)]
    pub characters: String,
    #[serde(default)]
    pub position: InsertPosition,
    /// Insert only when the value length satisfies this.
    #[serde(default)]
    pub length: LengthPredicate,
}

impl InsertCharactersConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.characters.is_empty() {
            return Err(RuleError::config(KIND, "nothing to insert"));
        }
        if let InsertPosition::At(pos) = self.position {
            ensure_u32(KIND, "insert position", pos)?;
        }
        self.length.validate(KIND)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InsertCharactersRule {
    config: InsertCharactersConfig,
}

impl InsertCharactersRule {
    pub fn new(config: InsertCharactersConfig) -> Result<Self, RuleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn configure(&mut self, config: InsertCharactersConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &InsertCharactersConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        let characters = reader.read_string()?;
        let at_end = reader.read_bool()?;
        let pos = reader.read_u32()? as usize;
        let length = LengthPredicate::load(reader)?;
        Ok(Self {
            config: InsertCharactersConfig {
                characters,
                position: if at_end {
                    InsertPosition::End
                } else {
                    InsertPosition::At(pos)
                },
                length,
            },
        })
    }
}

impl Rule for InsertCharactersRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let value = &mut attribute.value;
        if !self.config.length.matches(value.len()) {
            return Ok(());
        }
        match self.config.position {
            InsertPosition::End => value.append(&self.config.characters),
            InsertPosition::At(pos) => {
                if !value.insert_at(pos, &self.config.characters) {
                    tracing::trace!(pos, len = value.len(), "insert position past end");
                }
            }
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::InsertCharacters(self.config.clone())
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_str(&self.config.characters);
        let (at_end, pos) = match self.config.position {
            InsertPosition::End => (true, 0),
            InsertPosition::At(pos) => (false, pos),
        };
        writer.write_bool(at_end);
        writer.write_u32(pos as u32);
        self.config.length.save(writer);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
