use crate::error::RuleError;
use crate::persist::{ensure_u32, ByteReader, ByteWriter};
use crate::rules::{ensure_configured, Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 1;
const KIND: RuleKind = RuleKind::PadValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PadSide {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadValueConfig {
    /// Minimum length of the result, in characters
    #[serde(default)]
    pub required_size: usize,
    #[serde(default = "default_pad_char")]
    pub pad_char: char,
    #[serde(default)]
    pub side: PadSide,
}

fn default_pad_char() -> char {
    ' '
}

impl Default for PadValueConfig {
    fn default() -> Self {
        Self {
            required_size: 0,
            pad_char: default_pad_char(),
            side: PadSide::default(),
        }
    }
}

impl PadValueConfig {
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.required_size == 0 {
            return Err(RuleError::config(KIND, "required size must be positive"));
        }
        ensure_u32(KIND, "required size", self.required_size)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PadValueRule {
    config: PadValueConfig,
}

impl PadValueRule {
    pub fn new(config: PadValueConfig) -> Result<Self, RuleError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn configure(&mut self, config: PadValueConfig) -> Result<(), RuleError> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &PadValueConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        reader.read_version(KIND, VERSION)?;
        let required_size = reader.read_u32()? as usize;
        let pad_char = reader.read_char()?;
        let side = if reader.read_bool()? {
            PadSide::Left
        } else {
            PadSide::Right
        };
        Ok(Self {
            config: PadValueConfig {
                required_size,
                pad_char,
                side,
            },
        })
    }
}

impl Rule for PadValueRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        self.config.validate().is_ok()
    }

    fn apply(&self, attribute: &mut Attribute, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        ensure_configured(self)?;
        let len = attribute.value.len();
        if len >= self.config.required_size {
            return Ok(());
        }
        let padding: String = std::iter::repeat(self.config.pad_char)
            .take(self.config.required_size - len)
            .collect();
        match self.config.side {
            PadSide::Left => {
                attribute.value.insert_at(0, &padding);
            }
            PadSide::Right => attribute.value.append(&padding),
        }
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::PadValue(self.config)
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_u32(self.config.required_size as u32);
        writer.write_char(self.config.pad_char);
        writer.write_bool(self.config.side == PadSide::Left);
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
