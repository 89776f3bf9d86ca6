use crate::error::RuleError;
use crate::persist::{ByteReader, ByteWriter};
use crate::rules::{Rule, RuleContext, RuleKind, RuleSpec};
use crate::span::Attribute;
use serde::{Deserialize, Serialize};

const VERSION: u32 = 2;
const KIND: RuleKind = RuleKind::ChangeCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseType {
    #[default]
    Upper,
    Lower,
    /// First letter of every word upper case, the rest lower case.
    Title,
}

impl CaseType {
    pub fn code(self) -> u32 {
        match self {
            CaseType::Upper => 1,
            CaseType::Lower => 2,
            CaseType::Title => 3,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(CaseType::Upper),
            2 => Some(CaseType::Lower),
            3 => Some(CaseType::Title),
            _ => None,
        }
    }

    pub fn convert(self, text: &str) -> String {
        match self {
            CaseType::Upper => text.to_uppercase(),
            CaseType::Lower => text.to_lowercase(),
            CaseType::Title => {
                let mut out = String::with_capacity(text.len());
                let mut word_start = true;
                for c in text.chars() {
                    if word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    word_start = !c.is_alphanumeric();
                }
                out
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeCaseConfig {
    #[serde(default)]
    pub case: CaseType,
}

/// Version 1 data holds a single word that is both the version tag and the
/// case code. Only the value `1` is known to occur.
fn migrate_v1(tag: u32) -> Result<CaseType, RuleError> {
    CaseType::from_code(tag)
        .ok_or_else(|| RuleError::malformed(format!("unknown legacy case code {tag}")))
}

#[derive(Debug, Clone, Default)]
pub struct ChangeCaseRule {
    config: ChangeCaseConfig,
}

impl ChangeCaseRule {
    pub fn new(config: ChangeCaseConfig) -> Self {
        Self { config }
    }

    pub fn configure(&mut self, config: ChangeCaseConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &ChangeCaseConfig {
        &self.config
    }

    pub fn load(reader: &mut ByteReader<'_>) -> Result<Self, RuleError> {
        let version = reader.read_version(KIND, VERSION)?;
        let case = if version == 1 {
            migrate_v1(version)?
        } else {
            let code = reader.read_u32()?;
            CaseType::from_code(code)
                .ok_or_else(|| RuleError::malformed(format!("unknown case code {code}")))?
        };
        Ok(Self::new(ChangeCaseConfig { case }))
    }
}

impl Rule for ChangeCaseRule {
    fn kind(&self) -> RuleKind {
        KIND
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn apply(&self, attribute: &mut Attribute, _ctx: &RuleContext<'_>) -> Result<(), RuleError> {
        let converted = self.config.case.convert(attribute.value.as_str());
        attribute.value.set(converted);
        Ok(())
    }

    fn spec(&self) -> RuleSpec {
        RuleSpec::ChangeCase(self.config)
    }

    fn save(&self, writer: &mut ByteWriter) {
        writer.write_u32(VERSION);
        writer.write_u32(self.config.case.code());
    }

    fn clone_box(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }
}
