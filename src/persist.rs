//! Versioned binary form of rule configurations.
//!
//! All integers are little-endian. Strings are a `u32` byte length followed by
//! UTF-8; booleans are a single byte; lists are a `u32` count followed by the
//! items. Every rule body starts with its own `u32` version tag.

use crate::error::RuleError;
use crate::rules::RuleKind;

/// Deepest rule nesting a stream may carry (conditionals wrapping rules).
pub const MAX_NESTING: usize = 32;

/// Reject counts and positions the `u32` fields of the binary form cannot hold.
pub(crate) fn ensure_u32(rule: RuleKind, field: &str, value: usize) -> Result<(), RuleError> {
    if u32::try_from(value).is_err() {
        return Err(RuleError::config(
            rule,
            format!("{field} {value} exceeds the largest storable value {}", u32::MAX),
        ));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_char(&mut self, value: char) {
        self.write_u32(u32::from(value));
    }

    pub fn write_strings(&mut self, values: &[String]) {
        self.write_len(values.len());
        for value in values {
            self.write_str(value);
        }
    }

    fn write_len(&mut self, len: usize) {
        // Rule configurations never approach 4 GiB.
        self.write_u32(len as u32);
    }
}

#[derive(Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RuleError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                RuleError::malformed(format!(
                    "needed {n} bytes at offset {} but only {} remain",
                    self.pos,
                    self.data.len() - self.pos
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u32(&mut self) -> Result<u32, RuleError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_i32(&mut self) -> Result<i32, RuleError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bool(&mut self) -> Result<bool, RuleError> {
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(RuleError::malformed(format!("invalid boolean byte {other}"))),
        }
    }

    pub fn read_string(&mut self) -> Result<String, RuleError> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|err| RuleError::malformed(format!("string is not UTF-8: {err}")))
    }

    pub fn read_char(&mut self) -> Result<char, RuleError> {
        let raw = self.read_u32()?;
        char::from_u32(raw)
            .ok_or_else(|| RuleError::malformed(format!("invalid character code {raw:#x}")))
    }

    pub fn read_strings(&mut self) -> Result<Vec<String>, RuleError> {
        let count = self.read_u32()? as usize;
        // Cap the pre-allocation; a corrupt count must not reserve gigabytes.
        let mut values = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            values.push(self.read_string()?);
        }
        Ok(values)
    }

    /// Enter one level of rule nesting; fails past [`MAX_NESTING`].
    pub(crate) fn descend(&mut self) -> Result<(), RuleError> {
        if self.depth >= MAX_NESTING {
            return Err(RuleError::malformed(format!(
                "rules nested deeper than {MAX_NESTING} levels at offset {}",
                self.pos
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Read a rule's version tag, rejecting versions from the future.
    pub fn read_version(&mut self, rule: RuleKind, supported: u32) -> Result<u32, RuleError> {
        let found = self.read_u32()?;
        if found > supported {
            return Err(RuleError::FutureFormat {
                rule,
                found,
                supported,
            });
        }
        if found == 0 {
            return Err(RuleError::malformed(format!(
                "{rule} data carries version 0"
            )));
        }
        Ok(found)
    }
}
