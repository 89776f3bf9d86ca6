//! End-to-end tests over the public API: rulesets loaded from TOML, list
//! files on disk, and persisted rule bytes.

mod dynamic_lists;
mod persistence;
mod rulesets;
