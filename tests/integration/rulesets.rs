use value_rules::config::{load_from_str, CompiledRuleSet, FailurePolicy, RuleOutcome};
use value_rules::{Attribute, Document, Services};

const INVOICE_RULES: &str = r#"
[meta]
name = "invoice cleanup"
requires = ">=0.1.0"

[[rules]]
id = "strip-prefix"
attribute = "InvoiceNumber"
[rules.rule]
type = "replace-strings"
replacements = [["^NO\\.?\\s*", ""]]
as_regex = true

[[rules]]
id = "no-spaces"
attribute = "InvoiceNumber"
[rules.rule]
type = "remove-characters"
characters = " "
remove_all = true

[[rules]]
id = "zero-pad"
attribute = "InvoiceNumber"
[rules.rule]
type = "pad-value"
required_size = 8
pad_char = "0"

[[rules]]
id = "vendor-case"
attribute = "Vendor"
[rules.rule]
type = "change-case"
case = "title"

[[rules]]
id = "iso-date"
attribute = "Date"
[rules.rule]
type = "tokenizer"
delimiter = "/"
template = '%3\-%2\-%1'
token_count = { equal = 3 }
"#;

fn invoice_attributes() -> Vec<Attribute> {
    vec![
        Attribute::new("InvoiceNumber", "NO. 12 34"),
        Attribute::new("Vendor", "acme-west corp"),
        Attribute::new("Date", "31/12/2024"),
    ]
}

#[test]
fn test_invoice_chain() {
    let set = load_from_str(INVOICE_RULES).unwrap();
    let compiled = CompiledRuleSet::compile(&set, Services::default()).unwrap();
    let mut attrs = invoice_attributes();

    let report = compiled.apply(&Document::new("scan.tif"), &mut attrs);

    assert!(report.is_success());
    assert_eq!(attrs[0].value.as_str(), "00001234");
    assert_eq!(attrs[1].value.as_str(), "Acme-West Corp");
    assert_eq!(attrs[2].value.as_str(), "2024-12-31");
    assert_eq!(report.changed(), 5);
}

#[test]
fn test_chain_is_ordered() {
    // Rules run in declaration order.
    let toml = r#"
[[rules]]
id = "pad"
[rules.rule]
type = "pad-value"
required_size = 4
pad_char = "x"

[[rules]]
id = "limit"
[rules.rule]
type = "limit"
part = { right = 2 }
"#;
    let set = load_from_str(toml).unwrap();
    let compiled = CompiledRuleSet::compile(&set, Services::default()).unwrap();
    let mut attrs = vec![Attribute::new("Code", "7")];
    compiled.apply(&Document::default(), &mut attrs);
    assert_eq!(attrs[0].value.as_str(), "x7");
}

#[test]
fn test_conditional_on_document_tag() {
    let toml = r#"
[[rules]]
id = "us-amounts"
attribute = "Total"
[rules.rule]
type = "conditional"
[rules.rule.condition]
kind = "tag-equals"
tag = "Country"
value = "DE"
[rules.rule.rule]
type = "replace-strings"
replacements = [[",", "."]]
"#;
    let set = load_from_str(toml).unwrap();
    let compiled = CompiledRuleSet::compile(&set, Services::default()).unwrap();

    let mut german = vec![Attribute::new("Total", "12,50")];
    compiled.apply(&Document::new("a").with_tag("Country", "DE"), &mut german);
    assert_eq!(german[0].value.as_str(), "12.50");

    let mut other = vec![Attribute::new("Total", "12,50")];
    compiled.apply(&Document::new("b").with_tag("Country", "FR"), &mut other);
    assert_eq!(other[0].value.as_str(), "12,50");
}

#[test]
fn test_missing_target_is_skipped() {
    let set = load_from_str(INVOICE_RULES).unwrap();
    let compiled = CompiledRuleSet::compile(&set, Services::default()).unwrap();
    let mut attrs = vec![Attribute::new("Vendor", "globex")];

    let report = compiled.apply(&Document::default(), &mut attrs);

    assert_eq!(report.failed(), 0);
    assert_eq!(report.skipped(), 4);
    assert!(report.entries.iter().any(|e| e.rule_id == "vendor-case"
        && matches!(e.result, Ok(RuleOutcome::Changed { .. }))));
}

#[test]
fn test_abort_policy_stops_at_failure() {
    let toml = r#"
[meta]
on_error = "abort"

[[rules]]
id = "lookup"
[rules.rule]
type = "closest-value"
candidates = ["file://does-not-exist.txt"]

[[rules]]
id = "upper"
[rules.rule]
type = "change-case"
"#;
    let set = load_from_str(toml).unwrap();
    assert_eq!(set.meta.on_error, FailurePolicy::Abort);
    let compiled = CompiledRuleSet::compile(&set, Services::default()).unwrap();
    let mut attrs = vec![Attribute::new("Vendor", "acme")];

    let report = compiled.apply(&Document::default(), &mut attrs);

    assert!(report.aborted);
    assert_eq!(report.failed(), 1);
    assert_eq!(attrs[0].value.as_str(), "acme");
}

#[test]
fn test_validation_reports_every_issue() {
    let toml = r#"
[[rules]]
id = "dup"
[rules.rule]
type = "limit"
part = { mid = { start = 5, end = 3 } }

[[rules]]
id = "dup"
[rules.rule]
type = "pad-value"
"#;
    let err = load_from_str(toml).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("dup"), "{message}");
    assert!(message.contains("limit"), "{message}");
    assert!(message.contains("pad-value"), "{message}");
}

#[test]
fn test_unsatisfied_requirement_rejected() {
    let toml = r#"
[meta]
requires = ">=99.0.0"

[[rules]]
id = "upper"
[rules.rule]
type = "change-case"
"#;
    let err = load_from_str(toml).unwrap_err();
    assert!(err.to_string().contains("99.0.0"));
}
