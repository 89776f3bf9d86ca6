use std::fs;
use std::sync::Arc;
use value_rules::config::{load_from_str, CompiledRuleSet};
use value_rules::rules::{ClosestValueConfig, ClosestValueRule, Rule};
use value_rules::{Attribute, Document, FsListLoader, RuleError, Services};

fn services_in(dir: &std::path::Path) -> Services {
    Services::default().with_list_loader(Arc::new(FsListLoader::with_base_dir(dir)))
}

#[test]
fn test_replace_pairs_from_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("ocr-fixes.txt"),
        "// common misreads\nO;0\n\nl;1\n",
    )
    .unwrap();
    let set = load_from_str(
        r#"
[[rules]]
id = "ocr"
[rules.rule]
type = "replace-strings"
replacements = [["file://ocr-fixes.txt", ""]]
case_sensitive = true
"#,
    )
    .unwrap();
    let compiled = CompiledRuleSet::compile(&set, services_in(dir.path())).unwrap();
    let mut attrs = vec![Attribute::new("Amount", "lO5O")];

    let report = compiled.apply(&Document::default(), &mut attrs);

    assert!(report.is_success());
    assert_eq!(attrs[0].value.as_str(), "1050");
}

#[test]
fn test_ruleset_prefix_override() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("states.txt"), "NY;New York\nCA;California\n").unwrap();
    let set = load_from_str(
        r#"
[meta]
file_prefix = "list:"

[[rules]]
id = "states"
[rules.rule]
type = "translate-value"
pairs = [["list:states.txt", ""]]
"#,
    )
    .unwrap();
    let compiled = CompiledRuleSet::compile(&set, services_in(dir.path())).unwrap();
    let mut attrs = vec![Attribute::new("State", "ca")];

    compiled.apply(&Document::default(), &mut attrs);

    assert_eq!(attrs[0].value.as_str(), "California");
}

#[test]
fn test_list_reloaded_after_change() {
    let dir = tempfile::tempdir().unwrap();
    let list = dir.path().join("vendors.txt");
    fs::write(&list, "Acme\n").unwrap();
    let rule = ClosestValueRule::new(ClosestValueConfig {
        candidates: vec!["file://vendors.txt".to_string()],
        ..Default::default()
    })
    .unwrap();
    let services = services_in(dir.path());
    let doc = Document::default();

    let mut first = Attribute::new("Vendor", "acme");
    rule.apply(&mut first, &services.context(&doc)).unwrap();
    assert_eq!(first.value.as_str(), "Acme");

    fs::write(&list, "Globex Corporation\n").unwrap();
    let mut second = Attribute::new("Vendor", "globex corp");
    rule.apply(&mut second, &services.context(&doc)).unwrap();
    assert_eq!(second.value.as_str(), "Globex Corporation");
}

#[test]
fn test_descriptor_uses_document_tags() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("acme.txt"), "Widget\nGadget\n").unwrap();
    let rule = ClosestValueRule::new(ClosestValueConfig {
        candidates: vec!["file://<Customer>.txt".to_string()],
        ..Default::default()
    })
    .unwrap();
    let services = services_in(dir.path());

    let tagged = Document::new("po.tif").with_tag("Customer", "acme");
    let mut attr = Attribute::new("Product", "widgct");
    rule.apply(&mut attr, &services.context(&tagged)).unwrap();
    assert_eq!(attr.value.as_str(), "Widget");

    let untagged = Document::new("po.tif");
    let mut attr = Attribute::new("Product", "widgct");
    let err = rule.apply(&mut attr, &services.context(&untagged)).unwrap_err();
    assert!(matches!(err, RuleError::Dependency { .. }));
    assert_eq!(attr.value.as_str(), "widgct");
}
