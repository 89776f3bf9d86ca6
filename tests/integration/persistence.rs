use value_rules::persist::ByteWriter;
use value_rules::rules::{
    CaseType, ChangeCaseConfig, ClosestValueConfig, Condition, ConditionalSpec,
    InsertCharactersConfig, InsertPosition, LengthPredicate, LimitConfig, LimitMode, LimitPart,
    PadSide, PadValueConfig, RemoveCharactersConfig, ReplaceStringsConfig, TokenizerConfig,
    TranslateField, TranslateValueConfig,
};
use value_rules::{deserialize, serialize, Occurrence, RuleError, RuleKind, RuleSpec};

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

/// One fully populated spec per rule kind.
fn populated_specs() -> Vec<RuleSpec> {
    vec![
        RuleSpec::ReplaceStrings(ReplaceStringsConfig {
            replacements: vec![pair(r"(\d+)\.(\d+)", "$1,$2"), pair("file://fixes.txt", "")],
            case_sensitive: true,
            as_regex: true,
            occurrence: Occurrence::Specified(2),
        }),
        RuleSpec::Limit(LimitConfig {
            part: LimitPart::Mid { start: 2, end: 9 },
            mode: LimitMode::Remove,
            accept_shorter: false,
        }),
        RuleSpec::RemoveCharacters(RemoveCharactersConfig {
            characters: "\r\n.-".to_string(),
            remove_all: false,
            consolidate: true,
            trim_leading: true,
            trim_trailing: true,
        }),
        RuleSpec::ClosestValue(ClosestValueConfig {
            candidates: vec!["Acme".to_string(), "file://<Customer>.txt".to_string()],
            case_sensitive: true,
            force_match: true,
        }),
        RuleSpec::TranslateValue(TranslateValueConfig {
            pairs: vec![pair("Amt", "Amount"), pair("Tot", "Total")],
            case_sensitive: true,
            field: TranslateField::Type,
        }),
        RuleSpec::Tokenizer(TokenizerConfig {
            delimiter: '|',
            template: r"%2-%4 \%".to_string(),
            text_between: " / ".to_string(),
            token_count: LengthPredicate::GreaterOrEqual(4),
        }),
        RuleSpec::Conditional(ConditionalSpec {
            condition: Some(Condition::TextMatches {
                pattern: r"^\d+$".to_string(),
                is_regex: true,
                case_sensitive: false,
            }),
            invert: true,
            rule: Some(Box::new(RuleSpec::PadValue(PadValueConfig {
                required_size: 6,
                pad_char: '0',
                side: PadSide::Left,
            }))),
        }),
        RuleSpec::ChangeCase(ChangeCaseConfig {
            case: CaseType::Title,
        }),
        RuleSpec::PadValue(PadValueConfig {
            required_size: 12,
            pad_char: '*',
            side: PadSide::Right,
        }),
        RuleSpec::InsertCharacters(InsertCharactersConfig {
            characters: "-".to_string(),
            position: InsertPosition::At(3),
            length: LengthPredicate::Equal(7),
        }),
    ]
}

#[test]
fn test_every_kind_round_trips() {
    let specs = populated_specs();
    let kinds: Vec<RuleKind> = specs.iter().map(RuleSpec::kind).collect();
    assert_eq!(kinds, RuleKind::ALL.to_vec());

    for spec in specs {
        let rule = spec.build().unwrap();
        let bytes = serialize(rule.as_ref());
        assert_eq!(&bytes[..4], &rule.kind().code().to_le_bytes());

        let restored = deserialize(&bytes).unwrap();
        assert_eq!(restored.spec(), spec, "{} did not round trip", spec.kind());
        assert!(restored.is_configured());
    }
}

#[test]
fn test_counts_at_the_u32_boundary() {
    let max = u32::MAX as usize;
    let at_limit = RuleSpec::Limit(LimitConfig {
        part: LimitPart::Left(max),
        ..Default::default()
    });
    let bytes = serialize(at_limit.build().unwrap().as_ref());
    assert_eq!(deserialize(&bytes).unwrap().spec(), at_limit);

    let too_large = [
        RuleSpec::Limit(LimitConfig {
            part: LimitPart::Left(max + 2),
            ..Default::default()
        }),
        RuleSpec::Limit(LimitConfig {
            part: LimitPart::Mid {
                start: 1,
                end: max + 1,
            },
            ..Default::default()
        }),
        RuleSpec::PadValue(PadValueConfig {
            required_size: max + 1,
            ..Default::default()
        }),
        RuleSpec::InsertCharacters(InsertCharactersConfig {
            characters: "-".to_string(),
            position: InsertPosition::At(max + 1),
            length: LengthPredicate::Any,
        }),
        RuleSpec::Tokenizer(TokenizerConfig {
            template: "%1".to_string(),
            token_count: LengthPredicate::LessThan(max + 1),
            ..Default::default()
        }),
    ];
    for spec in too_large {
        let err = spec.build().unwrap_err();
        assert!(err.is_configuration(), "{} accepted an oversized value", spec.kind());
    }
}

#[test]
fn test_nested_conditional_restores_inner_rule() {
    let spec = RuleSpec::Conditional(ConditionalSpec {
        condition: Some(Condition::TagPresent {
            tag: "Rush".to_string(),
        }),
        invert: false,
        rule: Some(Box::new(RuleSpec::Conditional(ConditionalSpec {
            condition: Some(Condition::TagEquals {
                tag: "Country".to_string(),
                value: "US".to_string(),
            }),
            invert: false,
            rule: Some(Box::new(RuleSpec::ChangeCase(ChangeCaseConfig::default()))),
        }))),
    });
    let bytes = serialize(spec.build().unwrap().as_ref());
    assert_eq!(deserialize(&bytes).unwrap().spec(), spec);
}

#[test]
fn test_replace_strings_v1_replaces_all() {
    let mut writer = ByteWriter::new();
    writer.write_u32(RuleKind::ReplaceStrings.code());
    writer.write_u32(1);
    writer.write_u32(1);
    writer.write_str("a");
    writer.write_str("b");
    writer.write_bool(false);
    writer.write_bool(false);

    let rule = deserialize(&writer.into_bytes()).unwrap();
    let RuleSpec::ReplaceStrings(config) = rule.spec() else {
        panic!("expected replace-strings");
    };
    assert_eq!(config.occurrence, Occurrence::All);
    assert_eq!(config.replacements, vec![pair("a", "b")]);
}

#[test]
fn test_future_version_rejected() {
    let mut writer = ByteWriter::new();
    writer.write_u32(RuleKind::PadValue.code());
    writer.write_u32(9);
    let err = deserialize(&writer.into_bytes()).unwrap_err();
    assert!(matches!(
        err,
        RuleError::FutureFormat {
            rule: RuleKind::PadValue,
            found: 9,
            supported: 1
        }
    ));
}

#[test]
fn test_corrupt_streams_are_malformed() {
    let bytes = serialize(
        RuleSpec::ChangeCase(ChangeCaseConfig::default())
            .build()
            .unwrap()
            .as_ref(),
    );

    let mut trailing = bytes.clone();
    trailing.push(0);
    assert!(matches!(deserialize(&trailing), Err(RuleError::Malformed { .. })));

    assert!(matches!(
        deserialize(&bytes[..bytes.len() - 1]),
        Err(RuleError::Malformed { .. })
    ));
    assert!(matches!(
        deserialize(&[42, 0, 0, 0, 1, 0, 0, 0]),
        Err(RuleError::Malformed { .. })
    ));
}
