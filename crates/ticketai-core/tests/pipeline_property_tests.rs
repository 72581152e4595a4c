mod common;

use proptest::prelude::*;
use regex::Regex;
use ticketai_core::quality::QualityEvaluator;
use ticketai_core::{extract_json, normalize_fragment, QueryPlan};

fn fragment_text() -> impl Strategy<Value = String> {
    let prefix = prop_oneof![
        Just(""),
        Just("where "),
        Just("WHERE and "),
        Just("ORDER BY "),
        Just("order   by "),
        Just("and "),
        Just("```sql\n"),
        Just("Sure: where "),
    ];
    let body = proptest::string::string_regex(
        r#"[A-Za-z0-9 _=<>!'"(),;%*/\-\n]{0,60}"#,
    )
    .unwrap();
    (prefix, body).prop_map(|(p, b)| format!("{p}{b}"))
}

fn json_body() -> impl Strategy<Value = String> {
    let key = proptest::string::string_regex("[a-z][a-zA-Z0-9]{0,8}").unwrap();
    let scalar = prop_oneof![
        any::<i32>().prop_map(|n| serde_json::json!(n)),
        any::<bool>().prop_map(|b| serde_json::json!(b)),
        proptest::string::string_regex("[A-Za-z0-9 ]{0,12}")
            .unwrap()
            .prop_map(|s| serde_json::json!(s)),
    ];
    let object = proptest::collection::btree_map(key, scalar.clone(), 0..5)
        .prop_map(|m| serde_json::Value::Object(m.into_iter().collect()));
    let array = proptest::collection::vec(scalar, 0..5).prop_map(serde_json::Value::Array);
    (prop_oneof![object, array], any::<bool>()).prop_map(|(value, pretty)| {
        if pretty {
            serde_json::to_string_pretty(&value).unwrap()
        } else {
            value.to_string()
        }
    })
}

proptest! {
    #[test]
    fn normalizer_is_idempotent(raw in fragment_text()) {
        let once = normalize_fragment(&raw);
        let twice = normalize_fragment(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn passing_fragments_have_a_safe_shape(raw in fragment_text(), normalize in any::<bool>()) {
        let fragment = if normalize { normalize_fragment(&raw) } else { raw };
        let shape = Regex::new(r"(?is)^(where |order by ).*$").unwrap();

        if let Ok(plan) = common::validate(common::TICKETS, &fragment) {
            let f = plan.fragment();
            prop_assert!(!f.contains(';'));
            prop_assert!(!f.contains("--"));
            prop_assert!(!f.contains("/*"));
            prop_assert!(f.is_empty() || shape.is_match(f), "bad shape: {f:?}");
        }
    }

    #[test]
    fn validated_views_are_registry_members(view in "[A-Za-z_]{0,24}") {
        let registry = common::registry();
        let validator = common::validator();
        match validator.validate(&QueryPlan::new(view.clone(), "")) {
            Ok(plan) => {
                prop_assert!(registry.views().any(|v| v == plan.view()));
                prop_assert!(plan.view().eq_ignore_ascii_case(view.trim()));
            }
            Err(_) => prop_assert!(!registry.contains(&view)),
        }
    }

    #[test]
    fn extraction_recovers_fenced_json(body in json_body(), tag in prop_oneof![Just(""), Just("json")]) {
        let fenced = format!("```{tag}\n{body}\n```");
        prop_assert_eq!(extract_json(&fenced), body.clone());
        prop_assert_eq!(extract_json(&body), body);
    }

    #[test]
    fn extraction_never_panics(raw in "\\PC{0,80}") {
        let out = extract_json(&raw);
        prop_assert!(out.starts_with('{') || out.starts_with('['), "output is not a JSON object or array: {}", out);
    }

    #[test]
    fn empty_fragment_fallback_tracks_row_count(rows in 0usize..100) {
        let verdict = QualityEvaluator::standard().evaluate("", rows);
        prop_assert_eq!(verdict.is_fallback, rows == 0);
    }
}
