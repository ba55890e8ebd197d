use super::Val;

#[test]
fn test_display_scalars_and_containers() {
    assert_eq!(Val::Int(42).to_string(), "42");
    assert_eq!(Val::Float(1.5).to_string(), "1.5");
    assert_eq!(Val::Nil.to_string(), "nil");
    assert_eq!(Val::tuple([Val::Int(1), Val::Int(2)]).to_string(), "(1, 2)");
    assert_eq!(Val::tuple([Val::Int(1)]).to_string(), "(1,)");
    assert_eq!(Val::list([Val::str("a"), Val::Bool(true)]).to_string(), "[\"a\", true]");
    assert_eq!(Val::Range(0, 3).to_string(), "0..3");
}

#[test]
fn test_equality_is_structural() {
    assert_eq!(Val::tuple([Val::Int(1), Val::str("x")]), Val::tuple([Val::Int(1), Val::str("x")]));
    assert_ne!(Val::tuple([Val::Int(1)]), Val::list([Val::Int(1)]));
    assert_ne!(Val::Int(1), Val::Float(1.0));
    assert_eq!(Val::Float(f64::NAN), Val::Float(f64::NAN));
}

#[test]
fn test_truthiness() {
    assert!(!Val::Nil.is_truthy());
    assert!(!Val::Int(0).is_truthy());
    assert!(Val::str("x").is_truthy());
    assert!(!Val::list([]).is_truthy());
    assert!(!Val::Range(3, 3).is_truthy());
}

#[test]
fn test_serde_uses_type_tag() {
    let json = serde_json::to_string(&Val::Int(7)).expect("serialize");
    assert_eq!(json, r#"{"type":"int","value":7}"#);
    let nil: Val = serde_json::from_str(r#"{"type":"nil"}"#).expect("deserialize nil");
    assert_eq!(nil, Val::Nil);
    let tuple: Val =
        serde_json::from_str(r#"{"type":"tuple","value":[{"type":"int","value":1},{"type":"str","value":"b"}]}"#)
            .expect("deserialize tuple");
    assert_eq!(tuple, Val::tuple([Val::Int(1), Val::str("b")]));
}
