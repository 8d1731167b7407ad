//! State Resource Tests
//!
//! The GET/POST/PUT/DELETE scenario over the example state document.

use crate::*;

fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

#[test]
fn test_end_to_end_scenario() {
    let app = create_app();
    let resource = app.state_resource("javascript", coraline);

    // GET
    assert_eq!(
        parse(&resource.handle_get().unwrap()),
        json!({
            "name": "Coraline",
            "media": "Film",
            "rating": "A+",
            "characters": ["Coraline", "Wybie", "Mom", "Dad"]
        })
    );

    // POST merges
    let after_post = parse(&resource.handle_post(r#"{"rating": "A"}"#).unwrap());
    assert_eq!(
        after_post,
        json!({
            "name": "Coraline",
            "media": "Film",
            "rating": "A",
            "characters": ["Coraline", "Wybie", "Mom", "Dad"]
        })
    );
    assert_eq!(parse(&resource.handle_get().unwrap()), after_post);

    // PUT replaces
    let after_put = parse(&resource.handle_put(r#"{"name": "X"}"#).unwrap());
    assert_eq!(after_put, json!({"name": "X"}));
    assert_eq!(parse(&resource.handle_get().unwrap()), json!({"name": "X"}));

    // DELETE clears
    resource.handle_delete().unwrap();
    assert_eq!(parse(&resource.handle_get().unwrap()), json!({}));
}

#[test]
fn test_resources_share_state_by_namespace() {
    let app = create_app();
    let a = app.state_resource("javascript", coraline);
    let b = app.state_resource("javascript", Document::new);
    let other = app.state_resource("python", Document::new);

    a.handle_post(r#"{"rating": "B"}"#).unwrap();
    assert_eq!(parse(&b.handle_get().unwrap())["rating"], json!("B"));
    assert_eq!(other.handle_get().unwrap(), "{}");
}

#[test]
fn test_rejected_bodies() {
    let app = create_app();
    let resource = app.state_resource("javascript", coraline);

    let err = resource.handle_post("rating=A").unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
    assert!(err.is_client_error());

    let err = resource.handle_put("\"just a string\"").unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)));

    assert_eq!(resource.state().read().unwrap(), coraline());
}

#[test]
fn test_delete_then_reset_restores_default() {
    let app = create_app();
    let resource = app.state_resource("javascript", coraline);
    resource.handle_delete().unwrap();
    resource.state().reset().unwrap();
    assert_eq!(resource.state().read().unwrap(), coraline());
}
