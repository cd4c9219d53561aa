use grafana_sync_core::{RewriteError, set_panel_datasources};
use serde_json::{Value, json};

fn object(value: Value) -> grafana_sync_core::Dashboard {
    value.as_object().cloned().expect("test value is an object")
}

#[test]
fn replaces_top_level_datasource() {
    let mut panel = object(json!({ "foo": "bar", "datasource": "ds1" }));

    set_panel_datasources(&mut panel, "ds2").unwrap();

    assert_eq!(
        Value::Object(panel),
        json!({ "foo": "bar", "datasource": "ds2" })
    );
}

#[test]
fn leaves_documents_without_panels_untouched() {
    let mut panel = object(json!({ "foo": "bar", "rows": [1, 2, 3] }));
    let expected = panel.clone();

    set_panel_datasources(&mut panel, "ds2").unwrap();

    assert_eq!(panel, expected);
}

#[test]
fn recurses_into_nested_panels() {
    let mut dashboard = object(json!({
        "title": "Latency",
        "panels": [
            { "datasource": "old", "panels": [ { "datasource": "old" } ] },
            { "type": "row", "panels": null },
            { "type": "text" }
        ]
    }));

    set_panel_datasources(&mut dashboard, "prometheus").unwrap();

    assert_eq!(
        Value::Object(dashboard),
        json!({
            "title": "Latency",
            "panels": [
                { "datasource": "prometheus", "panels": [ { "datasource": "prometheus" } ] },
                { "type": "row", "panels": null },
                { "type": "text" }
            ]
        })
    );
}

#[test]
fn replaces_non_string_datasource_values() {
    let mut panel = object(json!({ "datasource": { "uid": "abc", "type": "influxdb" } }));

    set_panel_datasources(&mut panel, "prometheus").unwrap();

    assert_eq!(panel.get("datasource"), Some(&json!("prometheus")));
}

#[test]
fn null_panels_is_a_no_op() {
    let mut panel = object(json!({ "panels": null }));

    set_panel_datasources(&mut panel, "ds2").unwrap();

    assert_eq!(panel.get("panels"), Some(&Value::Null));
}

#[test]
fn scalar_panels_is_a_structural_mismatch() {
    let mut panel = object(json!({ "panels": "not-a-list" }));

    let err = set_panel_datasources(&mut panel, "ds2").expect_err("expected mismatch");

    assert!(matches!(err, RewriteError::StructuralMismatch));
}

#[test]
fn non_object_panel_entry_is_a_structural_mismatch() {
    let mut panel = object(json!({ "panels": [ { "datasource": "old" }, 42 ] }));

    let err = set_panel_datasources(&mut panel, "ds2").expect_err("expected mismatch");

    assert!(matches!(err, RewriteError::StructuralMismatch));
}

#[test]
fn rewrite_is_idempotent() {
    let mut once = object(json!({
        "datasource": "old",
        "panels": [ { "datasource": "old", "panels": null } ]
    }));
    set_panel_datasources(&mut once, "ds2").unwrap();

    let mut twice = once.clone();
    set_panel_datasources(&mut twice, "ds2").unwrap();

    assert_eq!(once, twice);
}
