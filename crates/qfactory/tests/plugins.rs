//! End-to-end tests against the demo plugin crates linked into this binary.

use qfactory::prelude::*;
use qfactory::{DiscoveryReport, PluginEntry};
use serde_json::json;

use qfactory_plugin_couchdb as _;
use qfactory_plugin_http_json as _;

fn options(value: serde_json::Value) -> Configuration {
    let serde_json::Value::Object(map) = value else {
        unreachable!("options are an object")
    };
    map
}

#[test]
fn linked_plugins_are_discovered() {
    let factory = RunnerFactory::new();
    let backends: Vec<_> = factory.backends().into_iter().collect();
    assert_eq!(
        backends,
        vec!["bigquery", "couchdb", "http_json", "mongodb", "mysql"]
    );

    let report: DiscoveryReport = factory.report();
    assert!(report.is_clean());
    let mut loaded = report.loaded_names();
    loaded.sort_unstable();
    assert_eq!(loaded, vec!["couchdb", "http_json"]);
}

#[tokio::test]
async fn every_backend_computes_its_constant() {
    let factory = RunnerFactory::new();
    let http = options(json!({ "url": "https://example.com/n.json" }));
    let empty = Configuration::new();

    for (name, expected) in [
        ("mongodb", 1),
        ("mysql", 2),
        ("bigquery", 3),
        ("couchdb", 4),
        ("http_json", 5),
    ] {
        let cfg = if name == "http_json" { &http } else { &empty };
        let value = factory.get(name).unwrap().compute(cfg).await.unwrap();
        assert_eq!(value, Number::Integer(expected), "{name}");
    }
}

#[tokio::test]
async fn web_application_flow() {
    // The user picked these values in the dashboard form.
    let query_runner_name = "bigquery";
    let query_options = options(json!({
        "sql_statement": "select count(*) as the_number from `orders`",
        "return_value": "the_number",
    }));

    let factory = RunnerFactory::new();
    let runner = factory.get(query_runner_name).unwrap();
    let result = runner.compute(&query_options).await.unwrap();

    assert_eq!(result, Number::Integer(3));
    assert_eq!(query_options["return_value"], "the_number");
}

#[tokio::test]
async fn runner_errors_pass_through_unchanged() {
    let factory = RunnerFactory::new();
    let err = factory
        .compute("http_json", &Configuration::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        QueryError::Runner(RunnerError::MissingOption(ref key)) if key == "url"
    ));
}

#[test]
fn disabled_plugin_stays_unavailable() {
    let factory = RunnerFactory::builder()
        .discovery(DiscoveryOptions::new().disable("couchdb"))
        .build();

    assert!(factory.get("couchdb").err().unwrap().is_unknown_backend());
    assert!(factory.get("http_json").is_ok());
    assert_eq!(factory.report().skipped, vec!["couchdb".to_string()]);
}

#[test]
fn plugin_can_override_builtin_explicitly() {
    let factory = RunnerFactory::new();
    let couchdb = qfactory::core::registered_plugins()
        .iter()
        .find(|entry: &&PluginEntry| entry.name == "couchdb")
        .copied()
        .unwrap();

    let as_mysql = PluginEntry::new("mysql", couchdb.origin, couchdb.create);
    assert!(matches!(factory.register_plugin(&as_mysql), Ok(true)));
    assert_eq!(factory.backends().len(), 5);
}
