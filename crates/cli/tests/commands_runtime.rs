use std::env;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use procura_cli::commands::evaluate::EvaluateArgs;
use procura_cli::commands::recommend::RecommendArgs;
use procura_cli::commands::{anomalies, compare, config, doctor, evaluate, items, recommend, stats};
use procura_core::config::LoadOptions;
use procura_core::DemandLevel;
use rust_decimal::Decimal;
use serde_json::Value;

const SAMPLE_DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/sample_data.csv");

#[test]
fn items_lists_every_item_in_the_sample_dataset() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let result = items::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected items listing to succeed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "items");
        assert_eq!(payload["status"], "ok");
        let listed = payload["data"].as_array().expect("data should be an array");
        assert_eq!(listed.len(), 6);
        assert_eq!(listed[0]["item_name"], "Business Laptop");
        assert_eq!(listed[0]["supplier_count"], 3);
    });
}

#[test]
fn missing_dataset_reports_data_unavailable() {
    with_env(&[("PROCURA_DATA_CSV_PATH", "/nonexistent/quotes.csv")], || {
        let result = items::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 3, "expected data unavailable exit code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "data_unavailable");
        assert!(payload["correlation_id"].is_string());
    });
}

#[test]
fn malformed_env_override_is_a_config_failure() {
    with_env(
        &[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA), ("PROCURA_RULES_NEGOTIATION_MARGIN", "lots")],
        || {
            let result = items::run(&LoadOptions::default());
            assert_eq!(result.exit_code, 2, "expected config validation failure code");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["error_class"], "config_validation");
        },
    );
}

#[test]
fn stats_reports_rounded_market_figures() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let result = stats::run(&LoadOptions::default(), "104");
        assert_eq!(result.exit_code, 0, "expected stats to succeed");

        let payload = parse_payload(&result.output);
        let data = &payload["data"];
        assert_eq!(decimal(&data["summary"]["avg_price"]), Decimal::new(1_251, 2));
        assert_eq!(data["statistics"]["cheapest_supplier_name"], "PaperMill");
        assert_eq!(data["savings"]["current_supplier"], "OfficeHub");
    });
}

#[test]
fn stats_for_unknown_item_is_not_found() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let result = stats::run(&LoadOptions::default(), "999");
        assert_eq!(result.exit_code, 5, "expected not found exit code");
        assert_eq!(parse_payload(&result.output)["error_class"], "not_found");
    });
}

#[test]
fn compare_orders_suppliers_and_applies_filters() {
    with_env(
        &[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA), ("PROCURA_ANALYSIS_TOP_N", "1")],
        || {
            let result =
                compare::run(&LoadOptions::default(), "101", Some(Decimal::new(85_000, 2)));
            assert_eq!(result.exit_code, 0, "expected compare to succeed");

            let data = &parse_payload(&result.output)["data"];
            let suppliers: Vec<&str> = data["suppliers"]
                .as_array()
                .expect("suppliers should be an array")
                .iter()
                .filter_map(|row| row["supplier_name"].as_str())
                .collect();
            assert_eq!(suppliers, vec!["TechSource", "OfficeHub", "PrimeParts"]);
            assert_eq!(data["best_value_suppliers"], serde_json::json!(["TechSource"]));
            assert_eq!(data["reliable_suppliers"], serde_json::json!(["OfficeHub"]));
            assert_eq!(data["within_budget"], serde_json::json!(["TechSource", "OfficeHub"]));
        },
    );
}

#[test]
fn recommend_uses_the_selected_supplier_row() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let args = RecommendArgs {
            item: "101".to_string(),
            supplier: "TechSource".to_string(),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "expected recommendation to succeed");

        let data = &parse_payload(&result.output)["data"];
        assert_eq!(data["recommendation"]["decision"], "buy_now");
        assert_eq!(decimal(&data["suggested_price"]), Decimal::new(80_750, 2));
        assert_eq!(data["best_supplier"], "TechSource");
        assert_eq!(data["selected_is_preferred"], false);
        let reasoning = data["reasoning"].as_str().unwrap_or_default();
        assert!(reasoning.starts_with("Stock Level: Low (15 units) | Demand: High"));
    });
}

#[test]
fn recommend_rejects_unknown_supplier_and_bad_margin() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let unknown = RecommendArgs {
            item: "101".to_string(),
            supplier: "Nobody".to_string(),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &unknown);
        assert_eq!(result.exit_code, 4, "expected bad request for unknown supplier");

        let bad_margin = RecommendArgs {
            item: "101".to_string(),
            supplier: "TechSource".to_string(),
            margin: Some(Decimal::ONE),
            ..RecommendArgs::default()
        };
        let result = recommend::run(&LoadOptions::default(), &bad_margin);
        assert_eq!(result.exit_code, 4, "expected bad request for margin of one");
        assert_eq!(parse_payload(&result.output)["error_class"], "bad_request");
    });
}

#[test]
fn evaluate_waits_on_high_stock_without_deep_discount() {
    with_env(&[], || {
        let args = EvaluateArgs {
            stock: 620,
            demand: DemandLevel::High,
            price: Decimal::new(1_180, 2),
            average: Decimal::new(1_251, 2),
            margin: None,
        };
        let result = evaluate::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 0, "expected evaluate to succeed");

        let data = &parse_payload(&result.output)["data"];
        assert_eq!(data["decision"], "wait");
        assert_eq!(data["tier"], "High");
        assert_eq!(decimal(&data["suggested_price"]), Decimal::new(1_188, 2));
    });
}

#[test]
fn evaluate_rejects_negative_stock() {
    with_env(&[], || {
        let args = EvaluateArgs {
            stock: -1,
            demand: DemandLevel::Low,
            price: Decimal::from(10),
            average: Decimal::from(12),
            margin: None,
        };
        let result = evaluate::run(&LoadOptions::default(), &args);
        assert_eq!(result.exit_code, 4, "expected bad request exit code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "bad_request");
        assert!(payload["message"].as_str().is_some_and(|m| m.contains("stock")));
    });
}

#[test]
fn anomalies_flag_the_toner_spread() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let result = anomalies::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected anomaly scan to succeed");

        let data = &parse_payload(&result.output)["data"];
        let flagged = data.as_array().expect("data should be an array");
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0]["item_name"], "Printer Toner");
    });
}

#[test]
fn config_attributes_values_to_env_and_defaults() {
    with_env(&[("PROCURA_ANALYSIS_TOP_N", "5")], || {
        let result = config::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0);
        assert!(result
            .output
            .contains("- analysis.top_n = 5 (source: env (PROCURA_ANALYSIS_TOP_N))"));
        assert!(result.output.contains("- rules.negotiation_margin = 0.05 (source: default)"));
    });
}

#[test]
fn config_reads_values_from_an_explicit_file() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("procura.toml");
        std::fs::write(&path, "[rules]\nnegotiation_margin = \"0.07\"\n").expect("write config");

        let options = LoadOptions { config_path: Some(path.clone()), ..LoadOptions::default() };
        let result = config::run(&options);
        assert_eq!(result.exit_code, 0);
        let expected =
            format!("- rules.negotiation_margin = 0.07 (source: file ({}))", path.display());
        assert!(result.output.contains(&expected), "unexpected output: {}", result.output);
    });
}

#[test]
fn doctor_passes_with_the_sample_dataset() {
    with_env(&[("PROCURA_DATA_CSV_PATH", SAMPLE_DATA)], || {
        let result = doctor::run(&LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0, "expected doctor to pass");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["checks"].as_array().map(Vec::len), Some(3));
    });
}

#[test]
fn doctor_fails_when_dataset_is_missing() {
    with_env(&[("PROCURA_DATA_CSV_PATH", "/nonexistent/quotes.csv")], || {
        let result = doctor::run(&LoadOptions::default(), false);
        assert_eq!(result.exit_code, 3, "expected data unavailable exit code");
        assert!(result.output.contains("- [fail] dataset_readable"));
        assert!(result.output.contains("- [skip] dataset_items"));
    });
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(text) => Decimal::from_str(text).expect("decimal string"),
        other => Decimal::from_str(&other.to_string()).expect("decimal number"),
    }
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PROCURA_DATA_CSV_PATH",
        "PROCURA_RULES_NEGOTIATION_MARGIN",
        "PROCURA_RULES_PREFERRED_PRICE_THRESHOLD",
        "PROCURA_ANALYSIS_RELIABLE_MIN_STOCK",
        "PROCURA_ANALYSIS_TOP_N",
        "PROCURA_ANALYSIS_ANOMALY_CV_THRESHOLD",
        "PROCURA_LOGGING_LEVEL",
        "PROCURA_LOGGING_FORMAT",
        "PROCURA_LOG_LEVEL",
        "PROCURA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
