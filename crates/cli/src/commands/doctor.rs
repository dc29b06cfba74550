use procura_core::config::{AppConfig, LoadOptions};
use procura_data::ProcurementDataset;
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_DATA_UNAVAILABLE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn exit_code(&self) -> u8 {
        let failed = |name: &str| {
            self.checks.iter().any(|check| check.name == name && check.status == CheckStatus::Fail)
        };
        if failed("config_validation") {
            EXIT_CONFIG
        } else if self.overall_status == CheckStatus::Fail {
            EXIT_DATA_UNAVAILABLE
        } else {
            0
        }
    }
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = report.exit_code();

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(check_dataset(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["dataset_readable", "dataset_items"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_dataset(config: &AppConfig) -> [DoctorCheck; 2] {
    let path = config.data.csv_path.display().to_string();
    match ProcurementDataset::load(&config.data.csv_path) {
        Ok(dataset) if dataset.is_empty() => [
            DoctorCheck {
                name: "dataset_readable",
                status: CheckStatus::Pass,
                details: format!("read `{path}`"),
            },
            DoctorCheck {
                name: "dataset_items",
                status: CheckStatus::Fail,
                details: "dataset contains no price observations".to_string(),
            },
        ],
        Ok(dataset) => [
            DoctorCheck {
                name: "dataset_readable",
                status: CheckStatus::Pass,
                details: format!("read `{path}`"),
            },
            DoctorCheck {
                name: "dataset_items",
                status: CheckStatus::Pass,
                details: format!(
                    "{} items across {} supplier quotes",
                    dataset.items().len(),
                    dataset.records().len()
                ),
            },
        ],
        Err(error) => [
            DoctorCheck {
                name: "dataset_readable",
                status: CheckStatus::Fail,
                details: error.to_string(),
            },
            DoctorCheck {
                name: "dataset_items",
                status: CheckStatus::Skipped,
                details: "skipped because the dataset did not load".to_string(),
            },
        ],
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
