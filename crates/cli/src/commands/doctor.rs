use haulaway_core::config::{AppConfig, LoadOptions};
use haulaway_db::{connect, migrations};
use serde::Serialize;

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

pub fn run(options: &LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
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
            checks.extend(check_database(&config));
            checks.push(check_llm_key(&config));
            checks.push(check_sms_gateway(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in [
                "database_connectivity",
                "migrations_applied",
                "llm_key_present",
                "sms_gateway_configured",
            ] {
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

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let skipped = |details: &str| DoctorCheck {
        name: "migrations_applied",
        status: CheckStatus::Skipped,
        details: details.to_string(),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                skipped("skipped because the database check could not run"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    skipped("skipped because the database is unreachable"),
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };

        let migrations_applied = match migrations::pending_count(&pool).await {
            Ok(0) => DoctorCheck {
                name: "migrations_applied",
                status: CheckStatus::Pass,
                details: "schema is current".to_string(),
            },
            Ok(pending) => DoctorCheck {
                name: "migrations_applied",
                status: CheckStatus::Fail,
                details: format!("{pending} pending migrations (run `haulaway migrate`)"),
            },
            Err(error) => DoctorCheck {
                name: "migrations_applied",
                status: CheckStatus::Fail,
                details: format!("failed to inspect migration ledger: {error}"),
            },
        };

        pool.close().await;
        vec![connectivity, migrations_applied]
    })
}

fn check_llm_key(config: &AppConfig) -> DoctorCheck {
    if config.llm.api_key.is_some() {
        DoctorCheck {
            name: "llm_key_present",
            status: CheckStatus::Pass,
            details: format!("api key set for model `{}`", config.llm.model),
        }
    } else {
        DoctorCheck {
            name: "llm_key_present",
            status: CheckStatus::Fail,
            details: "llm.api_key is not set; inbound messages will get the fallback reply"
                .to_string(),
        }
    }
}

fn check_sms_gateway(config: &AppConfig) -> DoctorCheck {
    let mut missing = Vec::new();
    if config.sms.api_base.is_none() {
        missing.push("sms.api_base");
    }
    if config.sms.api_token.is_none() {
        missing.push("sms.api_token");
    }
    if config.sms.from_number.is_none() {
        missing.push("sms.from_number");
    }

    if missing.is_empty() {
        DoctorCheck {
            name: "sms_gateway_configured",
            status: CheckStatus::Pass,
            details: "gateway credentials and sender number are set".to_string(),
        }
    } else {
        DoctorCheck {
            name: "sms_gateway_configured",
            status: CheckStatus::Fail,
            details: format!("missing {}", missing.join(", ")),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
