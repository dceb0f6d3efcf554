//! Integration tests for the SR-line pipeline.
//!
//! Tests cover:
//! - Compute/analyze against the filesystem store and JSON config document
//! - Same-day idempotence and stale-file purging on a later day
//! - Failure modes: analyze before compute, missing config section
//! - Requirement loop skipping failing instruments
//! - Latest-table accessor
//! - CLI `init` and `run` against CSV price files

mod common;

use common::*;
use goinvest::adapters::csv_adapter::CsvAdapter;
use goinvest::cli::{self, Cli, Command, RunArgs};
use goinvest::domain::error::GoInvestError;
use goinvest::domain::indicator::srline::{RESISTANCE, SUPPORT};
use goinvest::domain::indicator::{IndicatorName, StrategyName};
use goinvest::domain::pipeline::{Phase, Pipeline, Requirement};
use goinvest::domain::price::{Period, ProductType};
use goinvest::domain::signal::pressure_area::MetLinePolicy;
use serde_json::json;
use std::fs;
use std::process::ExitCode;

fn stock(code: &str) -> Requirement {
    Requirement::new(code, ProductType::Stock)
}

fn pipeline<'a>(ws: &'a Workspace, prices: &'a MockPricePort) -> Pipeline<'a> {
    Pipeline::new(prices, &ws.store, &ws.config, MetLinePolicy::PerPeriod)
}

mod compute_and_analyze {
    use super::*;

    #[test]
    fn compute_writes_one_table_per_period() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));

        let tables = pipeline(&ws, &prices)
            .compute(&stock("600418"), date(2024, 6, 28))
            .unwrap();

        assert_eq!(tables[&Period::Daily].len(), 120);
        assert_eq!(tables[&Period::Weekly].len(), 18);
        assert_eq!(
            ws.indicator_files("600418"),
            vec![
                "600418D_20240628_SRLine.csv".to_string(),
                "600418W_20240628_SRLine.csv".to_string(),
            ]
        );
        assert_eq!(
            ws.config_json(),
            json!({"ValueInCalculation": {"SRLine": {"threshold": 0.05}}})
        );
    }

    #[test]
    fn analyze_writes_judgments_and_strategy_config() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = pipeline(&ws, &prices);
        let req = stock("600418");

        p.compute(&req, date(2024, 6, 28)).unwrap();
        let judgments = p.analyze(&req, date(2024, 6, 28)).unwrap();

        assert_eq!(judgments.len(), 1);
        let judgment = &judgments[0];
        assert_eq!(judgment.len(), 120);
        for (_, j) in judgment.rows() {
            assert!((-1.0..=1.0).contains(&j.daily));
            assert!((-1.0..=1.0).contains(&j.weekly));
        }

        let path = ws.store.judgment_path(
            ProductType::Stock,
            "600418",
            IndicatorName::SrLine,
            StrategyName::PressureArea,
        );
        assert!(path.ends_with("stock/600418/strategy/600418_SRLinePressureArea_anlysis.csv"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,daily,weekly\n2024-01-01,"));
        assert_eq!(content.lines().count(), 121);

        assert_eq!(
            ws.config_json(),
            json!({"ValueInCalculation": {"SRLine": {
                "threshold": 0.05,
                "PressureArea": {"strategy_name": "PressureArea", "area_num": 20}
            }}})
        );
    }

    #[test]
    fn saved_lines_match_computed_lines() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = pipeline(&ws, &prices);
        let req = stock("600418");

        let computed = p.compute(&req, date(2024, 6, 28)).unwrap();
        let latest = p.latest_indicator(&req, date(2024, 6, 28)).unwrap();
        assert_eq!(computed, latest);

        let daily = &latest[&Period::Daily];
        let support = daily.column(SUPPORT).unwrap();
        let resistance = daily.column(RESISTANCE).unwrap();
        for (d, s) in &support {
            assert!(resistance[d] > *s);
        }
    }

    #[test]
    fn stored_threshold_is_used_and_strategy_entry_reset_by_compute() {
        let ws = Workspace::with_config(
            r#"{"ValueInCalculation": {"SRLine": {"threshold": 0.1, "PressureArea": {"strategy_name": "PressureArea", "area_num": 10}}}}"#,
        );
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));

        pipeline(&ws, &prices)
            .compute(&stock("600418"), date(2024, 6, 28))
            .unwrap();

        assert_eq!(
            ws.config_json(),
            json!({"ValueInCalculation": {"SRLine": {"threshold": 0.1}}})
        );
    }
}

mod cache_lifecycle {
    use super::*;

    #[test]
    fn same_day_recompute_is_idempotent() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = pipeline(&ws, &prices);
        let req = stock("600418");

        p.compute(&req, date(2024, 6, 28)).unwrap();
        let first = fs::read_to_string(
            ws.store
                .indicator_dir(ProductType::Stock, "600418")
                .join("600418D_20240628_SRLine.csv"),
        )
        .unwrap();

        p.compute(&req, date(2024, 6, 28)).unwrap();
        let second = fs::read_to_string(
            ws.store
                .indicator_dir(ProductType::Stock, "600418")
                .join("600418D_20240628_SRLine.csv"),
        )
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(ws.indicator_files("600418").len(), 2);
    }

    #[test]
    fn later_day_purges_older_files() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = pipeline(&ws, &prices);
        let req = stock("600418");

        p.compute(&req, date(2024, 4, 20)).unwrap();
        p.compute(&req, date(2024, 4, 21)).unwrap();

        assert_eq!(
            ws.indicator_files("600418"),
            vec![
                "600418D_20240421_SRLine.csv".to_string(),
                "600418W_20240421_SRLine.csv".to_string(),
            ]
        );
    }

    #[test]
    fn purge_leaves_other_instruments_alone() {
        let ws = Workspace::new();
        let prices = MockPricePort::new()
            .with_daily("600418", rising_channel(120))
            .with_daily("60041", rising_channel(120));
        let p = pipeline(&ws, &prices);

        p.compute(&stock("60041"), date(2024, 4, 20)).unwrap();
        p.compute(&stock("600418"), date(2024, 4, 21)).unwrap();

        assert_eq!(ws.indicator_files("60041").len(), 2);
        assert_eq!(ws.indicator_files("600418").len(), 2);
    }

    #[test]
    fn latest_falls_back_to_earlier_day() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = pipeline(&ws, &prices);
        let req = stock("600418");

        let computed = p.compute(&req, date(2024, 4, 20)).unwrap();
        let latest = p.latest_indicator(&req, date(2024, 4, 25)).unwrap();
        assert_eq!(computed, latest);

        let err = p.latest_indicator(&req, date(2024, 4, 19)).unwrap_err();
        assert!(matches!(err, GoInvestError::EmptyIndicatorData { .. }));
    }
}

mod failures {
    use super::*;

    #[test]
    fn analyze_before_compute_fails() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));

        let err = pipeline(&ws, &prices)
            .analyze(&stock("600418"), date(2024, 6, 28))
            .unwrap_err();
        assert!(matches!(
            err,
            GoInvestError::EmptyIndicatorData { period: Period::Daily, .. }
        ));
    }

    #[test]
    fn missing_calculation_section_fails_compute() {
        let ws = Workspace::with_config(r#"{"Requirement": []}"#);
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));

        let err = pipeline(&ws, &prices)
            .compute(&stock("600418"), date(2024, 6, 28))
            .unwrap_err();
        assert!(matches!(err, GoInvestError::MissingConfigSection { .. }));
        assert!(ws.indicator_files("600418").is_empty());
    }

    #[test]
    fn single_observation_cannot_be_fitted() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(1));

        let err = pipeline(&ws, &prices)
            .compute(&stock("600418"), date(2024, 6, 28))
            .unwrap_err();
        assert!(matches!(err, GoInvestError::DegenerateFit { points: 1, .. }));
    }
}

mod requirement_loop {
    use super::*;

    #[test]
    fn failing_instruments_are_skipped() {
        let ws = Workspace::new();
        let prices = MockPricePort::new()
            .with_daily("600418", rising_channel(120))
            .with_error("000001", "connection refused")
            .with_daily("000002", rising_channel(90));

        let report = pipeline(&ws, &prices).run(
            &[stock("600418"), stock("000001"), stock("000002")],
            date(2024, 6, 28),
            Phase::Full,
        );

        assert_eq!(report.processed, vec!["600418", "000002"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].code, "000001");
        assert!(report.skipped[0].reason.contains("connection refused"));
        assert_eq!(ws.indicator_files("000002").len(), 2);
    }

    #[test]
    fn carry_policy_runs_end_to_end() {
        let ws = Workspace::new();
        let prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let p = Pipeline::new(
            &prices,
            &ws.store,
            &ws.config,
            MetLinePolicy::CarryAcrossPeriods,
        );

        let judgments = p
            .analyze_instrument(&stock("600418"), date(2024, 6, 28))
            .unwrap();
        assert_eq!(judgments[0].len(), 120);
    }
}

mod cli_commands {
    use super::*;

    fn settings(ws: &Workspace, codes: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            file.path(),
            format!(
                "[paths]\ndata_root = {}\n\n[run]\ncodes = {}\nproduct_type = stock\n",
                ws.root().display(),
                codes
            ),
        )
        .unwrap();
        file
    }

    fn exits_with(code: ExitCode, expected: ExitCode) -> bool {
        format!("{code:?}") == format!("{expected:?}")
    }

    fn is_success(code: ExitCode) -> bool {
        exits_with(code, ExitCode::SUCCESS)
    }

    fn run_command(ini: &tempfile::NamedTempFile) -> ExitCode {
        cli::run(Cli {
            command: Command::Run(RunArgs {
                config: ini.path().to_path_buf(),
                code: None,
                date: Some("2024-06-28".to_string()),
            }),
        })
    }

    #[test]
    fn run_processes_csv_prices() {
        let ws = Workspace::new();
        write_daily_kline(ws.root(), "600418", &rising_channel(120));
        let ini = settings(&ws, "600418");

        let code = cli::run(Cli {
            command: Command::Run(RunArgs {
                config: ini.path().to_path_buf(),
                code: None,
                date: Some("2024-06-28".to_string()),
            }),
        });

        assert!(is_success(code));
        assert_eq!(ws.indicator_files("600418").len(), 2);
        assert!(ws.config_json()["ValueInCalculation"]["SRLine"]["PressureArea"].is_object());
    }

    #[test]
    fn csv_and_mock_ports_agree() {
        let ws = Workspace::new();
        write_daily_kline(ws.root(), "600418", &rising_channel(120));
        let csv_prices = CsvAdapter::new(ws.root().to_path_buf());
        let mock_prices = MockPricePort::new().with_daily("600418", rising_channel(120));
        let req = stock("600418");

        let from_csv = Pipeline::new(&csv_prices, &ws.store, &ws.config, MetLinePolicy::PerPeriod)
            .compute(&req, date(2024, 6, 28))
            .unwrap();
        let from_mock = pipeline(&ws, &mock_prices)
            .compute(&req, date(2024, 6, 28))
            .unwrap();
        assert_eq!(from_csv, from_mock);
    }

    #[test]
    fn run_fails_when_every_instrument_fails() {
        let ws = Workspace::new();
        let ini = settings(&ws, "600418");

        let code = cli::run(Cli {
            command: Command::Analyze(RunArgs {
                config: ini.path().to_path_buf(),
                code: None,
                date: Some("2024-06-28".to_string()),
            }),
        });
        assert!(!is_success(code));
    }

    #[test]
    fn partial_failure_exits_non_zero() {
        let ws = Workspace::new();
        write_daily_kline(ws.root(), "600418", &rising_channel(120));
        let ini = settings(&ws, "600418, 999999");

        let code = run_command(&ini);

        assert!(exits_with(code, ExitCode::from(1)));
        assert_eq!(ws.indicator_files("600418").len(), 2);
    }

    #[test]
    fn sectionless_config_document_stops_run() {
        let ws = Workspace::with_config(r#"{"Requirement": []}"#);
        write_daily_kline(ws.root(), "600418", &rising_channel(120));
        let ini = settings(&ws, "600418");

        let code = run_command(&ini);

        assert!(exits_with(code, ExitCode::from(3)));
        assert!(ws.indicator_files("600418").is_empty());
        assert_eq!(ws.config_json(), json!({"Requirement": []}));
    }

    #[test]
    fn missing_config_document_stops_run() {
        let ws = Workspace::new();
        fs::remove_file(ws.config.path()).unwrap();
        write_daily_kline(ws.root(), "600418", &rising_channel(120));
        let ini = settings(&ws, "600418");

        assert!(!is_success(run_command(&ini)));
        assert!(!ws.config.path().exists());
    }

    #[test]
    fn init_creates_config_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("data");
        let ini = tempfile::NamedTempFile::new().unwrap();
        fs::write(ini.path(), format!("[paths]\ndata_root = {}\n", root.display())).unwrap();

        let code = cli::run(Cli {
            command: Command::Init {
                config: ini.path().to_path_buf(),
            },
        });

        assert!(is_success(code));
        assert!(root.is_dir());
        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(root.join("config.json")).unwrap()).unwrap();
        assert_eq!(doc, json!({"ValueInCalculation": {}}));
    }
}
