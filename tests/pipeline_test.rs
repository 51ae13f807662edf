mod common;

use common::*;
use std::io::Write;
use std::path::PathBuf;
use tpsl_ml::prelude::*;

const HEADER: &str = "time,open,high,low,close,high_time,low_time,x,dummy";

fn write_bars_csv(path: &PathBuf) {
    let mut file = std::fs::File::create(path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for (i, bar) in training_table().bars().iter().enumerate() {
        writeln!(
            file,
            "{},100,100.1,99.9,100,{},{},{},{}",
            bar.timestamp.format("%Y-%m-%d %H:%M:%S"),
            bar.timestamp.to_rfc3339(),
            bar.timestamp.to_rfc3339(),
            bar.feature("x").unwrap(),
            bar.feature(LABEL_COLUMN).unwrap(),
        )
        .unwrap();
        //one unusable row that has to be dropped before training
        if i == 4 {
            writeln!(
                file,
                "{},100,100.1,99.9,100,{},{},,1",
                (bar.timestamp + chrono::Duration::minutes(5)).format("%Y-%m-%d %H:%M:%S"),
                bar.timestamp.to_rfc3339(),
                bar.timestamp.to_rfc3339(),
            )
            .unwrap();
        }
    }
}

#[test]
fn loader_reads_prices_and_feature_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bars.csv");
    write_bars_csv(&path);

    let table = load_csv(&path).unwrap();
    assert_eq!(table.len(), 28);
    assert_eq!(
        table.feature_names(),
        vec!["x".to_string(), LABEL_COLUMN.to_string()]
    );
    assert_eq!(table.first_timestamp(), Some(t0()));

    let clean = table.drop_non_finite();
    assert_eq!(clean.len(), 27);
    assert_eq!(clean.labels(LABEL_COLUMN).unwrap()[0], -1);
}

#[test]
fn loader_rejects_missing_price_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "time,open,close\n2024-01-01 00:00:00,1,1\n").unwrap();
    assert!(load_csv(&path).is_err());
}

#[test]
fn config_resolves_training_table_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.csv");
    write_bars_csv(&path);

    let config = StrategyConfig {
        list_x: vec!["x".to_string()],
        train_mode: true,
        training_data: Some(path),
        training_rows: Some(10),
        ..StrategyConfig::default()
    };

    let parameters = config.resolve().unwrap();
    match parameters.mode {
        Mode::Train { training_data } => assert_eq!(training_data.len(), 10),
        Mode::Inference { .. } => panic!("expected train mode"),
    }
    assert_eq!(parameters.exit, config.exit_rule());
}

#[test]
fn saved_artifacts_reload_for_inference() {
    let trained = MlTpSlStrategy::new(scenario_bars(), train_parameters()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let (model_path, scaler_path) = trained.artifacts().save(dir.path(), "tpsl").unwrap();
    assert!(model_path.ends_with("tpsl_model.json"));
    assert!(scaler_path.ends_with("tpsl_sc.json"));

    let config = StrategyConfig {
        list_x: vec!["x".to_string()],
        train_mode: false,
        model_path: Some(model_path),
        scaler_path: Some(scaler_path),
        ..StrategyConfig::default()
    };
    let parameters = config.resolve().unwrap();
    assert!(!parameters.mode.is_train());

    let reloaded = MlTpSlStrategy::new(scenario_bars(), parameters).unwrap();
    let before: Vec<Signal> = trained.data().bars().iter().map(|b| b.ml_signal).collect();
    let after: Vec<Signal> = reloaded.data().bars().iter().map(|b| b.ml_signal).collect();
    assert_eq!(before, after);
}

#[test]
fn inference_config_without_artifacts_fails() {
    let config = StrategyConfig {
        train_mode: false,
        ..StrategyConfig::default()
    };
    assert!(config.resolve().is_err());
}

#[test]
fn correlation_table_shows_both_heatmaps() {
    let frame = FeatureFrame::from_columns(vec![
        ("a".to_string(), vec![1.0, 2.0, 3.0, 4.0]),
        ("b".to_string(), vec![2.0, 4.0, 5.0, 9.0]),
        ("c".to_string(), vec![4.0, 3.0, 2.0, 1.0]),
    ])
    .unwrap();

    let rendered = correlation_table(&frame).to_string();
    assert!(rendered.contains("Pearson Correlation"));
    assert!(rendered.contains("Spearman Correlation"));
    assert!(rendered.contains("-1.00"));

    let spearman = correlation_matrix(&frame, CorrelationMethod::Spearman);
    assert_close(spearman.get("a", "b").unwrap(), 1.0);
    assert_close(spearman.get("a", "c").unwrap(), -1.0);
}

#[test]
fn vif_pruning_reads_a_csv_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("features.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "time,a,b,c").unwrap();
    for i in 0..12 {
        let a = i as f64;
        let b = 3.0 * a + if i % 2 == 0 { 0.01 } else { -0.01 };
        let c = if i % 3 == 0 { 1.0 } else { -1.0 };
        writeln!(file, "2024-01-01 {:02}:00:00,{},{},{}", i, a, b, c).unwrap();
    }
    drop(file);

    let frame = FeatureFrame::from_csv(&path).unwrap();
    assert_eq!(frame.n_cols(), 3);

    let all = calculate_vif(&frame);
    assert!(all["a"] > DEFAULT_VIF_THRESHOLD);

    let kept = remove_intercollinearity(&frame, DEFAULT_VIF_THRESHOLD);
    assert_eq!(kept.len(), 2);
    assert!(kept.contains_key("c"));
    assert!(kept.values().all(|v| *v <= DEFAULT_VIF_THRESHOLD));
}
