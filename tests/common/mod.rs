//shared fixtures for the integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use indexmap::IndexMap;
use tpsl_ml::prelude::*;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 9, 0, 0).unwrap()
}

pub fn hour(h: i64) -> DateTime<Utc> {
    t0() + Duration::hours(h)
}

//hourly bar closing at its open, the high prints before the low unless `low_first`
pub fn bar(h: i64, open: f64, high: f64, low: f64, x: f64, low_first: bool) -> Bar {
    let timestamp = hour(h);
    let (high_time, low_time) = if low_first {
        (timestamp + Duration::minutes(40), timestamp + Duration::minutes(20))
    } else {
        (timestamp + Duration::minutes(20), timestamp + Duration::minutes(40))
    };
    let mut features = IndexMap::new();
    features.insert("x".to_string(), x);
    Bar::new(timestamp, open, high, low, open, high_time, low_time, features).unwrap()
}

//three well separated clusters of x labelled -1, 0 and 1, spread inside the first five hours
pub fn training_table() -> BarTable {
    let mut bars = Vec::new();
    let mut minute = 0;
    for _ in 0..3 {
        for (centre, label) in [(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0)] {
            for jitter in [-0.1, 0.0, 0.1] {
                let timestamp = t0() + Duration::minutes(minute);
                minute += 10;
                let mut features = IndexMap::new();
                features.insert("x".to_string(), centre + jitter);
                features.insert(LABEL_COLUMN.to_string(), label);
                bars.push(Bar::new_unchecked(
                    timestamp, 100.0, 100.0, 100.0, 100.0, timestamp, timestamp, features,
                ));
            }
        }
    }
    BarTable::new(bars)
}

pub fn exit_rule() -> ExitRule {
    ExitRule {
        tp: 0.005,
        sl: -0.0025,
        cost: 0.0002,
        leverage: 5.0,
    }
}

pub fn train_parameters() -> StrategyParameters {
    StrategyParameters {
        list_x: vec!["x".to_string()],
        exit: exit_rule(),
        mode: Mode::Train {
            training_data: training_table(),
        },
    }
}

//long entry at 101 on bar 1, take-profit on bar 2, short entry at 98 and stop-loss on bar 4
//
//every open differs, and the exits only fire when measured from the entry bar's own open:
//from bar 2's open the high is +0.3%, from bar 3's open bar 4 would be a short take-profit
pub fn scenario_bars() -> BarTable {
    BarTable::new(vec![
        bar(0, 100.0, 100.1, 99.9, 1.0, false),
        bar(1, 101.0, 101.2, 100.9, 1.0, false),
        bar(2, 101.3, 101.6, 101.2, 0.0, false),
        bar(3, 99.0, 99.1, 98.9, -1.0, false),
        bar(4, 98.0, 98.3, 97.9, 0.0, false),
        bar(5, 98.0, 98.1, 97.9, 0.0, false),
    ])
}

pub fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
}
