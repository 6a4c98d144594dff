use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use fixture_gen::check::{check_dir, check_levels, check_trades};
use fixture_gen::config::{FixtureConfig, BASE_PRICE, MIB};
use fixture_gen::driver::{run, LEVEL_FILE_NAME, TRADE_FILE_NAME};
use fixture_gen::error::FixtureError;
use rust_decimal::prelude::*;

fn open(path: &str) -> BufReader<File> {
    BufReader::new(File::open(path).unwrap())
}

fn config_in(dir: &Path, total_bytes: u64) -> FixtureConfig {
    FixtureConfig {
        output_dir: dir.to_path_buf(),
        total_bytes,
        ..FixtureConfig::default()
    }
}

#[test]
fn test_valid_trade_fixture() {
    let stats = check_trades(open("../resources/fixtures/trade-valid.csv")).unwrap();
    assert_eq!(stats.records, 4);
    assert_eq!(stats.first_receive_ts, Some(1_716_810_808_001_200));
    assert_eq!(stats.last_receive_ts, Some(1_716_810_808_007_900));
}

#[test]
fn test_valid_level_fixture() {
    let stats = check_levels(open("../resources/fixtures/level-valid.csv")).unwrap();
    assert_eq!(stats.records, 6);
    assert_eq!(stats.batches, 3);
}

#[test]
fn test_out_of_order_trades() {
    let res = check_trades(open("../resources/fixtures/trade-out-of-order.csv"));
    assert!(matches!(res, Err(FixtureError::Invariant { line: 3, .. })));
}

#[test]
fn test_rebuild_in_the_middle_of_a_batch() {
    let res = check_levels(open("../resources/fixtures/level-rebuild-mid-batch.csv"));
    assert!(matches!(res, Err(FixtureError::Invariant { line: 4, .. })));
}

#[test]
fn test_short_level_record() {
    let res = check_levels(open("../resources/fixtures/level-short-record.csv"));
    assert!(matches!(res, Err(FixtureError::Invariant { line: 3, .. })));
}

#[test]
fn test_generated_fixtures_pass_checks() {
    let dir = tempfile::tempdir().unwrap();
    let summary = run(&config_in(dir.path(), MIB)).unwrap();

    assert!(summary.trade.size_on_disk >= MIB / 2);
    assert!(summary.level.size_on_disk >= MIB / 2);
    assert!(summary.total_size() >= MIB);

    let (trades, levels) = check_dir(dir.path()).unwrap();
    assert!(trades.records > 0);
    assert!(levels.batches > 0 && levels.records >= levels.batches);
    assert!(levels.records <= levels.batches * 5);

    let low = Decimal::from_f64(BASE_PRICE * 0.5).unwrap();
    let high = Decimal::from_f64(BASE_PRICE * 1.5).unwrap();
    for stats in [&trades, &levels] {
        assert!(stats.min_price.unwrap() > low);
        assert!(stats.max_price.unwrap() < high);
    }
}

#[test]
fn test_same_seed_same_bytes() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(&config_in(first.path(), 128 * 1024)).unwrap();
    run(&config_in(second.path(), 128 * 1024)).unwrap();

    for name in [TRADE_FILE_NAME, LEVEL_FILE_NAME] {
        let a = fs::read(first.path().join(name)).unwrap();
        let b = fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_different_seed_different_bytes() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    run(&config_in(first.path(), 16 * 1024)).unwrap();
    run(&FixtureConfig {
        seed: 7,
        ..config_in(second.path(), 16 * 1024)
    })
    .unwrap();

    let a = fs::read(first.path().join(TRADE_FILE_NAME)).unwrap();
    let b = fs::read(second.path().join(TRADE_FILE_NAME)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_zero_target_still_writes_rows() {
    let dir = tempfile::tempdir().unwrap();
    run(&config_in(dir.path(), 0)).unwrap();

    let (trades, levels) = check_dir(dir.path()).unwrap();
    assert_eq!(trades.records, 1);
    assert_eq!(levels.batches, 1);
}

#[test]
fn test_check_dir_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        check_dir(dir.path()),
        Err(FixtureError::IoError(_))
    ));
}
