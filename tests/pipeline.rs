//! End-to-end runs over the configuration and tables shipped in data/

use approx::assert_relative_eq;
use policy_pricer::pipeline::TransformRegistry;
use policy_pricer::rating::FINAL_PREMIUM_FIELD;
use policy_pricer::record::{load_records, write_records_csv};
use policy_pricer::{BatchSummary, FieldValue, Pipeline, PipelineContext, PipelineStage, PricerConfig};

fn shipped_pipeline() -> Pipeline {
    let context = PipelineContext::load(&PricerConfig::default()).unwrap();
    Pipeline::new(context)
}

fn premium_of(records: &[policy_pricer::PolicyRecord], id: i64) -> Option<f64> {
    records
        .iter()
        .find(|r| r.get("IDpol") == Some(&FieldValue::Int(id)))
        .and_then(|r| r.get_f64(FINAL_PREMIUM_FIELD))
}

#[test]
fn test_single_quote_premium() {
    let pipeline = shipped_pipeline();
    let records = load_records("data/quotes/1.json").unwrap();
    assert_eq!(records.len(), 1);

    let quote = pipeline.quote(records.into_iter().next().unwrap()).unwrap();
    assert_eq!(quote.quote_id.as_deref(), Some("1"));
    assert_relative_eq!(quote.premium.unwrap(), 123.48);
    assert_eq!(quote.premium_details.get("Area_indexed"), Some(&FieldValue::Int(2)));
    assert_eq!(quote.premium_details.get("VehAgeBand"), Some(&FieldValue::from("1-5")));
    assert_eq!(quote.premium_details.get("PowerGroup"), Some(&FieldValue::from("Medium")));
    assert_eq!(quote.premium_details.get("DrivAgeBand"), Some(&FieldValue::from("40-59")));
}

#[test]
fn test_batch_drops_unrated_and_keeps_order() {
    let pipeline = shipped_pipeline();
    let records = load_records("data/quotes").unwrap();
    assert_eq!(records.len(), 10);

    let rated = pipeline.process(records).unwrap();
    // The 17 year old driver falls outside every age band
    assert_eq!(rated.len(), 9);
    assert!(premium_of(&rated, 10).is_none());

    let ids: Vec<i64> = rated
        .iter()
        .filter_map(|r| match r.get("IDpol") {
            Some(FieldValue::Int(id)) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());

    assert_relative_eq!(premium_of(&rated, 1).unwrap(), 123.48);
    assert_relative_eq!(premium_of(&rated, 7).unwrap(), 159.6);

    let summary = BatchSummary::from_records(10, &rated);
    assert_eq!(summary.dropped_records, 1);
}

#[test]
fn test_repeat_runs_are_byte_identical() {
    let pipeline = shipped_pipeline();
    let records = load_records("data/quotes").unwrap();

    let first = serde_json::to_vec(&pipeline.process(records.clone()).unwrap()).unwrap();
    let second = serde_json::to_vec(&pipeline.process(records).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_batch_matches_sequential() {
    let pipeline = shipped_pipeline();
    let records = load_records("data/quotes").unwrap();

    let sequential = pipeline.process(records.clone()).unwrap();
    let parallel = pipeline.process_parallel(records).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_banded_view_keeps_every_record() {
    let pipeline = shipped_pipeline();
    let records = load_records("data/quotes").unwrap();

    let banded = pipeline.run_until(records, PipelineStage::Banded).unwrap();
    assert_eq!(banded.len(), 10);
    let young = banded
        .iter()
        .find(|r| r.get("IDpol") == Some(&FieldValue::Int(10)))
        .unwrap();
    assert_eq!(young.get("DrivAgeBand"), Some(&FieldValue::Null));
    assert!(!young.contains(FINAL_PREMIUM_FIELD));
}

#[test]
fn test_builtin_transforms_agree_with_config_bands() {
    let plain = shipped_pipeline();
    let with_builtins = shipped_pipeline().with_transforms(TransformRegistry::builtin());
    let records = load_records("data/quotes/1.json").unwrap();

    let a = plain.process(records.clone()).unwrap();
    let b = with_builtins.process(records).unwrap();
    assert_eq!(a[0].get_f64(FINAL_PREMIUM_FIELD), b[0].get_f64(FINAL_PREMIUM_FIELD));
}

#[test]
fn test_rated_csv_output() {
    let pipeline = shipped_pipeline();
    let rated = pipeline.process(load_records("data/quotes").unwrap()).unwrap();

    let mut buf = Vec::new();
    write_records_csv(&mut buf, &rated).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let header = text.lines().next().unwrap();
    assert!(header.starts_with("IDpol,"));
    assert!(header.ends_with(FINAL_PREMIUM_FIELD));
    assert_eq!(text.lines().count(), 1 + rated.len());
}
