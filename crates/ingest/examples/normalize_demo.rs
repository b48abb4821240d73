use chrono::NaiveDate;
use ingest::{normalize, FixedClock, IngestConfig, RawSubmission};

fn main() {
    let Some(day) = NaiveDate::from_ymd_opt(2024, 5, 1) else {
        panic!("invalid date components");
    };
    let clock = FixedClock(day);
    let cfg = IngestConfig::default();

    let submissions = [
        RawSubmission {
            id: Some("  QR-42 ".into()),
            variety: Some("Freedom".into()),
            size: Some("LARGO".into()),
            stem_count: Some("30".into()),
            stage: Some("corte".into()),
            block: Some(" 3 ".into()),
            record_type: Some("fin_corte".into()),
            force: None,
        },
        RawSubmission {
            id: Some("QR-43".into()),
            variety: Some("vendela".into()),
            size: Some("largo".into()),
            stem_count: Some("12".into()),
            block: Some("1".into()),
            record_type: Some("nacional".into()),
            ..Default::default()
        },
        RawSubmission {
            id: Some("QR-44".into()),
            variety: Some("freedom".into()),
            stem_count: Some("treinta".into()),
            block: Some("3".into()),
            ..Default::default()
        },
    ];

    for raw in submissions {
        match normalize(raw, &cfg, &clock) {
            Ok(record) => println!("{record:#?}"),
            Err(err) => eprintln!("rejected ({}): {err}", err.code()),
        }
    }
}
