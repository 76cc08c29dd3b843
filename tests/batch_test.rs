mod common;

use common::{crashed, exited_ok, list_output, success_output, template_in, MockInvoker};
use ezcad_batch::{BatchError, BatchProcessor, BridgeCommand, CellValue, DataRow, RowResult};
use std::path::Path;

fn serial_rows(n: usize) -> Vec<DataRow> {
    (1..=n)
        .map(|i| {
            DataRow::from_pairs([
                ("id", format!("{i}")),
                ("Serial", format!("SN{}", 100000 + i)),
                ("PartNumber", "PN-A".to_string()),
            ])
        })
        .collect()
}

#[tokio::test]
async fn single_row_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::happy(&["Serial", "PartNumber"]);
    let mut processor = BatchProcessor::new(mock.clone());

    let row = DataRow::from_pairs([
        ("id", "1"),
        ("Serial", "SN100001"),
        ("PartNumber", "PN-A"),
        ("Extra", "ignored"),
    ]);
    let report = processor.process_batch(&template, &[row], None).await;

    assert!(report.is_success());
    assert_eq!(report.stats.total, 1);
    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(report.saved, None);

    assert_eq!(mock.call_names(), vec!["open", "list", "update", "update", "mark"]);
    assert_eq!(mock.updated_entities(), vec!["Serial", "PartNumber"]);
    assert_eq!(
        mock.calls().last(),
        Some(&BridgeCommand::Mark { entity: None })
    );
}

#[tokio::test]
async fn missing_template_never_invokes_bridge() {
    let mock = MockInvoker::happy(&["Serial"]);
    let mut processor = BatchProcessor::new(mock.clone());

    let report = processor
        .process_batch(Path::new("/no/such/plate.ezd"), &serial_rows(3), None)
        .await;

    assert_eq!(report.stats.total, 0);
    assert!(matches!(report.error, Some(BatchError::TemplateNotFound { .. })));
    assert!(!report.error_message().unwrap().is_empty());
    assert!(mock.calls().is_empty());
    assert!(report.rows.is_empty());
}

#[tokio::test]
async fn open_failure_aborts_before_any_row() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::with(|cmd| match cmd {
        BridgeCommand::Open { .. } => "Failed to open EZD file".to_string(),
        other => success_output(other),
    });
    let mut processor = BatchProcessor::new(mock.clone());

    let report = processor
        .process_batch(&template, &serial_rows(2), Some(&dir.path().join("out.ezd")))
        .await;

    assert!(matches!(report.error, Some(BatchError::TemplateOpenFailed { .. })));
    assert_eq!(report.stats.total, 0);
    assert_eq!(mock.call_names(), vec!["open"]);
    assert!(!processor.session().is_open());
}

#[tokio::test]
async fn update_failure_skips_mark_and_batch_continues() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let listing = list_output(&["Serial", "PartNumber"]);
    let mock = MockInvoker::with(move |cmd| match cmd {
        BridgeCommand::List => listing.clone(),
        BridgeCommand::Update { text, .. } if text == "SN100002" => {
            "Update failed: entity not found".to_string()
        }
        other => success_output(other),
    });
    let mut processor = BatchProcessor::new(mock.clone());

    let report = processor.process_batch(&template, &serial_rows(3), None).await;

    assert_eq!(report.stats.total, 3);
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(
        report.rows[1].result,
        RowResult::UpdateFailed {
            entities: vec!["Serial".to_string()]
        }
    );
    // 第二行的 PartNumber 仍然更新，但不标刻
    let marks = mock.call_names().iter().filter(|n| **n == "mark").count();
    assert_eq!(marks, 2);
    assert_eq!(mock.updated_entities().len(), 6);
}

#[tokio::test]
async fn mark_failure_counts_as_failed_row() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let listing = list_output(&["Serial"]);
    let mock = MockInvoker::with(move |cmd| match cmd {
        BridgeCommand::List => listing.clone(),
        BridgeCommand::Mark { .. } => "Laser not ready".to_string(),
        other => success_output(other),
    });
    let mut processor = BatchProcessor::new(mock);

    let report = processor.process_batch(&template, &serial_rows(2), None).await;

    assert_eq!(report.stats.succeeded, 0);
    assert_eq!(report.stats.failed, 2);
    assert!(report
        .rows
        .iter()
        .all(|r| r.result == RowResult::MarkFailed));
}

#[tokio::test]
async fn panicking_row_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let listing = list_output(&["Serial", "PartNumber"]);
    let mock = MockInvoker::with(move |cmd| match cmd {
        BridgeCommand::List => listing.clone(),
        BridgeCommand::Update { text, .. } if text == "SN100002" => panic!("bridge exploded"),
        other => success_output(other),
    });
    let mut processor = BatchProcessor::new(mock);

    let report = processor.process_batch(&template, &serial_rows(4), None).await;

    assert_eq!(report.stats.total, 4);
    assert_eq!(report.stats.succeeded + report.stats.failed, report.stats.total);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(
        report.rows[1].result,
        RowResult::Panicked {
            message: "bridge exploded".to_string()
        }
    );
    assert_eq!(report.rows[3].result, RowResult::Marked);
}

#[tokio::test]
async fn unknown_fields_issue_no_update() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::happy(&["Serial"]);
    let mut processor = BatchProcessor::new(mock.clone());

    let row = DataRow::new(
        Some("A-1".into()),
        vec![
            ("Color".to_string(), CellValue::from_text("red")),
            ("Serial".to_string(), CellValue::Number(42.0)),
            ("Weight".to_string(), CellValue::Number(1.5)),
        ],
    );
    let report = processor.process_batch(&template, &[row], None).await;

    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(
        mock.calls()
            .into_iter()
            .filter(|c| matches!(c, BridgeCommand::Update { .. }))
            .collect::<Vec<_>>(),
        vec![BridgeCommand::Update {
            entity: "Serial".into(),
            text: "42".into()
        }]
    );
}

#[tokio::test]
async fn rows_are_processed_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::happy(&["Serial"]);
    let mut processor = BatchProcessor::new(mock.clone());

    let report = processor.process_batch(&template, &serial_rows(5), None).await;

    let texts: Vec<String> = mock
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            BridgeCommand::Update { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(texts, vec!["SN100001", "SN100002", "SN100003", "SN100004", "SN100005"]);
    let ids: Vec<&str> = report.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
}

#[tokio::test]
async fn entities_are_listed_once_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::happy(&["Serial", "PartNumber"]);
    let mut processor = BatchProcessor::new(mock.clone());

    processor.process_batch(&template, &serial_rows(3), None).await;

    let lists = mock.call_names().iter().filter(|n| **n == "list").count();
    assert_eq!(lists, 1);
}

#[tokio::test]
async fn save_failure_does_not_change_stats() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let listing = list_output(&["Serial"]);
    let mock = MockInvoker::with(move |cmd| match cmd {
        BridgeCommand::List => listing.clone(),
        BridgeCommand::Save { .. } => "Error: disk full".to_string(),
        other => success_output(other),
    });
    let mut processor = BatchProcessor::new(mock.clone());
    let output = dir.path().join("out.ezd");

    let report = processor
        .process_batch(&template, &serial_rows(2), Some(&output))
        .await;

    assert!(report.is_success());
    assert_eq!(report.saved, Some(false));
    assert_eq!(report.stats.succeeded, 2);
    assert_eq!(mock.call_names().last(), Some(&"save"));
}

#[tokio::test]
async fn empty_batch_still_saves_output() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::happy(&["Serial"]);
    let mut processor = BatchProcessor::new(mock.clone());
    let output = dir.path().join("out.ezd");

    let report = processor.process_batch(&template, &[], Some(&output)).await;

    assert_eq!(report.stats.total, 0);
    assert_eq!(report.saved, Some(true));
    assert_eq!(mock.call_names(), vec!["open", "list", "save"]);
}

#[tokio::test]
async fn failed_discovery_never_marks_rows_with_nothing_updated() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::with_results(|cmd| match cmd {
        BridgeCommand::List => crashed("Unhandled exception"),
        BridgeCommand::Update { .. } => exited_ok("Update failed: entity not found".into()),
        other => exited_ok(success_output(other)),
    });
    let mut processor = BatchProcessor::new(mock.clone());
    let rows = vec![
        DataRow::from_pairs([("id", "1"), ("Serial", "SN1")]),
        DataRow::from_pairs([("id", "2")]),
    ];

    let report = processor.process_batch(&template, &rows, None).await;

    assert!(report.is_success());
    assert_eq!(report.stats.succeeded, 0);
    assert_eq!(report.stats.failed, 2);
    assert_eq!(
        report.rows[0].result,
        RowResult::UpdateFailed {
            entities: vec!["Serial".to_string()]
        }
    );
    assert_eq!(report.rows[1].result, RowResult::NothingUpdated);
    assert!(!mock.call_names().contains(&"mark"));
}

#[tokio::test]
async fn failed_discovery_still_tries_every_field() {
    let dir = tempfile::tempdir().unwrap();
    let template = template_in(&dir, "plate.ezd");
    let mock = MockInvoker::with_results(|cmd| match cmd {
        BridgeCommand::List => crashed("Unhandled exception"),
        other => exited_ok(success_output(other)),
    });
    let mut processor = BatchProcessor::new(mock.clone());

    let report = processor.process_batch(&template, &serial_rows(1), None).await;

    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(mock.updated_entities(), vec!["Serial", "PartNumber"]);
    assert_eq!(
        mock.call_names(),
        vec!["open", "list", "update", "update", "mark"]
    );
}
