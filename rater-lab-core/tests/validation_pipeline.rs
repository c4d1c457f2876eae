//! End-to-end pipeline tests over on-disk fixtures.

use std::fs;
use std::path::Path;

use rater_lab_core::contracts::{AnalysisConfig, Dimension, OverallConclusion, WarningKind};
use rater_lab_core::pipeline::{PipelineError, ValidationPipeline};
use rater_lab_core::report::read_merged_csv;

fn write_coded(dir: &Path, id: &str, fluency: f64, flexibility: f64, elaboration: f64) {
    let body = format!(
        r#"{{
            "participant_id": "{id}",
            "creativity_metrics": {{
                "fluency": {fluency},
                "flexibility": {flexibility},
                "elaboration_total": {elaboration},
                "categories_used": ["animals"]
            }}
        }}"#
    );
    fs::write(dir.join(format!("{id}_coded.json")), body).unwrap();
}

fn write_manual(path: &Path, rows: &[(&str, f64, f64, f64)]) {
    let mut csv = String::from("ParticipantID,Age,Fluency,Flexibility,Elaboration\n");
    for (id, fluency, flexibility, elaboration) in rows {
        csv.push_str(&format!("{id},7,{fluency},{flexibility},{elaboration}\n"));
    }
    fs::write(path, csv).unwrap();
}

fn pipeline() -> ValidationPipeline {
    ValidationPipeline::new(AnalysisConfig::default()).unwrap()
}

#[tokio::test]
async fn zero_variance_fluency_is_reported_undefined_not_nan() {
    // Two subjects with identical manual and automated Fluency values on one
    // side being constant: the correlation must come back unavailable, never
    // NaN, and the run must not fail.
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 5.0, 5.0, 5.0);
    write_coded(coded.path(), "P02", 3.0, 5.0, 3.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 5.0, 5.0), ("P02", 3.0, 5.0, 3.0)]);

    let out = tempfile::tempdir().unwrap();
    let outcome = pipeline()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    // Flexibility is constant on both sides.
    let flexibility = outcome.agreement[&Dimension::Flexibility].result().unwrap();
    assert_eq!(flexibility.correlation, None);
    assert_eq!(flexibility.mae, 0.0);

    // Fluency varies and agrees perfectly; n = 2 still yields r but no p.
    let fluency = outcome.agreement[&Dimension::Fluency].result().unwrap();
    assert!((fluency.correlation.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(fluency.p_value, None);

    assert!(!outcome.report_text.contains("NaN"));
}

#[tokio::test]
async fn one_sided_subjects_are_reported_and_discrepancy_flagged() {
    // P01 manual only, P02 automated only, P03 in both with a difference of
    // exactly the default threshold.
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P02", 4.0, 2.0, 3.0);
    write_coded(coded.path(), "P03", 6.0, 3.0, 2.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 2.0, 1.0), ("P03", 4.0, 3.0, 2.0)]);

    let out = tempfile::tempdir().unwrap();
    let outcome = pipeline()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    assert_eq!(outcome.alignment.aligned_count, 1);
    assert!(outcome.alignment.manual_only.contains("P01"));
    assert!(outcome.alignment.automated_only.contains("P02"));
    assert_eq!(
        outcome
            .run_summary
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::AlignmentMismatch)
            .count(),
        2
    );

    assert_eq!(outcome.flags.len(), 1);
    let flag = &outcome.flags[0];
    assert_eq!(flag.subject_id, "P03");
    assert_eq!(flag.dimension, Dimension::Fluency);
    assert_eq!(flag.difference, -2.0);
}

#[tokio::test]
async fn disjoint_sources_report_both_differences_and_conclude_poor() {
    // No subject id appears in both sources. The run must still complete,
    // with zero aligned rows, both set differences reported, every
    // dimension short of valid data and the conclusion degraded to Poor.
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P10", 4.0, 2.0, 3.0);
    write_coded(coded.path(), "P11", 6.0, 3.0, 2.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 2.0, 1.0), ("P02", 4.0, 3.0, 2.0)]);

    let out = tempfile::tempdir().unwrap();
    let outcome = pipeline()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    assert_eq!(outcome.alignment.aligned_count, 0);
    assert!(outcome.alignment.manual_only.contains("P01"));
    assert!(outcome.alignment.manual_only.contains("P02"));
    assert!(outcome.alignment.automated_only.contains("P10"));
    assert!(outcome.alignment.automated_only.contains("P11"));
    assert_eq!(
        outcome
            .run_summary
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::AlignmentMismatch)
            .count(),
        4
    );

    for dimension in [Dimension::Fluency, Dimension::Flexibility, Dimension::Elaboration] {
        assert!(outcome.agreement[&dimension].result().is_none());
    }
    assert!(outcome.flags.is_empty());
    assert_eq!(outcome.run_summary.conclusion, OverallConclusion::Poor);
    assert!(out.path().join("validation_report.txt").exists());
}

#[tokio::test]
async fn perfect_elaboration_agreement_concludes_excellent() {
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 1.0, 1.0, 1.0);
    write_coded(coded.path(), "P02", 2.0, 2.0, 2.0);
    write_coded(coded.path(), "P03", 3.0, 3.0, 3.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(
        &manual,
        &[("P01", 1.0, 1.0, 1.0), ("P02", 2.0, 2.0, 2.0), ("P03", 3.0, 3.0, 3.0)],
    );

    let mut config = AnalysisConfig::default();
    config.dimensions = vec![Dimension::Elaboration];
    let out = tempfile::tempdir().unwrap();
    let outcome = ValidationPipeline::new(config)
        .unwrap()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    let elaboration = outcome.agreement[&Dimension::Elaboration].result().unwrap();
    assert_eq!(elaboration.mae, 0.0);
    assert_eq!(elaboration.mean_difference, 0.0);
    assert!((elaboration.correlation.unwrap() - 1.0).abs() < 1e-9);
    assert_eq!(outcome.run_summary.conclusion, OverallConclusion::Excellent);
    assert!(outcome
        .report_text
        .contains("CONCLUSION: Excellent agreement between manual and automated coding."));
}

#[tokio::test]
async fn merged_table_round_trips_exactly() {
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 10.0, 4.0, 7.5);
    write_coded(coded.path(), "P02", 8.0, 3.0, 6.25);
    write_coded(coded.path(), "P03", 12.0, 5.0, 9.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(
        &manual,
        &[("P01", 9.0, 4.0, 7.0), ("P02", 8.0, 2.0, 6.25), ("P03", 11.0, 5.0, 8.0)],
    );

    let out = tempfile::tempdir().unwrap();
    let outcome = pipeline()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    let merged = out.path().join("merged_comparison.csv");
    assert!(merged.exists());
    let reloaded = read_merged_csv(&merged).unwrap();
    assert_eq!(reloaded.len(), outcome.alignment.aligned_count);

    let ids: Vec<&str> = reloaded.rows.iter().map(|r| r.subject_id.as_str()).collect();
    assert_eq!(ids, vec!["P01", "P02", "P03"]);

    // Exact values survive the CSV round trip.
    assert_eq!(reloaded.rows[0].pair(Dimension::Fluency).manual, Some(9.0));
    assert_eq!(reloaded.rows[0].pair(Dimension::Fluency).automated, Some(10.0));
    assert_eq!(reloaded.rows[1].pair(Dimension::Elaboration).manual, Some(6.25));
    assert_eq!(reloaded.rows[1].pair(Dimension::Elaboration).automated, Some(6.25));
    assert_eq!(reloaded.rows[2].pair(Dimension::ElabDensity).manual, None);
}

#[tokio::test]
async fn duplicate_coded_files_keep_first_and_warn() {
    let coded = tempfile::tempdir().unwrap();
    // Both normalize to P01; lexicographic order decides the winner.
    fs::write(
        coded.path().join("P01_a_coded.json"),
        r#"{"creativity_metrics": {"fluency": 5}}"#,
    )
    .unwrap();
    fs::write(
        coded.path().join("P01_b_coded.json"),
        r#"{"creativity_metrics": {"fluency": 9}}"#,
    )
    .unwrap();

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 1.0, 1.0)]);

    let stats = pipeline()
        .quick_stats(coded.path(), &manual)
        .await
        .unwrap();

    assert_eq!(stats.alignment.aligned_count, 1);
    assert!(stats
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::DuplicateId));
}

#[tokio::test]
async fn unparsable_coded_file_does_not_poison_the_run() {
    let coded = tempfile::tempdir().unwrap();
    fs::write(coded.path().join("broken_coded.json"), "{ nope").unwrap();
    write_coded(coded.path(), "P01", 5.0, 2.0, 3.0);
    write_coded(coded.path(), "P02", 3.0, 1.0, 2.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 2.0, 3.0), ("P02", 3.0, 1.0, 2.0)]);

    let stats = pipeline()
        .quick_stats(coded.path(), &manual)
        .await
        .unwrap();

    assert_eq!(stats.alignment.aligned_count, 2);
    assert!(stats
        .warnings
        .iter()
        .any(|w| w.kind == WarningKind::ParseError));
}

#[tokio::test]
async fn lowering_threshold_only_adds_flags() {
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 9.0, 4.0, 6.0);
    write_coded(coded.path(), "P02", 4.0, 4.0, 4.0);
    write_coded(coded.path(), "P03", 7.0, 1.0, 2.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(
        &manual,
        &[("P01", 5.0, 4.0, 5.0), ("P02", 4.0, 3.0, 4.0), ("P03", 6.0, 1.0, 2.0)],
    );

    let mut flags_by_threshold = Vec::new();
    for threshold in [4.0, 2.0, 1.0, 0.0] {
        let config = AnalysisConfig::default().with_threshold(threshold);
        let out = tempfile::tempdir().unwrap();
        let outcome = ValidationPipeline::new(config)
            .unwrap()
            .run(coded.path(), &manual, out.path())
            .await
            .unwrap();
        flags_by_threshold.push(outcome.flags);
    }

    for window in flags_by_threshold.windows(2) {
        let (higher, lower) = (&window[0], &window[1]);
        assert!(lower.len() >= higher.len());
        for flag in higher {
            assert!(lower.contains(flag));
        }
    }
}

#[tokio::test]
async fn missing_inputs_abort_the_run() {
    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 1.0, 1.0)]);

    let err = pipeline()
        .quick_stats(Path::new("/nonexistent/coded"), &manual)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Loader(_)));

    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 5.0, 1.0, 1.0);
    let err = pipeline()
        .quick_stats(coded.path(), Path::new("/nonexistent/manual.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Loader(_)));
}

#[tokio::test]
async fn run_writes_all_artifacts_and_summary() {
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 5.0, 2.0, 3.0);
    write_coded(coded.path(), "P02", 3.0, 1.0, 2.0);
    write_coded(coded.path(), "P03", 8.0, 4.0, 6.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(
        &manual,
        &[("P01", 5.0, 2.0, 3.0), ("P02", 4.0, 1.0, 2.0), ("P03", 8.0, 4.0, 5.0)],
    );

    let out = tempfile::tempdir().unwrap();
    let outcome = pipeline()
        .run(coded.path(), &manual, out.path())
        .await
        .unwrap();

    assert!(out.path().join("merged_comparison.csv").exists());
    assert!(out.path().join("validation_report.txt").exists());
    assert!(out.path().join("run_summary.json").exists());
    assert!(out.path().join("plots/Fluency_comparison.json").exists());
    assert!(out.path().join("plots/Elaboration_comparison.json").exists());

    let summary_json = fs::read_to_string(out.path().join("run_summary.json")).unwrap();
    let summary: serde_json::Value = serde_json::from_str(&summary_json).unwrap();
    assert_eq!(summary["subjects_aligned"], 3);
    assert_eq!(summary["inputs_hash"].as_str().unwrap().len(), 64);
    assert_eq!(summary["inputs_hash"], outcome.run_summary.inputs_hash);
}

#[tokio::test]
async fn rerun_over_same_inputs_has_same_inputs_hash() {
    let coded = tempfile::tempdir().unwrap();
    write_coded(coded.path(), "P01", 5.0, 2.0, 3.0);
    write_coded(coded.path(), "P02", 3.0, 1.0, 2.0);

    let manual_dir = tempfile::tempdir().unwrap();
    let manual = manual_dir.path().join("manual.csv");
    write_manual(&manual, &[("P01", 5.0, 2.0, 3.0), ("P02", 4.0, 1.0, 2.0)]);

    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    let first = pipeline().run(coded.path(), &manual, out_a.path()).await.unwrap();
    let second = pipeline().run(coded.path(), &manual, out_b.path()).await.unwrap();

    assert_eq!(first.run_summary.inputs_hash, second.run_summary.inputs_hash);
    assert_ne!(first.run_summary.run_id, second.run_summary.run_id);
}
