//! End-to-end merge and analysis over a temporary directory.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tempfile::TempDir;
use yearwise::charts::{ChartData, ChartKind, StaticChartRenderer};
use yearwise::config::AppConfig;
use yearwise::data::{processed_file_name, AnalysisError, AnalysisTable, YearMerger};

const HEADER: &str =
    "CRTR_QURTR,MM_INCM,HD_CARD_GRAMT_AVG,CR_NTSL_USE_GRAMT_AVG,CSADVC_USE_GRAMT_AVG\n";

fn write(dir: &Path, name: &str, content: &str) {
    std::fs::write(dir.join(name), content).unwrap();
}

fn raw_inputs(dir: &Path) {
    write(
        dir,
        "a_2018.csv",
        &format!(
            "{HEADER}20181,2500,12000,300,50\n20182,3100,15000,200,0\n20191,9999,9999,9999,9999\n"
        ),
    );
    write(
        dir,
        "b_mixed.csv",
        &format!("{HEADER}20203,4200,18000,100,20\n20234,5100,400000,80,10\n20234,5200,21000,90,15\n"),
    );
    write(dir, "c_unrelated.csv", "ID,VALUE\n1,2\n");
    write(dir, "notes.txt", "not a csv");
}

#[test]
fn test_merge_then_analyze() {
    let raw = TempDir::new().unwrap();
    let processed = TempDir::new().unwrap();
    raw_inputs(raw.path());

    let config = AppConfig::default();
    let merger = YearMerger::new(&config.years, &config.merge.quarter_column);
    let summary = merger.run(raw.path(), processed.path()).unwrap();

    assert_eq!(summary.years_processed(), 3);
    assert!(summary.empty_years.is_empty());
    let rows: Vec<(i32, usize)> = summary.outputs.iter().map(|o| (o.year, o.rows)).collect();
    assert_eq!(rows, vec![(2018, 2), (2020, 1), (2023, 2)]);
    for year in [2018, 2020, 2023] {
        assert!(processed.path().join(processed_file_name(year)).is_file());
    }

    let table = AnalysisTable::load(processed.path(), &config.years, &config.analysis).unwrap();
    assert_eq!(table.height(), 5);
    assert_eq!(table.card_column(), "HD_CARD_GRAMT_AVG");
    assert_eq!(table.years(), vec![2018, 2020, 2023]);

    let mut rng = StdRng::seed_from_u64(7);
    let data = ChartData::build_with_rng(&table, &config.analysis.scatter, &mut rng).unwrap();
    assert_eq!(data.years, vec![2018, 2020, 2023]);
    assert_eq!(data.labels.len(), 4);
    assert_eq!(data.correlation.labels.len(), 5);

    // The 400000 card row is above the cap and leaves the scatter.
    assert_eq!(data.scatter.point_count(), 4);
    assert_eq!(data.shares.len(), 3);
    assert!(data.shares.iter().all(|s| !s.slices.is_empty()));

    let means = &data.yearly_means;
    assert!((means.get(0, 0) - 2800.0).abs() < 1e-9);
    assert!((means.get(1, 2) - 210_500.0).abs() < 1e-9);

    assert_eq!(ChartKind::ALL.len(), 6);
}

#[test]
fn test_missing_year_file_is_skipped() {
    let raw = TempDir::new().unwrap();
    let processed = TempDir::new().unwrap();
    write(
        raw.path(),
        "only_2020.csv",
        &format!("{HEADER}20201,1000,2000,30,40\n20202,1500,2500,35,45\n"),
    );

    let config = AppConfig::default();
    let summary = YearMerger::new(&config.years, &config.merge.quarter_column)
        .run(raw.path(), processed.path())
        .unwrap();
    assert_eq!(summary.empty_years, vec![2018, 2023]);

    let table = AnalysisTable::load(processed.path(), &config.years, &config.analysis).unwrap();
    assert_eq!(table.years(), vec![2020]);
    assert_eq!(table.height(), 2);
}

#[test]
fn test_card_column_missing_is_reported() {
    let processed = TempDir::new().unwrap();
    write(
        processed.path(),
        &processed_file_name(2018),
        "CRTR_QURTR,MM_INCM,CR_NTSL_USE_GRAMT_AVG,CSADVC_USE_GRAMT_AVG\n20181,1000,1,2\n",
    );

    let config = AppConfig::default();
    let result = AnalysisTable::load(processed.path(), &config.years, &config.analysis);
    assert!(matches!(result, Err(AnalysisError::CardColumnNotFound { .. })));
}

#[test]
fn test_empty_processed_dir_has_no_data() {
    let processed = TempDir::new().unwrap();
    let config = AppConfig::default();
    let result = AnalysisTable::load(processed.path(), &config.years, &config.analysis);
    assert!(matches!(result, Err(AnalysisError::NoData(_))));
}

#[test]
fn test_merge_analyze_and_render_pngs() {
    let raw = TempDir::new().unwrap();
    let processed = TempDir::new().unwrap();
    let charts = TempDir::new().unwrap();
    write(
        raw.path(),
        "wide.csv",
        &format!(
            "{HEADER}20181,2500,12000,300,50\n20182,3100,15000,200,0\n20203,4200,18000,100,20\n20234,5100,21000,80,10\n"
        ),
    );

    let config = AppConfig::default();
    let summary = YearMerger::new(&config.years, &config.merge.quarter_column)
        .run(raw.path(), processed.path())
        .unwrap();
    assert_eq!(summary.years_processed(), 3);

    let table = AnalysisTable::load(processed.path(), &config.years, &config.analysis).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let data = ChartData::build_with_rng(&table, &config.analysis.scatter, &mut rng).unwrap();

    let renderer = StaticChartRenderer::new(
        &config.charts.font,
        (config.charts.width, config.charts.height),
    );
    let out_dir = charts.path().join("png");
    let written = renderer.render_all(&data, &out_dir).unwrap();

    assert_eq!(written.len(), ChartKind::ALL.len());
    for (path, kind) in written.iter().zip(ChartKind::ALL) {
        assert_eq!(path, &out_dir.join(format!("{}.png", kind.file_stem())));
        let bytes = std::fs::read(path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

