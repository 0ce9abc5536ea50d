//! End-to-end pipeline runs over a scratch data root.

use comex_core::{Dimension, FlowDirection, RunPeriod};
use comex_runner::{Pipeline, PipelineConfig, PipelineError};
use std::fs;
use std::path::Path;

const EXPORTS: &str = "\
DATE,COMMODITY_CODE,SUBNATIONAL_CODE,PARTNER_COUNTRY_ISO,PORT_CODE,WEIGHT_KG,FOB_VALUE
2024-1-01,001,SP,USA,0817800,100,1.5
2024-1-01,001,PR,USA,0927800,50,2.5
2024-1-01,001,SP,CHN,0817800,30,3.0
2024-2-01,001,SP,CHN,0817800,20,1.0
";

const IMPORTS: &str = "\
DATE,COMMODITY_CODE,SUBNATIONAL_CODE,PARTNER_COUNTRY_ISO,PORT_CODE,WEIGHT_KG,FOB_VALUE,FREIGHT_VALUE,INSURANCE_VALUE
2024-1-01,001,SP,USA,0817800,10,1.0,0.5,0.1
";

fn setup(root: &Path) -> PipelineConfig {
    let aux = root.join("auxiliar");
    let processed = root.join("processed");
    fs::create_dir_all(&aux).unwrap();
    fs::create_dir_all(&processed).unwrap();

    fs::write(aux.join("country_conversion.csv"), "<old>,<new>\nUSA,US\nCHN,CN\n").unwrap();
    fs::write(
        aux.join("country_series.csv"),
        "COMMODITY_CODE,PARTNER_COUNTRY_ISO\n001,USA\n001,CHN\n002,ARG\n",
    )
    .unwrap();
    fs::write(aux.join("harbor_series.csv"), "COMMODITY_CODE,PORT_CODE\n001,0817800\n").unwrap();
    fs::write(processed.join("EXP_final_processed.csv"), EXPORTS).unwrap();
    fs::write(processed.join("IMP_final_processed.csv"), IMPORTS).unwrap();

    PipelineConfig {
        run_period: Some(RunPeriod::new(2024, 5).unwrap()),
        ..PipelineConfig::with_data_root(root)
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn full_run_produces_bundles_and_world_rows() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let report = Pipeline::new(config.clone()).run().unwrap();

    // country: 2 exports + 1 import, harbor: 1 + 1, state: no definitions
    assert_eq!(report.artifacts_written, 5);
    let country = report.dimension(Dimension::Country).unwrap();
    assert_eq!(country.exports.produced, 2);
    assert_eq!(country.exports.skipped, 1);
    assert_eq!(country.imports.produced, 1);
    assert_eq!(country.imports.skipped, 2);
    assert_eq!(country.pruned, 3);

    let country_dir = config.dimension_dir(Dimension::Country);
    assert_eq!(
        file_names(&country_dir),
        vec![
            "country_series_exports_2024_05.ipv",
            "country_series_imports_2024_05.ipv"
        ]
    );

    let exports = country.bundle(FlowDirection::Export).unwrap();
    assert_eq!(exports.rows, 5);
    let content = fs::read_to_string(&exports.path).unwrap();
    assert!(content.starts_with("<DATA>,<KGL>,<FOB>,<COD>\n"));
    assert!(content.contains("2024-01-01,150.0,4.0,COMEX:001_EX_US_BR"));
    assert!(content.contains("2024-01-01,180.0,7.0,COMEX:001_EX_WO_BR"));
    assert!(content.contains("2024-02-01,20.0,1.0,COMEX:001_EX_WO_BR"));
    assert!(!content.contains("2024-1-"));

    let imports = country.bundle(FlowDirection::Import).unwrap();
    assert_eq!(imports.rows, 2);
    let header = fs::read_to_string(&imports.path).unwrap();
    assert!(header.starts_with("<DATA>,<KGL>,<FOB>,<VLF>,<VLS>,<COD>\n"));

    assert_eq!(report.world.len(), 2);
    assert_eq!(report.world[0].summary.world_rows, 2);
    assert_eq!(report.world[1].summary.world_rows, 1);
}

#[test]
fn missing_definitions_leave_empty_bundles() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let report = Pipeline::new(config.clone()).run().unwrap();

    let state = report.dimension(Dimension::State).unwrap();
    assert_eq!(state.exports.produced + state.imports.produced, 0);
    let bundle = state.bundle(FlowDirection::Export).unwrap();
    assert_eq!(bundle.rows, 0);
    assert_eq!(
        fs::read_to_string(&bundle.path).unwrap(),
        "<DATA>,<KGL>,<FOB>,<COD>\n"
    );
    assert_eq!(
        file_names(&config.dimension_dir(Dimension::State)),
        vec!["state_series_exports_2024_05.ipv", "state_series_imports_2024_05.ipv"]
    );
}

#[test]
fn rerun_with_same_period_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let first = Pipeline::new(config.clone()).run().unwrap();
    let second = Pipeline::new(config).run().unwrap();

    for dimension in Dimension::ALL {
        let a = first.dimension(dimension).unwrap();
        let b = second.dimension(dimension).unwrap();
        for flow in FlowDirection::ALL {
            let (a, b) = (a.bundle(flow).unwrap(), b.bundle(flow).unwrap());
            assert_eq!(a.path, b.path);
            assert_eq!(a.blake3, b.blake3, "{dimension} {flow} bundle changed on rerun");
        }
    }
    assert_eq!(second.world[0].summary.replaced_rows, 0);
}

#[test]
fn stale_bundle_from_earlier_month_is_removed() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let harbor_dir = config.dimension_dir(Dimension::Harbor);
    fs::create_dir_all(&harbor_dir).unwrap();
    fs::write(
        harbor_dir.join("harbor_series_exports_2024_04.ipv"),
        "<DATA>,<KGL>,<FOB>,<COD>\n",
    )
    .unwrap();

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(
        file_names(&harbor_dir),
        vec![
            "harbor_series_exports_2024_05.ipv",
            "harbor_series_imports_2024_05.ipv"
        ]
    );
    assert_eq!(report.dimension(Dimension::Harbor).unwrap().pruned, 3);
}

#[test]
fn missing_processed_tables_run_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    fs::remove_dir_all(&config.processed_dir).unwrap();

    let report = Pipeline::new(config).run().unwrap();
    assert_eq!(report.artifacts_written, 0);
    assert_eq!(report.skipped(), 8);
    let country = report.dimension(Dimension::Country).unwrap();
    assert_eq!(country.bundle(FlowDirection::Export).unwrap().rows, 0);
    assert_eq!(report.world[0].summary.world_rows, 0);
}

#[test]
fn missing_translation_table_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    fs::remove_file(config.translation_path()).unwrap();

    let err = Pipeline::new(config.clone()).run().unwrap_err();
    assert!(matches!(err, PipelineError::Translation(_)));
    for dimension in Dimension::ALL {
        assert!(file_names(&config.dimension_dir(dimension)).is_empty());
    }
}
