//! Property-based tests for the engine invariants.
//!
//! Uses proptest to verify:
//! 1. Date canonicalization is idempotent and only pads single-digit months
//! 2. Series codes survive format → parse for any value, underscores included
//! 3. World rows equal the per-country sums for every (date, commodity, flow)

use comex_core::data::canonicalize::{canonicalize_line, DateCanonicalizer};
use comex_core::series::read_artifact;
use comex_core::{synthesize_world, FlowDirection, SeriesCode};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_date() -> impl Strategy<Value = (u32, u32, bool)> {
    (2000u32..2100, 1u32..=12, any::<bool>())
}

fn render_date((year, month, padded): (u32, u32, bool)) -> String {
    if padded {
        format!("{year}-{month:02}-01")
    } else {
        format!("{year}-{month}-01")
    }
}

fn arb_flow() -> impl Strategy<Value = FlowDirection> {
    prop_oneof![Just(FlowDirection::Export), Just(FlowDirection::Import)]
}

fn arb_row() -> impl Strategy<Value = (u32, &'static str, &'static str, f64, f64)> {
    (
        1u32..=12,
        prop_oneof![Just("001"), Just("002"), Just("017")],
        prop_oneof![Just("US"), Just("CN"), Just("AR"), Just("DE")],
        (0.0..1_000_000.0_f64).prop_map(|v| (v * 100.0).round() / 100.0),
        (0.0..1_000_000.0_f64).prop_map(|v| (v * 100.0).round() / 100.0),
    )
}

// ── 1. Date canonicalization ─────────────────────────────────────────

proptest! {
    #[test]
    fn date_repair_is_idempotent(date in arb_date(), tail in "[A-Z0-9_:,.]{0,24}") {
        let line = format!("{},{tail}\n", render_date(date));
        let (once, _) = DateCanonicalizer::canonicalize_content(&line);
        let (twice, changed) = DateCanonicalizer::canonicalize_content(&once);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(changed, 0);
        let prefix = format!("{:04}-{:02}-01,", date.0, date.1);
        let suffix = format!(",{tail}\n");
        prop_assert!(once.starts_with(&prefix), "expected prefix {}", prefix);
        prop_assert!(once.ends_with(&suffix), "expected suffix {:?}", suffix);
    }

    #[test]
    fn padded_dates_are_untouched(date in arb_date()) {
        let line = format!("{}-{:02}-01,1.0", date.0, date.1);
        prop_assert_eq!(canonicalize_line(&line), line.as_str());
    }
}

// ── 2. Series codes ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn series_code_parses_back(
        commodity in "[0-9]{3}",
        flow in arb_flow(),
        value in "[A-Z0-9][A-Z0-9_]{0,10}",
    ) {
        let code = SeriesCode::new(commodity, flow, value);
        let parsed: SeriesCode = code.to_string().parse().unwrap();
        prop_assert_eq!(parsed, code);
    }
}

// ── 3. World sums ────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn world_row_equals_country_sum(rows in prop::collection::vec(arb_row(), 1..40)) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("country_series_exports_2024_03.ipv");

        let mut content = String::from("<DATA>,<KGL>,<FOB>,<COD>\n");
        let mut expected: BTreeMap<(String, String), (f64, f64)> = BTreeMap::new();
        for (month, commodity, country, kgl, fob) in &rows {
            let date = format!("2024-{month:02}-01");
            let code = SeriesCode::new(*commodity, FlowDirection::Export, *country);
            content.push_str(&format!("{date},{kgl},{fob},{code}\n"));
            let entry = expected.entry((date, commodity.to_string())).or_default();
            entry.0 += kgl;
            entry.1 += fob;
        }
        std::fs::write(&path, content).unwrap();

        let summary = synthesize_world(&path).unwrap();
        prop_assert_eq!(summary.world_rows, expected.len());
        prop_assert_eq!(summary.country_rows, rows.len());

        let table = read_artifact(&path).unwrap();
        let df = &table.frame;
        let dates = df.column("<DATA>").unwrap().str().unwrap();
        let codes = df.column("<COD>").unwrap().str().unwrap();
        let kgl = df.column("<KGL>").unwrap().f64().unwrap();
        let fob = df.column("<FOB>").unwrap().f64().unwrap();

        let mut seen = 0;
        for i in 0..df.height() {
            let code: SeriesCode = codes.get(i).unwrap().parse().unwrap();
            if !code.is_world() {
                continue;
            }
            seen += 1;
            let key = (dates.get(i).unwrap().to_string(), code.commodity.clone());
            let (want_kgl, want_fob) = expected[&key];
            let got_kgl = kgl.get(i).unwrap();
            let got_fob = fob.get(i).unwrap();
            prop_assert!((got_kgl - want_kgl).abs() <= 1e-6 * want_kgl.abs().max(1.0));
            prop_assert!((got_fob - want_fob).abs() <= 1e-6 * want_fob.abs().max(1.0));
        }
        prop_assert_eq!(seen, expected.len());
    }
}
