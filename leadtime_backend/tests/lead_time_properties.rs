//! Property tests for target construction and encoding.

use polars::prelude::*;
use proptest::prelude::*;

use vessel_leadtime::core::domain::columns::{
    COURSE_OVER_GROUND, LEAD_TIME, MMSI, NAV_CODE, NAV_DESC, ROW_ID, SPEED_OVER_GROUND,
    TIMESTAMP, TYPE_NAME,
};
use vessel_leadtime::features::FeatureBuilder;
use vessel_leadtime::transformations::{
    DetailMerger, LeadTimeCalculator, LeadTimeGrouping, OutlierFilter,
};

type Report = (i64, i64, i64);

fn main_records(reports: &[Report]) -> DataFrame {
    let row_ids: Vec<u64> = (0..reports.len() as u64).collect();
    let mmsi: Vec<i64> = reports.iter().map(|r| r.0).collect();
    let millis: Vec<i64> = reports.iter().map(|r| r.1 * 1000).collect();
    let codes: Vec<i64> = reports.iter().map(|r| r.2).collect();

    let mut df = df!(
        ROW_ID => row_ids,
        MMSI => mmsi,
        TIMESTAMP => millis,
        NAV_CODE => codes
    )
    .unwrap();
    let ts = df
        .column(TIMESTAMP)
        .unwrap()
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .unwrap();
    df.with_column(ts).unwrap();
    df
}

fn details(height: usize) -> (DataFrame, DataFrame) {
    // Reverse order so position never matches row_id.
    let ids: Vec<u64> = (0..height as u64).rev().collect();
    let descs: Vec<String> = ids.iter().map(|id| format!("status {}", id % 2)).collect();
    let courses: Vec<f64> = ids.iter().map(|id| *id as f64).collect();
    let types: Vec<String> = ids.iter().map(|id| format!("type {}", id % 3)).collect();

    let navigation = df!(
        ROW_ID => ids.clone(),
        NAV_DESC => descs,
        COURSE_OVER_GROUND => courses.clone(),
        SPEED_OVER_GROUND => courses
    )
    .unwrap();
    let vessel = df!(ROW_ID => ids, TYPE_NAME => types).unwrap();
    (navigation, vessel)
}

fn reports() -> impl Strategy<Value = Vec<Report>> {
    prop::collection::vec((1i64..4, 0i64..5_000, 0i64..3), 1..40)
}

fn groupings() -> impl Strategy<Value = LeadTimeGrouping> {
    prop_oneof![
        Just(LeadTimeGrouping::VesselAndStatus),
        Just(LeadTimeGrouping::StatusOnly),
    ]
}

proptest! {
    #[test]
    fn prop_sorted_and_per_group_gaps(reports in reports(), grouping in groupings()) {
        let out = LeadTimeCalculator::new(grouping)
            .calculate(&main_records(&reports))
            .unwrap();

        let mmsi: Vec<i64> = out.column(MMSI).unwrap().i64().unwrap().into_no_null_iter().collect();
        let millis: Vec<i64> = out
            .column(TIMESTAMP).unwrap()
            .cast(&DataType::Int64).unwrap()
            .i64().unwrap()
            .into_no_null_iter()
            .collect();
        let codes: Vec<i64> = out.column(NAV_CODE).unwrap().i64().unwrap().into_no_null_iter().collect();
        let leads: Vec<Option<f64>> = out.column(LEAD_TIME).unwrap().f64().unwrap().into_iter().collect();

        for i in 1..out.height() {
            prop_assert!((mmsi[i - 1], millis[i - 1]) <= (mmsi[i], millis[i]));
        }

        let same_group = |i: usize, j: usize| match grouping {
            LeadTimeGrouping::VesselAndStatus => mmsi[j] == mmsi[i] && codes[j] == codes[i],
            LeadTimeGrouping::StatusOnly => codes[j] == codes[i],
        };
        for i in 0..out.height() {
            let next = (i + 1..out.height()).find(|&j| same_group(i, j));
            match next {
                Some(j) => {
                    let expected = (millis[j] - millis[i]) as f64 / 60_000.0;
                    prop_assert_eq!(leads[i], Some(expected));
                    if grouping == LeadTimeGrouping::VesselAndStatus {
                        prop_assert!(expected >= 0.0);
                    }
                }
                None => prop_assert_eq!(leads[i], None),
            }
        }
    }

    #[test]
    fn prop_merge_never_adds_rows(reports in reports()) {
        let labelled = LeadTimeCalculator::default()
            .calculate(&main_records(&reports))
            .unwrap();
        let (navigation, vessel) = details(reports.len());

        let merged = DetailMerger::merge(&labelled, &navigation, &vessel).unwrap();
        let with_target = labelled.column(LEAD_TIME).unwrap();
        prop_assert!(merged.height() <= labelled.height());
        prop_assert_eq!(merged.height(), with_target.len() - with_target.null_count());
    }

    #[test]
    fn prop_outlier_filter_output_within_fence(
        values in prop::collection::vec(prop::option::of(-1_000.0f64..1_000.0), 1..60)
    ) {
        prop_assume!(values.iter().any(Option::is_some));
        let df = df!(LEAD_TIME => values.clone()).unwrap();
        let (kept, report) = OutlierFilter::default().apply(&df).unwrap();

        prop_assert_eq!(kept.column(LEAD_TIME).unwrap().null_count(), 0);
        prop_assert!(kept.height() <= df.height());
        for value in kept.column(LEAD_TIME).unwrap().f64().unwrap().into_no_null_iter() {
            prop_assert!(report.fence.contains(value));
        }
    }

    #[test]
    fn prop_exactly_one_indicator(
        rows in prop::collection::vec(
            (prop::option::of(0usize..4), 0usize..3, 0.0f64..360.0, 1.0f64..30.0),
            1..30,
        )
    ) {
        let descs: Vec<Option<String>> = rows.iter().map(|r| r.0.map(|d| format!("status {d}"))).collect();
        let types: Vec<String> = rows.iter().map(|r| format!("type {}", r.1)).collect();
        let courses: Vec<f64> = rows.iter().map(|r| r.2).collect();
        let targets: Vec<f64> = rows.iter().map(|r| r.3).collect();
        let merged = df!(
            LEAD_TIME => targets,
            TYPE_NAME => types,
            NAV_DESC => descs,
            COURSE_OVER_GROUND => courses.clone(),
            SPEED_OVER_GROUND => courses
        )
        .unwrap();

        let features = FeatureBuilder::new().build(&merged).unwrap();
        let frame = features.matrix.frame();
        for prefix in ["navDesc_", "typeName_"] {
            let indicators: Vec<&Column> = frame
                .get_columns()
                .iter()
                .filter(|c| c.name().starts_with(prefix))
                .collect();
            for row in 0..frame.height() {
                let set = indicators
                    .iter()
                    .filter(|c| c.bool().unwrap().get(row) == Some(true))
                    .count();
                prop_assert_eq!(set, 1);
            }
        }
    }
}
