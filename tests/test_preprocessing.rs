//! Integration test: column-group preprocessing on student records

use scorecast::data::DataLoader;
use scorecast::preprocessing::{
    CategoricalVocabulary, ImputeStrategy, ImputeValue, Imputer, PreprocessorSpec,
    StandardScaler,
};
use scorecast::ScoreError;
use polars::prelude::*;

fn students() -> DataFrame {
    df!(
        "gender" => &["female", "male", "female", "male", "female", "male"],
        "race/ethnicity" => &["group B", "group C", "group B", "group A", "group C", "group B"],
        "parental level of education" => &[
            "bachelor's degree", "some college", "master's degree",
            "high school", "some high school", "associate's degree"
        ],
        "lunch" => &["standard", "standard", "free/reduced", "standard", "free/reduced", "standard"],
        "test preparation course" => &["none", "completed", "none", "none", "completed", "none"],
        "math score" => &[72.0, 69.0, -1.0, 47.0, 76.0, 71.0],
        "reading score" => &[72.0, 90.0, 95.0, -1.0, 78.0, 83.0]
    )
    .unwrap()
}

fn vocabulary() -> CategoricalVocabulary {
    CategoricalVocabulary::new()
        .declare(
            "parental level of education",
            &[
                "some high school",
                "high school",
                "some college",
                "associate's degree",
                "bachelor's degree",
                "master's degree",
            ],
        )
        .declare("gender", &["male", "female"])
        .infer("lunch")
        .infer("test preparation course")
}

fn spec(df: &DataFrame) -> PreprocessorSpec {
    PreprocessorSpec::new(
        vec!["reading score".to_string(), "math score".to_string()],
        ImputeStrategy::Median,
        Some(-1.0),
        vocabulary().resolve(df).unwrap(),
        vec!["race/ethnicity".to_string()],
    )
}

#[test]
fn test_feature_layout() {
    let df = students();
    let fitted = spec(&df).fit(&df).unwrap();
    let x = fitted.transform(&df).unwrap();

    // 2 numeric + 4 ordinal + 3 one-hot
    assert_eq!(x.ncols(), 9);
    assert_eq!(x.nrows(), 6);
    assert_eq!(fitted.n_features(), 9);

    let names = fitted.feature_names();
    assert_eq!(names[0], "reading score");
    assert_eq!(names[2], "parental level of education");
    assert_eq!(names[6], "race/ethnicity_group A");

    // ordinal ranks follow the declared order
    assert_eq!(x[[0, 2]], 4.0);
    assert_eq!(x[[4, 2]], 0.0);
    assert_eq!(x[[0, 3]], 1.0);
    assert_eq!(x[[1, 3]], 0.0);
    // inferred vocabulary follows first appearance
    assert_eq!(x[[2, 4]], 1.0);
    // one-hot row sums to one
    let row_sum: f64 = (6..9).map(|j| x[[1, j]]).sum();
    assert_eq!(row_sum, 1.0);
}

#[test]
fn test_numeric_sentinel_imputed_then_scaled() {
    let df = students();
    let fitted = spec(&df).fit(&df).unwrap();

    // median of [72, 69, 47, 76, 71]
    assert_eq!(
        fitted.numeric_imputer().fill_value("math score"),
        Some(&ImputeValue::Numeric(71.0))
    );

    let x = fitted.transform(&df).unwrap();
    for j in 0..2 {
        let mean = x.column(j).mean().unwrap();
        assert!(mean.abs() < 1e-9, "column {} mean {}", j, mean);
    }
}

#[test]
fn test_refit_is_deterministic() {
    let df = students();
    let columns = vec!["reading score".to_string(), "math score".to_string()];

    let mut a = Imputer::new(ImputeStrategy::Median).with_missing_sentinel(-1.0);
    let mut b = Imputer::new(ImputeStrategy::Median).with_missing_sentinel(-1.0);
    let imputed_a = a.fit_transform(&df, &columns).unwrap();
    let imputed_b = b.fit_transform(&df, &columns).unwrap();
    for c in &columns {
        assert_eq!(a.fill_value(c), b.fill_value(c));
    }

    let mut sa = StandardScaler::new();
    let mut sb = StandardScaler::new();
    sa.fit(&imputed_a, &columns).unwrap();
    sb.fit(&imputed_b, &columns).unwrap();
    for c in &columns {
        assert_eq!(sa.statistics(c), sb.statistics(c));
    }
}

#[test]
fn test_statistics_come_from_training_rows_only() {
    let df = students();
    let train = df.slice(0, 4);
    let test = df.slice(4, 2);
    let fitted = spec(&train).fit(&train).unwrap();

    // median of [72, 69, 47] over the training rows only
    assert_eq!(
        fitted.numeric_imputer().fill_value("math score"),
        Some(&ImputeValue::Numeric(69.0))
    );
    let before = fitted.scaler().statistics("reading score");
    let x_test = fitted.transform(&test).unwrap();
    assert_eq!(x_test.nrows(), 2);
    assert_eq!(fitted.scaler().statistics("reading score"), before);
}

#[test]
fn test_unseen_category_is_an_error() {
    let df = students();
    let fitted = spec(&df).fit(&df).unwrap();

    let mut unseen = df.slice(0, 1);
    unseen
        .replace("gender", Series::new("gender".into(), &["nonbinary"]))
        .unwrap();
    match fitted.transform(&unseen) {
        Err(ScoreError::UnknownCategory { column, value }) => {
            assert_eq!(column, "gender");
            assert_eq!(value, "nonbinary");
        }
        other => panic!("expected UnknownCategory, got {:?}", other.map(|x| x.dim())),
    }
}

#[test]
fn test_vocabulary_inference_ignores_test_rows() {
    let df = students();
    let train = df.slice(0, 2);
    let resolved = vocabulary().resolve(&train).unwrap();
    assert_eq!(resolved.get("lunch").unwrap(), &["standard"]);
    assert_eq!(resolved.get("test preparation course").unwrap(), &["none", "completed"]);
    assert!(DataLoader::unique_values(&df, "lunch").unwrap().values.len() == 2);
}
