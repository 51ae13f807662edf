use crate::features::FeatureFrame;
use indexmap::IndexMap;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

pub const DEFAULT_VIF_THRESHOLD: f64 = 15.0;

//relative cutoff for singular values treated as zero in the least-squares solve
const SINGULAR_EPS: f64 = 1e-12;

fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

fn rank(x: DMatrix<f64>) -> usize {
    let svd = x.svd(false, false);
    let eps = SINGULAR_EPS * svd.singular_values.max().max(1.0);
    svd.rank(eps)
}

//true when a column of ones lies in the span of the regressors, either as a
//constant column or as columns that add up to a constant (one-hot buckets)
fn spans_constant(x: &DMatrix<f64>) -> bool {
    let augmented = x.clone().insert_column(0, 1.0);
    rank(augmented) == rank(x.clone())
}

//vif of column j regressed by ols on every other column, without an added intercept
//
//r-squared is uncentered unless the regressors span a constant,
//perfect collinearity gives +inf and a zero target gives nan
pub fn variance_inflation_factor(x: &DMatrix<f64>, j: usize) -> f64 {
    if x.iter().any(|v| !v.is_finite()) {
        return f64::NAN;
    }
    if x.ncols() < 2 || x.nrows() == 0 {
        return 1.0;
    }

    let y: DVector<f64> = x.column(j).into_owned();
    let others = x.clone().remove_column(j);

    let svd = others.clone().svd(true, true);
    let eps = SINGULAR_EPS * svd.singular_values.max().max(1.0);
    let beta = match svd.solve(&y, eps) {
        Ok(beta) => beta,
        Err(_) => return f64::NAN,
    };

    let residuals = &y - &others * beta;
    let ssr = residuals.norm_squared();

    let tss = if spans_constant(&others) {
        let mean = y.mean();
        y.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
    } else {
        y.norm_squared()
    };

    if tss == 0.0 {
        return f64::NAN;
    }

    let r_squared = 1.0 - ssr / tss;
    if r_squared >= 1.0 {
        f64::INFINITY
    } else {
        1.0 / (1.0 - r_squared)
    }
}

//vif of every column, rounded to two decimals, in column order
pub fn calculate_vif(frame: &FeatureFrame) -> IndexMap<String, f64> {
    let values: Vec<f64> = (0..frame.n_cols())
        .into_par_iter()
        .map(|j| round2(variance_inflation_factor(frame.values(), j)))
        .collect();

    frame.names().iter().cloned().zip(values).collect()
}

//highest vif, first column wins ties, nan entries are never selected
fn worst_feature(vif: &IndexMap<String, f64>) -> Option<(&String, f64)> {
    let mut worst: Option<(&String, f64)> = None;
    for (name, value) in vif {
        if value.is_nan() {
            continue;
        }
        match worst {
            Some((_, best)) if *value <= best => {}
            _ => worst = Some((name, *value)),
        }
    }
    worst
}

//drops the highest-vif feature until every remaining vif is at or below the threshold
//and returns the vif table of the surviving features
pub fn remove_intercollinearity(frame: &FeatureFrame, threshold: f64) -> IndexMap<String, f64> {
    let mut current = frame.clone();

    loop {
        let vif = calculate_vif(&current);

        let name = match worst_feature(&vif) {
            Some((_, value)) if value <= threshold => return vif,
            Some((name, value)) => {
                debug!(feature = %name, vif = value, threshold, "dropping collinear feature");
                name.clone()
            }
            None => return vif,
        };

        current = match current.drop_column(&name) {
            Ok(frame) => frame,
            Err(_) => return vif,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(columns: Vec<(&str, Vec<f64>)>) -> FeatureFrame {
        FeatureFrame::from_columns(
            columns
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn orthogonal_columns_have_unit_vif() {
        let f = frame(vec![
            ("a", vec![1.0, -1.0, 1.0, -1.0]),
            ("b", vec![1.0, 1.0, -1.0, -1.0]),
        ]);
        let vif = calculate_vif(&f);
        assert_eq!(vif["a"], 1.0);
        assert_eq!(vif["b"], 1.0);
    }

    #[test]
    fn matches_uncentered_closed_form() {
        //two regressors: r2 of a on b is (a.b)^2 / (|a|^2 |b|^2)
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 1.0, 4.0, 3.0];
        let dot: f64 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
        let r2 = dot * dot / (30.0 * 30.0);
        let expected = round2(1.0 / (1.0 - r2));

        let vif = calculate_vif(&frame(vec![("a", a), ("b", b)]));
        assert_eq!(vif["a"], expected);
        assert_eq!(vif["b"], expected);
    }

    #[test]
    fn duplicated_column_is_infinite() {
        let x = vec![1.0, 2.0, 3.0, 5.0];
        let vif = calculate_vif(&frame(vec![("a", x.clone()), ("b", x)]));
        assert!(vif["a"].is_infinite() || vif["a"] > 1e6);
    }

    #[test]
    fn single_column_has_unit_vif() {
        let vif = calculate_vif(&frame(vec![("a", vec![1.0, 2.0])]));
        assert_eq!(vif["a"], 1.0);
    }

    #[test]
    fn pruning_drops_the_worst_feature_first() {
        let base = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let noise = vec![0.01, -0.02, 0.015, -0.01, 0.02, -0.015];
        let near: Vec<f64> = base.iter().zip(&noise).map(|(b, n)| b * 2.0 + n).collect();
        let other = vec![1.0, -1.0, 2.0, -2.0, 1.0, -1.0];

        let f = frame(vec![("base", base), ("near", near), ("other", other)]);
        let result = remove_intercollinearity(&f, DEFAULT_VIF_THRESHOLD);

        assert_eq!(result.len(), 2);
        assert!(result.contains_key("other"));
        assert!(result.values().all(|v| *v <= DEFAULT_VIF_THRESHOLD));
    }

    #[test]
    fn complementary_dummies_count_as_an_intercept() {
        let d1 = vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let d2: Vec<f64> = d1.iter().map(|v| 1.0 - v).collect();
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let f = frame(vec![("d1", d1), ("d2", d2), ("y", y)]);

        //y on the two dummies is centred: group means 2 and 5, r2 = 1 - 4 / 17.5
        let vif = calculate_vif(&f);
        assert!((vif["y"] - 4.375).abs() <= 0.005 + 1e-9);
        assert_eq!(vif["d1"], 4.0);
        assert_eq!(vif["d2"], 19.75);

        let kept = remove_intercollinearity(&f, DEFAULT_VIF_THRESHOLD);
        assert!(kept.contains_key("y"));
        assert!(kept.contains_key("d1"));
        assert!(!kept.contains_key("d2"));
    }

    #[test]
    fn constant_detection_uses_the_span() {
        let ones = DMatrix::from_element(4, 1, 2.0);
        assert!(spans_constant(&ones));

        let dummies = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
        assert!(spans_constant(&dummies));

        let trend = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        assert!(!spans_constant(&trend));
    }

    #[test]
    fn worst_feature_prefers_first_on_ties() {
        let mut vif = IndexMap::new();
        vif.insert("a".to_string(), 3.0);
        vif.insert("b".to_string(), f64::NAN);
        vif.insert("c".to_string(), 3.0);
        assert_eq!(worst_feature(&vif).map(|(n, _)| n.as_str()), Some("a"));
    }
}
