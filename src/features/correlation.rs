use crate::features::FeatureFrame;
use nalgebra::DMatrix;
use prettytable::{Cell, Row, Table};
use statrs::statistics::{Data, OrderStatistics, RankTieBreaker, Statistics};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

impl CorrelationMethod {
    pub fn title(&self) -> &'static str {
        match self {
            CorrelationMethod::Pearson => "Pearson Correlation",
            CorrelationMethod::Spearman => "Spearman Correlation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub names: Vec<String>,
    pub values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[(i, j)])
    }
}

//pearson correlation over the pairs where both values are finite
//nan when fewer than two pairs remain or either side has no variance
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if xs.len() < 2 {
        return f64::NAN;
    }

    let std_x = xs.as_slice().std_dev();
    let std_y = ys.as_slice().std_dev();
    if std_x == 0.0 || std_y == 0.0 {
        return f64::NAN;
    }

    let r = xs.as_slice().covariance(ys.as_slice()) / (std_x * std_y);
    r.clamp(-1.0, 1.0)
}

//1-based ranks, ties share their average rank
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut data = Data::new(values.to_vec());
    data.ranks(RankTieBreaker::Average)
}

//spearman correlation, pearson on average ranks of the finite pairs
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();

    pearson(&average_ranks(&xs), &average_ranks(&ys))
}

pub fn correlation_matrix(frame: &FeatureFrame, method: CorrelationMethod) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = (0..frame.n_cols()).map(|j| frame.column(j)).collect();
    let n = columns.len();

    let mut values = DMatrix::from_element(n, n, f64::NAN);
    for i in 0..n {
        for j in i..n {
            let r = match method {
                CorrelationMethod::Pearson => pearson(&columns[i], &columns[j]),
                CorrelationMethod::Spearman => spearman(&columns[i], &columns[j]),
            };
            //self-correlation is exactly one whenever it is defined
            let r = if i == j && r.is_finite() { 1.0 } else { r };
            values[(i, j)] = r;
            values[(j, i)] = r;
        }
    }

    CorrelationMatrix {
        method,
        names: frame.names().to_vec(),
        values,
    }
}

//coolwarm-like colouring: red for positive, blue for negative, bold when strong
fn heat_style(value: f64) -> &'static str {
    if !value.is_finite() {
        "r"
    } else if value >= 0.75 {
        "rbFr"
    } else if value >= 0.25 {
        "rFr"
    } else if value <= -0.75 {
        "rbFb"
    } else if value <= -0.25 {
        "rFb"
    } else {
        "r"
    }
}

fn heat_cell(value: f64) -> Cell {
    let text = if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "nan".to_string()
    };
    Cell::new(&text).style_spec(heat_style(value))
}

//pearson and spearman heatmaps side by side in one table
pub fn correlation_table(frame: &FeatureFrame) -> Table {
    let matrices = [
        correlation_matrix(frame, CorrelationMethod::Pearson),
        correlation_matrix(frame, CorrelationMethod::Spearman),
    ];
    let n = frame.n_cols();

    let mut table = Table::new();

    let mut title = Vec::new();
    for (k, matrix) in matrices.iter().enumerate() {
        if k > 0 {
            title.push(Cell::new(""));
        }
        title.push(
            Cell::new(matrix.method.title())
                .with_hspan(n + 1)
                .style_spec("bc"),
        );
    }
    table.add_row(Row::new(title));

    let mut header = Vec::new();
    for k in 0..matrices.len() {
        if k > 0 {
            header.push(Cell::new(""));
        }
        header.push(Cell::new(""));
        header.extend(frame.names().iter().map(|name| Cell::new(name).style_spec("b")));
    }
    table.add_row(Row::new(header));

    for (i, name) in frame.names().iter().enumerate() {
        let mut row = Vec::new();
        for (k, matrix) in matrices.iter().enumerate() {
            if k > 0 {
                row.push(Cell::new(""));
            }
            row.push(Cell::new(name).style_spec("b"));
            row.extend((0..n).map(|j| heat_cell(matrix.values[(i, j)])));
        }
        table.add_row(Row::new(row));
    }

    table
}

//prints the two correlation heatmaps for visual inspection
pub fn correlation_graphs(frame: &FeatureFrame) {
    correlation_table(frame).printstd();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_average_ties() {
        assert_eq!(average_ranks(&[1.0, 3.0, 2.0, 2.0]), vec![1.0, 4.0, 2.5, 2.5]);
    }

    #[test]
    fn pearson_of_linear_series_is_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        let neg: Vec<f64> = y.iter().map(|v| -v).collect();
        assert!((pearson(&x, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn spearman_sees_monotone_relationship() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 4.0, 9.0, 16.0, 1000.0];
        assert!((spearman(&x, &y) - 1.0).abs() < 1e-12);
        assert!(pearson(&x, &y) < 1.0);
    }

    #[test]
    fn constant_column_gives_nan() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
    }

    #[test]
    fn non_finite_pairs_are_skipped() {
        let x = [1.0, f64::NAN, 2.0, 3.0];
        let y = [2.0, 100.0, 4.0, 6.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }
}
