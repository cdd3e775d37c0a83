//! Per-pixel reduction of image stacks (temporal compositing)

use firerisk_core::{Error, Raster, Reducer, Result};
use ndarray::Array2;

/// Reduce a stack of equally shaped rasters to one raster.
///
/// NaN cells are skipped. A pixel with no valid value in any layer is NaN.
/// The output carries the metadata of the first layer.
pub fn reduce_stack(stack: &[&Raster], reducer: Reducer) -> Result<Raster> {
    let first = stack.first().ok_or_else(|| Error::InvalidParameter {
        name: "stack",
        value: "0 layers".into(),
        reason: "cannot reduce an empty stack".into(),
    })?;
    let (rows, cols) = first.shape();
    if let Some(bad) = stack.iter().find(|r| r.shape() != (rows, cols)) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: bad.rows(),
            ac: bad.cols(),
        });
    }

    let mut values = Vec::with_capacity(stack.len());
    let data = Array2::from_shape_fn((rows, cols), |(row, col)| {
        values.clear();
        values.extend(
            stack
                .iter()
                .map(|r| r.data()[(row, col)])
                .filter(|v| !v.is_nan()),
        );
        reduce_values(&mut values, reducer)
    });
    first.with_data(data)
}

fn reduce_values(values: &mut [f64], reducer: Reducer) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    match reducer {
        Reducer::Sum => values.iter().sum(),
        Reducer::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Reducer::Median => {
            values.sort_by(|a, b| a.total_cmp(b));
            let mid = values.len() / 2;
            if values.len() % 2 == 0 {
                (values[mid - 1] + values[mid]) / 2.0
            } else {
                values[mid]
            }
        }
    }
}
