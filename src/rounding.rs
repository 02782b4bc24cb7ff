/// Rounds non-negative values to integers whose sum equals the rounded sum of
/// the inputs (largest-remainder apportionment).
///
/// Every value is truncated first; the leftover units go to the largest
/// fractional remainders, earlier inputs winning ties.
pub fn fair_round(values: &[f64]) -> Vec<i64> {
    let mut whole: Vec<i64> = values.iter().map(|value| value.floor() as i64).collect();
    let remainders: Vec<f64> = values
        .iter()
        .zip(&whole)
        .map(|(value, floor)| value - *floor as f64)
        .collect();

    let mut remaining = remainders.iter().sum::<f64>().round() as i64;

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| remainders[b].total_cmp(&remainders[a]));

    for index in order {
        if remaining <= 0 {
            break;
        }
        whole[index] += 1;
        remaining -= 1;
    }

    whole
}
