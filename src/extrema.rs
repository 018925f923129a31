/// Find local minima of `lows` under a minimum-separation constraint.
///
/// A position `p` is a candidate if its value is strictly lower than
/// both immediate neighbors (endpoints can never qualify). Scanning
/// left to right, a candidate is kept only if it is at least `distance`
/// positions away from the last kept minimum, so ties for a slot go to
/// the first-encountered candidate. With `distance = 1` every candidate
/// is kept.
///
/// Pure function of the input slice.
pub fn find_local_minima(lows: &[f64], distance: usize) -> Vec<usize> {
    let distance = distance.max(1);
    let mut minima: Vec<usize> = Vec::new();

    if lows.len() < 3 {
        return minima;
    }

    for p in 1..lows.len() - 1 {
        if lows[p] < lows[p - 1] && lows[p] < lows[p + 1] {
            match minima.last() {
                Some(&last) if p - last < distance => {}
                _ => minima.push(p),
            }
        }
    }

    minima
}

/// Boolean mask over all positions, true where a local minimum sits.
pub fn minima_mask(len: usize, minima: &[usize]) -> Vec<bool> {
    let mut mask = vec![false; len];
    for &p in minima {
        mask[p] = true;
    }
    mask
}
