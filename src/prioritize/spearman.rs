//! Spearman rank correlation with a two-sided p-value.
//!
//! Average-rank transform followed by Pearson on the ranks; the p-value
//! comes from the Student-t transform of the coefficient, evaluated through
//! the regularized incomplete beta function. Degenerate inputs (fewer than
//! three observations, or zero variance on either side) are defined as
//! coefficient 0.0 with p-value 1.0 and never raise.

/// Minimum population for a meaningful rank correlation.
pub const MIN_POPULATION: usize = 3;

/// Spearman rho and two-sided p-value for paired observations.
pub fn spearman(x: &[f64], y: &[f64]) -> (f64, f64) {
    let n = x.len().min(y.len());
    if n < MIN_POPULATION {
        return (0.0, 1.0);
    }
    let rx = average_ranks(&x[..n]);
    let ry = average_ranks(&y[..n]);
    match pearson(&rx, &ry) {
        Some(rho) => (rho, p_value(rho, n)),
        None => (0.0, 1.0),
    }
}

/// Average ranks (1-based); tied values share the mean of their rank span.
fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        // Positions i..=j (0-based) share the average of ranks i+1..=j+1
        let shared = (i + j) as f64 / 2.0 + 1.0;
        for &index in &order[i..=j] {
            ranks[index] = shared;
        }
        i = j + 1;
    }
    ranks
}

/// Pearson correlation; None when either side has zero variance.
fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (covariance, variance_x, variance_y) = x
        .iter()
        .zip(y.iter())
        .map(|(a, b)| {
            let dx = a - mean_x;
            let dy = b - mean_y;
            (dx * dy, dx * dx, dy * dy)
        })
        .fold((0.0, 0.0, 0.0), |acc, (c, vx, vy)| {
            (acc.0 + c, acc.1 + vx, acc.2 + vy)
        });

    if variance_x == 0.0 || variance_y == 0.0 {
        return None;
    }
    Some((covariance / (variance_x * variance_y).sqrt()).clamp(-1.0, 1.0))
}

/// Two-sided p-value via the t transform: t = rho * sqrt((n-2)/(1-rho^2)),
/// p = I_{df/(df+t^2)}(df/2, 1/2).
fn p_value(rho: f64, n: usize) -> f64 {
    let df = (n - 2) as f64;
    let denom = 1.0 - rho * rho;
    if denom <= f64::EPSILON {
        return 0.0; // |rho| == 1: exact monotone relation
    }
    let t = rho * (df / denom).sqrt();
    incomplete_beta(df / 2.0, 0.5, df / (df + t * t)).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for the incomplete beta (Lentz's method).
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITERATIONS: usize = 200;
    const EPSILON: f64 = 1e-14;
    const TINY: f64 = 1e-30;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < TINY {
        d = TINY;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < TINY {
            d = TINY;
        }
        c = 1.0 + aa / c;
        if c.abs() < TINY {
            c = TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln(Gamma(x)).
fn ln_gamma(x: f64) -> f64 {
    const COEFFICIENTS: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut series = 1.000000000190015;
    for coefficient in COEFFICIENTS {
        y += 1.0;
        series += coefficient / y;
    }
    -tmp + (2.5066282746310005 * series / x).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn perfect_monotone_relation() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 20.0, 30.0, 40.0, 50.0];
        let (rho, p) = spearman(&x, &y);
        assert_close(rho, 1.0, 1e-12);
        assert_close(p, 0.0, 1e-12);
    }

    #[test]
    fn perfect_inverse_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [9.0, 7.0, 5.0, 3.0];
        let (rho, p) = spearman(&x, &y);
        assert_close(rho, -1.0, 1e-12);
        assert_close(p, 0.0, 1e-12);
    }

    #[test]
    fn known_value_against_reference() {
        // scipy.stats.spearmanr([1,2,3,4,5], [2,1,4,3,5]) = (0.8, 0.10408...)
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 1.0, 4.0, 3.0, 5.0];
        let (rho, p) = spearman(&x, &y);
        assert_close(rho, 0.8, 1e-12);
        assert_close(p, 0.1041, 1e-3);
    }

    #[test]
    fn binary_presence_vector_with_ties() {
        // scipy.stats.spearmanr([1,0,1,0], [4,1,3,2]) = (0.894427..., ...)
        let presence = [1.0, 0.0, 1.0, 0.0];
        let signal = [4.0, 1.0, 3.0, 2.0];
        let (rho, _) = spearman(&presence, &signal);
        assert_close(rho, 0.8944271909999159, 1e-9);
    }

    #[test]
    fn degenerate_small_population() {
        let (rho, p) = spearman(&[1.0, 2.0], &[2.0, 1.0]);
        assert_eq!(rho, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn degenerate_zero_variance() {
        let (rho, p) = spearman(&[1.0, 1.0, 1.0, 1.0], &[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(rho, 0.0);
        assert_eq!(p, 1.0);

        let (rho, p) = spearman(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]);
        assert_eq!(rho, 0.0);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn coefficient_stays_in_range() {
        let x = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let y = [2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0, 8.0];
        let (rho, p) = spearman(&x, &y);
        assert!((-1.0..=1.0).contains(&rho));
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn average_ranks_handle_ties() {
        let ranks = average_ranks(&[10.0, 20.0, 20.0, 30.0]);
        assert_eq!(ranks, vec![1.0, 2.5, 2.5, 4.0]);
    }
}
