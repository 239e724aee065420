//! Shapiro-Wilk normality test (Royston, algorithm AS R94).

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use statrs::distribution::ContinuousCDF;

use super::{Degenerate, Statistic, len_f64, mean, standard_normal};

/// Largest sample size the p-value approximation was fitted for.
const MAX_ACCURATE_SIZE: usize = 5000;

// Polynomial coefficients, lowest order first.
const C1: [f64; 6] = [0.0, 0.221_157, -0.147_981, -2.071_19, 4.434_685, -2.706_056];
const C2: [f64; 6] = [0.0, 0.042_981, -0.293_762, -1.752_461, 5.682_633, -3.582_633];
const C3: [f64; 4] = [0.544, -0.399_78, 0.025_054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.778_57, 0.062_767, -0.002_032_2];
const C5: [f64; 4] = [-1.5861, -0.310_82, -0.083_751, 0.003_891_5];
const C6: [f64; 3] = [-0.4803, -0.082_676, 0.003_030_2];
const G: [f64; 2] = [-2.273, 0.459];

pub(super) fn shapiro_wilk(values: &[f64]) -> Result<Statistic, Degenerate> {
    let n = values.len();
    if n < 3 {
        return Err(Degenerate::new(format!(
            "needs at least 3 observations, got {n}"
        )));
    }
    if n > MAX_ACCURATE_SIZE {
        log::warn!(
            "Shapiro-Wilk: p-value may be inaccurate for {n} observations (fitted up to {MAX_ACCURATE_SIZE})"
        );
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let range = sorted[n - 1] - sorted[0];
    if !range.is_finite() {
        return Err(Degenerate::new(format!("values span a non-finite range ({range})")));
    }
    if range < 1e-19 {
        return Err(Degenerate::new("all values are identical"));
    }

    let coefficients = coefficients(n)?;
    let m = mean(&sorted);
    let ss = sorted.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    let numerator = coefficients
        .iter()
        .enumerate()
        .map(|(i, a)| a * (sorted[n - 1 - i] - sorted[i]))
        .sum::<f64>();
    if !ss.is_finite() || ss <= 0.0 {
        return Err(Degenerate::new(format!(
            "sum of squared deviations is out of range ({ss})"
        )));
    }
    let w = numerator.powi(2) / ss;
    if !w.is_finite() {
        return Err(Degenerate::new(format!("W is not finite ({w})")));
    }
    let w = w.min(1.0);

    Ok(Statistic {
        value: w,
        p_value: p_value(w, n)?,
    })
}

/// The first `n / 2` weights of the ordered sample; the rest are their negatives.
fn coefficients(n: usize) -> Result<Vec<f64>, Degenerate> {
    if n == 3 {
        return Ok(vec![FRAC_1_SQRT_2]);
    }

    let normal = standard_normal()?;
    let half = n / 2;
    let size = len_f64(n);
    let m = (1..=half)
        .map(|i| normal.inverse_cdf((len_f64(i) - 0.375) / (size + 0.25)))
        .collect::<Vec<_>>();
    let summ2 = 2.0 * m.iter().map(|x| x * x).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / size.sqrt();

    let a1 = poly(&C1, rsn) - m[0] / ssumm2;
    let mut a = vec![0.0; half];
    a[0] = a1;
    let (first_scaled, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (1, fac)
    };
    for (ai, mi) in a.iter_mut().zip(&m).skip(first_scaled) {
        *ai = -mi / fac;
    }
    Ok(a)
}

fn p_value(w: f64, n: usize) -> Result<f64, Degenerate> {
    if n == 3 {
        // Exact distribution
        let p = 6.0 / PI * (w.sqrt().asin() - PI / 3.0);
        return Ok(p.clamp(0.0, 1.0));
    }

    let size = len_f64(n);
    let y = (1.0 - w).ln();
    let (z, mu, sigma) = if n <= 11 {
        let gamma = poly(&G, size);
        if y >= gamma {
            return Ok(0.0);
        }
        (
            -(gamma - y).ln(),
            poly(&C3, size),
            poly(&C4, size).exp(),
        )
    } else {
        let ln_n = size.ln();
        (y, poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };
    Ok(standard_normal()?.sf((z - mu) / sigma))
}

/// Evaluates `c[0] + c[1] x + c[2] x^2 + ...`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}
