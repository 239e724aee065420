//! Rank based tests: Mann-Whitney U, Wilcoxon signed-rank, Kruskal-Wallis, Friedman.

use statrs::distribution::ContinuousCDF;

use super::{
    Alternative, Degenerate, Statistic, chi_squared_sf, len_f64, normal_p_value, standard_normal,
};

/// Samples at or below this size get the exact Mann-Whitney distribution.
const MANN_WHITNEY_EXACT_SIZE: usize = 8;
/// Largest number of non-zero differences for the exact Wilcoxon distribution.
const WILCOXON_EXACT_SIZE: usize = 50;

/// Ranks values from 1, giving tied values the mean of the ranks they span.
///
/// Also returns the tie term `sum(t^3 - t)` over groups of `t` tied values,
/// used by the tie corrections of every rank test.
///
/// # Examples
///
/// ```
/// use tabstat_testing::backend::average_ranks;
///
/// let (ranks, ties) = average_ranks(&[10.0, 20.0, 10.0, 30.0]);
/// assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
/// assert_eq!(ties, 6.0);
/// ```
#[must_use]
pub fn average_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end hold ranks start + 1 ..= end
        let rank = len_f64(start + end + 1) / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        let t = len_f64(end - start);
        tie_term += t.powi(3) - t;
        start = end;
    }
    (ranks, tie_term)
}

pub(super) fn mann_whitney(
    a: &[f64],
    b: &[f64],
    alternative: Alternative,
) -> Result<Statistic, Degenerate> {
    if a.is_empty() || b.is_empty() {
        return Err(Degenerate::new("both samples need at least one observation"));
    }
    let (n1, n2) = (a.len(), b.len());
    let combined = a.iter().chain(b).copied().collect::<Vec<_>>();
    let (ranks, tie_term) = average_ranks(&combined);

    let (f1, f2) = (len_f64(n1), len_f64(n2));
    let r1 = ranks[..n1].iter().sum::<f64>();
    let u1 = r1 - f1 * (f1 + 1.0) / 2.0;
    let u2 = f1 * f2 - u1;

    let exact = n1.min(n2) <= MANN_WHITNEY_EXACT_SIZE && tie_term == 0.0;
    if exact && let Some(counts) = mann_whitney_counts(n1, n2) {
        let p_value = match alternative {
            Alternative::TwoSided => (2.0 * upper_tail(&counts, u1.max(u2))).min(1.0),
            Alternative::Greater => upper_tail(&counts, u1),
            Alternative::Less => upper_tail(&counts, u2),
        };
        return Ok(Statistic {
            value: u1,
            p_value,
        });
    }

    let n = f1 + f2;
    let mu = f1 * f2 / 2.0;
    let sigma = (f1 * f2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
    if sigma == 0.0 || !sigma.is_finite() {
        return Err(Degenerate::new("all values are tied"));
    }
    let (u, factor) = match alternative {
        Alternative::TwoSided => (u1.max(u2), 2.0),
        Alternative::Greater => (u1, 1.0),
        Alternative::Less => (u2, 1.0),
    };
    let z = (u - mu - 0.5) / sigma;
    let p_value = (standard_normal()?.sf(z) * factor).clamp(0.0, 1.0);
    Ok(Statistic { value: u1, p_value })
}

/// Number of rank arrangements giving each value of U, from 0 to `n1 * n2`.
///
/// These are the coefficients of the Gaussian binomial `[n1 + n2 choose n1]_q`,
/// built one factor `(1 - q^(m + i)) / (1 - q^i)` at a time so every
/// intermediate polynomial is itself a Gaussian binomial. Returns `None` if
/// the counts overflow.
fn mann_whitney_counts(n1: usize, n2: usize) -> Option<Vec<i128>> {
    let (k, m) = (n1.min(n2), n1.max(n2));
    let mut poly = vec![1_i128];
    for i in 1..=k {
        let shift = m + i;
        let mut next = vec![0_i128; poly.len() + shift];
        for (j, &c) in poly.iter().enumerate() {
            next[j] = next[j].checked_add(c)?;
            next[j + shift] = next[j + shift].checked_sub(c)?;
        }
        for j in i..next.len() {
            next[j] = next[j].checked_add(next[j - i])?;
        }
        next.truncate(next.len() - i);
        poly = next;
    }
    Some(poly)
}

/// `P(U >= u)` under the exact null distribution.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn upper_tail(counts: &[i128], u: f64) -> f64 {
    let total = counts.iter().sum::<i128>() as f64;
    let start = (u.round().max(0.0) as usize).min(counts.len());
    counts[start..].iter().sum::<i128>() as f64 / total
}

pub(super) fn wilcoxon(
    a: &[f64],
    b: &[f64],
    alternative: Alternative,
) -> Result<Statistic, Degenerate> {
    let diffs = a.iter().zip(b).map(|(x, y)| x - y).collect::<Vec<_>>();
    let nonzero = diffs.iter().copied().filter(|&d| d != 0.0).collect::<Vec<_>>();
    let zeros = diffs.len() - nonzero.len();
    if nonzero.is_empty() {
        return Err(Degenerate::new("all paired differences are zero"));
    }
    if zeros > 0 {
        log::debug!("Wilcoxon signed-rank: dropped {zeros} zero differences");
    }

    let n = nonzero.len();
    let magnitudes = nonzero.iter().map(|d| d.abs()).collect::<Vec<_>>();
    let (ranks, tie_term) = average_ranks(&magnitudes);
    let r_plus = nonzero
        .iter()
        .zip(&ranks)
        .filter(|&(&d, _)| d > 0.0)
        .map(|(_, r)| r)
        .sum::<f64>();
    let r_minus = ranks.iter().sum::<f64>() - r_plus;
    let statistic = match alternative {
        Alternative::TwoSided => r_plus.min(r_minus),
        Alternative::Less | Alternative::Greater => r_plus,
    };

    if n <= WILCOXON_EXACT_SIZE && zeros == 0 && tie_term == 0.0 {
        let dist = SignedRankDistribution::new(n);
        let p_value = match alternative {
            Alternative::TwoSided => (2.0 * dist.cdf(r_plus).min(dist.sf(r_plus))).min(1.0),
            Alternative::Less => dist.cdf(r_plus),
            Alternative::Greater => dist.sf(r_plus),
        };
        return Ok(Statistic {
            value: statistic,
            p_value,
        });
    }

    let size = len_f64(n);
    let mean = size * (size + 1.0) / 4.0;
    let sd = (size * (size + 1.0) * (2.0 * size + 1.0) / 24.0 - tie_term / 48.0).sqrt();
    if sd == 0.0 || !sd.is_finite() {
        return Err(Degenerate::new("signed ranks have zero variance"));
    }
    let z = (r_plus - mean) / sd;
    Ok(Statistic {
        value: statistic,
        p_value: normal_p_value(z, alternative)?,
    })
}

/// Exact null distribution of the positive rank sum `R+` for `n` untied ranks.
struct SignedRankDistribution {
    /// `counts[s]` is the number of sign assignments with `R+ = s`.
    counts: Vec<u64>,
}

impl SignedRankDistribution {
    fn new(n: usize) -> Self {
        let max_sum = n * (n + 1) / 2;
        let mut counts = vec![0_u64; max_sum + 1];
        counts[0] = 1;
        for rank in 1..=n {
            for s in (rank..=max_sum).rev() {
                counts[s] += counts[s - rank];
            }
        }
        Self { counts }
    }

    #[expect(clippy::cast_precision_loss)]
    fn probability(&self, range: impl Iterator<Item = usize>) -> f64 {
        let total = self.counts.iter().sum::<u64>() as f64;
        range.map(|s| self.counts[s]).sum::<u64>() as f64 / total
    }

    /// `P(R+ <= r)`.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn cdf(&self, r: f64) -> f64 {
        let end = (r.round().max(0.0) as usize).min(self.counts.len() - 1);
        self.probability(0..=end)
    }

    /// `P(R+ >= r)`.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sf(&self, r: f64) -> f64 {
        let start = (r.round().max(0.0) as usize).min(self.counts.len());
        self.probability(start..self.counts.len())
    }
}

pub(super) fn kruskal_wallis(groups: &[&[f64]]) -> Result<Statistic, Degenerate> {
    if let Some(idx) = groups.iter().position(|g| g.is_empty()) {
        return Err(Degenerate::new(format!("group {idx} has no observations")));
    }
    let combined = groups.iter().flat_map(|g| g.iter()).copied().collect::<Vec<_>>();
    let (ranks, tie_term) = average_ranks(&combined);
    let n = len_f64(combined.len());

    let mut offset = 0;
    let mut weighted = 0.0;
    for group in groups {
        let rank_sum = ranks[offset..offset + group.len()].iter().sum::<f64>();
        weighted += rank_sum.powi(2) / len_f64(group.len());
        offset += group.len();
    }
    let correction = 1.0 - tie_term / (n.powi(3) - n);
    if correction <= 0.0 {
        return Err(Degenerate::new("all values are tied"));
    }

    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / correction;
    Ok(Statistic {
        value: h,
        p_value: chi_squared_sf(h, len_f64(groups.len() - 1))?,
    })
}

/// Samples are treatments (columns); row `i` of every sample forms one block.
pub(super) fn friedman(samples: &[&[f64]]) -> Result<Statistic, Degenerate> {
    let k = samples.len();
    let rows = samples.first().map_or(0, |s| s.len());
    if rows == 0 {
        return Err(Degenerate::new("no complete rows"));
    }

    let mut rank_sums = vec![0.0; k];
    let mut tie_term = 0.0;
    let mut row = Vec::with_capacity(k);
    for i in 0..rows {
        row.clear();
        row.extend(samples.iter().map(|s| s[i]));
        let (ranks, ties) = average_ranks(&row);
        for (sum, rank) in rank_sums.iter_mut().zip(ranks) {
            *sum += rank;
        }
        tie_term += ties;
    }

    let (n, kf) = (len_f64(rows), len_f64(k));
    let correction = 1.0 - tie_term / (n * kf * (kf * kf - 1.0));
    if correction <= 0.0 {
        return Err(Degenerate::new("every row is fully tied"));
    }
    let sum_sq = rank_sums.iter().map(|r| r * r).sum::<f64>();
    let chi2 = (12.0 / (n * kf * (kf + 1.0)) * sum_sq - 3.0 * n * (kf + 1.0)) / correction;
    Ok(Statistic {
        value: chi2,
        p_value: chi_squared_sf(chi2, kf - 1.0)?,
    })
}
