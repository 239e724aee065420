//! Mean and variance based tests: t-tests, one-way ANOVA, Levene.

use tabstat_stats::quantile::quantile;

use super::{
    Alternative, Center, Degenerate, Statistic, f_sf, len_f64, mean, t_p_value, variance,
};

/// Fraction cut from each end of a group for [`Center::Trimmed`].
const TRIM_PROPORTION: f64 = 0.05;

pub(super) fn ttest_ind(
    a: &[f64],
    b: &[f64],
    equal_variances: bool,
    alternative: Alternative,
) -> Result<Statistic, Degenerate> {
    if a.len() < 2 || b.len() < 2 {
        return Err(Degenerate::new(format!(
            "each sample needs at least 2 observations, got {} and {}",
            a.len(),
            b.len()
        )));
    }
    let (n1, n2) = (len_f64(a.len()), len_f64(b.len()));
    let (v1, v2) = (variance(a), variance(b));

    let (se, df) = if equal_variances {
        let df = n1 + n2 - 2.0;
        let pooled = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
        ((pooled * (1.0 / n1 + 1.0 / n2)).sqrt(), df)
    } else {
        let (q1, q2) = (v1 / n1, v2 / n2);
        let df = (q1 + q2).powi(2) / (q1.powi(2) / (n1 - 1.0) + q2.powi(2) / (n2 - 1.0));
        ((q1 + q2).sqrt(), df)
    };
    if !se.is_finite() {
        return Err(Degenerate::new("standard error overflows"));
    }
    if se == 0.0 {
        return Err(Degenerate::new("both samples have zero variance"));
    }

    let t = (mean(a) - mean(b)) / se;
    Ok(Statistic {
        value: t,
        p_value: t_p_value(t, df, alternative)?,
    })
}

pub(super) fn ttest_rel(
    a: &[f64],
    b: &[f64],
    alternative: Alternative,
) -> Result<Statistic, Degenerate> {
    if a.len() < 2 {
        return Err(Degenerate::new(format!(
            "needs at least 2 complete pairs, got {}",
            a.len()
        )));
    }
    let diffs = a.iter().zip(b).map(|(x, y)| x - y).collect::<Vec<_>>();
    let n = len_f64(diffs.len());
    let se = (variance(&diffs) / n).sqrt();
    if !se.is_finite() {
        return Err(Degenerate::new("standard error of the differences overflows"));
    }
    if se == 0.0 {
        return Err(Degenerate::new("differences have zero variance"));
    }

    let t = mean(&diffs) / se;
    Ok(Statistic {
        value: t,
        p_value: t_p_value(t, n - 1.0, alternative)?,
    })
}

pub(super) fn one_way_anova(groups: &[&[f64]]) -> Result<Statistic, Degenerate> {
    f_oneway(groups, "values")
}

/// Levene's test is a one-way ANOVA on absolute deviations from each group's center.
pub(super) fn levene(groups: &[&[f64]], center: Center) -> Result<Statistic, Degenerate> {
    let deviations = groups
        .iter()
        .map(|group| {
            let mut sorted = group.to_vec();
            sorted.sort_by(f64::total_cmp);
            let kept = match center {
                Center::Mean | Center::Median => sorted,
                Center::Trimmed => trim_both(sorted, TRIM_PROPORTION),
            };
            let c = match center {
                Center::Mean | Center::Trimmed => mean(&kept),
                Center::Median => quantile(&kept, 0.5),
            };
            kept.iter().map(|x| (x - c).abs()).collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    let views = deviations.iter().map(Vec::as_slice).collect::<Vec<_>>();
    f_oneway(&views, "absolute deviations")
}

/// Drops `floor(proportion * n)` values from each end of sorted data.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn trim_both(mut sorted: Vec<f64>, proportion: f64) -> Vec<f64> {
    let cut = (proportion * len_f64(sorted.len())) as usize;
    sorted.truncate(sorted.len() - cut);
    sorted.drain(..cut);
    sorted
}

fn f_oneway(groups: &[&[f64]], what: &str) -> Result<Statistic, Degenerate> {
    if let Some(idx) = groups.iter().position(|g| g.is_empty()) {
        return Err(Degenerate::new(format!("group {idx} has no observations")));
    }
    let k = groups.len();
    let total = groups.iter().map(|g| g.len()).sum::<usize>();
    if total <= k {
        return Err(Degenerate::new(format!(
            "{total} observations leave no within-group degrees of freedom for {k} groups"
        )));
    }

    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / len_f64(total);
    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let m = mean(group);
        ss_between += len_f64(group.len()) * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }
    if !ss_between.is_finite() || !ss_within.is_finite() {
        return Err(Degenerate::new(format!(
            "sums of squares of {what} overflow"
        )));
    }
    if ss_within == 0.0 {
        return Err(Degenerate::new(format!(
            "{what} have zero variance within every group"
        )));
    }

    let df_between = len_f64(k - 1);
    let df_within = len_f64(total - k);
    let f = (ss_between / df_between) / (ss_within / df_within);
    Ok(Statistic {
        value: f,
        p_value: f_sf(f, df_between, df_within)?,
    })
}
