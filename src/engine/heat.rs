//! Decaying popularity score for the "Hot" view.

use crate::domain::EngagementSnapshot;

/// Tunable weights for the heat score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatParams {
    /// Hours for the age penalty to subtract one unit of score.
    pub decay_half_life_hours: f64,
    /// Weight of the log-scaled view bonus.
    pub view_weight: f64,
    /// Weight of the linear comment bonus.
    pub comment_weight: f64,
}

impl Default for HeatParams {
    fn default() -> Self {
        HeatParams {
            decay_half_life_hours: 12.0,
            view_weight: 0.25,
            comment_weight: 0.05,
        }
    }
}

/// Heat score of a deal given its engagement counts and age.
///
/// Net votes dominate through a signed log magnitude; age subtracts linearly
/// so older deals fall out of "Hot"; views and comments contribute smaller
/// tie-breaking bonuses. Total for any non-negative counts and age:
/// strictly increasing in net score at fixed age, strictly decreasing in age
/// at fixed counts.
pub fn heat_score(snapshot: &EngagementSnapshot, age_hours: f64, params: &HeatParams) -> f64 {
    let net = snapshot.net_score();
    let magnitude = (((net.abs() + 1).max(1)) as f64).log10();
    let sign = (net.signum()) as f64;
    let age = age_hours.max(0.0);

    sign * magnitude - age / params.decay_half_life_hours
        + (1.0 + snapshot.views.max(0) as f64).log10() * params.view_weight
        + snapshot.comments.max(0) as f64 * params.comment_weight
}
