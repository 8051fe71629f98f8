//! The Newton verification engine: recursive interval subdivision over
//! a cubic Bezier trajectory, with quick-accept/quick-reject convex
//! hull tests, a bounded subdivision budget, witness construction, and
//! repair-direction estimation.

use crate::geometry::{bernstein, ControlPoints};
use crate::law::Law;
use crate::vector::StateVector;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Depth/tolerance budget for one verification run. Defaults match the
/// spec's reference profile; [`VerificationBudget::high_precision`]
/// matches its high-precision profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationBudget {
    pub max_depth: u32,
    pub tolerance: f64,
}

impl VerificationBudget {
    pub fn new(max_depth: u32, tolerance: f64) -> Self {
        Self {
            max_depth: max_depth.clamp(1, 64),
            tolerance,
        }
    }

    pub fn high_precision() -> Self {
        Self::new(40, 1e-15)
    }
}

impl Default for VerificationBudget {
    fn default() -> Self {
        Self::new(20, 1e-10)
    }
}

/// Parameters for the engine's advisory repair-direction estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepairConfig {
    /// One-sided finite difference step.
    pub epsilon: f64,
    /// Nudge learning rate.
    pub eta: f64,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            eta: 0.1,
        }
    }
}

/// Why a witness carries the synthetic `law_index == -1` marker instead
/// of naming a real law. Consumers should not attempt to map `-1` back
/// to a law in the list that was passed to [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntheticReason {
    UnknownForge,
    DepthExceeded,
    ExplicitReject,
}

/// A first-violation certificate: which law, when, where, and an
/// optional repair direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Witness {
    /// Index into the `laws` slice passed to [`verify`], or `-1` for a
    /// synthetic witness (see [`SyntheticReason`]).
    pub law_index: i64,
    pub law_name: String,
    /// Parameter `t* ∈ [0, 1]` of the earliest certified violation.
    pub time: f64,
    pub state: StateVector,
    pub repair_direction: Option<StateVector>,
    pub reason: String,
}

impl Witness {
    pub(crate) fn synthetic(reason: SyntheticReason, time: f64, state: StateVector, message: impl Into<String>) -> Self {
        let law_name = match reason {
            SyntheticReason::UnknownForge => "<unknown forge>",
            SyntheticReason::DepthExceeded => "<depth exceeded>",
            SyntheticReason::ExplicitReject => "<explicit reject>",
        };
        Self {
            law_index: -1,
            law_name: law_name.to_string(),
            time,
            state,
            repair_direction: None,
            reason: message.into(),
        }
    }

    /// A one-line human-readable rendering. Wording may change between
    /// releases; tests should assert shape (law name, time), not this
    /// exact string.
    pub fn describe(&self) -> String {
        format!(
            "law `{}` violated at t={:.6}: {}",
            self.law_name, self.time, self.reason
        )
    }
}

/// The outcome of verifying a trajectory: the whole curve is admissible,
/// or the earliest violation is certified by a witness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Commit,
    Reject(Witness),
}

impl Verdict {
    pub fn is_commit(&self) -> bool {
        matches!(self, Verdict::Commit)
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Verdict::Reject(_))
    }

    pub fn witness(&self) -> Option<&Witness> {
        match self {
            Verdict::Commit => None,
            Verdict::Reject(w) => Some(w),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Commit => write!(f, "commit"),
            Verdict::Reject(w) => write!(f, "reject: {}", w.describe()),
        }
    }
}

/// Verify a trajectory against a law set using the default budget.
pub fn verify(cp: &ControlPoints, laws: &[Law]) -> Verdict {
    verify_with(cp, laws, VerificationBudget::default(), RepairConfig::default())
}

/// Verify a trajectory against a law set using a caller-supplied budget.
pub fn verify_with_budget(cp: &ControlPoints, laws: &[Law], budget: VerificationBudget) -> Verdict {
    verify_with(cp, laws, budget, RepairConfig::default())
}

/// Verify a trajectory, fully specifying both the subdivision budget and
/// the repair-direction estimation parameters.
pub fn verify_with(
    cp: &ControlPoints,
    laws: &[Law],
    budget: VerificationBudget,
    repair: RepairConfig,
) -> Verdict {
    let span = tracing::debug_span!("engine::verify", laws = laws.len(), max_depth = budget.max_depth);
    let _enter = span.enter();

    if laws.is_empty() {
        tracing::info!(verdict = "commit", "no laws to violate");
        return Verdict::Commit;
    }

    let mut stack: Vec<(ControlPoints, f64, f64, u32)> = vec![(cp.clone(), 0.0, 1.0, 0)];

    while let Some((segment, a, b, depth)) = stack.pop() {
        tracing::trace!(a, b, depth, "subdivision step");

        if depth > budget.max_depth {
            let t_mid = (a + b) / 2.0;
            let state = segment.evaluate(0.5);

            if let Some((i, law)) = laws.iter().enumerate().find(|(_, l)| !l.holds(&state)) {
                tracing::warn!(law = law.name(), t = t_mid, "depth exceeded, law fails at midpoint");
                return Verdict::Reject(Witness {
                    law_index: i as i64,
                    law_name: law.name().to_string(),
                    time: t_mid,
                    state,
                    repair_direction: None,
                    reason: format!("law `{}` fails at the maximum subdivision depth", law.name()),
                });
            }

            tracing::warn!(t = t_mid, "depth exceeded without certifying a law violation");
            return Verdict::Reject(Witness::synthetic(
                SyntheticReason::DepthExceeded,
                t_mid,
                state,
                "subdivision depth exceeded before the trajectory could be certified",
            ));
        }

        let mut any_hull_violation = false;

        for k in 0..=3usize {
            let point = segment.control_point(k);
            for (i, law) in laws.iter().enumerate() {
                if law.holds(point) {
                    continue;
                }
                any_hull_violation = true;

                let t_local = k as f64 / 3.0;
                let t_global = a + t_local * (b - a);
                let curve_point = cp.evaluate(t_global);

                if law.holds(&curve_point) {
                    // Control point violated but the original curve does
                    // not at this parameter; non-conclusive, fall through.
                    continue;
                }

                let repair_direction = compute_repair(cp, law, t_global, &curve_point, &repair);
                tracing::info!(verdict = "reject", law = law.name(), t = t_global, "confirmed violation");
                return Verdict::Reject(Witness {
                    law_index: i as i64,
                    law_name: law.name().to_string(),
                    time: t_global,
                    state: curve_point,
                    repair_direction,
                    reason: format!("law `{}` is violated on the candidate trajectory", law.name()),
                });
            }
        }

        if !any_hull_violation {
            // Every control point satisfies every law: quick-accept.
            continue;
        }

        let (left, right) = segment
            .de_casteljau_split(0.5)
            .expect("splitting at s=0.5 is always valid");
        let mid = (a + b) / 2.0;
        stack.push((right, mid, b, depth + 1));
        stack.push((left, a, mid, depth + 1));
    }

    tracing::info!(verdict = "commit");
    Verdict::Commit
}

/// Estimate a repair nudge Δ over the control point with the largest
/// Bernstein weight at `t*`, per §4.4: a one-sided finite difference of
/// `max(0, -measure(γ(t*)))` along each dimension of that control
/// point, scaled by `-η`. `None` if the law has no measure.
fn compute_repair(
    cp: &ControlPoints,
    law: &Law,
    t_star: f64,
    curve_point: &StateVector,
    repair: &RepairConfig,
) -> Option<StateVector> {
    let base_measure = law.measure(curve_point)?;
    let base_violation = (-base_measure).max(0.0);

    let k_star = (0..=3usize)
        .max_by(|&a, &b| {
            bernstein(a, 3, t_star)
                .partial_cmp(&bernstein(b, 3, t_star))
                .expect("bernstein weights are never NaN for finite t")
        })
        .expect("0..=3 is non-empty");

    let dim = cp.dimension();
    let mut gradient = Vec::with_capacity(dim);
    for d in 0..dim {
        let perturbed_cp = cp.perturbed(k_star, d, repair.epsilon);
        let perturbed_point = perturbed_cp.evaluate(t_star);
        let perturbed_violation = law
            .measure(&perturbed_point)
            .map(|m| (-m).max(0.0))
            .unwrap_or(base_violation);
        gradient.push((perturbed_violation - base_violation) / repair.epsilon);
    }

    Some(StateVector::new(
        gradient.into_iter().map(|g| -repair.eta * g).collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::StateVector;

    fn half_space(name: &str, dim: usize, positive: bool) -> Law {
        Law::new(name.to_string(), move |s: &StateVector| {
            let v = s[dim];
            if positive {
                v > 0.0
            } else {
                v < 0.0
            }
        })
    }

    #[test]
    fn s1_commits_when_entirely_inside_both_half_spaces() {
        let laws = vec![half_space("x positive", 0, true), half_space("y positive", 1, true)];
        let cp = ControlPoints::linear(
            &StateVector::new(vec![1.0, 1.0]),
            &StateVector::new(vec![3.0, 3.0]),
        )
        .unwrap();
        assert_eq!(verify(&cp, &laws), Verdict::Commit);
    }

    #[test]
    fn s2_rejects_crossing_into_negative_quadrant() {
        let laws = vec![half_space("x positive", 0, true), half_space("y positive", 1, true)];
        let cp = ControlPoints::linear(
            &StateVector::new(vec![1.0, 1.0]),
            &StateVector::new(vec![-1.0, -1.0]),
        )
        .unwrap();
        let verdict = verify(&cp, &laws);
        match verdict {
            Verdict::Reject(w) => {
                assert!(w.law_name == "x positive" || w.law_name == "y positive");
                assert!(w.time > 0.0);
            }
            Verdict::Commit => panic!("expected reject"),
        }
    }

    #[test]
    fn s3_finds_the_true_first_crossing_near_three_quarters() {
        let p0 = StateVector::new(vec![0.0, 0.0]);
        let p1 = StateVector::new(vec![1.0, 3.0]);
        let p2 = StateVector::new(vec![2.0, -1.0]);
        let p3 = StateVector::new(vec![3.0, 0.0]);
        let cp = ControlPoints::new(p0, p1, p2, p3).unwrap();

        let law = Law::new("y non-negative", |s: &StateVector| s[1] >= 0.0)
            .with_measure(|s: &StateVector| s[1]);

        let verdict = verify(&cp, &[law]);
        match verdict {
            Verdict::Reject(w) => {
                assert_eq!(w.law_name, "y non-negative");
                assert!(w.time > 0.5 && w.time < 0.9, "t*={}", w.time);
            }
            Verdict::Commit => panic!("expected reject"),
        }
    }

    #[test]
    fn s4_navigator_rectangle_rejects_straight_line_but_accepts_detour() {
        let inside_bounds = Law::new("within bounds", |s: &StateVector| {
            s[0] >= 0.0 && s[0] <= 10.0 && s[1] >= 0.0 && s[1] <= 6.0
        });
        let avoids_obstacle = Law::new("avoids rectangle", |s: &StateVector| {
            !(s[0] >= 2.0 && s[0] <= 4.0 && s[1] >= 1.0 && s[1] <= 3.0)
        });
        let avoids_circle = Law::new("avoids circle", |s: &StateVector| {
            (s[0] - 7.0).powi(2) + (s[1] - 4.0).powi(2) > 1.0
        });
        let laws = vec![inside_bounds, avoids_obstacle, avoids_circle];

        let straight = ControlPoints::linear(
            &StateVector::new(vec![1.0, 1.0]),
            &StateVector::new(vec![9.0, 5.0]),
        )
        .unwrap();
        assert!(verify(&straight, &laws).is_reject());

        let detour = ControlPoints::new(
            StateVector::new(vec![1.0, 1.0]),
            StateVector::new(vec![2.0, 4.5]),
            StateVector::new(vec![6.0, 5.5]),
            StateVector::new(vec![9.0, 5.0]),
        )
        .unwrap();
        assert_eq!(verify(&detour, &laws), Verdict::Commit);
    }

    #[test]
    fn convex_exact_half_spaces_commit_whenever_hull_is_inside() {
        let laws = vec![half_space("x positive", 0, true)];
        let cp = ControlPoints::linear(
            &StateVector::new(vec![0.1]),
            &StateVector::new(vec![5.0]),
        )
        .unwrap();
        assert_eq!(verify(&cp, &laws), Verdict::Commit);
    }

    #[test]
    fn depth_exhaustion_on_an_unresolvable_tangency_still_rejects() {
        // A law that is only violated in a vanishingly small window the
        // default budget may not resolve exactly, but the conservative
        // behavior (reject, possibly synthetic) must still hold.
        let laws = vec![Law::new("never", |_: &StateVector| false)];
        let cp = ControlPoints::linear(
            &StateVector::new(vec![0.0]),
            &StateVector::new(vec![1.0]),
        )
        .unwrap();
        assert!(verify(&cp, &laws).is_reject());
    }

    #[test]
    fn repair_direction_present_only_with_a_measure() {
        let cp = ControlPoints::linear(
            &StateVector::new(vec![1.0]),
            &StateVector::new(vec![-1.0]),
        )
        .unwrap();

        let with_measure = Law::new("positive", |s: &StateVector| s[0] > 0.0)
            .with_measure(|s: &StateVector| s[0]);
        if let Verdict::Reject(w) = verify(&cp, &[with_measure]) {
            assert!(w.repair_direction.is_some());
        } else {
            panic!("expected reject");
        }

        let without_measure = Law::new("positive", |s: &StateVector| s[0] > 0.0);
        if let Verdict::Reject(w) = verify(&cp, &[without_measure]) {
            assert!(w.repair_direction.is_none());
        } else {
            panic!("expected reject");
        }
    }

    #[test]
    fn empty_law_set_always_commits() {
        let cp = ControlPoints::linear(
            &StateVector::new(vec![0.0]),
            &StateVector::new(vec![100.0]),
        )
        .unwrap();
        assert_eq!(verify(&cp, &[]), Verdict::Commit);
    }
}
