use criclive_models::{Crease, PlayerId};

/// What a committed ball did that matters for who faces next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationInput {
    /// Runs physically completed, before any multiplier.
    pub runs_completed: u32,
    pub dismissed: Option<PlayerId>,
    pub incoming: Option<PlayerId>,
    pub over_completed: bool,
}

/// Crease after one ball. Odd runs swap the batters; a dismissal puts the
/// incoming batter in the vacated slot (after the odd-run crossing); the end
/// of an over swaps again. `lone_batter` is the last-man-stands state where
/// the survivor bats alone and nothing swaps.
pub fn rotate(crease: Crease, input: RotationInput, lone_batter: bool) -> Crease {
    let odd = input.runs_completed % 2 == 1;

    let next = match input.dismissed {
        None if odd => crease.swapped(),
        None => crease,
        Some(out) if crease.striker == Some(out) => {
            let survivor = crease.non_striker;
            if odd {
                Crease { striker: survivor, non_striker: input.incoming }
            } else {
                Crease { striker: input.incoming, non_striker: survivor }
            }
        }
        Some(_) => {
            let striker = crease.striker;
            if odd {
                Crease { striker: input.incoming, non_striker: striker }
            } else {
                Crease { striker, non_striker: input.incoming }
            }
        }
    };

    if lone_batter {
        return Crease { striker: next.striker.or(next.non_striker), non_striker: None };
    }
    if input.over_completed {
        next.swapped()
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (PlayerId, PlayerId, Crease) {
        let a = PlayerId::new();
        let b = PlayerId::new();
        (a, b, Crease::new(a, b))
    }

    fn runs(runs_completed: u32, over_completed: bool) -> RotationInput {
        RotationInput { runs_completed, dismissed: None, incoming: None, over_completed }
    }

    #[test]
    fn test_even_runs_keep_strike() {
        let (a, _, crease) = pair();
        assert_eq!(rotate(crease, runs(2, false), false).striker, Some(a));
        assert_eq!(rotate(crease, runs(0, false), false).striker, Some(a));
    }

    #[test]
    fn test_odd_runs_swap() {
        let (_, b, crease) = pair();
        assert_eq!(rotate(crease, runs(1, false), false).striker, Some(b));
        assert_eq!(rotate(crease, runs(3, false), false).striker, Some(b));
    }

    #[test]
    fn test_end_of_over_swaps() {
        let (_, b, crease) = pair();
        assert_eq!(rotate(crease, runs(0, true), false).striker, Some(b));
    }

    #[test]
    fn test_odd_run_on_last_ball_double_swaps() {
        let (a, b, crease) = pair();
        let next = rotate(crease, runs(1, true), false);
        assert_eq!(next, Crease::new(a, b));
    }

    #[test]
    fn test_striker_out_new_batter_faces() {
        let (a, b, crease) = pair();
        let c = PlayerId::new();
        let input = RotationInput { runs_completed: 0, dismissed: Some(a), incoming: Some(c), over_completed: false };
        assert_eq!(rotate(crease, input, false), Crease::new(c, b));
    }

    #[test]
    fn test_striker_run_out_after_odd_runs() {
        let (a, b, crease) = pair();
        let c = PlayerId::new();
        let input = RotationInput { runs_completed: 1, dismissed: Some(a), incoming: Some(c), over_completed: false };
        assert_eq!(rotate(crease, input, false), Crease::new(b, c));
    }

    #[test]
    fn test_non_striker_run_out() {
        let (a, b, crease) = pair();
        let c = PlayerId::new();
        let even = RotationInput { runs_completed: 0, dismissed: Some(b), incoming: Some(c), over_completed: false };
        assert_eq!(rotate(crease, even, false), Crease::new(a, c));

        let odd = RotationInput { runs_completed: 1, dismissed: Some(b), incoming: Some(c), over_completed: false };
        assert_eq!(rotate(crease, odd, false), Crease::new(c, a));
    }

    #[test]
    fn test_wicket_on_last_ball_of_over() {
        let (a, b, crease) = pair();
        let c = PlayerId::new();
        let input = RotationInput { runs_completed: 0, dismissed: Some(a), incoming: Some(c), over_completed: true };
        assert_eq!(rotate(crease, input, false), Crease::new(b, c));
    }

    #[test]
    fn test_wicket_without_incoming_leaves_vacancy() {
        let (a, b, crease) = pair();
        let input = RotationInput { runs_completed: 0, dismissed: Some(a), incoming: None, over_completed: false };
        let next = rotate(crease, input, false);
        assert_eq!(next.striker, None);
        assert_eq!(next.non_striker, Some(b));
        assert_eq!(next.occupants(), 1);
    }

    #[test]
    fn test_lone_batter_never_swaps() {
        let a = PlayerId::new();
        let lone = Crease { striker: Some(a), non_striker: None };
        assert_eq!(rotate(lone, runs(1, true), true), lone);
        assert_eq!(rotate(lone, runs(0, true), true), lone);
    }

    #[test]
    fn test_wicket_leaves_survivor_alone() {
        let (a, b, crease) = pair();
        let input = RotationInput { runs_completed: 1, dismissed: Some(a), incoming: None, over_completed: true };
        assert_eq!(rotate(crease, input, true), Crease { striker: Some(b), non_striker: None });
    }
}
