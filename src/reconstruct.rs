//! Combinatorial reconstruction of hadronically decaying top quarks
//!
//! The hadronic top is taken to be the jet triple with the highest vector-sum
//! transverse momentum, and the hadronic W to be a jet pair from that triple.

use crate::{
    config::UnknownVariant,
    event::{Jet, PhysicsObject},
    momentum::{Kinematics, Momentum},
    numeric::Float,
};

use num_traits::Zero;
use std::str::FromStr;

/// How jet combinations are enumerated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// Reproduce the reference analysis results
    ///
    /// Triples are only drawn from the first n-1 jets, and the hadronic W is
    /// seeded with the leading jet paired with itself. That seed is only
    /// replaced by the first two jets of the top triple if they have a higher
    /// pt than the leading jet alone.
    ///
    #[default]
    Reference,

    /// Consider every jet triple, and every pair within the chosen triple
    Exhaustive,
}
//
impl FromStr for SearchMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference" => Ok(Self::Reference),
            "exhaustive" => Ok(Self::Exhaustive),
            _ => Err(UnknownVariant::new("jet search mode", s)),
        }
    }
}

/// Jets attributed to the hadronic top quark and W boson
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HadronicCandidates<'ev> {
    /// Jets forming the top quark candidate
    pub top: [&'ev Jet; 3],

    /// Jets forming the W boson candidate
    pub w: [&'ev Jet; 2],
}
//
impl HadronicCandidates<'_> {
    /// 4-momentum of the top candidate
    pub fn top_momentum(&self) -> Momentum {
        sum_momenta(&self.top)
    }

    /// 4-momentum of the W candidate
    pub fn w_momentum(&self) -> Momentum {
        sum_momenta(&self.w)
    }

    /// Invariant mass of the top candidate
    pub fn top_mass(&self) -> Float {
        self.top_momentum().mass()
    }

    /// Invariant mass of the W candidate
    pub fn w_mass(&self) -> Float {
        self.w_momentum().mass()
    }
}

/// Vector sum of some jets' 4-momenta
fn sum_momenta(jets: &[&Jet]) -> Momentum {
    jets.iter()
        .fold(Momentum::zero(), |acc, jet| acc + jet.p4())
}

/// Find the hadronic top and W candidates among jets sorted by decreasing pt
///
/// Returns None if there are not enough jets to form a triple.
///
pub fn reconstruct<'ev>(jets: &[&'ev Jet], mode: SearchMode) -> Option<HadronicCandidates<'ev>> {
    let top = match mode {
        SearchMode::Reference => best_triple(&jets[..jets.len().saturating_sub(1)])?,
        SearchMode::Exhaustive => best_triple(jets)?,
    };
    let w = match mode {
        SearchMode::Reference => {
            let leading = jets[0];
            let candidate = [top[0], top[1]];
            if sum_momenta(&candidate).pt() > leading.pt() {
                candidate
            } else {
                [leading, leading]
            }
        }
        SearchMode::Exhaustive => {
            let mut best: Option<([&Jet; 2], Float)> = None;
            for (i, j) in [(0, 1), (0, 2), (1, 2)] {
                let pair = [top[i], top[j]];
                let pt = sum_momenta(&pair).pt();
                if best.map_or(true, |(_, best_pt)| pt > best_pt) {
                    best = Some((pair, pt));
                }
            }
            best?.0
        }
    };
    Some(HadronicCandidates { top, w })
}

/// Jet triple with the highest vector-sum pt, keeping the first one on ties
fn best_triple<'ev>(jets: &[&'ev Jet]) -> Option<[&'ev Jet; 3]> {
    let n = jets.len();
    let mut best: Option<([&Jet; 3], Float)> = None;
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                let triple = [jets[i], jets[j], jets[k]];
                let pt = sum_momenta(&triple).pt();
                if best.map_or(true, |(_, best_pt)| pt > best_pt) {
                    best = Some((triple, pt));
                }
            }
        }
    }
    best.map(|(triple, _)| triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::fixtures::*, helpers::select_and_sort};
    use approx::assert_relative_eq;

    /// Four jets where the reference and exhaustive searches disagree
    fn test_jets() -> Vec<Jet> {
        vec![
            jet(110., -1.5, 0.0, 0.9),
            jet(90., 0.1, -2.8, 0.95),
            jet(70., 0.1, -1.8, 0.1),
            jet(40., -1.3, 1.7, 0.1),
        ]
    }

    fn same_jets(actual: &[&Jet], expected: &[&Jet]) -> bool {
        actual.len() == expected.len()
            && actual.iter().zip(expected).all(|(a, e)| std::ptr::eq(*a, *e))
    }

    #[test]
    fn parse_search_mode() {
        assert_eq!("reference".parse::<SearchMode>(), Ok(SearchMode::Reference));
        assert_eq!("exhaustive".parse::<SearchMode>(), Ok(SearchMode::Exhaustive));
        assert!("best".parse::<SearchMode>().is_err());
    }

    #[test]
    fn not_enough_jets() {
        let jets = test_jets();
        let refs = jets.iter().collect::<Vec<_>>();
        assert!(reconstruct(&refs[..2], SearchMode::Exhaustive).is_none());
        assert!(reconstruct(&refs[..3], SearchMode::Reference).is_none());
        assert!(reconstruct(&refs[..3], SearchMode::Exhaustive).is_some());
        assert!(reconstruct(&[], SearchMode::Reference).is_none());
    }

    #[test]
    fn reference_search() {
        let jets = test_jets();
        let refs = jets.iter().collect::<Vec<_>>();
        let candidates = reconstruct(&refs, SearchMode::Reference).unwrap();

        // The last jet is never considered
        assert!(same_jets(&candidates.top, &[&jets[0], &jets[1], &jets[2]]));
        assert_relative_eq!(candidates.top_mass(), 344.9337721545663, max_relative = 1e-5);

        // The first two jets are almost back to back, so the seed survives
        assert!(same_jets(&candidates.w, &[&jets[0], &jets[0]]));
        assert_relative_eq!(candidates.w_mass(), 2. * JET_MASS, max_relative = 1e-5);
        assert_relative_eq!(candidates.w_momentum().pt(), 220., max_relative = 1e-6);
    }

    #[test]
    fn reference_w_from_collimated_jets() {
        let jets = vec![
            jet(100., 0., 0.0, 0.1),
            jet(90., 0., 0.2, 0.1),
            jet(80., 0., 0.4, 0.9),
            jet(30., 0., 2.0, 0.9),
        ];
        let refs = jets.iter().collect::<Vec<_>>();
        let candidates = reconstruct(&refs, SearchMode::Reference).unwrap();
        assert!(same_jets(&candidates.top, &[&jets[0], &jets[1], &jets[2]]));
        assert_relative_eq!(candidates.top_mass(), 46.21402443252784, max_relative = 1e-3);

        // The first two jets outweigh the leading jet alone and replace the seed
        assert!(same_jets(&candidates.w, &[&jets[0], &jets[1]]));
        assert_relative_eq!(candidates.w_momentum().pt(), 189.0534273721118, max_relative = 1e-5);
        assert_relative_eq!(candidates.w_mass(), 21.42611969168356, max_relative = 1e-3);
        assert_relative_eq!(
            candidates.w_mass(),
            (jets[0].p4() + jets[1].p4()).mass(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn exhaustive_search() {
        let jets = test_jets();
        let refs = jets.iter().collect::<Vec<_>>();
        let candidates = reconstruct(&refs, SearchMode::Exhaustive).unwrap();

        assert!(same_jets(&candidates.top, &[&jets[1], &jets[2], &jets[3]]));
        assert_relative_eq!(candidates.top_mass(), 200.780860349738, max_relative = 1e-5);
        assert!(same_jets(&candidates.w, &[&jets[1], &jets[2]]));
        assert_relative_eq!(candidates.w_mass(), 76.77090554364013, max_relative = 1e-5);
    }

    #[test]
    fn independent_of_input_order_once_sorted() {
        let jets = test_jets();
        let reordered = [&jets[2], &jets[0], &jets[3], &jets[1]];
        for mode in [SearchMode::Reference, SearchMode::Exhaustive] {
            let sorted = select_and_sort(jets.iter(), |_| true, |j| j.pt());
            let resorted = select_and_sort(reordered.iter().copied(), |_| true, |j| j.pt());
            let expected = reconstruct(&sorted, mode).unwrap();
            let actual = reconstruct(&resorted, mode).unwrap();
            assert!(same_jets(&actual.top, &expected.top));
            assert!(same_jets(&actual.w, &expected.w));
        }
    }
}
