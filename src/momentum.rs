//! This module implements some domain-specific 4-momentum handling logic.

use crate::numeric::{
    reals::consts::{PI, TAU},
    Float,
};
use nalgebra::SVector;
use prefix_num_ops::real::*;

/// 4-momentum dimension
pub const MOMENTUM_DIM: usize = 4;

/// Relativistic 4-momentum
pub type Momentum = SVector<Float, MOMENTUM_DIM>;

/// Convenience const for accessing the X coordinate of a 4-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 4-vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a 4-vector
pub const Z: usize = 2;

/// Convenience const for accessing the E coordinate of a 4-vector
pub const E: usize = 3;

/// Build a 4-momentum from collider coordinates and energy
pub fn from_pt_eta_phi_e(pt: Float, eta: Float, phi: Float, e: Float) -> Momentum {
    Momentum::new(pt * cos(phi), pt * sin(phi), pt * eta.sinh(), e)
}

/// Build a 4-momentum from collider coordinates and invariant mass
pub fn from_pt_eta_phi_m(pt: Float, eta: Float, phi: Float, m: Float) -> Momentum {
    let p_z = pt * eta.sinh();
    let e = sqrt(m.powi(2) + pt.powi(2) + p_z.powi(2));
    Momentum::new(pt * cos(phi), pt * sin(phi), p_z, e)
}

/// Collider kinematics of a 4-momentum
///
/// Follows the conventions of ROOT's TLorentzVector, which the reference
/// histograms were produced with.
///
pub trait Kinematics {
    /// Transverse momentum
    fn pt(&self) -> Float;

    /// Pseudorapidity
    fn eta(&self) -> Float;

    /// Azimuthal angle in [-π, π]
    fn phi(&self) -> Float;

    /// Invariant mass, negative if the 4-momentum is space-like
    fn mass(&self) -> Float;

    /// Azimuthal separation from another 4-momentum, folded into [-π, π)
    fn delta_phi(&self, other: &Self) -> Float;
}
//
impl Kinematics for Momentum {
    fn pt(&self) -> Float {
        sqrt(self[X].powi(2) + self[Y].powi(2))
    }

    fn eta(&self) -> Float {
        let pt = self.pt();
        if pt > 0. {
            (self[Z] / pt).asinh()
        } else if self[Z] == 0. {
            0.
        } else {
            // Same stand-in value as ROOT for momenta along the beam axis
            Float::copysign(10e10, self[Z])
        }
    }

    fn phi(&self) -> Float {
        if self[X] == 0. && self[Y] == 0. {
            0.
        } else {
            self[Y].atan2(self[X])
        }
    }

    fn mass(&self) -> Float {
        let m2 = self[E].powi(2) - self.fixed_rows::<3>(X).norm_squared();
        if m2 < 0. {
            -sqrt(-m2)
        } else {
            sqrt(m2)
        }
    }

    fn delta_phi(&self, other: &Self) -> Float {
        let mut dphi = self.phi() - other.phi();
        if !dphi.is_finite() {
            return dphi;
        }
        while dphi >= PI {
            dphi -= TAU;
        }
        while dphi < -PI {
            dphi += TAU;
        }
        dphi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn collider_coordinates_roundtrip() {
        let p = from_pt_eta_phi_m(45., -1.2, 2.5, 10.);
        assert_relative_eq!(p.pt(), 45., max_relative = 1e-6);
        assert_relative_eq!(p.eta(), -1.2, max_relative = 1e-6);
        assert_relative_eq!(p.phi(), 2.5, max_relative = 1e-6);
        assert_relative_eq!(p.mass(), 10., max_relative = 1e-5);
    }

    #[test]
    fn space_like_mass_is_negative() {
        let p = Momentum::new(3., 0., 4., 3.);
        assert_relative_eq!(p.mass(), -4., max_relative = 1e-6);
    }

    #[test]
    fn momentum_along_beam() {
        let p = Momentum::new(0., 0., 10., 10.);
        assert_eq!(p.phi(), 0.);
        assert!(p.eta() > 1e10);
        assert_eq!(Momentum::new(0., 0., 0., 1.).eta(), 0.);
    }

    #[test]
    fn delta_phi_is_folded() {
        let a = from_pt_eta_phi_e(1., 0., 3., 1.);
        let b = from_pt_eta_phi_e(1., 0., -3., 1.);
        assert_relative_eq!(a.delta_phi(&b), 6. - TAU, max_relative = 1e-5);
        assert_relative_eq!(b.delta_phi(&a), TAU - 6., max_relative = 1e-5);
    }
}
