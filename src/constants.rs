//! Physical constants, in the units used throughout the crate:
//! lengths in m, energies, momenta and masses in GeV (c = 1),
//! angles in radians, times in s.

/// Electron mass, units of GeV
pub const ELECTRON_MASS: f64 = 0.510998910e-3;
/// Fine-structure constant
pub const ALPHA_FINE: f64 = 7.2973525698e-3;
/// hbar c, units of GeV m
pub const HBARC: f64 = 0.1973269718e-15;
/// Reduced Compton length = hbar / (m c), units of m
pub const COMPTON_LENGTH: f64 = HBARC / ELECTRON_MASS;
/// Classical electron radius = alpha * Compton length, units of m
pub const CLASSICAL_ELECTRON_RADIUS: f64 = ALPHA_FINE * COMPTON_LENGTH;
/// Avogadro's number, per mol
pub const AVOGADRO: f64 = 6.02214076e23;
/// Atomic mass unit, units of GeV
pub const ATOMIC_MASS_UNIT: f64 = 0.9314941024;
/// Boltzmann constant, units of GeV/K
pub const BOLTZMANN: f64 = 8.617333262e-14;
