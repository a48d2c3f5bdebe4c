//! Physical constants used by the kinetics and pulse models.
//!
//! All quantities are strictly metric:
//! - Potential: volt (V)
//! - Capacitance: farad (F)
//! - Resistance: ohm (Ω)
//! - Time: second (s)
//! - Current density: A·cm⁻²
//! - Surface loading: mol·cm⁻²

/// Molar gas constant, J·mol⁻¹·K⁻¹.
pub const GAS_CONSTANT: f64 = 8.3145;
/// Cell temperature, K.
pub const TEMPERATURE: f64 = 295.0;
/// Faraday constant, C·mol⁻¹.
pub const FARADAY: f64 = 96485.0;
/// RT product, J·mol⁻¹.
pub const RT: f64 = GAS_CONSTANT * TEMPERATURE;
/// F/(RT), V⁻¹.
pub const F_BY_RT: f64 = FARADAY / RT;
/// Natural logarithm of 2, used for reaction half-lives.
pub const LN_2: f64 = std::f64::consts::LN_2;

/// Conversion from mol·cm⁻² to nmol·cm⁻².
pub const MOL_TO_NMOL: f64 = 1.0e9;
