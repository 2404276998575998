/// Reference values for the 2D Ising model on the square lattice.

/// Critical temperature per unit coupling, T_c ≈ 2.269 J/k_B.
/// Scan comparisons are made against this reference.
pub const CRITICAL_TEMPERATURE_PER_COUPLING: f64 = 2.269;

/// Exact Onsager critical temperature for J = 1:
/// T_c = 2 / ln(1 + √2) ≈ 2.269 J/k_B
pub fn critical_temperature_exact() -> f64 {
    2.0 / (1.0 + 2.0_f64.sqrt()).ln()
}

/// Theoretical magnetization per site at T = 0 (all spins aligned)
pub fn magnetization_at_zero_temp() -> f64 {
    1.0
}

/// Theoretical energy per site at T = 0 for J = 1, B = 0.
/// Each spin has 4 aligned neighbors and each bond is shared by two sites,
/// giving E = -J * 4 / 2 = -2J per site.
pub fn energy_per_site_at_zero_temp() -> f64 {
    -2.0
}
