//! Chemical elements.

use crate::error::{ThermoError, ThermoResult};

/// A chemical element: symbol plus molar mass in kg/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    molar_mass: f64,
}

impl Element {
    pub fn new(name: impl Into<String>, molar_mass: f64) -> ThermoResult<Self> {
        let name = name.into();
        if !molar_mass.is_finite() || molar_mass < 0.0 {
            return Err(ThermoError::InvalidArg {
                what: format!("molar mass of element {name} must be finite and non-negative"),
            });
        }
        Ok(Self { name, molar_mass })
    }

    /// Look up an element in the built-in periodic table.
    pub fn from_symbol(symbol: &str) -> ThermoResult<Self> {
        let molar_mass = standard_molar_mass(symbol).ok_or_else(|| ThermoError::InvalidArg {
            what: format!("unknown element symbol '{symbol}'"),
        })?;
        Ok(Self {
            name: symbol.to_string(),
            molar_mass,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Molar mass in kg/mol.
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }
}

/// Standard atomic weights in g/mol.
const PERIODIC_TABLE: &[(&str, f64)] = &[
    ("H", 1.00794),
    ("He", 4.002602),
    ("Li", 6.941),
    ("Be", 9.012182),
    ("B", 10.811),
    ("C", 12.0107),
    ("N", 14.0067),
    ("O", 15.9994),
    ("F", 18.9984032),
    ("Ne", 20.1797),
    ("Na", 22.98976928),
    ("Mg", 24.305),
    ("Al", 26.9815386),
    ("Si", 28.0855),
    ("P", 30.973762),
    ("S", 32.065),
    ("Cl", 35.453),
    ("Ar", 39.948),
    ("K", 39.0983),
    ("Ca", 40.078),
    ("Ti", 47.867),
    ("Cr", 51.9961),
    ("Mn", 54.938045),
    ("Fe", 55.845),
    ("Co", 58.933195),
    ("Ni", 58.6934),
    ("Cu", 63.546),
    ("Zn", 65.38),
    ("As", 74.9216),
    ("Br", 79.904),
    ("Rb", 85.4678),
    ("Sr", 87.62),
    ("Ag", 107.8682),
    ("Cd", 112.411),
    ("I", 126.90447),
    ("Cs", 132.9054519),
    ("Ba", 137.327),
    ("Hg", 200.59),
    ("Pb", 207.2),
    ("U", 238.02891),
];

/// Molar mass (kg/mol) of a known element symbol.
pub fn standard_molar_mass(symbol: &str) -> Option<f64> {
    PERIODIC_TABLE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, m)| m * 1e-3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_resolve() {
        let ca = Element::from_symbol("Ca").unwrap();
        assert_eq!(ca.name(), "Ca");
        assert!((ca.molar_mass() - 0.040078).abs() < 1e-12);
        assert!(Element::from_symbol("Xx").is_err());
    }

    #[test]
    fn negative_mass_rejected() {
        assert!(Element::new("Q", -1.0).is_err());
    }
}
