//! Reaction equations and reactions between species of a system.

use crate::error::{SystemError, SystemResult};
use crate::properties::ChemicalProperties;
use crate::system::ChemicalSystem;
use nalgebra::DVector;
use rk_core::constants::GAS_CONSTANT;
use rk_core::{ChemicalScalar, ThermoScalar};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A reaction equation such as `"Calcite + H+ = Ca++ + HCO3-"`.
///
/// Terms are separated by whitespace-delimited `+`; a coefficient is written
/// as `2*H2O`. Reactants get negative coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEquation {
    terms: Vec<(String, f64)>,
}

impl ReactionEquation {
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn num_species(&self) -> usize {
        self.terms.len()
    }

    /// Coefficient of `species`, zero when absent.
    pub fn coefficient(&self, species: &str) -> f64 {
        self.terms
            .iter()
            .filter(|(n, _)| n == species)
            .map(|(_, c)| *c)
            .sum()
    }

    pub fn species_names(&self) -> Vec<&str> {
        self.terms.iter().map(|(n, _)| n.as_str()).collect()
    }
}

fn parse_side(side: &str, sign: f64, terms: &mut Vec<(String, f64)>) -> SystemResult<()> {
    for token in side.split_whitespace().filter(|t| *t != "+") {
        let (coeff, name) = match token.split_once('*') {
            Some((c, n)) => {
                let c: f64 = c.parse().map_err(|_| SystemError::Parse {
                    what: format!("invalid stoichiometric coefficient '{c}'"),
                })?;
                (c, n)
            }
            None => (1.0, token),
        };
        if name.is_empty() {
            return Err(SystemError::Parse {
                what: format!("missing species name in '{token}'"),
            });
        }
        match terms.iter_mut().find(|(n, _)| n == name) {
            Some(term) => term.1 += sign * coeff,
            None => terms.push((name.to_string(), sign * coeff)),
        }
    }
    Ok(())
}

impl FromStr for ReactionEquation {
    type Err = SystemError;

    fn from_str(s: &str) -> SystemResult<Self> {
        let (lhs, rhs) = s.split_once('=').ok_or_else(|| SystemError::Parse {
            what: format!("reaction equation '{s}' has no '='"),
        })?;
        let mut terms = Vec::new();
        parse_side(lhs, -1.0, &mut terms)?;
        parse_side(rhs, 1.0, &mut terms)?;
        if terms.is_empty() {
            return Err(SystemError::Parse {
                what: format!("reaction equation '{s}' has no species"),
            });
        }
        Ok(Self { terms })
    }
}

impl fmt::Display for ReactionEquation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |sign: f64| {
            self.terms
                .iter()
                .filter(|(_, c)| c.signum() == sign)
                .map(|(n, c)| {
                    if c.abs() == 1.0 {
                        n.clone()
                    } else {
                        format!("{}*{}", c.abs(), n)
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        write!(f, "{} = {}", side(-1.0), side(1.0))
    }
}

/// Rate of a reaction (mol/s) as a function of the system properties.
pub type ReactionRateFn = Arc<dyn Fn(&ChemicalProperties) -> SystemResult<ChemicalScalar> + Send + Sync>;
/// ln K as a function of (T, P).
pub type EquilibriumConstantFn = Arc<dyn Fn(f64, f64) -> ThermoScalar + Send + Sync>;

/// A reaction bound to the species of a chemical system.
#[derive(Clone)]
pub struct Reaction {
    name: String,
    equation: ReactionEquation,
    indices: Vec<usize>,
    stoichiometry: DVector<f64>,
    ln_k: Option<EquilibriumConstantFn>,
    rate: Option<ReactionRateFn>,
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("equation", &self.equation.to_string())
            .field("has_ln_k", &self.ln_k.is_some())
            .field("has_rate", &self.rate.is_some())
            .finish()
    }
}

impl Reaction {
    pub fn new(system: &ChemicalSystem, equation: ReactionEquation) -> SystemResult<Self> {
        let mut stoichiometry = DVector::zeros(system.num_species());
        let mut indices = Vec::with_capacity(equation.num_species());
        for (name, nu) in equation.iter() {
            let i = system.index_species_with_error(name)?;
            stoichiometry[i] = nu;
            indices.push(i);
        }
        Ok(Self {
            name: equation.to_string(),
            equation,
            indices,
            stoichiometry,
            ln_k: None,
            rate: None,
        })
    }

    pub fn parse(system: &ChemicalSystem, equation: &str) -> SystemResult<Self> {
        Self::new(system, equation.parse()?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_equilibrium_constant(mut self, ln_k: EquilibriumConstantFn) -> Self {
        self.ln_k = Some(ln_k);
        self
    }

    pub fn with_rate(mut self, rate: ReactionRateFn) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn equation(&self) -> &ReactionEquation {
        &self.equation
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Coefficients over all species of the system.
    pub fn stoichiometry(&self) -> &DVector<f64> {
        &self.stoichiometry
    }

    /// ln K from the given function, else `−Σ νᵢG°ᵢ/RT`.
    pub fn ln_equilibrium_constant(&self, props: &ChemicalProperties) -> ThermoScalar {
        let (t, p) = (props.temperature(), props.pressure());
        match &self.ln_k {
            Some(f) => f(t, p),
            None => {
                let dg = props.standard_partial_molar_gibbs_energies().dot(&self.stoichiometry);
                -dg / (ThermoScalar::temperature(t) * GAS_CONSTANT)
            }
        }
    }

    /// `ln Q = Σ νᵢ ln aᵢ` over the species of the equation only, so absent
    /// spectators (ln a = −∞) do not enter.
    pub fn ln_reaction_quotient(&self, props: &ChemicalProperties) -> ChemicalScalar {
        let ln_a = props.ln_activities();
        let mut ln_q = ChemicalScalar::zero(self.stoichiometry.len());
        for &i in &self.indices {
            ln_q += &(&ln_a.row(i) * self.stoichiometry[i]);
        }
        ln_q
    }

    /// `ln Ω = ln Q − ln K`
    pub fn ln_saturation_index(&self, props: &ChemicalProperties) -> ChemicalScalar {
        &self.ln_reaction_quotient(props) - self.ln_equilibrium_constant(props)
    }

    /// Reaction rate (mol/s); zero when no rate function is attached.
    pub fn rate(&self, props: &ChemicalProperties) -> SystemResult<ChemicalScalar> {
        match &self.rate {
            Some(f) => f(props),
            None => Ok(ChemicalScalar::zero(self.stoichiometry.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_coefficients() {
        let eq: ReactionEquation = "Calcite + 2*H+ = Ca++ + CO2(aq) + H2O(l)".parse().unwrap();
        assert_eq!(eq.coefficient("Calcite"), -1.0);
        assert_eq!(eq.coefficient("H+"), -2.0);
        assert_eq!(eq.coefficient("H2O(l)"), 1.0);
        assert_eq!(eq.coefficient("Quartz"), 0.0);
        assert_eq!(eq.num_species(), 5);
        assert_eq!(eq.to_string(), "Calcite + 2*H+ = Ca++ + CO2(aq) + H2O(l)");
    }

    #[test]
    fn charged_names_survive_splitting() {
        let eq: ReactionEquation = "H2O(l) = H+ + OH-".parse().unwrap();
        assert_eq!(eq.species_names(), vec!["H2O(l)", "H+", "OH-"]);
    }

    #[test]
    fn malformed_equations_are_rejected() {
        assert!("Calcite + H+".parse::<ReactionEquation>().is_err());
        assert!("x*Calcite = Ca++".parse::<ReactionEquation>().is_err());
        assert!(" = ".parse::<ReactionEquation>().is_err());
    }
}
