//! Chemical species and their standard-state parameters.

use crate::element::standard_molar_mass;
use crate::error::{ThermoError, ThermoResult};
use crate::formula::{parse_charge, parse_formula};
use std::collections::BTreeMap;

/// Physical state in which a species exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateState {
    Aqueous,
    Gaseous,
    Liquid,
    Solid,
    Undefined,
}

impl std::str::FromStr for AggregateState {
    type Err = ThermoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aq" | "aqueous" => Ok(AggregateState::Aqueous),
            "g" | "gas" | "gaseous" => Ok(AggregateState::Gaseous),
            "l" | "liquid" => Ok(AggregateState::Liquid),
            "s" | "solid" | "mineral" => Ok(AggregateState::Solid),
            "" | "undefined" => Ok(AggregateState::Undefined),
            other => Err(ThermoError::InvalidArg {
                what: format!("unknown aggregate state '{other}'"),
            }),
        }
    }
}

/// Revised HKF parameters of an aqueous solute.
///
/// Values use the conventional SUPCRT units with the tabulation scale
/// factors already applied: energies in cal/mol, `a1` in cal/(mol·bar),
/// `a2` in cal/mol, `a3` in cal·K/(mol·bar), `a4` and `c2` in cal·K/mol,
/// `c1` in cal/(mol·K), `wref` in cal/mol.
#[derive(Debug, Clone, PartialEq)]
pub struct AqueousHkfParams {
    pub gf: f64,
    pub hf: f64,
    pub sr: f64,
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub a4: f64,
    pub c1: f64,
    pub c2: f64,
    pub wref: f64,
    pub tmax: f64,
}

/// Maier–Kelley heat capacity `Cp = a + b·T + c/T²` in cal/(mol·K).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaierKelley {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// HKF parameters of a gas (cal units).
#[derive(Debug, Clone, PartialEq)]
pub struct GasHkfParams {
    pub gf: f64,
    pub hf: f64,
    pub sr: f64,
    pub cp: MaierKelley,
    pub tmax: f64,
}

/// Polymorphic transition of a mineral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseTransition {
    /// Transition temperature at the reference pressure (K).
    pub temperature: f64,
    /// Enthalpy of transition (cal/mol).
    pub enthalpy: f64,
    /// Volume of transition (cm³/mol).
    pub volume: f64,
    /// Slope of the transition boundary (bar/K); zero when unknown.
    pub dpdt: f64,
}

/// HKF parameters of a mineral (cal units, `vr` in cm³/mol).
///
/// `cp` holds one Maier–Kelley set per temperature interval, so its length
/// is `transitions.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct MineralHkfParams {
    pub gf: f64,
    pub hf: f64,
    pub sr: f64,
    pub vr: f64,
    pub cp: Vec<MaierKelley>,
    pub transitions: Vec<PhaseTransition>,
    pub tmax: f64,
}

/// Temperature-independent standard properties in SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantThermoParams {
    /// J/mol
    pub gibbs_energy: f64,
    /// J/mol
    pub enthalpy: f64,
    /// m³/mol
    pub volume: f64,
}

/// How the standard-state properties of a species are computed.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesThermoParams {
    /// Liquid water from the water equation of state.
    Water,
    AqueousSoluteHkf(AqueousHkfParams),
    GasHkf(GasHkfParams),
    MineralHkf(MineralHkfParams),
    Constant(ConstantThermoParams),
}

/// Critical constants used by cubic equations of state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalProperties {
    /// K
    pub temperature: f64,
    /// Pa
    pub pressure: f64,
    pub acentric_factor: f64,
}

/// A chemical species.
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    name: String,
    formula: String,
    elements: BTreeMap<String, f64>,
    charge: f64,
    molar_mass: f64,
    aggregate_state: AggregateState,
    thermo: SpeciesThermoParams,
    tags: Vec<String>,
    dissociation: BTreeMap<String, f64>,
    critical: Option<CriticalProperties>,
}

impl Species {
    /// Create a species, deriving elements, charge and molar mass from `formula`.
    pub fn new(
        name: impl Into<String>,
        formula: impl Into<String>,
        aggregate_state: AggregateState,
        thermo: SpeciesThermoParams,
    ) -> ThermoResult<Self> {
        let name = name.into();
        let formula = formula.into();
        let elements = parse_formula(&formula)?;
        let charge = parse_charge(&formula)?;
        let molar_mass = molar_mass_of(&elements)?;
        Ok(Self {
            name,
            formula,
            elements,
            charge,
            molar_mass,
            aggregate_state,
            thermo,
            tags: Vec::new(),
            dissociation: BTreeMap::new(),
            critical: None,
        })
    }

    /// Override the molar mass (kg/mol).
    pub fn with_molar_mass(mut self, molar_mass: f64) -> Self {
        self.molar_mass = molar_mass;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Ions released when this neutral complex dissociates.
    pub fn with_dissociation(mut self, dissociation: BTreeMap<String, f64>) -> Self {
        self.dissociation = dissociation;
        self
    }

    pub fn with_critical_properties(mut self, critical: CriticalProperties) -> Self {
        self.critical = Some(critical);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn elements(&self) -> &BTreeMap<String, f64> {
        &self.elements
    }

    /// Number of atoms of `element` in one formula unit.
    pub fn element_coefficient(&self, element: &str) -> f64 {
        self.elements.get(element).copied().unwrap_or(0.0)
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// Molar mass in kg/mol.
    pub fn molar_mass(&self) -> f64 {
        self.molar_mass
    }

    pub fn aggregate_state(&self) -> AggregateState {
        self.aggregate_state
    }

    pub fn thermo(&self) -> &SpeciesThermoParams {
        &self.thermo
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn dissociation(&self) -> &BTreeMap<String, f64> {
        &self.dissociation
    }

    pub fn critical_properties(&self) -> Option<CriticalProperties> {
        self.critical
    }

    /// True for the aqueous solvent.
    pub fn is_water(&self) -> bool {
        matches!(self.thermo, SpeciesThermoParams::Water)
    }
}

fn molar_mass_of(elements: &BTreeMap<String, f64>) -> ThermoResult<f64> {
    elements.iter().try_fold(0.0, |acc, (symbol, count)| {
        standard_molar_mass(symbol)
            .map(|m| acc + m * count)
            .ok_or_else(|| ThermoError::InvalidArg {
                what: format!("unknown element symbol '{symbol}'"),
            })
    })
}
