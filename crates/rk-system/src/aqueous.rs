//! Properties specific to the aqueous phase.

use crate::error::{SystemError, SystemResult};
use crate::properties::ChemicalProperties;
use crate::reaction::ReactionEquation;
use nalgebra::DVector;
use rk_core::constants::{FARADAY, GAS_CONSTANT};
use rk_core::{ChemicalScalar, ChemicalVector, ThermoScalar};
use rk_thermo::{AggregateState, AqueousMixture};
use std::f64::consts::LN_10;

/// Names accepted for the hydron.
pub const HYDRON_NAMES: [&str; 3] = ["H+", "H+(aq)", "H[+]"];
/// Name of the electron in half reactions.
pub const ELECTRON: &str = "e-";

/// Ions counted by the conservative-ion alkalinity.
const CONSERVATIVE_IONS: [&str; 12] = [
    "Na+", "K+", "Li+", "Ca++", "Mg++", "Sr++", "Ba++", "Cl-", "Br-", "F-", "NO3-", "SO4--",
];

/// View over the aqueous phase of a [`ChemicalProperties`] snapshot.
///
/// Results have one row per aqueous species and are differentiated with
/// respect to all species of the system.
#[derive(Debug)]
pub struct AqueousProperties<'a> {
    props: &'a ChemicalProperties,
    iphase: usize,
    offset: usize,
    mixture: AqueousMixture,
}

impl<'a> AqueousProperties<'a> {
    pub fn new(props: &'a ChemicalProperties) -> SystemResult<Self> {
        let system = props.system();
        let iphase = system.index_phase_with_state(AggregateState::Aqueous);
        if iphase >= system.num_phases() {
            return Err(SystemError::not_found("phase", "Aqueous"));
        }
        let mixture = AqueousMixture::new(system.phase(iphase).species())?;
        Ok(Self {
            props,
            iphase,
            offset: system.index_first_species_in_phase(iphase),
            mixture,
        })
    }

    pub fn index_phase(&self) -> usize {
        self.iphase
    }

    fn embed(&self, local: &ChemicalVector) -> ChemicalVector {
        let mut out = ChemicalVector::zeros(local.len(), self.props.system().num_species());
        out.set_block(0, self.offset, local);
        out
    }

    fn local_amounts(&self) -> DVector<f64> {
        self.props
            .composition()
            .rows(self.offset, self.mixture.num_species())
            .into_owned()
    }

    /// mol/kg of water
    pub fn molalities(&self) -> SystemResult<ChemicalVector> {
        let m = self.mixture.molalities(&self.local_amounts())?;
        Ok(self.embed(&m))
    }

    /// Molalities of the charged species with complexes dissociated.
    pub fn stoichiometric_molalities(&self) -> SystemResult<ChemicalVector> {
        let m = self.mixture.molalities(&self.local_amounts())?;
        Ok(self.embed(&self.mixture.stoichiometric_molalities(&m)))
    }

    pub fn ionic_strength(&self) -> SystemResult<ChemicalScalar> {
        let m = self.mixture.molalities(&self.local_amounts())?;
        Ok(self.embed_scalar(&self.mixture.effective_ionic_strength(&m)))
    }

    pub fn stoichiometric_ionic_strength(&self) -> SystemResult<ChemicalScalar> {
        let m = self.mixture.molalities(&self.local_amounts())?;
        let ms = self.mixture.stoichiometric_molalities(&m);
        Ok(self.embed_scalar(&self.mixture.stoichiometric_ionic_strength(&ms)))
    }

    fn embed_scalar(&self, s: &ChemicalScalar) -> ChemicalScalar {
        let mut ddn = DVector::zeros(self.props.system().num_species());
        ddn.rows_mut(self.offset, s.ddn.len()).copy_from(&s.ddn);
        ChemicalScalar::new(s.val, s.ddt, s.ddp, ddn)
    }

    /// `pH = −log₁₀ a(H⁺)`
    pub fn ph(&self) -> SystemResult<ChemicalScalar> {
        let i = self.props.system().index_species_any_with_error(&HYDRON_NAMES)?;
        Ok(&self.props.ln_activities().row(i) * (-1.0 / LN_10))
    }

    /// pe from the O2(aq)/H2O couple, or from H2(aq)/H⁺ when O2(aq) is absent.
    pub fn pe(&self) -> SystemResult<ChemicalScalar> {
        let system = self.props.system();
        let hydron = system.species_at(system.index_species_any_with_error(&HYDRON_NAMES)?).name();
        let water = self
            .mixture
            .species_names()
            .get(self.mixture.index_water())
            .cloned()
            .unwrap_or_default();
        let equation = if system.index_species("O2(aq)") < system.num_species() {
            format!("0.5*{water} = 0.25*O2(aq) + {hydron} + {ELECTRON}")
        } else if system.index_species("H2(aq)") < system.num_species() {
            format!("0.5*H2(aq) = {hydron} + {ELECTRON}")
        } else {
            return Err(SystemError::not_found("species", "O2(aq) | H2(aq)"));
        };
        self.pe_with_reaction(&equation)
    }

    /// pe from a half reaction containing `e-`, e.g. `"Fe++ = Fe+++ + e-"`.
    pub fn pe_with_reaction(&self, equation: &str) -> SystemResult<ChemicalScalar> {
        let equation: ReactionEquation = equation.parse()?;
        let nu_e = equation.coefficient(ELECTRON);
        if nu_e == 0.0 {
            return Err(SystemError::InvalidArg {
                what: format!("half reaction '{equation}' has no {ELECTRON}"),
            });
        }
        let system = self.props.system();
        let mu = self.props.chemical_potentials();
        let mut sum = ChemicalScalar::zero(system.num_species());
        for (name, nu) in equation.iter() {
            if name == ELECTRON {
                continue;
            }
            let i = system.index_species_with_error(name)?;
            sum += &(&mu.row(i) * nu);
        }
        let rt = ThermoScalar::temperature(self.props.temperature()) * GAS_CONSTANT;
        // ln a(e⁻) = −Σ νᵢμᵢ/(RT·ν_e)
        Ok(&sum / (rt * (nu_e * LN_10)))
    }

    /// Reduction potential (V).
    pub fn eh(&self) -> SystemResult<ChemicalScalar> {
        Ok(self.pe_to_eh(&self.pe()?))
    }

    pub fn eh_with_reaction(&self, equation: &str) -> SystemResult<ChemicalScalar> {
        Ok(self.pe_to_eh(&self.pe_with_reaction(equation)?))
    }

    fn pe_to_eh(&self, pe: &ChemicalScalar) -> ChemicalScalar {
        let rt = ThermoScalar::temperature(self.props.temperature()) * GAS_CONSTANT;
        pe * (rt * (LN_10 / FARADAY))
    }

    /// Conservative-ion alkalinity `Σ zᵢmᵢ` (eq/kg of water).
    pub fn alkalinity(&self) -> SystemResult<ChemicalScalar> {
        let m = self.molalities()?;
        let names = self.mixture.species_names();
        let charges = self.mixture.charges();
        let mut alk = ChemicalScalar::zero(self.props.system().num_species());
        for (i, name) in names.iter().enumerate() {
            if CONSERVATIVE_IONS.contains(&name.as_str()) {
                alk += &(&m.row(i) * charges[i]);
            }
        }
        Ok(alk)
    }
}
