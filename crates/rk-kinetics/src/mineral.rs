//! Kinetic mineral reactions built from one or more rate mechanisms.

use crate::error::{KineticsError, KineticsResult};
use crate::mechanism::{CatalystProperty, MineralMechanism};
use rk_core::constants::REFERENCE_PRESSURE;
use rk_core::units::convert;
use rk_core::{ChemicalScalar, CoreError, Quantity, ThermoScalar, ensure_non_negative};
use rk_system::{
    ChemicalProperties, ChemicalSystem, EquilibriumConstantFn, Reaction, ReactionEquation, SystemResult,
};
use std::fmt;
use std::sync::Arc;

/// Surface area of a mineral per unit of its amount.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SurfaceArea {
    /// m²/kg of mineral
    Specific(f64),
    /// m²/m³ of mineral
    Volumetric(f64),
}

impl Default for SurfaceArea {
    fn default() -> Self {
        SurfaceArea::Specific(0.0)
    }
}

/// Dissolution/precipitation of a mineral with rate
/// `r = A·Σ sgn(1 − Ω)·k(T)·|1 − Ω^p|^q·Π catalysts`, positive when the
/// mineral dissolves.
#[derive(Clone, Default)]
pub struct MineralReaction {
    mineral: String,
    equation: Option<ReactionEquation>,
    ln_k: Option<EquilibriumConstantFn>,
    surface_area: SurfaceArea,
    mechanisms: Vec<MineralMechanism>,
}

impl fmt::Debug for MineralReaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MineralReaction")
            .field("mineral", &self.mineral)
            .field("equation", &self.equation.as_ref().map(ToString::to_string))
            .field("has_ln_k", &self.ln_k.is_some())
            .field("surface_area", &self.surface_area)
            .field("mechanisms", &self.mechanisms)
            .finish()
    }
}

impl MineralReaction {
    pub fn new(mineral: impl Into<String>) -> Self {
        Self {
            mineral: mineral.into(),
            ..Default::default()
        }
    }

    pub fn set_mineral(&mut self, mineral: impl Into<String>) -> &mut Self {
        self.mineral = mineral.into();
        self
    }

    /// Set the equation from text such as `"Calcite = Ca++ + CO3--"`.
    pub fn set_equation(&mut self, equation: &str) -> KineticsResult<&mut Self> {
        self.equation = Some(equation.parse()?);
        Ok(self)
    }

    /// Override ln K, otherwise computed from the standard Gibbs energies.
    pub fn set_equilibrium_constant(&mut self, ln_k: EquilibriumConstantFn) -> &mut Self {
        self.ln_k = Some(ln_k);
        self
    }

    /// Surface area per mass (`"m2/g"`, `"cm2/g"`, ...) or per volume of
    /// mineral (`"m2/m3"`, `"cm2/cm3"`, ...).
    pub fn set_specific_surface_area(&mut self, value: f64, units: &str) -> KineticsResult<&mut Self> {
        let value = ensure_non_negative(value, "surface area")?;
        self.surface_area = match convert(value, units, Quantity::SpecificArea) {
            Ok(v) => SurfaceArea::Specific(v),
            Err(CoreError::UnknownUnit { .. }) => SurfaceArea::Volumetric(area_per_volume(value, units)?),
            Err(e) => return Err(e.into()),
        };
        Ok(self)
    }

    pub fn set_volumetric_surface_area(&mut self, value: f64, units: &str) -> KineticsResult<&mut Self> {
        let value = ensure_non_negative(value, "surface area")?;
        self.surface_area = SurfaceArea::Volumetric(area_per_volume(value, units)?);
        Ok(self)
    }

    /// Add a mechanism from text, e.g. `"logk = -5.81 mol/(m2*s); Ea = 23.5 kJ/mol"`.
    pub fn add_mechanism(&mut self, mechanism: &str) -> KineticsResult<&mut Self> {
        self.mechanisms.push(mechanism.parse()?);
        Ok(self)
    }

    pub fn push_mechanism(&mut self, mechanism: MineralMechanism) -> &mut Self {
        self.mechanisms.push(mechanism);
        self
    }

    pub fn set_mechanisms(&mut self, mechanisms: Vec<MineralMechanism>) -> &mut Self {
        self.mechanisms = mechanisms;
        self
    }

    pub fn mineral(&self) -> &str {
        &self.mineral
    }

    pub fn equation(&self) -> Option<&ReactionEquation> {
        self.equation.as_ref()
    }

    pub fn surface_area(&self) -> SurfaceArea {
        self.surface_area
    }

    pub fn mechanisms(&self) -> &[MineralMechanism] {
        &self.mechanisms
    }

    /// Bind the reaction to `system`, attaching the rate law.
    pub fn create_reaction(&self, system: &ChemicalSystem) -> KineticsResult<Reaction> {
        let imineral = system.index_species_with_error(&self.mineral)?;
        let equation = self.equation.clone().ok_or_else(|| KineticsError::InvalidArg {
            what: format!("mineral reaction of {} has no equation", self.mineral),
        })?;
        if equation.coefficient(&self.mineral) == 0.0 {
            return Err(KineticsError::InvalidArg {
                what: format!("equation '{equation}' does not involve {}", self.mineral),
            });
        }
        let mut reaction = Reaction::new(system, equation)?.with_name(self.mineral.clone());
        if let Some(ln_k) = &self.ln_k {
            reaction = reaction.with_equilibrium_constant(Arc::clone(ln_k));
        }

        let mut mechanisms = Vec::with_capacity(self.mechanisms.len());
        for m in &self.mechanisms {
            let mut catalysts = Vec::with_capacity(m.catalysts.len());
            for c in &m.catalysts {
                let i = match c.property {
                    CatalystProperty::Activity => system.index_species_with_error(&c.species)?,
                    CatalystProperty::PartialPressure => {
                        let gas = format!("{}(g)", c.species);
                        system.index_species_any_with_error(&[c.species.as_str(), gas.as_str()])?
                    }
                };
                catalysts.push((i, c.property, c.power));
            }
            mechanisms.push(BoundMechanism {
                mechanism: m.clone(),
                catalysts,
            });
        }

        let law = RateLaw {
            reaction: reaction.clone(),
            imineral,
            molar_mass: system.species_at(imineral).molar_mass(),
            surface_area: self.surface_area,
            mechanisms,
        };
        Ok(reaction.with_rate(Arc::new(move |props: &ChemicalProperties| law.rate(props))))
    }
}

/// `"m2/m3"` style units, split into area and volume.
fn area_per_volume(value: f64, units: &str) -> KineticsResult<f64> {
    let (area, volume) = units.split_once('/').ok_or_else(|| CoreError::UnknownUnit {
        unit: units.to_string(),
        quantity: "surface area".to_string(),
    })?;
    Ok(convert(value, area, Quantity::Area)? / convert(1.0, volume, Quantity::Volume)?)
}

struct BoundMechanism {
    mechanism: MineralMechanism,
    /// (species index, property, power)
    catalysts: Vec<(usize, CatalystProperty, f64)>,
}

struct RateLaw {
    reaction: Reaction,
    imineral: usize,
    molar_mass: f64,
    surface_area: SurfaceArea,
    mechanisms: Vec<BoundMechanism>,
}

impl RateLaw {
    fn rate(&self, props: &ChemicalProperties) -> SystemResult<ChemicalScalar> {
        let n = props.composition();
        let ns = n.len();
        let nmineral = n[self.imineral];
        if !(nmineral > 0.0) || self.mechanisms.is_empty() {
            return Ok(ChemicalScalar::zero(ns));
        }
        // m² of mineral surface
        let molar_area = match self.surface_area {
            SurfaceArea::Specific(ssa) => ThermoScalar::constant(ssa * self.molar_mass),
            SurfaceArea::Volumetric(vsa) => props.standard_partial_molar_volumes().row(self.imineral) * vsa,
        };
        if molar_area.val == 0.0 {
            return Ok(ChemicalScalar::zero(ns));
        }
        let area = molar_area * &ChemicalScalar::amount(ns, self.imineral, nmineral);

        let omega = self.reaction.ln_saturation_index(props).exp();
        let (t, p) = (props.temperature(), props.pressure());
        let ln_activities = props.ln_activities();
        let fractions = props.molar_fractions();
        let ln_pbar = ThermoScalar::new((p / REFERENCE_PRESSURE).ln(), 0.0, 1.0 / p);

        let mut f = ChemicalScalar::zero(ns);
        for bound in &self.mechanisms {
            let m = &bound.mechanism;
            let affinity = 1.0 - &omega.powf(m.p);
            if affinity.val == 0.0 {
                continue;
            }
            let sign = affinity.val.signum();
            let mut term = m.rate_constant(t) * &affinity.abs().powf(m.q);
            for &(i, property, power) in &bound.catalysts {
                let ln_value = match property {
                    CatalystProperty::Activity => ln_activities.row(i),
                    CatalystProperty::PartialPressure => &fractions.row(i).ln() + ln_pbar,
                };
                term = &term * &(&ln_value * power).exp();
            }
            f += &(&term * sign);
        }
        Ok(&f * &area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DVector;
    use rk_system::SystemBuilder;
    use rk_thermo::AqueousActivityModel;

    fn system() -> Arc<ChemicalSystem> {
        Arc::new(
            SystemBuilder::new()
                .add_aqueous_phase_named(
                    &["H2O(l)", "H+", "OH-", "Ca++", "CO3--", "HCO3-", "CO2(aq)"],
                    AqueousActivityModel::DebyeHuckel(Default::default()),
                )
                .unwrap()
                .add_mineral_phases_named(&["Calcite"])
                .unwrap()
                .build()
                .unwrap(),
        )
    }

    fn calcite() -> MineralReaction {
        let mut r = MineralReaction::new("Calcite");
        r.set_equation("Calcite = Ca++ + CO3--")
            .unwrap()
            .add_mechanism("logk = -5.81 mol/(m2*s); Ea = 23.5 kJ/mol")
            .unwrap()
            .add_mechanism("logk = -0.30 mol/(m2*s); Ea = 14.4 kJ/mol; a[H+] = 1.0")
            .unwrap()
            .set_specific_surface_area(10.0, "cm2/g")
            .unwrap();
        r
    }

    /// 1 kg of water with 1 mol of calcite and a trace of dissolved ions.
    fn props(system: &Arc<ChemicalSystem>, calcite: f64) -> ChemicalProperties {
        let mut n = DVector::from_element(system.num_species(), 1e-7);
        n[system.index_species("H2O(l)")] = 55.5;
        n[system.index_species("Calcite")] = calcite;
        ChemicalProperties::compute(Arc::clone(system), 298.15, 1e5, &n).unwrap()
    }

    #[test]
    fn surface_area_units() {
        let mut r = MineralReaction::new("Calcite");
        r.set_specific_surface_area(10.0, "cm2/g").unwrap();
        assert_eq!(r.surface_area(), SurfaceArea::Specific(1.0));
        r.set_specific_surface_area(2.0, "cm2/cm3").unwrap();
        match r.surface_area() {
            SurfaceArea::Volumetric(v) => assert_relative_eq!(v, 200.0, max_relative = 1e-12),
            other => panic!("unexpected {other:?}"),
        }
        assert!(r.set_specific_surface_area(1.0, "acres").is_err());
        assert!(r.set_specific_surface_area(-1.0, "m2/g").is_err());
    }

    #[test]
    fn undersaturated_calcite_dissolves() {
        let system = system();
        let reaction = calcite().create_reaction(&system).unwrap();
        let props = props(&system, 1.0);
        assert!(reaction.ln_saturation_index(&props).val < 0.0);
        let rate = reaction.rate(&props).unwrap();
        assert!(rate.val > 0.0);
        // more calcite, more surface
        let doubled = reaction.rate(&self::props(&system, 2.0)).unwrap();
        assert_relative_eq!(doubled.val, 2.0 * rate.val, max_relative = 1e-6);
        assert!(rate.ddn[system.index_species("Calcite")] > 0.0);
    }

    #[test]
    fn rate_derivatives_match_finite_differences() {
        let system = system();
        let reaction = calcite().create_reaction(&system).unwrap();
        let base = props(&system, 1.0);
        let rate = reaction.rate(&base).unwrap();
        let i = system.index_species("Ca++");
        let h = 1e-11;
        let shifted = |dx: f64| {
            let mut n = base.composition().clone();
            n[i] += dx;
            let p = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n).unwrap();
            reaction.rate(&p).unwrap().val
        };
        let fd = (shifted(h) - shifted(-h)) / (2.0 * h);
        assert_relative_eq!(rate.ddn[i], fd, max_relative = 1e-3);
    }

    #[test]
    fn absent_spectators_keep_the_rate_finite() {
        let system = system();
        let reaction = calcite().create_reaction(&system).unwrap();
        let mut n = props(&system, 1.0).composition().clone();
        n[system.index_species("CO2(aq)")] = 0.0;
        n[system.index_species("HCO3-")] = 0.0;
        let p = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n).unwrap();
        let rate = reaction.rate(&p).unwrap();
        assert!(rate.val.is_finite() && rate.val > 0.0, "rate = {}", rate.val);
    }

    #[test]
    fn no_surface_means_no_rate() {
        let system = system();
        let mut r = calcite();
        r.set_specific_surface_area(0.0, "m2/g").unwrap();
        let reaction = r.create_reaction(&system).unwrap();
        let rate = reaction.rate(&props(&system, 1.0)).unwrap();
        assert_eq!(rate.val, 0.0);
        assert!(rate.ddn.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn missing_equation_or_mineral_is_an_error() {
        let system = system();
        assert!(MineralReaction::new("Calcite").create_reaction(&system).is_err());
        let mut r = calcite();
        r.set_mineral("Quartz");
        assert!(r.create_reaction(&system).is_err());
    }
}
