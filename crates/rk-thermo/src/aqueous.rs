//! Aqueous mixtures and their activity models.

use crate::error::{ThermoError, ThermoResult};
use crate::mixture::{PhaseChemicalModel, PhaseChemicalModelResult, mole_fractions};
use crate::species::Species;
use crate::water::WaterEvaluator;
use nalgebra::{DMatrix, DVector};
use rk_core::constants::WATER_MOLAR_MASS;
use rk_core::{ChemicalScalar, ChemicalVector, ThermoScalar};
use std::collections::BTreeMap;
use std::f64::consts::LN_10;

/// Composition bookkeeping of an aqueous solution.
#[derive(Debug, Clone, PartialEq)]
pub struct AqueousMixture {
    names: Vec<String>,
    charges: DVector<f64>,
    water: usize,
    charged: Vec<usize>,
    neutral: Vec<usize>,
    complexes: Vec<usize>,
    /// complexes × charged species
    dissociation: DMatrix<f64>,
}

impl AqueousMixture {
    pub fn new(species: &[Species]) -> ThermoResult<Self> {
        let water = species
            .iter()
            .position(|s| s.is_water())
            .ok_or_else(|| ThermoError::InvalidArg {
                what: "aqueous phase requires the water species".into(),
            })?;
        let names: Vec<String> = species.iter().map(|s| s.name().to_string()).collect();
        let charges = DVector::from_iterator(species.len(), species.iter().map(|s| s.charge()));
        let charged: Vec<usize> = (0..species.len()).filter(|&i| charges[i] != 0.0).collect();
        let neutral: Vec<usize> = (0..species.len())
            .filter(|&i| charges[i] == 0.0 && i != water)
            .collect();
        let complexes: Vec<usize> = (0..species.len())
            .filter(|&i| !species[i].dissociation().is_empty())
            .collect();
        let mut dissociation = DMatrix::zeros(complexes.len(), charged.len());
        for (r, &ic) in complexes.iter().enumerate() {
            for (ion, coeff) in species[ic].dissociation() {
                let col = charged
                    .iter()
                    .position(|&j| names[j] == *ion)
                    .ok_or_else(|| ThermoError::InvalidArg {
                        what: format!("dissociation product {ion} of {} is not in the phase", names[ic]),
                    })?;
                dissociation[(r, col)] = *coeff;
            }
        }
        Ok(Self {
            names,
            charges,
            water,
            charged,
            neutral,
            complexes,
            dissociation,
        })
    }

    pub fn num_species(&self) -> usize {
        self.names.len()
    }

    pub fn species_names(&self) -> &[String] {
        &self.names
    }

    pub fn index_water(&self) -> usize {
        self.water
    }

    pub fn charges(&self) -> &DVector<f64> {
        &self.charges
    }

    pub fn indices_charged(&self) -> &[usize] {
        &self.charged
    }

    /// Non-water neutral species.
    pub fn indices_neutral(&self) -> &[usize] {
        &self.neutral
    }

    pub fn indices_cations(&self) -> Vec<usize> {
        self.charged.iter().copied().filter(|&i| self.charges[i] > 0.0).collect()
    }

    pub fn indices_anions(&self) -> Vec<usize> {
        self.charged.iter().copied().filter(|&i| self.charges[i] < 0.0).collect()
    }

    pub fn indices_complexes(&self) -> &[usize] {
        &self.complexes
    }

    pub fn dissociation_matrix(&self) -> &DMatrix<f64> {
        &self.dissociation
    }

    /// Molalities `mᵢ = nᵢ/(Mw·n_w)` (mol/kg) with amount derivatives.
    pub fn molalities(&self, n: &DVector<f64>) -> ThermoResult<ChemicalVector> {
        let nw = n[self.water];
        if nw <= 0.0 || !nw.is_finite() {
            return Err(ThermoError::OutOfRange {
                what: "amount of water in aqueous phase (mol)",
                value: nw,
            });
        }
        let len = n.len();
        let kgw = WATER_MOLAR_MASS * nw;
        let m = n / kgw;
        let mut ddn = DMatrix::zeros(len, len);
        for i in 0..len {
            ddn[(i, i)] += 1.0 / kgw;
            ddn[(i, self.water)] -= m[i] / nw;
        }
        Ok(ChemicalVector::new(m, DVector::zeros(len), DVector::zeros(len), ddn))
    }

    /// Molalities of the charged species after dissociating all complexes.
    pub fn stoichiometric_molalities(&self, m: &ChemicalVector) -> ChemicalVector {
        let nions = self.charged.len();
        let mut ms = ChemicalVector::zeros(nions, m.num_species());
        for (k, &i) in self.charged.iter().enumerate() {
            let mut row = m.row(i);
            for (r, &c) in self.complexes.iter().enumerate() {
                let nu = self.dissociation[(r, k)];
                if nu != 0.0 {
                    row += &(&m.row(c) * nu);
                }
            }
            ms.set_row(k, &row);
        }
        ms
    }

    /// Effective ionic strength `½ Σ zᵢ² mᵢ`.
    pub fn effective_ionic_strength(&self, m: &ChemicalVector) -> ChemicalScalar {
        m.dot(&self.charges.map(|z| 0.5 * z * z))
    }

    /// Ionic strength of the fully dissociated solution.
    pub fn stoichiometric_ionic_strength(&self, ms: &ChemicalVector) -> ChemicalScalar {
        let w = DVector::from_iterator(
            self.charged.len(),
            self.charged.iter().map(|&i| 0.5 * self.charges[i] * self.charges[i]),
        );
        ms.dot(&w)
    }
}

/// Parameters of the B-dot (extended Debye–Hückel) model.
#[derive(Debug, Clone, PartialEq)]
pub struct DebyeHuckelParams {
    /// Ion size parameter per species name, Å.
    pub ion_sizes: BTreeMap<String, f64>,
    /// Ion size used for species missing from `ion_sizes`, Å.
    pub default_ion_size: f64,
    /// B-dot coefficient of charged species, kg/mol.
    pub bdot: f64,
    /// Setschenow coefficient of neutral species, kg/mol.
    pub neutral_b: f64,
}

impl Default for DebyeHuckelParams {
    fn default() -> Self {
        let ion_sizes = [
            ("H+", 9.0),
            ("Li+", 6.0),
            ("Na+", 4.0),
            ("K+", 3.0),
            ("OH-", 3.5),
            ("Cl-", 3.0),
            ("F-", 3.5),
            ("Br-", 3.0),
            ("HCO3-", 4.0),
            ("HS-", 3.5),
            ("NO3-", 3.0),
            ("Ca++", 6.0),
            ("Mg++", 8.0),
            ("Fe++", 6.0),
            ("Sr++", 5.0),
            ("Ba++", 5.0),
            ("CO3--", 4.5),
            ("SO4--", 4.0),
            ("Al+++", 9.0),
            ("Fe+++", 9.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            ion_sizes,
            default_ion_size: 4.0,
            bdot: 0.041,
            neutral_b: 0.1,
        }
    }
}

impl DebyeHuckelParams {
    pub fn ion_size(&self, name: &str) -> f64 {
        self.ion_sizes.get(name).copied().unwrap_or(self.default_ion_size)
    }
}

/// Activity model of the aqueous phase.
#[derive(Debug, Clone, PartialEq)]
pub enum AqueousActivityModel {
    /// Unit activity coefficients on the molality scale.
    Ideal,
    DebyeHuckel(DebyeHuckelParams),
}

/// Chemical model of an aqueous phase.
#[derive(Debug, Clone)]
pub struct AqueousChemicalModel {
    mixture: AqueousMixture,
    model: AqueousActivityModel,
    water: WaterEvaluator,
}

impl AqueousChemicalModel {
    pub fn new(species: &[Species], model: AqueousActivityModel) -> ThermoResult<Self> {
        Ok(Self {
            mixture: AqueousMixture::new(species)?,
            model,
            water: WaterEvaluator::new(),
        })
    }

    pub fn mixture(&self) -> &AqueousMixture {
        &self.mixture
    }
}

/// σ(x) = 3/x³·[1 + x − 1/(1 + x) − 2·ln(1 + x)], with a series near zero.
fn sigma(x: &ChemicalScalar) -> ChemicalScalar {
    if x.val < 0.1 {
        let mut s = ChemicalScalar::zero(x.num_species());
        let mut xp = ChemicalScalar::constant(x.num_species(), 1.0);
        for k in 3..=20 {
            let kf = k as f64;
            let sign = if k % 2 == 0 { -1.0 } else { 1.0 };
            s += &(&xp * (3.0 * sign * (kf - 2.0) / kf));
            xp = &xp * x;
        }
        return s;
    }
    let lambda = x + 1.0;
    let bracket = &lambda - &(1.0 / &lambda) - &(&lambda.ln() * 2.0);
    &(&bracket * 3.0) / &x.powi(3)
}

impl AqueousChemicalModel {
    fn debye_huckel(
        &self,
        params: &DebyeHuckelParams,
        a: ThermoScalar,
        b: ThermoScalar,
        m: &ChemicalVector,
        n: &DVector<f64>,
    ) -> PhaseChemicalModelResult {
        let mix = &self.mixture;
        let ns = mix.num_species();
        let iw = mix.index_water();
        let ionic = mix.effective_ionic_strength(m);
        let sqrt_i = if ionic.val > 0.0 {
            ionic.sqrt()
        } else {
            ChemicalScalar::zero(ns)
        };

        let mut ln_g = ChemicalVector::zeros(ns, ns);
        let mut sum_m = ChemicalScalar::zero(ns);
        let mut osmotic = ChemicalScalar::zero(ns);

        for &i in mix.indices_charged() {
            let z2 = mix.charges()[i] * mix.charges()[i];
            let ai = params.ion_size(&mix.species_names()[i]);
            let mi = m.row(i);
            let bas = &sqrt_i * (b * ai);
            let denom = &bas + 1.0;
            let log_g = &(&(&sqrt_i * (a * -z2)) / &denom) + &(&ionic * params.bdot);
            ln_g.set_row(i, &(&log_g * LN_10));

            let term = &(&(&(&sqrt_i * a) * z2) * &sigma(&bas)) * (1.0 / 3.0)
                - &(&ionic * (0.5 * params.bdot));
            osmotic += &(&mi * &term);
            sum_m += &mi;
        }
        for &i in mix.indices_neutral() {
            let mi = m.row(i);
            ln_g.set_row(i, &(&ionic * (LN_10 * params.neutral_b)));
            osmotic -= &(&(&mi * &ionic) * (0.5 * params.neutral_b));
            sum_m += &mi;
        }

        // Water activity from the Gibbs–Duhem relation.
        let ln_aw = &(&sum_m * -WATER_MOLAR_MASS) + &(&osmotic * (LN_10 * WATER_MOLAR_MASS));
        let x = mole_fractions(n);
        let ln_xw = x.row(iw).ln();
        ln_g.set_row(iw, &(&ln_aw - &ln_xw));

        let mut ln_a = &ln_g + &m.ln();
        ln_a.set_row(iw, &ln_aw);
        PhaseChemicalModelResult {
            ln_activity_coefficients: ln_g,
            ..PhaseChemicalModelResult::ideal(ln_a)
        }
    }
}

impl PhaseChemicalModel for AqueousChemicalModel {
    fn evaluate(&self, t: f64, p: f64, n: &DVector<f64>) -> ThermoResult<PhaseChemicalModelResult> {
        let m = self.mixture.molalities(n)?;
        let iw = self.mixture.index_water();
        match &self.model {
            AqueousActivityModel::Ideal => {
                let mut ln_a = m.ln();
                ln_a.set_row(iw, &mole_fractions(n).row(iw).ln());
                Ok(PhaseChemicalModelResult::ideal(ln_a))
            }
            AqueousActivityModel::DebyeHuckel(params) => {
                let w = self.water.state(t, p)?;
                Ok(self.debye_huckel(params, w.debye_huckel_a(), w.debye_huckel_b(), &m, n))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use approx::assert_relative_eq;

    fn species(names: &[&str]) -> Vec<Species> {
        names.iter().map(|n| catalog::species(n).unwrap()).collect()
    }

    fn brine() -> (Vec<Species>, DVector<f64>) {
        let s = species(&["H2O(l)", "H+", "OH-", "Na+", "Cl-", "NaCl(aq)", "CO2(aq)"]);
        let n = DVector::from_vec(vec![55.508, 1e-7, 1e-7, 0.5, 0.5, 0.01, 0.02]);
        (s, n)
    }

    #[test]
    fn molalities_and_ionic_strength() {
        let (s, n) = brine();
        let mix = AqueousMixture::new(&s).unwrap();
        let m = mix.molalities(&n).unwrap();
        assert_relative_eq!(m.val[3], 0.5 / (55.508 * WATER_MOLAR_MASS), max_relative = 1e-12);
        let i = mix.effective_ionic_strength(&m);
        assert_relative_eq!(i.val, 0.5 * (m.val[1] + m.val[2] + m.val[3] + m.val[4]), max_relative = 1e-12);

        let ms = mix.stoichiometric_molalities(&m);
        let na = mix.indices_charged().iter().position(|&k| k == 3).unwrap();
        assert_relative_eq!(ms.val[na], m.val[3] + m.val[5], max_relative = 1e-12);
        assert!(mix.stoichiometric_ionic_strength(&ms).val > i.val);
    }

    #[test]
    fn missing_water_is_rejected() {
        assert!(AqueousMixture::new(&species(&["Na+", "Cl-"])).is_err());
    }

    #[test]
    fn debye_huckel_lowers_ion_activity() {
        let (s, n) = brine();
        let model = AqueousChemicalModel::new(&s, AqueousActivityModel::DebyeHuckel(Default::default())).unwrap();
        let res = model.evaluate(298.15, 1e5, &n).unwrap();
        // mean activity coefficient of NaCl near 0.5 molal is about 0.7
        let ln_gpm = 0.5 * (res.ln_activity_coefficients.val[3] + res.ln_activity_coefficients.val[4]);
        assert!(ln_gpm.exp() > 0.55 && ln_gpm.exp() < 0.8);
        // salt lowers the water activity
        assert!(res.ln_activities.val[0] < 0.0);
        assert!(res.ln_activities.val[0] > -0.05);
        // neutral species are salted out
        assert!(res.ln_activity_coefficients.val[6] > 0.0);
    }

    #[test]
    fn debye_huckel_amount_derivatives_match_finite_differences() {
        let (s, n) = brine();
        let model = AqueousChemicalModel::new(&s, AqueousActivityModel::DebyeHuckel(Default::default())).unwrap();
        let res = model.evaluate(298.15, 1e5, &n).unwrap();
        for i in [0, 3, 6] {
            // trace amounts are too small for a well-conditioned difference
            for j in (0..n.len()).filter(|&j| n[j] >= 1e-3) {
                let h = 1e-6 * n[j];
                let at = |x: f64| {
                    let mut np = n.clone();
                    np[j] = x;
                    model.evaluate(298.15, 1e5, &np).unwrap().ln_activities.val[i]
                };
                let fd = (at(n[j] + h) - at(n[j] - h)) / (2.0 * h);
                let analytic = res.ln_activities.ddn[(i, j)];
                assert!(
                    (analytic - fd).abs() <= 1e-4 * analytic.abs().max(1e-2),
                    "d ln a[{i}]/dn[{j}]: {analytic} vs {fd}"
                );
            }
        }
    }

    #[test]
    fn sigma_series_matches_closed_form_at_switch() {
        let below = sigma(&ChemicalScalar::constant(1, 0.0999999));
        let above = sigma(&ChemicalScalar::constant(1, 0.1000001));
        assert_relative_eq!(below.val, above.val, max_relative = 1e-5);
    }

    #[test]
    fn ideal_water_activity_is_mole_fraction() {
        let (s, n) = brine();
        let model = AqueousChemicalModel::new(&s, AqueousActivityModel::Ideal).unwrap();
        let res = model.evaluate(298.15, 1e5, &n).unwrap();
        let xw = n[0] / n.sum();
        assert_relative_eq!(res.ln_activities.val[0], xw.ln(), max_relative = 1e-12);
    }
}
