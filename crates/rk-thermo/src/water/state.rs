//! Memoized water properties shared by the aqueous models.

use crate::dual::{TpDual, seed, thermo_scalar};
use crate::error::ThermoResult;
use crate::water::{electro, eos};
use num_dual::DualNum;
use rk_core::{MemoizationCache, ThermoScalar, TpKey};

/// Water properties at one (T, P), held as duals so that derived quantities
/// keep all higher T/P derivatives.
#[derive(Debug, Clone, Copy)]
pub struct WaterState {
    pub temperature: f64,
    pub pressure: f64,
    /// kg/m³
    pub density: TpDual,
    /// J/kg
    pub specific_gibbs_energy: TpDual,
    pub dielectric_constant: TpDual,
    pub born_z: TpDual,
}

impl WaterState {
    pub fn compute(t: f64, p: f64) -> ThermoResult<Self> {
        eos::check_domain(t, p)?;
        let (td, pd) = seed(t, p);
        let density = eos::density(td, pd);
        let dielectric_constant = electro::dielectric_constant(td, density);
        Ok(Self {
            temperature: t,
            pressure: p,
            density,
            specific_gibbs_energy: eos::specific_gibbs_energy(td, pd),
            dielectric_constant,
            born_z: electro::born_z(dielectric_constant),
        })
    }

    pub fn density(&self) -> ThermoScalar {
        thermo_scalar(&self.density)
    }

    pub fn dielectric(&self) -> ThermoScalar {
        thermo_scalar(&self.dielectric_constant)
    }

    pub fn z(&self) -> ThermoScalar {
        thermo_scalar(&self.born_z)
    }

    /// Y = ∂Z/∂T
    pub fn y(&self) -> ThermoScalar {
        let z = &self.born_z;
        ThermoScalar::new(z.v1.re, z.v2.re, z.v1.v1)
    }

    /// Q = ∂Z/∂P
    pub fn q(&self) -> ThermoScalar {
        let z = &self.born_z;
        ThermoScalar::new(z.re.v1, z.v1.v1, z.re.v2)
    }

    /// X = ∂Y/∂T
    pub fn x(&self) -> ThermoScalar {
        let z = &self.born_z;
        ThermoScalar::new(z.v2.re, z.v3.re, z.v2.v1)
    }

    /// U = ∂Q/∂T
    pub fn u(&self) -> ThermoScalar {
        let z = &self.born_z;
        ThermoScalar::new(z.v1.v1, z.v2.v1, z.v1.v2)
    }

    /// N = ∂Q/∂P
    pub fn n(&self) -> ThermoScalar {
        let z = &self.born_z;
        ThermoScalar::new(z.re.v2, z.v1.v2, z.re.v3)
    }

    /// Debye–Hückel A parameter, (kg/mol)^½.
    pub fn debye_huckel_a(&self) -> ThermoScalar {
        let rho = self.density * 1e-3;
        let (td, _) = seed(self.temperature, self.pressure);
        let et = self.dielectric_constant * td;
        thermo_scalar(&(rho.sqrt() * et.powf(-1.5) * 1.824928e6))
    }

    /// Debye–Hückel B parameter, (kg/mol)^½/Å.
    pub fn debye_huckel_b(&self) -> ThermoScalar {
        let rho = self.density * 1e-3;
        let (td, _) = seed(self.temperature, self.pressure);
        let et = self.dielectric_constant * td;
        thermo_scalar(&(rho.sqrt() * et.powf(-0.5) * 50.29158))
    }
}

/// Water state evaluator with its own (T, P) cache.
#[derive(Debug, Clone, Default)]
pub struct WaterEvaluator {
    cache: MemoizationCache<TpKey, WaterState>,
}

impl WaterEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, t: f64, p: f64) -> ThermoResult<WaterState> {
        self.cache
            .get_or_try_insert_with(TpKey::new(t, p), || WaterState::compute(t, p))
    }
}
