//! A small built-in set of species with SUPCRT-style parameters.
//!
//! Enough to assemble common carbonate/brine systems without a database.

use crate::error::{ThermoError, ThermoResult};
use crate::species::{
    AggregateState, AqueousHkfParams, CriticalProperties, GasHkfParams, MaierKelley,
    MineralHkfParams, PhaseTransition, Species, SpeciesThermoParams,
};
use std::collections::BTreeMap;

const AQUEOUS_TMAX: f64 = 1000.0;

/// Names of all species available in the catalog.
pub const NAMES: [&str; 22] = [
    "H2O(l)", "H+", "OH-", "Ca++", "CO3--", "HCO3-", "CO2(aq)", "Na+", "Cl-", "NaCl(aq)",
    "O2(aq)", "H2(aq)", "CO2(g)", "H2O(g)", "O2(g)", "H2(g)", "CH4(g)", "N2(g)", "Calcite",
    "Quartz", "Halite", "Aragonite",
];

/// Raw tabulated values: Gf, Hf, Sr, a1 (×10), a2 (×10⁻²), a3, a4 (×10⁻⁴),
/// c1, c2 (×10⁻⁴), ω (×10⁻⁵).
fn aqueous(name: &str, formula: &str, v: [f64; 10]) -> ThermoResult<Species> {
    let params = AqueousHkfParams {
        gf: v[0],
        hf: v[1],
        sr: v[2],
        a1: v[3] * 1e-1,
        a2: v[4] * 1e2,
        a3: v[5],
        a4: v[6] * 1e4,
        c1: v[7],
        c2: v[8] * 1e4,
        wref: v[9] * 1e5,
        tmax: AQUEOUS_TMAX,
    };
    Species::new(
        name,
        formula,
        AggregateState::Aqueous,
        SpeciesThermoParams::AqueousSoluteHkf(params),
    )
}

/// Gf, Hf, Sr, a, b, c (×10⁻⁵), Tmax; critical Tc (K), Pc (bar), ω.
fn gas(name: &str, formula: &str, v: [f64; 7], critical: [f64; 3]) -> ThermoResult<Species> {
    let params = GasHkfParams {
        gf: v[0],
        hf: v[1],
        sr: v[2],
        cp: MaierKelley {
            a: v[3],
            b: v[4],
            c: v[5] * 1e5,
        },
        tmax: v[6],
    };
    Ok(Species::new(name, formula, AggregateState::Gaseous, SpeciesThermoParams::GasHkf(params))?
        .with_critical_properties(CriticalProperties {
            temperature: critical[0],
            pressure: critical[1] * 1e5,
            acentric_factor: critical[2],
        }))
}

fn mineral(
    name: &str,
    formula: &str,
    v: [f64; 4],
    cp: Vec<MaierKelley>,
    transitions: Vec<PhaseTransition>,
    tmax: f64,
) -> ThermoResult<Species> {
    let params = MineralHkfParams {
        gf: v[0],
        hf: v[1],
        sr: v[2],
        vr: v[3],
        cp,
        transitions,
        tmax,
    };
    Species::new(name, formula, AggregateState::Solid, SpeciesThermoParams::MineralHkf(params))
}

fn mk(a: f64, b: f64, c: f64) -> MaierKelley {
    MaierKelley { a, b, c }
}

/// Build a catalog species by name.
pub fn species(name: &str) -> ThermoResult<Species> {
    match name {
        "H2O(l)" => Species::new("H2O(l)", "H2O", AggregateState::Aqueous, SpeciesThermoParams::Water),
        "H+" => aqueous("H+", "H+", [0.0; 10]),
        "OH-" => aqueous(
            "OH-",
            "OH-",
            [-37595.0, -54977.0, -2.56, 1.2527, 0.0738, 1.8423, -2.7821, 4.15, -10.346, 1.7246],
        ),
        "Ca++" => aqueous(
            "Ca++",
            "Ca++",
            [-132120.0, -129800.0, -13.5, -0.1947, -7.2520, 5.2966, -2.4792, 9.0, -2.5220, 1.2366],
        ),
        "CO3--" => aqueous(
            "CO3--",
            "CO3--",
            [-126191.0, -161385.0, -11.95, 2.8524, -3.9844, 6.4142, -2.6143, -3.3206, -17.1917, 3.3914],
        ),
        "HCO3-" => aqueous(
            "HCO3-",
            "HCO3-",
            [-140282.0, -164898.0, 23.53, 7.5621, 1.1505, 1.2346, -2.8266, 12.9395, -4.7579, 1.2733],
        ),
        "CO2(aq)" => aqueous(
            "CO2(aq)",
            "CO2",
            [-92250.0, -98900.0, 27.0, 6.2466, 7.4698, 2.7816, -3.0063, 40.0, 8.8, -0.0200],
        ),
        "Na+" => aqueous(
            "Na+",
            "Na+",
            [-62591.0, -57433.0, 13.96, 1.8390, -2.2850, 3.2560, -2.7260, 18.18, -2.981, 0.3306],
        ),
        "Cl-" => aqueous(
            "Cl-",
            "Cl-",
            [-31379.0, -39933.0, 13.56, 4.0320, 4.8010, 5.5630, -2.8470, -4.40, -5.714, 1.4560],
        ),
        "NaCl(aq)" => Ok(aqueous(
            "NaCl(aq)",
            "NaCl",
            [-92910.0, -96120.0, 28.00, 5.0363, 4.7365, 3.4154, -2.9748, 10.8, -1.3, -0.038],
        )?
        .with_dissociation(BTreeMap::from([("Na+".to_string(), 1.0), ("Cl-".to_string(), 1.0)]))),
        "O2(aq)" => aqueous(
            "O2(aq)",
            "O2",
            [3954.0, -2900.0, 26.04, 5.7889, 6.3536, 3.2528, -3.0417, 35.3530, 9.3805, -0.3943],
        ),
        "H2(aq)" => aqueous(
            "H2(aq)",
            "H2",
            [4236.0, -1000.0, 13.8, 5.1427, 4.7758, 3.8729, -2.9764, 27.6251, 5.0930, -0.2090],
        ),
        "CO2(g)" => gas(
            "CO2(g)",
            "CO2",
            [-94254.0, -94051.0, 51.08, 10.57, 2.10e-3, -2.06, 2500.0],
            [304.2, 73.83, 0.224],
        ),
        "H2O(g)" => gas(
            "H2O(g)",
            "H2O",
            [-54634.0, -57795.0, 45.103, 7.30, 2.46e-3, 0.0, 2000.0],
            [647.1, 220.55, 0.345],
        ),
        "O2(g)" => gas(
            "O2(g)",
            "O2",
            [0.0, 0.0, 49.029, 7.16, 1.0e-3, -0.40, 3000.0],
            [154.6, 50.43, 0.022],
        ),
        "H2(g)" => gas(
            "H2(g)",
            "H2",
            [0.0, 0.0, 31.234, 6.52, 0.78e-3, 0.12, 3000.0],
            [33.19, 13.13, -0.216],
        ),
        "CH4(g)" => gas(
            "CH4(g)",
            "CH4",
            [-12122.0, -17880.0, 44.518, 5.65, 11.44e-3, -0.46, 1500.0],
            [190.6, 45.99, 0.012],
        ),
        "N2(g)" => gas(
            "N2(g)",
            "N2",
            [0.0, 0.0, 45.796, 6.83, 0.90e-3, -0.12, 3000.0],
            [126.2, 34.0, 0.038],
        ),
        "Calcite" => mineral(
            "Calcite",
            "CaCO3",
            [-269880.0, -288552.0, 22.15, 36.934],
            vec![mk(24.98, 5.24e-3, -6.20e5)],
            vec![],
            1200.0,
        ),
        "Aragonite" => mineral(
            "Aragonite",
            "CaCO3",
            [-269875.0, -288723.0, 21.56, 34.15],
            vec![mk(20.13, 10.24e-3, -3.34e5)],
            vec![],
            1200.0,
        ),
        "Quartz" => mineral(
            "Quartz",
            "SiO2",
            [-204646.0, -217650.0, 9.88, 22.688],
            vec![mk(11.22, 8.20e-3, -2.70e5), mk(14.41, 1.94e-3, 0.0)],
            vec![PhaseTransition {
                temperature: 848.0,
                enthalpy: 290.0,
                volume: 0.372,
                dpdt: 38.5,
            }],
            2000.0,
        ),
        "Halite" => mineral(
            "Halite",
            "NaCl",
            [-91806.0, -98260.0, 17.24, 27.015],
            vec![mk(10.98, 3.90e-3, 0.0)],
            vec![],
            1073.0,
        ),
        other => Err(ThermoError::InvalidArg {
            what: format!("species '{other}' is not in the built-in catalog"),
        }),
    }
}

/// All catalog species whose element set is contained in `elements`.
pub fn species_with_elements(elements: &[&str], state: AggregateState) -> ThermoResult<Vec<Species>> {
    let mut out = Vec::new();
    for name in NAMES {
        let s = species(name)?;
        let fits = s.elements().keys().all(|e| elements.contains(&e.as_str()));
        if fits && s.aggregate_state() == state {
            out.push(s);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_builds() {
        for name in NAMES {
            let s = species(name).unwrap();
            assert_eq!(s.name(), name);
        }
        assert!(species("Unobtainium").is_err());
    }

    #[test]
    fn filter_by_elements() {
        let aq = species_with_elements(&["H", "O", "C", "Ca"], AggregateState::Aqueous).unwrap();
        let names: Vec<_> = aq.iter().map(|s| s.name().to_string()).collect();
        assert!(names.contains(&"HCO3-".to_string()));
        assert!(!names.contains(&"Na+".to_string()));
        assert!(names.contains(&"H+".to_string()));
    }
}
