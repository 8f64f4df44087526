use approx::assert_relative_eq;
use nalgebra::DVector;
use rk_system::{ChemicalProperties, ChemicalSystem, Reaction, SystemBuilder};
use rk_thermo::{AqueousActivityModel, GaseousActivityModel};
use std::sync::Arc;

fn system() -> Arc<ChemicalSystem> {
    Arc::new(
        SystemBuilder::new()
            .add_aqueous_phase_named(
                &["H2O(l)", "H+", "OH-", "Na+", "Cl-", "CO2(aq)", "HCO3-", "O2(aq)"],
                AqueousActivityModel::DebyeHuckel(Default::default()),
            )
            .unwrap()
            .add_gaseous_phase_named(&["CO2(g)", "H2O(g)"], GaseousActivityModel::Ideal)
            .unwrap()
            .add_mineral_phases_named(&["Halite"])
            .unwrap()
            .build()
            .unwrap(),
    )
}

fn amounts() -> DVector<f64> {
    DVector::from_vec(vec![55.5, 1e-6, 1e-8, 0.1, 0.1, 1e-3, 1e-6, 1e-5, 0.2, 0.01, 0.5])
}

#[test]
fn update_is_bit_identical() {
    let system = system();
    let n = amounts();
    let mut props = ChemicalProperties::compute(Arc::clone(&system), 310.0, 2e5, &n).unwrap();
    let first = props.chemical_potentials();
    props.update(310.0, 2e5, &n).unwrap();
    assert_eq!(props.chemical_potentials(), first);
    assert_eq!(props.phase_volumes(), ChemicalProperties::compute(system, 310.0, 2e5, &n).unwrap().phase_volumes());
}

#[test]
fn activity_derivatives_match_finite_differences() {
    let system = system();
    let n = amounts();
    let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n).unwrap();
    let ln_a = props.ln_activities();
    for i in [0, 3, 8] {
        for j in (0..n.len()).filter(|&j| n[j] >= 1e-3) {
            let h = 1e-6 * n[j];
            let at = |x: f64| {
                let mut np = n.clone();
                np[j] = x;
                ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &np)
                    .unwrap()
                    .ln_activities()
                    .val[i]
            };
            let fd = (at(n[j] + h) - at(n[j] - h)) / (2.0 * h);
            let analytic = ln_a.ddn[(i, j)];
            assert!(
                (analytic - fd).abs() <= 1e-5 * analytic.abs().max(1e-2),
                "d ln a[{i}]/dn[{j}] = {analytic}, fd = {fd}"
            );
        }
    }
}

#[test]
fn chemical_potential_temperature_derivative() {
    let system = system();
    let n = amounts();
    let mu = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n)
        .unwrap()
        .chemical_potentials();
    let fdt = rk_core::fd::central(
        |x| ChemicalProperties::compute(Arc::clone(&system), x, 1e5, &n).unwrap().chemical_potentials().val[5],
        298.15,
    );
    assert_relative_eq!(mu.ddt[5], fdt, max_relative = 1e-5);
}

#[test]
fn phase_level_properties() {
    let system = system();
    let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &amounts()).unwrap();
    let rho = props.phase_densities();
    // brine close to 1000 kg/m³, halite near 2165 kg/m³
    assert!(rho.val[0] > 990.0 && rho.val[0] < 1010.0, "{}", rho.val[0]);
    assert_relative_eq!(rho.val[2], 2165.0, max_relative = 0.01);
    let gas = props.phase_molar_volumes().val[1];
    assert_relative_eq!(gas, rk_core::constants::GAS_CONSTANT * 298.15 / 1e5, max_relative = 1e-12);
    let porosity = props.porosity().val;
    assert!(porosity > 0.0 && porosity < 1.0);
    assert_relative_eq!(
        props.fluid_volume().val + props.solid_volume().val,
        props.volume().val,
        max_relative = 1e-12
    );
    let s = props.phase_molar_entropies().val[2];
    assert_relative_eq!(s, props.standard_partial_molar_entropies().val[10], max_relative = 1e-9);
    // absolute third-law entropy of halite, not its formation entropy
    assert_relative_eq!(s, 72.13, max_relative = 0.02);
    let cv = props.phase_molar_heat_capacities_cv().val[2];
    assert_relative_eq!(cv, props.standard_partial_molar_heat_capacities_cv().val[10], max_relative = 1e-9);
    let gas_cv = props.phase_molar_heat_capacities_cv().val[1];
    let gas_cp = props.phase_molar_heat_capacities_cp().val[1];
    // ideal gas phase: no residual part on either heat capacity
    assert_relative_eq!(gas_cv, gas_cp, max_relative = 1e-12);
}

#[test]
fn aqueous_properties() {
    let system = system();
    let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &amounts()).unwrap();
    let aq = props.aqueous().unwrap();
    let ph = aq.ph().unwrap().val;
    assert!(ph > 5.0 && ph < 6.5, "pH = {ph}");
    let i = aq.ionic_strength().unwrap().val;
    assert_relative_eq!(i, 0.1 / (55.5 * 0.018015268), max_relative = 1e-3);
    // Na+ and Cl- cancel in the conservative-ion alkalinity
    assert!(aq.alkalinity().unwrap().val.abs() < 1e-12);
    let pe = aq.pe().unwrap();
    let eh = aq.eh().unwrap();
    assert_relative_eq!(eh.val, pe.val * 0.05916, max_relative = 1e-3);
    let pe2 = aq.pe_with_reaction("0.5*O2(aq) + 2*H+ + 2*e- = H2O(l)").unwrap();
    assert_relative_eq!(pe.val, pe2.val, max_relative = 1e-10);
    assert!(aq.pe_with_reaction("H2O(l) = H+ + OH-").is_err());
}

#[test]
fn reaction_saturation_of_halite() {
    let system = system();
    let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &amounts()).unwrap();
    let r = Reaction::parse(&system, "Halite = Na+ + Cl-").unwrap();
    let log_k = r.ln_equilibrium_constant(&props).val / std::f64::consts::LN_10;
    assert_relative_eq!(log_k, 1.58, epsilon = 0.1);
    // 0.1 molal NaCl is far from halite saturation
    assert!(r.ln_saturation_index(&props).val < 0.0);
    assert_eq!(r.rate(&props).unwrap().val, 0.0);
}

#[test]
fn reaction_quotient_ignores_absent_species() {
    let system = system();
    let mut n = amounts();
    // no CO2(aq), HCO3- or O2(aq) at all
    n[5] = 0.0;
    n[6] = 0.0;
    n[7] = 0.0;
    let props = ChemicalProperties::compute(Arc::clone(&system), 298.15, 1e5, &n).unwrap();
    let ln_a = props.ln_activities();

    let r = Reaction::parse(&system, "Halite = Na+ + Cl-").unwrap();
    let ln_q = r.ln_reaction_quotient(&props);
    assert!(ln_q.val.is_finite(), "ln Q = {}", ln_q.val);
    assert_relative_eq!(ln_q.val, ln_a.val[3] + ln_a.val[4] - ln_a.val[10], max_relative = 1e-12);
    assert!(r.ln_saturation_index(&props).val.is_finite());
}
