use nalgebra::DVector;
use rk_equilibrium::EquilibriumSolver;
use rk_system::{ChemicalState, ChemicalSystem, SystemBuilder};
use rk_thermo::{AqueousActivityModel, GaseousActivityModel};
use std::sync::Arc;

fn system() -> Arc<ChemicalSystem> {
    Arc::new(
        SystemBuilder::new()
            .add_aqueous_phase_named(
                &["H2O(l)", "H+", "OH-", "CO2(aq)", "HCO3-", "CO3--"],
                AqueousActivityModel::DebyeHuckel(Default::default()),
            )
            .unwrap()
            .add_gaseous_phase_named(&["CO2(g)"], GaseousActivityModel::Ideal)
            .unwrap()
            .build()
            .unwrap(),
    )
}

fn state(system: &Arc<ChemicalSystem>, t: f64, b: &DVector<f64>) -> (ChemicalState, EquilibriumSolver) {
    let mut state = ChemicalState::new(Arc::clone(system));
    state.set_temperature(t).unwrap();
    let mut solver = EquilibriumSolver::new(Arc::clone(system));
    let iee = solver.partition().indices_equilibrium_elements();
    let be = DVector::from_iterator(iee.len(), iee.iter().map(|&j| b[j]));
    let res = solver.solve_with_elements(&mut state, &be).unwrap();
    assert!(res.succeeded());
    (state, solver)
}

fn element_amounts(system: &ChemicalSystem) -> DVector<f64> {
    let mut b = DVector::zeros(system.num_elements());
    let nw = 1.0 / system.species_at(0).molar_mass();
    b[system.index_element("H")] = 2.0 * nw;
    b[system.index_element("O")] = nw + 2.0 * 0.5;
    b[system.index_element("C")] = 0.5;
    b
}

/// Relative agreement, with an absolute floor for the solver's residual
/// noise on amounts of size `amount_scale` divided by the step `h`.
fn assert_close(analytic: f64, fd: f64, amount_scale: f64, h: f64, what: &str) {
    let floor = 1e-8 * amount_scale / h;
    assert!(
        (analytic - fd).abs() <= 1e-3 * fd.abs() + floor,
        "{what}: analytic {analytic:e}, finite difference {fd:e}"
    );
}

#[test]
fn temperature_sensitivity_matches_finite_differences() {
    let system = system();
    let b = element_amounts(&system);
    let t = 323.15;
    let (_, solver) = state(&system, t, &b);
    let sens = solver.sensitivity().unwrap();

    let h = 0.1;
    let (plus, _) = state(&system, t + h, &b);
    let (minus, _) = state(&system, t - h, &b);
    for name in ["CO2(aq)", "HCO3-", "CO2(g)"] {
        let i = system.index_species(name);
        let fd = (plus.species_amounts()[i] - minus.species_amounts()[i]) / (2.0 * h);
        assert_close(sens.dndt[i], fd, b.amax(), h, name);
    }
}

#[test]
fn element_sensitivity_matches_finite_differences() {
    let system = system();
    let b = element_amounts(&system);
    let (_, solver) = state(&system, 298.15, &b);
    let sens = solver.sensitivity().unwrap();

    // adding CO2 raises C by 1 and O by 2
    let (ic, io) = (system.index_element("C"), system.index_element("O"));
    let mut direction = DVector::zeros(system.num_elements());
    direction[ic] = 1.0;
    direction[io] = 2.0;
    let h = 1e-4;
    let (plus, _) = state(&system, 298.15, &(&b + &direction * h));
    let (minus, _) = state(&system, 298.15, &(&b - &direction * h));
    let predicted = &sens.dndb * &direction;
    for name in ["CO2(aq)", "CO2(g)", "H+"] {
        let i = system.index_species(name);
        let fd = (plus.species_amounts()[i] - minus.species_amounts()[i]) / (2.0 * h);
        assert_close(predicted[i], fd, b.amax(), h, name);
    }
    // the amounts respond without breaking mass balance
    let db = system.formula_matrix() * &predicted;
    assert!((db - direction).amax() < 1e-8);
}
