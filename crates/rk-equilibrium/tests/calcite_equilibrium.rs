use rk_equilibrium::{
    EquilibriumOptions, EquilibriumPath, EquilibriumPathOptions, EquilibriumProblem, equilibrate_problem,
    equilibrate_problem_with_options,
};
use rk_optim::OptimumMethod;
use rk_system::{ChemicalState, ChemicalSystem, Partition, SystemBuilder};
use rk_thermo::AqueousActivityModel;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn system(elements: &[&str]) -> Arc<ChemicalSystem> {
    Arc::new(
        SystemBuilder::new()
            .add_aqueous_phase_with_elements(elements, AqueousActivityModel::DebyeHuckel(Default::default()))
            .unwrap()
            .add_mineral_phases_named(&["Calcite"])
            .unwrap()
            .build()
            .unwrap(),
    )
}

fn calcite_in_water(system: &Arc<ChemicalSystem>, celsius: f64) -> EquilibriumProblem {
    let mut problem = EquilibriumProblem::new(Arc::clone(system));
    problem.set_temperature_with_units(celsius, "celsius").unwrap();
    problem.set_pressure_with_units(1.0, "bar").unwrap();
    problem.add("H2O", 1.0, "kg").unwrap();
    problem.add("CaCO3", 100.0, "g").unwrap();
    problem
}

fn assert_balanced(state: &ChemicalState, problem: &EquilibriumProblem) {
    let b = problem.element_amounts();
    let residual = (state.element_amounts() - b).amax();
    assert!(residual <= 1e-6 * b.amax(), "mass balance residual {residual}");
    assert!(state.species_amounts().iter().all(|v| *v >= 0.0));
}

fn ph(state: &ChemicalState) -> f64 {
    state.properties().unwrap().aqueous().unwrap().ph().unwrap().val
}

fn molality(state: &ChemicalState, species: &str) -> f64 {
    let props = state.properties().unwrap();
    let aqueous = props.aqueous().unwrap();
    let system = state.system();
    let offset = system.index_first_species_in_phase(aqueous.index_phase());
    aqueous.molalities().unwrap().val[system.index_species(species) - offset]
}

#[test]
fn calcite_dissolves_in_pure_water() {
    init_tracing();
    let system = system(&["H", "O", "C", "Ca"]);
    let problem = calcite_in_water(&system, 25.0);
    let state = equilibrate_problem(&problem).unwrap();
    assert_balanced(&state, &problem);

    let ph = ph(&state);
    assert!((7.0..=10.0).contains(&ph), "pH = {ph}");
    assert!(molality(&state, "Ca++") > 1e-6);
    assert!(molality(&state, "HCO3-") > 1e-7);

    // only a small fraction of the 0.999 mol of calcite dissolves
    let calcite = state.species_amount_by_name("Calcite", "mol").unwrap();
    assert!(calcite > 0.99 && calcite < 0.9992, "calcite = {calcite}");
}

#[test]
fn interior_point_variants_agree() {
    init_tracing();
    let system = system(&["H", "O", "C", "Ca"]);
    let problem = calcite_in_water(&system, 25.0);
    let reference = equilibrate_problem(&problem).unwrap();
    for method in [OptimumMethod::IpOpt, OptimumMethod::IpActive] {
        let options = EquilibriumOptions {
            method,
            ..Default::default()
        };
        let state = equilibrate_problem_with_options(&problem, &options).unwrap();
        assert_balanced(&state, &problem);
        let (a, b) = (ph(&state), ph(&reference));
        assert!((a - b).abs() < 1e-3, "{method:?}: pH {a} vs {b}");
    }
}

#[test]
fn hydrochloric_acid_path_dissolves_calcite() {
    init_tracing();
    let system = system(&["H", "O", "C", "Ca", "Cl"]);
    let initial_problem = calcite_in_water(&system, 30.0);
    let mut final_problem = calcite_in_water(&system, 30.0);
    final_problem.add("HCl", 1.0, "mmol").unwrap();

    let initial = equilibrate_problem(&initial_problem).unwrap();
    let last = equilibrate_problem(&final_problem).unwrap();
    assert_balanced(&last, &final_problem);

    let path = EquilibriumPath::new(Partition::new(Arc::clone(&system))).with_options(EquilibriumPathOptions {
        initial_step: 0.05,
        max_step: 0.2,
        ..Default::default()
    });
    let mut calcite = Vec::new();
    let result = path
        .solve_with_output(&initial, &last, |point| {
            calcite.push(point.state.species_amount_by_name("Calcite", "mol").unwrap());
        })
        .unwrap();
    assert!(result.succeeded, "path stopped after {} points", result.points.len());
    assert!(result.points.len() >= 6);

    let end = &result.points[result.points.len() - 1].state;
    let cl = end.element_amount("Cl").unwrap();
    assert!((cl - 1e-3).abs() < 1e-9, "Cl = {cl}");
    assert!(ph(end) < ph(&result.points[0].state));
    // acid is consumed by calcite dissolution along the whole path
    assert!(calcite.windows(2).all(|w| w[1] <= w[0] + 1e-9));
    let scale = last.species_amounts().amax();
    assert!((end.species_amounts() - last.species_amounts()).amax() < 1e-6 * scale);
}
