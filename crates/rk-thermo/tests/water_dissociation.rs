use nalgebra::DVector;
use rk_thermo::{PhaseThermoModel, StandardThermoModel, catalog, reaction_thermo_state};

fn water_ion_product(t: f64, p: f64) -> f64 {
    let species = ["H2O(l)", "H+", "OH-"]
        .iter()
        .map(|n| catalog::species(n).unwrap())
        .collect();
    let model = StandardThermoModel::new(species);
    let res = model.evaluate(t, p).unwrap();
    let nu = DVector::from_vec(vec![-1.0, 1.0, 1.0]);
    reaction_thermo_state(&nu, &res, t).log_equilibrium_constant.val
}

#[test]
fn ion_product_of_water_along_heating() {
    let kw25 = water_ion_product(298.15, 1e5);
    let kw100 = water_ion_product(373.15, 5e5);
    let kw200 = water_ion_product(473.15, 50e5);
    assert!((kw25 + 14.0).abs() < 0.05, "log Kw(25 °C) = {kw25}");
    assert!((kw100 + 12.26).abs() < 0.2, "log Kw(100 °C) = {kw100}");
    assert!((kw200 + 11.3).abs() < 0.25, "log Kw(200 °C) = {kw200}");
}

#[test]
fn entropy_is_minus_gibbs_temperature_derivative() {
    let species = vec![catalog::species("Calcite").unwrap(), catalog::species("CO2(aq)").unwrap()];
    let model = StandardThermoModel::new(species);
    let res = model.evaluate(350.0, 20e5).unwrap();
    for i in 0..2 {
        let s = res.entropies.val[i];
        assert!((res.gibbs_energies.ddt[i] + s).abs() < 1e-8 * s.abs().max(1.0));
    }
}
