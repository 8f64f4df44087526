//! Unit handling at the boundary of the core.
//!
//! Everything inside the workspace works in SI (K, Pa, mol, kg, s). Values
//! arriving with unit strings, such as `"25 celsius"` or `(100.0, "g")`, are
//! converted here before they reach a model or solver.

use uom::si::f64::{
    AmountOfSubstance as UomAmount, Area as UomArea, Mass as UomMass, Pressure as UomPressure,
    ThermodynamicTemperature as UomTemperature, Time as UomTime, Volume as UomVolume,
};

use crate::error::{CoreError, CoreResult};

// Public canonical unit types (SI, f64)
pub type Amount = UomAmount;
pub type Area = UomArea;
pub type Mass = UomMass;
pub type Pressure = UomPressure;
pub type Temperature = UomTemperature;
pub type Time = UomTime;
pub type Volume = UomVolume;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn celsius(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::degree_celsius;
    Temperature::new::<degree_celsius>(v)
}

#[inline]
pub fn mol(v: f64) -> Amount {
    use uom::si::amount_of_substance::mole;
    Amount::new::<mole>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

pub mod constants {
    /// Universal gas constant (J/(mol·K))
    pub const GAS_CONSTANT: f64 = 8.314_462_1;
    /// Faraday constant (C/mol)
    pub const FARADAY: f64 = 96_485.332_9;
    /// Thermochemical calorie (J)
    pub const CALORIE: f64 = 4.184;
    /// Molar mass of water (kg/mol)
    pub const WATER_MOLAR_MASS: f64 = 0.018_015_268;
    /// Reference temperature (K)
    pub const REFERENCE_TEMPERATURE: f64 = 298.15;
    /// Reference pressure (Pa)
    pub const REFERENCE_PRESSURE: f64 = 1e5;
}

/// Quantity family a unit string is interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Canonical: K
    Temperature,
    /// Canonical: Pa
    Pressure,
    /// Canonical: mol
    Amount,
    /// Canonical: kg
    Mass,
    /// Canonical: s
    Time,
    /// Canonical: m³
    Volume,
    /// Canonical: m²
    Area,
    /// Canonical: m²/kg
    SpecificArea,
    /// Canonical: J/mol
    MolarEnergy,
    /// Canonical: mol/(m²·s)
    SurfaceRate,
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Temperature => "temperature",
            Self::Pressure => "pressure",
            Self::Amount => "amount",
            Self::Mass => "mass",
            Self::Time => "time",
            Self::Volume => "volume",
            Self::Area => "area",
            Self::SpecificArea => "specific area",
            Self::MolarEnergy => "molar energy",
            Self::SurfaceRate => "surface rate",
        };
        write!(f, "{}", name)
    }
}

/// Convert `value` expressed in `units` into the canonical SI unit of `quantity`.
pub fn convert(value: f64, units: &str, quantity: Quantity) -> CoreResult<f64> {
    let unit = units.trim().to_lowercase();
    let unknown = || CoreError::UnknownUnit {
        unit: units.to_string(),
        quantity: quantity.to_string(),
    };
    let si = match quantity {
        Quantity::Temperature => {
            use uom::si::thermodynamic_temperature::{
                degree_celsius, degree_fahrenheit, degree_rankine, kelvin,
            };
            let t = match unit.as_str() {
                "" | "k" | "kelvin" => Temperature::new::<kelvin>(value),
                "c" | "°c" | "degc" | "celsius" => Temperature::new::<degree_celsius>(value),
                "f" | "°f" | "degf" | "fahrenheit" => Temperature::new::<degree_fahrenheit>(value),
                "r" | "rankine" => Temperature::new::<degree_rankine>(value),
                _ => return Err(unknown()),
            };
            let kelvins = t.get::<kelvin>();
            if kelvins <= 0.0 {
                return Err(CoreError::OutOfRange {
                    value: kelvins,
                    reason: "absolute temperature must be > 0 K".to_string(),
                });
            }
            kelvins
        }
        Quantity::Pressure => {
            use uom::si::pressure::{
                atmosphere, bar, kilopascal, megapascal, millibar, pascal,
                pound_force_per_square_inch, torr,
            };
            let p = match unit.as_str() {
                "" | "pa" | "pascal" => Pressure::new::<pascal>(value),
                "kpa" => Pressure::new::<kilopascal>(value),
                "mpa" => Pressure::new::<megapascal>(value),
                "bar" => Pressure::new::<bar>(value),
                "mbar" | "millibar" => Pressure::new::<millibar>(value),
                "atm" => Pressure::new::<atmosphere>(value),
                "torr" | "mmhg" => Pressure::new::<torr>(value),
                "psi" | "psia" => Pressure::new::<pound_force_per_square_inch>(value),
                _ => return Err(unknown()),
            };
            let pascals = p.get::<pascal>();
            if pascals < 0.0 {
                return Err(CoreError::OutOfRange {
                    value: pascals,
                    reason: "absolute pressure cannot be negative".to_string(),
                });
            }
            pascals
        }
        Quantity::Amount => {
            use uom::si::amount_of_substance::{kilomole, micromole, millimole, mole};
            let n = match unit.as_str() {
                "" | "mol" | "mole" | "moles" => Amount::new::<mole>(value),
                "mmol" => Amount::new::<millimole>(value),
                "umol" | "µmol" => Amount::new::<micromole>(value),
                "kmol" => Amount::new::<kilomole>(value),
                _ => return Err(unknown()),
            };
            n.get::<mole>()
        }
        Quantity::Mass => {
            use uom::si::mass::{gram, kilogram, microgram, milligram, pound};
            let m = match unit.as_str() {
                "" | "kg" => Mass::new::<kilogram>(value),
                "g" => Mass::new::<gram>(value),
                "mg" => Mass::new::<milligram>(value),
                "ug" | "µg" => Mass::new::<microgram>(value),
                "lbm" => Mass::new::<pound>(value),
                _ => return Err(unknown()),
            };
            m.get::<kilogram>()
        }
        Quantity::Time => {
            use uom::si::time::{day, hour, minute, second, year};
            let t = match unit.as_str() {
                "" | "s" | "second" | "seconds" => Time::new::<second>(value),
                "min" | "minute" | "minutes" => Time::new::<minute>(value),
                "h" | "hour" | "hours" => Time::new::<hour>(value),
                "day" | "days" => Time::new::<day>(value),
                "year" | "years" => Time::new::<year>(value),
                _ => return Err(unknown()),
            };
            t.get::<second>()
        }
        Quantity::Volume => {
            use uom::si::volume::{cubic_centimeter, cubic_meter, liter, milliliter};
            let v = match unit.as_str() {
                "" | "m3" => Volume::new::<cubic_meter>(value),
                "l" | "liter" => Volume::new::<liter>(value),
                "ml" => Volume::new::<milliliter>(value),
                "cm3" => Volume::new::<cubic_centimeter>(value),
                _ => return Err(unknown()),
            };
            v.get::<cubic_meter>()
        }
        Quantity::Area => {
            use uom::si::area::{square_centimeter, square_meter};
            let a = match unit.as_str() {
                "" | "m2" => Area::new::<square_meter>(value),
                "cm2" => Area::new::<square_centimeter>(value),
                _ => return Err(unknown()),
            };
            a.get::<square_meter>()
        }
        Quantity::SpecificArea => match unit.as_str() {
            "" | "m2/kg" => value,
            "m2/g" => value * 1e3,
            "cm2/g" => value * 1e-1,
            "cm2/kg" => value * 1e-4,
            _ => return Err(unknown()),
        },
        Quantity::MolarEnergy => match unit.as_str() {
            "" | "j/mol" => value,
            "kj/mol" => value * 1e3,
            "cal/mol" => value * constants::CALORIE,
            "kcal/mol" => value * constants::CALORIE * 1e3,
            _ => return Err(unknown()),
        },
        Quantity::SurfaceRate => match unit.as_str() {
            "" | "mol/(m2*s)" | "mol/(m2·s)" | "mol/m2/s" => value,
            "mmol/(m2*s)" => value * 1e-3,
            "mol/(cm2*s)" => value * 1e4,
            _ => return Err(unknown()),
        },
    };
    Ok(si)
}

/// Parse text such as `"25 celsius"` or `"1bar"` into the canonical SI value.
pub fn parse_quantity(raw_text: &str, quantity: Quantity) -> CoreResult<f64> {
    let (value, unit) = split_value_and_unit(raw_text)?;
    convert(value, &unit, quantity)
}

/// An amount given either as moles or as a mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AmountOrMass {
    /// mol
    Moles(f64),
    /// kg
    Mass(f64),
}

impl AmountOrMass {
    /// Interpret `value` in `units` as an amount or a mass, whichever fits.
    pub fn parse(value: f64, units: &str) -> CoreResult<Self> {
        if let Ok(n) = convert(value, units, Quantity::Amount) {
            return Ok(Self::Moles(n));
        }
        convert(value, units, Quantity::Mass)
            .map(Self::Mass)
            .map_err(|_| CoreError::UnknownUnit {
                unit: units.to_string(),
                quantity: "amount or mass".to_string(),
            })
    }

    /// Moles given the molar mass (kg/mol).
    pub fn moles(self, molar_mass: f64) -> f64 {
        match self {
            Self::Moles(n) => n,
            Self::Mass(m) => m / molar_mass,
        }
    }
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// Examples:
/// - "70F" -> (70.0, "F")
/// - "1e-3 mol" -> (0.001, "mol")
/// - "300" -> (300.0, "")
pub(crate) fn split_value_and_unit(input: &str) -> CoreResult<(f64, String)> {
    let trimmed = input.trim();

    let mut split_idx = trimmed.len();
    let mut prev: Option<char> = None;
    for (i, c) in trimmed.char_indices() {
        let numeric = c.is_ascii_digit()
            || c == '.'
            || ((c == '-' || c == '+') && matches!(prev, None | Some('e') | Some('E')))
            || ((c == 'e' || c == 'E') && prev.is_some_and(|p| p.is_ascii_digit() || p == '.'));
        if !numeric {
            split_idx = i;
            break;
        }
        prev = Some(c);
    }

    let (num_part, unit_part) = trimmed.split_at(split_idx);
    let value: f64 = num_part.trim().parse().map_err(|_| CoreError::Parse {
        what: format!("could not parse numeric value from '{}'", input),
    })?;

    Ok((value, unit_part.trim().to_string()))
}
