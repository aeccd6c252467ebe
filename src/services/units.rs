//! Unit conversion tables for length, mass, speed and temperature.
//!
//! Linear domains map every alias to a factor against the domain's base unit
//! (meter, gram, meter per second). Temperature has an offset, so it goes
//! through Celsius instead of a factor table.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Temperature scales handled by the affine converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scale {
    Celsius,
    Fahrenheit,
    Kelvin,
}

/// Aliases of one linear domain, as factors against its base unit.
struct UnitTable {
    factors: HashMap<&'static str, f64>,
}

impl UnitTable {
    fn new() -> Self {
        Self {
            factors: HashMap::new(),
        }
    }

    fn with(mut self, aliases: &[&'static str], factor: f64) -> Self {
        for alias in aliases {
            self.factors.insert(*alias, factor);
        }
        self
    }

    fn factor(&self, unit: &str) -> Option<f64> {
        self.factors.get(unit).copied()
    }
}

static LINEAR_TABLES: Lazy<Vec<UnitTable>> = Lazy::new(|| {
    vec![
        // Length (base: meter)
        UnitTable::new()
            .with(&["m", "meter", "meters", "metre", "metres", "米"], 1.0)
            .with(
                &["km", "kilometer", "kilometers", "kilometre", "kilometres", "公里", "千米"],
                1000.0,
            )
            .with(&["cm", "centimeter", "centimeters", "centimetre", "厘米"], 0.01)
            .with(&["mm", "millimeter", "millimeters", "millimetre", "毫米"], 0.001)
            .with(&["mi", "mile", "miles", "英里"], 1609.344)
            .with(&["yd", "yard", "yards", "码"], 0.9144)
            .with(&["ft", "foot", "feet", "英尺"], 0.3048)
            .with(&["in", "inch", "inches", "英寸"], 0.0254)
            .with(&["nmi", "nautical mile", "nautical miles", "海里"], 1852.0),
        // Mass (base: gram)
        UnitTable::new()
            .with(&["g", "gram", "grams", "克"], 1.0)
            .with(&["kg", "kilogram", "kilograms", "kilo", "kilos", "公斤", "千克"], 1000.0)
            .with(&["mg", "milligram", "milligrams", "毫克"], 0.001)
            .with(&["t", "ton", "tons", "tonne", "tonnes", "吨"], 1_000_000.0)
            .with(&["lb", "lbs", "pound", "pounds", "磅"], 453.592_37)
            .with(&["oz", "ounce", "ounces", "盎司"], 28.349_523_125)
            .with(&["st", "stone", "stones"], 6_350.293_18)
            .with(&["斤"], 500.0)
            .with(&["两"], 50.0),
        // Speed (base: meters per second)
        UnitTable::new()
            .with(&["m/s", "mps", "米每秒"], 1.0)
            .with(&["km/h", "kmh", "kph", "公里每小时", "千米每小时"], 1.0 / 3.6)
            .with(&["mph", "mi/h", "英里每小时"], 0.447_04)
            .with(&["kn", "knot", "knots", "节"], 1852.0 / 3600.0)
            .with(&["ft/s", "fps"], 0.3048),
    ]
});

/// Normalize a unit name: lowercase, trim, and strip degree marks.
fn normalize(unit: &str) -> String {
    unit.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '°' && *c != 'º')
        .collect()
}

fn temperature_scale(unit: &str) -> Option<Scale> {
    match normalize(unit).as_str() {
        "c" | "celsius" | "℃" | "摄氏度" | "摄氏" => Some(Scale::Celsius),
        "f" | "fahrenheit" | "℉" | "华氏度" | "华氏" => Some(Scale::Fahrenheit),
        "k" | "kelvin" | "开尔文" | "开" => Some(Scale::Kelvin),
        _ => None,
    }
}

/// Whether `unit` names a temperature scale (affine, no reciprocal rate).
pub fn is_temperature_unit(unit: &str) -> bool {
    temperature_scale(unit).is_some()
}

fn convert_temperature(value: f64, from: Scale, to: Scale) -> f64 {
    let celsius = match from {
        Scale::Celsius => value,
        Scale::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
        Scale::Kelvin => value - 273.15,
    };

    match to {
        Scale::Celsius => celsius,
        Scale::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        Scale::Kelvin => celsius + 273.15,
    }
}

/// Convert `value` between two units.
///
/// Temperature is tried first, then each linear table; both units must
/// resolve inside the same table.
pub fn try_convert(value: f64, from: &str, to: &str) -> Option<f64> {
    if let (Some(from), Some(to)) = (temperature_scale(from), temperature_scale(to)) {
        return Some(convert_temperature(value, from, to));
    }

    let (from, to) = (normalize(from), normalize(to));
    LINEAR_TABLES.iter().find_map(|table| {
        let from_factor = table.factor(&from)?;
        let to_factor = table.factor(&to)?;
        Some(value * from_factor / to_factor)
    })
}
