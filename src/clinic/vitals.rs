/// Body mass index from weight in kilograms and height in centimetres,
/// rendered with one decimal.
///
/// `None` unless both values parse as positive numbers.
pub fn body_mass_index(weight_kg: &str, height_cm: &str) -> Option<String> {
    let weight: f64 = weight_kg.trim().parse().ok()?;
    let height_m = height_cm.trim().parse::<f64>().ok()? / 100.0;
    if !(weight > 0.0 && height_m > 0.0) || !weight.is_finite() || !height_m.is_finite() {
        return None;
    }
    Some(format!("{:.1}", weight / (height_m * height_m)))
}
