use pathocore::api::ActiveSettings;
use pathocore::Params;
use rand::{rngs::StdRng, Rng};
use serde_json::{json, Map, Value};

/// Largest object size, in pixels, the generator works with.
const MAX_OBJECT_SIZE: f64 = 1.0e9;

/// Reads a numeric parameter, falling back to `default` when absent or not a number.
fn numeric(params: &Params, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

/// Object size parameter clamped to `1..=MAX_OBJECT_SIZE`.
fn object_size(params: &Params, key: &str, default: f64) -> f64 {
    numeric(params, key, default).clamp(1.0, MAX_OBJECT_SIZE)
}

/// Uniform sample from `low..high`, or `low` when the range is empty.
fn sample(rng: &mut StdRng, low: f64, high: f64) -> f64 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Staining mark from the brown share of the stained area, in percent.
pub fn staining_score(brown_percent: f64) -> u8 {
    match brown_percent {
        p if p < 1.0 => 1,
        p if p < 10.0 => 2,
        p if p < 33.0 => 3,
        p if p < 66.0 => 4,
        _ => 5,
    }
}

/// Intensity mark from the median gray level of brown pixels (0..1).
pub fn intensity_score(median: Option<f64>) -> u8 {
    match median {
        None => 1,
        Some(m) if m < 0.3 => 3,
        Some(m) if m < 0.6 => 2,
        Some(_) => 1,
    }
}

pub fn er_outcome(total_marks: u8) -> &'static str {
    match total_marks {
        0..=2 => "Negative",
        3 => "Low Positive",
        _ => "Positive",
    }
}

pub fn tubule_score(fraction: f64) -> u8 {
    if fraction > 0.75 {
        1
    } else if fraction > 0.10 {
        2
    } else {
        3
    }
}

pub fn pleomorphism_grade(composite: f64) -> &'static str {
    if composite < 1.0 {
        "Grade 1 (Low pleomorphism)"
    } else if composite < 2.0 {
        "Grade 2 (Moderate pleomorphism)"
    } else {
        "Grade 3 (High pleomorphism)"
    }
}

/// Nuclear shape statistics feeding the pleomorphism score.
#[derive(Debug, Clone, Copy)]
pub struct NuclearStats {
    pub total_nuclei: usize,
    pub mean_area: f64,
    pub area_cv: f64,
    pub diameter_cv: f64,
    pub mean_circularity: f64,
    pub circularity_std: f64,
    pub mean_solidity: f64,
    pub mean_eccentricity: f64,
    pub aspect_ratio_cv: f64,
    pub intensity_variation: f64,
}

impl NuclearStats {
    /// Size, shape and texture subscores, each capped at 1.
    pub fn subscores(&self) -> (f64, f64, f64) {
        let size = (self.area_cv * 3.0).min(1.0);
        let irregularity =
            (1.0 - self.mean_circularity) + self.circularity_std + self.mean_eccentricity;
        let shape = irregularity.min(1.0);
        let texture = (self.intensity_variation / 50.0).min(1.0);
        (size, shape, texture)
    }

    /// Weighted composite on a 0..3 scale.
    pub fn composite(&self) -> f64 {
        let (size, shape, texture) = self.subscores();
        (size * 0.4 + shape * 0.4 + texture * 0.2) * 3.0
    }

    fn to_metrics(self) -> Value {
        let (size, shape, texture) = self.subscores();
        json!({
            "total_nuclei": self.total_nuclei,
            "mean_area": self.mean_area,
            "area_cv": self.area_cv,
            "diameter_cv": self.diameter_cv,
            "mean_circularity": self.mean_circularity,
            "circularity_std": self.circularity_std,
            "mean_solidity": self.mean_solidity,
            "mean_eccentricity": self.mean_eccentricity,
            "aspect_ratio_cv": self.aspect_ratio_cv,
            "intensity_variation": self.intensity_variation,
            "size_score": size,
            "shape_score": shape,
            "texture_score": texture,
        })
    }
}

/// Produces one frame's worth of metrics for the active pipeline.
///
/// Unregistered pipelines yield an empty map.
pub fn synthesize(active: &ActiveSettings, rng: &mut StdRng) -> Map<String, Value> {
    let params = &active.params;
    let metrics = match active.name.as_str() {
        "cell_count" => cell_count(params, rng),
        "fluorescence" => fluorescence(params, rng),
        "estrogen_receptor" => estrogen_receptor(rng),
        "nottingham_tubule" => nottingham_tubule(rng),
        "nuclear_pleomorphism" => nuclear_pleomorphism(params, rng),
        _ => Value::Null,
    };
    match metrics {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn cell_count(params: &Params, rng: &mut StdRng) -> Value {
    let min_size = object_size(params, "min_size", 50.0);
    let max_size = object_size(params, "max_size", 1000.0);
    let count: u32 = rng.gen_range(0..60);
    if count == 0 {
        return json!({"cell_count": 0, "sizes": {}});
    }
    let sizes: Vec<f64> = (0..count)
        .map(|_| sample(rng, min_size, max_size))
        .collect();
    let min = sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sizes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = sizes.iter().sum::<f64>() / sizes.len() as f64;
    json!({
        "cell_count": count,
        "sizes": {"min_size": min, "max_size": max, "avg_size": avg},
    })
}

fn fluorescence(params: &Params, rng: &mut StdRng) -> Value {
    let threshold = numeric(params, "threshold", 50.0).clamp(0.0, 254.0) as u32;
    let area_percentage: f64 = rng.gen_range(0.0..45.0);
    if area_percentage < 1.0 {
        return json!({"intensity": {}, "area_percentage": area_percentage});
    }
    let min = rng.gen_range(threshold + 1..=255);
    let max = rng.gen_range(min..=255);
    let avg = (min + max) / 2;
    json!({
        "intensity": {
            "min_intensity": min,
            "max_intensity": max,
            "avg_intensity": avg,
            "area_percentage": area_percentage,
        },
        "area_percentage": area_percentage,
    })
}

fn estrogen_receptor(rng: &mut StdRng) -> Value {
    let blue_area_percent: f64 = rng.gen_range(0.0..30.0);
    let brown_area_percent: f64 = rng.gen_range(0.0..30.0);
    let total_area = blue_area_percent + brown_area_percent;
    let brown_share = if total_area > 0.0 {
        brown_area_percent / total_area * 100.0
    } else {
        0.0
    };
    let brown_cell_count: u32 = (brown_area_percent * 2.0) as u32;
    let median = (brown_cell_count > 0).then(|| rng.gen_range(0.1..0.9));

    let staining = staining_score(brown_share);
    let intensity = intensity_score(median);
    let total = staining + intensity;
    json!({
        "blue_cell_count": (blue_area_percent * 2.0) as u32,
        "brown_cell_count": brown_cell_count,
        "blue_area_percent": blue_area_percent,
        "brown_area_percent": brown_area_percent,
        "staining_score": staining,
        "stain_intensity": median.unwrap_or(0.0),
        "intensity_score": intensity,
        "total_score": total,
        "outcome": er_outcome(total),
    })
}

fn nottingham_tubule(rng: &mut StdRng) -> Value {
    let fraction: f64 = rng.gen_range(0.0..1.0);
    json!({
        "tubule_fraction": fraction,
        "nottingham_tubule_score": tubule_score(fraction),
    })
}

fn nuclear_pleomorphism(params: &Params, rng: &mut StdRng) -> Value {
    let min_size = object_size(params, "min_size", 50.0);
    let nuclei: usize = rng.gen_range(0..40);
    if nuclei == 0 {
        return json!({
            "nuclei_count": 0,
            "mask_area": 0,
            "pleomorphism_score": 0,
            "pleomorphism_grade": "No nuclei detected",
            "pleomorphism_metrics": {},
        });
    }
    let stats = NuclearStats {
        total_nuclei: nuclei,
        mean_area: sample(rng, min_size, min_size * 8.0),
        area_cv: rng.gen_range(0.05..0.6),
        diameter_cv: rng.gen_range(0.02..0.3),
        mean_circularity: rng.gen_range(0.5..0.95),
        circularity_std: rng.gen_range(0.01..0.2),
        mean_solidity: rng.gen_range(0.8..1.0),
        mean_eccentricity: rng.gen_range(0.1..0.8),
        aspect_ratio_cv: rng.gen_range(0.05..0.4),
        intensity_variation: rng.gen_range(5.0..60.0),
    };
    let composite = stats.composite();
    json!({
        "nuclei_count": nuclei,
        "mask_area": (stats.mean_area * nuclei as f64).round() as u64,
        "pleomorphism_score": composite,
        "pleomorphism_grade": pleomorphism_grade(composite),
        "pleomorphism_metrics": stats.to_metrics(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathocore::metrics::{dispatch, Visualization};
    use rand::SeedableRng;

    #[test]
    fn er_marks_follow_thresholds() {
        assert_eq!(staining_score(0.5), 1);
        assert_eq!(staining_score(10.0), 3);
        assert_eq!(staining_score(70.0), 5);
        assert_eq!(intensity_score(None), 1);
        assert_eq!(intensity_score(Some(0.2)), 3);
        assert_eq!(intensity_score(Some(0.45)), 2);
        assert_eq!(er_outcome(2), "Negative");
        assert_eq!(er_outcome(3), "Low Positive");
        assert_eq!(er_outcome(8), "Positive");
    }

    #[test]
    fn tubule_and_grade_thresholds_are_exclusive() {
        assert_eq!(tubule_score(0.75), 2);
        assert_eq!(tubule_score(0.76), 1);
        assert_eq!(tubule_score(0.10), 3);
        assert_eq!(pleomorphism_grade(0.99), "Grade 1 (Low pleomorphism)");
        assert_eq!(pleomorphism_grade(1.0), "Grade 2 (Moderate pleomorphism)");
        assert_eq!(pleomorphism_grade(2.0), "Grade 3 (High pleomorphism)");
    }

    #[test]
    fn composite_caps_each_subscore() {
        let stats = NuclearStats {
            total_nuclei: 10,
            mean_area: 200.0,
            area_cv: 1.0,
            diameter_cv: 0.1,
            mean_circularity: 0.0,
            circularity_std: 0.5,
            mean_solidity: 0.9,
            mean_eccentricity: 0.9,
            aspect_ratio_cv: 0.1,
            intensity_variation: 500.0,
        };
        assert_eq!(stats.subscores(), (1.0, 1.0, 1.0));
        assert!((stats.composite() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_size_params_do_not_break_sampling() {
        let mut rng = StdRng::seed_from_u64(3);
        let extremes = [
            json!({"min_size": 1e17, "max_size": 1000}),
            json!({"min_size": 1e308, "max_size": 1e308}),
            json!({"min_size": -5, "max_size": -10}),
            json!({"min_size": 500, "max_size": 500}),
        ];
        for params in extremes {
            let params = params.as_object().cloned().unwrap();
            for name in ["cell_count", "nuclear_pleomorphism"] {
                for _ in 0..20 {
                    let metrics = synthesize(&ActiveSettings::new(name, params.clone()), &mut rng);
                    assert!(!metrics.is_empty());
                }
            }
        }
        let pinned = json!({"min_size": 500, "max_size": 500});
        let active = ActiveSettings::new("cell_count", pinned.as_object().cloned().unwrap());
        let metrics = (0..20)
            .map(|_| synthesize(&active, &mut rng))
            .find(|metrics| metrics["cell_count"] != json!(0))
            .unwrap();
        assert_eq!(metrics["sizes"]["min_size"], json!(500.0));
        assert_eq!(metrics["sizes"]["max_size"], json!(500.0));
    }

    #[test]
    fn synthesized_metrics_dispatch_to_their_views() {
        let mut rng = StdRng::seed_from_u64(7);
        for name in pathocore::metrics::REGISTERED_PIPELINES {
            let active = ActiveSettings::new(name, Params::new());
            let metrics = synthesize(&active, &mut rng);
            assert!(!metrics.is_empty(), "{name} produced no metrics");
            let visualization = dispatch(Some(name), Some(&metrics));
            assert!(visualization.placeholder().is_none(), "{name} -> {visualization:?}");
        }
        let unknown = ActiveSettings::new("edge_detect", Params::new());
        assert!(synthesize(&unknown, &mut rng).is_empty());
        assert_eq!(
            dispatch(Some("edge_detect"), Some(&Map::new())),
            Visualization::NoMetrics
        );
    }
}
