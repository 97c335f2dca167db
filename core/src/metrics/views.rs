//! Per-pipeline readings extracted from an open metrics mapping.
//!
//! Every view is built field by field with a default for each field, so a
//! pipeline that has published only part of its schema still renders.

use crate::metrics::reading::{section, Bar, Emphasis, Reading, Share};
use serde_json::{Map, Value};

type Metrics = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct CellCountView {
    pub cell_count: Reading,
    /// Min / Avg / Max bars, present only when all three sizes are. The
    /// middle bar reads "Median" when only `median_size` was published.
    pub size_series: Option<Vec<Bar>>,
}

impl CellCountView {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let sizes = section(Some(metrics), "sizes");
        let size = |key: &str| Reading::from_value(sizes.and_then(|s| s.get(key))).as_f64();
        let middle = size("avg_size")
            .map(|avg| ("Avg", avg))
            .or_else(|| size("median_size").map(|median| ("Median", median)));
        let (min, max) = (size("min_size"), size("max_size"));

        let size_series = match (min, middle, max) {
            (Some(min), Some((label, middle)), Some(max)) => Some(vec![
                Bar {
                    label: "Min",
                    value: min.round(),
                },
                Bar {
                    label,
                    value: middle.round(),
                },
                Bar {
                    label: "Max",
                    value: max.round(),
                },
            ]),
            _ => None,
        };

        Self {
            cell_count: Reading::number_or(Some(metrics), "cell_count", 0.0),
            size_series,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FluorescenceView {
    /// Missing intensities are not displayed.
    pub avg_intensity: Reading,
    pub min_intensity: Reading,
    pub max_intensity: Reading,
    pub area_percentage: Reading,
    pub coverage: Share,
}

impl FluorescenceView {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let intensity = section(Some(metrics), "intensity");
        let area_percentage = Reading::number_or(Some(metrics), "area_percentage", 0.0);
        let coverage = Share::of_percent(
            "Fluorescent",
            "Non-fluorescent",
            area_percentage.as_f64().unwrap_or(0.0),
        );
        Self {
            avg_intensity: Reading::from_value(intensity.and_then(|i| i.get("avg_intensity"))),
            min_intensity: Reading::from_value(intensity.and_then(|i| i.get("min_intensity"))),
            max_intensity: Reading::from_value(intensity.and_then(|i| i.get("max_intensity"))),
            area_percentage,
            coverage,
        }
    }

    /// The intensity statistics that were published, labelled.
    pub fn intensities(&self) -> Vec<(&'static str, &Reading)> {
        [
            ("Average intensity", &self.avg_intensity),
            ("Minimum intensity", &self.min_intensity),
            ("Maximum intensity", &self.max_intensity),
        ]
        .into_iter()
        .filter(|(_, reading)| reading.is_present())
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EstrogenReceptorView {
    pub blue_cell_count: Reading,
    pub brown_cell_count: Reading,
    pub staining_score: Reading,
    pub intensity_score: Reading,
    pub total_score: Reading,
    pub stain_intensity: Reading,
    pub area_share: Share,
    pub outcome: Reading,
}

impl EstrogenReceptorView {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let map = Some(metrics);
        let blue_area = Reading::number_or(map, "blue_area_percent", 0.0);
        let brown_area = Reading::number_or(map, "brown_area_percent", 0.0);
        Self {
            blue_cell_count: Reading::number_or(map, "blue_cell_count", 0.0),
            brown_cell_count: Reading::number_or(map, "brown_cell_count", 0.0),
            staining_score: Reading::text_or_placeholder(map, "staining_score"),
            intensity_score: Reading::text_or_placeholder(map, "intensity_score"),
            total_score: Reading::text_or_placeholder(map, "total_score"),
            stain_intensity: Reading::text_or_placeholder(map, "stain_intensity"),
            area_share: Share::of_pair(
                ("Blue", blue_area.as_f64().unwrap_or(0.0)),
                ("Brown", brown_area.as_f64().unwrap_or(0.0)),
            ),
            outcome: Reading::text_or_placeholder(map, "outcome"),
        }
    }

    pub fn stain_intensity_text(&self) -> String {
        self.stain_intensity.fixed(3)
    }

    /// Emphasis keyed by the literal outcome label.
    pub fn outcome_emphasis(&self) -> Emphasis {
        match self.outcome.as_str() {
            Some("Positive") => Emphasis::Strong,
            Some("Low Positive") => Emphasis::Moderate,
            _ => Emphasis::Weak,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TubuleView {
    /// Tubule area as a fraction of the analysed patch (0..1).
    pub tubule_fraction: Reading,
    pub score: Reading,
}

impl TubuleView {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        Self {
            tubule_fraction: Reading::number_or(Some(metrics), "tubule_fraction", 0.0),
            score: Reading::text_or_placeholder(Some(metrics), "nottingham_tubule_score"),
        }
    }

    pub fn percentage_text(&self) -> String {
        match self.tubule_fraction {
            Reading::Number(fraction) => format!("{:.2}%", fraction * 100.0),
            ref other => other.to_string(),
        }
    }

    pub fn share(&self) -> Share {
        let percent = self.tubule_fraction.as_f64().unwrap_or(0.0) * 100.0;
        Share::of_percent("Tubule", "Other", percent)
    }
}

/// Labels and keys of the nested `pleomorphism_metrics` block.
pub const PLEOMORPHISM_STATS: [(&str, &str); 13] = [
    ("Total nuclei", "total_nuclei"),
    ("Mean area", "mean_area"),
    ("Area CV", "area_cv"),
    ("Diameter CV", "diameter_cv"),
    ("Mean circularity", "mean_circularity"),
    ("Circularity std", "circularity_std"),
    ("Mean solidity", "mean_solidity"),
    ("Mean eccentricity", "mean_eccentricity"),
    ("Aspect ratio CV", "aspect_ratio_cv"),
    ("Intensity variation", "intensity_variation"),
    ("Size score", "size_score"),
    ("Shape score", "shape_score"),
    ("Texture score", "texture_score"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct PleomorphismView {
    pub nuclei_count: Reading,
    pub mask_area: Reading,
    pub score: Reading,
    pub grade: Reading,
    pub stats: Vec<(&'static str, Reading)>,
    pub subscores: Vec<Bar>,
}

impl PleomorphismView {
    pub fn from_metrics(metrics: &Metrics) -> Self {
        let map = Some(metrics);
        let nested = section(map, "pleomorphism_metrics");
        let stats = PLEOMORPHISM_STATS
            .iter()
            .map(|(label, key)| (*label, Reading::text_or_placeholder(nested, key)))
            .collect();
        let subscore = |key: &str| Reading::from_value(nested.and_then(|n| n.get(key))).as_f64();
        let subscores = vec![
            Bar {
                label: "Size",
                value: subscore("size_score").unwrap_or(0.0),
            },
            Bar {
                label: "Shape",
                value: subscore("shape_score").unwrap_or(0.0),
            },
            Bar {
                label: "Texture",
                value: subscore("texture_score").unwrap_or(0.0),
            },
        ];
        Self {
            nuclei_count: Reading::number_or(map, "nuclei_count", 0.0),
            mask_area: Reading::number_or(map, "mask_area", 0.0),
            score: Reading::text_or_placeholder(map, "pleomorphism_score"),
            grade: Reading::text_or_placeholder(map, "pleomorphism_grade"),
            stats,
            subscores,
        }
    }

    pub fn score_text(&self) -> String {
        self.score.fixed(3)
    }

    /// Emphasis keyed by the grade named inside the grade label.
    pub fn grade_emphasis(&self) -> Emphasis {
        let grade = self.grade.as_str().unwrap_or_default();
        if grade.contains("Grade 3") {
            Emphasis::Strong
        } else if grade.contains("Grade 2") {
            Emphasis::Moderate
        } else {
            Emphasis::Weak
        }
    }
}
