use pathocore::api::{ActiveSettings, PipelineDescriptor, PipelineList};
use pathocore::Params;
use serde_json::{json, Value};
use std::collections::HashMap;

/// OpenCV's JET colormap index, the fluorescence default.
const COLORMAP_JET: i64 = 2;

fn descriptor(
    name: &str,
    display_name: &str,
    description: &str,
    entries: &[(&str, Value, &str)],
) -> PipelineDescriptor {
    let mut default_params = Params::new();
    let mut param_descriptions = HashMap::new();
    for (param, default, help) in entries {
        default_params.insert(param.to_string(), default.clone());
        param_descriptions.insert(param.to_string(), help.to_string());
    }
    PipelineDescriptor {
        name: name.into(),
        display_name: display_name.into(),
        description: description.into(),
        default_params,
        param_descriptions,
    }
}

/// The five analysis pipelines with their published defaults and help texts.
pub fn builtin_pipelines() -> PipelineList {
    let pipelines = vec![
        descriptor(
            "cell_count",
            "Cell Count Overlay",
            "Detects and counts cells in microscope images",
            &[
                ("threshold", json!(128), "Threshold value for binary conversion (0-255)"),
                ("min_size", json!(50), "Minimum cell size in pixels"),
                ("max_size", json!(1000), "Maximum cell size in pixels"),
                ("show_contours", json!(true), "Whether to draw contours around detected cells"),
                ("contour_color", json!([0, 255, 0]), "RGB color for contours"),
                ("show_count", json!(true), "Whether to show the cell count on the image"),
                ("count_position", json!([10, 30]), "Position [x, y] to display the count"),
                ("font_scale", json!(1.0), "Scale of the font for the count"),
                ("font_color", json!([255, 255, 255]), "RGB color for the count text"),
            ],
        ),
        descriptor(
            "fluorescence",
            "Fluorescence Detection",
            "Detects and measures fluorescence intensity in microscope images",
            &[
                ("threshold", json!(50), "Threshold value for fluorescence detection (0-255)"),
                ("color_map", json!(COLORMAP_JET), "OpenCV colormap to apply (0-21)"),
                ("alpha", json!(0.5), "Transparency of the overlay (0.0-1.0)"),
                ("show_intensity", json!(true), "Whether to show the intensity value on the image"),
                ("intensity_position", json!([10, 30]), "Position [x, y] to display the intensity"),
                ("font_scale", json!(1.0), "Scale of the font for the intensity"),
                ("font_color", json!([255, 255, 255]), "RGB color for the intensity text"),
            ],
        ),
        descriptor(
            "estrogen_receptor",
            "Estrogen Receptor Overlay",
            "Detects and scores estrogen receptor (ER) staining in microscope images.",
            &[
                ("min_size", json!(50), "Minimum object size in pixels"),
                ("max_eccentricity", json!(0.9), "Maximum eccentricity for round objects"),
                ("show_contours", json!(true), "Whether to draw contours around detected cells"),
                ("contour_color_blue", json!([0, 0, 255]), "RGB color for blue cell contours"),
                (
                    "contour_color_brown",
                    json!([255, 255, 255]),
                    "RGB color for brown cell contours",
                ),
            ],
        ),
        descriptor(
            "nottingham_tubule",
            "Nottingham Tubular Formation",
            "Segments tubule regions and computes Nottingham tubule score.",
            &[
                ("min_size", json!(500), "Minimum object size in pixels for cleaning mask."),
                ("hole_size", json!(500), "Maximum hole size to fill in mask."),
                ("threshold", json!(0.5), "Threshold for mask binarization (0-1)."),
            ],
        ),
        descriptor(
            "nuclear_pleomorphism",
            "Nottingham Nuclear Pleomorphism",
            "Segments nuclei and outputs the segmentation mask for nuclear pleomorphism scoring.",
            &[
                ("min_size", json!(50), "Minimum object size in pixels for cleaning mask."),
                ("threshold", json!(0.3), "Threshold for mask binarization (0-1)."),
            ],
        ),
    ];
    PipelineList { pipelines }
}

/// Settings for `name` with its default parameters, if it is registered.
pub fn default_settings(catalog: &PipelineList, name: &str) -> Option<ActiveSettings> {
    catalog
        .find(name)
        .map(|descriptor| ActiveSettings::new(name, descriptor.default_params.clone()))
}
