use crate::app::Message;
use crate::charts::{BarChart, SharePie};
use iced::widget::{canvas::Canvas, column, row, text, Column};
use iced::{Color, Element, Length};
use pathocore::metrics::reading::{Bar, Emphasis, Reading, Share};
use pathocore::metrics::views::{
    CellCountView, EstrogenReceptorView, FluorescenceView, PleomorphismView, TubuleView,
};
use pathocore::metrics::Visualization;

const BAR_BLUE: Color = Color::from_rgb(0.18, 0.72, 0.89);
const BAR_PURPLE: Color = Color::from_rgb(0.61, 0.35, 0.71);
const STAIN_BLUE: Color = Color::from_rgb(0.2, 0.4, 0.9);
const STAIN_BROWN: Color = Color::from_rgb(0.55, 0.34, 0.16);
const COVERED: Color = Color::from_rgb(0.18, 0.8, 0.44);
const UNCOVERED: Color = Color::from_rgb(0.3, 0.3, 0.35);

/// Renders the dispatched visualization for the metrics panel.
pub fn metrics_panel<'a>(visualization: Visualization) -> Element<'a, Message> {
    if let Some(placeholder) = visualization.placeholder() {
        return column![text(placeholder).size(16)].padding(6).into();
    }
    let panel = match visualization {
        Visualization::CellCount(view) => cell_count(view),
        Visualization::Fluorescence(view) => fluorescence(view),
        Visualization::EstrogenReceptor(view) => estrogen_receptor(view),
        Visualization::NottinghamTubule(view) => tubule(view),
        Visualization::NuclearPleomorphism(view) => pleomorphism(view),
        _ => Column::new(),
    };
    panel.spacing(8).padding(6).into()
}

fn cell_count<'a>(view: CellCountView) -> Column<'a, Message> {
    let mut panel = column![stat("Cells detected", view.cell_count.to_string())];
    if let Some(series) = &view.size_series {
        panel = panel
            .push(text("Cell size distribution (px)").size(14))
            .push(bar_chart(series, BAR_BLUE));
    }
    panel
}

fn fluorescence<'a>(view: FluorescenceView) -> Column<'a, Message> {
    let panel = view
        .intensities()
        .into_iter()
        .fold(Column::new(), |panel, (label, reading)| {
            panel.push(stat(label, reading.to_string()))
        });
    panel
        .push(stat("Area coverage", percent(&view.area_percentage)))
        .push(pie(&view.coverage, (COVERED, UNCOVERED)))
}

fn estrogen_receptor<'a>(view: EstrogenReceptorView) -> Column<'a, Message> {
    column![
        stat("Blue cells", view.blue_cell_count.to_string()),
        stat("Brown cells", view.brown_cell_count.to_string()),
        stat("Staining score", view.staining_score.to_string()),
        stat("Intensity score", view.intensity_score.to_string()),
        stat("Total score", view.total_score.to_string()),
        stat("Stain intensity", view.stain_intensity_text()),
        emphasized("Outcome", view.outcome.to_string(), view.outcome_emphasis()),
        text("Stained area by color").size(14),
        pie(&view.area_share, (STAIN_BLUE, STAIN_BROWN)),
    ]
}

fn tubule<'a>(view: TubuleView) -> Column<'a, Message> {
    column![
        stat("Tubule area", view.percentage_text()),
        stat("Tubule score", view.score.to_string()),
        pie(&view.share(), (COVERED, UNCOVERED)),
    ]
}

fn pleomorphism<'a>(view: PleomorphismView) -> Column<'a, Message> {
    let panel = column![
        stat("Nuclei detected", view.nuclei_count.to_string()),
        stat("Mask area (px)", view.mask_area.to_string()),
        stat("Pleomorphism score", view.score_text()),
        emphasized("Grade", view.grade.to_string(), view.grade_emphasis()),
        text("Subscores").size(14),
        bar_chart(&view.subscores, BAR_PURPLE),
        text("Nuclear statistics").size(14),
    ];
    view.stats
        .iter()
        .fold(panel, |panel, (label, reading)| panel.push(stat(label, compact(reading))))
}

fn stat<'a>(label: &str, value: String) -> Element<'a, Message> {
    row![
        text(format!("{label}:")).size(14).width(Length::Fixed(170.0)),
        text(value).size(14),
    ]
    .spacing(8)
    .into()
}

fn emphasized<'a>(label: &str, value: String, emphasis: Emphasis) -> Element<'a, Message> {
    row![
        text(format!("{label}:")).size(14).width(Length::Fixed(170.0)),
        text(value).size(15).color(emphasis_color(emphasis)),
    ]
    .spacing(8)
    .into()
}

fn bar_chart<'a>(bars: &[Bar], color: Color) -> Element<'a, Message> {
    Canvas::new(BarChart::new(bars, color))
        .width(Length::Fill)
        .height(Length::Fixed(180.0))
        .into()
}

fn pie<'a>(share: &Share, colors: (Color, Color)) -> Element<'a, Message> {
    Canvas::new(SharePie::new(share, colors))
        .width(Length::Fill)
        .height(Length::Fixed(160.0))
        .into()
}

fn emphasis_color(emphasis: Emphasis) -> Color {
    match emphasis {
        Emphasis::Strong => Color::from_rgb(0.91, 0.3, 0.24),
        Emphasis::Moderate => Color::from_rgb(0.95, 0.61, 0.07),
        Emphasis::Weak => Color::from_rgb(0.18, 0.8, 0.44),
    }
}

/// Two-decimal percentage for numbers, raw text otherwise.
fn percent(reading: &Reading) -> String {
    match reading.as_f64() {
        Some(value) => format!("{value:.2}%"),
        None => reading.to_string(),
    }
}

/// Integers as-is, other numbers to three decimals.
fn compact(reading: &Reading) -> String {
    match reading.as_f64() {
        Some(value) if value.fract() != 0.0 => reading.fixed(3),
        _ => reading.to_string(),
    }
}
