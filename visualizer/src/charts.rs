use crate::app::Message;
use iced::{
    mouse,
    widget::canvas::{self, path::Arc, Frame, Geometry, Path, Stroke},
    Color, Pixels, Point, Radians, Rectangle, Renderer, Theme,
};
use pathocore::metrics::reading::{Bar, Share};
use std::f32::consts::PI;

const BACKGROUND: Color = Color::from_rgb(0.05, 0.05, 0.05);
const LABEL: Color = Color::from_rgb(0.8, 0.8, 0.85);

/// Categorical bar series with value labels.
#[derive(Clone)]
pub struct BarChart {
    bars: Vec<Bar>,
    color: Color,
}

impl BarChart {
    pub fn new(bars: &[Bar], color: Color) -> Self {
        Self {
            bars: bars.to_vec(),
            color,
        }
    }
}

impl canvas::Program<Message> for BarChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        if !self.bars.is_empty() {
            let max = self
                .bars
                .iter()
                .map(|bar| bar.value as f32)
                .fold(0.0, f32::max)
                .max(f32::EPSILON);
            let label_band = 18.0;
            let top_band = 16.0;
            let plot_height = (bounds.height - label_band - top_band).max(1.0);
            let slot = bounds.width / self.bars.len() as f32;
            let bar_width = slot * 0.6;

            for (idx, bar) in self.bars.iter().enumerate() {
                let value = (bar.value as f32).max(0.0);
                let height = value / max * plot_height;
                let x = idx as f32 * slot + (slot - bar_width) / 2.0;
                let y = top_band + plot_height - height;
                frame.fill_rectangle(
                    Point::new(x, y),
                    iced::Size::new(bar_width, height),
                    self.color,
                );
                frame.fill_text(canvas::Text {
                    content: format_bar_value(bar.value),
                    position: Point::new(x, (y - 14.0).max(0.0)),
                    color: LABEL,
                    size: Pixels(12.0),
                    ..canvas::Text::default()
                });
                frame.fill_text(canvas::Text {
                    content: bar.label.to_string(),
                    position: Point::new(x, bounds.height - label_band + 2.0),
                    color: LABEL,
                    size: Pixels(12.0),
                    ..canvas::Text::default()
                });
            }
        }

        vec![frame.into_geometry()]
    }
}

fn format_bar_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Two-slice pie with a legend.
#[derive(Clone)]
pub struct SharePie {
    share: Share,
    colors: (Color, Color),
}

impl SharePie {
    pub fn new(share: &Share, colors: (Color, Color)) -> Self {
        Self {
            share: share.clone(),
            colors,
        }
    }
}

impl canvas::Program<Message> for SharePie {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND);

        let radius = (bounds.height / 2.0 - 12.0).max(4.0);
        let center = Point::new(radius + 12.0, bounds.height / 2.0);

        if self.share.total() > 0.0 {
            let split = self.share.first_fraction() as f32 * 2.0 * PI;
            let slices = [
                (-PI / 2.0, -PI / 2.0 + split, self.colors.0),
                (-PI / 2.0 + split, 3.0 * PI / 2.0, self.colors.1),
            ];
            for (start, end, color) in slices {
                if end - start <= f32::EPSILON {
                    continue;
                }
                let wedge = Path::new(|builder| {
                    builder.arc(Arc {
                        center,
                        radius,
                        start_angle: Radians(start),
                        end_angle: Radians(end),
                    });
                    builder.line_to(center);
                    builder.close();
                });
                frame.fill(&wedge, color);
            }
        } else {
            let outline = Path::circle(center, radius);
            frame.stroke(
                &outline,
                Stroke::default().with_color(Color::from_rgb(0.25, 0.25, 0.3)),
            );
        }

        let legend_x = center.x + radius + 16.0;
        let entries = [
            (&self.share.first, self.colors.0),
            (&self.share.second, self.colors.1),
        ];
        for (row, (slice, color)) in entries.into_iter().enumerate() {
            let y = center.y - 14.0 + row as f32 * 20.0;
            frame.fill_rectangle(Point::new(legend_x, y), iced::Size::new(10.0, 10.0), color);
            frame.fill_text(canvas::Text {
                content: format!("{} {:.1}%", slice.label, slice.value),
                position: Point::new(legend_x + 16.0, y - 3.0),
                color: LABEL,
                size: Pixels(13.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_values_drop_decimals_when_integral() {
        assert_eq!(format_bar_value(21.0), "21");
        assert_eq!(format_bar_value(0.8), "0.80");
    }
}
