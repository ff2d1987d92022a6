//! Chart model for the live price view
//!
//! `ChartOptions` is the initial configuration of a chart; `Chart` is an
//! in-memory chart built from it. Renderers implement [`LiveChart`] so the
//! ticker feed can append points without knowing how they are drawn.

use serde::{Deserialize, Serialize};

/// A single (x, y) data point; x is an epoch in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: f64,
}

impl Point {
    pub fn new(x: i64, y: f64) -> Self {
        Self { x, y }
    }
}

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Area,
    Line,
    Scatter,
}

/// Initial configuration of one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOptions {
    pub name: String,
    pub kind: SeriesKind,
    #[serde(default)]
    pub data: Vec<Point>,
}

impl SeriesOptions {
    pub fn new(name: impl Into<String>, kind: SeriesKind) -> Self {
        Self {
            name: name.into(),
            kind,
            data: Vec::new(),
        }
    }
}

/// Initial configuration of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Zoom along the x (time) axis
    #[serde(default)]
    pub zoom_x: bool,
    #[serde(default)]
    pub y_axis_title: Option<String>,
    pub series: Vec<SeriesOptions>,
}

impl ChartOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            zoom_x: false,
            y_axis_title: None,
            series: Vec::new(),
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_zoom_x(mut self) -> Self {
        self.zoom_x = true;
        self
    }

    pub fn with_y_axis_title(mut self, title: impl Into<String>) -> Self {
        self.y_axis_title = Some(title.into());
        self
    }

    pub fn with_series(mut self, series: SeriesOptions) -> Self {
        self.series.push(series);
        self
    }

    /// Options of the dashboard price chart for a `from-to` product
    ///
    /// Series 0 is the live price area; series 1 holds campaign markers.
    pub fn price_chart(from: &str, to: &str) -> Self {
        Self::new(format!(
            "{} to {} exchange rate over time",
            from.to_ascii_uppercase(),
            to.to_ascii_uppercase()
        ))
        .with_subtitle("Click and drag in the plot area to zoom in")
        .with_zoom_x()
        .with_y_axis_title("Price")
        .with_series(SeriesOptions::new(
            format!("{} to {}", from.to_ascii_uppercase(), to.to_ascii_uppercase()),
            SeriesKind::Area,
        ))
        .with_series(SeriesOptions::new("Campaigns", SeriesKind::Scatter))
    }
}

/// A chart that accepts new points after it has been initialized
pub trait LiveChart: Send + 'static {
    /// Append a point to the given series
    ///
    /// Returns `false` when the series does not exist.
    fn add_point(&mut self, series: usize, point: Point) -> bool;
}

/// In-memory chart built from [`ChartOptions`]
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    options: ChartOptions,
}

impl Chart {
    pub fn new(options: ChartOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Points of a series, if it exists
    pub fn points(&self, series: usize) -> Option<&[Point]> {
        self.options.series.get(series).map(|s| s.data.as_slice())
    }

    /// Last point of a series
    pub fn last_point(&self, series: usize) -> Option<Point> {
        self.points(series).and_then(|p| p.last().copied())
    }
}

impl LiveChart for Chart {
    fn add_point(&mut self, series: usize, point: Point) -> bool {
        match self.options.series.get_mut(series) {
            Some(s) => {
                s.data.push(point);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_chart_options() {
        let options = ChartOptions::price_chart("btc", "eur");
        assert_eq!(options.title, "BTC to EUR exchange rate over time");
        assert!(options.zoom_x);
        assert_eq!(options.series.len(), 2);
        assert_eq!(options.series[0].kind, SeriesKind::Area);
        assert_eq!(options.series[1].kind, SeriesKind::Scatter);
        assert!(options.series.iter().all(|s| s.data.is_empty()));
    }

    #[test]
    fn test_add_point() {
        let mut chart = Chart::new(ChartOptions::price_chart("btc", "eur"));
        assert!(chart.add_point(0, Point::new(1, 10.0)));
        assert!(chart.add_point(0, Point::new(2, 11.0)));
        assert!(!chart.add_point(5, Point::new(3, 12.0)));

        assert_eq!(chart.points(0).map(<[Point]>::len), Some(2));
        assert_eq!(chart.last_point(0), Some(Point::new(2, 11.0)));
        assert_eq!(chart.points(1).map(<[Point]>::len), Some(0));
    }
}
