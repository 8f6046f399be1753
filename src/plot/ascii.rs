//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`
//! - trend line: `-`
//! - peak annotations: `P`
//! - residual scatter: `o` around a `-` zero line

use super::{Figure, ResidualFigure, TimeSeriesFigure};

/// Render any figure to a fixed-size character grid. Figures without a
/// batch rendering (heatmap, distribution panels) fall back to their title.
pub fn render_figure(figure: &Figure, width: usize, height: usize) -> String {
    match figure {
        Figure::TimeSeries(f) => render_time_series(f, width, height),
        Figure::Residual(f) => render_residuals(f, width, height),
        Figure::Placeholder { title, message } => format!("{title}: {message}\n"),
        other => format!("{} (interactive view only)\n", other.title()),
    }
}

/// Usage over time with the fitted trend and `P` markers on the peaks.
pub fn render_time_series(figure: &TimeSeriesFigure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max)) = x_range(&figure.points) else {
        return format!("{}: no data\n", figure.title);
    };
    let (y_min, y_max) = y_range(&figure.points, &figure.trend).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Trend first so observations overlay it.
    draw_polyline(&mut grid, &figure.trend, x_min, x_max, y_min, y_max, '-');

    for &(x, y) in &figure.points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }
    for &(x, y) in &figure.peaks {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'P';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}: rows=[{x_min:.0}, {x_max:.0}] | usage=[{y_min:.2}, {y_max:.2}]\n",
        figure.title
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Residuals against predictions, with a dashed zero line.
pub fn render_residuals(figure: &ResidualFigure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_min, x_max)) = x_range(&figure.residual_vs_predicted) else {
        return format!("{}: no data\n", figure.title);
    };
    let (y_min, y_max) = y_range(&figure.residual_vs_predicted, &[]).unwrap_or((-1.0, 1.0));
    let (y_min, y_max) = pad_range(y_min.min(0.0), y_max.max(0.0), 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let zero_row = map_y(0.0, y_min, y_max, height);
    for col in (0..width).step_by(2) {
        grid[zero_row][col] = '-';
    }

    for &(x, y) in &figure.residual_vs_predicted {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}: predicted=[{x_min:.2}, {x_max:.2}] | residual=[{y_min:.2}, {y_max:.2}]\n",
        figure.title
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

fn x_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(points: &[(f64, f64)], overlay: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(_, y) in points.iter().chain(overlay) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(
    grid: &mut [Vec<char>],
    points: &[(f64, f64)],
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    ch: char,
) {
    if points.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, ch);
        } else {
            grid[row][col] = ch;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_series_golden_snapshot_small() {
        let figure = TimeSeriesFigure {
            title: "usage".to_string(),
            points: vec![(0.0, 100.0), (9.0, 110.0)],
            trend: vec![(0.0, 100.0), (9.0, 100.0)],
            peaks: vec![(9.0, 110.0)],
        };

        let txt = render_time_series(&figure, 10, 5);
        let expected = concat!(
            "usage: rows=[0, 9] | usage=[99.50, 110.50]\n",
            "         P\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_figure_degrades_to_a_message() {
        let figure = TimeSeriesFigure {
            title: "usage".to_string(),
            points: Vec::new(),
            trend: Vec::new(),
            peaks: Vec::new(),
        };
        assert_eq!(render_time_series(&figure, 40, 10), "usage: no data\n");
    }

    #[test]
    fn placeholder_renders_title_and_message() {
        let f = Figure::placeholder("Model diagnostics", "model training failed");
        assert_eq!(
            render_figure(&f, 40, 10),
            "Model diagnostics: model training failed\n"
        );
    }
}
