//! Terminal rendering of charts
//!
//! Each chart is drawn with ratatui widgets into an off-screen [`Buffer`],
//! then the buffer is written line by line to the output.

use super::{BoxStats, Chart, ChartRenderer, HistogramBin};
use crate::error::Result;
use colored::*;
use ratatui::{
    buffer::{Buffer, Cell as BufferCell},
    layout::{Constraint, Direction, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Cell, Chart as LineChart, Dataset, GraphType, Row,
        Table, Widget,
    },
};
use std::io::{self, Write};

const ACCENT: Color = Color::Rgb(120, 170, 255);
const MUTED: Color = Color::Rgb(140, 140, 140);
const MEDIAN: Color = Color::Rgb(255, 200, 90);
const SHADES: [&str; 5] = [" ", "░", "▒", "▓", "█"];

const LABEL_WIDTH: u16 = 16;
const CELL_WIDTH: u16 = 8;

fn title_block(title: &str) -> Block<'_> {
    Block::bordered()
        .border_style(Style::default().fg(MUTED))
        .title(Span::styled(
            format!(" {} ", title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
}

fn muted() -> Style {
    Style::default().fg(MUTED)
}

/// Diverging red/blue scale for values in `[-1, 1]`
fn diverging(value: f64) -> Style {
    if !value.is_finite() {
        return muted();
    }
    let t = value.clamp(-1.0, 1.0);
    let level = (t.abs() * 155.0) as u8;
    let color = if t >= 0.0 {
        Color::Rgb(100 + level, 100, 100)
    } else {
        Color::Rgb(100, 100, 100 + level)
    };
    Style::default().fg(color)
}

/// Horizontal box-and-whisker rows, one per category
struct BoxPlotWidget<'a> {
    title: &'a str,
    x_label: &'a str,
    boxes: &'a [BoxStats],
}

impl Widget for BoxPlotWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (lo, hi) = bounds(
            self.boxes
                .iter()
                .flat_map(|b| [b.min, b.max])
                .filter(|v| v.is_finite()),
        );
        let block = title_block(self.title).title_bottom(Span::styled(
            format!(" {}: {:.3} … {:.3} ", self.x_label, lo, hi),
            muted(),
        ));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.boxes.is_empty() {
            buf.set_string(inner.x, inner.y, "(no data)", muted());
            return;
        }

        let stats_width: u16 = 10;
        let plot_left = inner.x + LABEL_WIDTH;
        let plot_width = inner.width.saturating_sub(LABEL_WIDTH + stats_width).max(2);
        let to_x = |v: f64| plot_left + scale(v, lo, hi, plot_width as usize) as u16;

        let whisker = muted();
        let body = Style::default().fg(ACCENT);
        let median = Style::default().fg(MEDIAN).add_modifier(Modifier::BOLD);

        for (row, b) in self.boxes.iter().enumerate().take(inner.height as usize) {
            let y = inner.y + row as u16;
            buf.set_stringn(inner.x, y, &b.label, (LABEL_WIDTH - 1) as usize, Style::default());

            let (x_min, x_q1, x_med, x_q3, x_max) =
                (to_x(b.min), to_x(b.q1), to_x(b.median), to_x(b.q3), to_x(b.max));
            for x in x_min..=x_max {
                buf.set_string(x, y, "─", whisker);
            }
            for x in x_q1..=x_q3 {
                buf.set_string(x, y, "█", body);
            }
            buf.set_string(x_min, y, "├", whisker);
            buf.set_string(x_max, y, "┤", whisker);
            buf.set_string(x_med, y, "┃", median);
            buf.set_string(plot_left + plot_width + 1, y, format!("n={}", b.count), muted());
        }
    }
}

/// Draws charts into a writer
pub struct TerminalRenderer<W: Write> {
    out: W,
    /// Total chart width, in columns
    width: u16,
    /// Scatter plot height, in rows
    height: u16,
    color: bool,
}

impl TerminalRenderer<io::Stdout> {
    /// Renderer writing to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer over `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: 78,
            height: 16,
            color: true,
        }
    }

    /// Set the chart width
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.clamp(32, 400) as u16;
        self
    }

    /// Set the scatter plot height
    pub fn with_height(mut self, height: usize) -> Self {
        self.height = height.clamp(4, 200) as u16;
        self
    }

    /// Enable or disable ANSI colours
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Consume the renderer, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, cell: &BufferCell) -> String {
        let symbol = cell.symbol();
        match (self.color, cell.fg) {
            (true, Color::Rgb(r, g, b)) => symbol.truecolor(r, g, b).to_string(),
            _ => symbol.to_string(),
        }
    }

    /// Render `widget` into a `width × height` buffer and write it out
    fn draw<T: Widget>(&mut self, widget: T, width: u16, height: u16) -> io::Result<()> {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        for y in area.top()..area.bottom() {
            let line: String = (area.left()..area.right())
                .filter_map(|x| buf.cell((x, y)))
                .map(|cell| self.paint(cell))
                .collect();
            writeln!(self.out, "{}", line.trim_end())?;
        }
        Ok(())
    }

    fn bar_chart(&mut self, title: &str, x_label: &str, bars: Vec<(String, u64)>) -> io::Result<()> {
        if bars.is_empty() {
            return self.draw(title_block(title), self.width, 3);
        }
        let bars: Vec<Bar> = bars
            .into_iter()
            .map(|(label, count)| {
                Bar::default()
                    .label(Line::from(label))
                    .value(count)
                    .text_value(count.to_string())
            })
            .collect();
        let height = bars.len() as u16 + 2;
        let chart = BarChart::default()
            .block(title_block(title).title_bottom(Span::styled(format!(" {} ", x_label), muted())))
            .direction(Direction::Horizontal)
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(ACCENT))
            .value_style(Style::default().add_modifier(Modifier::BOLD))
            .data(BarGroup::default().bars(&bars));
        self.draw(chart, self.width, height)
    }

    fn histogram(&mut self, title: &str, x_label: &str, bins: &[HistogramBin]) -> io::Result<()> {
        let bars = bins
            .iter()
            .map(|b| (format!("{:.3} – {:.3}", b.lower, b.upper), b.count as u64))
            .collect();
        self.bar_chart(title, x_label, bars)
    }

    fn scatter(
        &mut self,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
    ) -> io::Result<()> {
        let finite: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        let (x_min, x_max) = padded(bounds(finite.iter().map(|p| p.0)));
        let (y_min, y_max) = padded(bounds(finite.iter().map(|p| p.1)));

        let dataset = Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(ACCENT))
            .data(&finite);

        let chart = LineChart::new(vec![dataset])
            .block(title_block(title).title_bottom(Span::styled(
                format!(" {} points ", finite.len()),
                muted(),
            )))
            .x_axis(
                Axis::default()
                    .title(Span::styled(x_label, muted()))
                    .style(muted())
                    .bounds([x_min, x_max])
                    .labels(vec![
                        Span::styled(format!("{:.3}", x_min), muted()),
                        Span::styled(format!("{:.3}", x_max), muted()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled(y_label, muted()))
                    .style(muted())
                    .bounds([y_min, y_max])
                    .labels(vec![
                        Span::styled(format!("{:.3}", y_min), muted()),
                        Span::styled(format!("{:.3}", y_max), muted()),
                    ]),
            );
        self.draw(chart, self.width, self.height + 2)
    }

    fn box_plot(&mut self, title: &str, x_label: &str, y_label: &str, boxes: &[BoxStats]) -> io::Result<()> {
        let widget = BoxPlotWidget {
            title,
            x_label: y_label,
            boxes,
        };
        let height = boxes.len().max(1) as u16 + 2;
        self.draw(widget, self.width, height)?;
        writeln!(self.out, "  categories: {}", x_label)
    }

    fn heatmap(
        &mut self,
        title: &str,
        row_labels: &[String],
        col_labels: &[String],
        values: &[Vec<f64>],
        annotate: bool,
    ) -> io::Result<()> {
        let cell_width = if annotate { CELL_WIDTH } else { 1 };
        let widths: Vec<Constraint> = std::iter::once(Constraint::Length(LABEL_WIDTH))
            .chain(col_labels.iter().map(|_| Constraint::Length(cell_width)))
            .collect();

        let rows = row_labels.iter().zip(values).map(|(label, row)| {
            let cells = row.iter().map(|&v| {
                if annotate {
                    let text = if v.is_finite() {
                        format!("{:>7.2}", v)
                    } else {
                        format!("{:>7}", "NaN")
                    };
                    Cell::from(text).style(diverging(v))
                } else {
                    let idx = if v.is_finite() {
                        (v.clamp(0.0, 1.0) * (SHADES.len() - 1) as f64).round() as usize
                    } else {
                        0
                    };
                    Cell::from(SHADES[idx]).style(Style::default().fg(ACCENT))
                }
            });
            Row::new(std::iter::once(Cell::from(label.as_str())).chain(cells))
        });

        let mut table = Table::new(rows, widths)
            .block(title_block(title))
            .column_spacing(if annotate { 1 } else { 0 });
        let mut height = row_labels.len() as u16 + 2;
        if annotate {
            let header = std::iter::once(Cell::from(""))
                .chain(col_labels.iter().map(|c| Cell::from(format!("{:>7}", c))))
                .map(|c| c.style(muted()));
            table = table.header(Row::new(header));
            height += 1;
        }

        let needed = LABEL_WIDTH + (cell_width + u16::from(annotate)) * col_labels.len() as u16 + 3;
        self.draw(table, needed.max(self.width), height)?;
        if !annotate {
            writeln!(self.out, "  columns: {}", col_labels.join(", "))?;
        }
        Ok(())
    }

    fn table(&mut self, title: &str, rows: &[(String, String)]) -> io::Result<()> {
        let key_width = rows
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0)
            .clamp(8, 40) as u16;
        let body = rows
            .iter()
            .map(|(k, v)| Row::new(vec![Cell::from(k.as_str()), Cell::from(v.as_str())]));
        let table = Table::new(body, [Constraint::Length(key_width), Constraint::Fill(1)])
            .block(title_block(title))
            .column_spacing(2);
        self.draw(table, self.width, rows.len() as u16 + 2)
    }
}

impl<W: Write> ChartRenderer for TerminalRenderer<W> {
    fn render(&mut self, chart: &Chart) -> Result<()> {
        match chart {
            Chart::Histogram { title, x_label, bins } => self.histogram(title, x_label, bins)?,
            Chart::Bar { title, x_label, bars } => {
                let bars = bars.iter().map(|(l, c)| (l.clone(), *c as u64)).collect();
                self.bar_chart(title, x_label, bars)?
            }
            Chart::Scatter {
                title,
                x_label,
                y_label,
                points,
            } => self.scatter(title, x_label, y_label, points)?,
            Chart::BoxPlot {
                title,
                x_label,
                y_label,
                boxes,
            } => self.box_plot(title, x_label, y_label, boxes)?,
            Chart::Heatmap {
                title,
                row_labels,
                col_labels,
                values,
                annotate,
            } => self.heatmap(title, row_labels, col_labels, values, *annotate)?,
            Chart::Table { title, rows } => self.table(title, rows)?,
            Chart::Grid { title, charts } => {
                writeln!(self.out)?;
                writeln!(self.out, "  {}", title)?;
                for chart in charts {
                    self.render(chart)?;
                }
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo > hi {
        (0.0, 0.0)
    } else {
        (lo, hi)
    }
}

/// Widen degenerate axis bounds so the chart has a non-empty range
fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

/// Map `v` in `[lo, hi]` onto a cell index in `0..n`
fn scale(v: f64, lo: f64, hi: f64, n: usize) -> usize {
    if hi <= lo || !v.is_finite() || n == 0 {
        return 0;
    }
    let t = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((t * (n - 1) as f64).round() as usize).min(n - 1)
}
