//! Chart renderers: draw composed dashboard series as plain text.
//!
//! Widgets are rendered into an off-screen ratatui `Buffer` and read back
//! line by line, so no terminal mode switching is needed.

use finsight_core::{CategorySlice, FlowPoint, Summary};
use ratatui::buffer::Buffer;
use ratatui::layout::{Direction, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Widget};

const PALETTE: [Color; 7] = [
    Color::Blue,
    Color::Green,
    Color::Red,
    Color::Yellow,
    Color::Magenta,
    Color::LightMagenta,
    Color::Cyan,
];

pub fn render_summary(summary: &Summary) -> Vec<String> {
    let mut out = vec![
        format!("Total Income     {}", format_money(summary.total_income)),
        format!("Total Expenses   {}", format_money(summary.total_expenses)),
    ];
    let mut net = format!("Net Savings      {}", format_money(summary.net_savings));
    if let Some(pct) = summary.change_vs_last_month {
        net.push_str(&format!("   ({pct:+.1}% vs last month)"));
    }
    out.push(net);
    out
}

/// Grouped bars: income and expense per month.
pub fn render_flow_chart(flow: &[FlowPoint], width: u16, height: u16) -> Vec<String> {
    if flow.is_empty() {
        return vec!["Income vs Expenses: no data yet".to_string()];
    }

    let income = Style::default().fg(Color::Green);
    let expense = Style::default().fg(Color::Red);

    let mut chart = BarChart::default()
        .block(Block::bordered().title("Income vs Expenses"))
        .bar_width(5)
        .bar_gap(1)
        .group_gap(3);

    for point in flow {
        let bars = [
            Bar::default()
                .value(units(point.income))
                .style(income)
                .text_value(compact(point.income)),
            Bar::default()
                .value(units(point.expense))
                .style(expense)
                .text_value(compact(point.expense)),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(point.month.clone())).bars(&bars));
    }

    render_to_lines(chart, width, height)
}

/// Horizontal bars: spend per category.
pub fn render_category_chart(categories: &[CategorySlice], width: u16) -> Vec<String> {
    if categories.is_empty() {
        return vec!["Expenses by Category: no data yet".to_string()];
    }

    let bars: Vec<Bar> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Bar::default()
                .label(Line::from(c.name.clone()))
                .value(units(c.value))
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .text_value(compact(c.value))
        })
        .collect();

    let chart = BarChart::default()
        .block(Block::bordered().title("Expenses by Category"))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .data(BarGroup::default().bars(&bars));

    // one row per bar plus the border
    let height = u16::try_from(categories.len()).unwrap_or(u16::MAX).saturating_add(2);
    render_to_lines(chart, width, height)
}

fn render_to_lines(widget: impl Widget, width: u16, height: u16) -> Vec<String> {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    widget.render(area, &mut buf);

    (0..height)
        .map(|y| {
            let mut line = String::with_capacity(width as usize);
            for x in 0..width {
                line.push_str(buf[(x, y)].symbol());
            }
            line.trim_end().to_string()
        })
        .collect()
}

fn units(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

/// `4500` -> `4.5k`, for labels that must fit inside a bar.
fn compact(value: f64) -> String {
    let v = value.abs();
    if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{:.1}k", v / 1_000.0)
    } else {
        format!("{v:.0}")
    }
}

/// `$ 12,450.00`
pub fn format_money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}$ {grouped}.{:02}", cents % 100)
}
