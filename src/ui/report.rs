//! Text report for a single lookup

use std::fmt::{self, Write};

use crossterm::style::Stylize;

use crate::data::{ExchangeRates, TrendRecord};
use crate::fanout::{Market, SearchLink};
use crate::scout::ScoutReport;

use super::widgets::sparkline_line;

/// Widest sparkline drawn in the report
const SPARKLINE_WIDTH: u16 = 40;

/// Displays a lookup result as styled terminal text
pub struct ReportView<'a>(pub &'a ScoutReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.0)
    }
}

/// Renders a lookup result as styled terminal text
pub fn render_report(report: &ScoutReport) -> String {
    ReportView(report).to_string()
}

fn write_report(out: &mut impl Write, report: &ScoutReport) -> fmt::Result {
    writeln!(out, "{} {}", "Price Scout:".bold(), report.query.trim().bold().cyan())?;
    if report.fan_out.translated_keyword != report.fan_out.raw_keyword {
        writeln!(
            out,
            "  {} {}",
            "Translated:".dark_grey(),
            report.fan_out.translated_keyword.as_str()
        )?;
    }
    writeln!(out)?;

    write_links(out, "Domestic", Market::Domestic, &report.links)?;
    write_links(out, "Cross-border", Market::CrossBorder, &report.links)?;

    match &report.trend {
        Some(trend) => write_trend(out, trend)?,
        None => {
            writeln!(out, "{}", "Price trend".bold())?;
            writeln!(out, "  {}", "No price trend found for this keyword.".dark_grey())?;
        }
    }
    writeln!(out)?;

    write_rates(out, &report.rates)
}

fn write_links(
    out: &mut impl Write,
    title: &str,
    market: Market,
    links: &[SearchLink],
) -> fmt::Result {
    writeln!(out, "{}", title.bold())?;
    for link in links.iter().filter(|link| link.market == market) {
        writeln!(out, "  {:<16} {}", link.destination, link.url.as_str().underlined())?;
    }
    writeln!(out)
}

fn write_trend(out: &mut impl Write, trend: &TrendRecord) -> fmt::Result {
    writeln!(out, "{} {}", "Price trend:".bold(), trend.name.as_str())?;

    let line = sparkline_line(&trend.prices, SPARKLINE_WIDTH);
    match (trend.dates.first(), trend.dates.last()) {
        (Some(first), Some(last)) => {
            writeln!(out, "  {}  {} → {}", line.cyan(), first, last)?;
        }
        _ => writeln!(out, "  {}", line.cyan())?,
    }

    let summary = [
        ("Latest", trend.latest()),
        ("Low", trend.lowest()),
        ("High", trend.highest()),
    ];
    write!(out, " ")?;
    for (label, value) in summary {
        if let Some(value) = value {
            write!(out, " {} {}", label.dark_grey(), format_amount(value))?;
        }
    }
    if let Some(ratio) = trend.change_ratio() {
        let change = format!("{:+.1}%", ratio * 100.0);
        let change = if ratio < 0.0 {
            change.green()
        } else {
            change.red()
        };
        write!(out, " {} {}", "Change".dark_grey(), change)?;
    }
    writeln!(out)
}

fn write_rates(out: &mut impl Write, rates: &ExchangeRates) -> fmt::Result {
    writeln!(out, "{}", "Exchange rates".bold())?;
    write!(
        out,
        "  USD 1 = ₩{}   JPY 100 = ₩{}",
        format_amount(rates.usd_to_krw),
        format_amount(rates.jpy_to_krw)
    )?;
    if rates.is_default() {
        write!(out, "  {}", "(fallback)".yellow())?;
    }
    writeln!(out)
}

/// Formats an amount with thousands separators and up to two decimals
fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let whole = rounded.trunc().abs() as u64;
    let cents = ((rounded.abs() - rounded.abs().trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    if cents == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, cents)
    }
}
