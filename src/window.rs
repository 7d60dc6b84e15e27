use {
    crate::{
        config,
        feeds::Prices,
        meter::Meter,
        metrics::{ProcessLoad, Vitals},
        surface::Surface,
    },
    crossterm::style::Color,
    num_format::{Locale, ToFormattedString},
};

/// everything drawn in one tick.
///
/// a frame borrows the values it shows, so it always reflects a single instant.
pub struct Frame<'a> {
    pub vitals: &'a Vitals,
    /// bytes per second.
    pub download: f64,
    /// bytes per second.
    pub upload: f64,
    pub branch: &'a str,
    pub weather: &'a str,
    pub prices: &'a Prices,
    pub ticker: Ticker,
    /// the busiest processes, busiest first.
    pub processes: &'a [ProcessLoad],
    /// the local wall-clock time, as `HH:MM:SS`.
    pub time: String,
}

/// the condition of the crypto ticker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ticker {
    /// no prices have arrived yet.
    Syncing,
    Live,
    /// the last fetch failed; older prices are shown.
    Stale,
}

pub mod palette {
    use crossterm::style::Color;

    pub const TEXT: Color = Color::DarkGreen;
    pub const HIGHLIGHT: Color = Color::Green;
    pub const ALERT: Color = Color::Red;
    pub const WARN: Color = Color::DarkYellow;
    pub const DIM: Color = Color::DarkGrey;
}

/// the fixed height of the upper boxes.
const STATS_HEIGHT: u16 = 16;

/// the lower boxes are only drawn when they would be taller than this.
const MIN_LOWER_HEIGHT: u16 = 6;

/// the longest process name shown in the hotlist.
const NAME_WIDTH: usize = 15;

/// cpu temperatures above this are highlighted.
const HOT: f64 = 75.0;

/// draws `frame` onto a surface of the given size.
pub fn draw(surface: &mut impl Surface, (cols, rows): (u16, u16), frame: &Frame<'_>) {
    surface.clear(cols, rows);

    let left_width = (cols / 2).saturating_sub(2);
    let right_col = cols / 2 + 1;
    let right_width = (cols / 2).saturating_sub(3);
    let lower_row = 2 + STATS_HEIGHT;
    let lower_height = rows.saturating_sub(lower_row + 3);
    let lower = lower_height > MIN_LOWER_HEIGHT;

    vitals(surface, left_width, frame);
    environment(surface, right_col, frame);

    if lower {
        hotlist(surface, lower_row, frame.processes);
        ticker(surface, right_col, right_width, lower_row, lower_height, frame.prices);
    }

    frame_box(surface, 0, 0, cols, rows, " TERMDASH SYSTEM V1.0");
    frame_box(surface, 2, 2, left_width, STATS_HEIGHT, " SYSTEM VITALS ");
    frame_box(surface, right_col, 2, right_width, STATS_HEIGHT, " NETWORK & ENV ");

    if lower {
        let title = match frame.ticker {
            Ticker::Syncing => " CRYPTO TICKER (SYNCING) ",
            Ticker::Live => " CRYPTO TICKER ",
            Ticker::Stale => " CRYPTO TICKER (STALE) ",
        };
        frame_box(surface, 2, lower_row, left_width, lower_height, " PARASITE RADAR ");
        frame_box(surface, right_col, lower_row, right_width, lower_height, title);
    }

    let footer = format!(
        " STATUS: ONLINE | TIME: {} | PRESS 'q' TO DISCONNECT ",
        frame.time
    );
    let footer_col = cols.saturating_sub(footer.chars().count() as u16) / 2;
    surface.put(footer_col, rows.saturating_sub(2), &footer, palette::TEXT);
}

fn vitals(surface: &mut impl Surface, width: u16, frame: &Frame<'_>) {
    let Vitals {
        cpu,
        memory,
        storage,
        temperature,
        battery,
        processes,
        threads,
        ..
    } = frame.vitals;

    let width = width.saturating_sub(4);
    for (row, name, value) in [
        (4, "CPU USAGE", *cpu),
        (6, "RAM USAGE", *memory),
        (8, "STORAGE  ", *storage),
    ] {
        Meter { name, value, width }.draw(surface, 4, row);
    }

    let (temperature, color) = match temperature {
        Some(t) if *t > HOT => (format!("{t:.1} C"), palette::ALERT),
        Some(t) => (format!("{t:.1} C"), palette::HIGHLIGHT),
        None => ("N/A".to_owned(), palette::HIGHLIGHT),
    };
    field(surface, 4, 10, "CPU TEMP : ", &temperature, color);
    field(surface, 4, 11, "BATTERY  : ", battery, palette::HIGHLIGHT);
    field(surface, 4, 12, "PROCESSES: ", &processes.to_string(), palette::HIGHLIGHT);
    field(surface, 4, 13, "THREADS  : ", &threads.to_string(), palette::HIGHLIGHT);
}

fn environment(surface: &mut impl Surface, col: u16, frame: &Frame<'_>) {
    let col = col + 2;
    let download = format!("{}/s", format_bytes(frame.download as u64));
    let upload = format!("{}/s", format_bytes(frame.upload as u64));

    for (row, label, value) in [
        (4, "OWNER  : ", config::OWNER),
        (5, "OS     : ", frame.vitals.os.as_str()),
        (6, "UPTIME : ", frame.vitals.uptime.as_str()),
        (8, "BRANCH : ", frame.branch),
        (9, "WEATHER: ", frame.weather),
        (10, "FANS   : ", frame.vitals.fans.as_str()),
        (12, "NET DWN: ", download.as_str()),
        (13, "NET UP : ", upload.as_str()),
    ] {
        field(surface, col, row, label, value, palette::HIGHLIGHT);
    }
}

fn hotlist(surface: &mut impl Surface, top: u16, processes: &[ProcessLoad]) {
    surface.put(4, top + 1, "[!] TOP CONSUMERS", palette::ALERT);

    for (i, ProcessLoad { name, cpu }) in processes.iter().enumerate() {
        let name = name.chars().take(NAME_WIDTH).collect::<String>();
        let line = format!(
            "{}. {name:<width$} ({:.1}%)",
            i + 1,
            cpu * 100.0,
            width = NAME_WIDTH,
        );
        let color = if i == 0 { palette::ALERT } else { palette::TEXT };
        surface.put(4, top + 3 + i as u16, &line, color);
    }
}

fn ticker(surface: &mut impl Surface, col: u16, width: u16, top: u16, height: u16, prices: &Prices) {
    let first = top + 2;
    let last = top + height - 1;
    let price_width = usize::from(width.saturating_sub(12));

    for (i, (asset, symbol)) in config::CRYPTO_ASSETS.iter().enumerate() {
        let row = first + i as u16;
        if row >= last {
            break;
        }

        let price = format_price(prices.price(asset))
            .chars()
            .take(price_width)
            .collect::<String>();
        surface.put(col + 2, row, &format!("{symbol:<4} : "), palette::TEXT);
        surface.put(col + 9, row, &price, palette::HIGHLIGHT);
    }
}

/// draws a label followed by its value.
fn field(surface: &mut impl Surface, col: u16, row: u16, label: &str, value: &str, color: Color) {
    surface.put(col, row, label, palette::TEXT);
    surface.put(col + label.chars().count() as u16, row, value, color);
}

/// draws a single-line box with a title set into its top edge.
fn frame_box(surface: &mut impl Surface, col: u16, row: u16, width: u16, height: u16, title: &str) {
    if width < 2 || height < 2 {
        return;
    }

    let (right, bottom) = (col + width - 1, row + height - 1);
    let horizontal = "─".repeat(usize::from(width - 2));

    surface.put(col, row, &format!("┌{horizontal}┐"), palette::TEXT);
    surface.put(col, bottom, &format!("└{horizontal}┘"), palette::TEXT);
    for y in row + 1..bottom {
        surface.put(col, y, "│", palette::TEXT);
        surface.put(right, y, "│", palette::TEXT);
    }

    if !title.is_empty() {
        surface.put(col + 2, row, title, palette::HIGHLIGHT);
    }
}

/// formats a byte count, e.g. `512 B` or `1.5 MB`.
pub fn format_bytes(bytes: u64) -> String {
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1024.0;
    let mut prefix = 0;
    while value >= 1024.0 && prefix < PREFIXES.len() - 1 {
        value /= 1024.0;
        prefix += 1;
    }

    format!("{value:.1} {}B", PREFIXES[prefix])
}

/// formats a usd price with thousands separators, e.g. `$64,000.50`.
pub fn format_price(price: f64) -> String {
    let cents = (price.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_formatted_string(&Locale::en);
    let sign = if price < 0.0 { "-" } else { "" };

    format!("${sign}{whole}.{:02}", cents % 100)
}
