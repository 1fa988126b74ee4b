//! Terminal styling for command output

use voice_judge::Rating;

/// ANSI color codes
pub mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

use colors::*;

pub fn style_bold(s: &str) -> String {
    format!("{}{}{}", BOLD, s, RESET)
}

pub fn style_dim(s: &str) -> String {
    format!("{}{}{}", DIM, s, RESET)
}

pub fn style_cyan(s: &str) -> String {
    format!("{}{}{}", CYAN, s, RESET)
}

pub fn icon_success() -> String {
    format!("{}✓{}", GREEN, RESET)
}

pub fn icon_error() -> String {
    format!("{}✗{}", RED, RESET)
}

pub fn icon_warning() -> String {
    format!("{}⚠{}", YELLOW, RESET)
}

pub fn icon_info() -> String {
    format!("{}ℹ{}", BLUE, RESET)
}

pub fn icon_arrow() -> String {
    format!("{}→{}", CYAN, RESET)
}

pub fn print_success(msg: &str) {
    println!("{} {}", icon_success(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}{}{}", icon_error(), RED, msg, RESET);
}

pub fn print_warning(msg: &str) {
    println!("{} {}{}{}", icon_warning(), YELLOW, msg, RESET);
}

pub fn print_info(msg: &str) {
    println!("{} {}", icon_info(), msg);
}

pub fn print_step(step: u32, total: u32, msg: &str) {
    println!(
        "{} {}{}/{}{} {}",
        icon_arrow(),
        CYAN,
        step,
        total,
        RESET,
        msg
    );
}

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}{} {} {}{}",
        BOLD,
        CYAN,
        title,
        "─".repeat(50usize.saturating_sub(title.len())),
        RESET
    );
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    println!("  {}{}:{} {}", GRAY, key, RESET, value);
}

pub fn print_key_value_colored(key: &str, value: &str, color: &str) {
    println!("  {}{}:{} {}{}{}", GRAY, key, RESET, color, value, RESET);
}

/// Color a rating letter is shown in
pub fn rating_color(rating: Rating) -> &'static str {
    match rating {
        Rating::S | Rating::A => GREEN,
        Rating::B => CYAN,
        Rating::C => YELLOW,
        Rating::D => MAGENTA,
        Rating::X => RED,
    }
}

pub fn print_box(title: &str, content: &[&str]) {
    let max_len = content
        .iter()
        .map(|s| s.chars().count())
        .max()
        .unwrap_or(0)
        .max(title.chars().count());
    let width = max_len + 4;

    println!("  {}╭{}╮{}", GRAY, "─".repeat(width), RESET);
    println!(
        "  {}│{} {}{}{} {}{}│{}",
        GRAY,
        RESET,
        BOLD,
        title,
        RESET,
        " ".repeat(width - title.chars().count() - 1),
        GRAY,
        RESET
    );
    println!("  {}├{}┤{}", GRAY, "─".repeat(width), RESET);

    for line in content {
        println!(
            "  {}│{} {} {}{}│{}",
            GRAY,
            RESET,
            line,
            " ".repeat(width - line.chars().count() - 1),
            GRAY,
            RESET
        );
    }

    println!("  {}╰{}╯{}", GRAY, "─".repeat(width), RESET);
}

/// Shorten a long hex string for display
pub fn truncate_hex(value: &str, keep: usize) -> String {
    if value.len() > keep * 2 + 3 && value.is_ascii() {
        format!("{}...{}", &value[..keep], &value[value.len() - keep..])
    } else {
        value.to_string()
    }
}

/// Decoded size of a `0x`-prefixed hex string, if it is valid hex
pub fn hex_byte_len(value: &str) -> Option<usize> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).ok().map(|bytes| bytes.len())
}
