use crate::incident::Severity;
use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Color as CtColor, Stylize};
use std::io::{self, Write};
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Color Palette - Flare Theme
// ═══════════════════════════════════════════════════════════════════════════════

pub mod colors {
    use crossterm::style::Color;

    pub const AMBER: Color = Color::Rgb {
        r: 255,
        g: 191,
        b: 0,
    };
    pub const ORANGE: Color = Color::Rgb {
        r: 255,
        g: 140,
        b: 0,
    };
    pub const FLARE: Color = Color::Rgb {
        r: 255,
        g: 69,
        b: 0,
    };
    pub const GREEN: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const YELLOW: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 0,
    };
    pub const RED: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const BLUE: Color = Color::Rgb {
        r: 100,
        g: 149,
        b: 237,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
    pub const WHITE: Color = Color::Rgb {
        r: 255,
        g: 255,
        b: 255,
    };
}

pub fn severity_color(severity: Severity) -> CtColor {
    match severity {
        Severity::Critical => colors::FLARE,
        Severity::High => colors::ORANGE,
        Severity::Medium => colors::YELLOW,
        Severity::Low => colors::GREEN,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Box Drawing Characters
// ═══════════════════════════════════════════════════════════════════════════════

pub mod box_chars {
    pub const DOUBLE_TOP_LEFT: &str = "╔";
    pub const DOUBLE_TOP_RIGHT: &str = "╗";
    pub const DOUBLE_BOTTOM_LEFT: &str = "╚";
    pub const DOUBLE_BOTTOM_RIGHT: &str = "╝";
    pub const DOUBLE_HORIZONTAL: &str = "═";
    pub const DOUBLE_VERTICAL: &str = "║";

    pub const SINGLE_HORIZONTAL: &str = "─";
    pub const SINGLE_VERTICAL: &str = "│";

    pub const ROUND_TOP_LEFT: &str = "╭";
    pub const ROUND_TOP_RIGHT: &str = "╮";
    pub const ROUND_BOTTOM_LEFT: &str = "╰";
    pub const ROUND_BOTTOM_RIGHT: &str = "╯";

    pub const T_LEFT: &str = "├";
    pub const T_RIGHT: &str = "┤";
    pub const T_TOP: &str = "┬";
    pub const T_BOTTOM: &str = "┴";
    pub const CROSS: &str = "┼";

    pub const ARROW_RIGHT: &str = "▶";
    pub const BULLET: &str = "●";
    pub const BULLET_EMPTY: &str = "○";
    pub const DIAMOND: &str = "◆";
    pub const CHECK: &str = "✓";
    pub const CROSS_MARK: &str = "✗";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Banner
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_banner(subtitle: &str) {
    let banner = r#"
     ██████╗ ██╗██╗     ███████╗██╗███████╗██╗     ██████╗
    ██╔═══██╗██║██║     ██╔════╝██║██╔════╝██║     ██╔══██╗
    ██║   ██║██║██║     █████╗  ██║█████╗  ██║     ██║  ██║
    ██║   ██║██║██║     ██╔══╝  ██║██╔══╝  ██║     ██║  ██║
    ╚██████╔╝██║███████╗██║     ██║███████╗███████╗██████╔╝
     ╚═════╝ ╚═╝╚══════╝╚═╝     ╚═╝╚══════╝╚══════╝╚═════╝
"#;

    let lines: Vec<&str> = banner.lines().collect();
    let gradient_colors = [
        colors::AMBER,
        colors::AMBER,
        colors::ORANGE,
        colors::ORANGE,
        colors::FLARE,
        colors::FLARE,
        colors::RED,
    ];

    for (i, line) in lines.iter().enumerate() {
        let color = gradient_colors.get(i).unwrap_or(&colors::AMBER);
        println!("{}", line.with(*color).bold());
    }

    let rule = box_chars::DOUBLE_HORIZONTAL.repeat(17);
    println!(
        "{}",
        format!("  {}  {}  {}", rule, subtitle, rule).with(colors::DIM)
    );
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status Indicators
// ═══════════════════════════════════════════════════════════════════════════════

fn print_status(symbol: &str, color: CtColor, message: &str) {
    println!(" {} {}", symbol.with(color).bold(), message.with(color));
}

pub fn print_success(message: &str) {
    print_status(box_chars::CHECK, colors::GREEN, message);
}

pub fn print_error(message: &str) {
    print_status(box_chars::CROSS_MARK, colors::RED, message);
}

pub fn print_warning(message: &str) {
    print_status("⚠", colors::ORANGE, message);
}

pub fn print_info(message: &str) {
    print_status("ℹ", colors::BLUE, message);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Section Headers
// ═══════════════════════════════════════════════════════════════════════════════

const SECTION_WIDTH: usize = 60;

fn rule(len: usize) -> String {
    box_chars::SINGLE_HORIZONTAL.repeat(len)
}

/// `╭──── Title ────╮`, padded to the section width.
pub fn print_section_header(title: &str) {
    let used = title.width() + 4;
    let left = SECTION_WIDTH.saturating_sub(used) / 2;
    let right = SECTION_WIDTH.saturating_sub(used + left);

    println!();
    println!(
        "{}{} {} {}{}",
        box_chars::ROUND_TOP_LEFT.with(colors::AMBER),
        rule(left).with(colors::AMBER),
        title.with(colors::AMBER).bold().attribute(Attribute::Italic),
        rule(right).with(colors::AMBER),
        box_chars::ROUND_TOP_RIGHT.with(colors::AMBER)
    );
}

pub fn print_section_footer() {
    println!(
        "{}{}{}",
        box_chars::ROUND_BOTTOM_LEFT.with(colors::AMBER),
        rule(SECTION_WIDTH).with(colors::AMBER),
        box_chars::ROUND_BOTTOM_RIGHT.with(colors::AMBER)
    );
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Key-Value Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_key_value(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::BULLET.with(colors::ORANGE),
        format!("{}:", key).with(colors::DIM),
        value.with(colors::WHITE)
    );
}

pub fn print_key_value_highlight(key: &str, value: &str) {
    println!(
        "  {} {} {}",
        box_chars::DIAMOND.with(colors::FLARE),
        format!("{}:", key).with(colors::AMBER).bold(),
        value.with(colors::GREEN).bold()
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// List Display
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_list_item(item: &str, indent: usize) {
    println!(
        "{}{}  {}",
        "  ".repeat(indent),
        box_chars::ARROW_RIGHT.with(colors::AMBER),
        item.with(colors::WHITE)
    );
}

/// List item drawn entirely in `color`, e.g. dimmed tool-call summaries.
pub fn print_list_item_styled(item: &str, color: CtColor, indent: usize) {
    println!(
        "{}{}  {}",
        "  ".repeat(indent),
        box_chars::ARROW_RIGHT.with(color),
        item.with(color)
    );
}

pub fn print_empty_list(message: &str) {
    println!(
        "  {} {}",
        box_chars::BULLET_EMPTY.with(colors::DIM),
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Table Display
// ═══════════════════════════════════════════════════════════════════════════════

pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: Vec<&str>) -> Self {
        let col_widths: Vec<usize> = headers.iter().map(|h| h.width()).collect();
        TableBuilder {
            headers: headers.into_iter().map(String::from).collect(),
            rows: Vec::new(),
            col_widths,
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i].max(cell.width());
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn print_rule(&self, left: &str, junction: &str, right: &str) {
        print!("{}", left.with(colors::AMBER));
        for (i, width) in self.col_widths.iter().enumerate() {
            print!("{}", rule(width + 2).with(colors::AMBER));
            if i + 1 < self.col_widths.len() {
                print!("{}", junction.with(colors::AMBER));
            }
        }
        println!("{}", right.with(colors::AMBER));
    }

    pub fn print(&self) {
        self.print_rule(
            box_chars::ROUND_TOP_LEFT,
            box_chars::T_TOP,
            box_chars::ROUND_TOP_RIGHT,
        );

        print!("{}", box_chars::SINGLE_VERTICAL.with(colors::AMBER));
        for (i, header) in self.headers.iter().enumerate() {
            let padding = self.col_widths[i].saturating_sub(header.width());
            print!(
                " {}{} ",
                header.clone().with(colors::AMBER).bold(),
                " ".repeat(padding)
            );
            print!("{}", box_chars::SINGLE_VERTICAL.with(colors::AMBER));
        }
        println!();

        self.print_rule(box_chars::T_LEFT, box_chars::CROSS, box_chars::T_RIGHT);

        for row in &self.rows {
            print!("{}", box_chars::SINGLE_VERTICAL.with(colors::AMBER));
            for (i, cell) in row.iter().enumerate() {
                let width = self.col_widths.get(i).unwrap_or(&0);
                let padding = width.saturating_sub(cell.width());
                let color = Severity::parse(cell)
                    .map(severity_color)
                    .unwrap_or(colors::WHITE);
                print!(" {}{} ", cell.clone().with(color), " ".repeat(padding));
                print!("{}", box_chars::SINGLE_VERTICAL.with(colors::AMBER));
            }
            println!();
        }

        self.print_rule(
            box_chars::ROUND_BOTTOM_LEFT,
            box_chars::T_BOTTOM,
            box_chars::ROUND_BOTTOM_RIGHT,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt Styling
// ═══════════════════════════════════════════════════════════════════════════════

/// Prompt showing the active agent, e.g. `triage ❯❯❯ `.
pub fn get_prompt(label: &str) -> String {
    format!(
        "{} {}{}{} ",
        label.with(colors::DIM),
        "❯".with(colors::AMBER).bold(),
        "❯".with(colors::ORANGE).bold(),
        "❯".with(colors::FLARE).bold(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// Welcome Message
// ═══════════════════════════════════════════════════════════════════════════════

const WELCOME_WIDTH: usize = 64;

/// One `║ ... ║` line of the welcome box. `visible` is the printed width of
/// `content` without its escape codes.
fn print_boxed(content: &str, visible: usize) {
    println!(
        "  {}{}{}{}",
        box_chars::DOUBLE_VERTICAL.with(colors::ORANGE),
        content,
        " ".repeat(WELCOME_WIDTH.saturating_sub(visible)),
        box_chars::DOUBLE_VERTICAL.with(colors::ORANGE)
    );
}

fn print_box_edge(left: &str, right: &str) {
    println!(
        "  {}{}{}",
        left.with(colors::ORANGE),
        box_chars::DOUBLE_HORIZONTAL
            .repeat(WELCOME_WIDTH)
            .with(colors::ORANGE),
        right.with(colors::ORANGE)
    );
}

/// Banner plus a boxed summary of what the console is connected to.
pub fn print_welcome(subtitle: &str, headline: &str, details: &[(&str, &str)], hint: &str) {
    print_banner(subtitle);

    print_box_edge(box_chars::DOUBLE_TOP_LEFT, box_chars::DOUBLE_TOP_RIGHT);
    print_boxed(
        &format!("  {}", headline.with(colors::GREEN)),
        headline.width() + 2,
    );
    print_boxed("", 0);
    for (key, value) in details {
        let content = format!("  {} {}", format!("{}:", key).with(colors::DIM), value);
        print_boxed(&content, key.width() + value.width() + 4);
    }
    print_boxed("", 0);
    print_boxed(
        &format!("  {}", hint.with(colors::DIM)),
        hint.width() + 2,
    );
    print_box_edge(box_chars::DOUBLE_BOTTOM_LEFT, box_chars::DOUBLE_BOTTOM_RIGHT);
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Help Display
// ═══════════════════════════════════════════════════════════════════════════════

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

pub fn print_help(commands: &[CommandHelp]) {
    print_section_header("Session Commands");
    println!();
    for cmd in commands {
        println!(
            "      {} {}  {}",
            cmd.name.with(colors::GREEN).bold(),
            cmd.args.with(colors::DIM),
            cmd.description.with(colors::WHITE)
        );
    }
    println!();
    println!(
        "  {} {}",
        box_chars::DIAMOND.with(colors::AMBER),
        "Any other line is sent to the active agent as-is."
            .with(colors::DIM)
            .attribute(Attribute::Italic)
    );
    print_section_footer();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Goodbye Message
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_goodbye() {
    println!();
    println!(
        "  {} {}",
        "👋".with(colors::AMBER),
        "Session closed. Stay safe out there."
            .with(colors::ORANGE)
            .bold()
    );
    println!();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Flush Output
// ═══════════════════════════════════════════════════════════════════════════════

pub fn flush() {
    let _ = io::stdout().flush();
}
