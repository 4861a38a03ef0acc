use ratatui::style::{Color, Modifier, Style};
use std::str::FromStr;

/// Colors specific to the heatmap pane and the cell chart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatmapStyle {
    /// Grid cursor (selected cell).
    pub cursor: Color,
    /// Marker drawn on top-5 cells.
    pub hotspot: Color,
    /// Cell under the mouse.
    pub hover: Color,
    pub chart_line: Color,
    pub chart_axis: Color,
}

/// Complete theme configuration for ratatui
#[derive(Clone, Debug)]
pub struct ThemeConfig {
    pub background: Color,
    pub list_normal: Style,
    pub list_selected: Style,
    pub border: Style,
    pub border_selected: Style,
    pub title: Style,
    pub text: Style,
    /// Status bar and secondary labels.
    pub muted: Style,
    /// Failed-request messages.
    pub error: Style,
    pub heatmap: HeatmapStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Dracula,
    Solarized,
    Gruvbox,
    EverforestLight,
}

impl Theme {
    pub const NAMES: [&'static str; 4] = ["dracula", "solarized", "gruvbox", "everforest_light"];

    pub fn config(self) -> ThemeConfig {
        match self {
            Theme::Dracula => dracula_theme(),
            Theme::Solarized => solarized_dark(),
            Theme::Gruvbox => gruvbox_theme(),
            Theme::EverforestLight => everforest_light_theme(),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dracula" => Ok(Theme::Dracula),
            "solarized" | "solarized_dark" => Ok(Theme::Solarized),
            "gruvbox" => Ok(Theme::Gruvbox),
            "everforest_light" | "everforest" => Ok(Theme::EverforestLight),
            other => Err(format!(
                "Unknown theme '{}'. Available: {}",
                other,
                Theme::NAMES.join(", ")
            )),
        }
    }
}

/// Returns a ThemeConfig based on the Solarized Dark color palette.
pub fn solarized_dark() -> ThemeConfig {
    let base03 = Color::Rgb(0, 43, 54);
    let base02 = Color::Rgb(7, 54, 66);
    let base01 = Color::Rgb(88, 110, 117);
    let base0 = Color::Rgb(131, 148, 150);
    let base3 = Color::Rgb(253, 246, 227);
    let yellow = Color::Rgb(181, 137, 0);
    let red = Color::Rgb(220, 50, 47);
    let magenta = Color::Rgb(211, 54, 130);
    let blue = Color::Rgb(38, 139, 210);
    let cyan = Color::Rgb(42, 161, 152);

    ThemeConfig {
        background: base03,
        list_normal: Style::default().fg(base0).bg(base02),
        list_selected: Style::default()
            .fg(base3)
            .bg(blue)
            .add_modifier(Modifier::BOLD),
        border: Style::default().fg(base01),
        border_selected: Style::default().fg(blue),
        title: Style::default().fg(blue).add_modifier(Modifier::BOLD),
        text: Style::default().fg(base0).bg(base02),
        muted: Style::default().fg(base01),
        error: Style::default().fg(red).add_modifier(Modifier::BOLD),
        heatmap: HeatmapStyle {
            cursor: base3,
            hotspot: yellow,
            hover: cyan,
            chart_line: magenta,
            chart_axis: base01,
        },
    }
}

/// Returns a ThemeConfig based on the Dracula color palette.
pub fn dracula_theme() -> ThemeConfig {
    let bg = Color::Rgb(40, 42, 54);
    let selection = Color::Rgb(68, 71, 90);
    let fg = Color::Rgb(248, 248, 242);
    let comment = Color::Rgb(98, 114, 164);
    let purple = Color::Rgb(189, 147, 249);
    let yellow = Color::Rgb(241, 250, 140);
    let pink = Color::Rgb(255, 121, 198);
    let cyan = Color::Rgb(139, 233, 253);
    let red = Color::Rgb(255, 85, 85);

    ThemeConfig {
        background: bg,
        list_normal: Style::default().fg(fg).bg(bg),
        list_selected: Style::default()
            .fg(fg)
            .bg(selection)
            .add_modifier(Modifier::BOLD),
        border: Style::default().fg(comment),
        border_selected: Style::default().fg(purple),
        title: Style::default().fg(purple).add_modifier(Modifier::BOLD),
        text: Style::default().fg(fg).bg(bg),
        muted: Style::default().fg(comment),
        error: Style::default().fg(red).add_modifier(Modifier::BOLD),
        heatmap: HeatmapStyle {
            cursor: fg,
            hotspot: yellow,
            hover: cyan,
            chart_line: pink,
            chart_axis: comment,
        },
    }
}

/// Returns a ThemeConfig based on the Gruvbox Dark color palette.
pub fn gruvbox_theme() -> ThemeConfig {
    let bg0 = Color::Rgb(40, 40, 40);
    let fg0 = Color::Rgb(251, 241, 199);
    let fg1 = Color::Rgb(235, 219, 178);
    let gray = Color::Rgb(146, 131, 116);
    let blue = Color::Rgb(69, 133, 136);
    let yellow = Color::Rgb(215, 153, 33);
    let orange = Color::Rgb(214, 93, 14);
    let red = Color::Rgb(204, 36, 29);
    let aqua = Color::Rgb(104, 157, 106);

    ThemeConfig {
        background: bg0,
        list_normal: Style::default().fg(fg1).bg(bg0),
        list_selected: Style::default()
            .fg(bg0)
            .bg(fg1)
            .add_modifier(Modifier::BOLD),
        border: Style::default().fg(gray),
        border_selected: Style::default().fg(orange),
        title: Style::default().fg(orange).add_modifier(Modifier::BOLD),
        text: Style::default().fg(fg1).bg(bg0),
        muted: Style::default().fg(gray),
        error: Style::default().fg(red).add_modifier(Modifier::BOLD),
        heatmap: HeatmapStyle {
            cursor: fg0,
            hotspot: yellow,
            hover: aqua,
            chart_line: blue,
            chart_axis: gray,
        },
    }
}

/// Returns a ThemeConfig based on the Everforest Light color palette.
pub fn everforest_light_theme() -> ThemeConfig {
    let bg = Color::Rgb(253, 246, 227);
    let bg_view = Color::Rgb(243, 234, 211);
    let fg = Color::Rgb(92, 106, 114);
    let gray = Color::Rgb(147, 159, 149);
    let yellow = Color::Rgb(223, 160, 0);
    let green = Color::Rgb(141, 161, 1);
    let red = Color::Rgb(248, 85, 82);
    let blue = Color::Rgb(58, 148, 197);

    ThemeConfig {
        background: bg,
        list_normal: Style::default().fg(fg).bg(bg_view),
        list_selected: Style::default()
            .fg(bg)
            .bg(gray)
            .add_modifier(Modifier::BOLD),
        border: Style::default().fg(gray),
        border_selected: Style::default().fg(yellow),
        title: Style::default().fg(yellow).add_modifier(Modifier::BOLD),
        text: Style::default().fg(fg).bg(bg_view),
        muted: Style::default().fg(gray),
        error: Style::default().fg(red).add_modifier(Modifier::BOLD),
        heatmap: HeatmapStyle {
            cursor: fg,
            hotspot: red,
            hover: blue,
            chart_line: green,
            chart_axis: gray,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_listed_theme() {
        for name in Theme::NAMES {
            assert!(Theme::from_str(name).is_ok(), "{} should parse", name);
        }
        assert_eq!(Theme::from_str(" Dracula ").unwrap(), Theme::Dracula);
    }

    #[test]
    fn unknown_theme_lists_alternatives() {
        let err = Theme::from_str("neon").unwrap_err();
        assert!(err.contains("neon"));
        assert!(err.contains("everforest_light"));
    }

    #[test]
    fn cursor_stands_out_from_hotspot_marker() {
        for name in Theme::NAMES {
            let config = Theme::from_str(name).unwrap().config();
            assert_ne!(config.heatmap.cursor, config.heatmap.hotspot);
        }
    }
}
