use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub background: Color,
    pub primary: Color,
    pub text: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub border: Color,
    pub highlight: Color,
    pub container: Color,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::dark()
    }
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(30, 30, 46),         // #1e1e2e
            primary: Color::Rgb(137, 180, 250),         // #89b4fa
            text: Color::Rgb(205, 214, 244),            // #cdd6f4
            text_secondary: Color::Rgb(127, 132, 156),  // #7f849c
            accent: Color::Rgb(203, 166, 247),          // #cba6f7
            success: Color::Rgb(166, 227, 161),         // #a6e3a1
            warning: Color::Rgb(249, 226, 175),         // #f9e2af
            error: Color::Rgb(243, 139, 168),           // #f38ba8
            border: Color::Rgb(88, 91, 112),            // #585b70
            highlight: Color::Rgb(137, 180, 250),       // #89b4fa
            container: Color::Rgb(49, 50, 68),          // #313244
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(249, 249, 249),      // #f9f9f9
            primary: Color::Rgb(0, 153, 225),           // #0099e1
            text: Color::Rgb(74, 74, 74),               // #4a4a4a
            text_secondary: Color::Rgb(150, 151, 151),  // #969797
            accent: Color::Rgb(112, 86, 151),           // #705697
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            border: Color::Rgb(74, 74, 74),             // #4a4a4a
            highlight: Color::Rgb(0, 153, 225),         // #0099e1
            container: Color::Rgb(232, 232, 232),       // #e8e8e8
        }
    }

    /// Plain terminal colours, for terminals without true colour.
    pub fn basic() -> Self {
        Self {
            background: Color::Black,
            primary: Color::Cyan,
            text: Color::White,
            text_secondary: Color::Gray,
            accent: Color::Magenta,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            border: Color::DarkGray,
            highlight: Color::Cyan,
            container: Color::Black,
        }
    }

    pub fn from_name(theme_name: &str) -> Self {
        match theme_name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            "basic" => Self::basic(),
            _ => Self::dark(),
        }
    }
}

pub struct ThemeManager {
    current_theme: String,
    colors: ThemeColors,
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeManager {
    pub fn new() -> Self {
        Self {
            current_theme: "Dark".to_string(),
            colors: ThemeColors::dark(),
        }
    }

    pub fn set_theme(&mut self, theme_name: &str) {
        self.current_theme = theme_name.to_string();
        self.colors = ThemeColors::from_name(theme_name);
    }

    pub fn get_colors(&self) -> &ThemeColors {
        &self.colors
    }

    pub fn get_theme_name(&self) -> &str {
        &self.current_theme
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["Dark", "Light", "Basic"]
    }
}

// Helper functions for common theme operations
pub fn get_list_item_style(theme: &ThemeColors, selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(theme.highlight)
            .fg(theme.background)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    }
}

pub fn get_border_style(theme: &ThemeColors) -> Style {
    Style::default().fg(theme.border)
}

pub fn get_title_style(theme: &ThemeColors) -> Style {
    Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD)
}
