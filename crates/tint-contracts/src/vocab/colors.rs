use crate::color::Rgb;

#[derive(Clone, Copy, Debug)]
pub struct ColorSpec {
    pub name: &'static str,
    pub tokens: &'static [&'static str],
    pub color: Rgb,
}

/// Checked top to bottom; the first entry with a token contained in the
/// instruction wins.
pub const COLOR_TABLE: &[ColorSpec] = &[
    ColorSpec {
        name: "red",
        tokens: &["빨간", "빨강", "레드", "red"],
        color: Rgb::new(0xFF, 0x00, 0x00),
    },
    ColorSpec {
        name: "blue",
        tokens: &["파란", "파랑", "블루", "blue"],
        color: Rgb::new(0x00, 0x00, 0xFF),
    },
    ColorSpec {
        name: "green",
        tokens: &["초록", "녹색", "그린", "green"],
        color: Rgb::new(0x00, 0xFF, 0x00),
    },
    ColorSpec {
        name: "yellow",
        tokens: &["노란", "노랑", "옐로", "yellow"],
        color: Rgb::new(0xFF, 0xFF, 0x00),
    },
    ColorSpec {
        name: "black",
        tokens: &["검정", "검은", "블랙", "black"],
        color: Rgb::new(0x00, 0x00, 0x00),
    },
    ColorSpec {
        name: "white",
        tokens: &["하얀", "흰", "화이트", "white"],
        color: Rgb::new(0xFF, 0xFF, 0xFF),
    },
    ColorSpec {
        name: "purple",
        tokens: &["보라", "퍼플", "purple"],
        color: Rgb::new(0x80, 0x00, 0x80),
    },
    ColorSpec {
        name: "orange",
        tokens: &["주황", "오렌지", "orange"],
        color: Rgb::new(0xFF, 0xA5, 0x00),
    },
];

pub const DEFAULT_COLOR: Rgb = Rgb::new(0x80, 0x80, 0x80);

pub fn resolve_color(text: &str) -> Option<Rgb> {
    let lowered = text.to_lowercase();
    COLOR_TABLE
        .iter()
        .find(|spec| spec.tokens.iter().any(|token| lowered.contains(token)))
        .map(|spec| spec.color)
}

pub fn color_or_default(text: &str) -> Rgb {
    resolve_color(text).unwrap_or(DEFAULT_COLOR)
}
