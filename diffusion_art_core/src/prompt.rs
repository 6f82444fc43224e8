use std::{fmt::Display, str::FromStr};

use crate::sizes::SizePreset;

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// What a line of user input asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Blank input, prompt again.
    Skip,
    Generate {
        size: Option<SizePreset>,
        prompt: String,
    },
}

/// Interpret one line from the prompt loop.
///
/// A leading size keyword (`small`, `medium`, `large`, `portrait`, `landscape`) selects the
/// output size when more text follows it. A keyword on its own is taken as the prompt.
pub fn parse_line(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Skip;
    }
    if QUIT_WORDS.contains(&line.to_lowercase().as_str()) {
        return Command::Quit;
    }

    if let Some((first, rest)) = line.split_once(char::is_whitespace) {
        let rest = rest.trim_start();
        if let (Ok(size), false) = (first.parse::<SizePreset>(), rest.is_empty()) {
            return Command::Generate {
                size: Some(size),
                prompt: rest.to_string(),
            };
        }
    }

    Command::Generate {
        size: None,
        prompt: line.to_string(),
    }
}

/// Photography templates wrapped around a short description.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Style {
    #[default]
    Plain,
    Portrait,
    Landscape,
}

impl Style {
    pub fn apply(&self, description: &str) -> String {
        match self {
            Self::Plain => description.to_string(),
            Self::Portrait => format!(
                "professional portrait photography, {description}, detailed eyes, natural skin texture, studio lighting, 85mm lens, high detail"
            ),
            Self::Landscape => format!(
                "landscape photography, {description}, golden hour, natural lighting, ultra detailed, National Geographic style, 8k"
            ),
        }
    }

    /// Size this style renders at, or `None` to use the caller's size.
    pub fn dimensions(&self, high_quality: bool) -> Option<(usize, usize)> {
        match (self, high_quality) {
            (Self::Plain, _) => None,
            (Self::Portrait, true) => Some((1024, 1024)),
            (Self::Portrait, false) => Some((768, 768)),
            (Self::Landscape, true) => Some((1024, 768)),
            (Self::Landscape, false) => Some((768, 512)),
        }
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Portrait => write!(f, "portrait"),
            Self::Landscape => write!(f, "landscape"),
        }
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            other => Err(format!("Unknown style: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(size: Option<SizePreset>, prompt: &str) -> Command {
        Command::Generate {
            size,
            prompt: prompt.to_string(),
        }
    }

    #[test]
    fn quit_words() {
        for word in ["quit", "EXIT", " q ", "Quit"] {
            assert_eq!(parse_line(word), Command::Quit, "{word:?}");
        }
        assert_eq!(
            parse_line("quit smoking"),
            generate(None, "quit smoking")
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line(""), Command::Skip);
        assert_eq!(parse_line("   \t"), Command::Skip);
    }

    #[test]
    fn leading_size_keyword() {
        assert_eq!(
            parse_line("large a majestic wolf in snowy forest"),
            generate(Some(SizePreset::Large), "a majestic wolf in snowy forest")
        );
        assert_eq!(
            parse_line("Portrait   an old fisherman"),
            generate(Some(SizePreset::Portrait), "an old fisherman")
        );
    }

    #[test]
    fn keyword_alone_is_a_prompt() {
        assert_eq!(parse_line("landscape"), generate(None, "landscape"));
    }

    #[test]
    fn keyword_later_in_line_is_ignored() {
        assert_eq!(
            parse_line("a small cabin"),
            generate(None, "a small cabin")
        );
    }

    #[test]
    fn styles_wrap_description() {
        assert_eq!(Style::Plain.apply("a cat"), "a cat");
        assert!(Style::Portrait
            .apply("an old fisherman")
            .starts_with("professional portrait photography, an old fisherman, "));
        assert!(Style::Landscape
            .apply("misty fjord")
            .starts_with("landscape photography, misty fjord, golden hour"));
    }

    #[test]
    fn style_dimensions() {
        assert_eq!(Style::Plain.dimensions(true), None);
        assert_eq!(Style::Portrait.dimensions(true), Some((1024, 1024)));
        assert_eq!(Style::Landscape.dimensions(false), Some((768, 512)));
    }
}
