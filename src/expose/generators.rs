use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{Error, Result};

/// Character sets random test strings are drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generator {
    /// Printable, non-whitespace ASCII.
    Ascii,
    Emojis,
    Whitespace,
    /// Unicode space separators.
    Spaces,
    AsciiUpper,
    AsciiLower,
    Digits,
    Punctuation,
    Cyrillic,
    Custom(Vec<char>),
}

impl Generator {
    pub const NAMES: [&'static str; 9] = [
        "ascii",
        "emojis",
        "whitespace",
        "spaces",
        "ascii_upper",
        "ascii_lower",
        "digits",
        "punctuation",
        "cyrillic",
    ];

    /// Every built-in generator.
    pub fn all() -> Vec<Generator> {
        vec![
            Generator::Ascii,
            Generator::Emojis,
            Generator::Whitespace,
            Generator::Spaces,
            Generator::AsciiUpper,
            Generator::AsciiLower,
            Generator::Digits,
            Generator::Punctuation,
            Generator::Cyrillic,
        ]
    }

    /// Parse a list of names; `"all"` expands to every built-in.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Generator>> {
        let mut generators = Vec::new();
        for name in names {
            if name.as_ref().eq_ignore_ascii_case("all") {
                generators.extend(Self::all());
            } else {
                generators.push(name.as_ref().parse()?);
            }
        }
        Ok(generators)
    }

    pub fn characters(&self) -> Vec<char> {
        match self {
            Generator::Ascii => ('!'..='~').collect(),
            Generator::Emojis => ('\u{1F600}'..='\u{1F64F}').chain('\u{1F680}'..='\u{1F6C5}').collect(),
            Generator::Whitespace => vec![' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}'],
            Generator::Spaces => std::iter::once(' ')
                .chain(std::iter::once('\u{00A0}'))
                .chain('\u{2000}'..='\u{200A}')
                .chain(['\u{202F}', '\u{205F}', '\u{3000}'])
                .collect(),
            Generator::AsciiUpper => ('A'..='Z').collect(),
            Generator::AsciiLower => ('a'..='z').collect(),
            Generator::Digits => ('0'..='9').collect(),
            Generator::Punctuation => ('!'..='~').filter(char::is_ascii_punctuation).collect(),
            Generator::Cyrillic => ('\u{0410}'..='\u{044F}').chain(['\u{0401}', '\u{0451}']).collect(),
            Generator::Custom(chars) => chars.clone(),
        }
    }
}

impl FromStr for Generator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ascii" => Ok(Generator::Ascii),
            "emojis" => Ok(Generator::Emojis),
            "whitespace" => Ok(Generator::Whitespace),
            "spaces" => Ok(Generator::Spaces),
            "ascii_upper" => Ok(Generator::AsciiUpper),
            "ascii_lower" => Ok(Generator::AsciiLower),
            "digits" => Ok(Generator::Digits),
            "punctuation" => Ok(Generator::Punctuation),
            "cyrillic" => Ok(Generator::Cyrillic),
            _ => Err(Error::unknown_identifier("generator", s, Self::NAMES)),
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generator::Custom(chars) => write!(f, "custom({} chars)", chars.len()),
            other => {
                let idx = Generator::all().iter().position(|g| g == other).unwrap_or(0);
                f.write_str(Generator::NAMES[idx])
            }
        }
    }
}

/// Draw `n` random strings with lengths in `min_length..=max_length` over the
/// combined alphabet of `generators`.
pub fn random_strings<R: Rng>(
    generators: &[Generator],
    n: usize,
    min_length: usize,
    max_length: usize,
    rng: &mut R,
) -> Result<Vec<String>> {
    if min_length > max_length {
        return Err(Error::InvalidArgument(format!(
            "min_length={min_length} should be <= max_length={max_length}"
        )));
    }
    let mut alphabet: Vec<char> = generators.iter().flat_map(Generator::characters).collect();
    alphabet.sort_unstable();
    alphabet.dedup();
    if alphabet.is_empty() && max_length > 0 {
        return Err(Error::InvalidArgument("no characters to generate from".to_string()));
    }

    Ok((0..n)
        .map(|_| {
            let length = rng.gen_range(min_length..=max_length);
            (0..length)
                .filter_map(|_| alphabet.choose(rng).copied())
                .collect()
        })
        .collect())
}
