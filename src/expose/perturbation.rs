use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::Rng;

use crate::error::{Error, Result};

/// Probability that a random character perturbation touches a character.
const CHAR_PROB: f64 = 0.1;

type PerturbFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// One-to-one text perturbations applied to every instance of a split.
#[derive(Clone)]
pub enum Perturbation {
    Lower,
    Upper,
    RandomLower,
    RandomUpper,
    AddTypos,
    RandomCaseSwap,
    SwapRandom,
    DeleteRandom,
    /// Repeat the text `k` times, separated by a space.
    Repeat(usize),
    Custom(String, PerturbFn),
}

impl Perturbation {
    pub const NAMES: [&'static str; 9] = [
        "lower",
        "upper",
        "random_lower",
        "random_upper",
        "add_typos",
        "random_case_swap",
        "swap_random",
        "delete_random",
        "repeat",
    ];

    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Perturbation::Custom(name.into(), Arc::new(f))
    }

    pub fn apply<R: Rng>(&self, text: &str, rng: &mut R) -> String {
        match self {
            Perturbation::Lower => text.to_lowercase(),
            Perturbation::Upper => text.to_uppercase(),
            Perturbation::RandomLower => map_random(text, rng, |c| c.to_lowercase().collect()),
            Perturbation::RandomUpper => map_random(text, rng, |c| c.to_uppercase().collect()),
            Perturbation::RandomCaseSwap => map_random(text, rng, swap_case),
            Perturbation::AddTypos => map_random(text, rng, |c| {
                typo(c).map(String::from).unwrap_or_else(|| c.to_string())
            }),
            Perturbation::SwapRandom => {
                let mut chars: Vec<char> = text.chars().collect();
                let mut i = 0;
                while i + 1 < chars.len() {
                    if rng.gen_bool(CHAR_PROB) {
                        chars.swap(i, i + 1);
                        i += 1;
                    }
                    i += 1;
                }
                chars.into_iter().collect()
            }
            Perturbation::DeleteRandom => text.chars().filter(|_| !rng.gen_bool(CHAR_PROB)).collect(),
            Perturbation::Repeat(k) => vec![text; *k].join(" "),
            Perturbation::Custom(_, f) => f(text),
        }
    }
}

fn map_random<R: Rng>(text: &str, rng: &mut R, f: impl Fn(char) -> String) -> String {
    text.chars()
        .map(|c| if rng.gen_bool(CHAR_PROB) { f(c) } else { c.to_string() })
        .collect()
}

fn swap_case(c: char) -> String {
    if c.is_uppercase() {
        c.to_lowercase().collect()
    } else {
        c.to_uppercase().collect()
    }
}

const KEYBOARD: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// A horizontally adjacent key on a QWERTY keyboard, keeping case.
fn typo(c: char) -> Option<char> {
    let lower = c.to_ascii_lowercase();
    let row = KEYBOARD.iter().find(|row| row.contains(lower))?;
    let keys: Vec<char> = row.chars().collect();
    let pos = keys.iter().position(|&k| k == lower)?;
    let neighbour = if pos + 1 < keys.len() { keys[pos + 1] } else { keys[pos - 1] };
    Some(if c.is_ascii_uppercase() {
        neighbour.to_ascii_uppercase()
    } else {
        neighbour
    })
}

impl FromStr for Perturbation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lower" => Ok(Perturbation::Lower),
            "upper" => Ok(Perturbation::Upper),
            "random_lower" => Ok(Perturbation::RandomLower),
            "random_upper" => Ok(Perturbation::RandomUpper),
            "add_typos" => Ok(Perturbation::AddTypos),
            "random_case_swap" => Ok(Perturbation::RandomCaseSwap),
            "swap_random" => Ok(Perturbation::SwapRandom),
            "delete_random" => Ok(Perturbation::DeleteRandom),
            "repeat" => Ok(Perturbation::Repeat(2)),
            _ => Err(Error::unknown_identifier("perturbation", s, Self::NAMES)),
        }
    }
}

impl fmt::Display for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Perturbation::Lower => f.write_str("lower"),
            Perturbation::Upper => f.write_str("upper"),
            Perturbation::RandomLower => f.write_str("random_lower"),
            Perturbation::RandomUpper => f.write_str("random_upper"),
            Perturbation::AddTypos => f.write_str("add_typos"),
            Perturbation::RandomCaseSwap => f.write_str("random_case_swap"),
            Perturbation::SwapRandom => f.write_str("swap_random"),
            Perturbation::DeleteRandom => f.write_str("delete_random"),
            Perturbation::Repeat(k) => write!(f, "repeat({k})"),
            Perturbation::Custom(name, _) => f.write_str(name),
        }
    }
}

impl fmt::Debug for Perturbation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Perturbation({self})")
    }
}
