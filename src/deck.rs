//! Keyword-format job description
//!
//! A [`Deck`] is an ordered list of [`Card`]s. Each card is a `*KEYWORD`
//! header with optional parameters followed by comma-separated data lines.
//! Decks are built by the assembly functions and rendered once, here.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PipelineResult;

/// `KEY=VALUE` or bare `FLAG` parameter on a keyword line
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub key: String,
    pub value: Option<String>,
}

impl Parameter {
    pub fn flag(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
        }
    }

    pub fn value(key: &str, value: impl ToString) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub parameters: Vec<Parameter>,
    pub data: Vec<String>,
}

impl Card {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            parameters: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.parameters.push(Parameter::value(key, value));
        self
    }

    pub fn flag(mut self, key: &str) -> Self {
        self.parameters.push(Parameter::flag(key));
        self
    }

    /// Append one data line built from comma-joined fields
    pub fn line<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.data.push(join(fields));
        self
    }

    pub fn lines<I>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.data.extend(lines);
        self
    }

    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.key.eq_ignore_ascii_case(key))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*{}", self.keyword)?;
        for p in &self.parameters {
            match &p.value {
                Some(v) => write!(f, ", {}={}", p.key, v)?,
                None => write!(f, ", {}", p.key)?,
            }
        }
        writeln!(f)?;
        for line in &self.data {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deck {
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Cards with the given keyword, in deck order
    pub fn find<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a Card> + 'a {
        self.cards
            .iter()
            .filter(move |c| c.keyword.eq_ignore_ascii_case(keyword))
    }

    pub fn write_to(&self, path: &Path) -> PipelineResult<()> {
        fs::write(path, self.to_string())?;
        Ok(())
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            write!(f, "{}", card)?;
        }
        Ok(())
    }
}

fn join<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    fields
        .into_iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Scientific notation with a signed two-digit exponent, e.g. `2.070e+11`
pub fn sci(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => match exponent.parse::<i32>() {
            Ok(exp) => {
                let sign = if exp < 0 { '-' } else { '+' };
                format!("{}e{}{:02}", mantissa, sign, exp.abs())
            }
            Err(_) => raw,
        },
        None => raw,
    }
}

/// [`sci`] right-aligned to `width` characters
pub fn sci_width(value: f64, width: usize, precision: usize) -> String {
    format!("{:>width$}", sci(value, precision), width = width)
}
