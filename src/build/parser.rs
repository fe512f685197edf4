use std::fmt;

use nom::{
    bytes::complete::{is_not, take_till},
    character::complete::char,
    combinator::{map, rest},
    error::{context, convert_error, VerboseError},
    multi::many0,
    sequence::{delimited, tuple},
    Finish, IResult,
};
use thiserror::Error;

/// Marker content announcing a template reference.
pub const TEMPLATE_MARKER: &str = "PREFAB";

/// Marker written in front of literals by the encoder. Any marker other than
/// [`TEMPLATE_MARKER`] means the same thing.
pub const LITERAL_MARKER: &str = "VALUE";

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Malformed construction '{input}': {message}")]
pub struct ParseError {
    pub input: String,
    pub message: String,
}

/// The final segment of a construction string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `[PREFAB]name`
    Template(String),
    /// `[marker]value`
    Literal { marker: String, value: String },
}

/// One parsed construction string: a key path plus its final segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Construction {
    pub path: Vec<String>,
    pub segment: Segment,
}

impl Construction {
    #[tracing::instrument(level = "debug")]
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_construction(input)
            .finish()
            .map(|(_, construction)| construction)
            .map_err(|e| ParseError {
                input: input.to_string(),
                message: convert_error(input, e),
            })
    }

    pub fn template(path: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            path,
            segment: Segment::Template(name.into()),
        }
    }

    pub fn literal(path: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            path,
            segment: Segment::Literal {
                marker: LITERAL_MARKER.to_string(),
                value: value.into(),
            },
        }
    }
}

impl fmt::Display for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.path {
            write!(f, "{{{}}}", key)?;
        }
        match &self.segment {
            Segment::Template(name) => write!(f, "[{}]{}", TEMPLATE_MARKER, name),
            Segment::Literal { marker, value } => write!(f, "[{}]{}", marker, value),
        }
    }
}

fn parse_key(input: &str) -> ParserResult<&str> {
    context("slot key", delimited(char('{'), is_not("}"), char('}')))(input)
}

fn parse_marker(input: &str) -> ParserResult<&str> {
    context(
        "segment marker",
        delimited(char('['), take_till(|c| c == ']'), char(']')),
    )(input)
}

fn parse_construction(input: &str) -> ParserResult<Construction> {
    context(
        "construction",
        map(
            tuple((many0(parse_key), parse_marker, rest)),
            |(keys, marker, tail): (Vec<&str>, &str, &str)| Construction {
                path: keys.into_iter().map(str::to_string).collect(),
                segment: if marker == TEMPLATE_MARKER {
                    Segment::Template(tail.to_string())
                } else {
                    Segment::Literal {
                        marker: marker.to_string(),
                        value: tail.to_string(),
                    }
                },
            },
        ),
    )(input)
}
