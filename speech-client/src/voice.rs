use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when parsing a name that is not one of the offered voices
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown voice: {name}. Available: {available}")]
pub struct UnknownVoice {
    pub name: String,
    available: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Female => write!(f, "Female"),
            Gender::Male => write!(f, "Male"),
        }
    }
}

/// Polly voices offered by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Voice {
    #[default]
    Joanna,
    Matthew,
    Nicole,
    Russell,
}

impl Voice {
    pub const ALL: [Voice; 4] = [Voice::Joanna, Voice::Matthew, Voice::Nicole, Voice::Russell];

    /// Voice id as Polly expects it
    pub fn id(&self) -> &'static str {
        match self {
            Voice::Joanna => "Joanna",
            Voice::Matthew => "Matthew",
            Voice::Nicole => "Nicole",
            Voice::Russell => "Russell",
        }
    }

    pub fn gender(&self) -> Gender {
        match self {
            Voice::Joanna | Voice::Nicole => Gender::Female,
            Voice::Matthew | Voice::Russell => Gender::Male,
        }
    }

    /// Label for menus, e.g. "Joanna (Female)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.id(), self.gender())
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Voice {
    type Err = UnknownVoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Voice::ALL
            .into_iter()
            .find(|v| v.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let available: Vec<&str> = Voice::ALL.iter().map(|v| v.id()).collect();
                UnknownVoice {
                    name: wanted.to_string(),
                    available: available.join(", "),
                }
            })
    }
}

impl TryFrom<String> for Voice {
    type Error = UnknownVoice;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}
