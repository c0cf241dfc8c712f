use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One stage of a job pipeline.
///
/// Field and variant names are shortened on the wire to keep tokens small;
/// see [`crate::serializer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Step {
    #[serde(rename = "f")]
    Fetch {
        #[serde(rename = "u")]
        uid: String,
    },
    #[serde(rename = "g")]
    Generate {
        #[serde(rename = "n")]
        name: String,
        #[serde(rename = "a")]
        args: Vec<Arg>,
    },
    #[serde(rename = "p")]
    Process {
        #[serde(rename = "n")]
        name: String,
        #[serde(rename = "a")]
        args: Vec<Arg>,
    },
}

impl Step {
    /// True for steps allowed at the head of a job
    pub fn is_source(&self) -> bool {
        matches!(self, Step::Fetch { .. } | Step::Generate { .. })
    }

    pub fn args(&self) -> &[Arg] {
        match self {
            Step::Fetch { .. } => &[],
            Step::Generate { args, .. } | Step::Process { args, .. } => args,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, name, args) = match self {
            Step::Fetch { uid } => return write!(f, "fetch {uid}"),
            Step::Generate { name, args } => ("generate", name, args),
            Step::Process { name, args } => ("process", name, args),
        };
        write!(f, "{verb} {name}(")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// Argument value passed to generators and processors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Arg {
    #[serde(rename = "s")]
    Str(String),
    #[serde(rename = "i")]
    Int(i64),
    #[serde(rename = "f", with = "exact_float")]
    Float(f64),
    #[serde(rename = "b")]
    Bool(bool),
    #[serde(rename = "m")]
    Map(BTreeMap<String, Arg>),
}

impl Arg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Arg::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Float(value) => Some(*value),
            Arg::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Arg>> {
        match self {
            Arg::Map(value) => Some(value),
            _ => None,
        }
    }

    /// Nesting depth; scalars are depth 1
    pub fn depth(&self) -> usize {
        match self {
            Arg::Map(entries) => 1 + entries.values().map(Arg::depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(value) => write!(f, "{value:?}"),
            Arg::Int(value) => write!(f, "{value}"),
            Arg::Float(value) => write!(f, "{value:?}"),
            Arg::Bool(value) => write!(f, "{value}"),
            Arg::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<u32> for Arg {
    fn from(value: u32) -> Self {
        Arg::Int(value.into())
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<BTreeMap<String, Arg>> for Arg {
    fn from(value: BTreeMap<String, Arg>) -> Self {
        Arg::Map(value)
    }
}

/// Floats travel as their shortest round-trip decimal text so that every
/// value, non-finite ones included, decodes to the same bits.
mod exact_float {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid float literal: {text}")))
    }
}
