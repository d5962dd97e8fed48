//! Render options: a typed key/value store read by the GI engines at init time.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;

use crate::{Float, Vec3f};
use crate::spectrum::Spectrum;

#[derive(Clone, Debug, PartialEq)]
pub enum ParamVal {
    Int(i32),
    Float(Float),
    Bool(bool),
    String(String),
    Spectrum(Spectrum),
    Vec3f(Vec3f),
}

impl ParamVal {
    fn type_name(&self) -> &'static str {
        match self {
            ParamVal::Int(_) => "int",
            ParamVal::Float(_) => "float",
            ParamVal::Bool(_) => "bool",
            ParamVal::String(_) => "string",
            ParamVal::Spectrum(_) => "color",
            ParamVal::Vec3f(_) => "vector",
        }
    }
}

pub struct TryFromParamErr(&'static str);

#[derive(Debug, Clone, PartialEq)]
pub struct ParamError {
    pub name: String,
    pub expected_ty: &'static str,
    pub found_ty: &'static str,
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "option \"{}\" should be a {} but was given a {}", self.name, self.expected_ty, self.found_ty)
    }
}

impl std::error::Error for ParamError {}

macro_rules! impl_basic_conversions {
    ($param_variant:ident, $into_ty:ty, $ty_name:expr) => {
        impl TryFrom<&ParamVal> for $into_ty {
            type Error = TryFromParamErr;

            fn try_from(value: &ParamVal) -> Result<Self, Self::Error> {
                match value {
                    ParamVal::$param_variant(v) => Ok(v.clone()),
                    _ => Err(TryFromParamErr($ty_name))
                }
            }
        }

        impl From<$into_ty> for ParamVal {
            fn from(value: $into_ty) -> ParamVal {
                ParamVal::$param_variant(value)
            }
        }
    };
}

impl_basic_conversions!(Int, i32, "int");
impl_basic_conversions!(Bool, bool, "bool");
impl_basic_conversions!(String, String, "string");
impl_basic_conversions!(Vec3f, Vec3f, "vector");

// Numbers written without a decimal point are still valid floats, and colors may be given as
// plain triples.
impl TryFrom<&ParamVal> for Float {
    type Error = TryFromParamErr;

    fn try_from(value: &ParamVal) -> Result<Self, Self::Error> {
        match value {
            ParamVal::Float(v) => Ok(*v),
            ParamVal::Int(v) => Ok(*v as Float),
            _ => Err(TryFromParamErr("float"))
        }
    }
}

impl From<Float> for ParamVal {
    fn from(value: Float) -> ParamVal {
        ParamVal::Float(value)
    }
}

impl From<f64> for ParamVal {
    fn from(value: f64) -> ParamVal {
        ParamVal::Float(value as Float)
    }
}

impl TryFrom<&ParamVal> for Spectrum {
    type Error = TryFromParamErr;

    fn try_from(value: &ParamVal) -> Result<Self, Self::Error> {
        match value {
            ParamVal::Spectrum(s) => Ok(*s),
            ParamVal::Vec3f(v) => Ok(Spectrum::from([v.x, v.y, v.z])),
            ParamVal::Float(v) => Ok(Spectrum::uniform(*v)),
            _ => Err(TryFromParamErr("color"))
        }
    }
}

impl From<Spectrum> for ParamVal {
    fn from(value: Spectrum) -> ParamVal {
        ParamVal::Spectrum(value)
    }
}

impl From<&str> for ParamVal {
    fn from(value: &str) -> ParamVal {
        ParamVal::String(value.to_string())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    params: HashMap<String, ParamVal>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: &str, value: impl Into<ParamVal>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<ParamVal>) -> &mut Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Look up `name`. A missing option is `Ok(None)`; an option of the wrong type is an error.
    pub fn get<'a, T>(&'a self, name: &str) -> Result<Option<T>, ParamError>
        where T: TryFrom<&'a ParamVal, Error=TryFromParamErr>
    {
        match self.params.get(name) {
            None => Ok(None),
            Some(val) => T::try_from(val)
                .map(Some)
                .map_err(|e| ParamError {
                    name: name.to_string(),
                    expected_ty: e.0,
                    found_ty: val.type_name(),
                }),
        }
    }

    pub fn get_or<'a, T>(&'a self, name: &str, default: T) -> Result<T, ParamError>
        where T: TryFrom<&'a ParamVal, Error=TryFromParamErr>
    {
        Ok(self.get(name)?.unwrap_or(default))
    }

    /// Parse a `key=value` assignment as given on the command line.
    ///
    /// Values are read as, in order: `true`/`false`, an integer, a float, three comma separated
    /// floats (a vector, also accepted where a color is expected), or else a string.
    pub fn parse_assignment(&mut self, assignment: &str) -> anyhow::Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected key=value, got \"{}\"", assignment))?;
        let key = key.trim();
        anyhow::ensure!(!key.is_empty(), "empty option name in \"{}\"", assignment);
        self.set(key, parse_value(value.trim()));
        Ok(())
    }
}

fn parse_value(value: &str) -> ParamVal {
    if let Ok(b) = value.parse::<bool>() {
        return ParamVal::Bool(b);
    }
    if let Ok(i) = value.parse::<i32>() {
        return ParamVal::Int(i);
    }
    if let Ok(f) = value.parse::<Float>() {
        return ParamVal::Float(f);
    }
    let parts: Vec<_> = value.split(',').map(|s| s.trim().parse::<Float>()).collect();
    if parts.len() == 3 {
        if let [Ok(x), Ok(y), Ok(z)] = &parts[..] {
            return ParamVal::Vec3f(Vec3f::new(*x, *y, *z));
        }
    }
    ParamVal::String(value.to_string())
}
