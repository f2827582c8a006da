//! Conversions from YAML fields to the types a configuration is built from

use std::convert::TryFrom;
use yaml_rust::yaml::Yaml;
use evalexpr::{HashMapContext, eval_number_with_context};

/// Types that can be parsed from a YAML field, with any named constants
/// and units looked up in the supplied context.
pub trait FromYaml: Sized {
    type Error;
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error>;
}

/// The textual form of a scalar field, if it is one.
fn scalar(arg: &Yaml) -> Option<String> {
    match arg {
        Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
        Yaml::Integer(i) => Some(i.to_string()),
        Yaml::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

impl FromYaml for bool {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Boolean(b) => Ok(b),
            _ => Err(())
        }
    }
}

impl FromYaml for String {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        scalar(&arg).ok_or(())
    }
}

/// Real numbers may be given as literals or as expressions, e.g. `3.4 * milli`.
impl FromYaml for f64 {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Real(s) => s.parse::<f64>().or(Err(())),
            Yaml::Integer(i) => Ok(i as f64),
            Yaml::String(s) => eval_number_with_context(&s, ctx).or(Err(())),
            _ => Err(())
        }
    }
}

impl FromYaml for i64 {
    type Error = ();
    fn from_yaml(arg: Yaml, _ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Integer(i) => Ok(i),
            _ => Err(())
        }
    }
}

impl FromYaml for usize {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let i: i64 = FromYaml::from_yaml(arg, ctx)?;
        usize::try_from(i).map_err(|_| ())
    }
}

/// A list of numbers; a single number is a list of length one.
impl FromYaml for Vec<f64> {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        match arg {
            Yaml::Array(array) => {
                if array.is_empty() {
                    return Err(());
                }
                array.into_iter()
                    .map(|y| f64::from_yaml(y, ctx))
                    .collect()
            },
            other => f64::from_yaml(other, ctx).map(|v| vec![v]),
        }
    }
}

/// Miller indices, e.g. `[2, 2, 0]`.
impl FromYaml for [i32; 3] {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let v = match arg {
            Yaml::Array(array) if array.len() == 3 => array,
            _ => return Err(()),
        };
        let mut hkl = [0; 3];
        for (i, y) in v.into_iter().enumerate() {
            let n: i64 = FromYaml::from_yaml(y, ctx)?;
            hkl[i] = i32::try_from(n).map_err(|_| ())?;
        }
        Ok(hkl)
    }
}

/// Positions in a unit cell, e.g. `[[0, 0, 0], [0.5, 0.5, 0.5]]`.
impl FromYaml for Vec<[f64; 3]> {
    type Error = ();
    fn from_yaml(arg: Yaml, ctx: &HashMapContext) -> Result<Self, Self::Error> {
        let array = match arg {
            Yaml::Array(array) if !array.is_empty() => array,
            _ => return Err(()),
        };
        array.into_iter()
            .map(|y| {
                let r: Vec<f64> = FromYaml::from_yaml(y, ctx)?;
                if r.len() == 3 { Ok([r[0], r[1], r[2]]) } else { Err(()) }
            })
            .collect()
    }
}
