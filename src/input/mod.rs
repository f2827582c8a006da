//! Parse input configuration file

use std::path::Path;
use std::ops::Add;
use yaml_rust::{YamlLoader, yaml::Yaml};
use evalexpr::*;

use crate::constants::*;

mod error;
mod types;
mod radiator;

pub use error::*;
pub use types::FromYaml;
pub use radiator::*;

/// Represents the input configuration, which defines values
/// for the beamline and radiator, and any named constants
/// that those values refer to.
pub struct Config {
    input: Yaml,
    ctx: HashMapContext,
}

impl Config {
    /// Loads a configuration file.
    /// Fails if the file cannot be opened or if it is not
    /// YAML-formatted.
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|_| InputError::file())?;
        Self::from_string(&contents)
    }

    /// Loads a YAML configuration from a string.
    /// Fails if the string is not formatted correctly.
    pub fn from_string(s: &str) -> Result<Self, InputError> {
        let input = YamlLoader::load_from_str(s)
            .map_err(|_| InputError::file())?;
        let input = input.first()
            .ok_or(InputError::file())?;

        Ok(Config {
            input: input.clone(),
            ctx: HashMapContext::new(),
        })
    }

    /// Loads units, physical constants and mathematical functions,
    /// then evaluates the named constants given in the specified
    /// `section`, in order, so that later entries may refer to earlier ones.
    ///
    /// Energies are in GeV, lengths in m and angles in rad, so that
    /// `3.4 * milli` is a length in m and `50 * urad` an angle.
    pub fn with_context(&mut self, section: &str) -> Result<&mut Self, InputError> {
        use helper::context_function;

        let mut ctx = context_map! {
            "me" => ELECTRON_MASS,
            "eV" => 1.0e-9,
            "keV" => 1.0e-6,
            "MeV" => 1.0e-3,
            "GeV" => 1.0,
            "TeV" => 1.0e3,
            "nano" => 1.0e-9,
            "micro" => 1.0e-6,
            "milli" => 1.0e-3,
            "centi" => 1.0e-2,
            "mrad" => 1.0e-3,
            "urad" => 1.0e-6,
            "pi" => std::f64::consts::PI,
            "degree" => std::f64::consts::PI / 180.0,
        }.map_err(|_| InputError::conversion(section, "units"))?;

        context_function!(ctx, "sqrt",   f64::sqrt);
        context_function!(ctx, "cbrt",   f64::cbrt);
        context_function!(ctx, "abs",    f64::abs);
        context_function!(ctx, "exp",    f64::exp);
        context_function!(ctx, "ln",     f64::ln);
        context_function!(ctx, "sin",    f64::sin);
        context_function!(ctx, "cos",    f64::cos);
        context_function!(ctx, "tan",    f64::tan);
        context_function!(ctx, "asin",   f64::asin);
        context_function!(ctx, "acos",   f64::acos);
        context_function!(ctx, "atan",   f64::atan);
        context_function!(ctx, "atan2",  f64::atan2, 2);
        context_function!(ctx, "floor",  f64::floor);
        context_function!(ctx, "ceil",   f64::ceil);
        context_function!(ctx, "round",  f64::round);

        self.ctx = ctx;

        let constants = match self.input[section].as_hash() {
            Some(hash) => hash,
            None => return Ok(self),
        };

        for (a, b) in constants {
            let key = match a {
                Yaml::String(k) => k,
                _ => continue,
            };

            let value = match b {
                Yaml::Integer(i) => Some(*i as f64),
                Yaml::Real(s) => s.parse::<f64>().ok(),
                Yaml::String(s) => eval_number_with_context(s, &self.ctx).ok(),
                _ => None,
            };

            // insert it into the context so it's available for the next read
            let value = value.ok_or_else(|| InputError::conversion(section, key))?;
            self.ctx.set_value(key.clone(), Value::from(value))
                .map_err(|_| {
                    eprintln!("Failed to insert {} = {} from {} block into context.", key, value, section);
                    InputError::conversion(section, key)
                })?;
        }

        Ok(self)
    }

    /// Follows a path of colon-separated sections,
    /// e.g. `'section:subsection:key'`, to a field.
    fn locate(&self, path: &str) -> Result<&Yaml, InputError> {
        path.split(':')
            .try_fold(&self.input, |y, s| {
                if y[s].is_badvalue() {
                    Err(InputError::location(path, s))
                } else {
                    Ok(&y[s])
                }
            })
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse the value as the specified type.
    /// The path to the key-value pair is specified by a string of colon-separated
    /// sections, e.g. `'collimator:diameter'`.
    pub fn read<T, S>(&self, path: S) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let field = self.locate(path)?;
        let key = path.rsplit(':').next().unwrap_or(path);
        T::from_yaml(field.clone(), &self.ctx)
            .map_err(|_| InputError::conversion(path, key))
    }

    /// Like `Config::read`, but returns `None` if the field is absent.
    /// A field that is present but cannot be converted is still an error.
    pub fn read_optional<T, S>(&self, path: S) -> Result<Option<T>, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        match self.read(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == InputErrorKind::Location => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The names of the entries in the section at `path`, in the order
    /// they appear.
    pub fn keys<S: AsRef<str>>(&self, path: S) -> Result<Vec<String>, InputError> {
        let path = path.as_ref();
        let hash = self.locate(path)?
            .as_hash()
            .ok_or_else(|| InputError::conversion(path, path))?;
        Ok(hash.keys().filter_map(|k| k.as_str().map(|s| s.to_owned())).collect())
    }

    /// Parses a string argument and evaluates it using the default context. Extends
    /// ```
    /// let arg = "2.0";
    /// let val = arg.parse::<f64>().unwrap();
    /// ```
    /// to handle mathematical expressions, e.g.
    /// ```ignore
    /// let arg = "2.0 * thickness / 20";
    /// let val = input.evaluate(arg).unwrap();
    /// ```
    /// where 'thickness' is specified in the input file.
    pub fn evaluate<S: AsRef<str>>(&self, arg: S) -> Option<f64> {
        eval_number_with_context(arg.as_ref(), &self.ctx).ok()
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse it as a looped variable, returning a Vec of the values.
    /// The loop is defined by a `start`, `stop` and `step`:
    ///
    /// ```
    /// # use cobrems::input::Config;
    /// let text: &str = "---
    ///     radiator:
    ///         edge:
    ///             start: 8.0
    ///             stop: 9.0
    ///             step: 0.5
    /// ";
    ///
    /// let values: Vec<f64> = Config::from_string(&text).unwrap()
    ///     .read_loop("radiator:edge").unwrap();
    ///
    /// assert_eq!(values, vec![8.0, 8.5, 9.0]);
    /// ```
    pub fn read_loop<T, S>(&self, path: S) -> Result<Vec<T>, InputError>
    where
        T: FromYaml + PartialOrd + Add<Output=T> + Copy,
        S: AsRef<str> {
        let key = path.as_ref();

        if self.read::<T, _>(format!("{}{}", key, ":start").as_str()).is_err() {
            let value = self.read(path)?;
            let v = vec![value];
            Ok(v)
        }
        else { // 'start' value found
            let start = self.read(format!("{}{}", key, ":start").as_str())?;
            let stop = self.read(format!("{}{}", key, ":stop").as_str())?;
            let step: T = self.read(format!("{}{}", key, ":step").as_str())?;

            let mut v: Vec<T> = Vec::new();
            let mut x = start;
            while x <= stop {
                v.push(x);
                let next = x + step;
                if !(next > x) {
                    return Err(InputError::conversion(key, "step"));
                }
                x = next;
            }
            Ok(v)
        }
    }
}

mod helper {
    macro_rules! context_function {
        ($ctx:expr, $name:literal, $func:expr) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let x = arg.as_number()?;
                    Ok(Value::Float($func(x)))
                })
            ).map_err(|_| InputError::conversion("functions", $name))?
        };
        ($ctx:expr, $name:literal, $func:expr, 2) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let arg = arg.as_fixed_len_tuple(2)?;
                    let x = arg[0].as_number()?;
                    let y = arg[1].as_number()?;
                    Ok(Value::Float($func(x, y)))
                })
            ).map_err(|_| InputError::conversion("functions", $name))?
        };
    }

    pub(super) use context_function;
}
