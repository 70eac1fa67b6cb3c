use quarry_error::{QuarryError, Result};
use std::fmt;

/// Column types understood by the planner.
///
/// The planner resolves references but does not evaluate expressions, so the
/// type set is exactly what DDL can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Int,
    Double,
    Char(usize),
    VarChar(usize),
    DateTime,
    Date,
    Time,
    Numeric {
        precision: usize,
        scale: Option<usize>,
    },
}

impl DataType {
    /// Look up a type from its SQL spelling, e.g. `varchar(25)`, `double
    /// precision`, `numeric(12,2)`.
    ///
    /// Unknown names are semantic errors.
    pub fn from_sql_name(s: &str) -> Result<DataType> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();

        let (name, args) = match lower.find('(') {
            Some(open) => {
                let close = lower
                    .rfind(')')
                    .ok_or_else(|| QuarryError::parse(format!("unbalanced parens in type: {s}")))?;
                let args = lower[open + 1..close]
                    .split(',')
                    .map(|a| {
                        a.trim().parse::<usize>().map_err(|_| {
                            QuarryError::parse(format!("invalid type argument in: {s}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                (lower[..open].trim().to_string(), args)
            }
            None => (lower.clone(), Vec::new()),
        };

        let expect_args = |n: usize| -> Result<()> {
            if args.len() != n {
                return Err(QuarryError::parse(format!(
                    "type {name} expects {n} argument(s), got {}",
                    args.len()
                )));
            }
            Ok(())
        };

        Ok(match name.as_str() {
            "int" | "integer" => DataType::Int,
            "double" | "double precision" => DataType::Double,
            "char" => {
                expect_args(1)?;
                DataType::Char(args[0])
            }
            "varchar" => {
                expect_args(1)?;
                DataType::VarChar(args[0])
            }
            "datetime" => DataType::DateTime,
            "date" => DataType::Date,
            "time" => DataType::Time,
            "numeric" | "decimal" => match args.as_slice() {
                [p] => DataType::Numeric {
                    precision: *p,
                    scale: None,
                },
                [p, s] => DataType::Numeric {
                    precision: *p,
                    scale: Some(*s),
                },
                _ => {
                    return Err(QuarryError::parse(format!(
                        "type {name} expects 1 or 2 arguments, got {}",
                        args.len()
                    )))
                }
            },
            _ => return Err(QuarryError::semantic(format!("unknown type name {s}"))),
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "INT"),
            Self::Double => write!(f, "DOUBLE"),
            Self::Char(n) => write!(f, "CHAR({n})"),
            Self::VarChar(n) => write!(f, "VARCHAR({n})"),
            Self::DateTime => write!(f, "DATETIME"),
            Self::Date => write!(f, "DATE"),
            Self::Time => write!(f, "TIME"),
            Self::Numeric {
                precision,
                scale: Some(s),
            } => write!(f, "NUMERIC({precision},{s})"),
            Self::Numeric {
                precision,
                scale: None,
            } => write!(f, "NUMERIC({precision})"),
        }
    }
}
