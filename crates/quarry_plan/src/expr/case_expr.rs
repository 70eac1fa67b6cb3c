use super::Expr;
use quarry_error::{QuarryError, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct WhenThen {
    pub when: Expr,
    pub then: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// Subject of a simple CASE, e.g. `CASE x WHEN 1 THEN ...`.
    ///
    /// None for a searched CASE.
    pub eval: Option<Box<Expr>>,
    pub cases: Vec<WhenThen>,
    pub else_expr: Option<Box<Expr>>,
}

impl CaseExpr {
    /// Build a CASE from the flat expression list a grammar produces.
    ///
    /// With `has_else` the final element is the ELSE arm. Of the remaining
    /// work list, an odd length means the leading element is the evaluated
    /// subject; the rest are WHEN/THEN pairs. A work list that doesn't leave
    /// at least one full pair is a malformed tree.
    pub fn from_parts(mut exprs: Vec<Expr>, has_else: bool) -> Result<CaseExpr> {
        let else_expr = if has_else {
            match exprs.pop() {
                Some(e) => Some(Box::new(e)),
                None => return Err(QuarryError::parse("CASE with ELSE but no expressions")),
            }
        } else {
            None
        };

        let eval = if exprs.len() % 2 == 1 {
            Some(Box::new(exprs.remove(0)))
        } else {
            None
        };

        if exprs.is_empty() || exprs.len() % 2 != 0 {
            return Err(QuarryError::parse(format!(
                "malformed CASE: {} expressions remain after ELSE/subject",
                exprs.len()
            )));
        }

        let mut cases = Vec::with_capacity(exprs.len() / 2);
        let mut iter = exprs.into_iter();
        while let (Some(when), Some(then)) = (iter.next(), iter.next()) {
            cases.push(WhenThen { when, then });
        }

        Ok(CaseExpr {
            eval,
            cases,
            else_expr,
        })
    }
}

impl fmt::Display for CaseExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CASE")?;
        if let Some(eval) = &self.eval {
            write!(f, " {eval}")?;
        }
        for case in &self.cases {
            write!(f, " WHEN {} THEN {}", case.when, case.then)?;
        }
        if let Some(else_expr) = &self.else_expr {
            write!(f, " ELSE {else_expr}")?;
        }
        write!(f, " END")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::scalar::LiteralValue;
    use quarry_error::ErrorKind;

    fn lit(v: i64) -> Expr {
        Expr::literal(LiteralValue::Integer(v))
    }

    #[test]
    fn searched_case_with_else() {
        // CASE WHEN 1 THEN 2 ELSE 3 END
        let case = CaseExpr::from_parts(vec![lit(1), lit(2), lit(3)], true).unwrap();
        assert!(case.eval.is_none());
        assert_eq!(1, case.cases.len());
        assert_eq!(Some(Box::new(lit(3))), case.else_expr);
    }

    #[test]
    fn simple_case_without_else() {
        // CASE x WHEN 1 THEN 2 WHEN 3 THEN 4 END, x modeled as a literal here
        let case =
            CaseExpr::from_parts(vec![lit(0), lit(1), lit(2), lit(3), lit(4)], false).unwrap();
        assert_eq!(Some(Box::new(lit(0))), case.eval);
        assert_eq!(2, case.cases.len());
        assert!(case.else_expr.is_none());
    }

    #[test]
    fn simple_case_with_else() {
        // CASE x WHEN 1 THEN 2 ELSE 3 END
        let case = CaseExpr::from_parts(vec![lit(0), lit(1), lit(2), lit(3)], true).unwrap();
        assert_eq!(Some(Box::new(lit(0))), case.eval);
        assert_eq!(1, case.cases.len());
        assert_eq!(Some(Box::new(lit(3))), case.else_expr);
    }

    #[test]
    fn malformed_case() {
        // No WHEN/THEN pair at all.
        let err = CaseExpr::from_parts(vec![lit(1)], true).unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind);

        let err = CaseExpr::from_parts(Vec::new(), false).unwrap_err();
        assert_eq!(ErrorKind::Parse, err.kind);
    }
}
