//! Numeric diagnostic codes.

use std::fmt;

/// Diagnostic codes for the semantic core.
///
/// Format: E#### where the first digit indicates the phase:
/// - E2xxx: type errors
/// - E9xxx: internal invariant breaches
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Type errors (E2xxx)
    /// Value type is not assignable to the target type
    E2001,
    /// A type argument could not be inferred from the use site
    E2002,
    /// A required argument is missing
    E2003,
    /// More arguments supplied than the callee declares
    E2004,
    /// Spread argument is not an iterable
    E2005,
    /// Named argument does not match any parameter
    E2006,
    /// Ambiguous or unmatched overloaded reference
    E2007,
    /// Narrowing condition can never succeed
    E2008,
    /// Narrowing condition provides no information
    E2009,
    /// Covariant/contravariant type parameter in a forbidden position
    E2010,
    /// Type argument outside an enumerated case constraint
    E2011,
    /// Invoked expression is not callable
    E2012,
    /// Exception type already handled by an earlier catch clause
    E2013,
    /// Destructuring pattern does not match the value's shape
    E2014,
    /// Returned value does not match the declared return type
    E2015,

    // Internal errors (E9xxx)
    /// Internal invariant breach in the checker itself
    E9001,
}

impl ErrorCode {
    /// The numeric value of the code.
    pub fn as_u32(self) -> u32 {
        match self {
            ErrorCode::E2001 => 2001,
            ErrorCode::E2002 => 2002,
            ErrorCode::E2003 => 2003,
            ErrorCode::E2004 => 2004,
            ErrorCode::E2005 => 2005,
            ErrorCode::E2006 => 2006,
            ErrorCode::E2007 => 2007,
            ErrorCode::E2008 => 2008,
            ErrorCode::E2009 => 2009,
            ErrorCode::E2010 => 2010,
            ErrorCode::E2011 => 2011,
            ErrorCode::E2012 => 2012,
            ErrorCode::E2013 => 2013,
            ErrorCode::E2014 => 2014,
            ErrorCode::E2015 => 2015,
            ErrorCode::E9001 => 9001,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.as_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        assert_eq!(ErrorCode::E2001.to_string(), "E2001");
        assert_eq!(ErrorCode::E9001.to_string(), "E9001");
    }
}
