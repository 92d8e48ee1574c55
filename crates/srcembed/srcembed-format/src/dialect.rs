use crate::FormatError;
use std::fmt;
use std::str::FromStr;

/// Target language of the emitted declaration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Dialect {
    /// `const char name[] { ... };` (brace initialization)
    Cpp,
    /// `const char name[] = { ... };`
    C,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Cpp, Dialect::C];

    /// Command-line spelling.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Cpp => "c++",
            Dialect::C => "c",
        }
    }

    /// Text between the variable name and the first byte.
    pub(crate) fn opening(self) -> &'static str {
        match self {
            Dialect::Cpp => "[] { ",
            Dialect::C => "[] = { ",
        }
    }

    pub(crate) fn closing(self) -> &'static str {
        " };\n"
    }
}

impl FromStr for Dialect {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| FormatError::UnknownDialect(s.to_string()))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
