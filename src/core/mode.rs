//! Permission mode parsing and rendering
//!
//! Accepts numeric octal strings (`"0755"`, `"750"`) and chmod-style symbolic
//! strings (`"u=rwx,g=rx,o-rwx"`, `"a+X"`). Symbolic modes are resolved against
//! the bits already present on the path, so the same mode can produce
//! different results on different levels of a hierarchy.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::ModeError;

/// Bits a mode may touch
pub const PERMISSION_MASK: u32 = 0o7777;

const USER_BITS: u32 = 0o4700;
const GROUP_BITS: u32 = 0o2070;
const OTHER_BITS: u32 = 0o1007;
const SETID_BITS: u32 = 0o6000;

fn clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([ugoa]*)((?:[-+=](?:[ugo]|[rwxXst]*))+)$").expect("valid clause regex")
    })
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([-+=])([ugo]|[rwxXst]*)").expect("valid action regex"))
}

/// A parsed permission mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    raw: String,
    spec: ModeSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ModeSpec {
    Numeric(u32),
    Symbolic(Vec<Clause>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    who: u32,
    actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Action {
    op: char,
    perms: Perms,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Perms {
    Letters(String),
    CopyFrom(char),
}

impl Mode {
    /// Parse a numeric or symbolic mode string
    pub fn parse(value: &str) -> Result<Self, ModeError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModeError::Empty);
        }

        if trimmed.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            let bits = u32::from_str_radix(trimmed, 8)
                .map_err(|_| ModeError::OutOfRange { value: u32::MAX })?;
            if bits > PERMISSION_MASK {
                return Err(ModeError::OutOfRange { value: bits });
            }
            return Ok(Self {
                raw: format_mode(bits),
                spec: ModeSpec::Numeric(bits),
            });
        }

        let clauses = trimmed
            .split(',')
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: trimmed.to_string(),
            spec: ModeSpec::Symbolic(clauses),
        })
    }

    /// The mode as written, with numeric modes normalised to four digits
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this mode is a plain octal number
    pub fn is_numeric(&self) -> bool {
        matches!(self.spec, ModeSpec::Numeric(_))
    }

    /// Compute the permission bits this mode yields on a path whose current
    /// bits are `current`
    pub fn resolve(&self, current: u32, is_directory: bool) -> u32 {
        match &self.spec {
            ModeSpec::Numeric(bits) => *bits,
            ModeSpec::Symbolic(clauses) => clauses
                .iter()
                .fold(current & PERMISSION_MASK, |bits, clause| {
                    clause.apply(bits, is_directory)
                }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Render permission bits the way they are read back: four octal digits,
/// higher-order (file type) bits stripped
pub fn format_mode(bits: u32) -> String {
    format!("{:04o}", bits & PERMISSION_MASK)
}

fn parse_clause(clause: &str) -> Result<Clause, ModeError> {
    let malformed = || ModeError::MalformedClause {
        clause: clause.to_string(),
    };
    let caps = clause_regex().captures(clause).ok_or_else(malformed)?;

    let who_letters = caps.get(1).map_or("", |m| m.as_str());
    let who = if who_letters.is_empty() || who_letters.contains('a') {
        PERMISSION_MASK
    } else {
        who_letters.chars().fold(0, |mask, c| {
            mask | match c {
                'u' => USER_BITS,
                'g' => GROUP_BITS,
                _ => OTHER_BITS,
            }
        })
    };

    let actions = action_regex()
        .captures_iter(caps.get(2).map_or("", |m| m.as_str()))
        .map(|action| {
            let op = action[1].chars().next().unwrap_or('=');
            let perms = match &action[2] {
                p @ ("u" | "g" | "o") => Perms::CopyFrom(p.chars().next().unwrap_or('u')),
                p => Perms::Letters(p.to_string()),
            };
            Action { op, perms }
        })
        .collect::<Vec<_>>();

    if actions.is_empty() {
        return Err(malformed());
    }

    Ok(Clause { who, actions })
}

impl Clause {
    fn apply(&self, mut bits: u32, is_directory: bool) -> u32 {
        for action in &self.actions {
            let wanted = match &action.perms {
                Perms::Letters(letters) => letters.chars().fold(0, |acc, c| {
                    acc | match c {
                        'r' => 0o444,
                        'w' => 0o222,
                        'x' => 0o111,
                        'X' if is_directory || bits & 0o111 != 0 => 0o111,
                        's' => SETID_BITS,
                        't' => 0o1000,
                        _ => 0,
                    }
                }),
                Perms::CopyFrom(class) => {
                    let triplet = match class {
                        'u' => (bits >> 6) & 0o7,
                        'g' => (bits >> 3) & 0o7,
                        _ => bits & 0o7,
                    };
                    triplet * 0o111
                }
            } & self.who;

            bits = match action.op {
                '+' => bits | wanted,
                '-' => bits & !wanted,
                _ => {
                    // Directories keep setuid/setgid unless asked explicitly
                    let cleared = if is_directory {
                        self.who & !SETID_BITS
                    } else {
                        self.who
                    };
                    (bits & !cleared) | wanted
                }
            };
        }
        bits
    }
}
