//! Declared shapes of positional command arguments

/// Type an argument must parse as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentKind {
    String,
    Integer,
    Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Bound {
    Integer(i64, i64),
    Float(f64, f64),
}

/// Format a single textual argument must satisfy.
///
/// Numeric kinds may carry an inclusive value range, strings an inclusive length range in
/// characters.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgumentFormat {
    kind: ArgumentKind,
    range: Option<Bound>,
    length_range: Option<(usize, usize)>,
}

impl ArgumentFormat {
    fn new(kind: ArgumentKind) -> Self {
        Self {
            kind,
            range: None,
            length_range: None,
        }
    }

    pub fn string() -> Self {
        Self::new(ArgumentKind::String)
    }

    #[allow(dead_code)] // no built-in command takes numeric arguments
    pub fn integer() -> Self {
        Self::new(ArgumentKind::Integer)
    }

    #[allow(dead_code)]
    pub fn float() -> Self {
        Self::new(ArgumentKind::Float)
    }

    /// Inclusive value range.  Ignored for string arguments.
    ///
    /// Integers are compared against the bounds as given, so `with_range(0.5, 10.0)` starts at 1.
    #[allow(dead_code)]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = match self.kind {
            ArgumentKind::Integer | ArgumentKind::Float => Some(Bound::Float(min, max)),
            ArgumentKind::String => None,
        };
        self
    }

    /// Inclusive integer range, without a round trip through `f64`.
    #[allow(dead_code)]
    pub fn with_int_range(mut self, min: i64, max: i64) -> Self {
        self.range = match self.kind {
            ArgumentKind::Integer => Some(Bound::Integer(min, max)),
            ArgumentKind::Float => Some(Bound::Float(min as f64, max as f64)),
            ArgumentKind::String => None,
        };
        self
    }

    /// Inclusive length range, in characters.  Only applies to string arguments.
    pub fn with_length(mut self, min: usize, max: usize) -> Self {
        self.length_range = Some((min, max));
        self
    }

    /// Whether `raw` satisfies this format.  Parse failures count as a mismatch.
    pub fn validate(&self, raw: &str) -> bool {
        match self.kind {
            ArgumentKind::String => match self.length_range {
                Some((min, max)) => {
                    let len = raw.chars().count();
                    min <= len && len <= max
                }
                None => true,
            },
            ArgumentKind::Integer => {
                let Ok(value) = raw.parse::<i64>() else {
                    return false;
                };
                match self.range {
                    Some(Bound::Integer(min, max)) => min <= value && value <= max,
                    Some(Bound::Float(min, max)) => {
                        let value = value as f64;
                        min <= value && value <= max
                    }
                    None => true,
                }
            }
            ArgumentKind::Float => {
                let Ok(value) = raw.parse::<f64>() else {
                    return false;
                };
                // NaN compares false against everything, so it can never satisfy a range.
                match self.range {
                    Some(Bound::Float(min, max)) => min <= value && value <= max,
                    Some(Bound::Integer(min, max)) => min as f64 <= value && value <= max as f64,
                    None => true,
                }
            }
        }
    }
}
