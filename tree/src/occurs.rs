use std::fmt;

use super::error::TreeError;

pub const UNBOUNDED: &str = "unbounded";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaxOccurs {
    Unbounded,
    Count(u64),
}

impl MaxOccurs {
    pub fn parse(source: &str) -> Result<Self, TreeError> {
        if source == UNBOUNDED {
            Ok(Self::Unbounded)
        } else {
            source
                .trim()
                .parse()
                .map(Self::Count)
                .map_err(|_| TreeError::InvalidOccurs(source.into()))
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str(UNBOUNDED),
            Self::Count(count) => write!(f, "{count}"),
        }
    }
}

/// The `minOccurs`/`maxOccurs` pair of a particle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Occurrences {
    pub min: u64,
    pub max: MaxOccurs,
}

impl Default for Occurrences {
    fn default() -> Self {
        Self {
            min: 1,
            max: MaxOccurs::Count(1),
        }
    }
}

impl Occurrences {
    pub fn new(min: u64, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    /// Reads the attribute values of a particle; absent attributes default to 1.
    pub fn from_attributes(
        min_occurs: Option<&str>,
        max_occurs: Option<&str>,
    ) -> Result<Self, TreeError> {
        let min = min_occurs
            .map(|min| {
                min.trim()
                    .parse()
                    .map_err(|_| TreeError::InvalidOccurs(min.into()))
            })
            .transpose()?
            .unwrap_or(1);
        let max = max_occurs
            .map(MaxOccurs::parse)
            .transpose()?
            .unwrap_or(MaxOccurs::Count(1));
        Ok(Self { min, max })
    }
}

/// The label shown next to a particle, e.g. `( 0 , * )`.
impl fmt::Display for Occurrences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            MaxOccurs::Unbounded => write!(f, "( {} , * )", self.min),
            MaxOccurs::Count(max) => write!(f, "( {} , {} )", self.min, max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_attributes_default_to_one() {
        let occurs = Occurrences::from_attributes(None, None).unwrap();
        assert_eq!(occurs, Occurrences::default());
    }

    #[test]
    fn reads_unbounded() {
        let occurs = Occurrences::from_attributes(Some("0"), Some("unbounded")).unwrap();
        assert_eq!(occurs, Occurrences::new(0, MaxOccurs::Unbounded));
        assert_eq!(occurs.to_string(), "( 0 , * )");
    }

    #[test]
    fn label_shows_bounded_range() {
        let occurs = Occurrences::new(2, MaxOccurs::Count(5));
        assert_eq!(occurs.to_string(), "( 2 , 5 )");
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            Occurrences::from_attributes(Some("-1"), None),
            Err(TreeError::InvalidOccurs("-1".into()))
        );
        assert_eq!(
            Occurrences::from_attributes(None, Some("many")),
            Err(TreeError::InvalidOccurs("many".into()))
        );
    }
}
