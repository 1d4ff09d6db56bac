use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

/// A shared, immutable label map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(Arc<Map>);

pub type Map = BTreeMap<String, String>;

/// An immutable conjunction of label requirements.
///
/// Requirements are held in canonical order, so two selectors that express
/// the same conjunction compare equal and render identically. The empty
/// conjunction matches every label map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelSelector(Vec<Requirement>);

/// A single term of a label selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    Equals(String, String),
    In(String, BTreeSet<String>),
    NotIn(String, BTreeSet<String>),
    Exists(String),
    DoesNotExist(String),
}

// === impl LabelSelector ===

impl LabelSelector {
    pub fn new(mut requirements: Vec<Requirement>) -> Self {
        requirements.sort_by(Requirement::canonical_order);
        requirements.dedup();
        Self(requirements)
    }

    /// Indicates whether this selector matches every label map.
    pub fn selects_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.0
    }

    /// Evaluates the conjunction over a label map.
    ///
    /// Evaluation is total: keys that do not appear in the map are absent,
    /// so `NotIn` and `DoesNotExist` match and everything else does not.
    pub fn matches(&self, labels: &Labels) -> bool {
        self.0.iter().all(|req| req.matches(labels.as_ref()))
    }

    /// The stable string form used for subject identity and display.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<none>");
        }
        for (i, req) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            req.fmt(f)?;
        }
        Ok(())
    }
}

impl std::iter::FromIterator<Requirement> for LabelSelector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for LabelSelector {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| Requirement::Equals(k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

// === impl Requirement ===

impl Requirement {
    fn matches(&self, labels: &Map) -> bool {
        match self {
            Self::Equals(key, value) => labels.get(key) == Some(value),
            Self::In(key, values) => match labels.get(key) {
                Some(v) => values.contains(v),
                None => false,
            },
            Self::NotIn(key, values) => match labels.get(key) {
                Some(v) => !values.contains(v),
                None => true,
            },
            Self::Exists(key) => labels.contains_key(key),
            Self::DoesNotExist(key) => !labels.contains_key(key),
        }
    }

    fn key(&self) -> &str {
        match self {
            Self::Equals(key, _)
            | Self::In(key, _)
            | Self::NotIn(key, _)
            | Self::Exists(key)
            | Self::DoesNotExist(key) => key,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Equals(..) => 0,
            Self::In(..) => 1,
            Self::NotIn(..) => 2,
            Self::Exists(..) => 3,
            Self::DoesNotExist(..) => 4,
        }
    }

    fn values(&self) -> Vec<&str> {
        match self {
            Self::Equals(_, value) => vec![value.as_str()],
            Self::In(_, values) | Self::NotIn(_, values) => {
                values.iter().map(String::as_str).collect()
            }
            Self::Exists(_) | Self::DoesNotExist(_) => vec![],
        }
    }

    fn canonical_order(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(other.key())
            .then_with(|| self.rank().cmp(&other.rank()))
            .then_with(|| self.values().cmp(&other.values()))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn set(f: &mut fmt::Formatter<'_>, values: &BTreeSet<String>) -> fmt::Result {
            f.write_str("(")?;
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                f.write_str(value)?;
            }
            f.write_str(")")
        }

        match self {
            Self::Equals(key, value) => write!(f, "{key}={value}"),
            Self::In(key, values) => {
                write!(f, "{key} in ")?;
                set(f, values)
            }
            Self::NotIn(key, values) => {
                write!(f, "{key} notin ")?;
                set(f, values)
            }
            Self::Exists(key) => f.write_str(key),
            Self::DoesNotExist(key) => write!(f, "!{key}"),
        }
    }
}

// === impl Labels ===

impl From<Map> for Labels {
    #[inline]
    fn from(labels: Map) -> Self {
        Self(Arc::new(labels))
    }
}

impl From<Option<Map>> for Labels {
    #[inline]
    fn from(labels: Option<Map>) -> Self {
        labels.unwrap_or_default().into()
    }
}

impl AsRef<Map> for Labels {
    #[inline]
    fn as_ref(&self) -> &Map {
        self.0.as_ref()
    }
}

impl std::iter::FromIterator<(String, String)> for Labels {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

impl std::iter::FromIterator<(&'static str, &'static str)> for Labels {
    fn from_iter<T: IntoIterator<Item = (&'static str, &'static str)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
