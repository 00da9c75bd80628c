//! Comma separated list arguments.
use std::fmt::Display;
use std::ops::Deref;
use std::str::FromStr;

/// A clap argument provided as a list of items separated by `SEPARATOR`, which by default is a ','.
///
/// Whitespace around items is ignored, as are empty items, so `"a, b,"` holds `a` and `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedList<T, const SEPARATOR: char = ','>(pub Vec<T>);

impl<T, const SEPARATOR: char> FromStr for SeparatedList<T, SEPARATOR>
where
    T: FromStr<Err: Into<anyhow::Error>>,
{
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let items = s
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| item.parse::<T>().map_err(Into::into))
            .collect::<Result<Vec<T>, Self::Err>>()?;
        if items.is_empty() {
            anyhow::bail!("expected at least one item separated by '{SEPARATOR}'");
        }
        Ok(Self(items))
    }
}

impl<T, const SEPARATOR: char> Deref for SeparatedList<T, SEPARATOR> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Display, const SEPARATOR: char> Display for SeparatedList<T, SEPARATOR> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

impl<T, const SEPARATOR: char> IntoIterator for SeparatedList<T, SEPARATOR> {
    type Item = T;

    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
