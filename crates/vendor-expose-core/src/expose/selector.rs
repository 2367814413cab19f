use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ChainedMethod, CopyMethod, ExposeMethod, NullMethod, SymlinkMethod};

/// Environment variable consulted for the exposure method.
pub const METHOD_ENV: &str = "VENDOR_EXPOSE_METHOD";

/// Which exposure strategy a run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodSelector {
    None,
    Copy,
    Symlink,
    #[default]
    Auto,
}

impl MethodSelector {
    pub const ALL: [MethodSelector; 4] = [
        MethodSelector::None,
        MethodSelector::Copy,
        MethodSelector::Symlink,
        MethodSelector::Auto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MethodSelector::None => "none",
            MethodSelector::Copy => "copy",
            MethodSelector::Symlink => "symlink",
            MethodSelector::Auto => "auto",
        }
    }

    /// Build the concrete strategy. `auto` tries a symlink first and falls
    /// back to a real copy.
    pub fn build(self) -> Box<dyn ExposeMethod> {
        match self {
            MethodSelector::None => Box::new(NullMethod),
            MethodSelector::Copy => Box::new(CopyMethod),
            MethodSelector::Symlink => Box::new(SymlinkMethod),
            MethodSelector::Auto => Box::new(ChainedMethod::new(vec![
                Box::new(SymlinkMethod),
                Box::new(CopyMethod),
            ])),
        }
    }

    /// Interpret the raw value of [`METHOD_ENV`].
    ///
    /// Unset or blank means `None` (no override). Unrecognized values fall
    /// back to `auto`; the second element carries a warning for the caller.
    pub fn from_env_value(value: Option<&str>) -> (Option<Self>, Option<String>) {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return (None, None);
        };
        match raw.parse() {
            Ok(selector) => (Some(selector), None),
            Err(err) => (
                Some(MethodSelector::Auto),
                Some(format!("{err}; falling back to auto")),
            ),
        }
    }
}

impl fmt::Display for MethodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MethodSelector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        MethodSelector::ALL
            .into_iter()
            .find(|m| m.as_str() == lowered)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown exposure method '{}'. Use none, copy, symlink or auto",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_option() {
        for selector in MethodSelector::ALL {
            assert_eq!(selector.as_str().parse::<MethodSelector>().ok(), Some(selector));
        }
        assert_eq!("SYMLINK".parse::<MethodSelector>().ok(), Some(MethodSelector::Symlink));
        assert!("hardlink".parse::<MethodSelector>().is_err());
    }

    #[test]
    fn default_is_auto() {
        assert_eq!(MethodSelector::default(), MethodSelector::Auto);
    }

    #[test]
    fn env_value_handling() {
        assert_eq!(MethodSelector::from_env_value(None), (None, None));
        assert_eq!(MethodSelector::from_env_value(Some("  ")), (None, None));
        assert_eq!(
            MethodSelector::from_env_value(Some("copy")),
            (Some(MethodSelector::Copy), None)
        );

        let (selector, warning) = MethodSelector::from_env_value(Some("rsync"));
        assert_eq!(selector, Some(MethodSelector::Auto));
        assert!(warning.is_some_and(|w| w.contains("rsync")));
    }

    #[test]
    fn build_names_the_strategy() {
        assert_eq!(MethodSelector::None.build().name(), "none");
        assert_eq!(MethodSelector::Copy.build().name(), "copy");
        assert_eq!(MethodSelector::Symlink.build().name(), "symlink");
        assert_eq!(MethodSelector::Auto.build().name(), "symlink, copy");
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&MethodSelector::Symlink).expect("serialize");
        assert_eq!(json, "\"symlink\"");
    }
}
