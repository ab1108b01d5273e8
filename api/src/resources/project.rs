use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{Error, Result};

/// `<owner>/<project>` as used in URLs and as the `project` query parameter.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub String);

impl Id {
    pub fn owner(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or_default()
    }
}

impl FromStr for Id {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let string = string.trim();
        let valid_segment = |segment: &str| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        };
        match string.split_once('/') {
            Some((owner, name)) if valid_segment(owner) && valid_segment(name) => {
                Ok(Self(string.to_owned()))
            }
            _ => Err(Error::BadProjectIdentifier {
                identifier: string.into(),
            }),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub billing_group: Option<String>,
    #[serde(default)]
    pub root_folder: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewProject<'request> {
    pub name: &'request str,
    pub billing_group: &'request str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'request str>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Permissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub copy: bool,
    #[serde(default)]
    pub execute: bool,
    #[serde(default)]
    pub admin: bool,
}

impl Permissions {
    pub fn admin() -> Self {
        Self {
            read: true,
            write: true,
            copy: true,
            execute: true,
            admin: true,
        }
    }

    pub fn member() -> Self {
        Self {
            admin: false,
            ..Self::admin()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Member {
    pub username: String,
    #[serde(default)]
    pub permissions: Permissions,
}
