//! Core domain types: creator identities and asset kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PublishError, Result};

/// Whether an asset is published under a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreatorKind {
    User,
    Group,
}

impl CreatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Group => "GROUP",
        }
    }
}

/// The identity an asset is published on behalf of.
///
/// Determines platform-side ownership and which permission set the access
/// token is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub kind: CreatorKind,
    /// Numeric id, kept as a string (the platform uses 64-bit ids).
    pub id: String,
}

impl Creator {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            kind: CreatorKind::User,
            id: id.into(),
        }
    }

    pub fn group(id: impl Into<String>) -> Self {
        Self {
            kind: CreatorKind::Group,
            id: id.into(),
        }
    }

    /// Parse a `USER:123` / `GROUP:555` creator key.
    pub fn parse_key(key: &str) -> Result<Self> {
        let (kind, id) = key
            .split_once(':')
            .ok_or_else(|| PublishError::Validation(format!("invalid creator key: {key}")))?;
        let kind = match kind {
            "USER" => CreatorKind::User,
            "GROUP" => CreatorKind::Group,
            other => {
                return Err(PublishError::Validation(format!(
                    "invalid creator type: {other}"
                )))
            }
        };
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(PublishError::Validation(format!(
                "invalid creator id: {id:?}"
            )));
        }
        Ok(Self {
            kind,
            id: id.to_string(),
        })
    }

    /// The `USER:<id>` / `GROUP:<id>` key form.
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }
}

impl fmt::Display for Creator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Asset kinds the publish pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetKind {
    Animation,
    Audio,
    Model,
}

impl AssetKind {
    /// Wire name used in the Open Cloud `assetType` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Animation => "ANIMATION",
            Self::Audio => "AUDIO",
            Self::Model => "MODEL",
        }
    }

    /// Normalize a form value; anything unrecognized falls back to Animation.
    pub fn normalize(input: &str) -> Self {
        match input {
            "AUDIO" | "Audio" => Self::Audio,
            "MODEL" | "Model" => Self::Model,
            _ => Self::Animation,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
