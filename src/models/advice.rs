use serde::{Deserialize, Serialize};

/// A single cultivation tip shown alongside the due activities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceTip {
  pub title: String,
  pub body: String,
}

impl AdviceTip {
  pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      body: body.into(),
    }
  }
}
