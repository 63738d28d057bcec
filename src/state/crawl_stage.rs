/// Stage definitions for processing a single page URL
///
/// Each page moves linearly through the stages below; the only shortcut is
/// skipping `FetchingAssets` when the page introduced no new assets.
use std::fmt;

/// Represents where a page currently is in its processing unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStage {
    // ===== Active Stages =====
    /// The page GET is in flight
    Fetching,

    /// The page response is being checked and recorded
    Checking,

    /// Asset references are being extracted and filtered
    ExtractingAssets,

    /// The batch of new assets is in flight
    FetchingAssets,

    // ===== Terminal Stages =====
    /// The page and its new assets have been processed
    Done,

    /// The page check failed; its assets were not requested
    Failed,
}

impl CrawlStage {
    /// Returns true if no further processing happens for this page
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: CrawlStage) -> bool {
        matches!(
            (self, next),
            (Self::Fetching, Self::Checking)
                | (Self::Fetching, Self::Failed)
                | (Self::Checking, Self::ExtractingAssets)
                | (Self::Checking, Self::Failed)
                | (Self::ExtractingAssets, Self::FetchingAssets)
                | (Self::ExtractingAssets, Self::Done)
                | (Self::FetchingAssets, Self::Done)
        )
    }

    /// Moves to the next stage, rejecting transitions that skip or reverse
    pub fn advance(self, next: CrawlStage) -> Result<CrawlStage, crate::LoadstormError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(crate::LoadstormError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Checking => "checking",
            Self::ExtractingAssets => "extracting_assets",
            Self::FetchingAssets => "fetching_assets",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
