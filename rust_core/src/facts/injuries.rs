//! Injury facts.
//!
//! No upstream schema exists yet, so every payload decodes to `NotYetSupported` and
//! flows through the consumer's ordinary skip path. A concrete decoder slots in here
//! as a new [`super::Fact`] variant once the feed contract is fixed.

use super::Fact;
use crate::error::IngestError;
use crate::models::Topic;

pub fn decode(_payload: &[u8]) -> Result<Fact, IngestError> {
    Err(IngestError::NotYetSupported(Topic::Injuries))
}
