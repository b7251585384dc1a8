use serde::Serialize;
use tracing::{debug, trace};

use crate::clock::Clock;
use crate::device::Device;
use crate::engine::error::ScriptError;
use crate::graph::screen_model::{MatchedElement, Screen, ScreenNr};
use crate::graph::script_graph::{ExpectedScreenSet, ScriptGraph};

/// Result of a successful screen detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenMatch {
    pub screen_nr: ScreenNr,

    /// Every required object, with the attributes the device reported
    pub required: Vec<MatchedElement>,

    /// Optional objects that were present at match time
    pub optional: Vec<MatchedElement>,

    /// Number of polls spent across all candidates
    pub polls: u32,
}

/// Resolve which of the expected screens is currently displayed.
///
/// Candidates are tried in the order given; the first full match wins.
/// Without `retry` each candidate is checked once. With `retry` each
/// candidate is polled up to its `max_retries` times, sleeping its
/// `wait_time` between polls, before moving on to the next candidate.
///
/// Matching only queries the device, so repeated calls against an
/// unchanged screen return the same result.
pub fn can_proceed(
    device: &mut dyn Device,
    clock: &dyn Clock,
    graph: &ScriptGraph,
    expected: &ExpectedScreenSet,
    retry: bool,
) -> Result<ScreenMatch, ScriptError> {
    let started = clock.elapsed();
    let mut polls = 0u32;

    for screen_nr in expected.iter() {
        let screen = graph
            .screen(screen_nr)
            .ok_or(ScriptError::UnknownScreen(screen_nr))?;

        let budget = if retry { screen.max_retries.max(1) } else { 1 };

        for attempt in 1..=budget {
            polls += 1;
            if let Some(required) = match_required(device, screen)? {
                let optional = collect_optional(device, screen)?;
                debug!(
                    screen_nr,
                    attempt,
                    optional = optional.len(),
                    "screen matched"
                );
                return Ok(ScreenMatch {
                    screen_nr,
                    required,
                    optional,
                    polls,
                });
            }

            trace!(screen_nr, attempt, budget, "screen not displayed");
            if attempt < budget {
                clock.sleep(screen.wait_time);
            }
        }
    }

    Err(ScriptError::ScreenNotFound {
        tried: expected.as_slice().to_vec(),
        polls,
        elapsed: clock.elapsed().saturating_sub(started),
    })
}

/// All required objects of `screen`, or `None` as soon as one is missing.
fn match_required(
    device: &mut dyn Device,
    screen: &Screen,
) -> Result<Option<Vec<MatchedElement>>, ScriptError> {
    let mut found = Vec::with_capacity(screen.required_objects.len());
    for signature in &screen.required_objects {
        match device.query(signature)? {
            Some(attributes) => found.push(MatchedElement {
                signature: signature.clone(),
                attributes,
            }),
            None => return Ok(None),
        }
    }
    Ok(Some(found))
}

fn collect_optional(
    device: &mut dyn Device,
    screen: &Screen,
) -> Result<Vec<MatchedElement>, ScriptError> {
    let mut found = Vec::new();
    for signature in &screen.optional_objects {
        if let Some(attributes) = device.query(signature)? {
            found.push(MatchedElement {
                signature: signature.clone(),
                attributes,
            });
        }
    }
    Ok(found)
}
