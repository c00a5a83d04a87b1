//! CreateSampledSegmentHandler - Creates a segment and fills it with a random
//! share of all known users.

use std::sync::Arc;

use crate::domain::foundation::{Percentage, Timestamp, Ttl};
use crate::domain::segment::{CohortSampler, MembershipWindow, Segment, SegmentError, SegmentSlug};
use crate::ports::SegmentRepository;

/// Command to create a segment populated by random sampling.
#[derive(Debug, Clone)]
pub struct CreateSampledSegmentCommand {
    pub slug: String,
    /// Share of the population to add, 1 to 100.
    pub percent: i64,
    /// Optional membership lifetime, e.g. `"72h"`.
    pub ttl: Option<String>,
}

/// Result of a sampled segment creation.
#[derive(Debug, Clone)]
pub struct CreateSampledSegmentResult {
    pub segment: Segment,
    pub population: usize,
    pub members_added: u64,
    pub expires_at: Option<Timestamp>,
}

/// Handler for creating sampled segments.
pub struct CreateSampledSegmentHandler {
    repository: Arc<dyn SegmentRepository>,
    sampler: Arc<CohortSampler>,
}

impl CreateSampledSegmentHandler {
    pub fn new(repository: Arc<dyn SegmentRepository>, sampler: Arc<CohortSampler>) -> Self {
        Self {
            repository,
            sampler,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSampledSegmentCommand,
    ) -> Result<CreateSampledSegmentResult, SegmentError> {
        // 1. Validate everything before touching the store
        let slug = SegmentSlug::new(&cmd.slug)?;
        if !(1..=100).contains(&cmd.percent) {
            return Err(SegmentError::invalid_percent(cmd.percent));
        }
        let percent = Percentage::try_new(cmd.percent)?;
        let ttl = parse_ttl(cmd.ttl.as_deref())?;

        // 2. Create the segment
        let segment = self.repository.create_segment(&slug).await?;

        // 3. Draw the cohort
        let population = self.repository.list_all_user_ids().await?;
        let population_size = population.len();
        let chosen = self.sampler.sample(population, percent);

        // 4. Insert with one shared window
        let window = MembershipWindow::now(ttl);
        let members_added = if chosen.is_empty() {
            0
        } else {
            self.repository
                .add_users_to_segment(segment.id, &chosen, &window)
                .await?
        };

        tracing::info!(
            segment = %segment.slug,
            percent = %percent,
            population = population_size,
            rows = members_added,
            "Sampled segment created"
        );

        Ok(CreateSampledSegmentResult {
            segment,
            population: population_size,
            members_added,
            expires_at: window.expires_at,
        })
    }
}

/// Parses an optional TTL; a blank string means no expiry.
pub(crate) fn parse_ttl(raw: Option<&str>) -> Result<Option<Ttl>, SegmentError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    Ok(Ttl::parse_optional(raw)?)
}
