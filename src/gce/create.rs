//! Batch creation of Compute Engine instances.
//!
//! Names are generated up front, each one is paired with a zone, and all
//! insert requests are issued together. Every request runs to completion;
//! instances accepted before a failure stay in place and are reported in
//! the error.

use std::collections::HashSet;

use futures::future::join_all;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, warn};

use crate::config::PlacementPolicy;
use crate::provider::CreatedInstance;

use super::api::{ComputeApi, NewInstance};
use super::zone::assign_zones;
use super::{GceError, GceProvider, PROVIDER_NAME};

const SUFFIX_LEN: usize = 8;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn random_suffix<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .filter_map(|_| SUFFIX_ALPHABET.choose(rng))
        .map(|byte| char::from(*byte))
        .collect()
}

/// Generates `count` distinct `{prefix}-{suffix}` names.
pub(super) fn generate_names<R: Rng + ?Sized>(
    prefix: &str,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    while names.len() < count {
        let candidate = format!("{prefix}-{}", random_suffix(rng));
        if seen.insert(candidate.clone()) {
            names.push(candidate);
        }
    }
    names
}

fn collect_batch(
    requested: usize,
    outcomes: Vec<Result<CreatedInstance, GceError>>,
) -> Result<Vec<CreatedInstance>, GceError> {
    let mut created = Vec::with_capacity(outcomes.len());
    let mut failure = None;
    for outcome in outcomes {
        match outcome {
            Ok(instance) => created.push(instance),
            Err(err) => {
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }
    }

    let Some(first_failure) = failure else {
        info!(provider = PROVIDER_NAME, count = created.len(), "created instances");
        return Ok(created);
    };

    let created_names = created
        .into_iter()
        .map(|instance| instance.name)
        .collect::<Vec<_>>();
    warn!(
        provider = PROVIDER_NAME,
        requested,
        created = created_names.len(),
        failure = %first_failure,
        "instance batch partially failed"
    );
    Err(GceError::PartialCreate {
        requested,
        created: created_names,
        failure: Box::new(first_failure),
    })
}

impl<C: ComputeApi> GceProvider<C> {
    fn source_image(&self) -> String {
        format!(
            "projects/{}/global/images/{}",
            self.config.project_id.trim(),
            self.config.image_name.trim()
        )
    }

    async fn placements(&self, names: Vec<String>) -> Result<Vec<(String, String)>, GceError> {
        match &self.placement {
            PlacementPolicy::Zone(zone) => Ok(names
                .into_iter()
                .map(|name| (name, zone.clone()))
                .collect()),
            PlacementPolicy::Random => {
                let zones = self.available_zones().await?;
                assign_zones(names, &zones, &mut rand::thread_rng())
            }
        }
    }

    pub(super) async fn create(&self, count: usize) -> Result<Vec<CreatedInstance>, GceError> {
        debug!(provider = PROVIDER_NAME, count, "creating instances");
        if count == 0 {
            return Ok(Vec::new());
        }

        let names = generate_names(self.prefix(), count, &mut rand::thread_rng());
        let placements = self.placements(names).await?;

        let source_image = self.source_image();
        let tags = self.config.tag_list();
        let requests = placements
            .into_iter()
            .map(|(name, zone)| NewInstance {
                name,
                zone,
                machine_type: self.config.machine_type.trim().to_owned(),
                source_image: source_image.clone(),
                tags: tags.clone(),
                allow_http: true,
            })
            .collect::<Vec<_>>();

        let outcomes = join_all(requests.iter().map(|request| async move {
            self.api
                .insert_instance(request)
                .await
                .map(|()| CreatedInstance {
                    name: request.name.clone(),
                    region: request.zone.clone(),
                })
        }))
        .await;

        collect_batch(count, outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    #[rstest]
    fn names_carry_prefix_and_lowercase_suffix() {
        let mut rng = StdRng::seed_from_u64(7);
        let names = generate_names("proxy", 16, &mut rng);
        assert_eq!(names.len(), 16);
        for name in &names {
            let suffix = name
                .strip_prefix("proxy-")
                .unwrap_or_else(|| panic!("missing prefix: {name}"));
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(
                suffix
                    .bytes()
                    .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit()),
                "unexpected suffix: {suffix}"
            );
        }
    }

    #[rstest]
    fn names_within_a_batch_are_distinct() {
        let mut rng = StdRng::seed_from_u64(11);
        let names = generate_names("proxy", 500, &mut rng);
        let unique = names.iter().collect::<HashSet<_>>();
        assert_eq!(unique.len(), names.len());
    }

    #[rstest]
    fn batch_without_failures_returns_every_instance() {
        let outcomes = vec![
            Ok(CreatedInstance {
                name: String::from("proxy-a"),
                region: String::from("z1"),
            }),
            Ok(CreatedInstance {
                name: String::from("proxy-b"),
                region: String::from("z2"),
            }),
        ];
        let created = collect_batch(2, outcomes).unwrap_or_else(|err| panic!("batch: {err}"));
        assert_eq!(created.len(), 2);
    }

    #[rstest]
    fn batch_failure_reports_created_names_and_first_error() {
        let outcomes = vec![
            Err(GceError::Api {
                status: 403,
                message: String::from("quota"),
            }),
            Ok(CreatedInstance {
                name: String::from("proxy-b"),
                region: String::from("z2"),
            }),
            Err(GceError::Api {
                status: 500,
                message: String::from("backend"),
            }),
        ];
        let err = collect_batch(3, outcomes).expect_err("batch should fail");
        assert_eq!(
            err,
            GceError::PartialCreate {
                requested: 3,
                created: vec![String::from("proxy-b")],
                failure: Box::new(GceError::Api {
                    status: 403,
                    message: String::from("quota"),
                }),
            }
        );
    }
}
