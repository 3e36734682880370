//! EntityClassifier: splits environment entities into transmitters and
//! receivers by their type tag.

use crate::config::DEFAULT_DEVICE_TYPE;
use crate::models::{EntityType, EnvironmentEntity, ReceiverDescriptor, TransmitterEntity};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedEntities {
    pub transmitters: Vec<TransmitterEntity>,
    pub receivers: Vec<ReceiverDescriptor>,
    /// Entities that are neither transmitter nor receiver, or duplicate ids.
    pub ignored: usize,
}

impl ClassifiedEntities {
    /// Ids in input order, transmitters first.
    pub fn population(&self) -> Vec<String> {
        self.transmitters
            .iter()
            .map(|tx| tx.id.clone())
            .chain(self.receivers.iter().map(|rx| rx.id.clone()))
            .collect()
    }
}

pub struct EntityClassifier;

impl EntityClassifier {
    /// Pure split preserving input order. A missing device type or antenna
    /// count is filled with its default (`"Default"`, 1) and logged.
    pub fn classify(entities: &[EnvironmentEntity]) -> ClassifiedEntities {
        let mut out = ClassifiedEntities::default();
        let mut seen = BTreeSet::new();

        for entity in entities {
            if entity.entity_type == EntityType::Other {
                debug!(id = %entity.id, "skipping non-radio entity");
                out.ignored += 1;
                continue;
            }
            if !seen.insert(entity.id.clone()) {
                warn!(id = %entity.id, "duplicate entity id, keeping the first occurrence");
                out.ignored += 1;
                continue;
            }

            let device_type = entity.device_type.clone().unwrap_or_else(|| {
                warn!(id = %entity.id, "entity has no device type, using '{}'", DEFAULT_DEVICE_TYPE);
                DEFAULT_DEVICE_TYPE.to_string()
            });

            match entity.entity_type {
                EntityType::Transmitter => {
                    let num_antennas = match entity.site.num_antennas {
                        Some(n) if n > 0 => n,
                        _ => {
                            warn!(id = %entity.id, "transmitter has no antenna count, using 1");
                            1
                        }
                    };
                    out.transmitters.push(TransmitterEntity {
                        id: entity.id.clone(),
                        site: entity.site.clone(),
                        num_antennas,
                        transmitter_type: device_type,
                        impairment_model_type: entity.impairment_model_type.clone(),
                    });
                }
                EntityType::Receiver => out.receivers.push(ReceiverDescriptor {
                    id: entity.id.clone(),
                    site: entity.site.clone(),
                    receiver_type: device_type,
                    sample_rate: entity.sample_rate,
                    sensitivity: entity.sensitivity,
                    noise_figure: entity.noise_figure,
                }),
                EntityType::Other => {}
            }
        }

        debug!(
            transmitters = out.transmitters.len(),
            receivers = out.receivers.len(),
            ignored = out.ignored,
            "entities classified"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Site;

    #[test]
    fn test_split_by_type_preserves_order() {
        let entities = vec![
            EnvironmentEntity::transmitter("tx-b", Site::at(0.0, 0.0, 0.0).with_antennas(2)),
            EnvironmentEntity::receiver("rx-1", Site::at(10.0, 0.0, 0.0)),
            EnvironmentEntity::transmitter("tx-a", Site::at(5.0, 0.0, 0.0)),
        ];
        let out = EntityClassifier::classify(&entities);
        let tx_ids: Vec<_> = out.transmitters.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(tx_ids, vec!["tx-b", "tx-a"]);
        assert_eq!(out.receivers.len(), 1);
        assert_eq!(out.transmitters[0].num_antennas, 2);
        assert_eq!(out.population(), vec!["tx-b", "tx-a", "rx-1"]);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let entities = vec![EnvironmentEntity::transmitter("tx", Site::at(0.0, 0.0, 0.0))];
        let out = EntityClassifier::classify(&entities);
        assert_eq!(out.transmitters[0].num_antennas, 1);
        assert_eq!(out.transmitters[0].transmitter_type, DEFAULT_DEVICE_TYPE);
    }

    #[test]
    fn test_other_and_duplicates_ignored() {
        let mut building = EnvironmentEntity::receiver("b", Site::at(0.0, 0.0, 0.0));
        building.entity_type = EntityType::Other;
        let entities = vec![
            building,
            EnvironmentEntity::receiver("rx", Site::at(0.0, 0.0, 0.0)),
            EnvironmentEntity::receiver("rx", Site::at(1.0, 0.0, 0.0)),
        ];
        let out = EntityClassifier::classify(&entities);
        assert_eq!(out.receivers.len(), 1);
        assert_eq!(out.ignored, 2);
        assert_eq!(out.receivers[0].site.position[0], 0.0);
    }
}
