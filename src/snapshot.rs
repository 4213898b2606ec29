//! Network snapshots
//!
//! A snapshot is the whole trained state: layer widths plus each layer's flat
//! weight arena. Written as JSON so a run can be stopped, inspected, and
//! resumed from the same weights.

use crate::error::{ParliamentError, Result};
use crate::network::{validate_sizes, Layer, Network};
use crate::ternary::{is_trit, Trit};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serializable copy of a [`Network`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Layer widths, input first
    pub sizes: Vec<usize>,
    /// One flat arena per layer, `units * (inputs + 1)` weights each
    pub layers: Vec<Vec<Trit>>,
}

impl NetworkSnapshot {
    /// Rebuild the network, rejecting anything that is not ternary or does not chain
    pub fn restore(&self) -> Result<Network> {
        validate_sizes(&self.sizes)?;
        let expected_layers = self.sizes.len() - 1;
        if self.layers.len() != expected_layers {
            return Err(ParliamentError::dimension(
                "snapshot layers",
                expected_layers,
                self.layers.len(),
            ));
        }

        let mut layers = Vec::with_capacity(expected_layers);
        for (i, weights) in self.layers.iter().enumerate() {
            if let Some(&bad) = weights.iter().find(|&&w| !is_trit(w as i32)) {
                return Err(ParliamentError::InvalidConfig(format!(
                    "snapshot layer {} holds non-ternary weight {}",
                    i, bad
                )));
            }
            layers.push(Layer::from_weights(
                self.sizes[i],
                self.sizes[i + 1],
                weights.clone(),
            )?);
        }
        Network::from_layers(layers)
    }

    /// Write as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        log::debug!(
            "saved snapshot {:?} ({} layers) to {}",
            self.sizes,
            self.layers.len(),
            path.display()
        );
        Ok(())
    }

    /// Read a JSON snapshot without restoring it
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(snapshot)
    }
}

impl Network {
    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            sizes: self.sizes(),
            layers: self.layers().iter().map(|l| l.weights().to_vec()).collect(),
        }
    }

    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<Self> {
        snapshot.restore()
    }

    /// Snapshot straight to disk
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        self.snapshot().save(path)
    }

    /// Load and restore a snapshot file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let snapshot = NetworkSnapshot::load(path)?;
        let net = snapshot
            .restore()
            .with_context(|| format!("Invalid snapshot {}", path.display()))?;
        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_restores_same_network() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = Network::random(&[4, 3, 2], &mut rng).unwrap();
        let snap = net.snapshot();
        assert_eq!(snap.sizes, vec![4, 3, 2]);
        assert_eq!(snap.layers[0].len(), 3 * 5);
        assert_eq!(snap.layers[1].len(), 2 * 4);

        let restored = Network::from_snapshot(&snap).unwrap();
        assert_eq!(restored, net);
    }

    #[test]
    fn test_restore_rejects_non_ternary() {
        let snap = NetworkSnapshot {
            sizes: vec![1, 1],
            layers: vec![vec![2, 0]],
        };
        assert!(matches!(
            snap.restore(),
            Err(ParliamentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_restore_rejects_bad_shapes() {
        let wrong_arena = NetworkSnapshot {
            sizes: vec![2, 2],
            layers: vec![vec![0; 5]],
        };
        assert!(matches!(
            wrong_arena.restore(),
            Err(ParliamentError::DimensionMismatch { expected: 6, actual: 5, .. })
        ));

        let missing_layer = NetworkSnapshot {
            sizes: vec![2, 2, 1],
            layers: vec![vec![0; 6]],
        };
        assert!(missing_layer.restore().is_err());

        let no_layers = NetworkSnapshot {
            sizes: vec![2],
            layers: vec![],
        };
        assert!(no_layers.restore().is_err());
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("net.json");

        let mut rng = StdRng::seed_from_u64(5);
        let net = Network::random(&[3, 2], &mut rng).unwrap();
        net.save(&path).unwrap();

        let loaded = Network::load(&path).unwrap();
        assert_eq!(loaded, net);
        assert_eq!(
            loaded.output(&[1, 0, -1]).unwrap(),
            net.output(&[1, 0, -1]).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"sizes": [1, 1], "layers": [[0, 0, 0]]}"#).unwrap();
        assert!(Network::load(&path).is_err());
        assert!(Network::load(dir.path().join("missing.json")).is_err());
    }
}
