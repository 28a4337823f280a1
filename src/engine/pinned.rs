use std::collections::BTreeSet;

use crate::request::NetworkType;

/// Network types currently granted across all buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinnedNetworks {
    networks: BTreeSet<NetworkType>,
}

impl PinnedNetworks {
    pub fn from_granted(granted: impl IntoIterator<Item = NetworkType>) -> Self {
        Self {
            networks: granted.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn contains(&self, network: NetworkType) -> bool {
        self.networks.contains(&network)
    }

    /// The single network to report when a caller wants one answer.
    /// Cellular wins over Wi-Fi when both are pinned.
    pub fn preferred(&self) -> Option<NetworkType> {
        [NetworkType::Cell, NetworkType::Wifi]
            .into_iter()
            .find(|n| self.networks.contains(n))
            .or_else(|| self.networks.iter().next().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = NetworkType> + '_ {
        self.networks.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NetworkType> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_preferred_over_wifi() {
        let pinned = PinnedNetworks::from_granted([NetworkType::Wifi, NetworkType::Cell]);
        assert_eq!(pinned.preferred(), Some(NetworkType::Cell));
        assert!(pinned.contains(NetworkType::Wifi));
    }

    #[test]
    fn test_duplicates_collapse() {
        let pinned = PinnedNetworks::from_granted([NetworkType::Wifi, NetworkType::Wifi]);
        assert_eq!(pinned.to_vec(), vec![NetworkType::Wifi]);
        assert_eq!(pinned.preferred(), Some(NetworkType::Wifi));
    }

    #[test]
    fn test_empty_and_other_types() {
        assert_eq!(PinnedNetworks::default().preferred(), None);
        let pinned = PinnedNetworks::from_granted([NetworkType::Bluetooth]);
        assert_eq!(pinned.preferred(), Some(NetworkType::Bluetooth));
    }
}
