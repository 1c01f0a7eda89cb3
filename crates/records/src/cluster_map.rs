use crate::types::AliasClusterEntry;
use std::collections::{BTreeSet, HashMap};

/// Alias → cluster lookup.
///
/// Each alias maps to exactly one cluster. When the source lists an alias
/// more than once the first row wins; later rows naming a different cluster
/// are counted in [`AliasClusterMap::conflicts`].
#[derive(Debug, Clone, Default)]
pub struct AliasClusterMap {
    clusters: HashMap<String, String>,
    conflicts: Vec<AliasClusterEntry>,
}

impl AliasClusterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = AliasClusterEntry>,
    {
        let mut map = Self::new();
        for entry in entries {
            map.insert(entry);
        }

        if !map.conflicts.is_empty() {
            log::warn!(
                "Alias cluster map: {} conflicting duplicate rows ignored (first row wins)",
                map.conflicts.len()
            );
        }

        map
    }

    fn insert(&mut self, entry: AliasClusterEntry) {
        match self.clusters.get(&entry.alias) {
            None => {
                self.clusters.insert(entry.alias, entry.cluster_name);
            }
            Some(existing) if *existing == entry.cluster_name => {}
            Some(_) => self.conflicts.push(entry),
        }
    }

    /// Cluster of an alias, `None` when the alias is unmapped
    pub fn cluster_of(&self, alias: &str) -> Option<&str> {
        self.clusters.get(alias).map(String::as_str)
    }

    /// All cluster names, sorted and deduplicated
    pub fn cluster_names(&self) -> Vec<String> {
        self.clusters
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted clusters reachable from the given aliases
    pub fn clusters_for<'a, I>(&self, aliases: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        aliases
            .into_iter()
            .filter_map(|alias| self.cluster_of(alias))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Rows dropped because their alias was already mapped elsewhere
    pub fn conflicts(&self) -> &[AliasClusterEntry] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(alias: &str, cluster: &str) -> AliasClusterEntry {
        AliasClusterEntry {
            alias: alias.to_string(),
            cluster_name: cluster.to_string(),
        }
    }

    #[test]
    fn first_row_wins_on_conflict() {
        let map = AliasClusterMap::from_entries(vec![
            entry("hydrogen", "Fuels"),
            entry("hydrogen", "Storage"),
            entry("hydrogen", "Fuels"),
            entry("ammonia", "Fuels"),
        ]);

        assert_eq!(map.cluster_of("hydrogen"), Some("Fuels"));
        assert_eq!(map.conflicts(), &[entry("hydrogen", "Storage")]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn cluster_names_are_sorted_and_unique() {
        let map = AliasClusterMap::from_entries(vec![
            entry("b", "Zeta"),
            entry("a", "Alpha"),
            entry("c", "Zeta"),
        ]);
        assert_eq!(map.cluster_names(), vec!["Alpha", "Zeta"]);
        assert_eq!(map.clusters_for(["c", "missing"]), vec!["Zeta"]);
        assert_eq!(map.cluster_of("missing"), None);
    }
}
