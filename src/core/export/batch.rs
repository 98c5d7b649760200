//! Batch partitioning
//!
//! Splits a frozen [`ArtifactMap`] into bounded, deterministically ordered
//! batches. Each batch becomes one archive.

use crate::domain::artifact::{ArtifactMap, Batch, BatchEntry};
use crate::domain::{PackratError, Result};

/// Partition artifacts into batches of at most `batch_size` entries
///
/// Artifacts are ordered by name (byte-wise) before slicing, so the same map
/// always produces the same batches regardless of how it was built. Batch
/// indices start at 1 and are contiguous. Every batch except possibly the
/// last holds exactly `batch_size` entries.
///
/// # Errors
///
/// Returns [`PackratError::Configuration`] if `batch_size` is zero.
///
/// # Examples
///
/// ```
/// use packrat::core::export::batch::partition;
/// use packrat::domain::{ArtifactMap, ArtifactRef};
///
/// let mut map = ArtifactMap::new();
/// for path in ["/d/E", "/d/A", "/d/C", "/d/B", "/d/D"] {
///     map.insert_first(ArtifactRef::parse(path).unwrap());
/// }
///
/// let batches = partition(&map, 2).unwrap();
/// let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
/// assert_eq!(sizes, vec![2, 2, 1]);
/// assert_eq!(batches[0].names().collect::<Vec<_>>(), vec!["A", "B"]);
/// ```
pub fn partition(artifacts: &ArtifactMap, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(PackratError::Configuration(
            "batch_size must be greater than 0".to_string(),
        ));
    }

    let mut entries: Vec<BatchEntry> = artifacts
        .iter()
        .map(|(name, dir)| BatchEntry {
            name: name.to_string(),
            source_dir: dir.to_path_buf(),
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let batches: Vec<Batch> = entries
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            index: i + 1,
            entries: chunk.to_vec(),
        })
        .collect();

    tracing::debug!(
        artifacts = artifacts.len(),
        batch_size,
        batches = batches.len(),
        "Partitioned artifacts into batches"
    );

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::ArtifactRef;

    fn map_of(paths: &[&str]) -> ArtifactMap {
        let mut map = ArtifactMap::new();
        for path in paths {
            map.insert_first(ArtifactRef::parse(path).unwrap());
        }
        map
    }

    #[test]
    fn test_partition_sizes_and_order() {
        let map = map_of(&["/d/E", "/d/A", "/d/C", "/d/B", "/d/D"]);
        let batches = partition(&map, 2).unwrap();

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].names().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(batches[1].names().collect::<Vec<_>>(), vec!["C", "D"]);
        assert_eq!(batches[2].names().collect::<Vec<_>>(), vec!["E"]);
        let indices: Vec<usize> = batches.iter().map(|b| b.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_partition_is_independent_of_insertion_order() {
        let forward = partition(&map_of(&["/x/a", "/x/b", "/x/c"]), 2).unwrap();
        let reverse = partition(&map_of(&["/x/c", "/x/b", "/x/a"]), 2).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let batches = partition(&map_of(&["/d/1", "/d/2", "/d/3", "/d/4"]), 2).unwrap();
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn test_partition_keeps_source_dirs() {
        let batches = partition(&map_of(&["/one/A", "/two/B"]), 10).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(
            batches[0].entries[1].source_path(),
            std::path::PathBuf::from("/two/B")
        );
    }

    #[test]
    fn test_partition_empty_map() {
        let batches = partition(&ArtifactMap::new(), 3).unwrap();
        assert!(batches.is_empty());
    }

    #[test]
    fn test_partition_rejects_zero_batch_size() {
        let result = partition(&map_of(&["/d/A"]), 0);
        assert!(matches!(result, Err(PackratError::Configuration(_))));
    }

    #[test]
    fn test_partition_byte_order() {
        // Uppercase sorts before lowercase in byte order
        let batches = partition(&map_of(&["/d/b", "/d/B", "/d/a"]), 5).unwrap();
        assert_eq!(batches[0].names().collect::<Vec<_>>(), vec!["B", "a", "b"]);
    }
}
