//! A debug-oriented health report: table sizes, occupancy, and a chain
//! length histogram, modeled on the source's `dictGetStats`/
//! `dictGetStatsMsg` pair.

use std::fmt;

use super::vtable::DictType;
use super::Dict;

/// Number of histogram buckets; the last one catches every chain length
/// `>= HISTOGRAM_BUCKETS - 1`, matching the source's `DICT_STATS_VECTLEN`.
const HISTOGRAM_BUCKETS: usize = 50;

/// A snapshot of one bucket array's health.
#[derive(Debug, Clone)]
pub struct TableStats {
    pub size: usize,
    pub used: usize,
    pub non_empty_buckets: usize,
    pub max_chain_len: usize,
    /// `chain_len_histogram[i]` is the number of buckets with exactly `i`
    /// entries, except the last slot, which counts `>= HISTOGRAM_BUCKETS - 1`.
    pub chain_len_histogram: [u64; HISTOGRAM_BUCKETS],
}

impl TableStats {
    pub fn avg_chain_len(&self) -> f64 {
        if self.non_empty_buckets == 0 {
            0.0
        } else {
            self.used as f64 / self.non_empty_buckets as f64
        }
    }
}

impl fmt::Display for TableStats {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(
            f,
            "table size: {} used: {} non-empty buckets: {} max chain: {} avg chain: {:.2}",
            self.size,
            self.used,
            self.non_empty_buckets,
            self.max_chain_len,
            self.avg_chain_len()
        )?;
        for (len, count) in self.chain_len_histogram.iter().enumerate() {
            if *count > 0 {
                writeln!(f, "  chains of length {len}: {count}")?;
            }
        }
        Ok(())
    }
}

/// Combined stats for both tables; `rehashing` reports `ht[1]` stats only
/// while a rehash is in progress.
#[derive(Debug, Clone)]
pub struct DictStats {
    pub main: TableStats,
    pub rehashing: Option<TableStats>,
}

impl fmt::Display for DictStats {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "[main]\n{}", self.main)?;
        if let Some(rehash) = &self.rehashing {
            write!(f, "[rehash target]\n{rehash}")?;
        }
        Ok(())
    }
}

impl<K, V, T> Dict<K, V, T>
where
    T: DictType<K, V>,
{
    pub fn stats(&self) -> DictStats {
        DictStats {
            main: self.table_stats(0),
            rehashing: self.is_rehashing().then(|| self.table_stats(1)),
        }
    }

    fn table_stats(
        &self,
        table: usize,
    ) -> TableStats {
        let ht = &self.ht[table];
        let size = ht.size();

        let mut non_empty_buckets = 0;
        let mut max_chain_len = 0;
        let mut histogram = [0u64; HISTOGRAM_BUCKETS];

        for idx in 0..size {
            let len = ht.chain_len(idx);
            if len > 0 {
                non_empty_buckets += 1;
            }
            max_chain_len = max_chain_len.max(len);
            let bucket = len.min(HISTOGRAM_BUCKETS - 1);
            histogram[bucket] += 1;
        }

        TableStats {
            size,
            used: ht.used,
            non_empty_buckets,
            max_chain_len,
            chain_len_histogram: histogram,
        }
    }
}
