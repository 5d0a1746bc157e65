use std::path::Path;

use ahash::{AHashMap, AHashSet};

use crate::error::{Result, RibdifError};
use crate::fasta::numbered_lines;
use crate::label::{is_named_species, SequenceLabel};
use crate::types::GenomeStats;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomeEntry {
    pub genus: String,
    pub species: String,
    /// Records (marker copies or contigs) seen for this genome.
    pub count: u32,
}

/// Genomes of a corpus keyed by genome id, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct GenomeCensus {
    order: Vec<String>,
    entries: AHashMap<String, GenomeEntry>,
}

impl GenomeCensus {
    /// Reads only the `>` headers of a (possibly gzipped) FASTA corpus.
    pub fn from_fasta<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut census = GenomeCensus::default();

        for line in numbered_lines(path)? {
            let (line_no, line) = line?;
            if !line.starts_with('>') {
                continue;
            }
            let label = SequenceLabel::parse_contig(&line)
                .map_err(|e| RibdifError::format(path, line_no, e.to_string()))?;
            census.add(&label);
        }
        Ok(census)
    }

    pub fn add(&mut self, label: &SequenceLabel) {
        let genome_id = label.genome_id();
        if let Some(entry) = self.entries.get_mut(&genome_id) {
            entry.count += 1;
            return;
        }
        self.order.push(genome_id.clone());
        self.entries.insert(
            genome_id,
            GenomeEntry {
                genus: label.genus.clone(),
                species: label.species.clone(),
                count: 1,
            },
        );
    }

    pub fn get(&self, genome_id: &str) -> Option<&GenomeEntry> {
        self.entries.get(genome_id)
    }

    pub fn genome_ids(&self) -> &[String] {
        &self.order
    }

    pub fn stats(&self) -> GenomeStats {
        let genome_count = self.order.len();
        let named = self
            .entries
            .values()
            .filter(|e| is_named_species(&e.species))
            .count();
        let unique_species = self
            .entries
            .values()
            .filter(|e| is_named_species(&e.species))
            .map(|e| e.species.as_str())
            .collect::<AHashSet<_>>()
            .len();

        GenomeStats {
            genome_count,
            named,
            unnamed: genome_count - named,
            unique_species,
        }
    }

    /// Share of genomes carrying more than one record.
    pub fn multi_copy_fraction(&self) -> f64 {
        if self.order.is_empty() {
            return 0.0;
        }
        let multi = self.entries.values().filter(|e| e.count > 1).count();
        multi as f64 / self.order.len() as f64
    }
}
