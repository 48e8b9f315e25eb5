use serde::{Deserialize, Serialize};

/// Identifier and length of one input sequence, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub id: String,
    pub length: u64,
}

impl QueryRecord {
    pub fn new(id: impl Into<String>, length: u64) -> Self {
        Self {
            id: id.into(),
            length,
        }
    }
}

/// A protein sequence handed to the aligner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySequence {
    pub id: String,
    pub residues: String,
}

impl QuerySequence {
    pub fn new(id: impl Into<String>, residues: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            residues: residues.into(),
        }
    }

    #[must_use]
    pub fn length(&self) -> u64 {
        self.residues.len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    #[must_use]
    pub fn record(&self) -> QueryRecord {
        QueryRecord::new(self.id.clone(), self.length())
    }

    /// Render as a single FASTA record, wrapped at 80 columns
    #[must_use]
    pub fn to_fasta(&self) -> String {
        let mut out = format!(">{}\n", self.id);
        for chunk in self.residues.as_bytes().chunks(80) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_fasta_wraps_lines() {
        let seq = QuerySequence::new("q1", "M".repeat(170));
        let fasta = seq.to_fasta();
        let lines: Vec<&str> = fasta.lines().collect();
        assert_eq!(lines[0], ">q1");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2].len(), 80);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(seq.record(), QueryRecord::new("q1", 170));
    }
}
