use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::error::{Result, RibdifError};

/// A FASTA record: header without the leading `>`, sequence lines joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub seq: String,
}

/// Open a plain or gzipped text file for buffered line reading.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).map_err(|e| RibdifError::missing(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

/// Undecodable text is a format problem of `path`, not an I/O failure.
fn line_error(path: &Path, line_no: usize, err: io::Error) -> RibdifError {
    if err.kind() == io::ErrorKind::InvalidData {
        RibdifError::format(path, line_no, format!("unreadable line: {}", err))
    } else {
        RibdifError::Io(err)
    }
}

/// Lines of a plain or gzipped text file with their 1-based line numbers.
pub fn numbered_lines(path: &Path) -> Result<impl Iterator<Item = Result<(usize, String)>> + '_> {
    let reader = open_reader(path)?;
    Ok(reader.lines().enumerate().map(move |(idx, line)| {
        let line_no = idx + 1;
        line.map(|l| (line_no, l))
            .map_err(|e| line_error(path, line_no, e))
    }))
}

/// Minimal multi-line FASTA reader that also supports .gz
pub fn read_fasta_records(path: &Path) -> Result<Vec<FastaRecord>> {
    let mut reader = open_reader(path)?;

    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;
    let mut line = String::new();
    let mut line_no = 0usize;

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| line_error(path, line_no + 1, e))?;
        if read == 0 {
            break; // EOF
        }
        line_no += 1;
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('>') {
            if let Some(done) = current.take() {
                records.push(done);
            }
            current = Some(FastaRecord {
                header: header.to_string(),
                seq: String::new(),
            });
        } else {
            match current.as_mut() {
                Some(rec) => rec.seq.push_str(trimmed.trim()),
                None => {
                    return Err(RibdifError::format(
                        path,
                        line_no,
                        "sequence data before the first `>` header",
                    ))
                }
            }
        }
    }
    if let Some(done) = current {
        records.push(done);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn reads_multiline_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.16S");
        std::fs::write(&path, ">a_1\nACGT\nAC\n\n>b_2\nGG\n").unwrap();

        let recs = read_fasta_records(&path).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].header, "a_1");
        assert_eq!(recs[0].seq, "ACGTAC");
        assert_eq!(recs[1].seq, "GG");
    }

    #[test]
    fn reads_gzipped_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.fna.gz");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b">x\nTTTT\n").unwrap();
        std::fs::write(&path, enc.finish().unwrap()).unwrap();

        let recs = read_fasta_records(&path).unwrap();
        assert_eq!(recs, vec![FastaRecord { header: "x".into(), seq: "TTTT".into() }]);
    }

    #[test]
    fn headerless_sequence_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fna");
        std::fs::write(&path, "ACGT\n>x\nA\n").unwrap();

        let err = read_fasta_records(&path).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = read_fasta_records(Path::new("/nonexistent/corpus.16S")).unwrap_err();
        assert!(matches!(err, RibdifError::MissingInput { .. }));
    }

    #[test]
    fn undecodable_lines_are_format_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bacillus-V4.uc");
        std::fs::write(&path, b"first\nH\t0\tG_1_\xff\xfe\n").unwrap();

        let lines: Vec<_> = numbered_lines(&path).unwrap().collect();
        assert_eq!(lines[0].as_ref().unwrap(), &(1, "first".to_string()));
        let err = lines[1].as_ref().unwrap_err();
        assert!(err.is_format_error());
        let msg = err.to_string();
        assert!(msg.contains("Bacillus-V4.uc"));
        assert!(msg.contains("line 2"));
    }

    #[test]
    fn undecodable_fasta_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.16S");
        std::fs::write(&path, b">a\nAC\xffGT\n").unwrap();

        let err = read_fasta_records(&path).unwrap_err();
        assert!(err.is_format_error());
        assert!(err.to_string().contains("corpus.16S"));
    }
}
