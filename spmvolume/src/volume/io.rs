use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::volume::kmedians::KMediansResult;

/// Versioned on-disk wrapper for a clustering result.
#[derive(Serialize, Deserialize, Encode, Decode)]
pub struct ResultFile {
    pub version: u32,
    pub result: KMediansResult,
}

impl ResultFile {
    pub fn new(result: KMediansResult) -> Self {
        Self { version: 1, result }
    }
}

// --- JSON (human-readable) ---
pub fn save_json(path: &str, result: &KMediansResult) -> std::io::Result<()> {
    let f = BufWriter::new(File::create(path)?);
    let rf = ResultFile::new(result.clone());
    serde_json::to_writer_pretty(f, &rf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

pub fn load_json(path: &str) -> std::io::Result<KMediansResult> {
    let f = BufReader::new(File::open(path)?);
    let rf: ResultFile = serde_json::from_reader(f)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(rf.result)
}

// --- Bincode (compact) ---
pub fn save_bincode(path: &str, result: &KMediansResult) -> std::io::Result<()> {
    let bytes = bincode::encode_to_vec(
        ResultFile::new(result.clone()),
        bincode::config::standard(),
    )
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    let mut f = BufWriter::new(File::create(path)?);
    f.write_all(&bytes)
}

pub fn load_bincode(path: &str) -> std::io::Result<KMediansResult> {
    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
    let (rf, _): (ResultFile, usize) =
        bincode::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    Ok(rf.result)
}
