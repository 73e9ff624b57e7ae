use crc32fast::Hasher;

/// Hash a document path to a stable seed. Same path, same seed, so IDs
/// are reproducible across parses of the same file.
pub fn get_document_id(path: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential span-ID generator for one document: `<seed>-<n>`.
#[derive(Clone)]
pub struct IDGenerator {
    seed: String,
    count: u32,
}

impl IDGenerator {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_id(path),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}
