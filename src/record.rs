//! Fixed-size typed record codecs used by the B+-tree value file.
//!
//! Every record type implements [`Record`]: a fixed `SIZE`, a symmetric
//! serialize/deserialize pair operating on raw byte slices, an `id`
//! accessor (the tree's own key is independent of this id; value-file rows
//! additionally embed it for `find_id_by_name` scans), and a name/title
//! equality predicate used by linear `find_id_by_name` lookups.
//!
//! String fields are stored as fixed-width NUL-padded byte arrays.
//! Title/keywords/name truncate from the right (drop the tail); the author
//! organization field truncates from the left (keeps the suffix, since
//! organization strings such as "Department of X, University of Y" carry
//! more identifying signal in the tail) per spec §4.2/§9.

/// Capability set a B+-tree value type must implement.
pub trait Record: Sized + Clone + Default {
    /// On-disk size in bytes. Must satisfy `(4096 - 4) / SIZE >= 1`.
    const SIZE: usize;

    /// Encode `self` into `out`, which is exactly `Self::SIZE` bytes.
    fn serialize(&self, out: &mut [u8]);

    /// Decode a record from `input`, which is exactly `Self::SIZE` bytes.
    fn deserialize(input: &[u8]) -> Self;

    /// The record's own id field (`-1` denotes "not found" / default).
    fn id(&self) -> i64;

    /// Compares the name/title field only, ignoring `id`. Used by
    /// `find_id_by_name`'s linear scan.
    fn matches_query(&self, query: &Self) -> bool;
}

fn write_padded(out: &mut [u8], value: &str) {
    out.fill(0);
    let usable = out.len().saturating_sub(1);
    let bytes = value.as_bytes();
    let take = bytes.len().min(usable);
    out[..take].copy_from_slice(&bytes[..take]);
}

/// Truncates from the left: keeps the suffix when `value` is too long.
fn write_padded_left_truncated(out: &mut [u8], value: &str) {
    out.fill(0);
    let usable = out.len().saturating_sub(1);
    let bytes = value.as_bytes();
    if bytes.len() <= usable {
        out[..bytes.len()].copy_from_slice(bytes);
    } else {
        let start = bytes.len() - usable;
        out[..usable].copy_from_slice(&bytes[start..]);
    }
}

fn read_nul_padded(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Sentinel id used by any record "not found" in the store.
pub const NOT_FOUND_ID: i64 = -1;

const PAPER_TITLE_LEN: usize = 96;
const PAPER_KEYWORDS_LEN: usize = 40;
const PAPER_AUTHORS: usize = 8;

/// Fixed 216-byte paper record: title (95 usable bytes), keywords (39
/// usable bytes), up to 8 author ids, citation count, publication year,
/// and the paper's own id.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperRecord {
    pub title: String,
    pub keywords: String,
    pub author_ids: [i64; PAPER_AUTHORS],
    pub n_citations: u32,
    pub pub_year: u32,
    pub id: i64,
}

impl PaperRecord {
    pub fn new(
        title: impl Into<String>,
        keywords: impl Into<String>,
        author_ids: [i64; PAPER_AUTHORS],
        n_citations: u32,
        pub_year: u32,
        id: i64,
    ) -> Self {
        Self {
            title: title.into(),
            keywords: keywords.into(),
            author_ids,
            n_citations,
            pub_year,
            id,
        }
    }

    /// Query-stub constructor used only to compare by title.
    pub fn query(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            keywords: String::new(),
            author_ids: [0; PAPER_AUTHORS],
            n_citations: 0,
            pub_year: 0,
            id: NOT_FOUND_ID,
        }
    }
}

impl Default for PaperRecord {
    fn default() -> Self {
        Self {
            title: String::new(),
            keywords: String::new(),
            author_ids: [0; PAPER_AUTHORS],
            n_citations: 0,
            pub_year: 0,
            id: NOT_FOUND_ID,
        }
    }
}

impl Record for PaperRecord {
    const SIZE: usize = PAPER_TITLE_LEN + PAPER_KEYWORDS_LEN + PAPER_AUTHORS * 8 + 4 + 4 + 8;

    fn serialize(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), Self::SIZE);
        write_padded(&mut out[0..PAPER_TITLE_LEN], &self.title);
        write_padded(
            &mut out[PAPER_TITLE_LEN..PAPER_TITLE_LEN + PAPER_KEYWORDS_LEN],
            &self.keywords,
        );
        let authors_off = PAPER_TITLE_LEN + PAPER_KEYWORDS_LEN;
        for (i, author) in self.author_ids.iter().enumerate() {
            let off = authors_off + i * 8;
            out[off..off + 8].copy_from_slice(&author.to_le_bytes());
        }
        let n_citations_off = authors_off + PAPER_AUTHORS * 8;
        out[n_citations_off..n_citations_off + 4].copy_from_slice(&self.n_citations.to_le_bytes());
        let pub_year_off = n_citations_off + 4;
        out[pub_year_off..pub_year_off + 4].copy_from_slice(&self.pub_year.to_le_bytes());
        let id_off = pub_year_off + 4;
        out[id_off..id_off + 8].copy_from_slice(&self.id.to_le_bytes());
    }

    fn deserialize(input: &[u8]) -> Self {
        debug_assert_eq!(input.len(), Self::SIZE);
        let title = read_nul_padded(&input[0..PAPER_TITLE_LEN]);
        let keywords =
            read_nul_padded(&input[PAPER_TITLE_LEN..PAPER_TITLE_LEN + PAPER_KEYWORDS_LEN]);
        let authors_off = PAPER_TITLE_LEN + PAPER_KEYWORDS_LEN;
        let mut author_ids = [0i64; PAPER_AUTHORS];
        for (i, slot) in author_ids.iter_mut().enumerate() {
            let off = authors_off + i * 8;
            *slot = i64::from_le_bytes(input[off..off + 8].try_into().unwrap());
        }
        let n_citations_off = authors_off + PAPER_AUTHORS * 8;
        let n_citations =
            u32::from_le_bytes(input[n_citations_off..n_citations_off + 4].try_into().unwrap());
        let pub_year_off = n_citations_off + 4;
        let pub_year =
            u32::from_le_bytes(input[pub_year_off..pub_year_off + 4].try_into().unwrap());
        let id_off = pub_year_off + 4;
        let id = i64::from_le_bytes(input[id_off..id_off + 8].try_into().unwrap());

        Self {
            title,
            keywords,
            author_ids,
            n_citations,
            pub_year,
            id,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn matches_query(&self, query: &Self) -> bool {
        self.title == query.title
    }
}

const AUTHOR_NAME_LEN: usize = 32;
const AUTHOR_ORG_LEN: usize = 56;

/// Fixed 96-byte author record: name (31 usable bytes), organization (55
/// usable bytes, left-truncated), and the author's own id.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub name: String,
    pub organization: String,
    pub id: i64,
}

impl AuthorRecord {
    pub fn new(name: impl Into<String>, organization: impl Into<String>, id: i64) -> Self {
        Self {
            name: name.into(),
            organization: organization.into(),
            id,
        }
    }

    /// Query-stub constructor used only to compare by name.
    pub fn query(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            organization: String::new(),
            id: NOT_FOUND_ID,
        }
    }
}

impl Default for AuthorRecord {
    fn default() -> Self {
        Self {
            name: String::new(),
            organization: String::new(),
            id: NOT_FOUND_ID,
        }
    }
}

impl Record for AuthorRecord {
    const SIZE: usize = AUTHOR_NAME_LEN + AUTHOR_ORG_LEN + 8;

    fn serialize(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), Self::SIZE);
        write_padded(&mut out[0..AUTHOR_NAME_LEN], &self.name);
        write_padded_left_truncated(
            &mut out[AUTHOR_NAME_LEN..AUTHOR_NAME_LEN + AUTHOR_ORG_LEN],
            &self.organization,
        );
        let id_off = AUTHOR_NAME_LEN + AUTHOR_ORG_LEN;
        out[id_off..id_off + 8].copy_from_slice(&self.id.to_le_bytes());
    }

    fn deserialize(input: &[u8]) -> Self {
        debug_assert_eq!(input.len(), Self::SIZE);
        let name = read_nul_padded(&input[0..AUTHOR_NAME_LEN]);
        let organization =
            read_nul_padded(&input[AUTHOR_NAME_LEN..AUTHOR_NAME_LEN + AUTHOR_ORG_LEN]);
        let id_off = AUTHOR_NAME_LEN + AUTHOR_ORG_LEN;
        let id = i64::from_le_bytes(input[id_off..id_off + 8].try_into().unwrap());
        Self {
            name,
            organization,
            id,
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn matches_query(&self, query: &Self) -> bool {
        self.name == query.name
    }
}

const TEST_STR_LEN: usize = 12;

/// Fixed 24-byte record used only by B+-tree property tests.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub str_field: String,
    pub x: i32,
    pub id: i64,
}

impl TestRecord {
    pub fn new(x: i32, str_field: impl Into<String>, id: i64) -> Self {
        Self {
            str_field: str_field.into(),
            x,
            id,
        }
    }

    /// Query-stub constructor used only to compare by `x`.
    pub fn query(x: i32) -> Self {
        Self {
            str_field: String::new(),
            x,
            id: NOT_FOUND_ID,
        }
    }
}

impl Default for TestRecord {
    fn default() -> Self {
        Self {
            str_field: String::new(),
            x: 0,
            id: NOT_FOUND_ID,
        }
    }
}

impl Record for TestRecord {
    const SIZE: usize = TEST_STR_LEN + 4 + 8;

    fn serialize(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), Self::SIZE);
        write_padded(&mut out[0..TEST_STR_LEN], &self.str_field);
        out[TEST_STR_LEN..TEST_STR_LEN + 4].copy_from_slice(&self.x.to_le_bytes());
        let id_off = TEST_STR_LEN + 4;
        out[id_off..id_off + 8].copy_from_slice(&self.id.to_le_bytes());
    }

    fn deserialize(input: &[u8]) -> Self {
        debug_assert_eq!(input.len(), Self::SIZE);
        let str_field = read_nul_padded(&input[0..TEST_STR_LEN]);
        let x = i32::from_le_bytes(input[TEST_STR_LEN..TEST_STR_LEN + 4].try_into().unwrap());
        let id_off = TEST_STR_LEN + 4;
        let id = i64::from_le_bytes(input[id_off..id_off + 8].try_into().unwrap());
        Self { str_field, x, id }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn matches_query(&self, query: &Self) -> bool {
        self.x == query.x
    }
}
