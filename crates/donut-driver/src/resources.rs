//! Structured records for S3-style listing queries
//!
//! The HTTP layer parses raw query parameters into these records; the
//! driver fills in the out-fields (`common_prefixes`, `is_truncated`,
//! `next_marker`) on return.

/// Bucket listing parameters and results
#[derive(Clone, Debug, Default)]
pub struct BucketResources {
    /// Only keys starting with this prefix are returned
    pub prefix: String,
    /// Only keys lexicographically greater than this marker are returned
    pub marker: String,
    /// Maximum entries to return; `<= 0` means the server default
    pub max_keys: i64,
    /// Delimiter grouping keys into common prefixes
    pub delimiter: String,
    /// Response encoding requested by the client
    pub encoding_type: String,

    /// Out: delimiter groupings emitted by the listing
    pub common_prefixes: Vec<String>,
    /// Out: whether the listing was cut off at max-keys
    pub is_truncated: bool,
    /// Out: resume marker, set for truncated delimited listings
    pub next_marker: String,
}

impl BucketResources {
    /// Build from parsed query key/value pairs
    ///
    /// Unknown keys are ignored; a malformed `max-keys` counts as
    /// unset.
    pub fn from_query<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut resources = Self::default();
        for (key, value) in values {
            match key {
                "prefix" => resources.prefix = value.to_string(),
                "marker" => resources.marker = value.to_string(),
                "max-keys" => resources.max_keys = value.parse().unwrap_or(0),
                "delimiter" => resources.delimiter = value.to_string(),
                "encoding-type" => resources.encoding_type = value.to_string(),
                _ => {}
            }
        }
        resources
    }

    /// Whether a delimiter was supplied
    #[must_use]
    pub fn is_delimiter_set(&self) -> bool {
        !self.delimiter.is_empty()
    }
}

/// Object multipart listing parameters
#[derive(Clone, Debug, Default)]
pub struct ObjectResources {
    /// Upload being inspected
    pub upload_id: String,
    /// Only parts after this number are returned
    pub part_number_marker: i64,
    /// Maximum parts to return
    pub max_parts: i64,
    /// Response encoding requested by the client
    pub encoding_type: String,
}

impl ObjectResources {
    /// Build from parsed query key/value pairs
    pub fn from_query<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut resources = Self::default();
        for (key, value) in values {
            match key {
                "uploadId" => resources.upload_id = value.to_string(),
                "part-number-marker" => {
                    resources.part_number_marker = value.parse().unwrap_or(0);
                }
                "max-parts" => resources.max_parts = value.parse().unwrap_or(0),
                "encoding-type" => resources.encoding_type = value.to_string(),
                _ => {}
            }
        }
        resources
    }
}

/// Whether a query signals a bucket-ACL request
#[must_use]
pub fn is_bucket_acl_request<'a, I>(keys: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    keys.into_iter().any(|key| key == "acl")
}
